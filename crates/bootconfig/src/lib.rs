use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Number of timer-driven progress steps between the first milestone and the
/// background gate (20% -> 40% -> 60% -> 80%).
pub const TIMED_PROGRESS_STEPS: u32 = 3;

/// Upper bound for every boot timing.
pub const MAX_BOOT_DELAY: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExperienceConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub boot: BootTimings,
    #[serde(default)]
    pub panorama: PanoramaSettings,
    #[serde(default)]
    pub presentation: PresentationSettings,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            boot: BootTimings::default(),
            panorama: PanoramaSettings::default(),
            presentation: PresentationSettings::default(),
        }
    }
}

/// Timer constants for the boot sequence. These are UX tunables; correctness
/// does not depend on their exact values.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BootTimings {
    #[serde(
        default = "default_stage_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub stage_interval: Duration,
    #[serde(
        default = "default_settle_delay",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub settle_delay: Duration,
    #[serde(
        default = "default_selector_delay",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub selector_delay: Duration,
    #[serde(
        default = "default_max_wait",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub max_wait: Duration,
}

impl Default for BootTimings {
    fn default() -> Self {
        Self {
            stage_interval: default_stage_interval(),
            settle_delay: default_settle_delay(),
            selector_delay: default_selector_delay(),
            max_wait: default_max_wait(),
        }
    }
}

impl BootTimings {
    /// Time the progress timers need to reach the background gate.
    pub fn timer_chain(&self) -> Duration {
        self.stage_interval.saturating_mul(TIMED_PROGRESS_STEPS)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PanoramaSettings {
    /// Local path (relative paths resolve against the data directory) or an
    /// `http(s)://` URL.
    pub asset: String,
    pub field_of_view: f32,
    pub near: f32,
    pub far: f32,
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    /// Radians added to the sphere's yaw on every frame.
    pub rotation_step: f32,
}

impl Default for PanoramaSettings {
    fn default() -> Self {
        Self {
            asset: "media/panorama.png".to_string(),
            field_of_view: 75.0,
            near: 0.1,
            far: 1000.0,
            radius: 500.0,
            width_segments: 60,
            height_segments: 40,
            rotation_step: 0.0006,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PresentationSettings {
    /// Blur radius in logical pixels.
    pub blur: f32,
    pub scale: f32,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            blur: 4.0,
            scale: 1.02,
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_stage_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_settle_delay() -> Duration {
    Duration::from_millis(800)
}

fn default_selector_delay() -> Duration {
    Duration::from_millis(300)
}

fn default_max_wait() -> Duration {
    Duration::from_secs(10)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

impl ExperienceConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ExperienceConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path` when it exists, otherwise returns the built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        let boot = &self.boot;
        for (name, value) in [
            ("stage_interval", boot.stage_interval),
            ("settle_delay", boot.settle_delay),
            ("selector_delay", boot.selector_delay),
            ("max_wait", boot.max_wait),
        ] {
            if value > MAX_BOOT_DELAY {
                return Err(ConfigError::Invalid(format!(
                    "boot.{name} ({}) must not exceed {}",
                    humantime::format_duration(value),
                    humantime::format_duration(MAX_BOOT_DELAY)
                )));
            }
        }
        if boot.stage_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "boot.stage_interval must be greater than zero".into(),
            ));
        }
        if boot.max_wait <= boot.timer_chain() {
            return Err(ConfigError::Invalid(format!(
                "boot.max_wait ({}) must exceed the progress timer chain ({})",
                humantime::format_duration(boot.max_wait),
                humantime::format_duration(boot.timer_chain())
            )));
        }

        let panorama = &self.panorama;
        if panorama.asset.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "panorama.asset must not be empty".into(),
            ));
        }
        if !(panorama.field_of_view > 0.0 && panorama.field_of_view < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "panorama.field_of_view must be within (0, 180) degrees, got {}",
                panorama.field_of_view
            )));
        }
        if !(panorama.near > 0.0 && panorama.far > panorama.near) {
            return Err(ConfigError::Invalid(format!(
                "panorama clip planes must satisfy 0 < near < far (near={}, far={})",
                panorama.near, panorama.far
            )));
        }
        if !(panorama.radius > panorama.near && panorama.radius < panorama.far) {
            return Err(ConfigError::Invalid(format!(
                "panorama.radius {} must lie between the near and far planes so the camera stays enclosed",
                panorama.radius
            )));
        }
        if panorama.width_segments < 3 || panorama.height_segments < 2 {
            return Err(ConfigError::Invalid(format!(
                "panorama sphere needs at least 3x2 segments, got {}x{}",
                panorama.width_segments, panorama.height_segments
            )));
        }
        if !panorama.rotation_step.is_finite() {
            return Err(ConfigError::Invalid(
                "panorama.rotation_step must be finite".into(),
            ));
        }

        let presentation = &self.presentation;
        if !(presentation.blur >= 0.0) {
            return Err(ConfigError::Invalid(
                "presentation.blur must be >= 0".into(),
            ));
        }
        if !(presentation.scale > 0.0) {
            return Err(ConfigError::Invalid(
                "presentation.scale must be > 0".into(),
            ));
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|err| ConfigError::Invalid(format!("failed to serialise config: {err}")))
    }
}
