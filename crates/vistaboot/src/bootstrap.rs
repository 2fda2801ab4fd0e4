use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bootconfig::ExperienceConfig;
use panorama::{AssetSource, PanoramaConfig, PresentationStyle, TextureSampling};
use tracing::debug;
use variants::{FileStore, MemoryStore, Preference, PreferenceError, PreferenceStore, Variant};

use crate::cli::RunArgs;
use crate::paths::AppPaths;
use crate::session::SessionSettings;

/// Everything a host needs to start sessions.
pub struct Bootstrap {
    pub settings: SessionSettings,
    pub asset: AssetSource,
    pub surface_size: (u32, u32),
}

/// Preference storage selected on the command line.
#[derive(Debug)]
pub enum AppStore {
    File(FileStore),
    Memory(MemoryStore),
}

impl PreferenceStore for AppStore {
    fn get(&self) -> Option<Preference> {
        match self {
            AppStore::File(store) => store.get(),
            AppStore::Memory(store) => store.get(),
        }
    }

    fn set(&self, variant: Variant) -> Result<(), PreferenceError> {
        match self {
            AppStore::File(store) => store.set(variant),
            AppStore::Memory(store) => store.set(variant),
        }
    }

    fn clear(&self) -> Result<(), PreferenceError> {
        match self {
            AppStore::File(store) => store.clear(),
            AppStore::Memory(store) => store.clear(),
        }
    }
}

pub fn bootstrap_filesystem(paths: &AppPaths) -> Result<()> {
    for dir in [paths.config_dir(), paths.data_dir(), paths.cache_dir()] {
        ensure_directory(dir)?;
    }
    Ok(())
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory at {}", path.display()))?;
        debug!(path = %path.display(), "created directory");
    }
    Ok(())
}

pub fn open_store(paths: &AppPaths, ephemeral: bool) -> AppStore {
    if ephemeral {
        AppStore::Memory(MemoryStore::new())
    } else {
        AppStore::File(FileStore::new(paths.preference_file()))
    }
}

pub fn load_config(paths: &AppPaths, explicit: Option<&Path>) -> Result<ExperienceConfig> {
    match explicit {
        Some(path) => ExperienceConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => {
            let path = paths.config_file();
            ExperienceConfig::load_or_default(&path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))
        }
    }
}

pub fn prepare(paths: &AppPaths, args: &RunArgs) -> Result<Bootstrap> {
    bootstrap_filesystem(paths)?;
    let config = load_config(paths, args.config.as_deref())?;
    let surface_size = parse_surface_size(&args.size)?;
    let raw_asset = args
        .asset
        .as_deref()
        .unwrap_or(config.panorama.asset.as_str());
    let asset = AssetSource::resolve(raw_asset, paths.data_dir());
    debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        asset = %asset,
        "resolved vistaboot inputs"
    );

    Ok(Bootstrap {
        settings: session_settings(&config),
        asset,
        surface_size,
    })
}

pub fn session_settings(config: &ExperienceConfig) -> SessionSettings {
    let panorama = &config.panorama;
    SessionSettings {
        panorama: PanoramaConfig {
            field_of_view: panorama.field_of_view,
            near: panorama.near,
            far: panorama.far,
            radius: panorama.radius,
            width_segments: panorama.width_segments,
            height_segments: panorama.height_segments,
            rotation_step: panorama.rotation_step,
            sampling: TextureSampling::non_power_of_two(),
            presentation: PresentationStyle {
                blur: config.presentation.blur,
                scale: config.presentation.scale,
            },
        },
        timings: config.boot,
    }
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32)> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("expected WxH format, e.g. 1280x720"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid width in size argument"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid height in size argument"))?;

    if width == 0 || height == 0 {
        anyhow::bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}
