use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "VISTABOOT_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "VISTABOOT_DATA_DIR";
pub const ENV_CACHE_DIR: &str = "VISTABOOT_CACHE_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Vistaboot";
const APPLICATION: &str = "vistaboot";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
    cache_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let overrides = (
            env_override(ENV_CONFIG_DIR),
            env_override(ENV_DATA_DIR),
            env_override(ENV_CACHE_DIR),
        );
        if let (Some(config_dir), Some(data_dir), Some(cache_dir)) = overrides {
            return Ok(Self {
                config_dir,
                data_dir,
                cache_dir,
            });
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        let (config_dir, data_dir, cache_dir) = overrides;
        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| project_dirs.config_dir().to_path_buf()),
            data_dir: data_dir.unwrap_or_else(|| project_dirs.data_dir().to_path_buf()),
            cache_dir: cache_dir.unwrap_or_else(|| project_dirs.cache_dir().to_path_buf()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("vistaboot.toml")
    }

    pub fn preference_file(&self) -> PathBuf {
        self.config_dir.join(variants::PREFERENCE_FILE)
    }
}

#[cfg(test)]
impl AppPaths {
    pub fn from_raw(config_dir: PathBuf, data_dir: PathBuf, cache_dir: PathBuf) -> Self {
        Self {
            config_dir,
            data_dir,
            cache_dir,
        }
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
