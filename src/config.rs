use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::DuplicateIdPolicy;
use crate::error::AtlasError;
use crate::images::DEFAULT_ROBOT_IMAGES;

pub const CONFIG_FILE: &str = "robodata-atlas.json";
pub const DEFAULT_SOURCE: &str = "data/datasets.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub asset_dir: Option<String>,
    #[serde(default)]
    pub robot_images: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub duplicate_ids: Option<DuplicateIdPolicy>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub origin: Option<Utf8PathBuf>,
    pub source: Utf8PathBuf,
    pub asset_dir: Utf8PathBuf,
    pub robot_images: BTreeMap<String, String>,
    pub duplicate_ids: DuplicateIdPolicy,
}

impl ResolvedConfig {
    /// Replaces the dataset source, resolving `path` against the working
    /// directory.
    pub fn with_source(mut self, path: &str) -> Result<Self, AtlasError> {
        self.source = current_dir()?.join(path);
        Ok(self)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolution order: the explicit `path` (which must exist), then
    /// `robodata-atlas.json` in the working directory, then the user config
    /// directory, then built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, AtlasError> {
        let cwd = current_dir()?;

        if let Some(path) = path {
            let config_path = cwd.join(path);
            if !config_path.as_std_path().is_file() {
                return Err(AtlasError::MissingConfig(config_path.into_std_path_buf()));
            }
            return Self::resolve_file(&config_path);
        }

        let candidates = [Some(cwd.join(CONFIG_FILE)), user_config_path()];
        for candidate in candidates.into_iter().flatten() {
            if candidate.as_std_path().is_file() {
                return Self::resolve_file(&candidate);
            }
        }

        debug!("no config file found; using defaults");
        Ok(Self::resolve_config(Config::default(), &cwd, None))
    }

    pub fn resolve_file(config_path: &Utf8Path) -> Result<ResolvedConfig, AtlasError> {
        let content = fs::read_to_string(config_path)
            .map_err(|_| AtlasError::ConfigRead(config_path.as_std_path().to_path_buf()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| AtlasError::ConfigParse(err.to_string()))?;
        let base_dir = config_path
            .parent()
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| Utf8PathBuf::from("."));
        debug!(path = %config_path, "loaded config");
        Ok(Self::resolve_config(
            config,
            &base_dir,
            Some(config_path.to_path_buf()),
        ))
    }

    /// Fills in defaults; relative paths are taken from `base_dir`.
    pub fn resolve_config(
        config: Config,
        base_dir: &Utf8Path,
        origin: Option<Utf8PathBuf>,
    ) -> ResolvedConfig {
        let source = config.source.as_deref().unwrap_or(DEFAULT_SOURCE);
        let asset_dir = config.asset_dir.as_deref().unwrap_or(".");

        ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            origin,
            source: base_dir.join(source),
            asset_dir: base_dir.join(asset_dir),
            robot_images: config.robot_images.unwrap_or_else(default_robot_images),
            duplicate_ids: config.duplicate_ids.unwrap_or_default(),
        }
    }
}

pub fn default_robot_images() -> BTreeMap<String, String> {
    DEFAULT_ROBOT_IMAGES
        .iter()
        .map(|(robot, path)| (robot.to_string(), path.to_string()))
        .collect()
}

pub fn user_config_path() -> Option<Utf8PathBuf> {
    let dirs = ProjectDirs::from("", "", "robodata-atlas")?;
    Utf8PathBuf::from_path_buf(dirs.config_dir().join("config.json")).ok()
}

fn current_dir() -> Result<Utf8PathBuf, AtlasError> {
    let cwd = std::env::current_dir().map_err(|err| AtlasError::Filesystem(err.to_string()))?;
    Utf8PathBuf::from_path_buf(cwd)
        .map_err(|_| AtlasError::Filesystem("working directory is not valid UTF-8".to_string()))
}
