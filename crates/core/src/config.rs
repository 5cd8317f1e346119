use std::path::{Path, PathBuf};

use anyhow::Context;
use log::debug;
use serde::Deserialize;

use crate::{threshold::parse_threshold, types::ThresholdValue};

pub const CONFIG_FILE_NAME: &str = "monosize.toml";

pub const DEFAULT_THRESHOLD: &str = "10%";

pub const DEFAULT_STORAGE_DIR: &str = ".monosize/storage";

pub const DEFAULT_CHUNK_SIZE: usize = 90;

fn default_threshold() -> String {
    DEFAULT_THRESHOLD.to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_DIR)
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    File {
        #[serde(default = "default_storage_dir")]
        path: PathBuf,
        #[serde(default = "default_chunk_size")]
        chunk_size: usize,
    },
    Upstash {
        url: String,
        readonly_token: String,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            path: default_storage_dir(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    #[serde(default = "default_threshold")]
    pub threshold: String,
    pub repository: Option<String>,
    pub storage: StorageConfig,
    /// Directory the config was loaded from; relative storage paths resolve against it.
    #[serde(skip)]
    pub root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            repository: None,
            storage: StorageConfig::default(),
            root: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;

        config
            .threshold_value()
            .with_context(|| format!("invalid config {}", path.display()))?;

        config.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        debug!("using config {}", path.display());
        Ok(config)
    }

    /// Walks up from `start` to the first directory holding a config file.
    pub fn find(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    pub fn discover(start: &Path) -> anyhow::Result<Self> {
        match Config::find(start) {
            Some(path) => Config::load(&path),
            None => anyhow::bail!(
                "no config file found: {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            ),
        }
    }

    pub fn threshold_value(&self) -> anyhow::Result<ThresholdValue> {
        Ok(parse_threshold(&self.threshold)?)
    }

    /// Storage settings with relative paths resolved against the config root.
    pub fn resolved_storage(&self) -> StorageConfig {
        match &self.storage {
            StorageConfig::File { path, chunk_size } => StorageConfig::File {
                path: self.root.join(path),
                chunk_size: *chunk_size,
            },
            other => other.clone(),
        }
    }
}

/// Memoizes the loaded config for the lifetime of the owner.
#[derive(Debug, Default)]
pub struct ConfigCache {
    cached: Option<Config>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads from `explicit` when given, otherwise discovers upward from `start`.
    pub fn get_or_load(&mut self, explicit: Option<&Path>, start: &Path) -> anyhow::Result<&Config> {
        if self.cached.is_none() {
            let config = match explicit {
                Some(path) => Config::load(path)?,
                None => Config::discover(start)?,
            };
            self.cached = Some(config);
        }

        self.cached
            .as_ref()
            .context("config cache is empty after loading")
    }

    pub fn reset(&mut self) {
        self.cached = None;
    }
}
