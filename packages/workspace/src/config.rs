use crate::error::ConfigError;
use pagewright_runtime::Limits;
use pagewright_shell::DEFAULT_RENDER_PASSES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "pagewright.config.json";

/// Server configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Published applications are served under `{mountBase}/{slug}`
    pub mount_base: String,
    /// Events buffered per channel before slow subscribers lag
    pub channel_capacity: usize,
    pub render_pass_limit: usize,
    pub call_depth_limit: usize,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            mount_base: "/apps".to_string(),
            channel_capacity: 256,
            render_pass_limit: DEFAULT_RENDER_PASSES,
            call_depth_limit: Limits::default().max_call_depth,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load `pagewright.config.json` from a directory, falling back to the
    /// defaults when there is none
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(DEFAULT_CONFIG_NAME);
        if path.exists() {
            Self::load_file(&path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from(path),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid("channelCapacity must be at least 1".into()));
        }
        if self.render_pass_limit == 0 {
            return Err(ConfigError::Invalid("renderPassLimit must be at least 1".into()));
        }
        if self.call_depth_limit == 0 {
            return Err(ConfigError::Invalid("callDepthLimit must be at least 1".into()));
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_call_depth: self.call_depth_limit,
            ..Limits::default()
        }
    }
}
