// Optional TOML configuration (`ctorprops.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::fix::{FixOptions, MemberPolicy};
use crate::domain::rewrite::RewriteOptions;

pub const DEFAULT_CONFIG_FILE: &str = "ctorprops.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("indent_unit must be non-empty spaces or tabs, got {0:?}")]
    InvalidIndent(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub fix: FixConfig,
    pub analyzers: AnalyzerConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixConfig {
    pub member_policy: MemberPolicy,
    pub indent_unit: String,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            member_policy: MemberPolicy::default(),
            indent_unit: RewriteOptions::default().indent_unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    pub constructor: bool,
    pub no_primitive_types: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            constructor: true,
            no_primitive_types: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// File extensions collected from folders, without the dot.
    pub extensions: Vec<String>,
    /// Directory names never descended into.
    pub exclude_dirs: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["cs".to_string()],
            exclude_dirs: vec!["bin".to_string(), "obj".to_string(), ".git".to_string()],
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads `path` when given, otherwise `ctorprops.toml` in `dir` if it
    /// exists, otherwise the defaults.
    pub fn discover(path: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    Self::load(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let indent = &self.fix.indent_unit;
        if indent.is_empty() || !indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(ConfigError::InvalidIndent(indent.clone()));
        }
        Ok(())
    }

    pub fn fix_options(&self) -> FixOptions {
        FixOptions {
            member_policy: self.fix.member_policy,
            rewrite: RewriteOptions {
                indent_unit: self.fix.indent_unit.clone(),
            },
        }
    }
}
