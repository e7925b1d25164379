//! Runtime configuration.

use std::path::{Path, PathBuf};

use embedlink_value::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding extra module search paths.
pub const PATH_ENV: &str = "EMBEDLINK_PATH";

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How the embedded runtime is set up.
///
/// Every field has a default, so a config file only needs the fields it
/// changes:
///
/// ```json
/// { "search_paths": ["modules"], "packages": ["stats"] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Directories searched for WASM modules, in order.
    pub search_paths: Vec<PathBuf>,

    /// Modules imported during startup. A package that fails to import
    /// fails the whole startup.
    pub packages: Vec<String>,

    /// Working directory of the runtime. Relative search paths resolve
    /// against it.
    pub working_dir: Option<PathBuf>,

    /// Container nesting allowed in arguments and results.
    pub max_depth: usize,

    /// Append the entries of `EMBEDLINK_PATH` to the search paths.
    pub use_env: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            packages: Vec::new(),
            working_dir: None,
            max_depth: DEFAULT_MAX_DEPTH,
            use_env: true,
        }
    }
}

impl BridgeConfig {
    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if let Some(bad) = self
            .packages
            .iter()
            .find(|p| !embedlink_runtime::ident::is_module_name(p))
        {
            return Err(ConfigError::Invalid(format!(
                "'{}' is not a valid module name",
                bad
            )));
        }
        Ok(())
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.packages.push(package.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_env(mut self, use_env: bool) -> Self {
        self.use_env = use_env;
        self
    }

    /// Configured search paths followed by those from `EMBEDLINK_PATH`
    /// when `use_env` is set.
    pub fn effective_search_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.search_paths.clone();
        if self.use_env {
            if let Some(extra) = std::env::var_os(PATH_ENV) {
                paths.extend(std::env::split_paths(&extra).filter(|p| !p.as_os_str().is_empty()));
            }
        }
        paths
    }
}
