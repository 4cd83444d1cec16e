//! # morph-config
//!
//! Layered configuration loading for Morph using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`MORPH_*` prefix, `__` as separator)
//! 2. Project-level `.morph/config.toml`
//! 3. User-level `~/.config/morph/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `MORPH_ANALYSIS__MAX_PATH_DEPTH` -> `analysis.max_path_depth`.
//!
//! # Usage
//!
//! ```no_run
//! use morph_config::MorphConfig;
//!
//! let config = MorphConfig::load().expect("config");
//! if config.analysis.flattening {
//!     println!("flattening up to {} fields deep", config.analysis.max_path_depth);
//! }
//! ```
//!
//! The loaded value is passed explicitly to each mapping builder; nothing here
//! is global.

mod analysis;
mod error;
mod execution;

pub use analysis::AnalysisConfig;
pub use error::ConfigError;
pub use execution::ExecutionConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MorphConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl MorphConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed, or
    /// [`ConfigError::InvalidValue`] if the merged values are out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Extract and validate a config from any provider chain.
    ///
    /// # Errors
    ///
    /// Same as [`MorphConfig::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for out-of-range settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".morph/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("MORPH_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("morph").join("config.toml"))
    }
}
