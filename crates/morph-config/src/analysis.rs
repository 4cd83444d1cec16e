//! Intersection analysis settings.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default path budget of the candidate generator.
const fn default_max_path_depth() -> usize {
    4
}

const fn default_flattening() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Maximum number of fields in a candidate path.
    #[serde(default = "default_max_path_depth")]
    pub max_path_depth: usize,

    /// Whether `DataProperty` may pair with `Data.Property` (and back).
    #[serde(default = "default_flattening")]
    pub flattening: bool,
}

impl AnalysisConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the path budget is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_path_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analysis.max_path_depth".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_path_depth: default_max_path_depth(),
            flattening: default_flattening(),
        }
    }
}
