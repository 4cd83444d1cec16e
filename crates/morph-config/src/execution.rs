//! Mapping execution settings.

use serde::{Deserialize, Serialize};

const fn default_concurrent_loaders() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExecutionConfig {
    /// Await the resource loaders of one batch together instead of one by one.
    #[serde(default = "default_concurrent_loaders")]
    pub concurrent_loaders: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            concurrent_loaders: default_concurrent_loaders(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loaders_run_concurrently_by_default() {
        assert!(ExecutionConfig::default().concurrent_loaders);
    }
}
