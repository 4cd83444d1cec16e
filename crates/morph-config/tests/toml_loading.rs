//! Integration tests for layered configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var and cwd manipulation.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use morph_config::{ConfigError, MorphConfig};
use pretty_assertions::assert_eq;

#[test]
fn loads_full_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r"
[analysis]
max_path_depth = 6
flattening = false

[execution]
concurrent_loaders = false
",
        )?;

        let config: MorphConfig = Figment::from(Serialized::defaults(MorphConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.analysis.max_path_depth, 6);
        assert!(!config.analysis.flattening);
        assert!(!config.execution.concurrent_loaders);
        Ok(())
    });
}

#[test]
fn partial_section_keeps_other_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r"
[analysis]
flattening = false
",
        )?;

        let config: MorphConfig = Figment::from(Serialized::defaults(MorphConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert!(!config.analysis.flattening);
        assert_eq!(config.analysis.max_path_depth, 4);
        assert!(config.execution.concurrent_loaders);
        Ok(())
    });
}

#[test]
fn project_config_is_picked_up_by_default_chain() {
    Jail::expect_with(|jail| {
        std::fs::create_dir_all(jail.directory().join(".morph"))
            .map_err(|e| e.to_string())?;
        jail.create_file(
            ".morph/config.toml",
            r"
[analysis]
max_path_depth = 2
",
        )?;

        let config = MorphConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.analysis.max_path_depth, 2);
        Ok(())
    });
}

#[test]
fn env_var_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.set_env("MORPH_ANALYSIS__MAX_PATH_DEPTH", "8");

        jail.create_file(
            "config.toml",
            r"
[analysis]
max_path_depth = 3
flattening = false
",
        )?;

        let config: MorphConfig = Figment::from(Serialized::defaults(MorphConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("MORPH_").split("__"))
            .extract()?;

        // Env should win over TOML
        assert_eq!(config.analysis.max_path_depth, 8);
        // TOML value not overridden by env should remain
        assert!(!config.analysis.flattening);
        Ok(())
    });
}

#[test]
fn env_var_overrides_default() {
    Jail::expect_with(|jail| {
        jail.set_env("MORPH_EXECUTION__CONCURRENT_LOADERS", "false");

        let config = MorphConfig::load().map_err(|e| e.to_string())?;
        assert!(!config.execution.concurrent_loaders);
        Ok(())
    });
}

/// Typo'd env var keys are silently ignored by figment.
#[test]
fn typo_env_var_silently_ignored() {
    Jail::expect_with(|jail| {
        jail.set_env("MORPH_ANALYSIS__MAX_PATH_DEPHT", "9");

        let config = MorphConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.analysis.max_path_depth, 4);
        Ok(())
    });
}

#[test]
fn zero_depth_is_rejected_on_load() {
    Jail::expect_with(|jail| {
        jail.set_env("MORPH_ANALYSIS__MAX_PATH_DEPTH", "0");

        let result = MorphConfig::load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        Ok(())
    });
}

#[test]
fn malformed_value_is_a_figment_error() {
    Jail::expect_with(|jail| {
        jail.set_env("MORPH_ANALYSIS__MAX_PATH_DEPTH", "deep");

        let result = MorphConfig::load();
        assert!(matches!(result, Err(ConfigError::Figment(_))));
        Ok(())
    });
}
