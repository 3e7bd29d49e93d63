use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Prefix of environment variables that override file settings.
///
/// Nested keys are separated by a double underscore, e.g.
/// `SPREAD_WATCH_SAMPLER__INTERVAL_SECS=5`.
pub const ENV_PREFIX: &str = "SPREAD_WATCH_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from the default path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be parsed or is invalid.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration by layering built-in defaults, the TOML file at
    /// `path` (skipped when absent) and `SPREAD_WATCH_` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be parsed or is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        let config: AppConfig = Self::figment(path)
            .extract()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingMode;
    use crate::types::RankField;
    use figment::Jail;

    #[test]
    fn test_missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load_from("does/not/exist.toml").map_err(|e| e.to_string())?;
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [metrics]
                port = 9100

                [spread_universe]
                asset = "BTC"
                rank_by = "quoteVolume"
                count = 3

                [sampler]
                interval_secs = 2
                mode = "paired"
                "#,
            )?;

            let config = ConfigLoader::load_from("Config.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.metrics.port, 9100);
            assert_eq!(config.metrics.host, "0.0.0.0");
            assert_eq!(config.spread_universe.asset, "BTC");
            assert_eq!(config.spread_universe.rank_by, RankField::QuoteVolume);
            assert_eq!(config.spread_universe.count, 3);
            assert_eq!(config.sampler.interval_secs, 2);
            assert_eq!(config.sampler.mode, SamplingMode::Paired);
            assert!(config.sampler.parallel_fetch);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [sampler]
                interval_secs = 30
                "#,
            )?;
            jail.set_env("SPREAD_WATCH_SAMPLER__INTERVAL_SECS", "5");
            jail.set_env("SPREAD_WATCH_EXCHANGE__BASE_URL", "http://localhost:9999");

            let config = ConfigLoader::load_from("Config.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.sampler.interval_secs, 5);
            assert_eq!(config.exchange.base_url, "http://localhost:9999");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [notional]
                top_levels = 0
                "#,
            )?;

            let result = ConfigLoader::load_from("Config.toml");
            assert!(result.is_err());
            Ok(())
        });
    }
}
