use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Run configuration parameters.
///
/// Loaded from a TOML file and validated before use. Every field has a
/// default, so an absent file or an empty table is a valid configuration.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub fetch: FetchConfig,
}

/// Parameters of the remote price fetch.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Base URL of the daily-prices CSV endpoint.
    pub base_url: String,

    /// Maximum number of attempts per ticker before giving up.
    pub max_attempts: usize,
    /// Initial wait between attempts, in milliseconds; doubles after each failure.
    pub backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://stooq.com/q/d/l/".to_string(),
            max_attempts: 3,
            backoff_ms: 500,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.fetch.base_url.is_empty() {
            bail!("base URL must not be empty");
        }
        check_num(self.fetch.max_attempts, 1..=10)
            .context("invalid maximum number of attempts")?;
        check_num(self.fetch.backoff_ms, 1..=60_000).context("invalid backoff")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_are_applied() {
        let config: Config = toml::from_str(
            "[fetch]\nbase_url = \"http://localhost:8080/daily\"\nmax_attempts = 5\n",
        )
        .unwrap();
        assert_eq!(config.fetch.base_url, "http://localhost:8080/daily");
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.backoff_ms, FetchConfig::default().backoff_ms);
    }

    #[test]
    fn out_of_range_attempts_are_rejected() {
        let config: Config = toml::from_str("[fetch]\nmax_attempts = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
