use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use url::Url;
use wallet_inputs::config::{DEFAULT_MAX_INPUTS, DEFAULT_SYNC_FRESHNESS};
use wallet_inputs::selection::subset_sum::MAX_SUBSET_SUM_CALLS;
use wallet_inputs::{InputsLimit, SelectionConfig};

const DEFAULT_NODE_URL: &str = "http://localhost:14265";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub node_url: String,
    pub max_inputs: u64,
    pub max_solver_calls: u64,
    pub sync_freshness_secs: u64,
    pub request_timeout_ms: u64,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        let node_url = env_var_or_default("WALLET_INPUTS_NODE_URL", DEFAULT_NODE_URL);
        let max_inputs = parse_u64_env("WALLET_INPUTS_MAX_INPUTS", DEFAULT_MAX_INPUTS as u64)?;
        let max_solver_calls =
            parse_u64_env("WALLET_INPUTS_MAX_SOLVER_CALLS", MAX_SUBSET_SUM_CALLS as u64)?;
        let sync_freshness_secs = parse_u64_env(
            "WALLET_INPUTS_SYNC_FRESHNESS_SECS",
            DEFAULT_SYNC_FRESHNESS.as_secs(),
        )?;
        let request_timeout_ms =
            parse_u64_env("WALLET_INPUTS_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;

        Ok(Self {
            node_url,
            max_inputs,
            max_solver_calls,
            sync_freshness_secs,
            request_timeout_ms,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.node_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "WALLET_INPUTS_NODE_URL scheme must be http or https; got '{}'",
                url.scheme()
            );
        }

        if usize::try_from(self.max_inputs).is_err() {
            bail!("WALLET_INPUTS_MAX_INPUTS is too large");
        }

        if self.max_solver_calls == 0 || usize::try_from(self.max_solver_calls).is_err() {
            bail!("WALLET_INPUTS_MAX_SOLVER_CALLS must be > 0");
        }

        if self.sync_freshness_secs == 0 {
            bail!("WALLET_INPUTS_SYNC_FRESHNESS_SECS must be > 0");
        }

        if self.request_timeout_ms == 0 {
            bail!("WALLET_INPUTS_REQUEST_TIMEOUT_MS must be > 0");
        }

        Ok(())
    }

    pub fn node_url(&self) -> Result<Url> {
        Url::parse(&self.node_url).with_context(|| {
            format!(
                "WALLET_INPUTS_NODE_URL must be a valid URL; got '{}'",
                self.node_url
            )
        })
    }

    #[must_use]
    pub const fn sync_freshness(&self) -> Duration {
        Duration::from_secs(self.sync_freshness_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Selection tunables, with `limit` replacing the configured input cap when given.
    pub fn selection(&self, limit: Option<InputsLimit>) -> Result<SelectionConfig> {
        let max_inputs = match limit {
            Some(limit) => limit,
            None => InputsLimit::new(
                usize::try_from(self.max_inputs).context("WALLET_INPUTS_MAX_INPUTS is too large")?,
            ),
        };
        let max_subset_sum_calls = usize::try_from(self.max_solver_calls)
            .context("WALLET_INPUTS_MAX_SOLVER_CALLS is too large")?;

        Ok(SelectionConfig {
            max_inputs,
            max_subset_sum_calls,
            sync_freshness: self.sync_freshness(),
        })
    }
}

fn env_var_or_default(key: &str, default_value: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_value.to_string())
}

fn parse_u64_env(key: &str, default_value: u64) -> Result<u64> {
    let raw = env_var_or_default(key, &default_value.to_string());
    u64::from_str(raw.trim()).with_context(|| format!("{key} must be a valid u64 integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> CliConfig {
        CliConfig {
            node_url: "http://127.0.0.1:14265".to_string(),
            max_inputs: 2,
            max_solver_calls: 100_000,
            sync_freshness_secs: 300,
            request_timeout_ms: 10_000,
        }
    }

    #[test]
    fn base_config_is_valid() {
        base_config().validate().expect("defaults validate");
    }

    #[test]
    fn non_http_node_url_is_rejected() {
        let mut cfg = base_config();
        cfg.node_url = "ws://127.0.0.1:14265".to_string();

        let err = cfg.validate().expect_err("must reject ws scheme");
        assert!(err.to_string().contains("scheme must be http or https"));
    }

    #[test]
    fn malformed_node_url_is_rejected() {
        let mut cfg = base_config();
        cfg.node_url = "not a url".to_string();

        let err = cfg.validate().expect_err("must reject garbage");
        assert!(err.to_string().contains("must be a valid URL"));
    }

    #[test]
    fn zero_solver_budget_is_rejected() {
        let mut cfg = base_config();
        cfg.max_solver_calls = 0;

        let err = cfg.validate().expect_err("must reject zero budget");
        assert!(err.to_string().contains("WALLET_INPUTS_MAX_SOLVER_CALLS"));
    }

    #[test]
    fn limit_override_replaces_configured_cap() {
        let cfg = base_config();

        let default = cfg.selection(None).expect("selection config");
        assert_eq!(default.max_inputs, InputsLimit::new(2));
        assert_eq!(default.sync_freshness, Duration::from_secs(300));

        let unlimited = cfg
            .selection(Some(InputsLimit::unlimited()))
            .expect("selection config");
        assert!(unlimited.max_inputs.is_unlimited());
    }
}
