use crate::domain::money::Money;
use crate::error::{CartError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_SERVICE_FEE: Decimal = dec!(50);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client settings, read from `SEATCART_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Flat fee added to every order summary.
    pub service_fee: Money,
    /// Upper bound for a whole checkout; unbounded when `None`.
    pub commit_timeout: Option<Duration>,
    pub request_timeout: Duration,
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            service_fee: Money::new(DEFAULT_SERVICE_FEE),
            commit_timeout: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            token: None,
        }
    }
}

impl ClientConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset or blank keys
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(base_url) = get("SEATCART_BASE_URL") {
            config.base_url = base_url.trim().to_string();
        }
        if let Some(fee) = get("SEATCART_SERVICE_FEE") {
            config.service_fee = parse_fee(&fee)?;
        }
        if let Some(secs) = get("SEATCART_COMMIT_TIMEOUT_SECS") {
            config.commit_timeout = Some(parse_secs("SEATCART_COMMIT_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get("SEATCART_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = parse_secs("SEATCART_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        config.token = get("SEATCART_TOKEN");

        tracing::debug!(base_url = %config.base_url, fee = %config.service_fee, "configuration loaded");
        Ok(config)
    }
}

pub fn parse_fee(raw: &str) -> Result<Money> {
    let fee = Decimal::from_str(raw.trim())
        .map_err(|e| CartError::Config(format!("Invalid SEATCART_SERVICE_FEE '{raw}': {e}")))?;
    if fee < Decimal::ZERO {
        return Err(CartError::Config(format!(
            "SEATCART_SERVICE_FEE must not be negative, got {fee}"
        )));
    }
    Ok(Money::new(fee))
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(CartError::Config(format!(
            "Invalid {key} '{raw}': expected a positive number of seconds"
        ))),
    }
}
