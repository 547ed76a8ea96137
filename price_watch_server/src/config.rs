use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use price_watch_engine::{watch_objects::ScanConfig, CallPolicy};
use pw_common::{parse_boolean_flag, Secret};

const DEFAULT_PW_HOST: &str = "127.0.0.1";
const DEFAULT_PW_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/price_watch.db";
const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How often the background worker runs a scan cycle.
    pub scan_interval: Duration,
    /// When set, `POST /api/scan` requires a matching `pw_scan_key` header.
    pub scan_api_key: Option<Secret<String>>,
    /// If true, scans only happen through `POST /api/scan`.
    pub disable_scan_worker: bool,
    pub scan: ScanConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PW_HOST.to_string(),
            port: DEFAULT_PW_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            scan_api_key: None,
            disable_scan_worker: false,
            scan: ScanConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = ScanConfig::default();
        let host = env::var("PW_HOST").ok().unwrap_or_else(|| DEFAULT_PW_HOST.into());
        let port = parse_env("PW_PORT", DEFAULT_PW_PORT);
        let database_url = env::var("PW_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ PW_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let scan_interval = parse_env_secs("PW_SCAN_INTERVAL_SECS", DEFAULT_SCAN_INTERVAL);
        let scan_api_key = env::var("PW_SCAN_API_KEY").ok().filter(|s| !s.is_empty()).map(Secret::new);
        if scan_api_key.is_none() {
            warn!("🪛️ PW_SCAN_API_KEY is not set. Anyone who can reach the server can trigger a scan.");
        }
        let disable_scan_worker = parse_boolean_flag(env::var("PW_DISABLE_SCAN_WORKER").ok(), false);

        let default_timeout = defaults.policy.call_timeout.as_millis() as u64;
        let policy = CallPolicy::default()
            .with_call_timeout(Duration::from_millis(parse_env("PW_CALL_TIMEOUT_MS", default_timeout)))
            .with_max_attempts(parse_env("PW_MAX_ATTEMPTS", defaults.policy.max_attempts));
        let scan = ScanConfig {
            lease_ttl: parse_env_secs("PW_LEASE_TTL_SECS", defaults.lease_ttl),
            max_concurrent_items: parse_env("PW_MAX_CONCURRENT_ITEMS", defaults.max_concurrent_items),
            policy,
        };
        Self { host, port, database_url, scan_interval, scan_api_key, disable_scan_worker, scan }
    }
}

/// Reads and parses `name`, logging and falling back to `default` if it is missing or malformed.
fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

/// Reads a duration in whole seconds. Zero is rejected, like any other malformed value.
fn parse_env_secs(name: &str, default: Duration) -> Duration {
    match parse_env(name, default.as_secs()) {
        0 => {
            error!("🪛️ {name} must be at least one second. Using the default, {}s, instead.", default.as_secs());
            default
        },
        secs => Duration::from_secs(secs),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        env::set_var("PW_TEST_PORT_VALUE", "not-a-port");
        assert_eq!(parse_env("PW_TEST_PORT_VALUE", 8370u16), 8370);
        env::set_var("PW_TEST_PORT_VALUE", " 9000 ");
        assert_eq!(parse_env("PW_TEST_PORT_VALUE", 8370u16), 9000);
        assert_eq!(parse_env("PW_TEST_UNSET_VALUE", 42usize), 42);
    }

    #[test]
    fn zero_second_durations_fall_back_to_defaults() {
        let default = Duration::from_secs(60);
        env::set_var("PW_TEST_ZERO_SECS", "0");
        assert_eq!(parse_env_secs("PW_TEST_ZERO_SECS", default), default);
        env::set_var("PW_TEST_FIVE_SECS", "5");
        assert_eq!(parse_env_secs("PW_TEST_FIVE_SECS", default), Duration::from_secs(5));
        assert_eq!(parse_env_secs("PW_TEST_UNSET_SECS", default), default);
    }

    #[test]
    fn zero_interval_and_lease_ttl_are_not_accepted() {
        env::set_var("PW_SCAN_INTERVAL_SECS", "0");
        env::set_var("PW_LEASE_TTL_SECS", "0");
        let config = ServerConfig::from_env_or_default();
        env::remove_var("PW_SCAN_INTERVAL_SECS");
        env::remove_var("PW_LEASE_TTL_SECS");
        assert_eq!(config.scan_interval, DEFAULT_SCAN_INTERVAL);
        assert_eq!(config.scan.lease_ttl, ScanConfig::default().lease_ttl);
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::new("0.0.0.0", 80);
        assert_eq!(config.port, 80);
        assert_eq!(config.scan_interval, Duration::from_secs(60));
        assert!(config.scan_api_key.is_none());
        assert!(!config.disable_scan_worker);
    }
}
