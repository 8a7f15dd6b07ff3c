//! Env parsing and constants.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bevy::log::warn;
use url::Url;

use crate::data::usgs::USGS_ENDPOINT;
use crate::frames::GranularityThresholds;

const DEFAULT_LIVE_DAYS: u32 = 30;
const DEFAULT_MIN_MAG: f64 = 3.0;
const DEFAULT_HEAT_FRAME_MS: u64 = 700;
const DEFAULT_GLOBE_FRAME_MS: u64 = 650;
pub const GLOBE_HISTORY_DAYS: u32 = 365;
pub const GLOBE_MIN_MAG: f64 = 5.5;

/// Everything the app reads from the environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub usgs_endpoint: Url,
    pub live_days: u32,
    pub min_magnitude: f64,
    pub heat_period: Duration,
    pub globe_period: Duration,
    /// Historical catalogue for the globe; USGS worldwide query when unset.
    pub globe_csv: Option<PathBuf>,
    pub thresholds: GranularityThresholds,
    /// Replay the heatmap feed from this JSON fixture instead of fetching.
    pub fixture: Option<PathBuf>,
    /// Write the fetched heatmap feed to this JSON fixture.
    pub record: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            usgs_endpoint: default_endpoint(),
            live_days: DEFAULT_LIVE_DAYS,
            min_magnitude: DEFAULT_MIN_MAG,
            heat_period: Duration::from_millis(DEFAULT_HEAT_FRAME_MS),
            globe_period: Duration::from_millis(DEFAULT_GLOBE_FRAME_MS),
            globe_csv: None,
            thresholds: GranularityThresholds::default(),
            fixture: None,
            record: None,
        }
    }
}

fn default_endpoint() -> Url {
    USGS_ENDPOINT.parse::<Url>().unwrap_or_else(|err| {
        panic!("tremor: invalid built-in endpoint {USGS_ENDPOINT:?}: {err}");
    })
}

/// Parse `key` if set; warn and return `None` when the value is unusable.
fn env_parse<T: FromStr>(key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("tremor: invalid {key} {raw:?}: {err}");
            None
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_period(key: &str, default_ms: u64) -> Duration {
    match env_parse::<u64>(key) {
        Some(0) => {
            warn!("tremor: {key} must be positive, using {default_ms}ms");
            Duration::from_millis(default_ms)
        }
        Some(ms) => Duration::from_millis(ms),
        None => Duration::from_millis(default_ms),
    }
}

fn env_thresholds() -> GranularityThresholds {
    let defaults = GranularityThresholds::default();
    let daily = env_parse::<f64>("TREMOR_DAILY_MAX_DAYS").unwrap_or(defaults.daily_max_days());
    let weekly =
        env_parse::<f64>("TREMOR_WEEKLY_MAX_DAYS").unwrap_or(defaults.weekly_max_days());
    GranularityThresholds::new(daily, weekly).unwrap_or_else(|err| {
        warn!("tremor: {err}, using default granularity thresholds");
        defaults
    })
}

/// Build the app configuration from `TREMOR_*` environment variables,
/// falling back to defaults for anything unset or invalid.
pub fn app_config() -> AppConfig {
    let defaults = AppConfig::default();
    AppConfig {
        usgs_endpoint: env_parse::<Url>("TREMOR_USGS_ENDPOINT").unwrap_or(defaults.usgs_endpoint),
        live_days: env_parse("TREMOR_LIVE_DAYS")
            .filter(|d: &u32| *d > 0)
            .unwrap_or(defaults.live_days),
        min_magnitude: env_parse("TREMOR_MIN_MAG")
            .filter(|m: &f64| m.is_finite())
            .unwrap_or(defaults.min_magnitude),
        heat_period: env_period("TREMOR_FRAME_MS", DEFAULT_HEAT_FRAME_MS),
        globe_period: env_period("TREMOR_GLOBE_FRAME_MS", DEFAULT_GLOBE_FRAME_MS),
        globe_csv: env_path("TREMOR_GLOBE_CSV"),
        thresholds: env_thresholds(),
        fixture: env_path("TREMOR_FIXTURE"),
        record: env_path("TREMOR_RECORD"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    struct EnvGuard {
        snapshot: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn capture(keys: &[&'static str]) -> Self {
            let snapshot = keys
                .iter()
                .map(|&key| {
                    let previous = std::env::var(key).ok();
                    std::env::remove_var(key);
                    (key, previous)
                })
                .collect();
            Self { snapshot }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.snapshot {
                match value {
                    Some(val) => std::env::set_var(key, val),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    const ENV_KEYS: [&str; 10] = [
        "TREMOR_USGS_ENDPOINT",
        "TREMOR_LIVE_DAYS",
        "TREMOR_MIN_MAG",
        "TREMOR_FRAME_MS",
        "TREMOR_GLOBE_FRAME_MS",
        "TREMOR_GLOBE_CSV",
        "TREMOR_DAILY_MAX_DAYS",
        "TREMOR_WEEKLY_MAX_DAYS",
        "TREMOR_FIXTURE",
        "TREMOR_RECORD",
    ];

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        let config = app_config();

        assert_eq!(config.usgs_endpoint.as_str(), USGS_ENDPOINT);
        assert_eq!(config.live_days, 30);
        assert_eq!(config.min_magnitude, 3.0);
        assert_eq!(config.heat_period, Duration::from_millis(700));
        assert_eq!(config.globe_period, Duration::from_millis(650));
        assert_eq!(config.thresholds, GranularityThresholds::default());
        assert!(config.globe_csv.is_none());
        assert!(config.fixture.is_none());
    }

    #[test]
    fn env_values_override_defaults() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        std::env::set_var("TREMOR_LIVE_DAYS", "7");
        std::env::set_var("TREMOR_MIN_MAG", "4.5");
        std::env::set_var("TREMOR_FRAME_MS", "250");
        std::env::set_var("TREMOR_GLOBE_CSV", "data/quakes.csv");
        std::env::set_var("TREMOR_DAILY_MAX_DAYS", "14");
        std::env::set_var("TREMOR_WEEKLY_MAX_DAYS", "90");

        let config = app_config();

        assert_eq!(config.live_days, 7);
        assert_eq!(config.min_magnitude, 4.5);
        assert_eq!(config.heat_period, Duration::from_millis(250));
        assert_eq!(config.globe_csv, Some(PathBuf::from("data/quakes.csv")));
        assert_eq!(
            config.thresholds,
            GranularityThresholds::new(14.0, 90.0).unwrap()
        );
    }

    #[test]
    fn invalid_values_fall_back() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        std::env::set_var("TREMOR_USGS_ENDPOINT", "not a url");
        std::env::set_var("TREMOR_LIVE_DAYS", "0");
        std::env::set_var("TREMOR_FRAME_MS", "0");
        std::env::set_var("TREMOR_GLOBE_FRAME_MS", "fast");
        std::env::set_var("TREMOR_DAILY_MAX_DAYS", "200");

        let config = app_config();

        assert_eq!(config.usgs_endpoint.as_str(), USGS_ENDPOINT);
        assert_eq!(config.live_days, 30);
        assert_eq!(config.heat_period, Duration::from_millis(700));
        assert_eq!(config.globe_period, Duration::from_millis(650));
        assert_eq!(config.thresholds, GranularityThresholds::default());
    }
}
