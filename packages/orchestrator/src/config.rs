//! Orchestrator configuration from environment variables.

use std::str::FromStr;
use std::time::Duration;

/// Origin label used when `ORIGIN_LABEL` is not set.
pub const DEFAULT_ORIGIN: &str = "Home (Current)";

/// Timing and labels for the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Fixed origin text shown for every trip.
    pub origin: String,
    /// Cadence of the tracking ticker.
    pub tracking_tick: Duration,
    /// Progress added per tracking tick, in `(0, 1]`.
    pub tracking_step: f64,
    /// Seconds shown when an SOS countdown starts. At least 1.
    pub sos_countdown: u32,
    /// Cadence of the SOS countdown ticker.
    pub sos_tick: Duration,
}

impl Default for OrchestratorConfig {
    /// A full trip takes 200 ticks of 100ms; the SOS counts down from 5
    /// once per second.
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            tracking_tick: Duration::from_millis(100),
            tracking_step: 0.005,
            sos_countdown: 5,
            sos_tick: Duration::from_secs(1),
        }
    }
}

impl OrchestratorConfig {
    /// Reads the configuration from the environment.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `ORIGIN_LABEL` | `Home (Current)` |
    /// | `TRACKING_TICK_MS` | 100 |
    /// | `TRACKING_STEP` | 0.005 |
    /// | `SOS_COUNTDOWN_SECS` | 5 |
    /// | `SOS_TICK_MS` | 1000 |
    ///
    /// Unparseable or out-of-range values fall back to the default with a
    /// warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(&|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `var`.
    #[must_use]
    pub fn from_vars(var: &dyn Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            origin: var("ORIGIN_LABEL")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.origin),
            tracking_tick: env_parse(var, "TRACKING_TICK_MS", |ms: &u64| *ms > 0)
                .map_or(defaults.tracking_tick, Duration::from_millis),
            tracking_step: env_parse(var, "TRACKING_STEP", |step: &f64| {
                *step > 0.0 && *step <= 1.0
            })
            .unwrap_or(defaults.tracking_step),
            sos_countdown: env_parse(var, "SOS_COUNTDOWN_SECS", |secs: &u32| *secs > 0)
                .unwrap_or(defaults.sos_countdown),
            sos_tick: env_parse(var, "SOS_TICK_MS", |ms: &u64| *ms > 0)
                .map_or(defaults.sos_tick, Duration::from_millis),
        }
    }

    /// Number of tracking ticks a full trip takes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn ticks_per_trip(&self) -> u32 {
        (1.0 / self.tracking_step - 1e-9).ceil() as u32
    }
}

fn env_parse<T: FromStr>(
    var: &dyn Fn(&str) -> Option<String>,
    name: &str,
    valid: impl Fn(&T) -> bool,
) -> Option<T> {
    let raw = var(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => Some(value),
        _ => {
            log::warn!("Ignoring invalid {name}={raw:?}, using default");
            None
        }
    }
}
