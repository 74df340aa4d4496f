//! Periodic inform scheduling
//!
//! The interval and enable flag live in the parameter store under
//! `ManagementServer.PeriodicInformInterval` / `PeriodicInformEnable`. They
//! are read once at startup and then tracked in memory; the ACS changes them
//! through parameter writes, which land here via the parameter change
//! handler.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapters::ParameterStore;
use crate::event::{EventCode, EventRegister};
use crate::parameters::ManagementParameter;
use crate::timer::{Dispatcher, TimerId};

/// Periodic inform settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PeriodicConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl PeriodicConfig {
    fn period(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// Parse an integer the way device scripts write them
///
/// Leading whitespace and an optional sign are accepted, parsing stops at the
/// first non-digit. Empty, unparsable or negative input yields 0.
pub fn parse_integer(value: &str) -> u64 {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative {
        return 0;
    }
    digits[..end].parse().unwrap_or(0)
}

/// Parse a CWMP boolean (`1`/`0`, `true`/`false`)
pub fn parse_flag(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return true;
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return false;
    }
    parse_integer(trimmed) != 0
}

/// Interval timer for scheduled informs
#[derive(Debug, Clone, Default)]
pub struct PeriodicScheduler {
    config: PeriodicConfig,
}

impl PeriodicScheduler {
    pub fn new(config: PeriodicConfig) -> Self {
        Self { config }
    }

    /// Load the settings from the store and arm the first fire
    ///
    /// The timer is armed whenever an interval value exists, even if periodic
    /// informs are disabled; the fire then simply does nothing.
    pub async fn from_store(store: &dyn ParameterStore, dispatcher: &mut dyn Dispatcher) -> Self {
        let mut scheduler = Self::default();

        let interval_name = ManagementParameter::PeriodicInformInterval.name();
        match store.get_value(interval_name).await {
            Ok(Some(value)) => {
                scheduler.config.interval_seconds = parse_integer(&value);
                dispatcher.arm(TimerId::Periodic, scheduler.config.period());
            }
            Ok(None) => debug!("no periodic inform interval configured"),
            Err(e) => warn!("could not read {}: {}", interval_name, e),
        }

        let enable_name = ManagementParameter::PeriodicInformEnable.name();
        match store.get_value(enable_name).await {
            Ok(Some(value)) => scheduler.config.enabled = parse_flag(&value),
            Ok(None) => {}
            Err(e) => warn!("could not read {}: {}", enable_name, e),
        }

        info!(
            "periodic inform {} with interval {}s",
            if scheduler.config.enabled { "enabled" } else { "disabled" },
            scheduler.config.interval_seconds
        );
        scheduler
    }

    pub fn config(&self) -> PeriodicConfig {
        self.config
    }

    /// Handle a periodic timer expiry
    ///
    /// Returns whether an inform should run now.
    pub fn on_fire(&mut self, event: &mut EventRegister, dispatcher: &mut dyn Dispatcher) -> bool {
        if self.config.enabled && self.config.interval_seconds > 0 {
            dispatcher.arm(TimerId::Periodic, self.config.period());
            event.set(EventCode::Periodic);
        }
        self.config.enabled
    }

    /// Apply a new interval and restart the timer from now
    pub fn on_interval_changed(&mut self, seconds: u64, dispatcher: &mut dyn Dispatcher) {
        self.config.interval_seconds = seconds;
        dispatcher.arm(TimerId::Periodic, self.config.period());
        info!("periodic inform interval changed to {}s", seconds);
    }

    pub fn on_enabled_changed(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        info!("periodic inform {}", if enabled { "enabled" } else { "disabled" });
    }
}
