//! Application configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::scheduler::{ScheduleError, SweepSchedule};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REMINDER_SWEEP_MINUTES: u64 = 10;
const DEFAULT_COMPLETION_SWEEP_MINUTES: u64 = 60;

/// Runtime settings for the server and the sweep loops.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EVENTHUB")]
pub struct AppConfig {
    /// Port the HTTP server binds to.
    pub port: Option<u16>,
    /// Minutes between reminder sweep passes.
    pub reminder_sweep_minutes: Option<u64>,
    /// Minutes between completion sweep passes.
    pub completion_sweep_minutes: Option<u64>,
}

impl AppConfig {
    /// Return the configured port, falling back to the default.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Build and validate the sweep schedule.
    pub fn schedule(&self) -> Result<SweepSchedule, ScheduleError> {
        let schedule = SweepSchedule {
            reminder_period: Duration::from_secs(
                self.reminder_sweep_minutes
                    .unwrap_or(DEFAULT_REMINDER_SWEEP_MINUTES)
                    * 60,
            ),
            completion_period: Duration::from_secs(
                self.completion_sweep_minutes
                    .unwrap_or(DEFAULT_COMPLETION_SWEEP_MINUTES)
                    * 60,
            ),
        };
        schedule.validate()?;
        Ok(schedule)
    }
}
