//! Background scheduler driving the periodic sweeps.
//!
//! Two independent loops run on fixed periods: a frequent reminder pass and
//! an hourly completion pass. A failed pass is logged and the loop carries
//! on; transient store failures surface again on the next tick.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::domain::event::REMINDER_TOLERANCE_MINUTES;
use crate::domain::sweep::{CompletionSweep, ReminderSweep};

/// Sleep abstraction so tests can drive loops without real time.
#[async_trait]
pub trait SweepSleeper: Send + Sync {
    /// Pause the loop for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl SweepSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Invalid sweep periods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// A period of zero would spin the loop.
    #[error("sweep periods must be non-zero")]
    ZeroPeriod,
    /// The reminder period must not exceed the reminder window width, or
    /// whole windows would fall between consecutive passes.
    #[error("reminder sweep period must not exceed {max_minutes} minutes")]
    ReminderPeriodTooLong {
        /// Widest period that still covers every window.
        max_minutes: u64,
    },
}

/// Periods for the two sweep loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    /// Pause between reminder passes.
    pub reminder_period: Duration,
    /// Pause between completion passes.
    pub completion_period: Duration,
}

impl SweepSchedule {
    /// Widest reminder period that cannot skip a reminder window: the window
    /// spans twice the tolerance either side of the ideal instant.
    pub const MAX_REMINDER_PERIOD: Duration =
        Duration::from_secs(2 * REMINDER_TOLERANCE_MINUTES as u64 * 60);

    /// Check the periods against the window guarantees.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.reminder_period.is_zero() || self.completion_period.is_zero() {
            return Err(ScheduleError::ZeroPeriod);
        }
        if self.reminder_period > Self::MAX_REMINDER_PERIOD {
            return Err(ScheduleError::ReminderPeriodTooLong {
                max_minutes: Self::MAX_REMINDER_PERIOD.as_secs() / 60,
            });
        }
        Ok(())
    }
}

impl Default for SweepSchedule {
    fn default() -> Self {
        Self {
            reminder_period: Duration::from_secs(10 * 60),
            completion_period: Duration::from_secs(60 * 60),
        }
    }
}

/// Handles for the two spawned sweep loops.
pub struct SchedulerHandles {
    /// Reminder loop task.
    pub reminder: JoinHandle<()>,
    /// Completion loop task.
    pub completion: JoinHandle<()>,
}

/// Spawns and owns the sweep loops.
pub struct Scheduler {
    reminder: Arc<ReminderSweep>,
    completion: Arc<CompletionSweep>,
    sleeper: Arc<dyn SweepSleeper>,
    schedule: SweepSchedule,
}

impl Scheduler {
    /// Build a scheduler after validating `schedule`.
    pub fn new(
        reminder: Arc<ReminderSweep>,
        completion: Arc<CompletionSweep>,
        sleeper: Arc<dyn SweepSleeper>,
        schedule: SweepSchedule,
    ) -> Result<Self, ScheduleError> {
        schedule.validate()?;
        Ok(Self {
            reminder,
            completion,
            sleeper,
            schedule,
        })
    }

    /// Spawn both loops onto the current runtime.
    pub fn spawn(self) -> SchedulerHandles {
        info!(
            reminder_period_secs = self.schedule.reminder_period.as_secs(),
            completion_period_secs = self.schedule.completion_period.as_secs(),
            "starting sweep loops"
        );
        let reminder_sleeper = Arc::clone(&self.sleeper);
        let reminder_period = self.schedule.reminder_period;
        let reminder_sweep = self.reminder;
        let reminder = tokio::spawn(async move {
            loop {
                if let Err(err) = reminder_sweep.run_once().await {
                    error!(%err, "reminder sweep failed");
                }
                reminder_sleeper.sleep(reminder_period).await;
            }
        });

        let completion_period = self.schedule.completion_period;
        let completion_sweep = self.completion;
        let completion_sleeper = self.sleeper;
        let completion = tokio::spawn(async move {
            loop {
                if let Err(err) = completion_sweep.run_once().await {
                    error!(%err, "completion sweep failed");
                }
                completion_sleeper.sleep(completion_period).await;
            }
        });

        SchedulerHandles {
            reminder,
            completion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn default_schedule_is_valid() {
        assert_eq!(SweepSchedule::default().validate(), Ok(()));
    }

    #[rstest]
    fn rejects_zero_periods() {
        let schedule = SweepSchedule {
            reminder_period: Duration::ZERO,
            ..SweepSchedule::default()
        };
        assert_eq!(schedule.validate(), Err(ScheduleError::ZeroPeriod));
    }

    #[rstest]
    fn rejects_reminder_period_wider_than_the_window() {
        let schedule = SweepSchedule {
            reminder_period: Duration::from_secs(21 * 60),
            ..SweepSchedule::default()
        };
        assert_eq!(
            schedule.validate(),
            Err(ScheduleError::ReminderPeriodTooLong { max_minutes: 20 })
        );
    }

    #[rstest]
    fn accepts_reminder_period_at_the_bound() {
        let schedule = SweepSchedule {
            reminder_period: SweepSchedule::MAX_REMINDER_PERIOD,
            ..SweepSchedule::default()
        };
        assert_eq!(schedule.validate(), Ok(()));
    }
}
