// libs/schedule-cell/src/services/slots.rs
use chrono::NaiveTime;

use shared_config::DEFAULT_SLOT_STEP_MINUTES;

use crate::error::ScheduleError;
use crate::models::ScheduleEntry;
use crate::time::{from_minutes, minutes_since_midnight};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Turns working hours into candidate slot times at a fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGenerator {
    step_minutes: u32,
}

impl Default for SlotGenerator {
    fn default() -> Self {
        Self {
            step_minutes: DEFAULT_SLOT_STEP_MINUTES,
        }
    }
}

impl SlotGenerator {
    pub fn new(step_minutes: u32) -> Result<Self, ScheduleError> {
        if step_minutes == 0 || step_minutes >= MINUTES_PER_DAY {
            return Err(ScheduleError::ValidationError(format!(
                "Slot step must be between 1 and {} minutes, got {}",
                MINUTES_PER_DAY - 1,
                step_minutes
            )));
        }
        Ok(Self { step_minutes })
    }

    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    /// Every `step` from `start` up to and including the last value not past
    /// `end`, skipping values in `[lunch_start, lunch_end)`. Ascending and
    /// duplicate-free; empty when lunch covers the whole range.
    pub fn generate(
        &self,
        start: NaiveTime,
        end: NaiveTime,
        lunch: Option<(NaiveTime, NaiveTime)>,
    ) -> Vec<NaiveTime> {
        let start = minutes_since_midnight(start);
        let end = minutes_since_midnight(end);
        let lunch = lunch.map(|(from, to)| (minutes_since_midnight(from), minutes_since_midnight(to)));

        (start..=end)
            .step_by(self.step_minutes as usize)
            .filter(|minute| !lunch.is_some_and(|(from, to)| *minute >= from && *minute < to))
            .filter_map(from_minutes)
            .collect()
    }

    pub fn generate_for(&self, entry: &ScheduleEntry) -> Vec<NaiveTime> {
        self.generate(entry.start_time, entry.end_time, entry.lunch_window())
    }
}
