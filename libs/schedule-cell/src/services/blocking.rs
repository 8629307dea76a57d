// libs/schedule-cell/src/services/blocking.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info};

use crate::error::ScheduleError;
use crate::models::{
    validate_professional_id, BlockKind, BlockedDay, BlockedDayForEmployee, BlockedTime, DateBlock,
    ProfessionalBlocks,
};
use crate::services::store::BlockingStore;

pub struct BlockingService {
    store: Arc<dyn BlockingStore>,
}

impl BlockingService {
    pub fn new(store: Arc<dyn BlockingStore>) -> Self {
        Self { store }
    }

    pub async fn block_whole_day(&self, date: NaiveDate) -> Result<BlockedDay, ScheduleError> {
        let block = BlockedDay { date };
        self.store
            .put_blocked_day(&block)
            .await
            .map_err(ScheduleError::store)?;
        info!("Blocked clinic on {}", date);
        Ok(block)
    }

    pub async fn block_day_for_professional(
        &self,
        date: NaiveDate,
        professional_id: &str,
    ) -> Result<BlockedDayForEmployee, ScheduleError> {
        validate_professional_id(professional_id)?;
        let block = BlockedDayForEmployee {
            date,
            professional_id: professional_id.to_string(),
        };
        self.store
            .put_blocked_day_for_employee(&block)
            .await
            .map_err(ScheduleError::store)?;
        info!("Blocked {} for professional {}", date, professional_id);
        Ok(block)
    }

    pub async fn block_single_time(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        professional_id: &str,
    ) -> Result<BlockedTime, ScheduleError> {
        validate_professional_id(professional_id)?;
        let block = BlockedTime {
            date,
            time,
            professional_id: professional_id.to_string(),
        };
        self.store
            .put_blocked_time(&block)
            .await
            .map_err(ScheduleError::store)?;
        info!("Blocked {} for professional {}", block.key(), professional_id);
        Ok(block)
    }

    /// Removing a block that does not exist is not an error.
    pub async fn unblock(&self, kind: BlockKind, key: &str) -> Result<bool, ScheduleError> {
        let removed = self
            .store
            .delete_block(kind, key)
            .await
            .map_err(ScheduleError::store)?;
        info!("Unblock {:?} {} (removed: {})", kind, key, removed);
        Ok(removed)
    }

    pub async fn blocked_days(&self) -> Result<Vec<NaiveDate>, ScheduleError> {
        let mut days = self
            .store
            .get_blocked_days()
            .await
            .map_err(ScheduleError::store)?;
        days.sort();
        days.dedup();
        Ok(days)
    }

    pub async fn blocks_on(&self, date: NaiveDate) -> Result<Vec<DateBlock>, ScheduleError> {
        self.store
            .get_blocked_times_and_days(date)
            .await
            .map_err(ScheduleError::store)
    }

    pub async fn is_clinic_closed(&self, date: NaiveDate) -> Result<bool, ScheduleError> {
        Ok(self.blocked_days().await?.contains(&date))
    }

    pub async fn professional_blocks(
        &self,
        date: NaiveDate,
        professional_id: &str,
    ) -> Result<ProfessionalBlocks, ScheduleError> {
        let blocks = self.blocks_on(date).await?;

        let mut result = ProfessionalBlocks::default();
        for block in blocks.into_iter().filter(|b| b.professional_id() == professional_id) {
            match block {
                DateBlock::ProfessionalDay(_) => result.whole_day = true,
                DateBlock::Time(blocked) => {
                    result.times.insert(blocked.time);
                }
            }
        }

        debug!(
            "Blocks for {} on {}: whole_day={}, times={}",
            professional_id,
            date,
            result.whole_day,
            result.times.len()
        );
        Ok(result)
    }
}
