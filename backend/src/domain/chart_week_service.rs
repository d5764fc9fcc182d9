//! Chart week service: the per-child, per-ISO-week 7×3 slot grid.
//!
//! Weeks are created lazily by find-or-create and only ever changed by
//! setting a single slot or resetting the whole week. Every change goes
//! through the store's atomic mutate for the week key.

use chrono::{Datelike, Local, NaiveDate, Weekday};
use shared::{ChartWeek, SlotState, DAYS_PER_WEEK, SLOTS_PER_DAY};
use tracing::{debug, info};

use crate::domain::commands::chart::WeekRef;
use crate::domain::perfect_state::{PerfectSnapshot, RewardDeltas};
use crate::error::{ChartError, Result};
use crate::storage::EntityStore;

/// Outcome of a single slot write
#[derive(Debug, Clone)]
pub struct SlotChange {
    pub chart_week: ChartWeek,
    pub old_state: SlotState,
    pub new_state: SlotState,
    pub before: PerfectSnapshot,
    pub after: PerfectSnapshot,
}

impl SlotChange {
    pub fn deltas(&self) -> RewardDeltas {
        RewardDeltas::between(self.old_state, self.new_state, self.before, self.after)
    }
}

/// Service for reading and writing chart weeks
#[derive(Clone)]
pub struct ChartWeekService {
    store: EntityStore,
}

impl ChartWeekService {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// ISO year and week of today's local date
    pub fn current_week() -> (i32, u32) {
        let iso = Local::now().date_naive().iso_week();
        (iso.year(), iso.week())
    }

    /// Reject weeks that do not exist in the given ISO year (e.g. W53 of a 52-week year)
    pub fn validate_week(year: i32, week: u32) -> Result<()> {
        match NaiveDate::from_isoywd_opt(year, week, Weekday::Mon) {
            Some(_) => Ok(()),
            None => Err(ChartError::InvalidWeek { year, week }),
        }
    }

    pub fn validate_indices(day_index: usize, slot_index: usize) -> Result<()> {
        if day_index >= DAYS_PER_WEEK || slot_index >= SLOTS_PER_DAY {
            return Err(ChartError::InvalidIndex {
                day_index,
                slot_index,
            });
        }
        Ok(())
    }

    /// Get a week, creating and persisting an all-empty one on first access
    pub async fn get_week(&self, week: &WeekRef) -> Result<ChartWeek> {
        Self::validate_week(week.year, week.week)?;
        let week_id = week.week_id();

        if let Some(existing) = self.store.find::<ChartWeek>(&week_id).await? {
            return Ok(existing);
        }

        info!("Creating chart week {}", week_id);
        let created_id = week_id.clone();
        self.store
            .mutate_with(&week_id, move |current: Option<ChartWeek>| {
                // Another request may have created the week since the read above
                Ok(current.unwrap_or_else(|| ChartWeek::empty(created_id)))
            })
            .await
    }

    /// Set one slot and return the full updated week
    pub async fn set_slot(
        &self,
        week: &WeekRef,
        day_index: usize,
        slot_index: usize,
        new_state: SlotState,
    ) -> Result<ChartWeek> {
        let change = self
            .update_slot(week, day_index, slot_index, Some(new_state))
            .await?;
        Ok(change.chart_week)
    }

    /// Set one slot, or advance it one step when `new_state` is `None`.
    ///
    /// The previous value and both perfect snapshots are taken inside the
    /// same atomic mutation as the write, so concurrent updates of one week
    /// each observe the state left by the one before.
    pub async fn update_slot(
        &self,
        week: &WeekRef,
        day_index: usize,
        slot_index: usize,
        new_state: Option<SlotState>,
    ) -> Result<SlotChange> {
        Self::validate_week(week.year, week.week)?;
        Self::validate_indices(day_index, slot_index)?;
        let week_id = week.week_id();

        let (chart_week, (old_state, new_state, before)) = self
            .store
            .mutate_returning(&week_id, move |mut chart_week: ChartWeek| {
                let before = PerfectSnapshot::capture(&chart_week, day_index);
                let mut day = chart_week.day(day_index);
                let old_state = day[slot_index];
                let new_state = new_state.unwrap_or_else(|| old_state.next());

                day[slot_index] = new_state;
                // day_index < DAYS_PER_WEEK was validated above
                chart_week.data.insert(day_index as u8, day);
                Ok((chart_week, (old_state, new_state, before)))
            })
            .await?;

        debug!(
            "Set {} day {} slot {}: {} -> {}",
            week_id, day_index, slot_index, old_state, new_state
        );

        let after = PerfectSnapshot::capture(&chart_week, day_index);
        Ok(SlotChange {
            chart_week,
            old_state,
            new_state,
            before,
            after,
        })
    }

    /// Put a slot back to `previous`, but only while it still holds `expected`.
    /// Returns whether the slot was restored.
    pub async fn restore_slot(
        &self,
        week: &WeekRef,
        day_index: usize,
        slot_index: usize,
        expected: SlotState,
        previous: SlotState,
    ) -> Result<bool> {
        Self::validate_week(week.year, week.week)?;
        Self::validate_indices(day_index, slot_index)?;

        let (_, restored) = self
            .store
            .mutate_returning(&week.week_id(), move |mut chart_week: ChartWeek| {
                let mut day = chart_week.day(day_index);
                if day[slot_index] != expected {
                    return Ok((chart_week, false));
                }
                day[slot_index] = previous;
                chart_week.data.insert(day_index as u8, day);
                Ok((chart_week, true))
            })
            .await?;
        Ok(restored)
    }

    /// Clear every slot of a week
    pub async fn reset_week(&self, week: &WeekRef) -> Result<ChartWeek> {
        Self::validate_week(week.year, week.week)?;
        let week_id = week.week_id();
        info!("Resetting chart week {}", week_id);

        self.store
            .mutate(&week_id, |chart_week: ChartWeek| Ok(ChartWeek::empty(chart_week.id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnvironment;
    use SlotState::{Cross, Empty, Star};

    fn week_ref() -> WeekRef {
        WeekRef::new("child-1", 2024, 34)
    }

    #[tokio::test]
    async fn test_get_week_creates_empty_week_once() {
        let env = TestEnvironment::new().await;
        let service = &env.chart_week_service;

        assert!(!env.store.exists::<ChartWeek>("child-1:2024-W34").await.unwrap());

        let week = service.get_week(&week_ref()).await.unwrap();
        assert_eq!(week.id, "child-1:2024-W34");
        assert_eq!(week.data.len(), 7);
        assert!(week.data.values().all(|day| *day == [Empty; 3]));
        assert!(env.store.exists::<ChartWeek>("child-1:2024-W34").await.unwrap());

        let again = service.get_week(&week_ref()).await.unwrap();
        assert_eq!(week, again);
    }

    #[tokio::test]
    async fn test_get_week_returns_existing_state() {
        let env = TestEnvironment::new().await;
        let service = &env.chart_week_service;

        service.set_slot(&week_ref(), 2, 1, Star).await.unwrap();
        let week = service.get_week(&week_ref()).await.unwrap();
        assert_eq!(week.day(2), [Empty, Star, Empty]);
    }

    #[tokio::test]
    async fn test_set_slot_returns_full_week() {
        let env = TestEnvironment::new().await;
        let service = &env.chart_week_service;

        service.set_slot(&week_ref(), 0, 0, Star).await.unwrap();
        let week = service.set_slot(&week_ref(), 6, 2, Cross).await.unwrap();

        assert_eq!(week.day(0), [Star, Empty, Empty]);
        assert_eq!(week.day(6), [Empty, Empty, Cross]);
        assert_eq!(week.data.len(), 7);
    }

    #[tokio::test]
    async fn test_set_slot_rejects_out_of_range_indices() {
        let env = TestEnvironment::new().await;
        let service = &env.chart_week_service;

        let result = service.set_slot(&week_ref(), 7, 0, Star).await;
        assert!(matches!(result, Err(ChartError::InvalidIndex { day_index: 7, .. })));

        let result = service.set_slot(&week_ref(), 0, 3, Star).await;
        assert!(matches!(result, Err(ChartError::InvalidIndex { slot_index: 3, .. })));

        // Nothing was written by the rejected calls
        assert!(!env.store.exists::<ChartWeek>("child-1:2024-W34").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_slot_reports_transition() {
        let env = TestEnvironment::new().await;
        let service = &env.chart_week_service;
        service.set_slot(&week_ref(), 5, 0, Star).await.unwrap();
        service.set_slot(&week_ref(), 5, 1, Star).await.unwrap();

        let change = service.update_slot(&week_ref(), 5, 2, None).await.unwrap();
        assert_eq!((change.old_state, change.new_state), (Empty, Star));
        assert!(!change.before.day);
        assert!(change.after.day);
        assert_eq!(change.deltas().perfect_days, 1);

        let change = service.update_slot(&week_ref(), 5, 2, None).await.unwrap();
        assert_eq!((change.old_state, change.new_state), (Star, Cross));
        assert_eq!(change.deltas().stars, -1);
        assert_eq!(change.deltas().perfect_days, -1);
    }

    #[tokio::test]
    async fn test_restore_slot_only_when_unchanged() {
        let env = TestEnvironment::new().await;
        let service = &env.chart_week_service;
        service.set_slot(&week_ref(), 0, 0, Star).await.unwrap();

        let restored = service.restore_slot(&week_ref(), 0, 0, Star, Empty).await.unwrap();
        assert!(restored);
        assert_eq!(service.get_week(&week_ref()).await.unwrap().day(0)[0], Empty);

        service.set_slot(&week_ref(), 0, 0, Cross).await.unwrap();
        let restored = service.restore_slot(&week_ref(), 0, 0, Star, Empty).await.unwrap();
        assert!(!restored);
        assert_eq!(service.get_week(&week_ref()).await.unwrap().day(0)[0], Cross);
    }

    #[tokio::test]
    async fn test_weeks_are_isolated_by_child_and_week() {
        let env = TestEnvironment::new().await;
        let service = &env.chart_week_service;

        service.set_slot(&week_ref(), 0, 0, Star).await.unwrap();

        let other_week = service.get_week(&WeekRef::new("child-1", 2024, 35)).await.unwrap();
        let other_child = service.get_week(&WeekRef::new("child-2", 2024, 34)).await.unwrap();
        assert_eq!(other_week.day(0), [Empty; 3]);
        assert_eq!(other_child.day(0), [Empty; 3]);
    }

    #[tokio::test]
    async fn test_reset_week_clears_all_slots() {
        let env = TestEnvironment::new().await;
        let service = &env.chart_week_service;

        for day in 0..7 {
            service.set_slot(&week_ref(), day, 1, Star).await.unwrap();
        }
        let week = service.reset_week(&week_ref()).await.unwrap();

        assert_eq!(week.id, "child-1:2024-W34");
        assert!(week.data.values().all(|day| *day == [Empty; 3]));
        assert_eq!(service.get_week(&week_ref()).await.unwrap(), week);
    }

    #[test]
    fn test_validate_week() {
        assert!(ChartWeekService::validate_week(2024, 1).is_ok());
        assert!(ChartWeekService::validate_week(2020, 53).is_ok());
        assert!(matches!(
            ChartWeekService::validate_week(2023, 53),
            Err(ChartError::InvalidWeek { year: 2023, week: 53 })
        ));
        assert!(ChartWeekService::validate_week(2024, 0).is_err());
    }

    #[test]
    fn test_current_week_is_valid() {
        let (year, week) = ChartWeekService::current_week();
        assert!(ChartWeekService::validate_week(year, week).is_ok());
    }
}
