//! Slot update transaction: changes one slot of a chart week and folds the
//! resulting reward deltas into the child's ledger.
//!
//! The grid write and the ledger write are two separate atomic mutations.
//! When the ledger write fails after the grid was written, the slot is put
//! back to its previous value so the two documents do not drift apart.

use tracing::{error, info, warn};

use crate::domain::chart_week_service::{ChartWeekService, SlotChange};
use crate::domain::child_service::ChildService;
use crate::domain::commands::chart::{ResetWeekResult, ToggleSlotCommand, ToggleSlotResult, WeekRef};
use crate::domain::ledger_service::LedgerService;
use crate::error::{ChartError, Result};

/// Orchestrates grid and ledger updates for one child
#[derive(Clone)]
pub struct SlotUpdateService {
    chart_week_service: ChartWeekService,
    child_service: ChildService,
    ledger_service: LedgerService,
}

impl SlotUpdateService {
    pub fn new(
        chart_week_service: ChartWeekService,
        child_service: ChildService,
        ledger_service: LedgerService,
    ) -> Self {
        Self {
            chart_week_service,
            child_service,
            ledger_service,
        }
    }

    async fn ensure_child(&self, child_id: &str) -> Result<()> {
        if !self.child_service.child_exists(child_id).await? {
            warn!("Slot update for unknown child {}", child_id);
            return Err(ChartError::ChildNotFound(child_id.to_string()));
        }
        Ok(())
    }

    /// Set one slot and apply the reward deltas it causes.
    ///
    /// Without an explicit `new_state` the stored value advances one step
    /// (Empty -> Star -> Cross -> Empty). Setting a slot to the value it
    /// already holds produces no deltas, so explicit updates are safe to replay.
    pub async fn toggle_slot(&self, command: ToggleSlotCommand) -> Result<ToggleSlotResult> {
        let ToggleSlotCommand {
            week,
            day_index,
            slot_index,
            new_state,
        } = command;

        ChartWeekService::validate_week(week.year, week.week)?;
        ChartWeekService::validate_indices(day_index, slot_index)?;
        self.ensure_child(&week.child_id).await?;

        let change = self
            .chart_week_service
            .update_slot(&week, day_index, slot_index, new_state)
            .await?;
        let deltas = change.deltas();

        info!(
            "Toggled {} day {} slot {}: {} -> {}",
            week.week_id(),
            day_index,
            slot_index,
            change.old_state,
            change.new_state
        );

        if deltas.is_zero() {
            return Ok(ToggleSlotResult {
                chart_week: change.chart_week,
                child: None,
            });
        }

        match self.ledger_service.apply_deltas(&week.child_id, deltas).await {
            Ok(child) => Ok(ToggleSlotResult {
                chart_week: change.chart_week,
                child: Some(child),
            }),
            Err(e) => {
                error!(
                    "Ledger update failed for {} after grid write: {}",
                    week.week_id(),
                    e
                );
                self.compensate(&week, day_index, slot_index, &change).await;
                Err(e)
            }
        }
    }

    /// Undo a grid write whose ledger update failed, unless another update
    /// has already replaced the value
    async fn compensate(
        &self,
        week: &WeekRef,
        day_index: usize,
        slot_index: usize,
        change: &SlotChange,
    ) {
        match self
            .chart_week_service
            .restore_slot(week, day_index, slot_index, change.new_state, change.old_state)
            .await
        {
            Ok(true) => info!(
                "Restored {} day {} slot {} to {}",
                week.week_id(),
                day_index,
                slot_index,
                change.old_state
            ),
            Ok(false) => warn!(
                "Not restoring {} day {} slot {}: it no longer holds {}",
                week.week_id(),
                day_index,
                slot_index,
                change.new_state
            ),
            Err(e) => error!(
                "Failed to restore {} day {} slot {} to {}: {}",
                week.week_id(),
                day_index,
                slot_index,
                change.old_state,
                e
            ),
        }
    }

    /// Clear the week's grid and zero the child's reward progress
    pub async fn reset_week(&self, week: WeekRef) -> Result<ResetWeekResult> {
        ChartWeekService::validate_week(week.year, week.week)?;
        self.ensure_child(&week.child_id).await?;

        let chart_week = self.chart_week_service.reset_week(&week).await?;
        let child = self.ledger_service.reset_progress(&week.child_id).await?;

        info!("Reset chart week {} and progress of child {}", chart_week.id, child.id);
        Ok(ResetWeekResult { chart_week, child })
    }
}
