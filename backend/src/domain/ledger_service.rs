//! Reward ledger service.
//!
//! Every operation is one atomic mutation of the child document: the
//! transformation validates, applies its change and finishes with an
//! allocation pass so totals, spent amounts and target achievement always
//! agree when the document is written.
//!
//! ## Business Rules
//!
//! - Totals and `prize_count` never go below zero
//! - `prize_count` follows perfect days in daily mode, perfect weeks in weekly mode
//! - Targets need a non-empty name and a positive count
//! - Editing or deleting an unknown target leaves the ledger unchanged

use chrono::Utc;
use shared::{Child, PrizeMode, PrizeTarget};
use tracing::{info, warn};

use crate::domain::allocation::{allocate, apply_delta};
use crate::domain::child_service::validate_child_name;
use crate::domain::commands::ledger::{AddTargetCommand, EditTargetCommand, UpdateSettingsCommand};
use crate::domain::perfect_state::RewardDeltas;
use crate::error::{ChartError, Result};
use crate::storage::EntityStore;

const MAX_TARGET_NAME_LENGTH: usize = 100;

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn touch(child: &mut Child) {
    child.updated_at = Utc::now().to_rfc3339();
}

fn validate_target_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ChartError::InvalidTarget("Prize name cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_TARGET_NAME_LENGTH {
        return Err(ChartError::InvalidTarget(format!(
            "Prize name cannot exceed {} characters",
            MAX_TARGET_NAME_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_target_count(count: i64) -> Result<u32> {
    match u32::try_from(count) {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ChartError::InvalidTarget(
            "Goal count must be a positive whole number".to_string(),
        )),
    }
}

/// The prize count a ledger is entitled to under a mode
fn prize_count_for(child: &Child, mode: PrizeMode) -> u32 {
    match mode {
        PrizeMode::Daily => child.total_perfect_days,
        PrizeMode::Weekly => child.total_perfect_weeks,
    }
}

/// Service applying reward changes to a child's ledger
#[derive(Clone)]
pub struct LedgerService {
    store: EntityStore,
}

impl LedgerService {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Atomically transform an existing child; a missing child aborts with `ChildNotFound`
    async fn mutate_child<F>(&self, child_id: &str, f: F) -> Result<Child>
    where
        F: FnOnce(Child) -> Result<Child> + Send + 'static,
    {
        let missing_id = child_id.to_string();
        self.store
            .mutate_with(child_id, move |current: Option<Child>| {
                let child = current.ok_or(ChartError::ChildNotFound(missing_id))?;
                f(child)
            })
            .await
    }

    /// Apply signed currency deltas, then re-run allocation
    pub async fn apply_deltas(&self, child_id: &str, deltas: RewardDeltas) -> Result<Child> {
        info!("Applying deltas to child {}: {:?}", child_id, deltas);

        self.mutate_child(child_id, move |mut child| {
            child.total_stars = apply_delta(child.total_stars, deltas.stars);
            child.total_perfect_days = apply_delta(child.total_perfect_days, deltas.perfect_days);
            child.total_perfect_weeks =
                apply_delta(child.total_perfect_weeks, deltas.perfect_weeks);

            let prize_delta = match child.prize_mode {
                PrizeMode::Daily => deltas.perfect_days,
                PrizeMode::Weekly => deltas.perfect_weeks,
            };
            child.prize_count = apply_delta(child.prize_count, prize_delta);

            touch(&mut child);
            Ok(allocate(child, now_millis()))
        })
        .await
    }

    /// Apply the provided settings. A prize mode change recomputes `prize_count`
    /// from the totals of the new mode.
    pub async fn update_settings(
        &self,
        child_id: &str,
        command: UpdateSettingsCommand,
    ) -> Result<Child> {
        info!("Updating settings for child {}: {:?}", child_id, command);

        let name = command.name.as_deref().map(validate_child_name).transpose()?;

        self.mutate_child(child_id, move |mut child| {
            if let Some(name) = name {
                child.name = name;
            }
            if let Some(pattern) = command.background_pattern {
                child.background_pattern = pattern;
            }
            if let Some(mode) = command.prize_mode {
                if mode != child.prize_mode {
                    child.prize_mode = mode;
                    child.prize_count = prize_count_for(&child, mode);
                }
            }
            touch(&mut child);
            Ok(child)
        })
        .await
    }

    /// Append a new unachieved target; it is funded immediately if affordable
    pub async fn add_target(&self, child_id: &str, command: AddTargetCommand) -> Result<Child> {
        info!("Adding prize target to child {}: {:?}", child_id, command);

        let name = validate_target_name(&command.name)?;
        let target_count = validate_target_count(command.target_count)?;
        let target_id = uuid::Uuid::new_v4().to_string();
        let owner_id = child_id.to_string();

        self.mutate_child(child_id, move |mut child| {
            let sequence = child.next_target_sequence;
            child.next_target_sequence += 1;
            child.prize_targets.push(PrizeTarget {
                id: target_id,
                child_id: owner_id,
                name,
                target_type: command.target_type,
                target_count,
                is_achieved: false,
                achieved_at: None,
                sequence,
            });
            touch(&mut child);
            Ok(allocate(child, now_millis()))
        })
        .await
    }

    /// Merge updates into a target. An unknown target id is ignored and the
    /// ledger is returned unchanged.
    pub async fn edit_target(
        &self,
        child_id: &str,
        target_id: &str,
        command: EditTargetCommand,
    ) -> Result<Child> {
        info!("Editing prize target {} of child {}: {:?}", target_id, child_id, command);

        let name = command.name.as_deref().map(validate_target_name).transpose()?;
        let target_count = command.target_count.map(validate_target_count).transpose()?;
        let target_id = target_id.to_string();

        self.mutate_child(child_id, move |mut child| {
            let Some(target) = child.prize_targets.iter_mut().find(|t| t.id == target_id) else {
                warn!("Prize target {} not found on child {}", target_id, child.id);
                return Ok(child);
            };

            if let Some(name) = name {
                target.name = name;
            }
            if let Some(target_type) = command.target_type {
                target.target_type = target_type;
            }
            if let Some(count) = target_count {
                target.target_count = count;
            }
            match command.is_achieved {
                Some(false) => {
                    target.is_achieved = false;
                    target.achieved_at = None;
                }
                Some(true) if !target.is_achieved => {
                    target.is_achieved = true;
                    target.achieved_at = Some(now_millis());
                }
                _ => {}
            }

            touch(&mut child);
            Ok(allocate(child, now_millis()))
        })
        .await
    }

    /// Remove a target and re-run allocation so the currency it held is released
    pub async fn delete_target(&self, child_id: &str, target_id: &str) -> Result<Child> {
        info!("Deleting prize target {} of child {}", target_id, child_id);

        let target_id = target_id.to_string();
        self.mutate_child(child_id, move |mut child| {
            let before = child.prize_targets.len();
            child.prize_targets.retain(|t| t.id != target_id);
            if child.prize_targets.len() == before {
                warn!("Prize target {} not found on child {}", target_id, child.id);
                return Ok(child);
            }
            touch(&mut child);
            Ok(allocate(child, now_millis()))
        })
        .await
    }

    /// Zero every counter and un-achieve every target
    pub async fn reset_progress(&self, child_id: &str) -> Result<Child> {
        info!("Resetting progress for child {}", child_id);

        self.mutate_child(child_id, |mut child| {
            child.prize_count = 0;
            child.total_stars = 0;
            child.total_perfect_days = 0;
            child.total_perfect_weeks = 0;
            for target in child.prize_targets.iter_mut() {
                target.is_achieved = false;
                target.achieved_at = None;
            }
            touch(&mut child);
            Ok(allocate(child, now_millis()))
        })
        .await
    }

    /// Grant one redeemable prize by hand
    pub async fn increment_prizes(&self, child_id: &str) -> Result<Child> {
        info!("Incrementing prize count for child {}", child_id);

        self.mutate_child(child_id, |mut child| {
            child.prize_count = child.prize_count.saturating_add(1);
            touch(&mut child);
            Ok(child)
        })
        .await
    }

    /// Redeem one prize; the count never goes below zero
    pub async fn decrement_prizes(&self, child_id: &str) -> Result<Child> {
        info!("Decrementing prize count for child {}", child_id);

        self.mutate_child(child_id, |mut child| {
            child.prize_count = child.prize_count.saturating_sub(1);
            touch(&mut child);
            Ok(child)
        })
        .await
    }
}
