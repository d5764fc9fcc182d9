//! Allocation of accumulated reward currency against prize targets.
//!
//! Targets are funded first-come, first-funded: unachieved targets are
//! visited in ascending insertion `sequence` and achieved when enough
//! unspent currency of their type remains. Achieved targets are never
//! revisited, so a currency unit is never spent on two targets.
//!
//! Spent amounts are recomputed from the achieved set on every pass rather
//! than tracked incrementally, which makes [`allocate`] idempotent.

use shared::{Child, PrizeTarget, PrizeTargetType};

/// Per-currency amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurrencyTally {
    pub stars: u32,
    pub days: u32,
    pub weeks: u32,
}

impl CurrencyTally {
    pub fn totals_of(child: &Child) -> Self {
        Self {
            stars: child.total_stars,
            days: child.total_perfect_days,
            weeks: child.total_perfect_weeks,
        }
    }

    /// Sum of target counts over the achieved targets
    pub fn committed_by(targets: &[PrizeTarget]) -> Self {
        targets
            .iter()
            .filter(|target| target.is_achieved)
            .fold(Self::default(), |mut tally, target| {
                let slot = tally.get_mut(target.target_type);
                *slot = slot.saturating_add(target.target_count);
                tally
            })
    }

    pub fn get(&self, target_type: PrizeTargetType) -> u32 {
        match target_type {
            PrizeTargetType::Stars => self.stars,
            PrizeTargetType::Days => self.days,
            PrizeTargetType::Weeks => self.weeks,
        }
    }

    fn get_mut(&mut self, target_type: PrizeTargetType) -> &mut u32 {
        match target_type {
            PrizeTargetType::Stars => &mut self.stars,
            PrizeTargetType::Days => &mut self.days,
            PrizeTargetType::Weeks => &mut self.weeks,
        }
    }

    fn saturating_sub(self, other: Self) -> Self {
        Self {
            stars: self.stars.saturating_sub(other.stars),
            days: self.days.saturating_sub(other.days),
            weeks: self.weeks.saturating_sub(other.weeks),
        }
    }
}

/// Mark every affordable unachieved target as achieved and recompute the
/// spent amounts of the ledger.
///
/// `now_millis` is stamped into `achieved_at` of newly achieved targets.
pub fn allocate(mut child: Child, now_millis: i64) -> Child {
    child.prize_targets.sort_by_key(|target| target.sequence);

    let totals = CurrencyTally::totals_of(&child);
    let mut committed = CurrencyTally::committed_by(&child.prize_targets);
    let mut available = totals.saturating_sub(committed);

    for target in child.prize_targets.iter_mut().filter(|t| !t.is_achieved) {
        let remaining = available.get_mut(target.target_type);
        if *remaining >= target.target_count {
            *remaining -= target.target_count;
            let spent = committed.get_mut(target.target_type);
            *spent = spent.saturating_add(target.target_count);
            target.is_achieved = true;
            target.achieved_at = Some(now_millis);
        }
    }

    // Totals can drop below what achieved targets consumed (a star taken back
    // after its target was funded); spent is capped so it never exceeds total.
    child.spent_stars = committed.stars.min(totals.stars);
    child.spent_perfect_days = committed.days.min(totals.days);
    child.spent_perfect_weeks = committed.weeks.min(totals.weeks);
    child
}

/// Apply a signed delta to a counter, clamping at zero
pub fn apply_delta(total: u32, delta: i32) -> u32 {
    total.saturating_add_signed(delta)
}
