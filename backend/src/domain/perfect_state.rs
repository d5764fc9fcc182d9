//! Pure predicates deciding when a day or a week is "perfect", and the
//! signed reward deltas produced when a slot changes.

use shared::{ChartWeek, DayState, SlotState, DAYS_PER_WEEK, SLOTS_PER_DAY};

/// A day is perfect when all three of its slots hold a star
pub fn is_day_perfect(day: &DayState) -> bool {
    day.iter().all(|slot| slot.is_star())
}

/// A week is perfect when all 21 slots are observed and every one is a star.
/// A week with un-materialized days is never perfect.
pub fn is_week_perfect(week: &ChartWeek) -> bool {
    let observed = week.data.values().flat_map(|day| day.iter()).count();
    observed == DAYS_PER_WEEK * SLOTS_PER_DAY
        && week.data.values().flat_map(|day| day.iter()).all(|slot| slot.is_star())
}

/// Perfect-state of one day and its week, captured around a slot update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfectSnapshot {
    pub day: bool,
    pub week: bool,
}

impl PerfectSnapshot {
    pub fn capture(week: &ChartWeek, day_index: usize) -> Self {
        Self {
            day: is_day_perfect(&week.day(day_index)),
            week: is_week_perfect(week),
        }
    }
}

/// Signed currency changes caused by one slot update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewardDeltas {
    pub stars: i32,
    pub perfect_days: i32,
    pub perfect_weeks: i32,
}

impl RewardDeltas {
    /// Compare the slot value and perfect-states before and after an update
    pub fn between(
        old_slot: SlotState,
        new_slot: SlotState,
        before: PerfectSnapshot,
        after: PerfectSnapshot,
    ) -> Self {
        Self {
            stars: edge_delta(old_slot.is_star(), new_slot.is_star()),
            perfect_days: edge_delta(before.day, after.day),
            perfect_weeks: edge_delta(before.week, after.week),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.stars == 0 && self.perfect_days == 0 && self.perfect_weeks == 0
    }
}

/// +1 on a false -> true edge, -1 on true -> false, otherwise 0
fn edge_delta(before: bool, after: bool) -> i32 {
    match (before, after) {
        (false, true) => 1,
        (true, false) => -1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use SlotState::{Cross, Empty, Star};

    fn all_days(day: DayState) -> ChartWeek {
        ChartWeek {
            id: "c:2024-W10".to_string(),
            data: (0..7u8).map(|d| (d, day)).collect(),
        }
    }

    #[test]
    fn test_day_perfect_only_when_all_stars() {
        let states = [Empty, Star, Cross];
        for a in states {
            for b in states {
                for c in states {
                    let expected = a == Star && b == Star && c == Star;
                    assert_eq!(is_day_perfect(&[a, b, c]), expected, "{:?}", [a, b, c]);
                }
            }
        }
    }

    #[test]
    fn test_week_perfect_matches_every_day_perfect() {
        assert!(is_week_perfect(&all_days([Star; 3])));
        assert!(!is_week_perfect(&all_days([Empty; 3])));

        let mut week = all_days([Star; 3]);
        week.data.insert(6, [Star, Star, Cross]);
        assert!(!is_week_perfect(&week));
    }

    #[test]
    fn test_week_with_missing_day_is_not_perfect() {
        let mut data = BTreeMap::new();
        for d in 0..6u8 {
            data.insert(d, [Star; 3]);
        }
        let week = ChartWeek {
            id: "c:2024-W10".to_string(),
            data,
        };
        assert!(!is_week_perfect(&week));
    }

    #[test]
    fn test_deltas_on_star_transitions() {
        let flat = PerfectSnapshot { day: false, week: false };

        let deltas = RewardDeltas::between(Empty, Star, flat, flat);
        assert_eq!(deltas.stars, 1);

        let deltas = RewardDeltas::between(Star, Cross, flat, flat);
        assert_eq!(deltas.stars, -1);

        let deltas = RewardDeltas::between(Cross, Empty, flat, flat);
        assert!(deltas.is_zero());

        let deltas = RewardDeltas::between(Star, Star, flat, flat);
        assert!(deltas.is_zero());
    }

    #[test]
    fn test_deltas_on_perfect_edges() {
        let none = PerfectSnapshot { day: false, week: false };
        let day = PerfectSnapshot { day: true, week: false };
        let both = PerfectSnapshot { day: true, week: true };

        let up = RewardDeltas::between(Empty, Star, none, both);
        assert_eq!(up, RewardDeltas { stars: 1, perfect_days: 1, perfect_weeks: 1 });

        let down = RewardDeltas::between(Star, Cross, both, none);
        assert_eq!(down, RewardDeltas { stars: -1, perfect_days: -1, perfect_weeks: -1 });

        let steady = RewardDeltas::between(Star, Star, day, day);
        assert!(steady.is_zero());
    }
}
