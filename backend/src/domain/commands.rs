//! Domain-level command and result types.
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the DTOs defined in the
//! `shared` crate to these internal types.

pub mod chart {
    use shared::{Child, ChartWeek, SlotState};

    /// Identifies one child's ISO week
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct WeekRef {
        pub child_id: String,
        pub year: i32,
        pub week: u32,
    }

    impl WeekRef {
        pub fn new(child_id: impl Into<String>, year: i32, week: u32) -> Self {
            Self {
                child_id: child_id.into(),
                year,
                week,
            }
        }

        pub fn week_id(&self) -> String {
            ChartWeek::generate_id(&self.child_id, self.year, self.week)
        }
    }

    /// Input for toggling a single slot
    #[derive(Debug, Clone)]
    pub struct ToggleSlotCommand {
        pub week: WeekRef,
        pub day_index: usize,
        pub slot_index: usize,
        /// Explicit target value; `None` advances the stored value one step
        pub new_state: Option<SlotState>,
    }

    /// Result of toggling a slot
    #[derive(Debug, Clone)]
    pub struct ToggleSlotResult {
        pub chart_week: ChartWeek,
        /// Present only when the ledger was mutated
        pub child: Option<Child>,
    }

    /// Result of resetting a week
    #[derive(Debug, Clone)]
    pub struct ResetWeekResult {
        pub chart_week: ChartWeek,
        pub child: Child,
    }
}

pub mod ledger {
    use shared::{BackgroundPattern, PrizeMode, PrizeTargetType};

    /// Partial update of child settings
    #[derive(Debug, Clone, Default)]
    pub struct UpdateSettingsCommand {
        pub name: Option<String>,
        pub prize_mode: Option<PrizeMode>,
        pub background_pattern: Option<BackgroundPattern>,
    }

    /// Input for creating a prize target
    #[derive(Debug, Clone)]
    pub struct AddTargetCommand {
        pub name: String,
        pub target_type: PrizeTargetType,
        pub target_count: i64,
    }

    /// Fields merged into an existing prize target
    #[derive(Debug, Clone, Default)]
    pub struct EditTargetCommand {
        pub name: Option<String>,
        pub target_type: Option<PrizeTargetType>,
        pub target_count: Option<i64>,
        pub is_achieved: Option<bool>,
    }
}

pub mod children {
    /// Input for creating a child profile
    #[derive(Debug, Clone)]
    pub struct CreateChildCommand {
        pub parent_id: String,
        pub name: String,
    }
}
