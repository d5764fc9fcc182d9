//! Storage bindings for the chart and ledger documents.

use shared::{ChartWeek, Child};

use crate::storage::Entity;

/// Index of every child id
pub const CHILDREN_INDEX: &str = "children-by-id";

/// Index of the child ids owned by one parent
pub fn children_of_parent_index(parent_id: &str) -> String {
    format!("children-by-parent:{}", parent_id)
}

impl Entity for ChartWeek {
    const ENTITY_NAME: &'static str = "chart-week";

    fn initial_state(id: &str) -> Self {
        ChartWeek::empty(id)
    }
}

impl Entity for Child {
    const ENTITY_NAME: &'static str = "child";

    fn initial_state(id: &str) -> Self {
        Child {
            id: id.to_string(),
            ..Child::default()
        }
    }
}
