//! Shared fixture for service tests.
//!
//! Every environment owns its own in-memory SQLite database, so tests never
//! observe each other's data.

use shared::Child;
use std::sync::Arc;

use crate::db::DbConnection;
use crate::domain::commands::children::CreateChildCommand;
use crate::domain::{ChartWeekService, ChildService, LedgerService, SlotUpdateService};
use crate::storage::{EntityStore, KeyValueStorage};

pub const TEST_PARENT_ID: &str = "parent@example.com";

/// Fully wired services over a fresh database
pub struct TestEnvironment {
    pub store: EntityStore,
    pub child_service: ChildService,
    pub chart_week_service: ChartWeekService,
    pub ledger_service: LedgerService,
    pub slot_update_service: SlotUpdateService,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let db = DbConnection::init_test()
            .await
            .expect("Failed to create test database");
        Self::with_storage(Arc::new(db))
    }

    /// Wire the services over a custom storage, e.g. one that injects failures
    pub fn with_storage(storage: Arc<dyn KeyValueStorage>) -> Self {
        let store = EntityStore::new(storage);

        let child_service = ChildService::new(store.clone());
        let chart_week_service = ChartWeekService::new(store.clone());
        let ledger_service = LedgerService::new(store.clone());
        let slot_update_service = SlotUpdateService::new(
            chart_week_service.clone(),
            child_service.clone(),
            ledger_service.clone(),
        );

        Self {
            store,
            child_service,
            chart_week_service,
            ledger_service,
            slot_update_service,
        }
    }

    /// Create a child owned by [`TEST_PARENT_ID`]
    pub async fn create_child(&self, name: &str) -> Child {
        self.child_service
            .create_child(CreateChildCommand {
                parent_id: TEST_PARENT_ID.to_string(),
                name: name.to_string(),
            })
            .await
            .expect("Failed to create test child")
    }
}
