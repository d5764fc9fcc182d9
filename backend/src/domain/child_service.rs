use chrono::Utc;
use shared::Child;
use tracing::{info, warn};

use crate::domain::commands::children::CreateChildCommand;
use crate::domain::entities::{children_of_parent_index, CHILDREN_INDEX};
use crate::error::{ChartError, Result};
use crate::storage::EntityStore;

const MAX_NAME_LENGTH: usize = 100;

/// Validate a child name, returning the trimmed value
pub(crate) fn validate_child_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ChartError::InvalidSettings("Child name cannot be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ChartError::InvalidSettings(format!(
            "Child name cannot exceed {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

/// Service for managing child profiles
#[derive(Clone)]
pub struct ChildService {
    store: EntityStore,
}

impl ChildService {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Create a new child with an empty ledger
    pub async fn create_child(&self, command: CreateChildCommand) -> Result<Child> {
        info!("Creating child: name={}, parent={}", command.name, command.parent_id);

        let name = validate_child_name(&command.name)?;
        let now = Utc::now().to_rfc3339();
        let child = Child {
            id: uuid::Uuid::new_v4().to_string(),
            parent_id: command.parent_id.clone(),
            name,
            created_at: now.clone(),
            updated_at: now,
            ..Child::default()
        };

        self.store.save(&child.id, &child).await?;
        self.store.index(CHILDREN_INDEX).add(&child.id).await?;
        self.store
            .index(children_of_parent_index(&command.parent_id))
            .add(&child.id)
            .await?;

        info!("Created child: {} with ID: {}", child.name, child.id);
        Ok(child)
    }

    /// Get a child by ID
    pub async fn get_child(&self, child_id: &str) -> Result<Child> {
        self.store
            .find::<Child>(child_id)
            .await?
            .ok_or_else(|| ChartError::ChildNotFound(child_id.to_string()))
    }

    pub async fn child_exists(&self, child_id: &str) -> Result<bool> {
        self.store.exists::<Child>(child_id).await
    }

    /// List a parent's children in creation order
    pub async fn list_children(&self, parent_id: &str) -> Result<Vec<Child>> {
        info!("Listing children of parent {}", parent_id);

        let ids = self.store.index(children_of_parent_index(parent_id)).list().await?;
        let mut children = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.find::<Child>(&id).await? {
                Some(child) => children.push(child),
                None => warn!("Child {} is indexed for parent {} but missing", id, parent_id),
            }
        }

        info!("Found {} children", children.len());
        Ok(children)
    }

    /// Delete a child owned by `parent_id`. Chart weeks are left in place.
    pub async fn delete_child(&self, parent_id: &str, child_id: &str) -> Result<()> {
        info!("Deleting child {} for parent {}", child_id, parent_id);

        let child = self.get_child(child_id).await?;
        if child.parent_id != parent_id {
            warn!("Parent {} tried to delete child {} it does not own", parent_id, child_id);
            return Err(ChartError::Forbidden {
                child_id: child_id.to_string(),
                parent_id: parent_id.to_string(),
            });
        }

        self.store.delete::<Child>(child_id).await?;
        self.store.index(CHILDREN_INDEX).remove(child_id).await?;
        self.store
            .index(children_of_parent_index(parent_id))
            .remove(child_id)
            .await?;

        info!("Deleted child: {} with ID: {}", child.name, child.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnvironment;
    use shared::{BackgroundPattern, PrizeMode};

    fn create_command(parent_id: &str, name: &str) -> CreateChildCommand {
        CreateChildCommand {
            parent_id: parent_id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_child_starts_with_zero_ledger() {
        let env = TestEnvironment::new().await;

        let child = env
            .child_service
            .create_child(create_command("parent@example.com", "  Alice  "))
            .await
            .expect("Failed to create child");

        assert_eq!(child.name, "Alice");
        assert_eq!(child.parent_id, "parent@example.com");
        assert!(!child.id.is_empty());
        assert_eq!(child.prize_count, 0);
        assert_eq!(child.prize_mode, PrizeMode::Weekly);
        assert_eq!(child.background_pattern, BackgroundPattern::Confetti);
        assert_eq!(
            (child.total_stars, child.total_perfect_days, child.total_perfect_weeks),
            (0, 0, 0)
        );
        assert!(child.prize_targets.is_empty());

        let stored = env.child_service.get_child(&child.id).await.unwrap();
        assert_eq!(stored, child);
    }

    #[tokio::test]
    async fn test_create_child_validation() {
        let env = TestEnvironment::new().await;

        let result = env.child_service.create_child(create_command("p", "   ")).await;
        assert!(matches!(result, Err(ChartError::InvalidSettings(_))));

        let long_name = "x".repeat(101);
        let result = env.child_service.create_child(create_command("p", &long_name)).await;
        assert!(matches!(result, Err(ChartError::InvalidSettings(_))));

        assert!(env.child_service.list_children("p").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_children_per_parent_in_creation_order() {
        let env = TestEnvironment::new().await;
        let service = &env.child_service;

        let bob = service.create_child(create_command("p1", "Bob")).await.unwrap();
        let alice = service.create_child(create_command("p1", "Alice")).await.unwrap();
        service.create_child(create_command("p2", "Carol")).await.unwrap();

        let names: Vec<String> = service
            .list_children("p1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Bob", "Alice"]);

        let all = env.store.index(CHILDREN_INDEX).list().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(&all[..2], &[bob.id, alice.id]);
    }

    #[tokio::test]
    async fn test_get_missing_child() {
        let env = TestEnvironment::new().await;
        let result = env.child_service.get_child("nonexistent").await;
        assert!(matches!(result, Err(ChartError::ChildNotFound(id)) if id == "nonexistent"));
    }

    #[tokio::test]
    async fn test_delete_child() {
        let env = TestEnvironment::new().await;
        let service = &env.child_service;

        let child = service.create_child(create_command("p1", "Dora")).await.unwrap();
        service.delete_child("p1", &child.id).await.expect("Failed to delete child");

        assert!(!service.child_exists(&child.id).await.unwrap());
        assert!(service.list_children("p1").await.unwrap().is_empty());
        assert!(env.store.index(CHILDREN_INDEX).list().await.unwrap().is_empty());

        let again = service.delete_child("p1", &child.id).await;
        assert!(matches!(again, Err(ChartError::ChildNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_child_of_other_parent_is_forbidden() {
        let env = TestEnvironment::new().await;
        let service = &env.child_service;

        let child = service.create_child(create_command("p1", "Eve")).await.unwrap();
        let result = service.delete_child("p2", &child.id).await;

        assert!(matches!(result, Err(ChartError::Forbidden { .. })));
        assert!(service.child_exists(&child.id).await.unwrap());
    }
}
