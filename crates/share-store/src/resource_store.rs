//! Resource storage
//!
//! Registry of shareable resources. Ownership is fixed at creation; the only
//! mutable sharing attribute is the policy.

use async_trait::async_trait;
use share_access::{Policy, Resource, ShareError, ShareResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Resource store trait.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Store a newly created resource.
    ///
    /// # Errors
    ///
    /// [`ShareError::Storage`] if a resource with the same id exists.
    async fn insert(&self, resource: Resource) -> ShareResult<Resource>;

    /// Fetch a resource.
    ///
    /// # Errors
    ///
    /// [`ShareError::NotFound`] if it does not exist.
    async fn get(&self, resource_id: Uuid) -> ShareResult<Resource>;

    /// Switch the policy of a resource.
    ///
    /// # Returns
    ///
    /// The previous policy
    async fn set_policy(&self, resource_id: Uuid, policy: Policy) -> ShareResult<Policy>;

    /// Delete a resource.
    ///
    /// # Returns
    ///
    /// The deleted resource
    async fn delete(&self, resource_id: Uuid) -> ShareResult<Resource>;

    /// Every resource owned by `owner_id`.
    async fn list_owned_by(&self, owner_id: Uuid) -> ShareResult<Vec<Resource>>;
}

/// In-memory resource store.
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    resources: RwLock<HashMap<Uuid, Resource>>,
}

impl MemoryResourceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn insert(&self, resource: Resource) -> ShareResult<Resource> {
        let mut resources = self.resources.write().await;
        if resources.contains_key(&resource.id()) {
            return Err(ShareError::Storage(format!(
                "resource {} already exists",
                resource.id()
            )));
        }
        resources.insert(resource.id(), resource.clone());
        Ok(resource)
    }

    async fn get(&self, resource_id: Uuid) -> ShareResult<Resource> {
        self.resources
            .read()
            .await
            .get(&resource_id)
            .cloned()
            .ok_or_else(|| ShareError::resource_not_found(resource_id))
    }

    async fn set_policy(&self, resource_id: Uuid, policy: Policy) -> ShareResult<Policy> {
        let mut resources = self.resources.write().await;
        let resource = resources
            .get_mut(&resource_id)
            .ok_or_else(|| ShareError::resource_not_found(resource_id))?;
        Ok(resource.set_policy(policy))
    }

    async fn delete(&self, resource_id: Uuid) -> ShareResult<Resource> {
        self.resources
            .write()
            .await
            .remove(&resource_id)
            .ok_or_else(|| ShareError::resource_not_found(resource_id))
    }

    async fn list_owned_by(&self, owner_id: Uuid) -> ShareResult<Vec<Resource>> {
        let resources = self.resources.read().await;
        let mut owned: Vec<Resource> = resources
            .values()
            .filter(|r| r.is_owner(owner_id))
            .cloned()
            .collect();
        owned.sort_by_key(|r| r.created_at);
        Ok(owned)
    }
}
