//! Resource domain models
//!
//! This module provides the shareable resource (a group of task lists).
//! A resource has exactly one owner, fixed at creation, and a sharing policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::policy::Policy;

/// A shareable group owned by a single user.
///
/// The owner is set once at creation and cannot be changed afterwards, which
/// is why `id` and `owner_id` are only exposed through accessors. The owner
/// is never stored as a membership; owner access is implicit.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use share_access::{Policy, Resource};
///
/// let owner = Uuid::now_v7();
/// let group = Resource::new(owner, "Groceries");
/// assert!(group.is_owner(owner));
/// assert_eq!(group.policy, Policy::All);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    id: Uuid,

    owner_id: Uuid,

    /// Human-readable name
    pub name: String,

    /// Sharing policy
    pub policy: Policy,

    /// When the resource was created
    pub created_at: DateTime<Utc>,

    /// When the resource was last updated
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Creates a new resource owned by `owner_id`.
    ///
    /// The resource is created with:
    /// - A newly generated UUID v7 ID
    /// - The default [`Policy::All`] policy
    /// - Current timestamp for created_at and updated_at
    ///
    /// # Arguments
    ///
    /// * `owner_id` - The creating user, owner for the resource's lifetime
    /// * `name` - Resource name
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            owner_id,
            name: name.into(),
            policy: Policy::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the initial policy.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Unique identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The user who created the resource.
    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    /// Check if `user_id` owns this resource.
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Switch the sharing policy.
    ///
    /// # Returns
    ///
    /// The previous policy
    pub fn set_policy(&mut self, policy: Policy) -> Policy {
        let previous = std::mem::replace(&mut self.policy, policy);
        if previous != policy {
            self.updated_at = Utc::now();
        }
        previous
    }
}
