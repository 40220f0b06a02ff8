//! Sharing administration
//!
//! [`SharingService`] ties the resource and membership stores to the access
//! evaluator. Every method takes the acting user explicitly. Owner-only
//! actions are checked before anything is written; a refused action leaves
//! the stores untouched.
//!
//! Committed changes are published as [`SharingEvent`]s when an event bus is
//! attached. Publication is best effort: a failed publish is logged and the
//! change stays committed.

use share_access::{
    AccessDecision, AccessEvaluator, Level, Membership, Operation, Policy, Resource, ShareError,
    ShareResult,
};
use share_events::{EventBus, MemoryEventBus, SharingEvent};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::SharingConfig;
use crate::membership_store::{BatchOutcome, MembershipStore, MemoryMembershipStore};
use crate::resource_store::{MemoryResourceStore, ResourceStore};

/// A resource together with its membership rows, loaded at one point in time.
#[derive(Debug, Clone)]
pub struct ResourceSnapshot {
    /// The resource
    pub resource: Resource,
    /// Its membership rows
    pub memberships: Vec<Membership>,
}

impl ResourceSnapshot {
    /// Evaluator over this snapshot.
    pub fn evaluator(&self) -> AccessEvaluator<'_> {
        AccessEvaluator::new(&self.resource, &self.memberships)
    }
}

/// Owner-only sharing administration and access queries.
///
/// # Example
///
/// ```rust,no_run
/// use share_access::{AccessDecision, Policy};
/// use share_store::{SharingConfig, SharingService};
/// use uuid::Uuid;
///
/// async fn example() -> share_access::ShareResult<()> {
///     let service = SharingService::in_memory(SharingConfig::default());
///     let (owner, friend) = (Uuid::now_v7(), Uuid::now_v7());
///
///     let group = service.create_resource(owner, "Groceries").await?;
///     service.share(owner, group.id(), friend).await?;
///     assert_eq!(service.access(friend, group.id()).await?, AccessDecision::Write);
///
///     service.set_policy(owner, group.id(), Policy::ReadOnly).await?;
///     assert_eq!(service.access(friend, group.id()).await?, AccessDecision::Read);
///     Ok(())
/// }
/// ```
pub struct SharingService {
    resources: Arc<dyn ResourceStore>,
    memberships: Arc<dyn MembershipStore>,
    events: Option<Arc<dyn EventBus>>,
    config: SharingConfig,
}

impl std::fmt::Debug for SharingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharingService")
            .field("config", &self.config)
            .field("events", &self.events.is_some())
            .finish()
    }
}

impl SharingService {
    /// Create a service over the given stores.
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        memberships: Arc<dyn MembershipStore>,
        config: SharingConfig,
    ) -> Self {
        Self {
            resources,
            memberships,
            events: None,
            config,
        }
    }

    /// Create a service backed by in-memory stores.
    pub fn in_memory(config: SharingConfig) -> Self {
        Self::new(
            Arc::new(MemoryResourceStore::new()),
            Arc::new(MemoryMembershipStore::new()),
            config,
        )
    }

    /// In-memory stores plus an in-memory event bus sized from the config.
    pub fn in_memory_with_events(config: SharingConfig) -> (Self, Arc<MemoryEventBus>) {
        let bus = Arc::new(MemoryEventBus::with_capacity(config.event_channel_capacity));
        let service = Self::in_memory(config).with_event_bus(bus.clone());
        (service, bus)
    }

    /// Publish committed changes on `bus`.
    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &SharingConfig {
        &self.config
    }

    /// Load a resource and its membership rows.
    pub async fn snapshot(&self, resource_id: Uuid) -> ShareResult<ResourceSnapshot> {
        let resource = self.resources.get(resource_id).await?;
        let memberships = self.memberships.list_for(resource_id).await?;
        Ok(ResourceSnapshot {
            resource,
            memberships,
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Effective access of `user_id` on a resource.
    pub async fn access(&self, user_id: Uuid, resource_id: Uuid) -> ShareResult<AccessDecision> {
        Ok(self.snapshot(resource_id).await?.evaluator().evaluate(user_id))
    }

    /// Check that `user_id` may perform `operation` on a resource.
    ///
    /// # Errors
    ///
    /// [`ShareError::Forbidden`] when denied, [`ShareError::NotFound`] when
    /// the resource does not exist.
    pub async fn authorize(
        &self,
        user_id: Uuid,
        resource_id: Uuid,
        operation: Operation,
    ) -> ShareResult<AccessDecision> {
        let snapshot = self.snapshot(resource_id).await?;
        let result = snapshot.evaluator().authorize(user_id, operation);
        if result.is_err() {
            debug!(
                resource_id = %resource_id,
                user_id = %user_id,
                operation = operation.as_str(),
                "Access denied"
            );
        }
        result
    }

    /// Membership rows of a resource, visible to anyone with read access.
    pub async fn members(&self, actor: Uuid, resource_id: Uuid) -> ShareResult<Vec<Membership>> {
        let snapshot = self.snapshot(resource_id).await?;
        snapshot.evaluator().authorize(actor, Operation::Read)?;
        Ok(snapshot.memberships)
    }

    /// Every resource `user_id` can see, with the access they have on it.
    ///
    /// Owned resources come first, then shared ones, each group by name.
    pub async fn accessible_resources(
        &self,
        user_id: Uuid,
    ) -> ShareResult<Vec<(Resource, AccessDecision)>> {
        let mut owned: Vec<(Resource, AccessDecision)> = self
            .resources
            .list_owned_by(user_id)
            .await?
            .into_iter()
            .map(|r| (r, AccessDecision::Owner))
            .collect();
        owned.sort_by(|a, b| a.0.name.cmp(&b.0.name));

        let mut shared = Vec::new();
        for membership in self.memberships.list_for_user(user_id).await? {
            let snapshot = match self.snapshot(membership.resource_id).await {
                Ok(snapshot) => snapshot,
                // Deleted between the two reads
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            let decision = snapshot.evaluator().evaluate(user_id);
            if decision != AccessDecision::None && !decision.is_owner() {
                shared.push((snapshot.resource, decision));
            }
        }
        shared.sort_by(|a, b| a.0.name.cmp(&b.0.name));

        owned.extend(shared);
        Ok(owned)
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Create a resource owned by `owner_id` with the default policy.
    #[instrument(skip(self, name))]
    pub async fn create_resource(
        &self,
        owner_id: Uuid,
        name: impl Into<String> + Send,
    ) -> ShareResult<Resource> {
        let resource = self.resources.insert(Resource::new(owner_id, name)).await?;
        info!(resource_id = %resource.id(), "Resource created");
        Ok(resource)
    }

    /// Share a resource with `user_id` at the configured default level.
    ///
    /// # Errors
    ///
    /// - [`ShareError::Forbidden`] if `actor` is not the owner
    /// - [`ShareError::AlreadyMember`] if `user_id` is a member or the owner
    #[instrument(skip(self))]
    pub async fn share(
        &self,
        actor: Uuid,
        resource_id: Uuid,
        user_id: Uuid,
    ) -> ShareResult<Membership> {
        let resource = self.owned_resource(actor, resource_id).await?;
        if resource.is_owner(user_id) {
            return Err(ShareError::AlreadyMember {
                resource_id,
                user_id,
            });
        }

        let level = self.config.default_level;
        let membership = self
            .memberships
            .insert(Membership::new(resource_id, user_id, level).with_adder(actor))
            .await?;

        info!(resource_id = %resource_id, user_id = %user_id, level = level.as_str(), "Resource shared");
        self.publish(
            actor,
            SharingEvent::MemberAdded {
                resource_id,
                user_id,
                level,
            },
        )
        .await;
        Ok(membership)
    }

    /// Share a resource with several users at once.
    ///
    /// The owner, duplicates and users who already are members are skipped.
    ///
    /// # Returns
    ///
    /// The number of memberships created
    #[instrument(skip(self, user_ids), fields(requested = user_ids.len()))]
    pub async fn share_many(
        &self,
        actor: Uuid,
        resource_id: Uuid,
        user_ids: &[Uuid],
    ) -> ShareResult<usize> {
        let resource = self.owned_resource(actor, resource_id).await?;
        let level = self.config.default_level;

        let mut seen = HashSet::new();
        let mut added = 0;
        for &user_id in user_ids {
            if resource.is_owner(user_id) || !seen.insert(user_id) {
                continue;
            }
            let membership = Membership::new(resource_id, user_id, level).with_adder(actor);
            match self.memberships.insert(membership).await {
                Ok(_) => {
                    added += 1;
                    self.publish(
                        actor,
                        SharingEvent::MemberAdded {
                            resource_id,
                            user_id,
                            level,
                        },
                    )
                    .await;
                }
                Err(ShareError::AlreadyMember { .. }) => {
                    debug!(user_id = %user_id, "Already a member, skipped");
                }
                Err(e) => return Err(e),
            }
        }

        info!(resource_id = %resource_id, added, "Resource shared with users");
        Ok(added)
    }

    /// Remove `user_id` from a resource. Removing a non-member is a no-op.
    ///
    /// # Returns
    ///
    /// `true` if a membership was removed
    #[instrument(skip(self))]
    pub async fn unshare(&self, actor: Uuid, resource_id: Uuid, user_id: Uuid) -> ShareResult<bool> {
        self.owned_resource(actor, resource_id).await?;

        let removed = self.memberships.remove(resource_id, user_id).await?;
        if removed {
            info!(resource_id = %resource_id, user_id = %user_id, "Resource unshared");
            self.publish(
                actor,
                SharingEvent::MemberRemoved {
                    resource_id,
                    user_id,
                },
            )
            .await;
        }
        Ok(removed)
    }

    /// A member removes their own membership.
    ///
    /// # Errors
    ///
    /// [`ShareError::Forbidden`] for the owner, who cannot leave their own resource.
    #[instrument(skip(self))]
    pub async fn leave(&self, user_id: Uuid, resource_id: Uuid) -> ShareResult<bool> {
        let resource = self.resources.get(resource_id).await?;
        if resource.is_owner(user_id) {
            return Err(ShareError::Forbidden);
        }

        let removed = self.memberships.remove(resource_id, user_id).await?;
        if removed {
            info!(resource_id = %resource_id, user_id = %user_id, "Member left resource");
            self.publish(
                user_id,
                SharingEvent::MemberLeft {
                    resource_id,
                    user_id,
                },
            )
            .await;
        }
        Ok(removed)
    }

    /// Change the stored level of one member.
    ///
    /// # Errors
    ///
    /// - [`ShareError::Forbidden`] if `actor` is not the owner
    /// - [`ShareError::NotMember`] if `user_id` has no membership
    #[instrument(skip(self))]
    pub async fn set_level(
        &self,
        actor: Uuid,
        resource_id: Uuid,
        user_id: Uuid,
        level: Level,
    ) -> ShareResult<Membership> {
        self.owned_resource(actor, resource_id).await?;

        let membership = self.memberships.set_level(resource_id, user_id, level).await?;
        info!(resource_id = %resource_id, user_id = %user_id, level = level.as_str(), "Member level changed");
        self.publish(
            actor,
            SharingEvent::LevelChanged {
                resource_id,
                user_id,
                level,
            },
        )
        .await;
        Ok(membership)
    }

    /// Change the stored levels of several members.
    ///
    /// With `atomic_batch_updates` off, users without a membership are
    /// skipped and reported in the outcome. With it on, nothing is applied
    /// when any user is not a member.
    #[instrument(skip(self, updates), fields(requested = updates.len()))]
    pub async fn batch_set_level(
        &self,
        actor: Uuid,
        resource_id: Uuid,
        updates: &[(Uuid, Level)],
    ) -> ShareResult<BatchOutcome> {
        self.owned_resource(actor, resource_id).await?;

        let outcome = if self.config.atomic_batch_updates {
            self.memberships
                .batch_set_level_atomic(resource_id, updates)
                .await?
        } else {
            self.memberships.batch_set_level(resource_id, updates).await?
        };

        if !outcome.skipped.is_empty() {
            debug!(skipped = outcome.skipped.len(), "Non-members skipped in batch update");
        }
        info!(resource_id = %resource_id, updated = outcome.updated_count(), "Member levels updated");

        for user_id in &outcome.updated {
            if let Some(level) = updates
                .iter()
                .rev()
                .find(|(u, _)| u == user_id)
                .map(|(_, level)| *level)
            {
                self.publish(
                    actor,
                    SharingEvent::LevelChanged {
                        resource_id,
                        user_id: *user_id,
                        level,
                    },
                )
                .await;
            }
        }
        Ok(outcome)
    }

    /// Switch the sharing policy. Membership rows are left as they are.
    ///
    /// # Returns
    ///
    /// The previous policy
    #[instrument(skip(self))]
    pub async fn set_policy(
        &self,
        actor: Uuid,
        resource_id: Uuid,
        policy: Policy,
    ) -> ShareResult<Policy> {
        self.owned_resource(actor, resource_id).await?;

        let previous = self.resources.set_policy(resource_id, policy).await?;
        if previous != policy {
            info!(
                resource_id = %resource_id,
                previous = previous.as_str(),
                policy = policy.as_str(),
                "Sharing policy changed"
            );
            self.publish(
                actor,
                SharingEvent::PolicyChanged {
                    resource_id,
                    previous,
                    policy,
                },
            )
            .await;
        }
        Ok(previous)
    }

    /// Delete a resource and all of its memberships.
    #[instrument(skip(self))]
    pub async fn delete_resource(&self, actor: Uuid, resource_id: Uuid) -> ShareResult<Resource> {
        self.owned_resource(actor, resource_id).await?;

        // Resource first: a share that passed the owner check before this
        // point either lands before the cascade or is refused by it.
        let resource = self.resources.delete(resource_id).await?;
        let removed = self.memberships.remove_all(resource_id).await?;

        info!(resource_id = %resource_id, removed_members = removed.len(), "Resource deleted");
        self.publish(
            actor,
            SharingEvent::ResourceDeleted {
                resource_id,
                removed_members: removed.iter().map(|m| m.user_id).collect(),
            },
        )
        .await;
        Ok(resource)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Load a resource and require `actor` to own it.
    async fn owned_resource(&self, actor: Uuid, resource_id: Uuid) -> ShareResult<Resource> {
        let resource = self.resources.get(resource_id).await?;
        if !resource.is_owner(actor) {
            warn!(resource_id = %resource_id, actor = %actor, "Owner-only action refused");
            return Err(ShareError::Forbidden);
        }
        Ok(resource)
    }

    async fn publish(&self, actor: Uuid, event: SharingEvent) {
        if !self.config.publish_events {
            return;
        }
        let bus = match &self.events {
            Some(bus) => bus,
            None => return,
        };
        let result = match event.to_event() {
            Ok(event) => bus.publish(event.with_actor(actor)).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(error = %e, event_type = event.event_type(), "Failed to publish sharing event");
        }
    }
}
