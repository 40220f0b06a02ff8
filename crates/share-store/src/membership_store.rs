//! Membership storage
//!
//! This module provides the [`MembershipStore`] abstraction and an in-memory
//! implementation. Callers load the full membership list of a resource and
//! hand it to the evaluator; the evaluator never talks to a store.
//!
//! Mutations are serialized per resource. Resources are independent, so no
//! cross-resource lock ordering exists.

use async_trait::async_trait;
use share_access::{Level, Membership, ShareError, ShareResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

/// Outcome of a batch level update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Users whose membership was found and updated
    pub updated: Vec<Uuid>,
    /// Users without a membership, left untouched
    pub skipped: Vec<Uuid>,
}

impl BatchOutcome {
    /// Number of memberships actually updated.
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }
}

/// Membership store trait.
///
/// `(resource_id, user_id)` is unique across the store.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert a membership.
    ///
    /// # Errors
    ///
    /// [`ShareError::AlreadyMember`] if the pair already exists,
    /// [`ShareError::NotFound`] once the resource has been cascaded away.
    async fn insert(&self, membership: Membership) -> ShareResult<Membership>;

    /// Add `user_id` to `resource_id` with `level`.
    ///
    /// # Errors
    ///
    /// [`ShareError::AlreadyMember`] if the pair already exists.
    async fn add(&self, resource_id: Uuid, user_id: Uuid, level: Level) -> ShareResult<Membership> {
        self.insert(Membership::new(resource_id, user_id, level)).await
    }

    /// Remove a membership.
    ///
    /// # Returns
    ///
    /// `true` if a row was deleted; an absent pair is not an error.
    async fn remove(&self, resource_id: Uuid, user_id: Uuid) -> ShareResult<bool>;

    /// Overwrite the level of an existing membership. Never creates a row.
    ///
    /// # Errors
    ///
    /// [`ShareError::NotMember`] if the pair does not exist.
    async fn set_level(&self, resource_id: Uuid, user_id: Uuid, level: Level)
        -> ShareResult<Membership>;

    /// Apply `set_level` to every pair that exists, skipping the others.
    ///
    /// A user listed more than once is updated once, to its last level.
    async fn batch_set_level(
        &self,
        resource_id: Uuid,
        updates: &[(Uuid, Level)],
    ) -> ShareResult<BatchOutcome>;

    /// All-or-nothing variant of [`batch_set_level`](Self::batch_set_level).
    ///
    /// # Errors
    ///
    /// [`ShareError::NotMember`] for the first absent user; nothing is applied.
    async fn batch_set_level_atomic(
        &self,
        resource_id: Uuid,
        updates: &[(Uuid, Level)],
    ) -> ShareResult<BatchOutcome>;

    /// Fetch a single membership.
    async fn get(&self, resource_id: Uuid, user_id: Uuid) -> ShareResult<Option<Membership>>;

    /// Snapshot of every membership of a resource.
    async fn list_for(&self, resource_id: Uuid) -> ShareResult<Vec<Membership>>;

    /// Every membership held by a user, across resources.
    async fn list_for_user(&self, user_id: Uuid) -> ShareResult<Vec<Membership>>;

    /// Delete every membership of a resource (cascade on resource deletion).
    ///
    /// The resource accepts no further inserts afterwards.
    ///
    /// # Returns
    ///
    /// The removed rows
    async fn remove_all(&self, resource_id: Uuid) -> ShareResult<Vec<Membership>>;
}

/// Membership rows of one resource, keyed by user.
#[derive(Debug, Default)]
struct ResourceSlot {
    /// Set by the cascade delete; a retired slot stays in the index for good.
    retired: bool,
    members: BTreeMap<Uuid, Membership>,
}

/// Collapse repeated users, keeping the first position and the last level.
fn dedupe_updates(updates: &[(Uuid, Level)]) -> Vec<(Uuid, Level)> {
    let mut deduped: Vec<(Uuid, Level)> = Vec::with_capacity(updates.len());
    for &(user_id, level) in updates {
        match deduped.iter_mut().find(|(u, _)| *u == user_id) {
            Some(entry) => entry.1 = level,
            None => deduped.push((user_id, level)),
        }
    }
    deduped
}

/// In-memory membership store.
///
/// Each resource has its own mutex, so mutations on one resource are
/// serialized while different resources proceed independently. Only
/// [`insert`](MembershipStore::insert) adds a resource to the index; after
/// [`remove_all`](MembershipStore::remove_all) the resource is closed and
/// further inserts fail with [`ShareError::NotFound`].
#[derive(Debug, Default)]
pub struct MemoryMembershipStore {
    slots: RwLock<HashMap<Uuid, Arc<Mutex<ResourceSlot>>>>,
}

impl MemoryMembershipStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot of a resource, created when missing.
    async fn slot_or_create(&self, resource_id: Uuid) -> Arc<Mutex<ResourceSlot>> {
        if let Some(slot) = self.slots.read().await.get(&resource_id) {
            return slot.clone();
        }
        self.slots
            .write()
            .await
            .entry(resource_id)
            .or_default()
            .clone()
    }

    /// Locked slot of a resource that has rows and has not been deleted.
    async fn live_slot(&self, resource_id: Uuid) -> Option<OwnedMutexGuard<ResourceSlot>> {
        let slot = self.slots.read().await.get(&resource_id).cloned()?;
        let guard = slot.lock_owned().await;
        if guard.retired {
            None
        } else {
            Some(guard)
        }
    }
}

#[async_trait]
impl MembershipStore for MemoryMembershipStore {
    async fn insert(&self, membership: Membership) -> ShareResult<Membership> {
        let (resource_id, user_id) = membership.key();
        let slot = self.slot_or_create(resource_id).await;
        let mut guard = slot.lock().await;
        if guard.retired {
            return Err(ShareError::resource_not_found(resource_id));
        }
        if guard.members.contains_key(&user_id) {
            return Err(ShareError::AlreadyMember {
                resource_id,
                user_id,
            });
        }
        guard.members.insert(user_id, membership.clone());
        Ok(membership)
    }

    async fn remove(&self, resource_id: Uuid, user_id: Uuid) -> ShareResult<bool> {
        Ok(match self.live_slot(resource_id).await {
            Some(mut guard) => guard.members.remove(&user_id).is_some(),
            None => false,
        })
    }

    async fn set_level(
        &self,
        resource_id: Uuid,
        user_id: Uuid,
        level: Level,
    ) -> ShareResult<Membership> {
        let mut guard = self.live_slot(resource_id).await;
        match guard.as_mut().and_then(|g| g.members.get_mut(&user_id)) {
            Some(membership) => {
                membership.set_level(level);
                Ok(membership.clone())
            }
            None => Err(ShareError::NotMember {
                resource_id,
                user_id,
            }),
        }
    }

    async fn batch_set_level(
        &self,
        resource_id: Uuid,
        updates: &[(Uuid, Level)],
    ) -> ShareResult<BatchOutcome> {
        let mut guard = self.live_slot(resource_id).await;
        let mut outcome = BatchOutcome::default();
        for (user_id, level) in dedupe_updates(updates) {
            match guard.as_mut().and_then(|g| g.members.get_mut(&user_id)) {
                Some(membership) => {
                    membership.set_level(level);
                    outcome.updated.push(user_id);
                }
                None => outcome.skipped.push(user_id),
            }
        }
        Ok(outcome)
    }

    async fn batch_set_level_atomic(
        &self,
        resource_id: Uuid,
        updates: &[(Uuid, Level)],
    ) -> ShareResult<BatchOutcome> {
        let updates = dedupe_updates(updates);
        let mut guard = self.live_slot(resource_id).await;
        let mut empty = BTreeMap::new();
        let members = match guard.as_mut() {
            Some(g) => &mut g.members,
            None => &mut empty,
        };

        if let Some((user_id, _)) = updates.iter().find(|(u, _)| !members.contains_key(u)) {
            return Err(ShareError::NotMember {
                resource_id,
                user_id: *user_id,
            });
        }
        let mut outcome = BatchOutcome::default();
        for (user_id, level) in updates {
            if let Some(membership) = members.get_mut(&user_id) {
                membership.set_level(level);
                outcome.updated.push(user_id);
            }
        }
        Ok(outcome)
    }

    async fn get(&self, resource_id: Uuid, user_id: Uuid) -> ShareResult<Option<Membership>> {
        Ok(self
            .live_slot(resource_id)
            .await
            .and_then(|guard| guard.members.get(&user_id).cloned()))
    }

    async fn list_for(&self, resource_id: Uuid) -> ShareResult<Vec<Membership>> {
        Ok(match self.live_slot(resource_id).await {
            Some(guard) => guard.members.values().cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn list_for_user(&self, user_id: Uuid) -> ShareResult<Vec<Membership>> {
        let slots: Vec<_> = self.slots.read().await.values().cloned().collect();
        let mut found = Vec::new();
        for slot in slots {
            let guard = slot.lock().await;
            if guard.retired {
                continue;
            }
            if let Some(membership) = guard.members.get(&user_id) {
                found.push(membership.clone());
            }
        }
        Ok(found)
    }

    async fn remove_all(&self, resource_id: Uuid) -> ShareResult<Vec<Membership>> {
        // The retired slot stays indexed so late inserts cannot recreate it.
        let slot = self.slot_or_create(resource_id).await;
        let mut guard = slot.lock().await;
        guard.retired = true;
        let removed = std::mem::take(&mut guard.members);
        Ok(removed.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_list() {
        let store = MemoryMembershipStore::new();
        let resource = Uuid::now_v7();
        let (u1, u2) = (Uuid::now_v7(), Uuid::now_v7());

        store.add(resource, u1, Level::Write).await.unwrap();
        store.add(resource, u2, Level::Read).await.unwrap();

        let rows = store.list_for(resource).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|m| m.resource_id == resource));
        assert!(store.list_for(Uuid::now_v7()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_twice_fails() {
        let store = MemoryMembershipStore::new();
        let (resource, user) = (Uuid::now_v7(), Uuid::now_v7());

        store.add(resource, user, Level::Write).await.unwrap();
        let err = store.add(resource, user, Level::Read).await.unwrap_err();

        assert_eq!(
            err,
            ShareError::AlreadyMember {
                resource_id: resource,
                user_id: user
            }
        );
        let rows = store.list_for(resource).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].level, Level::Write);
    }

    #[tokio::test]
    async fn test_remove_is_noop_when_absent() {
        let store = MemoryMembershipStore::new();
        let (resource, user) = (Uuid::now_v7(), Uuid::now_v7());

        assert!(!store.remove(resource, user).await.unwrap());
        store.add(resource, user, Level::Write).await.unwrap();
        assert!(store.remove(resource, user).await.unwrap());
        assert!(store.get(resource, user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_level_never_creates() {
        let store = MemoryMembershipStore::new();
        let (resource, user) = (Uuid::now_v7(), Uuid::now_v7());

        let err = store.set_level(resource, user, Level::Read).await.unwrap_err();
        assert!(matches!(err, ShareError::NotMember { .. }));
        assert!(store.list_for(resource).await.unwrap().is_empty());

        store.add(resource, user, Level::Write).await.unwrap();
        let updated = store.set_level(resource, user, Level::Read).await.unwrap();
        assert_eq!(updated.level, Level::Read);
    }

    #[tokio::test]
    async fn test_batch_set_level_skips_absent() {
        let store = MemoryMembershipStore::new();
        let resource = Uuid::now_v7();
        let (member, stranger) = (Uuid::now_v7(), Uuid::now_v7());
        store.add(resource, member, Level::Write).await.unwrap();

        let outcome = store
            .batch_set_level(resource, &[(member, Level::Read), (stranger, Level::Write)])
            .await
            .unwrap();

        assert_eq!(outcome.updated_count(), 1);
        assert_eq!(outcome.skipped, vec![stranger]);
        assert!(store.get(resource, stranger).await.unwrap().is_none());
        assert_eq!(
            store.get(resource, member).await.unwrap().map(|m| m.level),
            Some(Level::Read)
        );
    }

    #[tokio::test]
    async fn test_batch_set_level_atomic_applies_nothing_on_absent() {
        let store = MemoryMembershipStore::new();
        let resource = Uuid::now_v7();
        let (member, stranger) = (Uuid::now_v7(), Uuid::now_v7());
        store.add(resource, member, Level::Write).await.unwrap();

        let err = store
            .batch_set_level_atomic(resource, &[(member, Level::Read), (stranger, Level::Read)])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ShareError::NotMember {
                resource_id: resource,
                user_id: stranger
            }
        );
        assert_eq!(
            store.get(resource, member).await.unwrap().map(|m| m.level),
            Some(Level::Write)
        );

        let outcome = store
            .batch_set_level_atomic(resource, &[(member, Level::Read)])
            .await
            .unwrap();
        assert_eq!(outcome.updated, vec![member]);
    }

    #[tokio::test]
    async fn test_list_for_user_and_remove_all() {
        let store = MemoryMembershipStore::new();
        let (r1, r2) = (Uuid::now_v7(), Uuid::now_v7());
        let (user, other) = (Uuid::now_v7(), Uuid::now_v7());

        store.add(r1, user, Level::Write).await.unwrap();
        store.add(r2, user, Level::Read).await.unwrap();
        store.add(r1, other, Level::Read).await.unwrap();

        assert_eq!(store.list_for_user(user).await.unwrap().len(), 2);

        let removed = store.remove_all(r1).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(store.list_for(r1).await.unwrap().is_empty());
        assert_eq!(store.list_for_user(user).await.unwrap().len(), 1);

        // A deleted resource stays closed
        let err = store.add(r1, user, Level::Read).await.unwrap_err();
        assert_eq!(err, ShareError::resource_not_found(r1));
        assert!(store.list_for(r1).await.unwrap().is_empty());
        assert!(!store.remove(r1, user).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_all_closes_never_shared_resource() {
        let store = MemoryMembershipStore::new();
        let (resource, user) = (Uuid::now_v7(), Uuid::now_v7());

        assert!(store.remove_all(resource).await.unwrap().is_empty());

        assert!(store
            .add(resource, user, Level::Write)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.list_for_user(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_on_unknown_resource_do_not_grow_index() {
        let store = MemoryMembershipStore::new();
        let (resource, user) = (Uuid::now_v7(), Uuid::now_v7());

        assert!(store.get(resource, user).await.unwrap().is_none());
        assert!(!store.remove(resource, user).await.unwrap());
        assert!(store.list_for(resource).await.unwrap().is_empty());
        assert!(store
            .set_level(resource, user, Level::Read)
            .await
            .unwrap_err()
            .is_not_found());
        let outcome = store
            .batch_set_level(resource, &[(user, Level::Read)])
            .await
            .unwrap();
        assert_eq!(outcome.skipped, vec![user]);
        assert!(store
            .batch_set_level_atomic(resource, &[(user, Level::Read)])
            .await
            .is_err());

        assert_eq!(store.slots.read().await.len(), 0);
    }

    #[tokio::test]
    async fn test_batch_set_level_counts_repeated_user_once() {
        let store = MemoryMembershipStore::new();
        let resource = Uuid::now_v7();
        let (member, stranger) = (Uuid::now_v7(), Uuid::now_v7());
        store.add(resource, member, Level::Write).await.unwrap();

        let outcome = store
            .batch_set_level(
                resource,
                &[
                    (member, Level::Read),
                    (stranger, Level::Read),
                    (member, Level::Write),
                    (stranger, Level::Write),
                ],
            )
            .await
            .unwrap();

        assert_eq!(outcome.updated, vec![member]);
        assert_eq!(outcome.skipped, vec![stranger]);
        assert_eq!(
            store.get(resource, member).await.unwrap().map(|m| m.level),
            Some(Level::Write)
        );

        let outcome = store
            .batch_set_level_atomic(resource, &[(member, Level::Write), (member, Level::Read)])
            .await
            .unwrap();
        assert_eq!(outcome.updated_count(), 1);
        assert_eq!(
            store.get(resource, member).await.unwrap().map(|m| m.level),
            Some(Level::Read)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_serialized() {
        let store = Arc::new(MemoryMembershipStore::new());
        let resource = Uuid::now_v7();
        let user = Uuid::now_v7();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.add(resource, user, Level::Write).await.is_ok()
            }));
        }

        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.list_for(resource).await.unwrap().len(), 1);
    }
}
