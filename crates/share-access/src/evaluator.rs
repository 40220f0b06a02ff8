//! # Access evaluation
//!
//! Owner / policy / per-member precedence, defined once.
//!
//! The evaluator works on a snapshot the caller has already loaded: the
//! resource and its membership rows. It performs no I/O, never fails, and
//! returns the same decision for the same snapshot, so it can be shared
//! freely between concurrent readers.

use uuid::Uuid;

use crate::decision::{AccessDecision, Operation};
use crate::error::{ShareError, ShareResult};
use crate::membership::{Level, Membership};
use crate::policy::Policy;
use crate::resource::Resource;

/// Evaluate the effective access of `user_id` on `resource`.
///
/// Rules, first match wins:
/// 1. The owner gets [`AccessDecision::Owner`], whatever the policy and
///    whether or not a membership row exists for them.
/// 2. Without a membership row for `(resource, user)` the answer is
///    [`AccessDecision::None`].
/// 3. [`Policy::All`] gives `Write`, [`Policy::ReadOnly`] gives `Read`.
/// 4. [`Policy::Custom`] maps the stored level verbatim.
///
/// Rows in `memberships` belonging to other resources are ignored.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use share_access::{evaluate, AccessDecision, Level, Membership, Policy, Resource};
///
/// let owner = Uuid::now_v7();
/// let member = Uuid::now_v7();
/// let group = Resource::new(owner, "Chores").with_policy(Policy::ReadOnly);
/// let rows = vec![Membership::new(group.id(), member, Level::Write)];
///
/// assert_eq!(evaluate(&group, &rows, member), AccessDecision::Read);
/// assert_eq!(evaluate(&group, &rows, Uuid::now_v7()), AccessDecision::None);
/// ```
pub fn evaluate(resource: &Resource, memberships: &[Membership], user_id: Uuid) -> AccessDecision {
    if resource.is_owner(user_id) {
        return AccessDecision::Owner;
    }

    let membership = match memberships
        .iter()
        .find(|m| m.matches(resource.id(), user_id))
    {
        Some(m) => m,
        None => return AccessDecision::None,
    };

    match resource.policy {
        Policy::All => AccessDecision::Write,
        Policy::ReadOnly => AccessDecision::Read,
        Policy::Custom => match membership.level {
            Level::Write => AccessDecision::Write,
            Level::Read => AccessDecision::Read,
        },
    }
}

/// Evaluator bound to one resource snapshot.
///
/// Borrowing the snapshot lets callers ask several questions about the same
/// resource without reloading anything.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use share_access::{AccessEvaluator, Level, Membership, Operation, Resource};
///
/// let owner = Uuid::now_v7();
/// let member = Uuid::now_v7();
/// let group = Resource::new(owner, "Chores");
/// let rows = vec![Membership::new(group.id(), member, Level::Read)];
///
/// let evaluator = AccessEvaluator::new(&group, &rows);
/// assert!(evaluator.has_write_access(member));
/// assert!(evaluator.is_allowed(owner, Operation::Write));
/// assert!(evaluator.authorize(Uuid::now_v7(), Operation::Read).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AccessEvaluator<'a> {
    resource: &'a Resource,
    memberships: &'a [Membership],
}

impl<'a> AccessEvaluator<'a> {
    /// Bind an evaluator to a resource and its membership rows.
    pub fn new(resource: &'a Resource, memberships: &'a [Membership]) -> Self {
        Self {
            resource,
            memberships,
        }
    }

    /// The resource this evaluator answers for.
    pub fn resource(&self) -> &'a Resource {
        self.resource
    }

    /// Effective access of `user_id`. See [`evaluate`].
    pub fn evaluate(&self, user_id: Uuid) -> AccessDecision {
        evaluate(self.resource, self.memberships, user_id)
    }

    /// `true` when the decision is `Owner` or `Write`.
    pub fn has_write_access(&self, user_id: Uuid) -> bool {
        self.evaluate(user_id).can_write()
    }

    /// `true` when the decision is anything but `None`.
    pub fn has_read_access(&self, user_id: Uuid) -> bool {
        self.evaluate(user_id).can_read()
    }

    /// Ownership check; does not look at memberships.
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.resource.is_owner(user_id)
    }

    /// Check if `user_id` may perform `operation`.
    pub fn is_allowed(&self, user_id: Uuid, operation: Operation) -> bool {
        self.evaluate(user_id).permits(operation)
    }

    /// Like [`is_allowed`](Self::is_allowed) but as a guard.
    ///
    /// # Errors
    ///
    /// [`ShareError::Forbidden`] when the decision does not permit `operation`.
    pub fn authorize(&self, user_id: Uuid, operation: Operation) -> ShareResult<AccessDecision> {
        let decision = self.evaluate(user_id);
        if decision.permits(operation) {
            Ok(decision)
        } else {
            Err(ShareError::Forbidden)
        }
    }

    /// Guard for owner-only administrative actions.
    ///
    /// # Errors
    ///
    /// [`ShareError::Forbidden`] when `user_id` is not the owner.
    pub fn require_owner(&self, user_id: Uuid) -> ShareResult<()> {
        if self.is_owner(user_id) {
            Ok(())
        } else {
            Err(ShareError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Snapshot {
        owner: Uuid,
        resource: Resource,
        memberships: Vec<Membership>,
    }

    impl Snapshot {
        fn new(policy: Policy) -> Self {
            let owner = Uuid::now_v7();
            Self {
                owner,
                resource: Resource::new(owner, "Household").with_policy(policy),
                memberships: Vec::new(),
            }
        }

        fn member(&mut self, level: Level) -> Uuid {
            let user = Uuid::now_v7();
            self.memberships
                .push(Membership::new(self.resource.id(), user, level));
            user
        }

        fn eval(&self, user: Uuid) -> AccessDecision {
            evaluate(&self.resource, &self.memberships, user)
        }
    }

    #[test]
    fn test_owner_wins_under_every_policy() {
        for policy in Policy::VARIANTS {
            let snapshot = Snapshot::new(policy);
            assert_eq!(snapshot.eval(snapshot.owner), AccessDecision::Owner);
        }
    }

    #[test]
    fn test_owner_row_is_irrelevant() {
        let mut snapshot = Snapshot::new(Policy::Custom);
        let owner = snapshot.owner;
        let resource_id = snapshot.resource.id();
        snapshot
            .memberships
            .push(Membership::new(resource_id, owner, Level::Read));

        assert_eq!(snapshot.eval(owner), AccessDecision::Owner);
    }

    #[test]
    fn test_all_policy_is_write_or_none() {
        let mut snapshot = Snapshot::new(Policy::All);
        let reader = snapshot.member(Level::Read);
        let writer = snapshot.member(Level::Write);

        assert_eq!(snapshot.eval(reader), AccessDecision::Write);
        assert_eq!(snapshot.eval(writer), AccessDecision::Write);
        assert_eq!(snapshot.eval(Uuid::now_v7()), AccessDecision::None);
    }

    #[test]
    fn test_readonly_policy_is_read_or_none() {
        let mut snapshot = Snapshot::new(Policy::ReadOnly);
        let reader = snapshot.member(Level::Read);
        let writer = snapshot.member(Level::Write);

        assert_eq!(snapshot.eval(reader), AccessDecision::Read);
        assert_eq!(snapshot.eval(writer), AccessDecision::Read);
        assert_eq!(snapshot.eval(Uuid::now_v7()), AccessDecision::None);
    }

    #[test]
    fn test_custom_policy_mirrors_level() {
        let mut snapshot = Snapshot::new(Policy::Custom);
        let reader = snapshot.member(Level::Read);
        let writer = snapshot.member(Level::Write);

        assert_eq!(snapshot.eval(reader), AccessDecision::Read);
        assert_eq!(snapshot.eval(writer), AccessDecision::Write);
        assert_eq!(snapshot.eval(Uuid::now_v7()), AccessDecision::None);
    }

    #[test]
    fn test_rows_of_other_resources_are_ignored() {
        let snapshot = Snapshot::new(Policy::All);
        let user = Uuid::now_v7();
        let foreign = vec![Membership::new(Uuid::now_v7(), user, Level::Write)];

        assert_eq!(
            evaluate(&snapshot.resource, &foreign, user),
            AccessDecision::None
        );
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let mut snapshot = Snapshot::new(Policy::Custom);
        let reader = snapshot.member(Level::Read);

        let first = snapshot.eval(reader);
        let second = snapshot.eval(reader);
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_access_monotonic_from_readonly_to_all() {
        let mut snapshot = Snapshot::new(Policy::ReadOnly);
        let members = vec![snapshot.member(Level::Read), snapshot.member(Level::Write)];

        let before: Vec<bool> = members
            .iter()
            .map(|u| {
                AccessEvaluator::new(&snapshot.resource, &snapshot.memberships).has_write_access(*u)
            })
            .collect();

        snapshot.resource.set_policy(Policy::All);
        let evaluator = AccessEvaluator::new(&snapshot.resource, &snapshot.memberships);
        assert!(before.iter().all(|had_write| !had_write));
        for user in &members {
            assert!(evaluator.has_write_access(*user));
        }
    }

    #[test]
    fn test_predicates() {
        let mut snapshot = Snapshot::new(Policy::ReadOnly);
        let reader = snapshot.member(Level::Write);
        let stranger = Uuid::now_v7();
        let evaluator = AccessEvaluator::new(&snapshot.resource, &snapshot.memberships);

        assert!(evaluator.has_read_access(snapshot.owner));
        assert!(evaluator.has_write_access(snapshot.owner));
        assert!(evaluator.is_owner(snapshot.owner));

        assert!(evaluator.has_read_access(reader));
        assert!(!evaluator.has_write_access(reader));
        assert!(!evaluator.is_owner(reader));

        assert!(!evaluator.has_read_access(stranger));
        assert!(!evaluator.has_write_access(stranger));
    }

    #[test]
    fn test_authorize_and_require_owner() {
        let mut snapshot = Snapshot::new(Policy::Custom);
        let reader = snapshot.member(Level::Read);
        let evaluator = AccessEvaluator::new(&snapshot.resource, &snapshot.memberships);

        assert_eq!(
            evaluator.authorize(reader, Operation::Read),
            Ok(AccessDecision::Read)
        );
        assert_eq!(
            evaluator.authorize(reader, Operation::Write),
            Err(ShareError::Forbidden)
        );
        assert!(evaluator.is_allowed(snapshot.owner, Operation::Write));
        assert_eq!(evaluator.require_owner(reader), Err(ShareError::Forbidden));
        assert!(evaluator.require_owner(snapshot.owner).is_ok());
    }
}
