//! # Share Access
//!
//! This crate provides the access model for shared groups: who may read and
//! who may write a group that its owner has shared with other users.
//!
//! ## Overview
//!
//! The share-access crate handles:
//! - **Resources**: Shareable groups with exactly one owner and a sharing policy
//! - **Memberships**: Per-user grants linking a user to a resource with a level
//! - **Decisions**: The effective access a user ends up with
//! - **Evaluation**: The single place where owner / policy / level precedence lives
//!
//! ## Precedence
//!
//! ```text
//! owner ─────────────→ Owner              (always, whatever the policy)
//! policy = all ──────→ Write | None       (any membership row grants write)
//! policy = readonly ─→ Read  | None       (any membership row grants read)
//! policy = custom ───→ level | None       (stored per-user level, verbatim)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use share_access::{evaluate, AccessDecision, Level, Membership, Policy, Resource};
//! use uuid::Uuid;
//!
//! let owner = Uuid::now_v7();
//! let member = Uuid::now_v7();
//!
//! let mut group = Resource::new(owner, "Kitchen remodel");
//! let memberships = vec![Membership::new(group.id(), member, Level::Read)];
//!
//! // Under the default `all` policy any member writes
//! assert_eq!(evaluate(&group, &memberships, member), AccessDecision::Write);
//!
//! // Under `custom` the stored level is used
//! group.set_policy(Policy::Custom);
//! assert_eq!(evaluate(&group, &memberships, member), AccessDecision::Read);
//! assert_eq!(evaluate(&group, &memberships, owner), AccessDecision::Owner);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialization support (enabled by default)

pub mod decision;
pub mod error;
pub mod evaluator;
pub mod membership;
pub mod policy;
pub mod resource;

// Re-export main types for convenience
pub use decision::{AccessDecision, Operation};
pub use error::{ShareError, ShareResult};
pub use evaluator::{evaluate, AccessEvaluator};
pub use membership::{Level, Membership};
pub use policy::Policy;
pub use resource::Resource;
