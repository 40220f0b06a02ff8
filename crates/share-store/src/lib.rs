//! # Share Store
//!
//! This crate provides storage and administration for shared groups:
//! the membership store the access evaluator is fed from, the resource
//! registry, and the owner-only sharing service on top of both.
//!
//! ## Overview
//!
//! The share-store crate handles:
//! - **Membership Store**: add / remove / set level / batch set level / list
//! - **Resource Store**: create, fetch, switch policy, delete
//! - **Sharing Service**: owner checks, cascade delete, event publication
//! - **Configuration**: default level, batch atomicity, event settings
//!
//! ## Architecture
//!
//! ```text
//! caller (acting user id, resource id, operation)
//!   └─ SharingService
//!        ├─ ResourceStore ───┐
//!        ├─ MembershipStore ─┴─→ ResourceSnapshot ─→ AccessEvaluator ─→ AccessDecision
//!        └─ EventBus (SharingEvent, best effort)
//! ```
//!
//! ## Persisted Layout
//!
//! A relational backend mirrors the in-memory stores:
//!
//! ```text
//! resources(id PK, owner_id, policy ENUM[all,readonly,custom], ...)
//! memberships(resource_id FK, user_id FK, level ENUM[read,write],
//!             UNIQUE(resource_id, user_id))
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use share_access::{Level, Policy};
//! use share_store::{SharingConfig, SharingService};
//! use uuid::Uuid;
//!
//! async fn example() -> share_access::ShareResult<()> {
//!     let service = SharingService::in_memory(SharingConfig::from_env());
//!     let (owner, friend) = (Uuid::now_v7(), Uuid::now_v7());
//!
//!     let group = service.create_resource(owner, "Home").await?;
//!     service.share(owner, group.id(), friend).await?;
//!     service.set_policy(owner, group.id(), Policy::Custom).await?;
//!     service.set_level(owner, group.id(), friend, Level::Read).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod membership_store;
pub mod resource_store;
pub mod service;

// Re-export main types for convenience
pub use config::{ConfigError, SharingConfig};
pub use membership_store::{BatchOutcome, MembershipStore, MemoryMembershipStore};
pub use resource_store::{MemoryResourceStore, ResourceStore};
pub use service::{ResourceSnapshot, SharingService};
