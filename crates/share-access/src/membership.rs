//! Membership domain models
//!
//! This module provides the membership entity that links a user to a shared
//! resource. The resource owner never has a membership row; owner access is
//! implicit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ShareError;

/// Per-member access level.
///
/// Only consulted when the resource policy is [`Policy::Custom`](crate::Policy::Custom).
/// The hierarchy is: Read < Write
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Read-only access
    Read = 1,

    /// Read and write access
    Write = 2,
}

impl Level {
    /// Parse level from string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive)
    ///
    /// # Returns
    ///
    /// `Some(Level)` if valid, `None` otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use share_access::Level;
    ///
    /// assert_eq!(Level::parse("WRITE"), Some(Level::Write));
    /// assert_eq!(Level::parse("admin"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "read" => Some(Self::Read),
            "write" => Some(Self::Write),
            _ => None,
        }
    }

    /// Get string representation of the level, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl Default for Level {
    /// Sharing a resource grants write unless told otherwise.
    fn default() -> Self {
        Self::Write
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ShareError::InvalidLevel(s.to_string()))
    }
}

/// Membership of a user in a shared resource.
///
/// `(resource_id, user_id)` is unique: a user appears at most once per
/// resource. The membership does not own the user or the resource; it is
/// removed together with its resource.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use share_access::{Level, Membership};
///
/// let resource_id = Uuid::now_v7();
/// let user_id = Uuid::now_v7();
/// let membership = Membership::new(resource_id, user_id, Level::Write);
/// assert_eq!(membership.key(), (resource_id, user_id));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Membership {
    /// Unique membership ID
    pub id: Uuid,

    /// Shared resource
    pub resource_id: Uuid,

    /// Member
    pub user_id: Uuid,

    /// Stored level, meaningful under the custom policy only
    pub level: Level,

    /// When the user was added
    pub added_at: DateTime<Utc>,

    /// Who shared the resource with this user (if known)
    pub added_by: Option<Uuid>,

    /// When the level was last changed
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// Creates a new membership.
    ///
    /// The membership is created with:
    /// - A newly generated UUID v7 ID
    /// - Current timestamp for added_at and updated_at
    ///
    /// # Arguments
    ///
    /// * `resource_id` - The shared resource
    /// * `user_id` - The member
    /// * `level` - The member's stored level
    pub fn new(resource_id: Uuid, user_id: Uuid, level: Level) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            resource_id,
            user_id,
            level,
            added_at: now,
            added_by: None,
            updated_at: now,
        }
    }

    /// Set who shared the resource with this user.
    pub fn with_adder(mut self, adder_id: Uuid) -> Self {
        self.added_by = Some(adder_id);
        self
    }

    /// Composite key `(resource_id, user_id)`.
    pub fn key(&self) -> (Uuid, Uuid) {
        (self.resource_id, self.user_id)
    }

    /// Check whether this row is the membership of `user_id` in `resource_id`.
    pub fn matches(&self, resource_id: Uuid, user_id: Uuid) -> bool {
        self.resource_id == resource_id && self.user_id == user_id
    }

    /// Overwrite the stored level.
    ///
    /// # Returns
    ///
    /// `true` if the level actually changed
    pub fn set_level(&mut self, level: Level) -> bool {
        if self.level == level {
            return false;
        }
        self.level = level;
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_creation() {
        let resource_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();
        let membership = Membership::new(resource_id, user_id, Level::Read);

        assert_eq!(membership.resource_id, resource_id);
        assert_eq!(membership.user_id, user_id);
        assert_eq!(membership.level, Level::Read);
        assert!(membership.added_by.is_none());
        assert!(membership.matches(resource_id, user_id));
        assert!(!membership.matches(user_id, resource_id));
    }

    #[test]
    fn test_membership_with_adder() {
        let adder_id = Uuid::now_v7();
        let membership =
            Membership::new(Uuid::now_v7(), Uuid::now_v7(), Level::Write).with_adder(adder_id);

        assert_eq!(membership.added_by, Some(adder_id));
    }

    #[test]
    fn test_set_level_reports_change() {
        let mut membership = Membership::new(Uuid::now_v7(), Uuid::now_v7(), Level::Write);

        assert!(!membership.set_level(Level::Write));
        assert!(membership.set_level(Level::Read));
        assert_eq!(membership.level, Level::Read);
        assert!(membership.updated_at >= membership.added_at);
    }

    #[test]
    fn test_level_default_is_write() {
        assert_eq!(Level::default(), Level::Write);
        assert!(Level::Write > Level::Read);
    }

    #[test]
    fn test_level_from_str_rejects_unknown() {
        assert_eq!("read".parse::<Level>().unwrap(), Level::Read);
        let err = "owner".parse::<Level>().unwrap_err();
        assert!(matches!(err, ShareError::InvalidLevel(ref v) if v == "owner"));
        assert!(serde_json::from_str::<Level>("\"admin\"").is_err());
    }
}
