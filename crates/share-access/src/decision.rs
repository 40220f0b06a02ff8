//! Access decisions
//!
//! The evaluator's output, and the operations a caller asks about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Effective access of a user on a resource.
///
/// Decisions are totally ordered: `None < Read < Write < Owner`.
/// A decision of [`AccessDecision::None`] is a valid outcome, not an error.
///
/// # Examples
///
/// ```
/// use share_access::{AccessDecision, Operation};
///
/// assert!(AccessDecision::Owner > AccessDecision::Write);
/// assert!(AccessDecision::Write.permits(Operation::Write));
/// assert!(!AccessDecision::Read.permits(Operation::Write));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// No access at all
    None = 0,

    /// May view the resource and its content
    Read = 1,

    /// May change the resource's content
    Write = 2,

    /// Created the resource; may also administer sharing
    Owner = 3,
}

impl AccessDecision {
    /// Check if this decision grants read access.
    ///
    /// # Returns
    ///
    /// `true` for Read, Write and Owner
    pub fn can_read(&self) -> bool {
        *self >= AccessDecision::Read
    }

    /// Check if this decision grants write access.
    ///
    /// # Returns
    ///
    /// `true` for Write and Owner
    pub fn can_write(&self) -> bool {
        *self >= AccessDecision::Write
    }

    /// Check if this decision is the owner decision.
    pub fn is_owner(&self) -> bool {
        matches!(self, AccessDecision::Owner)
    }

    /// Check if this decision allows the given operation.
    pub fn permits(&self, operation: Operation) -> bool {
        *self >= operation.minimum_decision()
    }

    /// Get string representation of the decision.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Read => "read",
            Self::Write => "write",
            Self::Owner => "owner",
        }
    }
}

impl Default for AccessDecision {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation a caller wants to perform on a resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// View the resource
    Read,

    /// Modify the resource's content
    Write,
}

impl Operation {
    /// Lowest decision that allows this operation.
    pub fn minimum_decision(&self) -> AccessDecision {
        match self {
            Self::Read => AccessDecision::Read,
            Self::Write => AccessDecision::Write,
        }
    }

    /// Get string representation of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}
