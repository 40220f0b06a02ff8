//! Sharing policies
//!
//! A policy is the resource-wide rule deciding how membership rows are read.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ShareError;

/// Resource-wide sharing policy.
///
/// The policy decides how the membership rows of a resource are interpreted.
/// Switching policy never touches the rows themselves, so per-user levels
/// stored while the resource was [`Policy::Custom`] come back as soon as the
/// resource is switched to `Custom` again.
///
/// # Policy Model
///
/// - **All**: Every member gets write access
/// - **ReadOnly**: Every member gets read access
/// - **Custom**: Each member gets the level stored on their membership
///
/// # Examples
///
/// ```
/// use share_access::Policy;
///
/// assert!(Policy::Custom.uses_member_levels());
/// assert!(!Policy::All.uses_member_levels());
/// assert_eq!("readonly".parse::<Policy>().unwrap(), Policy::ReadOnly);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Every member may write
    All,

    /// Every member may only read
    ReadOnly,

    /// Each member's stored level applies
    Custom,
}

impl Policy {
    /// All policies, in declaration order.
    pub const VARIANTS: [Policy; 3] = [Policy::All, Policy::ReadOnly, Policy::Custom];

    /// Check whether per-member levels are consulted under this policy.
    ///
    /// # Returns
    ///
    /// `true` only for [`Policy::Custom`]
    pub fn uses_member_levels(&self) -> bool {
        matches!(self, Policy::Custom)
    }

    /// Parse policy from string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive)
    ///
    /// # Returns
    ///
    /// `Some(Policy)` if valid, `None` otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use share_access::Policy;
    ///
    /// assert_eq!(Policy::parse("ALL"), Some(Policy::All));
    /// assert_eq!(Policy::parse("custom"), Some(Policy::Custom));
    /// assert_eq!(Policy::parse("everyone"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(Self::All),
            "readonly" => Some(Self::ReadOnly),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Get string representation of the policy, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ReadOnly => "readonly",
            Self::Custom => "custom",
        }
    }

    /// Get a human-readable display name for the policy.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::All => "Everyone can edit",
            Self::ReadOnly => "Read only",
            Self::Custom => "Custom",
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::All
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ShareError::InvalidPolicy(s.to_string()))
    }
}
