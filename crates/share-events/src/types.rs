//! Event types for sharing changes
//!
//! This module defines the event envelope and the typed sharing events
//! published after a membership or policy change has been committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use share_access::{Level, Policy};
use uuid::Uuid;

use crate::bus::{EventBusError, EventBusResult};

/// Source segment of every sharing topic.
pub const EVENT_SOURCE: &str = "sharing";

/// Event envelope.
///
/// All events are wrapped in this envelope, which carries what routing
/// and auditing need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID
    pub id: Uuid,

    /// Event type (e.g., "member.added", "policy.changed")
    pub event_type: String,

    /// Source component
    pub source: String,

    /// Timestamp when event was created
    pub timestamp: DateTime<Utc>,

    /// Resource the event is about
    pub resource_id: Option<Uuid>,

    /// User who triggered the event
    pub actor_id: Option<Uuid>,

    /// Event version for schema evolution
    pub version: u32,

    /// Event payload
    pub payload: serde_json::Value,
}

impl Event {
    /// Create a new event from the sharing source.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The event type string
    /// * `payload` - The event payload
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type: event_type.into(),
            source: EVENT_SOURCE.to_string(),
            timestamp: Utc::now(),
            resource_id: None,
            actor_id: None,
            version: 1,
            payload,
        }
    }

    /// Set resource context.
    pub fn with_resource(mut self, resource_id: Uuid) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    /// Set the acting user.
    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Get the topic for this event.
    ///
    /// Topics are structured as: `{source}.{event_type}`
    pub fn topic(&self) -> String {
        format!("{}.{}", self.source, self.event_type)
    }

    /// Parse the payload into a specific type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Sharing changes, published after they are stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SharingEvent {
    /// Resource was shared with a user
    MemberAdded {
        resource_id: Uuid,
        user_id: Uuid,
        level: Level,
    },
    /// Owner removed a member
    MemberRemoved { resource_id: Uuid, user_id: Uuid },
    /// Member removed themselves
    MemberLeft { resource_id: Uuid, user_id: Uuid },
    /// Owner changed a member's stored level
    LevelChanged {
        resource_id: Uuid,
        user_id: Uuid,
        level: Level,
    },
    /// Owner switched the resource policy
    PolicyChanged {
        resource_id: Uuid,
        previous: Policy,
        policy: Policy,
    },
    /// Owner deleted the resource together with its memberships
    ResourceDeleted {
        resource_id: Uuid,
        removed_members: Vec<Uuid>,
    },
}

impl SharingEvent {
    /// Event type string, the part of the topic after the source.
    pub fn event_type(&self) -> &'static str {
        match self {
            SharingEvent::MemberAdded { .. } => "member.added",
            SharingEvent::MemberRemoved { .. } => "member.removed",
            SharingEvent::MemberLeft { .. } => "member.left",
            SharingEvent::LevelChanged { .. } => "member.level_changed",
            SharingEvent::PolicyChanged { .. } => "policy.changed",
            SharingEvent::ResourceDeleted { .. } => "resource.deleted",
        }
    }

    /// Resource the event is about.
    pub fn resource_id(&self) -> Uuid {
        match self {
            SharingEvent::MemberAdded { resource_id, .. }
            | SharingEvent::MemberRemoved { resource_id, .. }
            | SharingEvent::MemberLeft { resource_id, .. }
            | SharingEvent::LevelChanged { resource_id, .. }
            | SharingEvent::PolicyChanged { resource_id, .. }
            | SharingEvent::ResourceDeleted { resource_id, .. } => *resource_id,
        }
    }

    /// Convert to generic event.
    pub fn to_event(&self) -> EventBusResult<Event> {
        let payload = serde_json::to_value(self)
            .map_err(|e| EventBusError::SerializationError(e.to_string()))?;
        Ok(Event::new(self.event_type(), payload).with_resource(self.resource_id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_topic() {
        let event = Event::new("member.added", serde_json::json!({}));
        assert_eq!(event.topic(), "sharing.member.added");
        assert_eq!(event.version, 1);
    }

    #[test]
    fn test_sharing_event_to_event() {
        let resource_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();
        let sharing = SharingEvent::LevelChanged {
            resource_id,
            user_id,
            level: Level::Read,
        };

        let event = sharing.to_event().unwrap().with_actor(user_id);
        assert_eq!(event.topic(), "sharing.member.level_changed");
        assert_eq!(event.resource_id, Some(resource_id));
        assert_eq!(event.actor_id, Some(user_id));
        assert_eq!(event.payload["type"], "level_changed");
        assert_eq!(event.payload["level"], "read");

        let parsed: SharingEvent = event.parse_payload().unwrap();
        assert_eq!(parsed, sharing);
    }

    #[test]
    fn test_membership_event_types() {
        let (resource_id, user_id) = (Uuid::now_v7(), Uuid::now_v7());
        let added = SharingEvent::MemberAdded {
            resource_id,
            user_id,
            level: Level::Write,
        };
        let removed = SharingEvent::MemberRemoved {
            resource_id,
            user_id,
        };

        assert_eq!(added.event_type(), "member.added");
        assert_eq!(removed.event_type(), "member.removed");
        assert_eq!(removed.to_event().unwrap().payload["type"], "member_removed");
    }

    #[test]
    fn test_policy_changed_payload() {
        let event = SharingEvent::PolicyChanged {
            resource_id: Uuid::now_v7(),
            previous: Policy::All,
            policy: Policy::ReadOnly,
        }
        .to_event()
        .unwrap();

        assert_eq!(event.payload["previous"], "all");
        assert_eq!(event.payload["policy"], "readonly");
    }

    #[test]
    fn test_envelope_fields() {
        let resource_id = Uuid::now_v7();
        let event = SharingEvent::MemberLeft {
            resource_id,
            user_id: Uuid::now_v7(),
        }
        .to_event()
        .unwrap();

        let json = serde_json::to_value(&event).unwrap();
        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "actor_id",
                "event_type",
                "id",
                "payload",
                "resource_id",
                "source",
                "timestamp",
                "version"
            ]
        );
        assert_eq!(json["resource_id"], resource_id.to_string());
    }
}
