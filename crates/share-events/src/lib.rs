//! # Share Events
//!
//! This crate provides the event bus through which sharing changes are
//! observed by the rest of the application (notifications, activity feed,
//! email). The sharing core publishes; it never waits for consumers.
//!
//! ## Overview
//!
//! The share-events crate handles:
//! - **Event Envelope**: `Event` with id, timestamp, actor and resource context
//! - **Sharing Events**: Strongly-typed `SharingEvent` variants
//! - **Event Bus**: Publish/subscribe messaging with topic wildcards
//! - **Event Handlers**: Async event processing
//!
//! ## Topic Patterns
//!
//! Topics are structured as `{source}.{event_type}`:
//! - `sharing.member.added` - Specific event
//! - `sharing.member.*` - All membership events
//! - `sharing.#` - All sharing events
//!
//! Wildcards:
//! - `*` matches exactly one segment
//! - `#` matches zero or more segments
//!
//! ## Usage
//!
//! ```rust,no_run
//! use share_events::{EventBus, MemoryEventBus, SharingEvent};
//! use share_access::Level;
//! use uuid::Uuid;
//!
//! async fn example() {
//!     let bus = MemoryEventBus::new();
//!     let mut sub = bus.subscribe("sharing.member.*").await.unwrap();
//!
//!     let event = SharingEvent::MemberAdded {
//!         resource_id: Uuid::now_v7(),
//!         user_id: Uuid::now_v7(),
//!         level: Level::Write,
//!     };
//!     bus.publish(event.to_event().unwrap()).await.unwrap();
//!
//!     let received = sub.recv().await.unwrap();
//!     println!("Received: {}", received.event_type);
//! }
//! ```

pub mod bus;
pub mod types;

// Re-export main types
pub use bus::{
    EventBus, EventBusError, EventBusResult, EventBusStats, EventHandler, MemoryEventBus,
    Subscription,
};
pub use types::{Event, SharingEvent, EVENT_SOURCE};
