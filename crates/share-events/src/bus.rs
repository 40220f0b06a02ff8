//! Event bus implementation
//!
//! This module provides the event bus abstraction and an in-memory
//! implementation for publishing and subscribing to sharing events.

use crate::types::Event;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

/// Event bus error types.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// Failed to subscribe
    #[error("Failed to subscribe: {0}")]
    SubscribeError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Channel closed
    #[error("Channel closed")]
    ChannelClosed,
}

/// Result type for event bus operations.
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Subscription handle for receiving events.
pub struct Subscription {
    /// Subscription ID
    pub id: String,
    /// Topic pattern
    pub topic: String,
    /// Event receiver
    pub receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Receive the next event.
    pub async fn recv(&mut self) -> EventBusResult<Event> {
        self.receiver
            .recv()
            .await
            .map_err(|_| EventBusError::ChannelClosed)
    }

    /// Receive an already published event without waiting.
    ///
    /// Returns `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

/// Event handler trait for processing events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: Event) -> EventBusResult<()>;

    /// Get the topics this handler is interested in.
    fn topics(&self) -> Vec<String>;
}

/// Event bus trait for publish/subscribe operations.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event.
    async fn publish(&self, event: Event) -> EventBusResult<()>;

    /// Subscribe to a topic pattern.
    ///
    /// Topic patterns support wildcards:
    /// - `*` matches any single segment
    /// - `#` matches zero or more segments
    ///
    /// Examples:
    /// - `sharing.member.*` matches `sharing.member.added`, `sharing.member.left`
    /// - `sharing.#` matches every sharing event
    async fn subscribe(&self, topic: &str) -> EventBusResult<Subscription>;

    /// Register an event handler.
    async fn register_handler(&self, handler: Arc<dyn EventHandler>) -> EventBusResult<()>;

    /// Drop a subscription. Its receiver sees the channel closed.
    async fn unsubscribe(&self, subscription_id: &str) -> EventBusResult<()>;

    /// Get event bus stats.
    async fn stats(&self) -> EventBusStats;
}

/// Event bus statistics.
#[derive(Debug, Clone, Default)]
pub struct EventBusStats {
    /// Total events published
    pub events_published: u64,
    /// Total events delivered
    pub events_delivered: u64,
    /// Active subscriptions
    pub active_subscriptions: usize,
    /// Registered handlers
    pub registered_handlers: usize,
}

/// In-memory event bus implementation.
///
/// Suitable for a single process and for tests.
pub struct MemoryEventBus {
    /// Subscription ID to topic pattern and its own channel
    subscribers: Arc<RwLock<HashMap<String, (String, broadcast::Sender<Event>)>>>,
    /// Registered handlers
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
    /// Statistics
    stats: Arc<RwLock<EventBusStats>>,
    /// Default channel capacity
    channel_capacity: usize,
}

impl std::fmt::Debug for MemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEventBus")
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

impl MemoryEventBus {
    /// Create a new in-memory event bus.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create with custom channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            handlers: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(RwLock::new(EventBusStats::default())),
            channel_capacity: capacity.max(1),
        }
    }

    /// Check if a topic matches a pattern.
    pub fn topic_matches(pattern: &str, topic: &str) -> bool {
        let pattern_parts: Vec<&str> = pattern.split('.').collect();
        let topic_parts: Vec<&str> = topic.split('.').collect();
        Self::segments_match(&pattern_parts, &topic_parts)
    }

    fn segments_match(pattern: &[&str], topic: &[&str]) -> bool {
        match pattern.split_first() {
            None => topic.is_empty(),
            Some((&"#", rest)) => {
                // Zero or more segments
                (0..=topic.len()).any(|skip| Self::segments_match(rest, &topic[skip..]))
            }
            Some((&"*", rest)) => !topic.is_empty() && Self::segments_match(rest, &topic[1..]),
            Some((segment, rest)) => match topic.split_first() {
                Some((head, tail)) => head == segment && Self::segments_match(rest, tail),
                None => false,
            },
        }
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, event: Event) -> EventBusResult<()> {
        let topic = event.topic();
        let mut delivered = 0u64;
        let mut abandoned = Vec::new();

        // Notify matching subscribers
        {
            let subscribers = self.subscribers.read().await;
            for (id, (pattern, sender)) in subscribers.iter() {
                if Self::topic_matches(pattern, &topic) {
                    match sender.send(event.clone()) {
                        Ok(receivers) => delivered += receivers as u64,
                        Err(_) => abandoned.push(id.clone()),
                    }
                }
            }
        }

        // Receivers dropped without unsubscribing
        if !abandoned.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in &abandoned {
                subscribers.remove(id);
            }
        }

        // Notify handlers
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            if handler
                .topics()
                .iter()
                .any(|handler_topic| Self::topic_matches(handler_topic, &topic))
            {
                let handler = handler.clone();
                let event = event.clone();
                delivered += 1;
                tokio::task::spawn(async move {
                    if let Err(e) = handler.handle(event).await {
                        tracing::error!(error = %e, "Event handler failed");
                    }
                });
            }
        }

        {
            let mut stats = self.stats.write().await;
            stats.events_published += 1;
            stats.events_delivered += delivered;
        }

        tracing::debug!(topic = %topic, event_id = %event.id, delivered, "Event published");

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> EventBusResult<Subscription> {
        if topic.is_empty() {
            return Err(EventBusError::SubscribeError("empty topic pattern".to_string()));
        }

        let id = uuid::Uuid::now_v7().to_string();

        let (sender, receiver) = broadcast::channel(self.channel_capacity);
        self.subscribers
            .write()
            .await
            .insert(id.clone(), (topic.to_string(), sender));

        Ok(Subscription {
            id,
            topic: topic.to_string(),
            receiver,
        })
    }

    async fn register_handler(&self, handler: Arc<dyn EventHandler>) -> EventBusResult<()> {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);

        // Update stats
        {
            let mut stats = self.stats.write().await;
            stats.registered_handlers += 1;
        }

        Ok(())
    }

    async fn unsubscribe(&self, subscription_id: &str) -> EventBusResult<()> {
        if self.subscribers.write().await.remove(subscription_id).is_some() {
            tracing::debug!(subscription_id, "Unsubscribed");
        }
        Ok(())
    }

    async fn stats(&self) -> EventBusStats {
        let mut stats = self.stats.read().await.clone();
        stats.active_subscriptions = self.subscribers.read().await.len();
        stats
    }
}

// ============================================================================
// Tests
// ============================================================================
