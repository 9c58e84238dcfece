//! # In-Memory Event Bus
//!
//! Topic-keyed publish/subscribe with fire-and-forget delivery.
//!
//! ## Delivery Semantics
//!
//! - Every subscriber of a topic is invoked on its own spawned task
//! - `publish` returns as soon as the tasks are spawned; it never fails
//! - Subscriber errors and panics are logged and counted, never propagated
//! - Subscriber tasks are detached from the publisher, so a cancelled
//!   publisher does not truncate them
//! - Spawned tasks are tracked; [`InMemoryEventBus::shutdown`] stops accepting
//!   new events and waits for in-flight subscribers up to a timeout
//! - While draining, events published from inside a subscriber are still
//!   delivered and awaited, so follow-up notifications are not lost
//!
//! Nothing is persisted: events published before a crash are lost.

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};

use super::types::{BusEvent, EventBusError, EventHandler, EventHandlerError, EventPayload};

/// Publish/subscribe contract shared by every bus implementation
pub trait EventBus: Send + Sync {
    /// Dispatch `payload` to every current subscriber of `topic`.
    ///
    /// Returns the number of subscribers the event was handed to.
    fn publish(&self, topic: &str, payload: EventPayload) -> usize;

    /// Append `handler` to the subscriber list of `topic`
    fn subscribe(&self, topic: &str, handler: EventHandler) -> Result<(), EventBusError>;
}

/// Configuration for the in-memory bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Log every subscriber failure individually at warn level
    pub log_subscriber_errors: bool,
    /// Upper bound on the drain performed by `shutdown`
    pub shutdown_timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            log_subscriber_errors: true,
            shutdown_timeout: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBusStats {
    pub events_published: u64,
    pub deliveries: u64,
    /// Publishes that found no subscriber, usually a wiring bug
    pub unrouted_events: u64,
    pub dropped_after_shutdown: u64,
    pub handler_errors: u64,
    pub handler_panics: u64,
    pub topic_count: usize,
    pub subscriber_count: usize,
    pub in_flight: usize,
}

/// Fire-and-forget bus backed by a subscription table and a task tracker
pub struct InMemoryEventBus {
    subscriptions: RwLock<HashMap<String, Vec<EventHandler>>>,
    tracker: TaskTracker,
    /// Set when shutdown starts; only publishes from running subscribers pass
    closed: AtomicBool,
    /// Set when the drain is over; every publish is dropped
    sealed: AtomicBool,
    config: EventBusConfig,
    stats: Arc<Mutex<EventBusStats>>,
}

tokio::task_local! {
    /// Present while a subscriber spawned by the bus is running
    static IN_DELIVERY: ();
}

fn in_delivery() -> bool {
    IN_DELIVERY.try_with(|_| ()).is_ok()
}

// Manual Debug implementation because subscriptions hold closures
impl std::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscriptions = self.subscriptions.read();
        f.debug_struct("InMemoryEventBus")
            .field("topics", &subscriptions.len())
            .field(
                "handlers",
                &subscriptions.values().map(Vec::len).sum::<usize>(),
            )
            .field("in_flight", &self.tracker.len())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .field("config", &self.config)
            .finish()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

impl InMemoryEventBus {
    pub fn new(config: EventBusConfig) -> Self {
        info!(
            log_subscriber_errors = config.log_subscriber_errors,
            shutdown_timeout_ms = config.shutdown_timeout.as_millis() as u64,
            "Creating InMemoryEventBus"
        );

        Self {
            subscriptions: RwLock::new(HashMap::new()),
            tracker: TaskTracker::new(),
            closed: AtomicBool::new(false),
            sealed: AtomicBool::new(false),
            config,
            stats: Arc::new(Mutex::new(EventBusStats::default())),
        }
    }

    pub fn builder() -> InMemoryEventBusBuilder {
        InMemoryEventBusBuilder::new()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscriptions.read().get(topic).map_or(0, Vec::len)
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop accepting events and wait for in-flight subscribers.
    ///
    /// Returns `true` if every subscriber finished before the timeout.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.closed.store(true, Ordering::Release);
        self.tracker.close();

        info!(
            in_flight = self.tracker.len(),
            timeout_ms = timeout.as_millis() as u64,
            "🛑 Event bus shutting down, waiting for in-flight handlers"
        );

        // Nested publishes spawn while their parent is still tracked, so the
        // tracker only empties once the whole cascade has finished
        let drained = match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => {
                info!("✅ Event bus drained");
                true
            }
            Err(_) => {
                warn!(
                    abandoned = self.tracker.len(),
                    "⏳ Event bus drain timed out; abandoning in-flight handlers"
                );
                false
            }
        };
        self.sealed.store(true, Ordering::Release);
        drained
    }

    /// Shut down with the configured timeout
    pub async fn shutdown_default(&self) -> bool {
        self.shutdown(self.config.shutdown_timeout).await
    }

    pub fn get_statistics(&self) -> EventBusStats {
        let mut stats = self.stats.lock().clone();
        let subscriptions = self.subscriptions.read();
        stats.topic_count = subscriptions.len();
        stats.subscriber_count = subscriptions.values().map(Vec::len).sum();
        stats.in_flight = self.tracker.len();
        stats
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    fn spawn_delivery(&self, handler: EventHandler, event: BusEvent) {
        let stats = Arc::clone(&self.stats);
        let log_errors = self.config.log_subscriber_errors;

        self.tracker.spawn(async move {
            let topic = event.topic.clone();
            let event_id = event.event_id;

            let outcome = IN_DELIVERY
                .scope((), AssertUnwindSafe(async move { handler(event).await }).catch_unwind())
                .await;

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(error)) => Some(error),
                Err(_) => {
                    stats.lock().handler_panics += 1;
                    Some(EventHandlerError::HandlerPanicked {
                        topic: topic.clone(),
                    })
                }
            };

            if let Some(error) = failure {
                stats.lock().handler_errors += 1;
                if log_errors {
                    warn!(
                        topic = %topic,
                        event_id = %event_id,
                        error = %error,
                        "Event handler failed (fire-and-forget)"
                    );
                }
            }
        });
    }
}

impl EventBus for InMemoryEventBus {
    #[instrument(skip(self, payload), fields(payload_kind = payload.kind()))]
    fn publish(&self, topic: &str, payload: EventPayload) -> usize {
        let accepting = !self.is_shut_down()
            || (!self.sealed.load(Ordering::Acquire) && in_delivery());
        if !accepting {
            warn!(topic = %topic, "Event published after shutdown; dropping");
            self.stats.lock().dropped_after_shutdown += 1;
            return 0;
        }

        // Clone the handler list so no lock is held while spawning
        let handlers: Vec<EventHandler> = self
            .subscriptions
            .read()
            .get(topic)
            .cloned()
            .unwrap_or_default();

        {
            let mut stats = self.stats.lock();
            stats.events_published += 1;
            if handlers.is_empty() {
                stats.unrouted_events += 1;
            } else {
                stats.deliveries += handlers.len() as u64;
            }
        }

        if handlers.is_empty() {
            warn!(topic = %topic, "No subscribers for topic; event dropped");
            return 0;
        }

        debug!(
            topic = %topic,
            handler_count = handlers.len(),
            "Dispatching event to subscribers"
        );

        let count = handlers.len();
        for handler in handlers {
            self.spawn_delivery(handler, BusEvent::new(topic, payload.clone()));
        }
        count
    }

    fn subscribe(&self, topic: &str, handler: EventHandler) -> Result<(), EventBusError> {
        if topic.trim().is_empty() {
            return Err(EventBusError::InvalidTopic {
                topic: topic.to_string(),
                reason: "Topic cannot be empty".to_string(),
            });
        }
        if self.is_shut_down() {
            return Err(EventBusError::ShutDown);
        }

        let mut subscriptions = self.subscriptions.write();
        let handlers = subscriptions.entry(topic.to_string()).or_default();
        handlers.push(handler);

        debug!(
            topic = %topic,
            handler_count = handlers.len(),
            "Registered event subscriber"
        );
        Ok(())
    }
}

/// Builder for InMemoryEventBus for convenient setup
#[derive(Debug, Default)]
pub struct InMemoryEventBusBuilder {
    config: EventBusConfig,
}

impl InMemoryEventBusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_subscriber_errors(mut self, enabled: bool) -> Self {
        self.config.log_subscriber_errors = enabled;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_timeout = timeout;
        self
    }

    pub fn build(self) -> InMemoryEventBus {
        InMemoryEventBus::new(self.config)
    }
}
