//! Event fan-out for Mulligan.
//!
//! Every inbound message and connection lifecycle change is published to a
//! list of independent observers — logging today, bots and metrics later —
//! without the connection handler knowing who is listening.
//!
//! Observers are invoked synchronously, in subscription order, and must
//! not block the caller indefinitely: the notifying task is a connection's
//! own receive loop. [`EventBus::notify`] iterates a snapshot of the
//! subscriber list, so an observer may subscribe or unsubscribe (itself
//! included) during notification without invalidating the iteration;
//! such changes take effect from the next event.

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use mulligan_protocol::Message;
use mulligan_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Something observers may care about.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A connection was accepted (no session exists yet).
    Connected {
        connection: ConnectionId,
        peer: SocketAddr,
    },

    /// A message was decoded off a connection, before dispatch.
    MessageReceived {
        connection: ConnectionId,
        message: Message,
    },

    /// A connection was torn down (any cause: exit, violation, error).
    Disconnected { connection: ConnectionId },
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// A subscriber notified of every published event.
///
/// Implementations receive a shared reference and must treat the event as
/// read-only; the same value is handed to every observer in turn.
pub trait Observer: Send + Sync {
    fn notify(&self, event: &ServerEvent);
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// The subscriber registry.
///
/// Subscribers are held as `Arc<dyn Observer>`; unsubscription compares by
/// allocation identity (`Arc::ptr_eq`), so the handle used to subscribe is
/// the handle that unsubscribes.
#[derive(Default)]
pub struct EventBus {
    observers: RwLock<Vec<Arc<dyn Observer>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer to the notification order.
    pub fn subscribe(&self, observer: Arc<dyn Observer>) {
        self.observers
            .write()
            .expect("observer list poisoned")
            .push(observer);
    }

    /// Removes a previously subscribed observer.
    ///
    /// A no-op if the observer was never subscribed.
    pub fn unsubscribe(&self, observer: &Arc<dyn Observer>) {
        self.observers
            .write()
            .expect("observer list poisoned")
            .retain(|o| !Arc::ptr_eq(o, observer));
    }

    /// Publishes an event to every subscriber, in subscription order.
    ///
    /// The subscriber list is snapshotted first and the lock released
    /// before any observer runs, so observers may mutate the list freely.
    pub fn notify(&self, event: &ServerEvent) {
        let snapshot: Vec<Arc<dyn Observer>> = self
            .observers
            .read()
            .expect("observer list poisoned")
            .clone();
        for observer in snapshot {
            observer.notify(event);
        }
    }

    /// Returns the number of current subscribers.
    pub fn len(&self) -> usize {
        self.observers
            .read()
            .expect("observer list poisoned")
            .len()
    }

    /// Returns `true` if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// TraceObserver
// ---------------------------------------------------------------------------

/// An observer that logs every event through `tracing`.
///
/// The server subscribes one of these at startup so every inbound message
/// shows up in the logs without any handler involvement.
#[derive(Debug, Default)]
pub struct TraceObserver;

impl Observer for TraceObserver {
    fn notify(&self, event: &ServerEvent) {
        match event {
            ServerEvent::Connected { connection, peer } => {
                tracing::debug!(%connection, %peer, "connection accepted");
            }
            ServerEvent::MessageReceived {
                connection,
                message,
            } => {
                tracing::debug!(
                    %connection,
                    kind = %message.kind(),
                    "message received"
                );
            }
            ServerEvent::Disconnected { connection } => {
                tracing::debug!(%connection, "connection closed");
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records which observers ran, in order, into a shared log.
    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Observer for Recorder {
        fn notify(&self, _event: &ServerEvent) {
            self.log.lock().unwrap().push(self.tag);
        }
    }

    fn disconnect_event() -> ServerEvent {
        ServerEvent::Disconnected {
            connection: ConnectionId::new(1),
        }
    }

    #[test]
    fn test_notify_reaches_all_observers_in_subscription_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(Arc::new(Recorder {
            tag: "first",
            log: Arc::clone(&log),
        }));
        bus.subscribe(Arc::new(Recorder {
            tag: "second",
            log: Arc::clone(&log),
        }));

        bus.notify(&disconnect_event());

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_every_observer_sees_every_event() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(Arc::new(Recorder {
            tag: "only",
            log: Arc::clone(&log),
        }));

        bus.notify(&disconnect_event());
        bus.notify(&disconnect_event());
        bus.notify(&disconnect_event());

        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let observer: Arc<dyn Observer> = Arc::new(Recorder {
            tag: "gone",
            log: Arc::clone(&log),
        });
        bus.subscribe(Arc::clone(&observer));

        bus.notify(&disconnect_event());
        bus.unsubscribe(&observer);
        bus.notify(&disconnect_event());

        assert_eq!(*log.lock().unwrap(), vec!["gone"]);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_unsubscribe_unknown_observer_is_noop() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(Arc::new(Recorder {
            tag: "stays",
            log: Arc::clone(&log),
        }));
        let stranger: Arc<dyn Observer> = Arc::new(Recorder {
            tag: "stranger",
            log: Arc::clone(&log),
        });

        bus.unsubscribe(&stranger);

        assert_eq!(bus.len(), 1);
    }

    /// An observer that unsubscribes another observer mid-notification.
    struct Remover {
        bus: Arc<EventBus>,
        victim: Arc<dyn Observer>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Observer for Remover {
        fn notify(&self, _event: &ServerEvent) {
            self.log.lock().unwrap().push("remover");
            self.bus.unsubscribe(&self.victim);
        }
    }

    #[test]
    fn test_unsubscribe_during_notify_takes_effect_next_event() {
        // The current notification runs against a snapshot: the victim
        // still receives this event, but not the next one.
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let victim: Arc<dyn Observer> = Arc::new(Recorder {
            tag: "victim",
            log: Arc::clone(&log),
        });
        bus.subscribe(Arc::new(Remover {
            bus: Arc::clone(&bus),
            victim: Arc::clone(&victim),
            log: Arc::clone(&log),
        }));
        bus.subscribe(Arc::clone(&victim));

        bus.notify(&disconnect_event());
        bus.notify(&disconnect_event());

        assert_eq!(
            *log.lock().unwrap(),
            vec!["remover", "victim", "remover"]
        );
    }
}
