//! Publish/subscribe seam between the oracle and its consumers.
//!
//! The oracle only ever talks to `dyn EventBus`; the in-memory broadcast
//! implementation is what the binary wires in.

use crate::core::currency::Currency;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 64;

pub type EventReceiver = broadcast::Receiver<Arc<OracleEvent>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    CurrencyLoaded,
    PriceUpdate,
}

impl Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Topic::CurrencyLoaded => "currency-loaded",
                Topic::PriceUpdate => "price-update",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleEvent {
    /// Full cache contents, keyed by lowercase code.
    CurrencyLoaded(HashMap<String, Currency>),
    /// Prices changed; consumers re-read what they need.
    PriceUpdate,
}

impl OracleEvent {
    pub fn topic(&self) -> Topic {
        match self {
            OracleEvent::CurrencyLoaded(_) => Topic::CurrencyLoaded,
            OracleEvent::PriceUpdate => Topic::PriceUpdate,
        }
    }
}

pub trait EventBus: Send + Sync {
    fn emit(&self, event: OracleEvent);

    fn subscribe(&self) -> EventReceiver;
}

pub struct InMemoryEventBus {
    tx: broadcast::Sender<Arc<OracleEvent>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InMemoryEventBus {
    fn emit(&self, event: OracleEvent) {
        let topic = event.topic();
        // Err only means nobody is listening
        if self.tx.send(Arc::new(event)).is_err() {
            debug!(%topic, "Event emitted with no subscribers");
        } else {
            debug!(%topic, "Event emitted");
        }
    }

    fn subscribe(&self) -> EventReceiver {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names() {
        assert_eq!(Topic::CurrencyLoaded.to_string(), "currency-loaded");
        assert_eq!(Topic::PriceUpdate.to_string(), "price-update");
        assert_eq!(OracleEvent::PriceUpdate.topic(), Topic::PriceUpdate);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let bus = InMemoryEventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(OracleEvent::CurrencyLoaded(HashMap::new()));
        bus.emit(OracleEvent::PriceUpdate);

        assert_eq!(rx.recv().await.unwrap().topic(), Topic::CurrencyLoaded);
        assert_eq!(rx.recv().await.unwrap().topic(), Topic::PriceUpdate);
    }

    #[test]
    fn test_emit_without_subscribers_is_harmless() {
        let bus = InMemoryEventBus::new();
        bus.emit(OracleEvent::PriceUpdate);
    }
}
