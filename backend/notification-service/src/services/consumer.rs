//! Event dispatcher sitting between the broker transport and domain logic
//!
//! `MessageConsumer` is the capability interface over the concrete broker
//! client so the transport is swappable and mockable. The dispatcher decodes
//! raw payloads into typed events and routes them to the injected handler;
//! a malformed message or a failing handler never stops the pump.

use std::sync::Arc;

use async_trait::async_trait;
use event_schema::ProductEvent;
use tokio::sync::watch;
use tracing::error;

use crate::error::Result;
use crate::services::notification::ProductEventHandler;

/// Processes one raw message payload. Invoked by the worker pool.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, payload: &[u8]) -> Result<()>;
}

/// Capability interface over the broker consumer client.
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Pull messages and fan them out to `worker_count` workers until
    /// `shutdown` flips; returns after all in-flight work has drained.
    async fn consume(
        &self,
        worker_count: usize,
        handler: Arc<dyn MessageHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Decodes raw payloads and hands typed events to the domain handler.
struct EventDispatcher {
    service: Arc<dyn ProductEventHandler>,
}

#[async_trait]
impl MessageHandler for EventDispatcher {
    async fn handle(&self, payload: &[u8]) -> Result<()> {
        let event = ProductEvent::from_bytes(payload).map_err(|e| {
            error!(error = %e, "Failed to unmarshal event");
            e
        })?;

        self.service.handle_event(&event).await
    }
}

/// Consumer facade wiring the broker transport to the event handler.
pub struct EventConsumer {
    broker: Arc<dyn MessageConsumer>,
    service: Arc<dyn ProductEventHandler>,
}

impl EventConsumer {
    pub fn new(broker: Arc<dyn MessageConsumer>, service: Arc<dyn ProductEventHandler>) -> Self {
        Self { broker, service }
    }

    /// Start consuming; blocks until shutdown or a fatal subscribe error.
    pub async fn start(
        &self,
        worker_count: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let dispatcher = Arc::new(EventDispatcher {
            service: Arc::clone(&self.service),
        });

        self.broker.consume(worker_count, dispatcher, shutdown).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.broker.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use chrono::Utc;
    use event_schema::{Product, ProductEventType};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<ProductEvent>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl ProductEventHandler for RecordingHandler {
        async fn handle_event(&self, event: &ProductEvent) -> Result<()> {
            self.events.lock().unwrap().push(event.clone());
            match &self.fail_with {
                Some(msg) => Err(AppError::Handler(msg.clone())),
                None => Ok(()),
            }
        }
    }

    fn dispatcher(handler: Arc<RecordingHandler>) -> EventDispatcher {
        EventDispatcher { service: handler }
    }

    fn widget_event() -> ProductEvent {
        ProductEvent::created(Product {
            id: "p1".to_string(),
            name: "Widget".to_string(),
            description: String::new(),
            price: 500,
            created_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn valid_event_reaches_handler_exactly_once() {
        let handler = Arc::new(RecordingHandler::default());
        let dispatcher = dispatcher(Arc::clone(&handler));

        let payload = widget_event().to_bytes().unwrap();
        dispatcher.handle(&payload).await.unwrap();

        let events = handler.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, ProductEventType::ProductCreated);
        assert_eq!(events[0].product.name, "Widget");
    }

    #[tokio::test]
    async fn malformed_payload_never_reaches_handler() {
        let handler = Arc::new(RecordingHandler::default());
        let dispatcher = dispatcher(Arc::clone(&handler));

        let err = dispatcher.handle(b"not json").await.unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_is_returned_but_does_not_poison_the_dispatcher() {
        let handler = Arc::new(RecordingHandler {
            events: Mutex::new(Vec::new()),
            fail_with: Some("downstream unavailable".to_string()),
        });
        let dispatcher = dispatcher(Arc::clone(&handler));

        let payload = widget_event().to_bytes().unwrap();
        assert!(dispatcher.handle(&payload).await.is_err());

        // A later message still gets through.
        assert!(dispatcher.handle(&payload).await.is_err());
        assert_eq!(handler.events.lock().unwrap().len(), 2);
    }
}
