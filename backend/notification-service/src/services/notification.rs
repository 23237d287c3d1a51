//! Domain reaction to product events
//!
//! Intentionally minimal: this service logs each event. Anything downstream
//! (alerting, fan-out, push delivery) plugs in behind `ProductEventHandler`.

use async_trait::async_trait;
use event_schema::{ProductEvent, ProductEventType};
use tracing::{info, warn};

use crate::error::Result;

/// Domain-level reaction to a decoded product event.
///
/// Delivery is at-least-once, so implementations must be idempotent or
/// tolerate redelivery after a crash.
#[async_trait]
pub trait ProductEventHandler: Send + Sync {
    async fn handle_event(&self, event: &ProductEvent) -> Result<()>;
}

#[derive(Default)]
pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProductEventHandler for NotificationService {
    async fn handle_event(&self, event: &ProductEvent) -> Result<()> {
        match event.event_type {
            ProductEventType::ProductCreated => {
                info!(
                    id = %event.product.id,
                    name = %event.product.name,
                    price = event.product.price,
                    created_at = %event.product.created_at,
                    "PRODUCT CREATED"
                );
            }
            ProductEventType::ProductDeleted => {
                info!(
                    id = %event.product.id,
                    name = %event.product.name,
                    created_at = %event.product.created_at,
                    "PRODUCT DELETED"
                );
            }
            ProductEventType::Unknown => {
                warn!(id = %event.product.id, "UNKNOWN EVENT TYPE");
            }
        }

        Ok(())
    }
}
