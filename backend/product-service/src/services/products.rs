//! Business logic for product mutations and listing
//!
//! Every successful mutation increments a metrics counter and publishes a
//! product event keyed by the product id. Publishing is best-effort: a broker
//! failure is logged and the HTTP caller still gets a successful response.

use async_trait::async_trait;
use event_schema::ProductEvent;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::error::Result;
use crate::metrics::ProductMetrics;
use crate::models::{CreateProductDTO, Product};
use crate::repository::ProductsRepository;

/// Capability interface over the broker producer client.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Enqueue a message; empty `topic` means the default configured topic.
    /// `key` drives partition assignment, so per-key ordering holds only
    /// when every send for an entity uses the same key.
    async fn send(&self, topic: &str, payload: &[u8], key: &[u8]) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

pub struct ProductsService {
    repo: Arc<dyn ProductsRepository>,
    broker: Arc<dyn MessageBroker>,
    metrics: Arc<ProductMetrics>,
}

impl ProductsService {
    pub fn new(
        repo: Arc<dyn ProductsRepository>,
        broker: Arc<dyn MessageBroker>,
        metrics: Arc<ProductMetrics>,
    ) -> Self {
        Self {
            repo,
            broker,
            metrics,
        }
    }

    pub async fn create(&self, dto: &CreateProductDTO) -> Result<Product> {
        let product = self.repo.create(dto).await?;

        self.metrics.inc_created();
        self.try_send_event(ProductEvent::created(product.to_event_snapshot()))
            .await;

        Ok(product)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Product> {
        let product = self.repo.delete(id).await?;

        self.metrics.inc_deleted();
        self.try_send_event(ProductEvent::deleted(product.to_event_snapshot()))
            .await;

        Ok(product)
    }

    pub async fn list(&self, page: i64, limit: i64) -> Result<(Vec<Product>, i64)> {
        let total = self.repo.count().await?;
        let products = self.repo.list(page, limit).await?;
        Ok((products, total))
    }

    /// Publish keyed by product id. Failures are logged, never propagated:
    /// the mutation already committed and must not be rolled back by a
    /// transport problem.
    async fn try_send_event(&self, event: ProductEvent) {
        let payload = match event.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    error = %e,
                    product_id = %event.product.id,
                    event_type = %event.event_type,
                    "failed to marshal product event"
                );
                return;
            }
        };

        if let Err(e) = self.broker.send("", &payload, event.key()).await {
            error!(
                error = %e,
                product_id = %event.product.id,
                event_type = %event.event_type,
                "failed to send product event"
            );
        }
    }
}
