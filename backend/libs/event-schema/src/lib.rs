//! Event schema for the product-events Kafka topic
//!
//! This library defines the wire contract shared by product-service (producer
//! side) and notification-service (consumer side). Events are serialized as
//! JSON; the serialized form is the contract, not the in-memory types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product snapshot embedded in every product event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price is stored in minor units (cents).
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

/// Kind of product event.
///
/// Unknown `event_type` strings deserialize into `Unknown` instead of failing,
/// so consumers can route them to a default path rather than dropping the
/// whole message as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductEventType {
    ProductCreated,
    ProductDeleted,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ProductEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ProductEventType::ProductCreated => write!(f, "product_created"),
            ProductEventType::ProductDeleted => write!(f, "product_deleted"),
            ProductEventType::Unknown => write!(f, "unknown"),
        }
    }
}

/// A domain event describing a product mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEvent {
    pub event_type: ProductEventType,
    pub product: Product,
    pub timestamp: DateTime<Utc>,
}

impl ProductEvent {
    pub fn created(product: Product) -> Self {
        Self {
            event_type: ProductEventType::ProductCreated,
            product,
            timestamp: Utc::now(),
        }
    }

    pub fn deleted(product: Product) -> Self {
        Self {
            event_type: ProductEventType::ProductDeleted,
            product,
            timestamp: Utc::now(),
        }
    }

    /// Serialize the event to its JSON wire form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode an event from its JSON wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Kafka message key: the product identity. The broker hashes the key to
    /// a partition, which preserves per-product ordering.
    pub fn key(&self) -> &[u8] {
        self.product.id.as_bytes()
    }
}
