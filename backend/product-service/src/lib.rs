//! Product service library
//!
//! Persists product records behind an HTTP API and publishes a domain event to
//! Kafka for every successful mutation. Consumers (notification-service) react
//! to those events downstream.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
