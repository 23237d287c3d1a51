//! Notification service library
//!
//! Consumes product events from Kafka and reacts to them. The transport layer
//! (consumer pump, worker pool, graceful drain) lives in `services` behind
//! capability traits so the domain reaction stays pluggable.

pub mod config;
pub mod error;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
