//! Prometheus counters for product mutations
//!
//! Counters live behind an injected `ProductMetrics` capability owned by the
//! composition root instead of process-wide statics, so tests can use their
//! own registry.

use actix_web::{web, HttpResponse};
use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

use crate::error::{AppError, Result};

pub struct ProductMetrics {
    created: IntCounter,
    deleted: IntCounter,
}

impl ProductMetrics {
    pub fn new(registry: &Registry) -> Result<Self> {
        let created = IntCounter::with_opts(Opts::new(
            "products_created_total",
            "Total number of created products",
        ))
        .map_err(|e| AppError::Internal(e.to_string()))?;
        let deleted = IntCounter::with_opts(Opts::new(
            "products_deleted_total",
            "Total number of deleted products",
        ))
        .map_err(|e| AppError::Internal(e.to_string()))?;

        registry
            .register(Box::new(created.clone()))
            .map_err(|e| AppError::Internal(e.to_string()))?;
        registry
            .register(Box::new(deleted.clone()))
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Self { created, deleted })
    }

    pub fn inc_created(&self) {
        self.created.inc();
    }

    pub fn inc_deleted(&self) {
        self.deleted.inc();
    }
}

pub async fn serve_metrics(registry: web::Data<Registry>) -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
