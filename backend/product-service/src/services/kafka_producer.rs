//! Kafka producer with an asynchronous delivery-report loop
//!
//! `send` only enqueues into the client's local buffer and returns; delivery
//! confirmation happens in a background task that drains the per-send
//! delivery futures for the lifetime of the client. Reports are not
//! correlated back to callers: acknowledgement failures surface in the logs,
//! never as a `send` error.

use futures::channel::oneshot::Canceled;
use rdkafka::producer::future_producer::OwnedDeliveryResult;
use rdkafka::producer::{DeliveryFuture, FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::future::Future;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::MessageBrokerConfig;
use crate::error::{AppError, Result};
use crate::services::products::MessageBroker;

/// Budget for flushing buffered, unacknowledged messages during close.
/// If it elapses, close proceeds anyway; the flush is best-effort.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct KafkaProducer {
    producer: FutureProducer,
    topic: String,
    /// Taken (and thereby closed) exactly once during `close`; a `None` here
    /// means the producer has been closed and rejects further sends.
    report_tx: StdMutex<Option<mpsc::UnboundedSender<DeliveryFuture>>>,
    report_task: Mutex<Option<JoinHandle<()>>>,
}

impl KafkaProducer {
    /// Create the producer and start its delivery-report loop.
    ///
    /// `acks=all` plus idempotence means a successful enqueue followed by a
    /// clean delivery report implies no silent loss or duplication under
    /// broker-side retries.
    pub fn new(config: &MessageBrokerConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(AppError::Internal("kafka endpoint is required".to_string()));
        }
        if config.topic.is_empty() {
            return Err(AppError::Internal("kafka topic is required".to_string()));
        }

        let client_id = match std::env::var("HOSTNAME") {
            Ok(host) if !host.is_empty() => format!("{}-{}", config.client_id, host),
            _ => config.client_id.clone(),
        };

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.endpoint)
            .set("client.id", &client_id)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("compression.type", "gzip")
            .set("message.timeout.ms", "30000")
            .create()
            .map_err(AppError::Kafka)?;

        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let report_task = tokio::spawn(drain_delivery_reports(report_rx));

        info!(
            endpoint = %config.endpoint,
            topic = %config.topic,
            client_id = %client_id,
            "Kafka producer created"
        );

        Ok(Self {
            producer,
            topic: config.topic.clone(),
            report_tx: StdMutex::new(Some(report_tx)),
            report_task: Mutex::new(Some(report_task)),
        })
    }
}

/// Runs until the report channel closes during `close`, after every pending
/// future has been observed. Generic over the future type so tests can feed
/// it synthetic reports.
async fn drain_delivery_reports<F>(mut reports: mpsc::UnboundedReceiver<F>)
where
    F: Future<Output = std::result::Result<OwnedDeliveryResult, Canceled>>,
{
    while let Some(report) = reports.recv().await {
        match report.await {
            Ok(Ok((partition, offset))) => {
                debug!(partition, offset, "Message delivered");
            }
            Ok(Err((e, _msg))) => {
                error!(error = %e, "Failed to deliver message");
            }
            Err(_) => {
                // Producer dropped before the report resolved.
                warn!("Delivery report cancelled");
            }
        }
    }
}

#[async_trait::async_trait]
impl MessageBroker for KafkaProducer {
    /// Enqueue a message; an empty `topic` targets the default configured
    /// topic. Returns as soon as the local enqueue succeeds.
    async fn send(&self, topic: &str, payload: &[u8], key: &[u8]) -> Result<()> {
        let target = if topic.is_empty() {
            self.topic.as_str()
        } else {
            topic
        };

        let guard = self
            .report_tx
            .lock()
            .map_err(|_| AppError::Internal("report channel lock poisoned".to_string()))?;
        let tx = guard.as_ref().ok_or_else(|| {
            AppError::Internal("kafka producer is not initialized".to_string())
        })?;

        let record = FutureRecord::to(target).payload(payload).key(key);
        let report = self
            .producer
            .send_result(record)
            .map_err(|(e, _)| AppError::Kafka(e))?;

        // Fire and forget: the drain task observes the outcome.
        let _ = tx.send(report);
        Ok(())
    }

    /// Flush buffered messages within a bounded budget, then drain all
    /// pending delivery reports. Safe to call once during shutdown.
    async fn close(&self) -> Result<()> {
        let tx = {
            let mut guard = self
                .report_tx
                .lock()
                .map_err(|_| AppError::Internal("report channel lock poisoned".to_string()))?;
            guard.take()
        };
        if tx.is_none() {
            return Ok(());
        }
        drop(tx);

        let producer = self.producer.clone();
        match tokio::task::spawn_blocking(move || producer.flush(FLUSH_TIMEOUT)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Flush did not complete; closing anyway"),
            Err(e) => warn!(error = %e, "Flush task failed; closing anyway"),
        }

        if let Some(task) = self.report_task.lock().await.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Delivery report loop panicked");
            }
        }

        info!("Kafka producer closed");
        Ok(())
    }
}
