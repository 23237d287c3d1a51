//! Kafka consumer pump with a bounded worker pool
//!
//! The pump pulls raw messages from the subscribed topic and hands them to a
//! fixed pool of worker tasks over a capacity-1 channel. Because the handoff
//! is effectively unbuffered, the pump can never pull faster than the workers
//! drain; backpressure is the channel itself, not an explicit queue depth
//! limit.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{Message, OwnedMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::MessageBrokerConfig;
use crate::error::{AppError, Result};
use crate::services::consumer::{MessageConsumer, MessageHandler};

/// How long a single poll blocks before the pump re-checks for shutdown.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Pause after a non-timeout poll error so a broker outage does not turn the
/// pump into a tight error loop. Poll errors are retried indefinitely.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// One bounded poll against the underlying transport. `Ok(None)` is a poll
/// timeout with no message, which is not an error.
#[async_trait]
trait MessageSource: Send + Sync {
    async fn poll_message(&self) -> std::result::Result<Option<OwnedMessage>, KafkaError>;
}

#[async_trait]
impl MessageSource for StreamConsumer {
    async fn poll_message(&self) -> std::result::Result<Option<OwnedMessage>, KafkaError> {
        match tokio::time::timeout(POLL_TIMEOUT, self.recv()).await {
            Err(_) => Ok(None),
            Ok(Ok(msg)) => Ok(Some(msg.detach())),
            Ok(Err(e)) => Err(e),
        }
    }
}

fn spawn_workers(
    worker_count: usize,
    rx: mpsc::Receiver<OwnedMessage>,
    handler: Arc<dyn MessageHandler>,
) -> Vec<tokio::task::JoinHandle<()>> {
    let rx = Arc::new(Mutex::new(rx));

    (0..worker_count)
        .map(|worker_id| {
            let rx = Arc::clone(&rx);
            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                loop {
                    // The lock is released before the handler runs so the
                    // pool stays parallel; recv() returns None once the pump
                    // closes the channel and it is drained.
                    let msg = { rx.lock().await.recv().await };
                    let Some(msg) = msg else { break };

                    let payload = msg.payload().unwrap_or_default();
                    if let Err(e) = handler.handle(payload).await {
                        error!(
                            error = %e,
                            worker_id,
                            message = %String::from_utf8_lossy(payload),
                            "Failed to process message"
                        );
                    }
                }

                debug!(worker_id, "Worker exited");
            })
        })
        .collect()
}

/// Pump loop shared by the real consumer and the tests.
///
/// Runs until `shutdown` flips, then closes the handoff channel (each worker
/// finishes its current message and exits) and joins every worker before
/// returning. No task is abandoned mid-handler.
async fn run_pump(
    source: &dyn MessageSource,
    worker_count: usize,
    handler: Arc<dyn MessageHandler>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<OwnedMessage>(1);
    let workers = spawn_workers(worker_count, rx, handler);

    while !*shutdown.borrow() {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }

            polled = source.poll_message() => {
                match polled {
                    // Poll timeout with no message: re-poll.
                    Ok(None) => continue,
                    Err(e) => {
                        error!(error = %e, "Consumer error");
                        tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    }
                    Ok(Some(msg)) => {
                        // The handoff itself is cancellable: if shutdown
                        // fires while every worker is busy, stop pulling
                        // instead of accepting a message we cannot place.
                        tokio::select! {
                            sent = tx.send(msg) => {
                                if sent.is_err() {
                                    break;
                                }
                            }
                            changed = shutdown.changed() => {
                                if changed.is_err() || *shutdown.borrow() {
                                    break;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    info!("Stopping Kafka consumer...");
    drop(tx);

    for worker in workers {
        if let Err(e) = worker.await {
            warn!(error = %e, "Worker task panicked");
        }
    }

    info!("Kafka consumer stopped");
    Ok(())
}

/// Kafka consumer wrapper owning the subscription and the worker pool.
///
/// Offsets are auto-committed periodically by the client, so delivery is
/// at-least-once: a crash between processing and the next commit redelivers.
/// Handlers must tolerate redelivery.
pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    pub fn new(config: &MessageBrokerConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(AppError::Internal(
                "message broker endpoint is required".to_string(),
            ));
        }

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.endpoint)
            .set("group.id", &config.group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .create()
            .map_err(AppError::Kafka)?;

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
        })
    }
}

#[async_trait]
impl MessageConsumer for KafkaConsumer {
    /// Run the pump until `shutdown` flips.
    ///
    /// Subscribe failure is fatal and returned immediately; poll errors are
    /// logged and retried.
    async fn consume(
        &self,
        worker_count: usize,
        handler: Arc<dyn MessageHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        self.consumer
            .subscribe(&[&self.topic])
            .map_err(AppError::Kafka)?;

        info!(topic = %self.topic, worker_count, "Started consuming messages from topic");

        run_pump(&self.consumer, worker_count, handler, shutdown).await
    }

    async fn close(&self) -> Result<()> {
        self.consumer.unsubscribe();
        Ok(())
    }
}
