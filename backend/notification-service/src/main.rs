use notification_service::config::Config;
use notification_service::services::{EventConsumer, KafkaConsumer, NotificationService};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();

    info!(
        endpoint = %config.broker.endpoint,
        topic = %config.broker.topic,
        group_id = %config.broker.group_id,
        worker_count = config.worker_count,
        "Starting notification service"
    );

    let broker = Arc::new(KafkaConsumer::new(&config.broker)?);
    let service = Arc::new(NotificationService::new());
    let consumer = Arc::new(EventConsumer::new(broker, service));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_count = config.worker_count;
    let mut pump = {
        let consumer = Arc::clone(&consumer);
        tokio::spawn(async move { consumer.start(worker_count, shutdown_rx).await })
    };

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);

            // The pump closes the handoff channel and joins every worker
            // before returning, so this await is the drain.
            match (&mut pump).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Consumer stopped with error"),
                Err(e) => error!(error = %e, "Consumer task panicked"),
            }
        }

        // The pump only returns on its own for a fatal startup error
        // (e.g. subscribe failure); that terminates the process.
        result = &mut pump => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(error = %e, "Failed to start consumer");
                    return Err(e.into());
                }
                Err(e) => {
                    error!(error = %e, "Consumer task panicked");
                    return Err(e.into());
                }
            }
        }
    }

    consumer.stop().await?;
    info!("Shutdown complete");
    Ok(())
}
