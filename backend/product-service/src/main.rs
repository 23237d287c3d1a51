use actix_web::{web, App, HttpServer};
use product_service::config::Config;
use product_service::handlers::register_routes;
use product_service::metrics::ProductMetrics;
use product_service::repository::{PgProductsRepository, ProductsRepository};
use product_service::services::{KafkaProducer, MessageBroker, ProductsService};
use prometheus::Registry;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
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

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();

    info!("Starting product service");

    let broker: Arc<dyn MessageBroker> = match KafkaProducer::new(&config.broker) {
        Ok(producer) => Arc::new(producer),
        Err(e) => {
            error!(error = %e, "Failed to initialize broker");
            return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
        }
    };

    let db_pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => {
            info!("Successfully connected to database");
            pool
        }
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
        }
    };

    let registry = Registry::new();
    let metrics = Arc::new(
        ProductMetrics::new(&registry)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?,
    );

    let repo: Arc<dyn ProductsRepository> = Arc::new(PgProductsRepository::new(db_pool));
    let service = Arc::new(ProductsService::new(
        repo,
        Arc::clone(&broker),
        Arc::clone(&metrics),
    ));

    let addr = format!("0.0.0.0:{}", config.http.port);
    info!(addr = %addr, "Starting HTTP server");

    let server = {
        let service = Arc::clone(&service);
        let registry = registry.clone();
        HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(Arc::clone(&service)))
                .app_data(web::Data::new(registry.clone()))
                .configure(register_routes)
        })
        // Signals are handled below so the broker closes after the server.
        .disable_signals()
        .bind(&addr)?
        .run()
    };

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    info!("Shutting down server...");

    // Finish in-flight requests first: mutations publish events, and the
    // broker flush below is what drains them.
    server_handle.stop(true).await;
    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "HTTP server exited with error"),
        Err(e) => error!(error = %e, "HTTP server task panicked"),
    }

    if let Err(e) = broker.close().await {
        error!(error = %e, "Failed to close broker");
    }

    info!("Server exited gracefully");
    Ok(())
}
