//! HTTP API tests for product-service
//!
//! Runs the actix app against stub repository and broker doubles, so the
//! full request path (validation, service, metrics, response shape) is
//! exercised without Postgres or Kafka.

use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::Utc;
use event_schema::{ProductEvent, ProductEventType};
use product_service::error::{AppError, Result};
use product_service::handlers::register_routes;
use product_service::metrics::ProductMetrics;
use product_service::models::{CreateProductDTO, Product};
use product_service::repository::ProductsRepository;
use product_service::services::{MessageBroker, ProductsService};
use prometheus::Registry;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

struct StubRepository {
    product: Product,
    missing: bool,
}

#[async_trait]
impl ProductsRepository for StubRepository {
    async fn create(&self, dto: &CreateProductDTO) -> Result<Product> {
        let mut product = self.product.clone();
        product.name = dto.name.clone();
        product.description = dto.description.clone();
        product.price = dto.price;
        Ok(product)
    }

    async fn delete(&self, id: Uuid) -> Result<Product> {
        if self.missing {
            return Err(AppError::NotFound(id.to_string()));
        }
        Ok(self.product.clone())
    }

    async fn list(&self, _page: i64, _limit: i64) -> Result<Vec<Product>> {
        Ok(vec![self.product.clone()])
    }

    async fn count(&self) -> Result<i64> {
        Ok(41)
    }
}

#[derive(Default)]
struct RecordingBroker {
    sent: Mutex<Vec<(Vec<u8>, Vec<u8>)>>,
}

#[async_trait]
impl MessageBroker for RecordingBroker {
    async fn send(&self, _topic: &str, payload: &[u8], key: &[u8]) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((key.to_vec(), payload.to_vec()));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn widget() -> Product {
    Product {
        id: Uuid::new_v4(),
        name: "Widget".to_string(),
        description: String::new(),
        price: 500,
        created_at: Utc::now(),
    }
}

struct TestApp {
    service: Arc<ProductsService>,
    broker: Arc<RecordingBroker>,
    registry: Registry,
}

fn compose(missing: bool) -> TestApp {
    let registry = Registry::new();
    let metrics = Arc::new(ProductMetrics::new(&registry).unwrap());
    let broker = Arc::new(RecordingBroker::default());
    let service = Arc::new(ProductsService::new(
        Arc::new(StubRepository {
            product: widget(),
            missing,
        }),
        Arc::clone(&broker) as Arc<dyn MessageBroker>,
        metrics,
    ));
    TestApp {
        service,
        broker,
        registry,
    }
}

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::clone(&$ctx.service)))
                .app_data(web::Data::new($ctx.registry.clone()))
                .configure(register_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn create_product_returns_201_and_publishes() {
    let ctx = compose(false);
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/products")
        .set_json(serde_json::json!({
            "name": "Widget",
            "description": "A widget",
            "price": 500
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Widget");
    assert_eq!(body["data"]["price"], 500);

    let sent = ctx.broker.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let event = ProductEvent::from_bytes(&sent[0].1).unwrap();
    assert_eq!(event.event_type, ProductEventType::ProductCreated);
}

#[actix_web::test]
async fn invalid_create_body_is_400_and_publishes_nothing() {
    let ctx = compose(false);
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/products")
        .set_json(serde_json::json!({ "name": "ab", "price": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(ctx.broker.sent.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn delete_missing_product_is_404() {
    let ctx = compose(true);
    let app = init_app!(ctx);

    let req = test::TestRequest::delete()
        .uri(&format!("/products/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn list_reports_pagination_metadata() {
    let ctx = compose(false);
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/products?page=2&limit=20")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 41);
    assert_eq!(body["page"], 2);
    assert_eq!(body["size"], 20);
    assert_eq!(body["pages"], 3);
}

#[actix_web::test]
async fn metrics_endpoint_reports_mutation_counters() {
    let ctx = compose(false);
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/products")
        .set_json(serde_json::json!({ "name": "Widget", "price": 500 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("products_created_total 1"));
}
