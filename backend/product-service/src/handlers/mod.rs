pub mod products;

use actix_web::web;

use crate::metrics::serve_metrics;

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/products", web::get().to(products::list_products))
        .route("/products", web::post().to(products::create_product))
        .route("/products/{id}", web::delete().to(products::delete_product))
        .route("/metrics", web::get().to(serve_metrics))
        .route("/health", web::get().to(products::health));
}
