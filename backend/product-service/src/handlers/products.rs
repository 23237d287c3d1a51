/// Product handlers - HTTP endpoints for catalog mutations and listing
use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::{total_pages, CreateProductDTO, ListProductsQuery, Product};
use crate::services::ProductsService;

#[derive(Serialize)]
struct DataResponse<T: Serialize> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct ListResponse {
    success: bool,
    data: Vec<Product>,
    total: i64,
    page: i64,
    size: i64,
    pages: i64,
}

pub async fn create_product(
    service: web::Data<Arc<ProductsService>>,
    req: web::Json<CreateProductDTO>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let product = service.create(&req).await.map_err(|e| {
        error!(error = %e, "Error creating product");
        e
    })?;

    Ok(HttpResponse::Created().json(DataResponse {
        success: true,
        data: product,
    }))
}

pub async fn delete_product(
    service: web::Data<Arc<ProductsService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();

    let product = service.delete(id).await.map_err(|e| {
        if !matches!(e, AppError::NotFound(_)) {
            error!(error = %e, product_id = %id, "Error deleting product");
        }
        e
    })?;

    Ok(HttpResponse::Ok().json(DataResponse {
        success: true,
        data: product,
    }))
}

pub async fn list_products(
    service: web::Data<Arc<ProductsService>>,
    query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = query.into_inner().normalize();

    let (products, total) = service.list(page, limit).await.map_err(|e| {
        error!(error = %e, "Error listing products");
        e
    })?;

    Ok(HttpResponse::Ok().json(ListResponse {
        success: true,
        data: products,
        total,
        page,
        size: limit,
        pages: total_pages(total, limit),
    }))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
