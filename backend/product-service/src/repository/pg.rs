use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{CreateProductDTO, Product};
use crate::repository::ProductsRepository;

pub struct PgProductsRepository {
    pool: PgPool,
}

impl PgProductsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductsRepository for PgProductsRepository {
    async fn create(&self, dto: &CreateProductDTO) -> Result<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, price, created_at
            "#,
        )
        .bind(&dto.name)
        .bind(&dto.description)
        .bind(dto.price)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn delete(&self, id: Uuid) -> Result<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            DELETE FROM products
            WHERE id = $1
            RETURNING id, name, description, price, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    async fn list(&self, page: i64, limit: i64) -> Result<Vec<Product>> {
        let offset = (page - 1) * limit;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, created_at
            FROM products
            ORDER BY created_at
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
