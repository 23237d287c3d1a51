pub mod pg;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CreateProductDTO, Product};

pub use pg::PgProductsRepository;

/// Persistence boundary for product rows. A successful mutation always yields
/// the complete row, which the service layer embeds into the outbound event.
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    async fn create(&self, dto: &CreateProductDTO) -> Result<Product>;

    /// Deletes and returns the row; `NotFound` if no such product exists.
    async fn delete(&self, id: Uuid) -> Result<Product>;

    async fn list(&self, page: i64, limit: i64) -> Result<Vec<Product>>;

    async fn count(&self) -> Result<i64>;
}
