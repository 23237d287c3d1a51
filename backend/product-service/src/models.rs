use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Product row as stored in Postgres and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Price is stored in cents.
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Snapshot embedded into outbound product events.
    pub fn to_event_snapshot(&self) -> event_schema::Product {
        event_schema::Product {
            id: self.id.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductDTO {
    #[validate(length(min = 3, max = 50))]
    pub name: String,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1))]
    pub price: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListProductsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListProductsQuery {
    /// Clamp to page >= 1 and 1 <= limit <= 100 (default 20).
    pub fn normalize(self) -> (i64, i64) {
        let page = self.page.filter(|&p| p >= 1).unwrap_or(1);
        let limit = match self.limit {
            Some(l) if l >= 1 => l.min(100),
            _ => 20,
        };
        (page, limit)
    }
}

/// Total page count for a paginated listing.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total == 0 || page_size == 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}
