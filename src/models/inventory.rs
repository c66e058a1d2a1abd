// src/models/inventory.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::status::EntityStatus;

// --- Categorias ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "Bebidas")]
    pub name: String,
    pub description: Option<String>,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Produtos ---
// O estoque só muda via compras/vendas depois da criação.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Refrigerante Lata 350ml")]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    #[schema(example = "5.50")]
    pub price: Decimal,
    #[schema(example = "L2024-08")]
    pub batch_number: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "2024-08-01")]
    pub batch_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date, example = "2025-08-01")]
    pub expiration_date: Option<NaiveDate>,
    #[schema(example = 42)]
    pub stock: i32,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Vencido = data de validade estritamente anterior a `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date.is_some_and(|date| date < today)
    }
}

// Linha do relatório de estoque
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductReportRow {
    pub name: String,
    pub category_name: String,
    pub price: Decimal,
    pub stock: i32,
    pub expiration_date: Option<NaiveDate>,
    pub status: EntityStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(expiration: Option<NaiveDate>) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Iogurte".into(),
            description: None,
            category_id: Uuid::new_v4(),
            price: Decimal::new(450, 2),
            batch_number: None,
            batch_date: None,
            expiration_date: expiration,
            stock: 10,
            status: EntityStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn expiration_is_exclusive_of_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(!product(None).is_expired(today));
        assert!(!product(Some(today)).is_expired(today));
        assert!(product(today.pred_opt()).is_expired(today));
    }
}
