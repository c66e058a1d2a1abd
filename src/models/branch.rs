// src/models/branch.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::status::EntityStatus;

// Filial / ponto de venda
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: Uuid,
    #[schema(example = "Loja Centro")]
    pub name: String,
    #[schema(example = "Rua das Flores, 123")]
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
