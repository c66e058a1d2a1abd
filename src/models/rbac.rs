// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::status::EntityStatus;

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "vendedor")]
    pub name: String,

    #[schema(example = "Acesso ao balcão de vendas")]
    pub description: Option<String>,

    #[schema(example = json!(["sales:read", "sales:write"]))]
    pub permissions: Vec<String>,

    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// O que a política de acesso precisa saber do cargo do usuário.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    pub name: String,
    pub permissions: Vec<String>,
    pub status: EntityStatus,
}

impl From<&Role> for RoleGrant {
    fn from(role: &Role) -> Self {
        Self {
            name: role.name.clone(),
            permissions: role.permissions.clone(),
            status: role.status,
        }
    }
}

/// Entrada do catálogo de permissões (registrada via `inventory`).
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PermissionEntry {
    #[schema(value_type = String, example = "products:read")]
    pub slug: &'static str,
    #[schema(value_type = String, example = "Visualizar produtos")]
    pub description: &'static str,
    #[schema(value_type = String, example = "PRODUCTS")]
    pub module: &'static str,
}

inventory::collect!(PermissionEntry);

impl PermissionEntry {
    pub const fn new(slug: &'static str, description: &'static str, module: &'static str) -> Self {
        Self { slug, description, module }
    }

    /// Catálogo completo, ordenado por módulo e slug.
    pub fn catalogue() -> Vec<PermissionEntry> {
        let mut entries: Vec<PermissionEntry> =
            inventory::iter::<PermissionEntry>.into_iter().copied().collect();
        entries.sort_by(|a, b| (a.module, a.slug).cmp(&(b.module, b.slug)));
        entries
    }

    pub fn is_known(slug: &str) -> bool {
        inventory::iter::<PermissionEntry>
            .into_iter()
            .any(|entry| entry.slug == slug)
    }
}
