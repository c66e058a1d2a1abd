// src/models/status.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::{AppError, Resource};

/// Ciclo de vida "soft" dos cadastros (e das compras).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "entity_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Active,
    Inactive,
}

impl EntityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityStatus::Active => "active",
            EntityStatus::Inactive => "inactive",
        }
    }

    pub fn is_active(self) -> bool {
        self == EntityStatus::Active
    }

    /// Regra comum dos cadastros: só se exclui o que já foi desativado.
    pub fn ensure_deletable(self, resource: Resource) -> Result<(), AppError> {
        if self.is_active() {
            return Err(AppError::NotDeletable(resource));
        }
        Ok(())
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status de uma venda. As transições permitidas ficam em `services::stock_ledger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sale_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Processing => "processing",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    pub fn label_pt(self) -> &'static str {
        match self {
            SaleStatus::Pending => "Pendente",
            SaleStatus::Processing => "Em processamento",
            SaleStatus::Completed => "Concluída",
            SaleStatus::Cancelled => "Cancelada",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Payload comum do PATCH /{id}/status dos cadastros
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusPayload {
    #[schema(example = "inactive")]
    pub status: EntityStatus,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Filtra por status (active / inactive)
    pub status: Option<EntityStatus>,
}
