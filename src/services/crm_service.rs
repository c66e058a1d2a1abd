// src/services/crm_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    db::CrmRepository,
    models::{
        crm::{ContactData, Customer, Provider},
        status::EntityStatus,
    },
};

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
    pool: PgPool,
}

impl CrmService {
    pub fn new(repo: CrmRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    /// Cria o cliente padrão se ainda não existir e o devolve.
    pub async fn ensure_default_customer(&self) -> Result<Customer, AppError> {
        let mut tx = self.pool.begin().await?;
        self.repo.insert_default_customer(&mut *tx).await?;
        let customer = self
            .repo
            .find_default_customer(&mut *tx)
            .await?
            .ok_or(AppError::NotFound(Resource::Customer))?;
        tx.commit().await?;
        Ok(customer)
    }

    pub async fn list_customers(
        &self,
        status: Option<EntityStatus>,
    ) -> Result<Vec<Customer>, AppError> {
        // a lista sempre mostra o cliente padrão
        self.ensure_default_customer().await?;
        self.repo.list_customers(status).await
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        self.repo
            .find_customer(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Customer))
    }

    /// `is_default = true` transfere a marca de padrão para o novo cliente.
    pub async fn create_customer(
        &self,
        data: &ContactData,
        is_default: bool,
    ) -> Result<Customer, AppError> {
        let mut tx = self.pool.begin().await?;
        if is_default {
            let cleared = self.repo.clear_default_customer(&mut *tx).await?;
            tracing::info!(cleared, "cliente padrão substituído");
        }
        let customer = self.repo.create_customer(&mut *tx, data, is_default).await?;
        tx.commit().await?;
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        id: Uuid,
        data: &ContactData,
    ) -> Result<Customer, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .repo
            .find_customer(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Customer))?;
        ensure_not_default(&current)?;

        let customer = self
            .repo
            .update_customer(&mut *tx, id, data)
            .await?
            .ok_or(AppError::NotFound(Resource::Customer))?;
        tx.commit().await?;
        Ok(customer)
    }

    pub async fn set_customer_status(
        &self,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Customer, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .repo
            .find_customer(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Customer))?;
        // o padrão pode ser reativado, nunca desativado
        if status == EntityStatus::Inactive {
            ensure_not_default(&current)?;
        }

        let customer = self
            .repo
            .set_customer_status(&mut *tx, id, status)
            .await?
            .ok_or(AppError::NotFound(Resource::Customer))?;
        tx.commit().await?;
        Ok(customer)
    }

    pub async fn delete_customer(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .repo
            .find_customer(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Customer))?;
        ensure_not_default(&current)?;
        current.status.ensure_deletable(Resource::Customer)?;
        if self.repo.count_customer_sales(&mut *tx, id).await? > 0 {
            return Err(AppError::InUse(Resource::Customer));
        }
        self.repo.delete_customer(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(customer_id = %id, "cliente excluído");
        Ok(())
    }

    // =========================================================================
    //  FORNECEDORES
    // =========================================================================

    pub async fn list_providers(
        &self,
        status: Option<EntityStatus>,
    ) -> Result<Vec<Provider>, AppError> {
        self.repo.list_providers(status).await
    }

    pub async fn get_provider(&self, id: Uuid) -> Result<Provider, AppError> {
        self.repo
            .find_provider(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Provider))
    }

    pub async fn create_provider(&self, data: &ContactData) -> Result<Provider, AppError> {
        self.repo.create_provider(&self.pool, data).await
    }

    pub async fn update_provider(
        &self,
        id: Uuid,
        data: &ContactData,
    ) -> Result<Provider, AppError> {
        self.repo
            .update_provider(&self.pool, id, data)
            .await?
            .ok_or(AppError::NotFound(Resource::Provider))
    }

    pub async fn set_provider_status(
        &self,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Provider, AppError> {
        self.repo
            .set_provider_status(&self.pool, id, status)
            .await?
            .ok_or(AppError::NotFound(Resource::Provider))
    }

    pub async fn delete_provider(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .repo
            .find_provider(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Provider))?;
        current.status.ensure_deletable(Resource::Provider)?;
        if self.repo.count_provider_purchases(&mut *tx, id).await? > 0 {
            return Err(AppError::InUse(Resource::Provider));
        }
        self.repo.delete_provider(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(provider_id = %id, "fornecedor excluído");
        Ok(())
    }
}

fn ensure_not_default(customer: &Customer) -> Result<(), AppError> {
    if customer.is_default {
        return Err(AppError::DefaultCustomerProtected);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn customer(is_default: bool) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: "Consumidor Final".into(),
            document_number: None,
            email: None,
            phone: None,
            address: None,
            is_default,
            status: EntityStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn default_customer_is_protected() {
        assert!(matches!(
            ensure_not_default(&customer(true)),
            Err(AppError::DefaultCustomerProtected)
        ));
        assert!(ensure_not_default(&customer(false)).is_ok());
    }

    #[test]
    fn only_inactive_records_can_be_deleted() {
        assert!(matches!(
            EntityStatus::Active.ensure_deletable(Resource::Provider),
            Err(AppError::NotDeletable(Resource::Provider))
        ));
        assert!(EntityStatus::Inactive.ensure_deletable(Resource::Provider).is_ok());
    }
}
