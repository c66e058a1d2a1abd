// src/services/inventory_service.rs

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    db::{inventory_repo::ProductData, InventoryRepository},
    models::{
        inventory::{Category, Product},
        status::EntityStatus,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self {
            inventory_repo,
            pool,
        }
    }

    // =========================================================================
    //  CATEGORIAS
    // =========================================================================

    pub async fn list_categories(
        &self,
        status: Option<EntityStatus>,
    ) -> Result<Vec<Category>, AppError> {
        self.inventory_repo.list_categories(status).await
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category, AppError> {
        self.inventory_repo
            .find_category(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Category))
    }

    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError> {
        self.inventory_repo
            .create_category(&self.pool, name, description)
            .await
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError> {
        self.inventory_repo
            .update_category(&self.pool, id, name, description)
            .await?
            .ok_or(AppError::NotFound(Resource::Category))
    }

    pub async fn set_category_status(
        &self,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Category, AppError> {
        self.inventory_repo
            .set_category_status(&self.pool, id, status)
            .await?
            .ok_or(AppError::NotFound(Resource::Category))
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let category = self
            .inventory_repo
            .find_category(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Category))?;
        category.status.ensure_deletable(Resource::Category)?;
        if self
            .inventory_repo
            .count_products_in_category(&mut *tx, id)
            .await?
            > 0
        {
            return Err(AppError::InUse(Resource::Category));
        }
        self.inventory_repo.delete_category(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(category_id = %id, "categoria excluída");
        Ok(())
    }

    // =========================================================================
    //  PRODUTOS
    // =========================================================================

    pub async fn list_products(
        &self,
        status: Option<EntityStatus>,
    ) -> Result<Vec<Product>, AppError> {
        self.inventory_repo.list_products(status).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.inventory_repo
            .find_product(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Product))
    }

    /// O estoque inicial só é aceito aqui; depois disso só compras e vendas o alteram.
    pub async fn create_product(
        &self,
        data: &ProductData,
        initial_stock: i32,
    ) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;
        self.ensure_active_category(&mut tx, data.category_id).await?;
        let product = self
            .inventory_repo
            .create_product(&mut *tx, data, initial_stock)
            .await?;
        tx.commit().await?;

        tracing::info!(product_id = %product.id, stock = product.stock, "produto cadastrado");
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, data: &ProductData) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .inventory_repo
            .find_product(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Product))?;
        // trocar de categoria exige uma categoria ativa
        if current.category_id != data.category_id {
            self.ensure_active_category(&mut tx, data.category_id).await?;
        }
        let product = self
            .inventory_repo
            .update_product(&mut *tx, id, data)
            .await?
            .ok_or(AppError::NotFound(Resource::Product))?;
        tx.commit().await?;
        Ok(product)
    }

    pub async fn set_product_status(
        &self,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Product, AppError> {
        self.inventory_repo
            .set_product_status(&self.pool, id, status)
            .await?
            .ok_or(AppError::NotFound(Resource::Product))
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let product = self
            .inventory_repo
            .find_product(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Product))?;
        product.status.ensure_deletable(Resource::Product)?;
        if self
            .inventory_repo
            .count_product_references(&mut *tx, id)
            .await?
            > 0
        {
            return Err(AppError::InUse(Resource::Product));
        }
        self.inventory_repo.delete_product(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(product_id = %id, "produto excluído");
        Ok(())
    }

    async fn ensure_active_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category_id: Uuid,
    ) -> Result<(), AppError> {
        let category = self
            .inventory_repo
            .find_category(&mut **tx, category_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Category))?;
        if !category.status.is_active() {
            return Err(AppError::Inactive {
                resource: Resource::Category,
                name: category.name,
            });
        }
        Ok(())
    }
}
