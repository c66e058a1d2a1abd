// src/services/branch_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    db::{branch_repo::BranchData, BranchRepository},
    models::{branch::Branch, status::EntityStatus},
};

#[derive(Clone)]
pub struct BranchService {
    repo: BranchRepository,
    pool: PgPool,
}

impl BranchService {
    pub fn new(repo: BranchRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(&self, status: Option<EntityStatus>) -> Result<Vec<Branch>, AppError> {
        self.repo.list(status).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Branch, AppError> {
        self.repo
            .find(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Branch))
    }

    pub async fn create(&self, data: &BranchData) -> Result<Branch, AppError> {
        self.repo.create(&self.pool, data).await
    }

    pub async fn update(&self, id: Uuid, data: &BranchData) -> Result<Branch, AppError> {
        self.repo
            .update(&self.pool, id, data)
            .await?
            .ok_or(AppError::NotFound(Resource::Branch))
    }

    pub async fn set_status(&self, id: Uuid, status: EntityStatus) -> Result<Branch, AppError> {
        self.repo
            .set_status(&self.pool, id, status)
            .await?
            .ok_or(AppError::NotFound(Resource::Branch))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let branch = self
            .repo
            .find(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Branch))?;
        branch.status.ensure_deletable(Resource::Branch)?;
        if self.repo.count_users(&mut *tx, id).await? > 0 {
            return Err(AppError::InUse(Resource::Branch));
        }
        self.repo.delete(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(branch_id = %id, "filial excluída");
        Ok(())
    }
}
