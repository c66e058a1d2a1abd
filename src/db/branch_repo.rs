// src/db/branch_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::map_constraint_error,
        error::{AppError, Resource},
    },
    models::{branch::Branch, status::EntityStatus},
};

/// Campos editáveis de uma filial.
#[derive(Debug, Clone)]
pub struct BranchData {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct BranchRepository {
    pool: PgPool,
}

impl BranchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, status: Option<EntityStatus>) -> Result<Vec<Branch>, AppError> {
        let branches = sqlx::query_as::<_, Branch>(
            "SELECT * FROM branches WHERE ($1::entity_status IS NULL OR status = $1) ORDER BY name ASC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(branches)
    }

    pub async fn find<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Branch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let branch = sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(branch)
    }

    pub async fn create<'e, E>(&self, executor: E, data: &BranchData) -> Result<Branch, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Branch>(
            r#"
            INSERT INTO branches (name, address, phone, email)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.address)
        .bind(&data.phone)
        .bind(&data.email)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Branch))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        data: &BranchData,
    ) -> Result<Option<Branch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Branch>(
            r#"
            UPDATE branches
            SET name = $2, address = $3, phone = $4, email = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.address)
        .bind(&data.phone)
        .bind(&data.email)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Branch))
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Option<Branch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let branch = sqlx::query_as::<_, Branch>(
            "UPDATE branches SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(branch)
    }

    pub async fn count_users<'e, E>(&self, executor: E, branch_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE branch_id = $1")
            .bind(branch_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM branches WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| map_constraint_error(e, Resource::Branch))?;
        Ok(())
    }
}
