// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::map_constraint_error,
        error::{AppError, Resource},
    },
    models::{rbac::Role, status::EntityStatus},
};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_roles(&self, status: Option<EntityStatus>) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE ($1::entity_status IS NULL OR status = $1) ORDER BY name ASC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    pub async fn find_role<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    pub async fn find_role_by_name<'e, E>(
        &self,
        executor: E,
        name: &str,
    ) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        permissions: &[String],
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description, permissions)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(permissions)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Role))
    }

    pub async fn update_role<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        permissions: &[String],
    ) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = $2, description = $3, permissions = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(permissions)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Role))
    }

    pub async fn set_role_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            "UPDATE roles SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(role)
    }

    pub async fn count_role_users<'e, E>(&self, executor: E, role_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role_id = $1")
            .bind(role_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn delete_role<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| map_constraint_error(e, Resource::Role))?;
        Ok(())
    }
}
