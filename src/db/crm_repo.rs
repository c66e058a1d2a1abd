// src/db/crm_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::map_constraint_error,
        error::{AppError, Resource},
    },
    models::{
        crm::{ContactData, Customer, Provider},
        status::EntityStatus,
    },
};

/// Nome gravado no cliente padrão (venda de balcão).
pub const DEFAULT_CUSTOMER_NAME: &str = "Consumidor Final";

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn list_customers(
        &self,
        status: Option<EntityStatus>,
    ) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE ($1::entity_status IS NULL OR status = $1)
            ORDER BY is_default DESC, name ASC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn find_customer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn find_default_customer<'e, E>(
        &self,
        executor: E,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE is_default LIMIT 1")
                .fetch_optional(executor)
                .await?;
        Ok(customer)
    }

    /// Insere o cliente padrão se ainda não existir.
    /// O índice parcial `uq_customers_single_default` garante no máximo um.
    pub async fn insert_default_customer<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO customers (name, is_default)
            VALUES ($1, TRUE)
            ON CONFLICT (is_default) WHERE is_default DO NOTHING
            "#,
        )
        .bind(DEFAULT_CUSTOMER_NAME)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Retira a marca de padrão de todos os clientes.
    pub async fn clear_default_customer<'e, E>(&self, executor: E) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE customers SET is_default = FALSE, updated_at = NOW() WHERE is_default",
        )
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        data: &ContactData,
        is_default: bool,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, document_number, email, phone, address, is_default)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.document_number)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(is_default)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Customer))
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        data: &ContactData,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, document_number = $3, email = $4, phone = $5, address = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.document_number)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Customer))
    }

    pub async fn set_customer_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            "UPDATE customers SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn count_customer_sales<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn delete_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| map_constraint_error(e, Resource::Customer))?;
        Ok(())
    }

    // =========================================================================
    //  FORNECEDORES
    // =========================================================================

    pub async fn list_providers(
        &self,
        status: Option<EntityStatus>,
    ) -> Result<Vec<Provider>, AppError> {
        let providers = sqlx::query_as::<_, Provider>(
            "SELECT * FROM providers WHERE ($1::entity_status IS NULL OR status = $1) ORDER BY name ASC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(providers)
    }

    pub async fn find_provider<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Provider>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let provider = sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(provider)
    }

    pub async fn create_provider<'e, E>(
        &self,
        executor: E,
        data: &ContactData,
    ) -> Result<Provider, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Provider>(
            r#"
            INSERT INTO providers (name, document_number, email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.document_number)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Provider))
    }

    pub async fn update_provider<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        data: &ContactData,
    ) -> Result<Option<Provider>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Provider>(
            r#"
            UPDATE providers
            SET name = $2, document_number = $3, email = $4, phone = $5, address = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.document_number)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Provider))
    }

    pub async fn set_provider_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Option<Provider>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let provider = sqlx::query_as::<_, Provider>(
            "UPDATE providers SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(provider)
    }

    pub async fn count_provider_purchases<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE provider_id = $1")
                .bind(provider_id)
                .fetch_one(executor)
                .await?;
        Ok(count)
    }

    pub async fn delete_provider<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM providers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| map_constraint_error(e, Resource::Provider))?;
        Ok(())
    }
}
