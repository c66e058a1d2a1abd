// src/db/inventory_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::map_constraint_error,
        error::{AppError, Resource},
    },
    models::{
        inventory::{Category, Product, ProductReportRow},
        status::EntityStatus,
    },
};

/// Campos gravados de um produto (criação e edição).
#[derive(Debug, Clone)]
pub struct ProductData {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub price: Decimal,
    pub batch_number: Option<String>,
    pub batch_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CATEGORIAS
    // =========================================================================

    pub async fn list_categories(
        &self,
        status: Option<EntityStatus>,
    ) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE ($1::entity_status IS NULL OR status = $1) ORDER BY name ASC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn find_category<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(category)
    }

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Category))
    }

    pub async fn update_category<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Category))
    }

    pub async fn set_category_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(category)
    }

    pub async fn count_products_in_category<'e, E>(
        &self,
        executor: E,
        category_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn delete_category<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| map_constraint_error(e, Resource::Category))?;
        Ok(())
    }

    // =========================================================================
    //  PRODUTOS
    // =========================================================================

    pub async fn list_products(
        &self,
        status: Option<EntityStatus>,
    ) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE ($1::entity_status IS NULL OR status = $1) ORDER BY name ASC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Trava as linhas dos produtos até o fim da transação.
    /// Ordena por id para que duas transações travem na mesma ordem.
    pub async fn lock_products<'e, E>(
        &self,
        executor: E,
        ids: &[Uuid],
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        data: &ProductData,
        initial_stock: i32,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, description, category_id, price,
                batch_number, batch_date, expiration_date, stock
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.category_id)
        .bind(data.price)
        .bind(&data.batch_number)
        .bind(data.batch_date)
        .bind(data.expiration_date)
        .bind(initial_stock)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Product))
    }

    // Não toca no estoque
    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        data: &ProductData,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, description = $3, category_id = $4, price = $5,
                batch_number = $6, batch_date = $7, expiration_date = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.category_id)
        .bind(data.price)
        .bind(&data.batch_number)
        .bind(data.batch_date)
        .bind(data.expiration_date)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, Resource::Product))
    }

    pub async fn set_product_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Grava o saldo já calculado pelo `StockLedger`.
    pub async fn set_stock<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        stock: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(product_id)
            .bind(stock)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Quantas linhas de compra/venda apontam para o produto.
    pub async fn count_product_references<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM purchase_items WHERE product_id = $1)
              + (SELECT COUNT(*) FROM sale_items WHERE product_id = $1)
            "#,
        )
        .bind(product_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn delete_product<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| map_constraint_error(e, Resource::Product))?;
        Ok(())
    }

    pub async fn product_report(
        &self,
        category_id: Option<Uuid>,
    ) -> Result<Vec<ProductReportRow>, AppError> {
        let rows = sqlx::query_as::<_, ProductReportRow>(
            r#"
            SELECT p.name, c.name AS category_name, p.price, p.stock,
                   p.expiration_date, p.status
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE ($1::uuid IS NULL OR p.category_id = $1)
            ORDER BY c.name, p.name
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
