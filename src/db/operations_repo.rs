// src/db/operations_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        operations::{
            PricedLine, Purchase, PurchaseItem, PurchaseReportRow, Sale, SaleItem, SaleReportRow,
        },
        status::{EntityStatus, SaleStatus},
    },
};

/// Filtro comum dos relatórios de movimentação.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub party_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct OperationsRepository {
    pool: PgPool,
}

impl OperationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  COMPRAS
    // =========================================================================

    pub async fn list_purchases(
        &self,
        status: Option<EntityStatus>,
    ) -> Result<Vec<Purchase>, AppError> {
        let purchases = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT * FROM purchases
            WHERE ($1::entity_status IS NULL OR status = $1)
            ORDER BY purchase_date DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(purchases)
    }

    pub async fn find_purchase<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Purchase>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(purchase)
    }

    /// Mesma busca, mas trava o cabeçalho até o fim da transação.
    pub async fn lock_purchase<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Purchase>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase =
            sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(purchase)
    }

    pub async fn insert_purchase<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        total: Decimal,
        status: EntityStatus,
        purchase_date: Option<DateTime<Utc>>,
        notes: Option<&str>,
    ) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases (provider_id, total, status, purchase_date, notes)
            VALUES ($1, $2, $3, COALESCE($4, NOW()), $5)
            RETURNING *
            "#,
        )
        .bind(provider_id)
        .bind(total)
        .bind(status)
        .bind(purchase_date)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(purchase)
    }

    /// Grava as linhas na ordem recebida (`position` começa em 0).
    pub async fn insert_purchase_items<'e, E>(
        &self,
        executor: E,
        purchase_id: Uuid,
        lines: &[PricedLine],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (product_ids, quantities, unit_prices, line_totals) = unzip_lines(lines);
        sqlx::query(
            r#"
            INSERT INTO purchase_items (purchase_id, product_id, position, quantity, unit_price, line_total)
            SELECT $1, t.product_id, (t.ord - 1)::int, t.quantity, t.unit_price, t.line_total
            FROM UNNEST($2::uuid[], $3::int[], $4::numeric[], $5::numeric[])
                 WITH ORDINALITY AS t(product_id, quantity, unit_price, line_total, ord)
            "#,
        )
        .bind(purchase_id)
        .bind(&product_ids)
        .bind(&quantities)
        .bind(&unit_prices)
        .bind(&line_totals)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list_purchase_items<'e, E>(
        &self,
        executor: E,
        purchase_id: Uuid,
    ) -> Result<Vec<PurchaseItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, PurchaseItem>(
            r#"
            SELECT i.id, i.purchase_id, i.product_id, p.name AS product_name,
                   i.position, i.quantity, i.unit_price, i.line_total
            FROM purchase_items i
            JOIN products p ON p.id = i.product_id
            WHERE i.purchase_id = $1
            ORDER BY i.position
            "#,
        )
        .bind(purchase_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn set_purchase_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: EntityStatus,
    ) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = sqlx::query_as::<_, Purchase>(
            "UPDATE purchases SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(purchase)
    }

    // Linhas saem junto (ON DELETE CASCADE)
    pub async fn delete_purchase<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM purchases WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  VENDAS
    // =========================================================================

    pub async fn list_sales(&self, status: Option<SaleStatus>) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
            WHERE ($1::sale_status IS NULL OR status = $1)
            ORDER BY sale_date DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    pub async fn find_sale<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn lock_sale<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn insert_sale<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        total: Decimal,
        status: SaleStatus,
        notes: Option<&str>,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (customer_id, total, status, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(customer_id)
        .bind(total)
        .bind(status)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn insert_sale_items<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        lines: &[PricedLine],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (product_ids, quantities, unit_prices, line_totals) = unzip_lines(lines);
        sqlx::query(
            r#"
            INSERT INTO sale_items (sale_id, product_id, position, quantity, unit_price, line_total)
            SELECT $1, t.product_id, (t.ord - 1)::int, t.quantity, t.unit_price, t.line_total
            FROM UNNEST($2::uuid[], $3::int[], $4::numeric[], $5::numeric[])
                 WITH ORDINALITY AS t(product_id, quantity, unit_price, line_total, ord)
            "#,
        )
        .bind(sale_id)
        .bind(&product_ids)
        .bind(&quantities)
        .bind(&unit_prices)
        .bind(&line_totals)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list_sale_items<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
    ) -> Result<Vec<SaleItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT i.id, i.sale_id, i.product_id, p.name AS product_name,
                   i.position, i.quantity, i.unit_price, i.line_total
            FROM sale_items i
            JOIN products p ON p.id = i.product_id
            WHERE i.sale_id = $1
            ORDER BY i.position
            "#,
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn set_sale_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: SaleStatus,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            "UPDATE sales SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    pub async fn delete_sale<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  RELATÓRIOS
    // =========================================================================

    pub async fn sales_report(&self, filter: PeriodFilter) -> Result<Vec<SaleReportRow>, AppError> {
        let rows = sqlx::query_as::<_, SaleReportRow>(
            r#"
            SELECT s.sale_date, c.name AS customer_name, s.status,
                   (SELECT COUNT(*) FROM sale_items i WHERE i.sale_id = s.id) AS items_count,
                   s.total
            FROM sales s
            JOIN customers c ON c.id = s.customer_id
            WHERE ($1::timestamptz IS NULL OR s.sale_date >= $1)
              AND ($2::timestamptz IS NULL OR s.sale_date <= $2)
              AND ($3::uuid IS NULL OR s.customer_id = $3)
            ORDER BY s.sale_date
            "#,
        )
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.party_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn purchases_report(
        &self,
        filter: PeriodFilter,
    ) -> Result<Vec<PurchaseReportRow>, AppError> {
        let rows = sqlx::query_as::<_, PurchaseReportRow>(
            r#"
            SELECT pu.purchase_date, pr.name AS provider_name, pu.status,
                   (SELECT COUNT(*) FROM purchase_items i WHERE i.purchase_id = pu.id) AS items_count,
                   pu.total
            FROM purchases pu
            JOIN providers pr ON pr.id = pu.provider_id
            WHERE ($1::timestamptz IS NULL OR pu.purchase_date >= $1)
              AND ($2::timestamptz IS NULL OR pu.purchase_date <= $2)
              AND ($3::uuid IS NULL OR pu.provider_id = $3)
            ORDER BY pu.purchase_date
            "#,
        )
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.party_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// Colunas paralelas para o UNNEST
fn unzip_lines(lines: &[PricedLine]) -> (Vec<Uuid>, Vec<i32>, Vec<Decimal>, Vec<Decimal>) {
    let mut product_ids = Vec::with_capacity(lines.len());
    let mut quantities = Vec::with_capacity(lines.len());
    let mut unit_prices = Vec::with_capacity(lines.len());
    let mut line_totals = Vec::with_capacity(lines.len());
    for line in lines {
        product_ids.push(line.product_id);
        quantities.push(line.quantity);
        unit_prices.push(line.unit_price);
        line_totals.push(line.line_total);
    }
    (product_ids, quantities, unit_prices, line_totals)
}
