// src/services/operation_service.rs

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    db::{CrmRepository, InventoryRepository, OperationsRepository},
    models::{
        crm::Customer,
        inventory::Product,
        operations::{
            lines_total, CreatePurchasePayload, CreateSalePayload, PricedLine, Purchase,
            PurchaseDetail, PurchaseLinePayload, Sale, SaleDetail, SaleLinePayload,
        },
        status::{EntityStatus, SaleStatus},
    },
    services::stock_ledger::{
        check_purchase_transition, check_sale_transition, plan_transition, LineQuantity,
        StockBearing, StockEffect, StockLedger,
    },
};

#[derive(Clone)]
pub struct OperationService {
    repo: OperationsRepository,
    inventory_repo: InventoryRepository,
    crm_repo: CrmRepository,
    pool: PgPool,
}

impl OperationService {
    pub fn new(
        repo: OperationsRepository,
        inventory_repo: InventoryRepository,
        crm_repo: CrmRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            inventory_repo,
            crm_repo,
            pool,
        }
    }

    // =========================================================================
    //  COMPRAS
    // =========================================================================

    pub async fn list_purchases(
        &self,
        status: Option<EntityStatus>,
    ) -> Result<Vec<Purchase>, AppError> {
        self.repo.list_purchases(status).await
    }

    pub async fn get_purchase(&self, id: Uuid) -> Result<PurchaseDetail, AppError> {
        let mut conn = self.pool.acquire().await?;
        let purchase = self
            .repo
            .find_purchase(&mut *conn, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Purchase))?;
        self.purchase_detail(&mut conn, purchase).await
    }

    pub async fn create_purchase(
        &self,
        payload: &CreatePurchasePayload,
    ) -> Result<PurchaseDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let provider = self
            .crm_repo
            .find_provider(&mut *tx, payload.provider_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Provider))?;
        if !provider.status.is_active() {
            return Err(AppError::Inactive {
                resource: Resource::Provider,
                name: provider.name,
            });
        }

        // 1. Trava os produtos e monta as linhas
        let products = self
            .lock_products(&mut tx, payload.items.iter().map(|i| i.product_id))
            .await?;
        let lines = price_purchase_lines(&products, &payload.items)?;
        let status = payload.status.unwrap_or(EntityStatus::Active);

        // 2. Grava cabeçalho + itens
        let purchase = self
            .repo
            .insert_purchase(
                &mut *tx,
                provider.id,
                lines_total(&lines)?,
                status,
                payload.purchase_date,
                payload.notes.as_deref(),
            )
            .await?;
        self.repo
            .insert_purchase_items(&mut *tx, purchase.id, &lines)
            .await?;

        // 3. Compra ativa entra no estoque
        let quantities = line_quantities(&lines);
        self.apply_stock(
            &mut tx,
            &products,
            &quantities,
            StockEffect::Neutral,
            status.stock_effect(),
        )
        .await?;

        let detail = self.purchase_detail(&mut tx, purchase).await?;
        tx.commit().await?;

        tracing::info!(
            purchase_id = %detail.header.id,
            status = %detail.header.status,
            items = detail.items.len(),
            "compra registrada"
        );
        Ok(detail)
    }

    pub async fn update_purchase_status(
        &self,
        id: Uuid,
        new_status: EntityStatus,
    ) -> Result<PurchaseDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let purchase = self
            .repo
            .lock_purchase(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Purchase))?;
        check_purchase_transition(purchase.status, new_status)?;

        let items = self.repo.list_purchase_items(&mut *tx, id).await?;
        let quantities: Vec<LineQuantity> = items
            .iter()
            .map(|i| LineQuantity {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect();
        let products = self
            .lock_products(&mut tx, quantities.iter().map(|q| q.product_id))
            .await?;
        self.apply_stock(
            &mut tx,
            &products,
            &quantities,
            purchase.status.stock_effect(),
            new_status.stock_effect(),
        )
        .await?;

        let updated = self.repo.set_purchase_status(&mut *tx, id, new_status).await?;
        let detail = self.purchase_detail(&mut tx, updated).await?;
        tx.commit().await?;

        tracing::info!(
            purchase_id = %id,
            from = %purchase.status,
            to = %new_status,
            "status da compra alterado"
        );
        Ok(detail)
    }

    /// Só compras inativas (que não contam no estoque) podem ser excluídas.
    pub async fn delete_purchase(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let purchase = self
            .repo
            .lock_purchase(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Purchase))?;
        purchase.status.ensure_deletable(Resource::Purchase)?;
        self.repo.delete_purchase(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(purchase_id = %id, "compra excluída");
        Ok(())
    }

    // =========================================================================
    //  VENDAS
    // =========================================================================

    pub async fn list_sales(&self, status: Option<SaleStatus>) -> Result<Vec<Sale>, AppError> {
        self.repo.list_sales(status).await
    }

    pub async fn get_sale(&self, id: Uuid) -> Result<SaleDetail, AppError> {
        let mut conn = self.pool.acquire().await?;
        let sale = self
            .repo
            .find_sale(&mut *conn, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Sale))?;
        self.sale_detail(&mut conn, sale).await
    }

    pub async fn create_sale(&self, payload: &CreateSalePayload) -> Result<SaleDetail, AppError> {
        let status = payload.status.unwrap_or(SaleStatus::Processing);
        if !status.is_valid_initial() {
            return Err(AppError::InvalidInitialStatus(status.to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let customer = self.resolve_customer(&mut tx, payload.customer_id).await?;
        if !customer.status.is_active() {
            return Err(AppError::Inactive {
                resource: Resource::Customer,
                name: customer.name,
            });
        }

        let products = self
            .lock_products(&mut tx, payload.items.iter().map(|i| i.product_id))
            .await?;
        let today = Utc::now().date_naive();
        let lines = price_sale_lines(&products, &payload.items, today)?;
        let quantities = line_quantities(&lines);

        let new_levels = sale_stock_levels(&products, &quantities, status)?;

        let sale = self
            .repo
            .insert_sale(
                &mut *tx,
                customer.id,
                lines_total(&lines)?,
                status,
                payload.notes.as_deref(),
            )
            .await?;
        self.repo.insert_sale_items(&mut *tx, sale.id, &lines).await?;

        for (product_id, stock) in new_levels {
            self.inventory_repo.set_stock(&mut *tx, product_id, stock).await?;
        }

        let detail = self.sale_detail(&mut tx, sale).await?;
        tx.commit().await?;

        tracing::info!(
            sale_id = %detail.header.id,
            status = %detail.header.status,
            total = %detail.header.total,
            "venda registrada"
        );
        Ok(detail)
    }

    pub async fn update_sale_status(
        &self,
        id: Uuid,
        new_status: SaleStatus,
    ) -> Result<SaleDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let sale = self
            .repo
            .lock_sale(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Sale))?;
        check_sale_transition(sale.status, new_status)?;

        let items = self.repo.list_sale_items(&mut *tx, id).await?;
        let quantities: Vec<LineQuantity> = items
            .iter()
            .map(|i| LineQuantity {
                product_id: i.product_id,
                quantity: i.quantity,
            })
            .collect();
        let products = self
            .lock_products(&mut tx, quantities.iter().map(|q| q.product_id))
            .await?;
        self.apply_stock(
            &mut tx,
            &products,
            &quantities,
            sale.status.stock_effect(),
            new_status.stock_effect(),
        )
        .await?;

        let updated = self.repo.set_sale_status(&mut *tx, id, new_status).await?;
        let detail = self.sale_detail(&mut tx, updated).await?;
        tx.commit().await?;

        tracing::info!(
            sale_id = %id,
            from = %sale.status,
            to = %new_status,
            "status da venda alterado"
        );
        Ok(detail)
    }

    pub async fn delete_sale(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let sale = self
            .repo
            .lock_sale(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Sale))?;
        if !sale.status.is_deletable() {
            return Err(AppError::SaleNotDeletable(sale.status.to_string()));
        }
        self.repo.delete_sale(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(sale_id = %id, "venda excluída");
        Ok(())
    }

    // =========================================================================
    //  AUXILIARES
    // =========================================================================

    async fn resolve_customer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer_id: Option<Uuid>,
    ) -> Result<Customer, AppError> {
        match customer_id {
            Some(id) => self
                .crm_repo
                .find_customer(&mut **tx, id)
                .await?
                .ok_or(AppError::NotFound(Resource::Customer)),
            None => {
                self.crm_repo.insert_default_customer(&mut **tx).await?;
                self.crm_repo
                    .find_default_customer(&mut **tx)
                    .await?
                    .ok_or(AppError::NotFound(Resource::Customer))
            }
        }
    }

    async fn lock_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: impl Iterator<Item = Uuid>,
    ) -> Result<HashMap<Uuid, Product>, AppError> {
        let mut ids: Vec<Uuid> = ids.collect();
        ids.sort();
        ids.dedup();
        let products = self.inventory_repo.lock_products(&mut **tx, &ids).await?;
        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Planeja, confere e grava os novos saldos (tudo dentro da transação).
    async fn apply_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &HashMap<Uuid, Product>,
        quantities: &[LineQuantity],
        from: StockEffect,
        to: StockEffect,
    ) -> Result<(), AppError> {
        let plan = plan_transition(quantities, from, to);
        if plan.is_empty() {
            return Ok(());
        }
        let mut ledger = ledger_for(products);
        let new_levels = ledger.apply(&plan)?;
        for (product_id, stock) in new_levels {
            self.inventory_repo.set_stock(&mut **tx, product_id, stock).await?;
            tracing::debug!(product_id = %product_id, stock, "estoque atualizado");
        }
        Ok(())
    }

    async fn purchase_detail(
        &self,
        conn: &mut sqlx::PgConnection,
        purchase: Purchase,
    ) -> Result<PurchaseDetail, AppError> {
        let provider = self
            .crm_repo
            .find_provider(&mut *conn, purchase.provider_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Provider))?;
        let items = self.repo.list_purchase_items(&mut *conn, purchase.id).await?;
        Ok(PurchaseDetail {
            header: purchase,
            provider_name: provider.name,
            items,
        })
    }

    async fn sale_detail(
        &self,
        conn: &mut sqlx::PgConnection,
        sale: Sale,
    ) -> Result<SaleDetail, AppError> {
        let customer = self
            .crm_repo
            .find_customer(&mut *conn, sale.customer_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Customer))?;
        let items = self.repo.list_sale_items(&mut *conn, sale.id).await?;
        Ok(SaleDetail {
            header: sale,
            customer_name: customer.name,
            items,
        })
    }
}

fn ledger_for(products: &HashMap<Uuid, Product>) -> StockLedger {
    let mut ledger = StockLedger::new();
    for product in products.values() {
        ledger.track(product.id, product.name.clone(), product.stock);
    }
    ledger
}

/// Confere a disponibilidade da venda nova (mesmo pendente) e devolve os
/// saldos a gravar, vazio quando o status inicial não baixa estoque.
fn sale_stock_levels(
    products: &HashMap<Uuid, Product>,
    quantities: &[LineQuantity],
    status: SaleStatus,
) -> Result<Vec<(Uuid, i32)>, AppError> {
    let mut ledger = ledger_for(products);
    let plan = plan_transition(quantities, StockEffect::Neutral, StockEffect::Decrease);
    let new_levels = ledger.apply(&plan)?;
    if status.stock_effect() == StockEffect::Decrease {
        Ok(new_levels)
    } else {
        Ok(Vec::new())
    }
}

fn line_quantities(lines: &[PricedLine]) -> Vec<LineQuantity> {
    lines
        .iter()
        .map(|l| LineQuantity {
            product_id: l.product_id,
            quantity: l.quantity,
        })
        .collect()
}

fn active_product(
    products: &HashMap<Uuid, Product>,
    product_id: Uuid,
) -> Result<&Product, AppError> {
    let product = products
        .get(&product_id)
        .ok_or(AppError::NotFound(Resource::Product))?;
    if !product.status.is_active() {
        return Err(AppError::Inactive {
            resource: Resource::Product,
            name: product.name.clone(),
        });
    }
    Ok(product)
}

/// Confere os produtos de cada linha de compra e calcula os totais.
fn price_purchase_lines(
    products: &HashMap<Uuid, Product>,
    items: &[PurchaseLinePayload],
) -> Result<Vec<PricedLine>, AppError> {
    items
        .iter()
        .map(|item| {
            let product = active_product(products, item.product_id)?;
            PricedLine::new(product.id, item.quantity, item.unit_price)
        })
        .collect()
}

/// Linhas de venda: produto ativo e dentro da validade; preço padrão = preço do produto.
fn price_sale_lines(
    products: &HashMap<Uuid, Product>,
    items: &[SaleLinePayload],
    today: NaiveDate,
) -> Result<Vec<PricedLine>, AppError> {
    items
        .iter()
        .map(|item| {
            let product = active_product(products, item.product_id)?;
            if product.is_expired(today) {
                return Err(AppError::ProductExpired(product.name.clone()));
            }
            let unit_price = item.unit_price.unwrap_or(product.price);
            PricedLine::new(product.id, item.quantity, unit_price)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product(
        name: &str,
        stock: i32,
        status: EntityStatus,
        expiration: Option<NaiveDate>,
    ) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            category_id: Uuid::new_v4(),
            price: Decimal::new(1000, 2),
            batch_number: None,
            batch_date: None,
            expiration_date: expiration,
            stock,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalogue(items: Vec<Product>) -> HashMap<Uuid, Product> {
        items.into_iter().map(|p| (p.id, p)).collect()
    }

    fn sale_line(product_id: Uuid, quantity: i32, unit_price: Option<Decimal>) -> SaleLinePayload {
        SaleLinePayload {
            product_id,
            quantity,
            unit_price,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn sale_lines_default_to_product_price() {
        let p = product("Café 500g", 10, EntityStatus::Active, None);
        let id = p.id;
        let products = catalogue(vec![p]);

        let lines = price_sale_lines(
            &products,
            &[sale_line(id, 3, None), sale_line(id, 1, Some(Decimal::new(800, 2)))],
            today(),
        )
        .unwrap();

        assert_eq!(lines[0].unit_price, Decimal::new(1000, 2));
        assert_eq!(lines[0].line_total, Decimal::new(3000, 2));
        assert_eq!(lines[1].line_total, Decimal::new(800, 2));
        assert_eq!(lines_total(&lines).unwrap(), Decimal::new(3800, 2));
    }

    #[test]
    fn sale_lines_reject_expired_inactive_and_unknown_products() {
        let expired = product("Leite", 10, EntityStatus::Active, today().pred_opt());
        let inactive = product("Pão", 10, EntityStatus::Inactive, None);
        let (expired_id, inactive_id) = (expired.id, inactive.id);
        let products = catalogue(vec![expired, inactive]);

        assert!(matches!(
            price_sale_lines(&products, &[sale_line(expired_id, 1, None)], today()),
            Err(AppError::ProductExpired(name)) if name == "Leite"
        ));
        assert!(matches!(
            price_sale_lines(&products, &[sale_line(inactive_id, 1, None)], today()),
            Err(AppError::Inactive { resource: Resource::Product, .. })
        ));
        assert!(matches!(
            price_sale_lines(&products, &[sale_line(Uuid::new_v4(), 1, None)], today()),
            Err(AppError::NotFound(Resource::Product))
        ));
    }

    #[test]
    fn product_expiring_today_can_still_be_sold() {
        let p = product("Iogurte", 5, EntityStatus::Active, Some(today()));
        let id = p.id;
        let products = catalogue(vec![p]);
        assert!(price_sale_lines(&products, &[sale_line(id, 1, None)], today()).is_ok());
    }

    #[test]
    fn sale_availability_uses_aggregated_quantity() {
        // duas linhas do mesmo produto: 3 + 3 > 5
        let p = product("Arroz 5kg", 5, EntityStatus::Active, None);
        let id = p.id;
        let products = catalogue(vec![p]);
        let lines =
            price_sale_lines(&products, &[sale_line(id, 3, None), sale_line(id, 3, None)], today())
                .unwrap();

        let mut ledger = ledger_for(&products);
        let plan = plan_transition(
            &line_quantities(&lines),
            StockEffect::Neutral,
            StockEffect::Decrease,
        );
        match ledger.apply(&plan) {
            Err(AppError::InsufficientStock { available, requested, .. }) => {
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("esperava InsufficientStock, veio {:?}", other),
        }
        assert_eq!(ledger.stock_of(id), Some(5));
    }

    fn quantities(product_id: Uuid, quantity: i32) -> Vec<LineQuantity> {
        vec![LineQuantity {
            product_id,
            quantity,
        }]
    }

    #[test]
    fn pending_sale_checks_stock_but_writes_nothing() {
        let p = product("Açúcar 1kg", 4, EntityStatus::Active, None);
        let id = p.id;
        let products = catalogue(vec![p]);

        let levels = sale_stock_levels(&products, &quantities(id, 3), SaleStatus::Pending).unwrap();
        assert!(levels.is_empty());

        // pendente também falha sem saldo
        assert!(matches!(
            sale_stock_levels(&products, &quantities(id, 5), SaleStatus::Pending),
            Err(AppError::InsufficientStock { available: 4, requested: 5, .. })
        ));
    }

    #[test]
    fn processing_and_completed_sales_write_the_new_stock() {
        let p = product("Óleo 900ml", 4, EntityStatus::Active, None);
        let id = p.id;
        let products = catalogue(vec![p]);

        for status in [SaleStatus::Processing, SaleStatus::Completed] {
            let levels = sale_stock_levels(&products, &quantities(id, 3), status).unwrap();
            assert_eq!(levels, vec![(id, 1)]);
        }
    }

    #[test]
    fn only_inactive_purchases_can_be_deleted() {
        assert!(matches!(
            EntityStatus::Active.ensure_deletable(Resource::Purchase),
            Err(AppError::NotDeletable(Resource::Purchase))
        ));
        assert!(EntityStatus::Inactive.ensure_deletable(Resource::Purchase).is_ok());
    }

    #[test]
    fn purchase_lines_require_active_products() {
        let active = product("Feijão", 0, EntityStatus::Active, None);
        let inactive = product("Sal", 0, EntityStatus::Inactive, None);
        let (active_id, inactive_id) = (active.id, inactive.id);
        let products = catalogue(vec![active, inactive]);

        let lines = price_purchase_lines(
            &products,
            &[PurchaseLinePayload {
                product_id: active_id,
                quantity: 4,
                unit_price: Decimal::new(250, 2),
            }],
        )
        .unwrap();
        assert_eq!(lines[0].line_total, Decimal::new(1000, 2));

        let err = price_purchase_lines(
            &products,
            &[PurchaseLinePayload {
                product_id: inactive_id,
                quantity: 1,
                unit_price: Decimal::ONE,
            }],
        );
        assert!(matches!(err, Err(AppError::Inactive { .. })));
    }
}
