//! Reconciliação de estoque: como o status de uma compra/venda se traduz em
//! movimentação no `Product.stock`.
//!
//! Cada status tem um "efeito" sobre o estoque (soma, subtrai ou nada). Ao
//! mudar de status, o delta de cada produto é
//! `(sinal(novo) - sinal(antigo)) * quantidade`. O `StockLedger` aplica o
//! plano inteiro ou nada: se algum produto ficaria negativo, nenhum saldo muda.
//!
//! Transições de venda:
//!
//! ```text
//! pending ──► processing ──► completed
//!    │             │             │
//!    └─────────────┴─────────────┴──► cancelled (terminal)
//! ```

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    common::error::{AppError, Resource},
    models::status::{EntityStatus, SaleStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockEffect {
    Neutral,
    Increase,
    Decrease,
}

impl StockEffect {
    fn sign(self) -> i64 {
        match self {
            StockEffect::Neutral => 0,
            StockEffect::Increase => 1,
            StockEffect::Decrease => -1,
        }
    }
}

/// Um status que move estoque.
pub trait StockBearing {
    fn stock_effect(&self) -> StockEffect;
}

// Compra ativa soma; inativa não conta.
impl StockBearing for EntityStatus {
    fn stock_effect(&self) -> StockEffect {
        match self {
            EntityStatus::Active => StockEffect::Increase,
            EntityStatus::Inactive => StockEffect::Neutral,
        }
    }
}

impl StockBearing for SaleStatus {
    fn stock_effect(&self) -> StockEffect {
        match self {
            SaleStatus::Processing | SaleStatus::Completed => StockEffect::Decrease,
            SaleStatus::Pending | SaleStatus::Cancelled => StockEffect::Neutral,
        }
    }
}

impl SaleStatus {
    pub fn allowed_targets(self) -> &'static [SaleStatus] {
        match self {
            SaleStatus::Pending => &[SaleStatus::Processing, SaleStatus::Cancelled],
            SaleStatus::Processing => &[SaleStatus::Completed, SaleStatus::Cancelled],
            SaleStatus::Completed => &[SaleStatus::Cancelled],
            SaleStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: SaleStatus) -> bool {
        self.allowed_targets().contains(&next)
    }

    /// Status aceitos na criação da venda.
    pub fn is_valid_initial(self) -> bool {
        self != SaleStatus::Cancelled
    }

    pub fn is_deletable(self) -> bool {
        matches!(self, SaleStatus::Pending | SaleStatus::Cancelled)
    }
}

pub fn check_sale_transition(from: SaleStatus, to: SaleStatus) -> Result<(), AppError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidStatusTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

// Compras alternam entre active e inactive; repetir o status é rejeitado.
pub fn check_purchase_transition(from: EntityStatus, to: EntityStatus) -> Result<(), AppError> {
    if from != to {
        Ok(())
    } else {
        Err(AppError::InvalidStatusTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineQuantity {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_id: Uuid,
    pub delta: i64,
}

/// Deltas por produto (linhas repetidas do mesmo produto são somadas),
/// na ordem da primeira aparição. Deltas zero são descartados.
pub fn plan_transition(
    lines: &[LineQuantity],
    from: StockEffect,
    to: StockEffect,
) -> Vec<StockAdjustment> {
    let factor = to.sign() - from.sign();
    if factor == 0 {
        return Vec::new();
    }

    let mut plan: Vec<StockAdjustment> = Vec::new();
    for line in lines {
        let delta = factor * i64::from(line.quantity);
        match plan.iter_mut().find(|adj| adj.product_id == line.product_id) {
            Some(existing) => existing.delta += delta,
            None => plan.push(StockAdjustment {
                product_id: line.product_id,
                delta,
            }),
        }
    }
    plan.retain(|adj| adj.delta != 0);
    plan
}

#[derive(Debug, Clone)]
struct Level {
    name: String,
    stock: i64,
}

/// Saldo em memória dos produtos travados na transação.
#[derive(Debug, Clone, Default)]
pub struct StockLedger {
    levels: HashMap<Uuid, Level>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, product_id: Uuid, name: impl Into<String>, stock: i32) {
        self.levels.insert(
            product_id,
            Level {
                name: name.into(),
                stock: i64::from(stock),
            },
        );
    }

    #[cfg(test)]
    pub fn stock_of(&self, product_id: Uuid) -> Option<i64> {
        self.levels.get(&product_id).map(|level| level.stock)
    }

    /// Aplica o plano inteiro ou falha sem alterar nada.
    /// Devolve os novos saldos dos produtos afetados.
    pub fn apply(&mut self, plan: &[StockAdjustment]) -> Result<Vec<(Uuid, i32)>, AppError> {
        let mut staged: Vec<(Uuid, i64)> = Vec::with_capacity(plan.len());

        for adj in plan {
            let level = self
                .levels
                .get(&adj.product_id)
                .ok_or(AppError::NotFound(Resource::Product))?;

            let new_stock = level.stock + adj.delta;
            if new_stock < 0 {
                return Err(AppError::InsufficientStock {
                    product: level.name.clone(),
                    available: level.stock,
                    requested: -adj.delta,
                });
            }
            if new_stock > i64::from(i32::MAX) {
                return Err(AppError::InternalServerError(anyhow::anyhow!(
                    "estoque do produto {} excede o limite",
                    adj.product_id
                )));
            }
            staged.push((adj.product_id, new_stock));
        }

        let mut updated = Vec::with_capacity(staged.len());
        for (product_id, new_stock) in staged {
            if let Some(level) = self.levels.get_mut(&product_id) {
                level.stock = new_stock;
            }
            // cabe em i32: checado acima
            updated.push((product_id, new_stock as i32));
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, quantity: i32) -> LineQuantity {
        LineQuantity { product_id, quantity }
    }

    #[test]
    fn sale_transition_table() {
        use SaleStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Completed.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Processing));
        for target in [Pending, Processing, Completed, Cancelled] {
            assert!(!Cancelled.can_transition_to(target));
        }
    }

    #[test]
    fn rejected_transition_reports_both_states() {
        let err = check_sale_transition(SaleStatus::Cancelled, SaleStatus::Pending).unwrap_err();
        match err {
            AppError::InvalidStatusTransition { from, to } => {
                assert_eq!(from, "cancelled");
                assert_eq!(to, "pending");
            }
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[test]
    fn purchase_transition_requires_change() {
        assert!(check_purchase_transition(EntityStatus::Active, EntityStatus::Inactive).is_ok());
        assert!(check_purchase_transition(EntityStatus::Inactive, EntityStatus::Active).is_ok());
        assert!(check_purchase_transition(EntityStatus::Active, EntityStatus::Active).is_err());
    }

    #[test]
    fn deletable_sales() {
        assert!(SaleStatus::Pending.is_deletable());
        assert!(SaleStatus::Cancelled.is_deletable());
        assert!(!SaleStatus::Processing.is_deletable());
        assert!(!SaleStatus::Completed.is_deletable());
    }

    #[test]
    fn active_purchase_adds_exact_quantity() {
        let p1 = Uuid::new_v4();
        let mut ledger = StockLedger::new();
        ledger.track(p1, "Café 500g", 7);

        let plan = plan_transition(
            &[line(p1, 5)],
            StockEffect::Neutral,
            EntityStatus::Active.stock_effect(),
        );
        let updated = ledger.apply(&plan).unwrap();

        assert_eq!(updated, vec![(p1, 12)]);
        assert_eq!(ledger.stock_of(p1), Some(12));
    }

    #[test]
    fn oversell_fails_and_leaves_stock_untouched() {
        let p1 = Uuid::new_v4();
        let mut ledger = StockLedger::new();
        ledger.track(p1, "Arroz 5kg", 3);

        let plan = plan_transition(
            &[line(p1, 5)],
            StockEffect::Neutral,
            SaleStatus::Processing.stock_effect(),
        );
        match ledger.apply(&plan) {
            Err(AppError::InsufficientStock { product, available, requested }) => {
                assert_eq!(product, "Arroz 5kg");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("esperava estoque insuficiente, veio {:?}", other),
        }
        assert_eq!(ledger.stock_of(p1), Some(3));
    }

    #[test]
    fn failure_on_later_line_applies_nothing() {
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let mut ledger = StockLedger::new();
        ledger.track(p1, "Feijão", 10);
        ledger.track(p2, "Açúcar", 1);

        let plan = plan_transition(
            &[line(p1, 4), line(p2, 2)],
            StockEffect::Neutral,
            StockEffect::Decrease,
        );
        assert!(ledger.apply(&plan).is_err());
        assert_eq!(ledger.stock_of(p1), Some(10));
        assert_eq!(ledger.stock_of(p2), Some(1));
    }

    #[test]
    fn repeated_product_lines_are_checked_together() {
        let p1 = Uuid::new_v4();
        let mut ledger = StockLedger::new();
        ledger.track(p1, "Leite", 5);

        // 3 + 3 > 5 mesmo cada linha isolada cabendo
        let plan = plan_transition(
            &[line(p1, 3), line(p1, 3)],
            StockEffect::Neutral,
            StockEffect::Decrease,
        );
        assert_eq!(plan, vec![StockAdjustment { product_id: p1, delta: -6 }]);
        assert!(ledger.apply(&plan).is_err());
    }

    #[test]
    fn cancel_restores_what_processing_took() {
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let lines = [line(p1, 2), line(p2, 7)];
        let mut ledger = StockLedger::new();
        ledger.track(p1, "Pão", 10);
        ledger.track(p2, "Manteiga", 7);

        let take = plan_transition(
            &lines,
            SaleStatus::Pending.stock_effect(),
            SaleStatus::Processing.stock_effect(),
        );
        ledger.apply(&take).unwrap();
        assert_eq!(ledger.stock_of(p1), Some(8));
        assert_eq!(ledger.stock_of(p2), Some(0));

        // processing -> completed não mexe no estoque
        assert!(plan_transition(
            &lines,
            SaleStatus::Processing.stock_effect(),
            SaleStatus::Completed.stock_effect()
        )
        .is_empty());

        let restore = plan_transition(
            &lines,
            SaleStatus::Completed.stock_effect(),
            SaleStatus::Cancelled.stock_effect(),
        );
        ledger.apply(&restore).unwrap();
        assert_eq!(ledger.stock_of(p1), Some(10));
        assert_eq!(ledger.stock_of(p2), Some(7));
    }

    #[test]
    fn cancelling_pending_sale_is_stock_neutral() {
        let p1 = Uuid::new_v4();
        let plan = plan_transition(
            &[line(p1, 4)],
            SaleStatus::Pending.stock_effect(),
            SaleStatus::Cancelled.stock_effect(),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn deactivating_purchase_cannot_drive_stock_negative() {
        let p1 = Uuid::new_v4();
        let mut ledger = StockLedger::new();
        // comprou 10, vendeu 8
        ledger.track(p1, "Detergente", 2);

        let plan = plan_transition(
            &[line(p1, 10)],
            EntityStatus::Active.stock_effect(),
            EntityStatus::Inactive.stock_effect(),
        );
        assert!(matches!(
            ledger.apply(&plan),
            Err(AppError::InsufficientStock { available: 2, requested: 10, .. })
        ));
        assert_eq!(ledger.stock_of(p1), Some(2));

        // reativar soma de novo
        let plan = plan_transition(
            &[line(p1, 10)],
            EntityStatus::Inactive.stock_effect(),
            EntityStatus::Active.stock_effect(),
        );
        ledger.apply(&plan).unwrap();
        assert_eq!(ledger.stock_of(p1), Some(12));
    }

    #[test]
    fn unknown_product_is_not_found() {
        let mut ledger = StockLedger::new();
        let plan = [StockAdjustment { product_id: Uuid::new_v4(), delta: -1 }];
        assert!(matches!(ledger.apply(&plan), Err(AppError::NotFound(_))));
    }

    #[test]
    fn stock_never_negative_over_mixed_sequence() {
        let p1 = Uuid::new_v4();
        let mut ledger = StockLedger::new();
        ledger.track(p1, "Sabão", 0);

        let purchase = [line(p1, 5)];
        let sale_a = [line(p1, 3)];
        let sale_b = [line(p1, 4)];

        let steps: Vec<(&[LineQuantity], StockEffect, StockEffect)> = vec![
            (&purchase[..], StockEffect::Neutral, StockEffect::Increase),
            (&sale_a[..], StockEffect::Neutral, StockEffect::Decrease),
            (&sale_b[..], StockEffect::Neutral, StockEffect::Decrease), // falha: 2 < 4
            (&purchase[..], StockEffect::Increase, StockEffect::Neutral), // falha: 2 < 5
            (&sale_a[..], StockEffect::Decrease, StockEffect::Neutral),
            (&purchase[..], StockEffect::Increase, StockEffect::Neutral),
        ];

        for (lines, from, to) in steps {
            let _ = ledger.apply(&plan_transition(lines, from, to));
            assert!(ledger.stock_of(p1).unwrap() >= 0);
        }
        assert_eq!(ledger.stock_of(p1), Some(0));
    }
}
