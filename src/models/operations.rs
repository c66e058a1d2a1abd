// src/models/operations.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    models::status::{EntityStatus, SaleStatus},
};

/// Teto (exclusivo) de preços e totais; cabe folgado em NUMERIC(14,2).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Casas decimais gravadas no banco.
pub const MONEY_SCALE: u32 = 2;

// =============================================================================
//  COMPRAS (entrada de estoque enquanto ativa)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub provider_id: Uuid,
    #[schema(example = "250.00")]
    pub total: Decimal,
    pub status: EntityStatus,
    pub purchase_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub position: i32,
    #[schema(example = 10)]
    pub quantity: i32,
    #[schema(example = "25.00")]
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub header: Purchase,
    pub provider_name: String,
    pub items: Vec<PurchaseItem>,
}

// =============================================================================
//  VENDAS (saída de estoque em processing/completed)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "99.90")]
    pub total: Decimal,
    pub status: SaleStatus,
    pub sale_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub position: i32,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = "49.95")]
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub header: Sale,
    pub customer_name: String,
    pub items: Vec<SaleItem>,
}

/// Linha já validada e precificada, pronta para gravar.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl PricedLine {
    pub fn new(product_id: Uuid, quantity: i32, unit_price: Decimal) -> Result<Self, AppError> {
        let line_total = unit_price
            .checked_mul(Decimal::from(quantity))
            .and_then(within_limit)
            .ok_or(AppError::AmountOutOfRange)?;
        Ok(Self {
            product_id,
            quantity,
            unit_price,
            line_total,
        })
    }
}

pub fn lines_total(lines: &[PricedLine]) -> Result<Decimal, AppError> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| {
            acc.checked_add(l.line_total).and_then(within_limit)
        })
        .ok_or(AppError::AmountOutOfRange)
}

fn within_limit(value: Decimal) -> Option<Decimal> {
    (value < MAX_AMOUNT).then_some(value)
}

// --- Payloads de entrada ---

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLinePayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    #[schema(example = 10)]
    pub quantity: i32,
    #[validate(custom(function = "positive_decimal"))]
    #[schema(value_type = f64, example = 25.0)]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchasePayload {
    pub provider_id: Uuid,
    #[validate(length(min = 1, message = "Informe ao menos um item."), nested)]
    pub items: Vec<PurchaseLinePayload>,
    // Padrão: active (entra no estoque na hora)
    pub status: Option<EntityStatus>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLinePayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    #[schema(example = 2)]
    pub quantity: i32,
    // Sem preço: usa o preço atual do produto
    #[validate(custom(function = "positive_decimal"))]
    #[schema(value_type = Option<f64>, example = 49.95)]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    // Sem cliente: venda de balcão (cliente padrão)
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Informe ao menos um item."), nested)]
    pub items: Vec<SaleLinePayload>,
    #[schema(example = "processing")]
    pub status: Option<SaleStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaleStatusPayload {
    #[schema(example = "completed")]
    pub status: SaleStatus,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SaleListQuery {
    /// Filtra por status da venda
    pub status: Option<SaleStatus>,
}

/// Preço válido: positivo, abaixo de `MAX_AMOUNT` e com no máximo duas casas.
pub fn positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    let (code, message) = if *value <= Decimal::ZERO {
        ("positive", "O valor deve ser maior que zero.")
    } else if *value >= MAX_AMOUNT {
        ("max_amount", "O valor excede o limite permitido.")
    } else if value.normalize().scale() > MONEY_SCALE {
        ("money_scale", "O valor deve ter no máximo duas casas decimais.")
    } else {
        return Ok(());
    };
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    Err(err)
}

// --- Linhas de relatório ---

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SaleReportRow {
    pub sale_date: DateTime<Utc>,
    pub customer_name: String,
    pub status: SaleStatus,
    pub items_count: i64,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReportRow {
    pub purchase_date: DateTime<Utc>,
    pub provider_name: String,
    pub status: EntityStatus,
    pub items_count: i64,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_and_order_totals() {
        let a = PricedLine::new(Uuid::new_v4(), 3, Decimal::new(1050, 2)).unwrap();
        let b = PricedLine::new(Uuid::new_v4(), 1, Decimal::new(200, 2)).unwrap();
        assert_eq!(a.line_total, Decimal::new(3150, 2));
        assert_eq!(lines_total(&[a, b]).unwrap(), Decimal::new(3350, 2));
    }

    #[test]
    fn max_amount_is_one_trillion() {
        assert_eq!(MAX_AMOUNT, Decimal::from(1_000_000_000_000i64));
    }

    #[test]
    fn huge_line_totals_are_rejected_instead_of_overflowing() {
        // 5e28 x 3 estoura o Decimal
        let huge = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        assert!(matches!(
            PricedLine::new(Uuid::new_v4(), 3, huge),
            Err(AppError::AmountOutOfRange)
        ));

        let big = Decimal::from(600_000_000_000i64);
        assert!(matches!(
            PricedLine::new(Uuid::new_v4(), 2, big),
            Err(AppError::AmountOutOfRange)
        ));

        let a = PricedLine::new(Uuid::new_v4(), 1, big).unwrap();
        let b = PricedLine::new(Uuid::new_v4(), 1, big).unwrap();
        assert!(matches!(lines_total(&[a, b]), Err(AppError::AmountOutOfRange)));
    }

    #[test]
    fn prices_need_at_most_two_decimals_and_stay_below_the_limit() {
        assert!(positive_decimal(&Decimal::new(1050, 2)).is_ok());
        // zeros à direita não contam
        assert!(positive_decimal(&Decimal::new(5000, 3)).is_ok());

        let err = positive_decimal(&Decimal::new(335, 3)).unwrap_err();
        assert_eq!(err.code, "money_scale");

        let err = positive_decimal(&MAX_AMOUNT).unwrap_err();
        assert_eq!(err.code, "max_amount");
        let huge = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        assert!(positive_decimal(&huge).is_err());
        assert!(positive_decimal(&(MAX_AMOUNT - Decimal::new(1, 2))).is_ok());
    }

    #[test]
    fn sale_line_with_three_decimal_price_is_rejected() {
        let payload = CreateSalePayload {
            customer_id: None,
            items: vec![SaleLinePayload {
                product_id: Uuid::new_v4(),
                quantity: 3,
                unit_price: Some(Decimal::new(335, 3)),
            }],
            status: None,
            notes: None,
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn sale_payload_rejects_empty_and_non_positive_lines() {
        let empty = CreateSalePayload {
            customer_id: None,
            items: vec![],
            status: None,
            notes: None,
        };
        assert!(empty.validate().is_err());

        let zero_qty = CreateSalePayload {
            customer_id: None,
            items: vec![SaleLinePayload {
                product_id: Uuid::new_v4(),
                quantity: 0,
                unit_price: None,
            }],
            status: None,
            notes: None,
        };
        assert!(zero_qty.validate().is_err());

        let ok = CreateSalePayload {
            customer_id: None,
            items: vec![SaleLinePayload {
                product_id: Uuid::new_v4(),
                quantity: 2,
                unit_price: None,
            }],
            status: Some(SaleStatus::Pending),
            notes: None,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn purchase_payload_rejects_non_positive_price() {
        let payload = CreatePurchasePayload {
            provider_id: Uuid::new_v4(),
            items: vec![PurchaseLinePayload {
                product_id: Uuid::new_v4(),
                quantity: 5,
                unit_price: Decimal::ZERO,
            }],
            status: None,
            purchase_date: None,
            notes: None,
        };
        assert!(payload.validate().is_err());
    }
}
