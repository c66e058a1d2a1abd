// src/handlers/operations.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::{
        db_utils::parse_id,
        error::{ApiError, AppError},
        extract::{JsonBody, QueryParams},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{
            PermPurchasesDelete, PermPurchasesRead, PermPurchasesWrite, PermSalesDelete,
            PermSalesRead, PermSalesWrite, RequirePermission,
        },
    },
    models::{
        operations::{
            CreatePurchasePayload, CreateSalePayload, Purchase, PurchaseDetail, Sale, SaleDetail,
            SaleListQuery, SaleStatusPayload,
        },
        status::{ListQuery, StatusPayload},
    },
};

// =============================================================================
//  ÁREA 1: COMPRAS
// =============================================================================

// GET /api/purchases
#[utoipa::path(
    get,
    path = "/api/purchases",
    tag = "Compras",
    params(ListQuery),
    responses((status = 200, description = "Lista de compras", body = Vec<Purchase>)),
    security(("api_jwt" = []))
)]
pub async fn list_purchases(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesRead>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let purchases = app_state
        .operation_service
        .list_purchases(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Compras listadas com sucesso.", "Purchases listed successfully."),
        "purchases": purchases,
    })))
}

// POST /api/purchases
#[utoipa::path(
    post,
    path = "/api/purchases",
    tag = "Compras",
    request_body = CreatePurchasePayload,
    responses(
        (status = 201, description = "Compra registrada (estoque incrementado se ativa)", body = PurchaseDetail),
        (status = 400, description = "Dados inválidos, fornecedor ou produto inativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesWrite>,
    JsonBody(payload): JsonBody<CreatePurchasePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let purchase = app_state
        .operation_service
        .create_purchase(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": locale.text("Compra registrada com sucesso.", "Purchase registered successfully."),
            "purchase": purchase,
        })),
    ))
}

// GET /api/purchases/{id}
#[utoipa::path(
    get,
    path = "/api/purchases/{id}",
    tag = "Compras",
    params(("id" = String, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Compra com itens", body = PurchaseDetail),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesRead>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let purchase = app_state
        .operation_service
        .get_purchase(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Compra encontrada.", "Purchase found."),
        "purchase": purchase,
    })))
}

// PATCH /api/purchases/{id}/status
#[utoipa::path(
    patch,
    path = "/api/purchases/{id}/status",
    tag = "Compras",
    params(("id" = String, Path, description = "ID da compra")),
    request_body = StatusPayload,
    responses(
        (status = 200, description = "Status alterado e estoque reconciliado", body = PurchaseDetail),
        (status = 400, description = "Transição inválida ou estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_purchase_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let purchase = app_state
        .operation_service
        .update_purchase_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Status da compra alterado.", "Purchase status changed."),
        "purchase": purchase,
    })))
}

// DELETE /api/purchases/{id}
#[utoipa::path(
    delete,
    path = "/api/purchases/{id}",
    tag = "Compras",
    params(("id" = String, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Compra excluída"),
        (status = 400, description = "Só compras inativas podem ser excluídas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesDelete>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .operation_service
        .delete_purchase(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Compra excluída com sucesso.", "Purchase deleted successfully."),
    })))
}

// =============================================================================
//  ÁREA 2: VENDAS
// =============================================================================

// GET /api/sales
#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Vendas",
    params(SaleListQuery),
    responses((status = 200, description = "Lista de vendas", body = Vec<Sale>)),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    QueryParams(query): QueryParams<SaleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = app_state
        .operation_service
        .list_sales(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Vendas listadas com sucesso.", "Sales listed successfully."),
        "sales": sales,
    })))
}

// POST /api/sales
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Vendas",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda registrada", body = SaleDetail),
        (status = 400, description = "Estoque insuficiente, produto vencido/inativo ou status inicial inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesWrite>,
    JsonBody(payload): JsonBody<CreateSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let sale = app_state
        .operation_service
        .create_sale(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": locale.text("Venda registrada com sucesso.", "Sale registered successfully."),
            "sale": sale,
        })),
    ))
}

// GET /api/sales/{id}
#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Vendas",
    params(("id" = String, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda com itens", body = SaleDetail),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let sale = app_state
        .operation_service
        .get_sale(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Venda encontrada.", "Sale found."),
        "sale": sale,
    })))
}

// PATCH /api/sales/{id}/status
#[utoipa::path(
    patch,
    path = "/api/sales/{id}/status",
    tag = "Vendas",
    params(("id" = String, Path, description = "ID da venda")),
    request_body = SaleStatusPayload,
    responses(
        (status = 200, description = "Status alterado e estoque reconciliado", body = SaleDetail),
        (status = 400, description = "Transição inválida ou estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_sale_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<SaleStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let sale = app_state
        .operation_service
        .update_sale_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Status da venda alterado.", "Sale status changed."),
        "sale": sale,
    })))
}

// DELETE /api/sales/{id}
#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    tag = "Vendas",
    params(("id" = String, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda excluída"),
        (status = 400, description = "Só vendas pendentes ou canceladas podem ser excluídas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesDelete>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .operation_service
        .delete_sale(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Venda excluída com sucesso.", "Sale deleted successfully."),
    })))
}
