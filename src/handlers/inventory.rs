// src/handlers/inventory.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        db_utils::parse_id,
        error::{ApiError, AppError},
        extract::{JsonBody, QueryParams},
    },
    config::AppState,
    db::inventory_repo::ProductData,
    middleware::{
        i18n::Locale,
        rbac::{
            PermCategoriesDelete, PermCategoriesRead, PermCategoriesWrite, PermProductsDelete,
            PermProductsRead, PermProductsWrite, RequirePermission,
        },
    },
    models::{
        inventory::{Category, Product},
        operations::positive_decimal,
        status::{ListQuery, StatusPayload},
    },
};

// =============================================================================
//  ÁREA 1: CATEGORIAS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[validate(length(min = 1, max = 100, message = "O nome é obrigatório (até 100 caracteres)."))]
    #[schema(example = "Bebidas")]
    pub name: String,
    #[schema(example = "Refrigerantes, sucos e águas")]
    pub description: Option<String>,
}

// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categorias",
    params(ListQuery),
    responses((status = 200, description = "Lista de categorias", body = Vec<Category>)),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCategoriesRead>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .inventory_service
        .list_categories(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Categorias listadas com sucesso.", "Categories listed successfully."),
        "categories": categories,
    })))
}

// POST /api/categories
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Categorias",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 400, description = "Dados inválidos ou nome repetido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCategoriesWrite>,
    JsonBody(payload): JsonBody<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let category = app_state
        .inventory_service
        .create_category(payload.name.trim(), payload.description.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": locale.text("Categoria criada com sucesso.", "Category created successfully."),
            "category": category,
        })),
    ))
}

// GET /api/categories/{id}
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    tag = "Categorias",
    params(("id" = String, Path, description = "ID da categoria")),
    responses(
        (status = 200, description = "Categoria", body = Category),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCategoriesRead>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let category = app_state
        .inventory_service
        .get_category(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Categoria encontrada.", "Category found."),
        "category": category,
    })))
}

// PUT /api/categories/{id}
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "Categorias",
    params(("id" = String, Path, description = "ID da categoria")),
    request_body = CategoryPayload,
    responses((status = 200, description = "Categoria atualizada", body = Category)),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCategoriesWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let category = app_state
        .inventory_service
        .update_category(id, payload.name.trim(), payload.description.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Categoria atualizada com sucesso.", "Category updated successfully."),
        "category": category,
    })))
}

// DELETE /api/categories/{id}
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "Categorias",
    params(("id" = String, Path, description = "ID da categoria")),
    responses(
        (status = 200, description = "Categoria excluída"),
        (status = 400, description = "Categoria ativa ou com produtos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCategoriesDelete>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .inventory_service
        .delete_category(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Categoria excluída com sucesso.", "Category deleted successfully."),
    })))
}

// PATCH /api/categories/{id}/status
#[utoipa::path(
    patch,
    path = "/api/categories/{id}/status",
    tag = "Categorias",
    params(("id" = String, Path, description = "ID da categoria")),
    request_body = StatusPayload,
    responses((status = 200, description = "Status alterado", body = Category)),
    security(("api_jwt" = []))
)]
pub async fn set_category_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCategoriesWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let category = app_state
        .inventory_service
        .set_category_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Status da categoria alterado.", "Category status changed."),
        "category": category,
    })))
}

// =============================================================================
//  ÁREA 2: PRODUTOS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "expiration_after_batch", skip_on_field_errors = false))]
pub struct ProductPayload {
    #[validate(length(min = 1, max = 150, message = "O nome é obrigatório (até 150 caracteres)."))]
    #[schema(example = "Refrigerante Lata 350ml")]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    #[validate(custom(function = "positive_decimal"))]
    #[schema(value_type = f64, example = 5.5)]
    pub price: Decimal,
    #[schema(example = "L2024-08")]
    pub batch_number: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "2024-08-01")]
    pub batch_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date, example = "2025-08-01")]
    pub expiration_date: Option<NaiveDate>,
    // Só é usado na criação; depois o estoque muda só por compras e vendas
    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    #[schema(example = 0)]
    pub stock: Option<i32>,
}

fn expiration_after_batch(payload: &ProductPayload) -> Result<(), ValidationError> {
    if let (Some(batch), Some(expiration)) = (payload.batch_date, payload.expiration_date) {
        if expiration < batch {
            let mut err = ValidationError::new("expiration_before_batch");
            err.message = Some("A validade não pode ser anterior à data do lote.".into());
            return Err(err);
        }
    }
    Ok(())
}

impl ProductPayload {
    fn data(&self) -> ProductData {
        ProductData {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            category_id: self.category_id,
            price: self.price,
            batch_number: self.batch_number.clone(),
            batch_date: self.batch_date,
            expiration_date: self.expiration_date,
        }
    }
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Produtos",
    params(ListQuery),
    responses((status = 200, description = "Lista de produtos", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsRead>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .list_products(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Produtos listados com sucesso.", "Products listed successfully."),
        "products": products,
    })))
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Produtos",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos ou categoria inativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsWrite>,
    JsonBody(payload): JsonBody<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let product = app_state
        .inventory_service
        .create_product(&payload.data(), payload.stock.unwrap_or(0))
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": locale.text("Produto criado com sucesso.", "Product created successfully."),
            "product": product,
        })),
    ))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Produtos",
    params(("id" = String, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsRead>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let product = app_state
        .inventory_service
        .get_product(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Produto encontrado.", "Product found."),
        "product": product,
    })))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Produtos",
    params(("id" = String, Path, description = "ID do produto")),
    request_body = ProductPayload,
    responses((status = 200, description = "Produto atualizado (estoque não muda)", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let product = app_state
        .inventory_service
        .update_product(id, &payload.data())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Produto atualizado com sucesso.", "Product updated successfully."),
        "product": product,
    })))
}

// DELETE /api/products/{id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Produtos",
    params(("id" = String, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto excluído"),
        (status = 400, description = "Produto ativo ou usado em compras/vendas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsDelete>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .inventory_service
        .delete_product(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Produto excluído com sucesso.", "Product deleted successfully."),
    })))
}

// PATCH /api/products/{id}/status
#[utoipa::path(
    patch,
    path = "/api/products/{id}/status",
    tag = "Produtos",
    params(("id" = String, Path, description = "ID do produto")),
    request_body = StatusPayload,
    responses((status = 200, description = "Status alterado", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn set_product_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let product = app_state
        .inventory_service
        .set_product_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Status do produto alterado.", "Product status changed."),
        "product": product,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ProductPayload {
        ProductPayload {
            name: "Água 500ml".into(),
            description: None,
            category_id: Uuid::new_v4(),
            price: Decimal::new(250, 2),
            batch_number: Some("L1".into()),
            batch_date: NaiveDate::from_ymd_opt(2025, 1, 10),
            expiration_date: NaiveDate::from_ymd_opt(2026, 1, 10),
            stock: Some(24),
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn expiration_before_batch_is_rejected() {
        let mut p = payload();
        p.expiration_date = NaiveDate::from_ymd_opt(2024, 12, 31);
        assert!(p.validate().is_err());
    }

    #[test]
    fn price_must_be_positive_and_stock_non_negative() {
        let mut p = payload();
        p.price = Decimal::ZERO;
        assert!(p.validate().is_err());

        let mut p = payload();
        p.stock = Some(-1);
        assert!(p.validate().is_err());
    }
}
