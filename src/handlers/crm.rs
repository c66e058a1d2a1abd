// src/handlers/crm.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
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
            PermCustomersDelete, PermCustomersRead, PermCustomersWrite, PermProvidersDelete,
            PermProvidersRead, PermProvidersWrite, RequirePermission,
        },
    },
    models::{
        crm::{ContactData, Customer, Provider},
        status::{ListQuery, StatusPayload},
    },
};

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, max = 150, message = "O nome é obrigatório (até 150 caracteres)."))]
    #[schema(example = "Maria da Silva")]
    pub name: String,
    #[schema(example = "12345678900")]
    pub document_number: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    // Só vale na criação: torna este o novo cliente padrão
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPayload {
    #[validate(length(min = 1, max = 150, message = "O nome é obrigatório (até 150 caracteres)."))]
    #[schema(example = "Distribuidora Central Ltda")]
    pub name: String,
    #[schema(example = "12.345.678/0001-99")]
    pub document_number: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

fn contact_data(
    name: &str,
    document_number: &Option<String>,
    email: &Option<String>,
    phone: &Option<String>,
    address: &Option<String>,
) -> ContactData {
    ContactData {
        name: name.trim().to_string(),
        document_number: document_number.clone(),
        email: email.clone(),
        phone: phone.clone(),
        address: address.clone(),
    }
}

impl CustomerPayload {
    fn contact(&self) -> ContactData {
        contact_data(&self.name, &self.document_number, &self.email, &self.phone, &self.address)
    }
}

impl ProviderPayload {
    fn contact(&self) -> ContactData {
        contact_data(&self.name, &self.document_number, &self.email, &self.phone, &self.address)
    }
}

// =============================================================================
//  CLIENTES
// =============================================================================

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Clientes",
    params(ListQuery),
    responses(
        (status = 200, description = "Lista de clientes (o cliente padrão sempre aparece)", body = Vec<Customer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersRead>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .crm_service
        .list_customers(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Clientes listados com sucesso.", "Customers listed successfully."),
        "customers": customers,
    })))
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Clientes",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersWrite>,
    JsonBody(payload): JsonBody<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let customer = app_state
        .crm_service
        .create_customer(&payload.contact(), payload.is_default)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": locale.text("Cliente criado com sucesso.", "Customer created successfully."),
            "customer": customer,
        })),
    ))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Clientes",
    params(("id" = String, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersRead>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let customer = app_state
        .crm_service
        .get_customer(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Cliente encontrado.", "Customer found."),
        "customer": customer,
    })))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Clientes",
    params(("id" = String, Path, description = "ID do cliente")),
    request_body = CustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 400, description = "Dados inválidos ou cliente padrão")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let customer = app_state
        .crm_service
        .update_customer(id, &payload.contact())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Cliente atualizado com sucesso.", "Customer updated successfully."),
        "customer": customer,
    })))
}

// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Clientes",
    params(("id" = String, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente excluído"),
        (status = 400, description = "Cliente padrão, ativo ou com vendas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersDelete>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .crm_service
        .delete_customer(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Cliente excluído com sucesso.", "Customer deleted successfully."),
    })))
}

// PATCH /api/customers/{id}/status
#[utoipa::path(
    patch,
    path = "/api/customers/{id}/status",
    tag = "Clientes",
    params(("id" = String, Path, description = "ID do cliente")),
    request_body = StatusPayload,
    responses(
        (status = 200, description = "Status alterado", body = Customer),
        (status = 400, description = "Cliente padrão não pode ser desativado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_customer_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let customer = app_state
        .crm_service
        .set_customer_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Status do cliente alterado.", "Customer status changed."),
        "customer": customer,
    })))
}

// =============================================================================
//  FORNECEDORES
// =============================================================================

// GET /api/providers
#[utoipa::path(
    get,
    path = "/api/providers",
    tag = "Fornecedores",
    params(ListQuery),
    responses((status = 200, description = "Lista de fornecedores", body = Vec<Provider>)),
    security(("api_jwt" = []))
)]
pub async fn list_providers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProvidersRead>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let providers = app_state
        .crm_service
        .list_providers(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Fornecedores listados com sucesso.", "Providers listed successfully."),
        "providers": providers,
    })))
}

// POST /api/providers
#[utoipa::path(
    post,
    path = "/api/providers",
    tag = "Fornecedores",
    request_body = ProviderPayload,
    responses(
        (status = 201, description = "Fornecedor criado", body = Provider),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_provider(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProvidersWrite>,
    JsonBody(payload): JsonBody<ProviderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let provider = app_state
        .crm_service
        .create_provider(&payload.contact())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": locale.text("Fornecedor criado com sucesso.", "Provider created successfully."),
            "provider": provider,
        })),
    ))
}

// GET /api/providers/{id}
#[utoipa::path(
    get,
    path = "/api/providers/{id}",
    tag = "Fornecedores",
    params(("id" = String, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor", body = Provider),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_provider(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProvidersRead>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let provider = app_state
        .crm_service
        .get_provider(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Fornecedor encontrado.", "Provider found."),
        "provider": provider,
    })))
}

// PUT /api/providers/{id}
#[utoipa::path(
    put,
    path = "/api/providers/{id}",
    tag = "Fornecedores",
    params(("id" = String, Path, description = "ID do fornecedor")),
    request_body = ProviderPayload,
    responses((status = 200, description = "Fornecedor atualizado", body = Provider)),
    security(("api_jwt" = []))
)]
pub async fn update_provider(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProvidersWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ProviderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let provider = app_state
        .crm_service
        .update_provider(id, &payload.contact())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Fornecedor atualizado com sucesso.", "Provider updated successfully."),
        "provider": provider,
    })))
}

// DELETE /api/providers/{id}
#[utoipa::path(
    delete,
    path = "/api/providers/{id}",
    tag = "Fornecedores",
    params(("id" = String, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor excluído"),
        (status = 400, description = "Fornecedor ativo ou com compras")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_provider(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProvidersDelete>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .crm_service
        .delete_provider(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Fornecedor excluído com sucesso.", "Provider deleted successfully."),
    })))
}

// PATCH /api/providers/{id}/status
#[utoipa::path(
    patch,
    path = "/api/providers/{id}/status",
    tag = "Fornecedores",
    params(("id" = String, Path, description = "ID do fornecedor")),
    request_body = StatusPayload,
    responses((status = 200, description = "Status alterado", body = Provider)),
    security(("api_jwt" = []))
)]
pub async fn set_provider_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProvidersWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let provider = app_state
        .crm_service
        .set_provider_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Status do fornecedor alterado.", "Provider status changed."),
        "provider": provider,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_payload_trims_name_and_checks_email() {
        let payload = CustomerPayload {
            name: "  Maria  ".into(),
            document_number: None,
            email: Some("maria-sem-arroba".into()),
            phone: None,
            address: None,
            is_default: false,
        };
        assert!(payload.validate().is_err());
        assert_eq!(payload.contact().name, "Maria");
    }

    #[test]
    fn is_default_defaults_to_false() {
        let payload: CustomerPayload = serde_json::from_str(r#"{"name":"João"}"#).unwrap();
        assert!(!payload.is_default);
        assert!(payload.validate().is_ok());
    }
}
