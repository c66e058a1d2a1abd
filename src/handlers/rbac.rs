// src/handlers/rbac.rs

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
        rbac::{PermRolesDelete, PermRolesRead, PermRolesWrite, RequirePermission},
    },
    models::{
        rbac::{PermissionEntry, Role},
        status::{ListQuery, StatusPayload},
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RolePayload {
    #[validate(length(min = 1, max = 60, message = "O nome do cargo é obrigatório (até 60 caracteres)."))]
    #[schema(example = "caixa")]
    pub name: String,
    #[schema(example = "Acesso ao balcão de vendas")]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(example = json!(["sales:read", "sales:write", "customers:read"]))]
    pub permissions: Vec<String>,
}

// GET /api/permissions (catálogo para a tela de cargos)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Cargos",
    responses((status = 200, description = "Catálogo de permissões", body = Vec<PermissionEntry>))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
) -> impl IntoResponse {
    Json(json!({
        "message": locale.text("Permissões disponíveis.", "Available permissions."),
        "permissions": app_state.rbac_service.list_permissions(),
    }))
}

// GET /api/roles
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Cargos",
    params(ListQuery),
    responses((status = 200, description = "Lista de cargos", body = Vec<Role>)),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesRead>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .rbac_service
        .list_roles(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Cargos listados com sucesso.", "Roles listed successfully."),
        "roles": roles,
    })))
}

// POST /api/roles
#[utoipa::path(
    post,
    path = "/api/roles",
    tag = "Cargos",
    request_body = RolePayload,
    responses(
        (status = 201, description = "Cargo criado", body = Role),
        (status = 400, description = "Nome repetido ou permissão desconhecida")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesWrite>,
    JsonBody(payload): JsonBody<RolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let role = app_state
        .rbac_service
        .create_role(
            payload.name.trim(),
            payload.description.as_deref(),
            &payload.permissions,
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": locale.text("Cargo criado com sucesso.", "Role created successfully."),
            "role": role,
        })),
    ))
}

// GET /api/roles/{id}
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    tag = "Cargos",
    params(("id" = String, Path, description = "ID do cargo")),
    responses(
        (status = 200, description = "Cargo", body = Role),
        (status = 404, description = "Não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesRead>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let role = app_state
        .rbac_service
        .get_role(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Cargo encontrado.", "Role found."),
        "role": role,
    })))
}

// PUT /api/roles/{id}
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    tag = "Cargos",
    params(("id" = String, Path, description = "ID do cargo")),
    request_body = RolePayload,
    responses((status = 200, description = "Cargo atualizado", body = Role)),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<RolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let role = app_state
        .rbac_service
        .update_role(
            id,
            payload.name.trim(),
            payload.description.as_deref(),
            &payload.permissions,
        )
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Cargo atualizado com sucesso.", "Role updated successfully."),
        "role": role,
    })))
}

// DELETE /api/roles/{id}
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    tag = "Cargos",
    params(("id" = String, Path, description = "ID do cargo")),
    responses(
        (status = 200, description = "Cargo excluído"),
        (status = 400, description = "Cargo ativo ou com usuários")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesDelete>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .rbac_service
        .delete_role(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Cargo excluído com sucesso.", "Role deleted successfully."),
    })))
}

// PATCH /api/roles/{id}/status
#[utoipa::path(
    patch,
    path = "/api/roles/{id}/status",
    tag = "Cargos",
    params(("id" = String, Path, description = "ID do cargo")),
    request_body = StatusPayload,
    responses((status = 200, description = "Status alterado", body = Role)),
    security(("api_jwt" = []))
)]
pub async fn set_role_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRolesWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let role = app_state
        .rbac_service
        .set_role_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Status do cargo alterado.", "Role status changed."),
        "role": role,
    })))
}
