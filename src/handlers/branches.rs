// src/handlers/branches.rs

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
    db::branch_repo::BranchData,
    middleware::{
        i18n::Locale,
        rbac::{PermBranchesDelete, PermBranchesRead, PermBranchesWrite, RequirePermission},
    },
    models::{
        branch::Branch,
        status::{ListQuery, StatusPayload},
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BranchPayload {
    #[validate(length(min = 1, max = 120, message = "O nome da filial é obrigatório (até 120 caracteres)."))]
    #[schema(example = "Loja Centro")]
    pub name: String,
    #[schema(example = "Rua das Flores, 123")]
    pub address: Option<String>,
    #[schema(example = "(11) 3333-4444")]
    pub phone: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "centro@loja.com")]
    pub email: Option<String>,
}

impl BranchPayload {
    fn data(&self) -> BranchData {
        BranchData {
            name: self.name.trim().to_string(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
        }
    }
}

// GET /api/branches
#[utoipa::path(
    get,
    path = "/api/branches",
    tag = "Filiais",
    params(ListQuery),
    responses((status = 200, description = "Lista de filiais", body = Vec<Branch>)),
    security(("api_jwt" = []))
)]
pub async fn list_branches(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermBranchesRead>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let branches = app_state
        .branch_service
        .list(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Filiais listadas com sucesso.", "Branches listed successfully."),
        "branches": branches,
    })))
}

// POST /api/branches
#[utoipa::path(
    post,
    path = "/api/branches",
    tag = "Filiais",
    request_body = BranchPayload,
    responses(
        (status = 201, description = "Filial criada", body = Branch),
        (status = 400, description = "Dados inválidos ou nome repetido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_branch(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermBranchesWrite>,
    JsonBody(payload): JsonBody<BranchPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let branch = app_state
        .branch_service
        .create(&payload.data())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": locale.text("Filial criada com sucesso.", "Branch created successfully."),
            "branch": branch,
        })),
    ))
}

// GET /api/branches/{id}
#[utoipa::path(
    get,
    path = "/api/branches/{id}",
    tag = "Filiais",
    params(("id" = String, Path, description = "ID da filial")),
    responses(
        (status = 200, description = "Filial", body = Branch),
        (status = 404, description = "Não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_branch(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermBranchesRead>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let branch = app_state
        .branch_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Filial encontrada.", "Branch found."),
        "branch": branch,
    })))
}

// PUT /api/branches/{id}
#[utoipa::path(
    put,
    path = "/api/branches/{id}",
    tag = "Filiais",
    params(("id" = String, Path, description = "ID da filial")),
    request_body = BranchPayload,
    responses((status = 200, description = "Filial atualizada", body = Branch)),
    security(("api_jwt" = []))
)]
pub async fn update_branch(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermBranchesWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<BranchPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let branch = app_state
        .branch_service
        .update(id, &payload.data())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Filial atualizada com sucesso.", "Branch updated successfully."),
        "branch": branch,
    })))
}

// DELETE /api/branches/{id}
#[utoipa::path(
    delete,
    path = "/api/branches/{id}",
    tag = "Filiais",
    params(("id" = String, Path, description = "ID da filial")),
    responses(
        (status = 200, description = "Filial excluída"),
        (status = 400, description = "Filial ativa ou com usuários")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_branch(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermBranchesDelete>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    app_state
        .branch_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Filial excluída com sucesso.", "Branch deleted successfully."),
    })))
}

// PATCH /api/branches/{id}/status
#[utoipa::path(
    patch,
    path = "/api/branches/{id}/status",
    tag = "Filiais",
    params(("id" = String, Path, description = "ID da filial")),
    request_body = StatusPayload,
    responses((status = 200, description = "Status alterado", body = Branch)),
    security(("api_jwt" = []))
)]
pub async fn set_branch_status(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermBranchesWrite>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let branch = app_state
        .branch_service
        .set_status(id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Status da filial alterado.", "Branch status changed."),
        "branch": branch,
    })))
}
