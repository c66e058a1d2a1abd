// src/handlers/auth.rs

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
        error::{ApiError, AppError},
        extract::JsonBody,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermUsersWrite, RequirePermission},
    },
    models::auth::{
        AuthResponse, EmailPayload, LoginUserPayload, MeResponse, PasswordTokenPurpose,
        RegisterUserPayload, ResetPasswordPayload, User,
    },
};

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Autenticação",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário cadastrado", body = User),
        (status = 400, description = "Dados inválidos ou e-mail em uso"),
        (status = 403, description = "Sem a permissão users:write")
    ),
    security(("api_jwt" = []))
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsersWrite>,
    JsonBody(payload): JsonBody<RegisterUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let user = app_state
        .auth_service
        .register_user(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": locale.text("Usuário cadastrado com sucesso.", "User registered successfully."),
            "user": user,
        })),
    ))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Autenticação",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login realizado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<LoginUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let AuthResponse { token, user } = app_state
        .auth_service
        .login_user(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Login realizado com sucesso.", "Logged in successfully."),
        "token": token,
        "user": user,
    })))
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Autenticação",
    responses(
        (status = 200, description = "Usuário logado com cargo e permissões", body = MeResponse),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
) -> Json<MeResponse> {
    Json(app_state.auth_service.me(&current))
}

// POST /api/auth/forgot-password
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Autenticação",
    request_body = EmailPayload,
    responses((status = 200, description = "Se o e-mail existir, o link foi enviado"))
)]
pub async fn forgot_password(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<EmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    send_password_link(app_state, locale, payload, PasswordTokenPurpose::Reset).await
}

// POST /api/auth/request-password-setup
#[utoipa::path(
    post,
    path = "/api/auth/request-password-setup",
    tag = "Autenticação",
    request_body = EmailPayload,
    responses((status = 200, description = "Se o e-mail existir, o link foi enviado"))
)]
pub async fn request_password_setup(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<EmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    send_password_link(app_state, locale, payload, PasswordTokenPurpose::Setup).await
}

// Mesma resposta com ou sem conta para o e-mail
async fn send_password_link(
    app_state: AppState,
    locale: Locale,
    payload: EmailPayload,
    purpose: PasswordTokenPurpose,
) -> Result<Json<serde_json::Value>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .auth_service
        .request_password_link(payload.email.trim(), purpose)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text(
            "Se o e-mail estiver cadastrado, você receberá um link em instantes.",
            "If the e-mail is registered, a link will arrive shortly.",
        ),
    })))
}

// POST /api/auth/reset-password/{token}
#[utoipa::path(
    post,
    path = "/api/auth/reset-password/{token}",
    tag = "Autenticação",
    params(("token" = String, Path, description = "Token recebido por e-mail")),
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Senha redefinida"),
        (status = 400, description = "Link inválido, expirado ou senhas diferentes")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
    JsonBody(payload): JsonBody<ResetPasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    app_state
        .auth_service
        .reset_password(&token, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(json!({
        "message": locale.text("Senha redefinida com sucesso.", "Password reset successfully."),
    })))
}
