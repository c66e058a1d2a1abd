// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{rbac::RoleGrant, status::EntityStatus};

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "João Pereira")]
    pub name: String,
    #[schema(example = "joao@loja.com")]
    pub email: String,

    // Nulo até o usuário concluir o fluxo de definição de senha
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: Option<String>,

    pub role_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Usuário + cargo, carregado a cada requisição autenticada.
#[derive(Debug, Clone, FromRow)]
pub struct UserWithRole {
    #[sqlx(flatten)]
    pub user: User,
    pub role_name: String,
    pub role_permissions: Vec<String>,
    pub role_status: EntityStatus,
}

impl UserWithRole {
    pub fn grant(&self) -> RoleGrant {
        RoleGrant {
            name: self.role_name.clone(),
            permissions: self.role_permissions.clone(),
            status: self.role_status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    #[schema(example = "vendedor")]
    pub role: String,
    pub permissions: Vec<String>,
}

// Dados para registro de um novo usuário (rota protegida)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "João Pereira")]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "joao@loja.com")]
    pub email: String,
    // Opcional: sem senha o usuário recebe o link de definição
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
    pub role_id: Uuid,
    pub branch_id: Option<Uuid>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "joao@loja.com")]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "joao@loja.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "passwords_match", skip_on_field_errors = true))]
pub struct ResetPasswordPayload {
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub confirm_password: String,
}

fn passwords_match(payload: &ResetPasswordPayload) -> Result<(), validator::ValidationError> {
    if payload.password != payload.confirm_password {
        let mut err = validator::ValidationError::new("password_mismatch");
        err.message = Some("As senhas não conferem.".into());
        return Err(err);
    }
    Ok(())
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // ID do usuário
    pub exp: usize, // Expiração
    pub iat: usize, // Emissão
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "password_token_purpose", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PasswordTokenPurpose {
    Reset,
    Setup,
}

#[derive(Debug, Clone, FromRow)]
pub struct PasswordToken {
    pub token: Uuid,
    pub user_id: Uuid,
    pub purpose: PasswordTokenPurpose,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl PasswordToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn reset_payload_requires_matching_passwords() {
        let payload = ResetPasswordPayload {
            password: "segredo1".into(),
            confirm_password: "segredo2".into(),
        };
        assert!(payload.validate().is_err());

        let payload = ResetPasswordPayload {
            password: "segredo1".into(),
            confirm_password: "segredo1".into(),
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn register_payload_accepts_missing_password() {
        let payload = RegisterUserPayload {
            name: "Ana".into(),
            email: "ana@loja.com".into(),
            password: None,
            role_id: Uuid::new_v4(),
            branch_id: None,
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn password_token_expires_and_is_single_use() {
        let now = Utc::now();
        let mut token = PasswordToken {
            token: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            purpose: PasswordTokenPurpose::Reset,
            expires_at: now + Duration::minutes(30),
            used_at: None,
        };
        assert!(token.is_usable(now));
        assert!(!token.is_usable(now + Duration::minutes(31)));

        token.used_at = Some(now);
        assert!(!token.is_usable(now));
    }
}
