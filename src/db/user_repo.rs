// src/db/user_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{PasswordToken, PasswordTokenPurpose, User, UserWithRole},
};

const USER_WITH_ROLE: &str = r#"
    SELECT u.*, r.name AS role_name, r.permissions AS role_permissions, r.status AS role_status
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

// O repositório de usuários, responsável pelas tabelas 'users' e 'password_tokens'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail (sem diferenciar maiúsculas)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(maybe_user)
    }

    /// Usuário + cargo; usado a cada requisição autenticada.
    pub async fn find_with_role(&self, id: Uuid) -> Result<Option<UserWithRole>, AppError> {
        let query = format!("{USER_WITH_ROLE} WHERE u.id = $1");
        let maybe_user = sqlx::query_as::<_, UserWithRole>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // Cria um novo usuário. E-mail duplicado vira erro de negócio.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
        role_id: Uuid,
        branch_id: Option<Uuid>,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role_id, branch_id)
            VALUES ($1, LOWER($2), $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role_id)
        .bind(branch_id)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn set_password<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  TOKENS DE SENHA (uso único)
    // =========================================================================

    pub async fn create_password_token<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        purpose: PasswordTokenPurpose,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordToken, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let token = sqlx::query_as::<_, PasswordToken>(
            r#"
            INSERT INTO password_tokens (token, user_id, purpose, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING token, user_id, purpose, expires_at, used_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(purpose)
        .bind(expires_at)
        .fetch_one(executor)
        .await?;
        Ok(token)
    }

    /// Busca e trava o token; dois resets simultâneos não usam o mesmo token.
    pub async fn lock_password_token<'e, E>(
        &self,
        executor: E,
        token: Uuid,
    ) -> Result<Option<PasswordToken>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let token = sqlx::query_as::<_, PasswordToken>(
            r#"
            SELECT token, user_id, purpose, expires_at, used_at
            FROM password_tokens
            WHERE token = $1
            FOR UPDATE
            "#,
        )
        .bind(token)
        .fetch_optional(executor)
        .await?;
        Ok(token)
    }

    pub async fn find_password_token(
        &self,
        token: Uuid,
    ) -> Result<Option<PasswordToken>, AppError> {
        let token = sqlx::query_as::<_, PasswordToken>(
            "SELECT token, user_id, purpose, expires_at, used_at FROM password_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    pub async fn mark_token_used<'e, E>(&self, executor: E, token: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE password_tokens SET used_at = NOW() WHERE token = $1")
            .bind(token)
            .execute(executor)
            .await?;
        Ok(())
    }
}
