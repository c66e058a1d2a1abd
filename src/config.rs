// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        BranchRepository, CrmRepository, InventoryRepository, OperationsRepository,
        RbacRepository, UserRepository,
    },
    middleware::rbac::{PermissionPolicy, StaticPermissionPolicy},
    services::{
        auth::{AuthService, AuthSettings},
        branch_service::BranchService,
        crm_service::CrmService,
        document_service::{DocumentService, ReportFonts},
        inventory_service::InventoryService,
        mailer::LogMailer,
        operation_service::OperationService,
        rbac_service::RbacService,
    },
};

/// Configuração lida do ambiente (`.env` opcional).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub jwt_expiration_hours: i64,
    pub public_base_url: String,
    pub password_token_ttl_minutes: i64,
    pub report_fonts_dir: PathBuf,
    pub report_font_family: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} deve ser definida", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválida: '{}'", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_expiration_hours: parsed_or("JWT_EXPIRATION_HOURS", 168)?,
            public_base_url: optional("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            password_token_ttl_minutes: parsed_or("PASSWORD_TOKEN_TTL_MINUTES", 60)?,
            report_fonts_dir: PathBuf::from(
                optional("REPORT_FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
            ),
            report_font_family: optional("REPORT_FONT_FAMILY")
                .unwrap_or_else(|| "Roboto".to_string()),
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }

    /// Credenciais do primeiro administrador, quando as duas estão presentes.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub crm_service: CrmService,
    pub inventory_service: InventoryService,
    pub operation_service: OperationService,
    pub rbac_service: RbacService,
    pub branch_service: BranchService,
    pub document_service: DocumentService,
    pub policy: Arc<dyn PermissionPolicy>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(config, db_pool))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(config: Config, db_pool: PgPool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let branch_repo = BranchRepository::new(db_pool.clone());
        let operations_repo = OperationsRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo,
            rbac_repo.clone(),
            branch_repo.clone(),
            Arc::new(LogMailer),
            AuthSettings {
                jwt_secret: config.jwt_secret.clone(),
                jwt_expiration_hours: config.jwt_expiration_hours,
                public_base_url: config.public_base_url.clone(),
                password_token_ttl_minutes: config.password_token_ttl_minutes,
            },
            db_pool.clone(),
        );
        let crm_service = CrmService::new(crm_repo.clone(), db_pool.clone());
        let inventory_service = InventoryService::new(inventory_repo.clone(), db_pool.clone());
        let operation_service = OperationService::new(
            operations_repo.clone(),
            inventory_repo.clone(),
            crm_repo,
            db_pool.clone(),
        );
        let rbac_service = RbacService::new(rbac_repo, db_pool.clone());
        let branch_service = BranchService::new(branch_repo, db_pool.clone());
        let document_service = DocumentService::new(
            operations_repo,
            inventory_repo,
            ReportFonts {
                dir: config.report_fonts_dir.clone(),
                family: config.report_font_family.clone(),
            },
        );

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            crm_service,
            inventory_service,
            operation_service,
            rbac_service,
            branch_service,
            document_service,
            policy: Arc::new(StaticPermissionPolicy::new()),
        }
    }
}
