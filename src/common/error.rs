use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::middleware::i18n::Locale;

/// Recurso envolvido num erro (usado para compor mensagens).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Customer,
    Product,
    Category,
    Provider,
    Purchase,
    Sale,
    Role,
    Branch,
    User,
}

impl Resource {
    fn label(self, english: bool) -> &'static str {
        match (self, english) {
            (Resource::Customer, false) => "Cliente",
            (Resource::Customer, true) => "Customer",
            (Resource::Product, false) => "Produto",
            (Resource::Product, true) => "Product",
            (Resource::Category, false) => "Categoria",
            (Resource::Category, true) => "Category",
            (Resource::Provider, false) => "Fornecedor",
            (Resource::Provider, true) => "Provider",
            (Resource::Purchase, false) => "Compra",
            (Resource::Purchase, true) => "Purchase",
            (Resource::Sale, false) => "Venda",
            (Resource::Sale, true) => "Sale",
            (Resource::Role, false) => "Cargo",
            (Resource::Role, true) => "Role",
            (Resource::Branch, false) => "Filial",
            (Resource::Branch, true) => "Branch",
            (Resource::User, false) => "Usuário",
            (Resource::User, true) => "User",
        }
    }
}

// Nosso tipo de erro. A mensagem do `#[error]` vai para o log;
// a mensagem para o cliente sai de `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("ID inválido: {0}")]
    InvalidId(String),

    #[error("{0:?} não encontrado")]
    NotFound(Resource),

    #[error("{0:?} já existe")]
    AlreadyExists(Resource),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("{resource:?} '{name}' está inativo")]
    Inactive { resource: Resource, name: String },

    #[error("Produto '{0}' está vencido")]
    ProductExpired(String),

    #[error("Estoque insuficiente para '{product}': disponível {available}, solicitado {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    #[error("Transição de status não permitida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Status inicial não permitido: {0}")]
    InvalidInitialStatus(String),

    #[error("O cliente padrão não pode ser alterado, excluído ou desativado")]
    DefaultCustomerProtected,

    #[error("{0:?} ativo não pode ser excluído")]
    NotDeletable(Resource),

    #[error("Venda com status {0} não pode ser excluída")]
    SaleNotDeletable(String),

    #[error("{0:?} está em uso por outros registros")]
    InUse(Resource),

    #[error("Permissões desconhecidas: {0:?}")]
    UnknownPermissions(Vec<String>),

    #[error("Período inválido")]
    InvalidDateRange,

    #[error("Valor fora do intervalo permitido")]
    AmountOutOfRange,

    #[error("Cargo reservado do sistema: {0}")]
    ReservedRole(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Link de senha inválido ou expirado")]
    InvalidPasswordToken,

    #[error("Permissão negada: {0}")]
    Forbidden(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// O erro já "traduzido" para a resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Option<Vec<String>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.errors {
            Some(errors) => json!({ "message": self.message, "errors": errors }),
            None => json!({ "message": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let en = locale.is_english();
        let t = |pt: &str, english: &str| if en { english.to_string() } else { pt.to_string() };

        let (status, message) = match self {
            AppError::ValidationError(errors) => {
                return ApiError {
                    status: StatusCode::BAD_REQUEST,
                    message: t("Um ou mais campos são inválidos.", "One or more fields are invalid."),
                    errors: Some(flatten_validation_errors(errors)),
                };
            }
            AppError::UnknownPermissions(codes) => {
                return ApiError {
                    status: StatusCode::BAD_REQUEST,
                    message: t("Permissões desconhecidas.", "Unknown permissions."),
                    errors: Some(codes.clone()),
                };
            }
            AppError::InvalidId(raw) => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!("Invalid id format: '{}'.", raw)
                } else {
                    format!("Formato de ID inválido: '{}'.", raw)
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                if en {
                    format!("{} not found.", resource.label(true))
                } else {
                    format!("{} não encontrado(a).", resource.label(false))
                },
            ),
            AppError::AlreadyExists(resource) => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!("{} already exists.", resource.label(true))
                } else {
                    format!("{} já cadastrado(a).", resource.label(false))
                },
            ),
            AppError::EmailAlreadyExists => (
                StatusCode::BAD_REQUEST,
                t("Este e-mail já está em uso.", "This e-mail is already in use."),
            ),
            AppError::Inactive { resource, name } => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!("{} '{}' is inactive.", resource.label(true), name)
                } else {
                    format!("{} '{}' está inativo(a).", resource.label(false), name)
                },
            ),
            AppError::ProductExpired(name) => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!("Product '{}' is expired.", name)
                } else {
                    format!("O produto '{}' está vencido.", name)
                },
            ),
            AppError::InsufficientStock { product, available, requested } => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!(
                        "Insufficient stock for '{}': available {}, requested {}.",
                        product, available, requested
                    )
                } else {
                    format!(
                        "Estoque insuficiente para '{}': disponível {}, solicitado {}.",
                        product, available, requested
                    )
                },
            ),
            AppError::InvalidStatusTransition { from, to } => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!("Status change from '{}' to '{}' is not allowed.", from, to)
                } else {
                    format!("Não é permitido mudar o status de '{}' para '{}'.", from, to)
                },
            ),
            AppError::InvalidInitialStatus(status) => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!("A sale cannot be created with status '{}'.", status)
                } else {
                    format!("Uma venda não pode ser criada com o status '{}'.", status)
                },
            ),
            AppError::DefaultCustomerProtected => (
                StatusCode::BAD_REQUEST,
                t(
                    "O cliente padrão não pode ser editado, excluído ou desativado.",
                    "The default customer cannot be edited, deleted or deactivated.",
                ),
            ),
            AppError::NotDeletable(resource) => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!("{} must be inactive before deletion.", resource.label(true))
                } else {
                    format!("{} precisa estar inativo(a) para ser excluído(a).", resource.label(false))
                },
            ),
            AppError::SaleNotDeletable(status) => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!("Only pending or cancelled sales can be deleted (current: '{}').", status)
                } else {
                    format!("Só vendas pendentes ou canceladas podem ser excluídas (atual: '{}').", status)
                },
            ),
            AppError::InUse(resource) => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!("{} is referenced by other records.", resource.label(true))
                } else {
                    format!("{} está vinculado(a) a outros registros.", resource.label(false))
                },
            ),
            AppError::InvalidDateRange => (
                StatusCode::BAD_REQUEST,
                t(
                    "A data inicial deve ser anterior à data final.",
                    "The start date must not be after the end date.",
                ),
            ),
            AppError::AmountOutOfRange => (
                StatusCode::BAD_REQUEST,
                t(
                    "O valor total excede o limite permitido.",
                    "The total amount exceeds the allowed limit.",
                ),
            ),
            AppError::ReservedRole(name) => (
                StatusCode::BAD_REQUEST,
                if en {
                    format!("Role '{}' is reserved by the system and cannot be changed.", name)
                } else {
                    format!("O cargo '{}' é reservado do sistema e não pode ser alterado.", name)
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                t("E-mail ou senha inválidos.", "Invalid e-mail or password."),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                t(
                    "Token de autenticação inválido ou ausente.",
                    "Missing or invalid authentication token.",
                ),
            ),
            AppError::InvalidPasswordToken => (
                StatusCode::BAD_REQUEST,
                t("Link inválido ou expirado.", "Invalid or expired link."),
            ),
            AppError::Forbidden(permission) => (
                StatusCode::FORBIDDEN,
                if en {
                    format!("You need the '{}' permission to perform this action.", permission)
                } else {
                    format!("Você precisa da permissão '{}' para realizar esta ação.", permission)
                },
            ),

            // Todos os outros erros viram 500. O detalhe fica só no log.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    t("Ocorreu um erro inesperado.", "An unexpected error occurred."),
                )
            }
        };

        ApiError::new(status, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

/// Achata os erros do `validator` (inclusive listas aninhadas) em "campo: mensagem".
fn flatten_validation_errors(errors: &ValidationErrors) -> Vec<String> {
    let mut out = Vec::new();
    collect_validation_errors(errors, "", &mut out);
    out.sort();
    out
}

fn collect_validation_errors(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    out.push(format!("{}: {}", path, msg));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_validation_errors(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_validation_errors(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body;
    use validator::ValidationError;

    fn pt() -> Locale {
        Locale::default()
    }

    #[test]
    fn maps_business_errors_to_bad_request() {
        let err = AppError::InsufficientStock {
            product: "Arroz 5kg".into(),
            available: 3,
            requested: 5,
        };
        let api = err.to_api_error(&pt());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.message.contains("Arroz 5kg"));

        let api = AppError::DefaultCustomerProtected.to_api_error(&pt());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);

        let api = AppError::AmountOutOfRange.to_api_error(&pt());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);

        let api = AppError::ReservedRole("admin".into()).to_api_error(&pt());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.message.contains("'admin'"));
    }

    #[test]
    fn maps_not_found_forbidden_and_unauthorized() {
        assert_eq!(
            AppError::NotFound(Resource::Sale).to_api_error(&pt()).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("sales:write".into()).to_api_error(&pt()).status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::InvalidToken.to_api_error(&pt()).status,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InvalidId("abc".into()).to_api_error(&pt()).status,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn english_locale_switches_message() {
        let api = AppError::NotFound(Resource::Product).to_api_error(&Locale("en".into()));
        assert_eq!(api.message, "Product not found.");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("connection refused at 10.0.0.7"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("10.0.0.7"));
        assert!(text.contains("message"));
    }

    #[tokio::test]
    async fn validation_errors_are_listed() {
        let mut errors = ValidationErrors::new();
        let mut e = ValidationError::new("length");
        e.message = Some("O nome é obrigatório.".into());
        errors.add("name", e);

        let response = AppError::ValidationError(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["errors"][0], "name: O nome é obrigatório.");
    }
}
