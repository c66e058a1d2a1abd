use uuid::Uuid;

use crate::common::error::{AppError, Resource};

/// Converte o ID vindo da rota. Formato inválido vira 400 em JSON.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidId(raw.to_string()))
}

/// Traduz violações de constraint do Postgres para erros de negócio.
/// Unique -> `AlreadyExists`, foreign key -> `InUse`.
pub fn map_constraint_error(e: sqlx::Error, resource: Resource) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::AlreadyExists(resource);
        }
        if db_err.is_foreign_key_violation() {
            return AppError::InUse(resource);
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn rejects_malformed_id() {
        match parse_id("64b7f0c2e1") {
            Err(AppError::InvalidId(raw)) => assert_eq!(raw, "64b7f0c2e1"),
            other => panic!("esperava InvalidId, veio {:?}", other),
        }
    }

    #[test]
    fn non_database_errors_pass_through() {
        let err = map_constraint_error(sqlx::Error::RowNotFound, Resource::Category);
        assert!(matches!(err, AppError::DatabaseError(_)));
    }
}
