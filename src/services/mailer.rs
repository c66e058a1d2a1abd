// src/services/mailer.rs

use async_trait::async_trait;

use crate::{common::error::AppError, models::auth::PasswordTokenPurpose};

/// Entrega dos links de senha. Injetado no `AuthService`.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_link(
        &self,
        to: &str,
        purpose: PasswordTokenPurpose,
        link: &str,
    ) -> Result<(), AppError>;
}

/// Implementação padrão: só registra o link no log.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_link(
        &self,
        to: &str,
        purpose: PasswordTokenPurpose,
        link: &str,
    ) -> Result<(), AppError> {
        let subject = match purpose {
            PasswordTokenPurpose::Reset => "Redefinição de senha",
            PasswordTokenPurpose::Setup => "Defina sua senha",
        };
        tracing::info!(to, subject, link, "link de senha emitido");
        Ok(())
    }
}

pub fn password_link(base_url: &str, token: &uuid::Uuid) -> String {
    format!("{}/reset-password/{}", base_url.trim_end_matches('/'), token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn link_points_to_reset_page() {
        let token = Uuid::new_v4();
        assert_eq!(
            password_link("https://loja.exemplo.com/", &token),
            format!("https://loja.exemplo.com/reset-password/{}", token)
        );
    }

    #[tokio::test]
    async fn log_mailer_never_fails() {
        let mailer = LogMailer;
        let result = mailer
            .send_password_link(
                "ana@loja.com",
                PasswordTokenPurpose::Setup,
                "http://x/reset-password/1",
            )
            .await;
        assert!(result.is_ok());
    }
}
