// src/handlers/password_page.rs
// Página mínima de redefinição de senha (aberta a partir do link do e-mail).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Form,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::i18n::Locale,
    models::auth::ResetPasswordPayload,
};

const PAGE_STYLE: &str = "body{font-family:sans-serif;max-width:420px;margin:48px auto;padding:0 16px}\
label{display:block;margin-top:12px}input{width:100%;padding:8px;box-sizing:border-box}\
button{margin-top:16px;padding:10px 16px}.erro{color:#b00020}";

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html><html lang=\"pt-BR\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{title}</title><style>{PAGE_STYLE}</style></head>\
<body><h1>{title}</h1>{body}</body></html>",
        title = escape_html(title),
    ))
}

fn form_page(token: &str, errors: &[String]) -> Html<String> {
    let error_list = if errors.is_empty() {
        String::new()
    } else {
        let items: String = errors
            .iter()
            .map(|e| format!("<li>{}</li>", escape_html(e)))
            .collect();
        format!("<ul class=\"erro\">{}</ul>", items)
    };
    page(
        "Definir nova senha",
        &format!(
            "{error_list}<form method=\"post\" action=\"/reset-password/{token}\">\
<label for=\"password\">Nova senha</label>\
<input type=\"password\" id=\"password\" name=\"password\" minlength=\"6\" required>\
<label for=\"confirm_password\">Confirme a senha</label>\
<input type=\"password\" id=\"confirm_password\" name=\"confirmPassword\" minlength=\"6\" required>\
<button type=\"submit\">Salvar</button></form>",
            token = escape_html(token),
        ),
    )
}

fn message_page(title: &str, message: &str) -> Html<String> {
    page(title, &format!("<p>{}</p>", escape_html(message)))
}

// GET /reset-password/{token}
pub async fn show_form(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
) -> impl IntoResponse {
    match app_state.auth_service.check_password_token(&token).await {
        Ok(_) => (StatusCode::OK, form_page(&token, &[])),
        Err(e) => {
            let api = e.to_api_error(&locale);
            (api.status, message_page("Link inválido", &api.message))
        }
    }
}

// POST /reset-password/{token} (formulário)
pub async fn submit_form(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(token): Path<String>,
    Form(payload): Form<ResetPasswordPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        let api = AppError::ValidationError(errors).to_api_error(&locale);
        let messages = api.errors.unwrap_or_else(|| vec![api.message]);
        return (StatusCode::BAD_REQUEST, form_page(&token, &messages));
    }

    match app_state
        .auth_service
        .reset_password(&token, &payload.password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            message_page(
                "Senha definida",
                locale.text(
                    "Sua senha foi salva. Você já pode entrar no sistema.",
                    "Your password was saved. You can now sign in.",
                ),
            ),
        ),
        Err(e) => {
            let api = e.to_api_error(&locale);
            (api.status, message_page("Não foi possível salvar", &api.message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_in_messages() {
        assert_eq!(
            escape_html("<script>\"x\" & 'y'</script>"),
            "&lt;script&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn form_posts_back_to_the_same_token() {
        let Html(body) = form_page("abc-123", &["password: curta".to_string()]);
        assert!(body.contains("action=\"/reset-password/abc-123\""));
        assert!(body.contains("name=\"confirmPassword\""));
        assert!(body.contains("<li>password: curta</li>"));
    }
}
