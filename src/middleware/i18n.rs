// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const DEFAULT_LANG: &str = "pt";

// Extrator de idioma (primeira tag do Accept-Language)
#[derive(Debug, Clone)]
pub struct Locale(pub String);

impl Locale {
    pub fn is_english(&self) -> bool {
        self.0 == "en"
    }

    // Mensagens de sucesso dos handlers
    pub fn text(&self, pt: &'static str, en: &'static str) -> &'static str {
        if self.is_english() { en } else { pt }
    }

    pub(crate) fn from_header(value: Option<&str>) -> Self {
        let lang = value
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    // "pt-BR" -> "pt"
                    .map(|tag| tag.split('-').next().unwrap_or(tag.as_str()).to_lowercase())
            })
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok());

        Ok(Locale::from_header(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_primary_subtag_of_preferred_language() {
        assert_eq!(Locale::from_header(Some("en-US,en;q=0.9,pt;q=0.5")).0, "en");
        assert_eq!(Locale::from_header(Some("pt-BR")).0, "pt");
    }

    #[test]
    fn falls_back_to_portuguese() {
        assert_eq!(Locale::from_header(None).0, "pt");
        assert!(!Locale::from_header(Some("")).is_english());
    }
}
