use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio. Os handlers traduzem para `ApiError` com o idioma da requisição.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Erros de regra de negócio: campo -> código do erro
    #[error("Dados inválidos: {0:?}")]
    InvalidInput(HashMap<String, String>),

    #[error("Soma das parcelas ({actual}) difere do total da venda ({expected})")]
    InstallmentSumMismatch { expected: i64, actual: i64 },

    #[error("Cliente não possui telefone cadastrado")]
    MissingPhone,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Login local desabilitado")]
    LocalAuthDisabled,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Cliente não encontrado")]
    ClientNotFound,

    #[error("Venda não encontrada")]
    SaleNotFound,

    #[error("Parcela não encontrada")]
    InstallmentNotFound,

    #[error("Cliente possui vendas registradas")]
    ClientHasSales,

    #[error("Banco de dados não configurado")]
    DatabaseUnavailable,

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro ao gerar relatório: {0}")]
    ReportError(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` captura o contexto de qualquer outro erro inesperado.
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Atalho para um erro de regra de negócio em um único campo.
    pub fn invalid(field: &str, code: &str) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), code.to_string());
        AppError::InvalidInput(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::InstallmentSumMismatch { .. }
            | AppError::MissingPhone => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::LocalAuthDisabled => StatusCode::FORBIDDEN,

            AppError::UserNotFound
            | AppError::ClientNotFound
            | AppError::SaleNotFound
            | AppError::InstallmentNotFound => StatusCode::NOT_FOUND,

            AppError::EmailAlreadyExists | AppError::ClientHasSales => StatusCode::CONFLICT,

            AppError::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            AppError::FontNotFound(_)
            | AppError::ReportError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Chave da mensagem no catálogo de traduções
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => "error.validation",
            AppError::InstallmentSumMismatch { .. } => "error.installment_sum_mismatch",
            AppError::MissingPhone => "error.missing_phone",
            AppError::EmailAlreadyExists => "error.email_already_exists",
            AppError::InvalidCredentials => "error.invalid_credentials",
            AppError::InvalidToken => "error.invalid_token",
            AppError::LocalAuthDisabled => "error.local_auth_disabled",
            AppError::UserNotFound => "error.user_not_found",
            AppError::ClientNotFound => "error.client_not_found",
            AppError::SaleNotFound => "error.sale_not_found",
            AppError::InstallmentNotFound => "error.installment_not_found",
            AppError::ClientHasSales => "error.client_has_sales",
            AppError::DatabaseUnavailable => "error.database_unavailable",
            _ => "error.internal",
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzida para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let message = store.translate(&locale.0, self.message_key());

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let codes: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), codes);
                }
                Some(json!(details))
            }
            AppError::InvalidInput(errors) => Some(json!(errors)),
            AppError::InstallmentSumMismatch { expected, actual } => {
                Some(json!({ "expected": expected, "actual": actual }))
            }
            _ => None,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe fica só no log, nunca na resposta.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        ApiError { status, message, details }
    }
}

// Resposta de erro já traduzida
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn validation_errors_are_bad_request() {
        assert_eq!(AppError::invalid("price", "must_be_positive").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InstallmentSumMismatch { expected: 1000, actual: 999 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::MissingPhone.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_and_conflict_are_distinct() {
        assert_eq!(AppError::SaleNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::InstallmentNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::ClientHasSales.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::DatabaseUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn invalid_input_carries_field_codes_as_details() {
        let store = I18nStore::new();
        let api = AppError::invalid("phone", "required_when_whatsapp_enabled").to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details, Some(json!({ "phone": "required_when_whatsapp_enabled" })));
    }

    #[test]
    fn sum_mismatch_reports_both_values() {
        let store = I18nStore::new();
        let api = AppError::InstallmentSumMismatch { expected: 1000, actual: 900 }.to_api_error(&pt(), &store);

        assert_eq!(api.details, Some(json!({ "expected": 1000, "actual": 900 })));
    }

    #[test]
    fn internal_errors_hide_details() {
        let store = I18nStore::new();
        let api = AppError::InternalServerError(anyhow::anyhow!("segredo do banco")).to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.details.is_none());
        assert!(!api.message.contains("segredo"));
    }
}
