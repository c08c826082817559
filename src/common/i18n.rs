// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

pub const DEFAULT_LANG: &str = "pt";

// Catálogo (idioma, chave) -> mensagem
const MESSAGES: &[(&str, &str, &str)] = &[
    ("pt", "error.validation", "Um ou mais campos são inválidos."),
    ("en", "error.validation", "One or more fields are invalid."),
    ("pt", "error.installment_sum_mismatch", "A soma das parcelas deve ser igual ao total da venda."),
    ("en", "error.installment_sum_mismatch", "The installments must add up to the sale total."),
    ("pt", "error.missing_phone", "Cliente não possui telefone cadastrado."),
    ("en", "error.missing_phone", "Client has no phone number registered."),
    ("pt", "error.email_already_exists", "Este e-mail já está em uso."),
    ("en", "error.email_already_exists", "This e-mail is already in use."),
    ("pt", "error.invalid_credentials", "E-mail ou senha incorretos."),
    ("en", "error.invalid_credentials", "Invalid e-mail or password."),
    ("pt", "error.invalid_token", "Sessão inválida ou ausente."),
    ("en", "error.invalid_token", "Invalid or missing session."),
    ("pt", "error.local_auth_disabled", "Login local não está habilitado."),
    ("en", "error.local_auth_disabled", "Local login is disabled."),
    ("pt", "error.user_not_found", "Usuário não encontrado."),
    ("en", "error.user_not_found", "User not found."),
    ("pt", "error.client_not_found", "Cliente não encontrado."),
    ("en", "error.client_not_found", "Client not found."),
    ("pt", "error.sale_not_found", "Venda não encontrada."),
    ("en", "error.sale_not_found", "Sale not found."),
    ("pt", "error.installment_not_found", "Parcela não encontrada."),
    ("en", "error.installment_not_found", "Installment not found."),
    ("pt", "error.client_has_sales", "Cliente possui vendas registradas e não pode ser removido."),
    ("en", "error.client_has_sales", "Client has sales and cannot be removed."),
    ("pt", "error.database_unavailable", "Banco de dados indisponível."),
    ("en", "error.database_unavailable", "Database not available."),
    ("pt", "error.internal", "Ocorreu um erro inesperado."),
    ("en", "error.internal", "An unexpected error occurred."),
];

#[derive(Clone)]
pub struct I18nStore {
    messages: Arc<HashMap<(&'static str, &'static str), &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let messages = MESSAGES
            .iter()
            .map(|(lang, key, text)| ((*lang, *key), *text))
            .collect();
        Self { messages: Arc::new(messages) }
    }

    /// Traduz a chave; cai para o português e, por fim, devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.messages
            .get(&(lang, key))
            .or_else(|| self.messages.get(&(DEFAULT_LANG, key)))
            .map(|m| m.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_known_language() {
        let store = I18nStore::new();
        assert_eq!(store.translate("en", "error.sale_not_found"), "Sale not found.");
        assert_eq!(store.translate("pt", "error.sale_not_found"), "Venda não encontrada.");
    }

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::new();
        assert_eq!(store.translate("fr", "error.client_not_found"), "Cliente não encontrado.");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.translate("pt", "error.nope"), "error.nope");
    }
}
