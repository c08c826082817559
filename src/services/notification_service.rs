// src/services/notification_service.rs
//
// Lembrete de parcela por WhatsApp. Falha no envio nunca desfaz nada no banco:
// o resultado volta para quem chamou como `success: false`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{
    common::{clock::format_date_br, error::AppError, http::external_client, money::format_brl},
    db::InstallmentRepository,
    models::{collections::DueInstallmentRow, installment::NotificationResponse},
};

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// `phone` já normalizado (só dígitos, com código do país).
    async fn send(&self, phone: &str, message: &str) -> bool;
}

/// Só dígitos; números locais (DDD + 8 ou 9 dígitos) ganham o código do país.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        0 => None,
        10 | 11 => Some(format!("{}{}", country_code, digits)),
        _ => Some(digits),
    }
}

pub fn installment_reminder(client_name: &str, number: i32, amount: i64, due_date: NaiveDate) -> String {
    format!(
        "Olá {}! 👋\n\n\
         Lembramos que a parcela #{} de {} vence em {}.\n\n\
         Favor realizar o pagamento para evitar atrasos.\n\n\
         Obrigado! 🙏",
        client_name,
        number,
        format_brl(amount),
        format_date_br(due_date)
    )
}

// --- Twilio (API REST de mensagens) ---

#[derive(Clone)]
pub struct TwilioWhatsAppGateway {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioWhatsAppGateway {
    pub fn new(account_sid: String, auth_token: String, from_number: String) -> anyhow::Result<Self> {
        Ok(Self {
            http: external_client()?,
            account_sid,
            auth_token,
            from_number,
        })
    }
}

#[async_trait]
impl NotificationGateway for TwilioWhatsAppGateway {
    async fn send(&self, phone: &str, message: &str) -> bool {
        let url = format!("{}/Accounts/{}/Messages.json", TWILIO_API_BASE, self.account_sid);
        let body = [
            ("From", format!("whatsapp:{}", self.from_number)),
            ("To", format!("whatsapp:+{}", phone)),
            ("Body", message.to_string()),
        ];

        let result = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!("[WhatsApp] Mensagem enviada para {}", phone);
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                tracing::error!("[WhatsApp] Twilio recusou o envio para {} (status {}): {}", phone, status, body);
                false
            }
            Err(e) => {
                tracing::error!("[WhatsApp] Erro ao enviar mensagem para {}: {}", phone, e);
                false
            }
        }
    }
}

/// Usado quando as credenciais do Twilio não estão configuradas.
#[derive(Clone, Default)]
pub struct DisabledGateway;

#[async_trait]
impl NotificationGateway for DisabledGateway {
    async fn send(&self, phone: &str, _message: &str) -> bool {
        tracing::warn!("[WhatsApp] Envio desabilitado (Twilio não configurado); destino {}", phone);
        false
    }
}

// --- Serviço ---

#[derive(Clone)]
pub struct NotificationService {
    repo: InstallmentRepository,
    gateway: Arc<dyn NotificationGateway>,
    country_code: String,
}

impl NotificationService {
    pub fn new(repo: InstallmentRepository, gateway: Arc<dyn NotificationGateway>, country_code: String) -> Self {
        Self { repo, gateway, country_code }
    }

    pub async fn notify_installment(&self, pool: &PgPool, user_id: i64, id: i64) -> Result<NotificationResponse, AppError> {
        let row = self
            .repo
            .find_due_row(pool, user_id, id)
            .await?
            .ok_or(AppError::InstallmentNotFound)?;

        dispatch(self.gateway.as_ref(), &row, &self.country_code).await
    }
}

/// Monta a mensagem e envia. Telefone ausente é erro de validação; falha do
/// provedor vira `success: false`.
pub async fn dispatch(
    gateway: &dyn NotificationGateway,
    row: &DueInstallmentRow,
    country_code: &str,
) -> Result<NotificationResponse, AppError> {
    let phone = row
        .client_phone
        .as_deref()
        .and_then(|raw| normalize_phone(raw, country_code))
        .ok_or(AppError::MissingPhone)?;

    let message = installment_reminder(&row.client_name, row.installment_number, row.amount, row.due_date);
    let success = gateway.send(&phone, &message).await;

    Ok(NotificationResponse {
        success,
        message: if success {
            "Notificação enviada!".to_string()
        } else {
            "Erro ao enviar notificação".to_string()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::installment::InstallmentStatus;
    use mockall::predicate::*;

    fn row(phone: Option<&str>) -> DueInstallmentRow {
        DueInstallmentRow {
            client_id: 1,
            client_name: "João Silva".to_string(),
            client_phone: phone.map(str::to_string),
            installment_id: 10,
            installment_number: 2,
            sale_id: 5,
            due_date: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
            amount: 15050,
            status: InstallmentStatus::Pending,
            contacted: false,
        }
    }

    #[test]
    fn twilio_gateway_is_built_with_timeout_client() {
        let gateway = TwilioWhatsAppGateway::new("AC123".to_string(), "token".to_string(), "+15550001".to_string());
        assert!(gateway.is_ok());
    }

    #[test]
    fn normalizes_local_numbers() {
        assert_eq!(normalize_phone("(11) 98765-4321", "55").as_deref(), Some("5511987654321"));
        assert_eq!(normalize_phone("11 8765-4321", "55").as_deref(), Some("551187654321"));
        assert_eq!(normalize_phone("+55 11 98765-4321", "55").as_deref(), Some("5511987654321"));
        assert_eq!(normalize_phone(" - ", "55"), None);
    }

    #[test]
    fn reminder_uses_brl_and_br_date() {
        let message = installment_reminder("João Silva", 2, 15050, NaiveDate::from_ymd_opt(2024, 4, 10).unwrap());

        assert!(message.starts_with("Olá João Silva!"));
        assert!(message.contains("parcela #2 de R$ 150,50"));
        assert!(message.contains("10/04/2024"));
    }

    #[tokio::test]
    async fn dispatch_sends_normalized_phone() {
        let mut gateway = MockNotificationGateway::new();
        gateway
            .expect_send()
            .with(eq("5511987654321"), function(|m: &str| m.contains("#2")))
            .times(1)
            .returning(|_, _| true);

        let response = dispatch(&gateway, &row(Some("(11) 98765-4321")), "55").await.unwrap();

        assert!(response.success);
        assert_eq!(response.message, "Notificação enviada!");
    }

    #[tokio::test]
    async fn gateway_failure_is_reported_not_raised() {
        let mut gateway = MockNotificationGateway::new();
        gateway.expect_send().times(1).returning(|_, _| false);

        let response = dispatch(&gateway, &row(Some("11987654321")), "55").await.unwrap();

        assert!(!response.success);
    }

    #[tokio::test]
    async fn missing_phone_is_a_validation_error() {
        let mut gateway = MockNotificationGateway::new();
        gateway.expect_send().times(0);

        let result = dispatch(&gateway, &row(None), "55").await;
        assert!(matches!(result, Err(AppError::MissingPhone)));

        let result = dispatch(&gateway, &row(Some("  ")), "55").await;
        assert!(matches!(result, Err(AppError::MissingPhone)));
    }

    #[tokio::test]
    async fn disabled_gateway_never_succeeds() {
        assert!(!DisabledGateway.send("5511987654321", "oi").await);
    }
}
