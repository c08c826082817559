// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::{clock::BusinessClock, i18n::I18nStore},
    db::{ClientRepository, InstallmentRepository, SaleRepository, UserRepository},
    services::{
        auth::{build_strategies, AuthService, IdentityProvider, OAuthClient, PgUserDirectory},
        client_service::ClientService,
        collections_service::CollectionsService,
        dashboard_service::DashboardService,
        document_service::DocumentService,
        installment_service::InstallmentService,
        notification_service::{DisabledGateway, NotificationGateway, NotificationService, TwilioWhatsAppGateway},
        sale_service::SaleService,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub whatsapp_number: String,
}

// Configuração lida das variáveis de ambiente (.env)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub business_utc_offset_hours: i32,
    pub app_id: String,
    pub oauth_server_url: Option<String>,
    pub local_auth_enabled: bool,
    pub twilio: Option<TwilioSettings>,
    pub default_country_code: String,
    pub report_fonts_dir: String,
    pub report_font_family: String,
    pub cookie_secure: bool,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de busca (facilita os testes).
    /// Valores vazios contam como ausentes.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse().with_context(|| format!("DB_MAX_CONNECTIONS inválido: {}", v))?,
            None => 5,
        };

        let business_utc_offset_hours: i32 = match get("BUSINESS_UTC_OFFSET_HOURS") {
            Some(v) => v.parse().with_context(|| format!("BUSINESS_UTC_OFFSET_HOURS inválido: {}", v))?,
            None => -3,
        };
        if !(-23..=23).contains(&business_utc_offset_hours) {
            anyhow::bail!("BUSINESS_UTC_OFFSET_HOURS fora do intervalo: {}", business_utc_offset_hours);
        }

        let twilio = match (
            get("TWILIO_ACCOUNT_SID"),
            get("TWILIO_AUTH_TOKEN"),
            get("TWILIO_WHATSAPP_NUMBER"),
        ) {
            (Some(account_sid), Some(auth_token), Some(whatsapp_number)) => Some(TwilioSettings {
                account_sid,
                auth_token,
                whatsapp_number,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            jwt_secret,
            server_addr: get("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections,
            business_utc_offset_hours,
            app_id: get("APP_ID").unwrap_or_else(|| "local-dev".to_string()),
            oauth_server_url: get("OAUTH_SERVER_URL"),
            local_auth_enabled: parse_flag(get("LOCAL_AUTH_ENABLED").as_deref()),
            twilio,
            default_country_code: get("DEFAULT_COUNTRY_CODE").unwrap_or_else(|| "55".to_string()),
            report_fonts_dir: get("REPORT_FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
            report_font_family: get("REPORT_FONT_FAMILY").unwrap_or_else(|| "Roboto".to_string()),
            cookie_secure: parse_flag(get("COOKIE_SECURE").as_deref()),
        })
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    // `None` quando DATABASE_URL não está configurada
    pub db_pool: Option<PgPool>,
    pub settings: Arc<Settings>,
    pub clock: BusinessClock,
    pub i18n_store: I18nStore,

    pub auth_service: AuthService,
    pub client_service: ClientService,
    pub sale_service: SaleService,
    pub installment_service: InstallmentService,
    pub dashboard_service: DashboardService,
    pub collections_service: CollectionsService,
    pub notification_service: NotificationService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = Settings::from_env()?;

        let db_pool = match &settings.database_url {
            Some(database_url) => {
                // Conecta ao banco de dados, usando '?' para propagar erros
                let pool = PgPoolOptions::new()
                    .max_connections(settings.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
                Some(pool)
            }
            None => {
                tracing::warn!("⚠️ DATABASE_URL não definida: leituras retornam vazio e escritas falham");
                None
            }
        };

        Self::build(settings, db_pool)
    }

    /// Monta o gráfico de dependências
    pub fn build(settings: Settings, db_pool: Option<PgPool>) -> anyhow::Result<Self> {
        // O intervalo do offset já foi validado em `Settings::from_lookup`
        let clock = BusinessClock::from_utc_offset_hours(settings.business_utc_offset_hours).unwrap_or_default();

        let client_repo = ClientRepository::new();
        let sale_repo = SaleRepository::new();
        let installment_repo = InstallmentRepository::new();

        let oauth: Option<Arc<dyn IdentityProvider>> = match settings.oauth_server_url.clone() {
            Some(url) => Some(Arc::new(OAuthClient::new(url)?) as Arc<dyn IdentityProvider>),
            None => None,
        };
        let strategies = build_strategies(oauth, settings.local_auth_enabled);
        tracing::info!(
            "Estratégias de autenticação: {:?}",
            strategies.iter().map(|s| s.name()).collect::<Vec<_>>()
        );

        let auth_service = AuthService::new(
            Arc::new(PgUserDirectory::new(db_pool.clone(), UserRepository::new())),
            strategies,
            settings.jwt_secret.clone(),
            settings.app_id.clone(),
        );

        let gateway: Arc<dyn NotificationGateway> = match &settings.twilio {
            Some(twilio) => Arc::new(TwilioWhatsAppGateway::new(
                twilio.account_sid.clone(),
                twilio.auth_token.clone(),
                twilio.whatsapp_number.clone(),
            )?),
            None => {
                tracing::warn!("Twilio não configurado: lembretes por WhatsApp desabilitados");
                Arc::new(DisabledGateway)
            }
        };

        Ok(Self {
            client_service: ClientService::new(client_repo.clone(), sale_repo.clone()),
            sale_service: SaleService::new(sale_repo.clone(), client_repo.clone(), installment_repo.clone(), clock),
            installment_service: InstallmentService::new(installment_repo.clone()),
            dashboard_service: DashboardService::new(sale_repo.clone(), installment_repo.clone()),
            collections_service: CollectionsService::new(installment_repo.clone()),
            notification_service: NotificationService::new(
                installment_repo.clone(),
                gateway,
                settings.default_country_code.clone(),
            ),
            document_service: DocumentService::new(
                sale_repo,
                installment_repo,
                client_repo,
                settings.report_fonts_dir.clone(),
                settings.report_font_family.clone(),
            ),
            auth_service,
            clock,
            i18n_store: I18nStore::new(),
            settings: Arc::new(settings),
            db_pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let s = settings(&[("JWT_SECRET", "segredo")]).unwrap();

        assert_eq!(s.database_url, None);
        assert_eq!(s.server_addr, "0.0.0.0:3000");
        assert_eq!(s.db_max_connections, 5);
        assert_eq!(s.business_utc_offset_hours, -3);
        assert_eq!(s.app_id, "local-dev");
        assert!(!s.local_auth_enabled);
        assert_eq!(s.twilio, None);
        assert_eq!(s.default_country_code, "55");
        assert_eq!(s.report_fonts_dir, "./fonts");
        assert_eq!(s.report_font_family, "Roboto");
        assert!(!s.cookie_secure);
    }

    #[test]
    fn jwt_secret_is_required() {
        assert!(settings(&[]).is_err());
        assert!(settings(&[("JWT_SECRET", "   ")]).is_err());
    }

    #[test]
    fn twilio_needs_all_three_keys() {
        let partial = settings(&[
            ("JWT_SECRET", "segredo"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "tok"),
        ])
        .unwrap();
        assert_eq!(partial.twilio, None);

        let full = settings(&[
            ("JWT_SECRET", "segredo"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "tok"),
            ("TWILIO_WHATSAPP_NUMBER", "+14155238886"),
        ])
        .unwrap();
        assert_eq!(full.twilio.unwrap().whatsapp_number, "+14155238886");
    }

    #[test]
    fn parses_flags_and_numbers() {
        let s = settings(&[
            ("JWT_SECRET", "segredo"),
            ("LOCAL_AUTH_ENABLED", "TRUE"),
            ("COOKIE_SECURE", "1"),
            ("BUSINESS_UTC_OFFSET_HOURS", "0"),
            ("DB_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();

        assert!(s.local_auth_enabled);
        assert!(s.cookie_secure);
        assert_eq!(s.business_utc_offset_hours, 0);
        assert_eq!(s.db_max_connections, 12);
    }

    #[test]
    fn rejects_invalid_numbers() {
        assert!(settings(&[("JWT_SECRET", "segredo"), ("DB_MAX_CONNECTIONS", "muitas")]).is_err());
        assert!(settings(&[("JWT_SECRET", "segredo"), ("BUSINESS_UTC_OFFSET_HOURS", "30")]).is_err());
    }
}
