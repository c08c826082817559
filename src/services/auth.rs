// src/services/auth.rs
//
// Autenticação: uma lista ordenada de estratégias, montada a partir da configuração.
// A primeira que resolver um usuário vence; falhas caem para a próxima.

use std::sync::Arc;

use async_trait::async_trait;
use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    common::{error::AppError, http::external_client},
    db::UserRepository,
    models::auth::{AuthResponse, LoginUserPayload, RegisterUserPayload, SessionClaims, User},
};

pub const SESSION_COOKIE_NAME: &str = "app_session_id";
const SESSION_TTL_DAYS: i64 = 365;

// ---
// Acesso aos usuários (trait para poder testar as estratégias sem banco)
// ---

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn create_email_user(&self, open_id: &str, name: &str, email: &str, password_hash: &str) -> Result<User, AppError>;
    async fn upsert(
        &self,
        open_id: &str,
        name: Option<String>,
        email: Option<String>,
        login_method: &str,
    ) -> Result<User, AppError>;
    async fn touch_last_signed_in(&self, user_id: i64) -> Result<(), AppError>;
}

/// Diretório sobre o Postgres. Sem banco, leituras não encontram ninguém e
/// escritas falham com `DatabaseUnavailable`.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: Option<PgPool>,
    repo: UserRepository,
}

impl PgUserDirectory {
    pub fn new(pool: Option<PgPool>, repo: UserRepository) -> Self {
        Self { pool, repo }
    }

    fn write_pool(&self) -> Result<&PgPool, AppError> {
        self.pool.as_ref().ok_or(AppError::DatabaseUnavailable)
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>, AppError> {
        match &self.pool {
            Some(pool) => self.repo.find_by_open_id(pool, open_id).await,
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.pool {
            Some(pool) => self.repo.find_by_email(pool, email).await,
            None => Ok(None),
        }
    }

    async fn create_email_user(&self, open_id: &str, name: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        self.repo
            .create_email_user(self.write_pool()?, open_id, name, email, password_hash)
            .await
    }

    async fn upsert(
        &self,
        open_id: &str,
        name: Option<String>,
        email: Option<String>,
        login_method: &str,
    ) -> Result<User, AppError> {
        self.repo
            .upsert_by_open_id(self.write_pool()?, open_id, name.as_deref(), email.as_deref(), login_method)
            .await
    }

    async fn touch_last_signed_in(&self, user_id: i64) -> Result<(), AppError> {
        self.repo.touch_last_signed_in(self.write_pool()?, user_id).await
    }
}

// ---
// Provedor OAuth externo
// ---

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OAuthIdentity {
    #[serde(alias = "openId", alias = "sub")]
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` quando o provedor não reconhece o token.
    async fn identify(&self, token: &str) -> Result<Option<OAuthIdentity>, AppError>;
}

#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    server_url: String,
}

impl OAuthClient {
    pub fn new(server_url: String) -> anyhow::Result<Self> {
        Ok(Self {
            http: external_client()?,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for OAuthClient {
    async fn identify(&self, token: &str) -> Result<Option<OAuthIdentity>, AppError> {
        let resp = self
            .http
            .get(format!("{}/userinfo", self.server_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao consultar o provedor OAuth: {}", e))?;

        if !resp.status().is_success() {
            tracing::debug!("Provedor OAuth recusou o token (status {})", resp.status());
            return Ok(None);
        }

        let identity = resp
            .json::<OAuthIdentity>()
            .await
            .map_err(|e| anyhow::anyhow!("Resposta inválida do provedor OAuth: {}", e))?;
        Ok(Some(identity))
    }
}

// ---
// Estratégias
// ---

#[derive(Clone)]
pub enum AuthStrategy {
    /// Token do provedor externo, conferido em `{OAUTH_SERVER_URL}/userinfo`.
    /// Nossos próprios JWTs de sessão nunca são enviados ao provedor.
    OAuth(Arc<dyn IdentityProvider>),
    /// JWT de sessão; o usuário precisa existir
    EmailPassword,
    /// JWT de sessão; cria o usuário se ainda não existir (desenvolvimento)
    LocalDev,
}

impl AuthStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            AuthStrategy::OAuth(_) => "oauth",
            AuthStrategy::EmailPassword => "email",
            AuthStrategy::LocalDev => "local",
        }
    }
}

/// `[OAuth?, EmailPassword, LocalDev?]`
pub fn build_strategies(oauth: Option<Arc<dyn IdentityProvider>>, local_auth_enabled: bool) -> Vec<AuthStrategy> {
    let mut strategies = Vec::with_capacity(3);
    if let Some(provider) = oauth {
        strategies.push(AuthStrategy::OAuth(provider));
    }
    strategies.push(AuthStrategy::EmailPassword);
    if local_auth_enabled {
        strategies.push(AuthStrategy::LocalDev);
    }
    strategies
}

/// Identidades do provedor ficam em um namespace próprio, sem colidir com `email_`/`local_`
pub fn oauth_open_id(provider_id: &str) -> String {
    format!("oauth_{}", provider_id.trim())
}

pub fn email_open_id(email: &str) -> String {
    format!("email_{}", email.trim().to_lowercase())
}

pub fn local_open_id(name: &str) -> String {
    let slug: Vec<String> = name.split_whitespace().map(str::to_lowercase).collect();
    format!("local_{}", slug.join("_"))
}

#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    strategies: Vec<AuthStrategy>,
    jwt_secret: String,
    app_id: String,
}

impl AuthService {
    pub fn new(directory: Arc<dyn UserDirectory>, strategies: Vec<AuthStrategy>, jwt_secret: String, app_id: String) -> Self {
        Self { directory, strategies, jwt_secret, app_id }
    }

    pub fn local_auth_enabled(&self) -> bool {
        self.strategies.iter().any(|s| matches!(s, AuthStrategy::LocalDev))
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        let email = payload.email.trim().to_lowercase();
        if self.directory.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        // Hashing fora do runtime assíncrono
        let password_clone = payload.password.clone();
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let name = payload.name.trim();
        let user = self
            .directory
            .create_email_user(&email_open_id(&email), name, &email, &hashed_password)
            .await?;

        tracing::info!("Usuário {} registrado por e-mail", user.id);
        self.session_response(user)
    }

    pub async fn login_user(&self, payload: &LoginUserPayload) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        let email = payload.email.trim().to_lowercase();
        let user = self
            .directory
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let Some(password_hash) = user.password_hash.clone() else {
            // Conta criada por OAuth/login local: não tem senha
            return Err(AppError::InvalidCredentials);
        };

        let password_clone = payload.password.clone();
        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.directory.touch_last_signed_in(user.id).await?;
        self.session_response(user)
    }

    pub async fn local_login(&self, name: Option<&str>) -> Result<AuthResponse, AppError> {
        if !self.local_auth_enabled() {
            return Err(AppError::LocalAuthDisabled);
        }

        let name = name.map(str::trim).filter(|n| !n.is_empty()).ok_or_else(|| AppError::invalid("name", "required"))?;
        let user = self
            .directory
            .upsert(&local_open_id(name), Some(name.to_string()), None, "local")
            .await?;

        tracing::info!("[LocalAuth] Login local de {}", user.open_id);
        self.session_response(user)
    }

    /// Tenta cada estratégia na ordem configurada.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        for strategy in &self.strategies {
            match self.try_strategy(strategy, token).await {
                Ok(Some(user)) => return Ok(user),
                Ok(None) => {}
                Err(e) => tracing::debug!("Estratégia {} falhou: {}", strategy.name(), e),
            }
        }
        Err(AppError::InvalidToken)
    }

    async fn try_strategy(&self, strategy: &AuthStrategy, token: &str) -> Result<Option<User>, AppError> {
        match strategy {
            AuthStrategy::OAuth(provider) => {
                // JWT assinado por nós é sessão local: fica com as outras estratégias
                if self.verify_session_token(token).is_ok() {
                    return Ok(None);
                }
                let Some(identity) = provider.identify(token).await? else {
                    return Ok(None);
                };
                if identity.open_id.trim().is_empty() {
                    return Ok(None);
                }
                let user = self
                    .directory
                    .upsert(&oauth_open_id(&identity.open_id), identity.name, identity.email, "oauth")
                    .await?;
                Ok(Some(user))
            }
            AuthStrategy::EmailPassword => {
                let claims = self.verify_session_token(token)?;
                let user = self
                    .directory
                    .find_by_open_id(&claims.open_id)
                    .await?
                    .ok_or(AppError::UserNotFound)?;
                self.directory.touch_last_signed_in(user.id).await?;
                Ok(Some(user))
            }
            AuthStrategy::LocalDev => {
                let claims = self.verify_session_token(token)?;
                if let Some(user) = self.directory.find_by_open_id(&claims.open_id).await? {
                    return Ok(Some(user));
                }
                let name = Some(claims.name).filter(|n| !n.is_empty());
                let user = self.directory.upsert(&claims.open_id, name, None, "local").await?;
                Ok(Some(user))
            }
        }
    }

    pub fn create_session_token(&self, open_id: &str, name: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(SESSION_TTL_DAYS);

        let claims = SessionClaims {
            open_id: open_id.to_string(),
            app_id: self.app_id.clone(),
            name: name.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    pub fn verify_session_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<SessionClaims>(token, &DecodingKey::from_secret(self.jwt_secret.as_ref()), &validation)
            .map_err(|_| AppError::InvalidToken)?
            .claims;

        if claims.open_id.is_empty() || claims.app_id.is_empty() {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    fn session_response(&self, user: User) -> Result<AuthResponse, AppError> {
        let token = self.create_session_token(&user.open_id, user.name.as_deref().unwrap_or_default())?;
        Ok(AuthResponse { token, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use mockall::predicate::*;

    fn user(id: i64, open_id: &str) -> User {
        let now = Utc::now();
        User {
            id,
            open_id: open_id.to_string(),
            name: Some("Maria".to_string()),
            email: None,
            password_hash: None,
            login_method: None,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
            last_signed_in: now,
        }
    }

    fn service(directory: MockUserDirectory, strategies: Vec<AuthStrategy>) -> AuthService {
        AuthService::new(Arc::new(directory), strategies, "segredo-de-teste".to_string(), "local-dev".to_string())
    }

    #[test]
    fn strategy_order_follows_configuration() {
        let provider: Arc<dyn IdentityProvider> = Arc::new(MockIdentityProvider::new());

        let names: Vec<&str> = build_strategies(Some(provider), true).iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["oauth", "email", "local"]);

        let names: Vec<&str> = build_strategies(None, false).iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["email"]);
    }

    #[test]
    fn open_ids_are_stable() {
        assert_eq!(email_open_id(" Maria@Email.com "), "email_maria@email.com");
        assert_eq!(oauth_open_id("abc-123"), "oauth_abc-123");
        assert_eq!(local_open_id("  Dev  Local "), "local_dev_local");
    }

    #[test]
    fn session_token_round_trips_and_rejects_other_secret() {
        let auth = service(MockUserDirectory::new(), build_strategies(None, false));
        let token = auth.create_session_token("email_maria@email.com", "Maria").unwrap();

        let claims = auth.verify_session_token(&token).unwrap();
        assert_eq!(claims.open_id, "email_maria@email.com");
        assert_eq!(claims.app_id, "local-dev");
        assert_eq!(claims.name, "Maria");

        let other = AuthService::new(
            Arc::new(MockUserDirectory::new()),
            Vec::new(),
            "outro-segredo".to_string(),
            "local-dev".to_string(),
        );
        assert!(matches!(other.verify_session_token(&token), Err(AppError::InvalidToken)));
        assert!(matches!(auth.verify_session_token("lixo"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn email_strategy_requires_existing_user() {
        let mut directory = MockUserDirectory::new();
        directory.expect_find_by_open_id().returning(|_| Ok(None));
        directory.expect_upsert().times(0);

        let auth = service(directory, build_strategies(None, false));
        let token = auth.create_session_token("email_ninguem@email.com", "").unwrap();

        assert!(matches!(auth.authenticate(&token).await, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn local_strategy_creates_missing_user() {
        let mut directory = MockUserDirectory::new();
        directory.expect_find_by_open_id().returning(|_| Ok(None));
        directory
            .expect_upsert()
            .with(eq("local_dev"), eq(Some("dev".to_string())), eq(None::<String>), eq("local"))
            .times(1)
            .returning(|open_id, _, _, _| Ok(user(9, open_id)));

        let auth = service(directory, build_strategies(None, true));
        let token = auth.create_session_token("local_dev", "dev").unwrap();

        let resolved = auth.authenticate(&token).await.unwrap();
        assert_eq!(resolved.id, 9);
    }

    #[tokio::test]
    async fn session_token_is_never_sent_to_oauth_provider() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_identify().times(0);

        let mut directory = MockUserDirectory::new();
        directory
            .expect_find_by_open_id()
            .with(eq("email_maria@email.com"))
            .returning(|open_id| Ok(Some(user(3, open_id))));
        directory.expect_touch_last_signed_in().with(eq(3i64)).returning(|_| Ok(()));

        let auth = service(directory, build_strategies(Some(Arc::new(provider)), false));
        let token = auth.create_session_token("email_maria@email.com", "Maria").unwrap();

        assert_eq!(auth.authenticate(&token).await.unwrap().id, 3);
    }

    #[tokio::test]
    async fn oauth_identity_is_upserted() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_identify().returning(|_| {
            Ok(Some(OAuthIdentity {
                open_id: "123".to_string(),
                name: Some("Maria".to_string()),
                email: None,
            }))
        });

        let mut directory = MockUserDirectory::new();
        directory
            .expect_upsert()
            .with(eq("oauth_123"), always(), always(), eq("oauth"))
            .times(1)
            .returning(|open_id, _, _, _| Ok(user(5, open_id)));

        let auth = service(directory, build_strategies(Some(Arc::new(provider)), false));
        assert_eq!(auth.authenticate("token-do-provedor").await.unwrap().id, 5);
    }

    #[tokio::test]
    async fn unknown_token_is_checked_with_oauth_provider() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_identify()
            .with(eq("token-opaco"))
            .times(1)
            .returning(|_| Ok(None));

        let auth = service(MockUserDirectory::new(), build_strategies(Some(Arc::new(provider)), false));
        assert!(matches!(auth.authenticate("token-opaco").await, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn oauth_identity_cannot_take_over_email_account() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_identify().returning(|_| {
            Ok(Some(OAuthIdentity {
                open_id: "email_vitima@email.com".to_string(),
                name: None,
                email: None,
            }))
        });

        let mut directory = MockUserDirectory::new();
        directory
            .expect_upsert()
            .with(eq("oauth_email_vitima@email.com"), always(), always(), eq("oauth"))
            .times(1)
            .returning(|open_id, _, _, _| Ok(user(7, open_id)));
        directory.expect_find_by_open_id().times(0);

        let auth = service(directory, build_strategies(Some(Arc::new(provider)), false));
        let resolved = auth.authenticate("token-do-provedor").await.unwrap();
        assert_eq!(resolved.open_id, "oauth_email_vitima@email.com");
    }

    #[test]
    fn oauth_client_trims_trailing_slash() {
        let client = OAuthClient::new("https://oauth.exemplo.com/".to_string()).unwrap();
        assert_eq!(client.server_url, "https://oauth.exemplo.com");
    }

    #[tokio::test]
    async fn local_login_is_rejected_when_disabled() {
        let auth = service(MockUserDirectory::new(), build_strategies(None, false));
        assert!(matches!(auth.local_login(Some("dev")).await, Err(AppError::LocalAuthDisabled)));
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_invalid_credentials() {
        let hashed = hash("senha-certa", 4).unwrap();
        let mut directory = MockUserDirectory::new();
        directory.expect_find_by_email().returning(move |_| {
            let mut u = user(1, "email_maria@email.com");
            u.password_hash = Some(hashed.clone());
            Ok(Some(u))
        });
        directory.expect_touch_last_signed_in().times(0);

        let auth = service(directory, build_strategies(None, false));
        let payload = LoginUserPayload {
            email: "maria@email.com".to_string(),
            password: "senha-errada".to_string(),
        };

        assert!(matches!(auth.login_user(&payload).await, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn register_rejects_taken_email() {
        let mut directory = MockUserDirectory::new();
        directory
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(1, "email_maria@email.com"))));
        directory.expect_create_email_user().times(0);

        let auth = service(directory, build_strategies(None, false));
        let payload = RegisterUserPayload {
            name: "Maria".to_string(),
            email: "Maria@Email.com".to_string(),
            password: "123456".to_string(),
        };

        assert!(matches!(auth.register_user(&payload).await, Err(AppError::EmailAlreadyExists)));
    }
}
