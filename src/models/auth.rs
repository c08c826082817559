// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    // Identificador estável da sessão (OAuth, "email_<email>" ou "local_<nome>")
    pub open_id: String,

    pub name: Option<String>,
    pub email: Option<String>,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: Option<String>,

    pub login_method: Option<String>,
    pub role: UserRole,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_signed_in: DateTime<Utc>,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria da Silva")]
    pub name: String,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "maria@email.com")]
    pub email: String,

    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "invalid_email"))]
    pub email: String,

    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

// Login de desenvolvimento (só quando LOCAL_AUTH_ENABLED=true)
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LocalLoginPayload {
    #[schema(example = "dev")]
    pub name: Option<String>,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Estrutura de dados ("claims") dentro do JWT de sessão
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub open_id: String,
    pub app_id: String,
    pub name: String,
    pub exp: usize,
    pub iat: usize,
}
