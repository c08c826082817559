// src/db/user_repo.rs

use sqlx::{Executor, Postgres};

use crate::{common::error::AppError, models::auth::User};

const USER_COLUMNS: &str = r#"
    id, open_id, name, email, password_hash, login_method, role,
    created_at, updated_at, last_signed_in
"#;

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone, Default)]
pub struct UserRepository;

impl UserRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_open_id<'e, E>(&self, executor: E, open_id: &str) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM users WHERE open_id = $1", USER_COLUMNS);
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(open_id)
            .fetch_optional(executor)
            .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu e-mail
    pub async fn find_by_email<'e, E>(&self, executor: E, email: &str) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let maybe_user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(maybe_user)
    }

    // Cria um usuário de e-mail/senha.
    // Com tratamento de erro específico para e-mails duplicados.
    pub async fn create_email_user<'e, E>(
        &self,
        executor: E,
        open_id: &str,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO users (open_id, name, email, password_hash, login_method)
            VALUES ($1, $2, $3, $4, 'email')
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(open_id)
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .fetch_one(executor)
            .await
            .map_err(map_unique_violation)
    }

    /// Cria ou atualiza o usuário identificado por `open_id` (OAuth e login local)
    /// e registra o acesso em `last_signed_in`.
    pub async fn upsert_by_open_id<'e, E>(
        &self,
        executor: E,
        open_id: &str,
        name: Option<&str>,
        email: Option<&str>,
        login_method: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO users (open_id, name, email, login_method)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (open_id) DO UPDATE SET
                name = COALESCE(EXCLUDED.name, users.name),
                email = COALESCE(EXCLUDED.email, users.email),
                login_method = EXCLUDED.login_method,
                last_signed_in = NOW(),
                updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(open_id)
            .bind(name)
            .bind(email)
            .bind(login_method)
            .fetch_one(executor)
            .await
            .map_err(map_unique_violation)
    }

    pub async fn touch_last_signed_in<'e, E>(&self, executor: E, user_id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET last_signed_in = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            // O open_id de contas de e-mail é derivado do próprio e-mail
            if let Some("users_email_key" | "users_open_id_key") = db_err.constraint() {
                return AppError::EmailAlreadyExists;
            }
        }
    }
    e.into()
}
