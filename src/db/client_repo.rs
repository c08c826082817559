// src/db/client_repo.rs

use sqlx::{Executor, Postgres};

use crate::{
    common::{db_utils::foreign_key_violation, error::AppError},
    models::client::{Client, ClientPayload},
};

const CLIENT_COLUMNS: &str = "id, user_id, name, phone, whatsapp_enabled, notes, created_at, updated_at";

#[derive(Clone, Default)]
pub struct ClientRepository;

impl ClientRepository {
    pub fn new() -> Self {
        Self
    }

    /// Lista os clientes do usuário, mais recentes primeiro
    pub async fn list<'e, E>(&self, executor: E, user_id: i64) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM clients WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            CLIENT_COLUMNS
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(user_id)
            .fetch_all(executor)
            .await?;
        Ok(clients)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, user_id: i64, id: i64) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {} FROM clients WHERE id = $1 AND user_id = $2", CLIENT_COLUMNS);
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(client)
    }

    pub async fn create<'e, E>(&self, executor: E, user_id: i64, payload: &ClientPayload) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO clients (user_id, name, phone, whatsapp_enabled, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        );
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(user_id)
            .bind(payload.name.trim())
            .bind(payload.normalized_phone())
            .bind(payload.whatsapp_enabled)
            .bind(payload.notes.as_deref())
            .fetch_one(executor)
            .await?;
        Ok(client)
    }

    // A edição substitui todos os campos
    pub async fn update<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        id: i64,
        payload: &ClientPayload,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE clients
            SET name = $3, phone = $4, whatsapp_enabled = $5, notes = $6, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        );
        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(payload.name.trim())
            .bind(payload.normalized_phone())
            .bind(payload.whatsapp_enabled)
            .bind(payload.notes.as_deref())
            .fetch_optional(executor)
            .await?;
        Ok(client)
    }

    /// Remove o cliente. Retorna `false` se não existia.
    /// Clientes com vendas são protegidos pela FK `sales_client_id_fkey` (RESTRICT).
    pub async fn delete<'e, E>(&self, executor: E, user_id: i64, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(executor)
            .await
            .map_err(|e| match foreign_key_violation(&e).as_deref() {
                Some("sales_client_id_fkey") => AppError::ClientHasSales,
                _ => e.into(),
            })?;
        Ok(result.rows_affected() > 0)
    }
}
