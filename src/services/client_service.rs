// src/services/client_service.rs

use sqlx::{Executor, PgPool, Postgres};
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{ClientRepository, SaleRepository},
    models::client::{Client, ClientPayload, ClientSalesHistory},
};

#[derive(Clone)]
pub struct ClientService {
    repo: ClientRepository,
    sale_repo: SaleRepository,
}

impl ClientService {
    pub fn new(repo: ClientRepository, sale_repo: SaleRepository) -> Self {
        Self { repo, sale_repo }
    }

    pub async fn list_clients<'e, E>(&self, executor: E, user_id: i64) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list(executor, user_id).await
    }

    pub async fn get_client<'e, E>(&self, executor: E, user_id: i64, id: i64) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.find_by_id(executor, user_id, id).await?.ok_or(AppError::ClientNotFound)
    }

    pub async fn create_client<'e, E>(&self, executor: E, user_id: i64, payload: &ClientPayload) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        payload.validate()?;
        let client = self.repo.create(executor, user_id, payload).await?;
        tracing::info!("Cliente {} criado", client.id);
        Ok(client)
    }

    pub async fn update_client<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        id: i64,
        payload: &ClientPayload,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        payload.validate()?;
        self.repo
            .update(executor, user_id, id, payload)
            .await?
            .ok_or(AppError::ClientNotFound)
    }

    /// Cliente com vendas registradas não pode ser removido (`ClientHasSales`).
    pub async fn delete_client<'e, E>(&self, executor: E, user_id: i64, id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete(executor, user_id, id).await? {
            return Err(AppError::ClientNotFound);
        }
        tracing::info!("Cliente {} removido", id);
        Ok(())
    }

    pub async fn sales_history(&self, pool: &PgPool, user_id: i64, id: i64) -> Result<ClientSalesHistory, AppError> {
        let client = self.get_client(pool, user_id, id).await?;
        let sales = self.sale_repo.list_with_client(pool, user_id, Some(id), None, None).await?;

        Ok(ClientSalesHistory {
            sale_count: sales.len(),
            total_spent: sales.iter().map(|s| s.sale.total).sum(),
            client,
            sales,
        })
    }
}
