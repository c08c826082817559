// src/db/installment_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::{
        collections::DueInstallmentRow,
        installment::{Installment, InstallmentStatus, InstallmentWithClient},
        sale::NewInstallment,
    },
};

const INSTALLMENT_COLUMNS: &str = r#"
    i.id, i.sale_id, i.number, i.due_date, i.amount, i.status, i.paid_at, i.contacted,
    i.created_at, i.updated_at
"#;

// Linha da parcela + cliente, usada pelas duas consultas compostas
const DUE_ROW_COLUMNS: &str = r#"
    c.id AS client_id, c.name AS client_name, c.phone AS client_phone,
    i.id AS installment_id, i.number AS installment_number, i.sale_id,
    i.due_date, i.amount, i.status, i.contacted
"#;

#[derive(Clone, Default)]
pub struct InstallmentRepository;

impl InstallmentRepository {
    pub fn new() -> Self {
        Self
    }

    /// Consulta composta: parcelas do usuário com o nome do cliente, vencimento desc.
    /// Filtros opcionais de cliente e intervalo (inclusivo) de vencimento.
    pub async fn list_with_client<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        client_id: Option<i64>,
        due_from: Option<NaiveDate>,
        due_to: Option<NaiveDate>,
    ) -> Result<Vec<InstallmentWithClient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {}, c.id AS client_id, c.name AS client_name
            FROM installments i
            INNER JOIN sales s ON s.id = i.sale_id
            INNER JOIN clients c ON c.id = s.client_id
            WHERE s.user_id = $1
              AND ($2::BIGINT IS NULL OR c.id = $2)
              AND ($3::DATE IS NULL OR i.due_date >= $3)
              AND ($4::DATE IS NULL OR i.due_date <= $4)
            ORDER BY i.due_date DESC, i.id DESC
            "#,
            INSTALLMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, InstallmentWithClient>(&sql)
            .bind(user_id)
            .bind(client_id)
            .bind(due_from)
            .bind(due_to)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Consulta composta: parcelas não pagas com vencimento em `[from, to]`, vencimento asc.
    pub async fn list_due_between<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DueInstallmentRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {}
            FROM installments i
            INNER JOIN sales s ON s.id = i.sale_id
            INNER JOIN clients c ON c.id = s.client_id
            WHERE s.user_id = $1
              AND i.status <> 'paid'
              AND i.due_date BETWEEN $2 AND $3
            ORDER BY i.due_date ASC, i.id ASC
            "#,
            DUE_ROW_COLUMNS
        );
        let rows = sqlx::query_as::<_, DueInstallmentRow>(&sql)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn list_by_sale<'e, E>(&self, executor: E, sale_id: i64) -> Result<Vec<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {} FROM installments i WHERE i.sale_id = $1 ORDER BY i.number",
            INSTALLMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Installment>(&sql)
            .bind(sale_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, user_id: i64, id: i64) -> Result<Option<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {}
            FROM installments i
            INNER JOIN sales s ON s.id = i.sale_id
            WHERE i.id = $1 AND s.user_id = $2
            "#,
            INSTALLMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, Installment>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Parcela com nome e telefone do cliente (envio de lembrete)
    pub async fn find_due_row<'e, E>(&self, executor: E, user_id: i64, id: i64) -> Result<Option<DueInstallmentRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {}
            FROM installments i
            INNER JOIN sales s ON s.id = i.sale_id
            INNER JOIN clients c ON c.id = s.client_id
            WHERE i.id = $1 AND s.user_id = $2
            "#,
            DUE_ROW_COLUMNS
        );
        let row = sqlx::query_as::<_, DueInstallmentRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn insert<'e, E>(&self, executor: E, sale_id: i64, installment: &NewInstallment) -> Result<Installment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let installment = sqlx::query_as::<_, Installment>(
            r#"
            INSERT INTO installments (sale_id, number, due_date, amount, status, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sale_id, number, due_date, amount, status, paid_at, contacted,
                      created_at, updated_at
            "#,
        )
        .bind(sale_id)
        .bind(installment.number)
        .bind(installment.due_date)
        .bind(installment.amount)
        .bind(installment.status)
        .bind(installment.paid_at)
        .fetch_one(executor)
        .await?;
        Ok(installment)
    }

    /// Grava status e `paid_at` juntos.
    /// Com `only_if_unpaid`, uma parcela já paga não é tocada (retorna `None`).
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        id: i64,
        status: InstallmentStatus,
        paid_at: Option<DateTime<Utc>>,
        only_if_unpaid: bool,
    ) -> Result<Option<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE installments i
            SET status = $3, paid_at = $4, updated_at = NOW()
            FROM sales s
            WHERE i.id = $1
              AND s.id = i.sale_id
              AND s.user_id = $2
              AND (NOT $5 OR i.status <> 'paid')
            RETURNING {}
            "#,
            INSTALLMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, Installment>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(status)
            .bind(paid_at)
            .bind(only_if_unpaid)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn set_contacted<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        id: i64,
        contacted: bool,
    ) -> Result<Option<Installment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE installments i
            SET contacted = $3, updated_at = NOW()
            FROM sales s
            WHERE i.id = $1 AND s.id = i.sale_id AND s.user_id = $2
            RETURNING {}
            "#,
            INSTALLMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, Installment>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(contacted)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn delete_by_sale<'e, E>(&self, executor: E, sale_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM installments WHERE sale_id = $1")
            .bind(sale_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
