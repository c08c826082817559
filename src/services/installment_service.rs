// src/services/installment_service.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::InstallmentRepository,
    models::installment::{
        Installment, InstallmentFilter, InstallmentStatus, InstallmentView, InstallmentWithClient, MarkPaidResponse,
    },
    services::status::{is_payment_reversal, matches_filter, plan_mark_paid, plan_status_update, to_view},
};

/// Aplica o status efetivo do dia, o filtro de status e a busca por nome do cliente.
/// A ordem de entrada (vencimento desc) é preservada.
pub fn filter_views(
    rows: Vec<InstallmentWithClient>,
    today: NaiveDate,
    filter: InstallmentFilter,
    search: Option<&str>,
) -> Vec<InstallmentView> {
    let needle = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    rows.into_iter()
        .map(|row| to_view(row, today))
        .filter(|view| matches_filter(view.effective_status, filter))
        .filter(|view| {
            needle
                .as_deref()
                .is_none_or(|n| view.row.client_name.to_lowercase().contains(n))
        })
        .collect()
}

#[derive(Clone)]
pub struct InstallmentService {
    repo: InstallmentRepository,
}

impl InstallmentService {
    pub fn new(repo: InstallmentRepository) -> Self {
        Self { repo }
    }

    pub async fn list_installments(
        &self,
        pool: &PgPool,
        user_id: i64,
        today: NaiveDate,
        filter: InstallmentFilter,
        search: Option<&str>,
    ) -> Result<Vec<InstallmentView>, AppError> {
        let rows = self.repo.list_with_client(pool, user_id, None, None, None).await?;
        Ok(filter_views(rows, today, filter, search))
    }

    /// Marca como paga. Chamadas repetidas não alteram o `paid_at` original.
    pub async fn mark_as_paid(
        &self,
        pool: &PgPool,
        user_id: i64,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<MarkPaidResponse, AppError> {
        let current = self.find(pool, user_id, id).await?;

        let Some(change) = plan_mark_paid(&current, now) else {
            return Ok(MarkPaidResponse { installment: current, changed: false });
        };

        match self
            .repo
            .update_status(pool, user_id, id, change.status, change.paid_at, true)
            .await?
        {
            Some(updated) => {
                tracing::info!("Parcela {} marcada como paga", id);
                Ok(MarkPaidResponse { installment: updated, changed: true })
            }
            // Outra requisição pagou entre a leitura e o UPDATE
            None => {
                let installment = self.find(pool, user_id, id).await?;
                Ok(MarkPaidResponse { installment, changed: false })
            }
        }
    }

    /// Correção manual de status. Sair de "pago" apaga o `paid_at` e fica registrado no log.
    pub async fn update_status(
        &self,
        pool: &PgPool,
        user_id: i64,
        id: i64,
        target: InstallmentStatus,
        now: DateTime<Utc>,
    ) -> Result<Installment, AppError> {
        let current = self.find(pool, user_id, id).await?;

        if is_payment_reversal(current.status, target) {
            tracing::warn!(
                "Parcela {} revertida de paga para {:?} (pagamento registrado em {:?} descartado)",
                id,
                target,
                current.paid_at
            );
        }

        let change = plan_status_update(target, now);
        self.repo
            .update_status(pool, user_id, id, change.status, change.paid_at, false)
            .await?
            .ok_or(AppError::InstallmentNotFound)
    }

    pub async fn set_contacted(&self, pool: &PgPool, user_id: i64, id: i64, contacted: bool) -> Result<Installment, AppError> {
        self.repo
            .set_contacted(pool, user_id, id, contacted)
            .await?
            .ok_or(AppError::InstallmentNotFound)
    }

    async fn find(&self, pool: &PgPool, user_id: i64, id: i64) -> Result<Installment, AppError> {
        self.repo
            .find_by_id(pool, user_id, id)
            .await?
            .ok_or(AppError::InstallmentNotFound)
    }
}
