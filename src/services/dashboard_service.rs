// src/services/dashboard_service.rs

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use sqlx::PgPool;

use crate::{
    common::{clock::format_date_br, error::AppError},
    db::{InstallmentRepository, SaleRepository},
    models::{
        dashboard::{ClientRankingEntry, DashboardQuery, DashboardSummary, PaymentStatusSlice, SalesChartEntry},
        installment::{InstallmentStatus, InstallmentWithClient},
        sale::SaleWithClient,
    },
    services::status::to_view,
};

pub const DEFAULT_UPCOMING_DAYS: i64 = 7;
pub const TOP_CLIENTS_LIMIT: usize = 5;

/// Cards do dashboard.
///
/// `sales` já vem filtrada pelo período (métricas de receita); `installments` são
/// TODAS as parcelas do usuário. O status efetivo é calculado com `today`, então
/// pago + pendente + atrasado sempre fecha com o total a receber.
pub fn summarize(
    sales: &[SaleWithClient],
    installments: Vec<InstallmentWithClient>,
    today: NaiveDate,
    upcoming_days: i64,
) -> DashboardSummary {
    let window_end = today
        .checked_add_days(Days::new(upcoming_days.max(0) as u64))
        .unwrap_or(NaiveDate::MAX);

    let mut summary = DashboardSummary {
        total_revenue: sales.iter().map(|s| s.sale.total).sum(),
        total_sales: sales.len(),
        total_receivable: 0,
        total_paid: 0,
        total_pending: 0,
        total_overdue: 0,
        total_installments: installments.len(),
        paid_count: 0,
        pending_count: 0,
        overdue_count: 0,
        upcoming: Vec::new(),
        overdue: Vec::new(),
        payment_status: Vec::new(),
    };

    for row in installments {
        let view = to_view(row, today);
        let amount = view.row.installment.amount;
        let due = view.row.installment.due_date;
        summary.total_receivable += amount;

        match view.effective_status {
            InstallmentStatus::Paid => {
                summary.total_paid += amount;
                summary.paid_count += 1;
            }
            InstallmentStatus::Pending => {
                summary.total_pending += amount;
                summary.pending_count += 1;
                if due >= today && due <= window_end {
                    summary.upcoming.push(view);
                }
            }
            InstallmentStatus::Overdue => {
                summary.total_overdue += amount;
                summary.overdue_count += 1;
                summary.overdue.push(view);
            }
        }
    }

    // Próximos e atrasados: vencimento mais antigo primeiro
    summary.upcoming.sort_by_key(|v| (v.row.installment.due_date, v.row.installment.id));
    summary.overdue.sort_by_key(|v| (v.row.installment.due_date, v.row.installment.id));

    summary.payment_status = [
        (InstallmentStatus::Paid, summary.total_paid),
        (InstallmentStatus::Pending, summary.total_pending),
        (InstallmentStatus::Overdue, summary.total_overdue),
    ]
    .into_iter()
    .filter(|(_, value)| *value > 0)
    .map(|(status, value)| PaymentStatusSlice { status, value })
    .collect();

    summary
}

/// Vendas somadas por dia, em ordem cronológica (pela data, não pelo rótulo).
pub fn sales_chart(sales: &[SaleWithClient]) -> Vec<SalesChartEntry> {
    let mut per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for s in sales {
        *per_day.entry(s.sale.date).or_insert(0) += s.sale.total;
    }

    per_day
        .into_iter()
        .map(|(date, total)| SalesChartEntry {
            date,
            label: format_date_br(date),
            total,
        })
        .collect()
}

/// Ranking por valor comprado. Empates mantêm a ordem em que o cliente apareceu.
pub fn top_clients(sales: &[SaleWithClient], limit: usize) -> Vec<ClientRankingEntry> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut groups: Vec<(i64, String, i64, usize)> = Vec::new();

    for s in sales {
        let slot = *index.entry(s.sale.client_id).or_insert_with(|| {
            groups.push((s.sale.client_id, s.client_name.clone(), 0, 0));
            groups.len() - 1
        });
        groups[slot].2 += s.sale.total;
        groups[slot].3 += 1;
    }

    // sort_by é estável
    groups.sort_by(|a, b| b.2.cmp(&a.2));

    groups
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (client_id, client_name, total, count))| ClientRankingEntry {
            rank: i + 1,
            client_id,
            client_name,
            total,
            count,
        })
        .collect()
}

#[derive(Clone)]
pub struct DashboardService {
    sale_repo: SaleRepository,
    installment_repo: InstallmentRepository,
}

impl DashboardService {
    pub fn new(sale_repo: SaleRepository, installment_repo: InstallmentRepository) -> Self {
        Self { sale_repo, installment_repo }
    }

    async fn filtered_sales(
        &self,
        pool: &PgPool,
        user_id: i64,
        query: &DashboardQuery,
    ) -> Result<Vec<SaleWithClient>, AppError> {
        self.sale_repo
            .list_with_client(pool, user_id, None, query.start_date, query.end_date)
            .await
    }

    pub async fn get_summary(
        &self,
        pool: &PgPool,
        user_id: i64,
        query: &DashboardQuery,
        today: NaiveDate,
    ) -> Result<DashboardSummary, AppError> {
        let sales = self.filtered_sales(pool, user_id, query).await?;
        let installments = self.installment_repo.list_with_client(pool, user_id, None, None, None).await?;

        Ok(summarize(
            &sales,
            installments,
            today,
            query.upcoming_days.unwrap_or(DEFAULT_UPCOMING_DAYS),
        ))
    }

    pub async fn get_sales_chart(
        &self,
        pool: &PgPool,
        user_id: i64,
        query: &DashboardQuery,
    ) -> Result<Vec<SalesChartEntry>, AppError> {
        let sales = self.filtered_sales(pool, user_id, query).await?;
        Ok(sales_chart(&sales))
    }

    pub async fn get_top_clients(
        &self,
        pool: &PgPool,
        user_id: i64,
        query: &DashboardQuery,
    ) -> Result<Vec<ClientRankingEntry>, AppError> {
        let sales = self.filtered_sales(pool, user_id, query).await?;
        Ok(top_clients(&sales, TOP_CLIENTS_LIMIT))
    }
}

/// Resumo zerado (sem banco configurado)
pub fn empty_summary() -> DashboardSummary {
    summarize(&[], Vec::new(), NaiveDate::MIN, DEFAULT_UPCOMING_DAYS)
}
