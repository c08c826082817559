// src/models/dashboard.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::installment::{InstallmentStatus, InstallmentView};

// Filtro por data da venda (só afeta as métricas de receita)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 0, max = 365, message = "out_of_range"))]
    pub upcoming_days: Option<i64>,
}

// 1. Resumo (os cards do topo). Valores em centavos.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_revenue: i64,
    pub total_sales: usize,

    // Todas as parcelas, sem filtro de data
    pub total_receivable: i64,
    pub total_paid: i64,
    pub total_pending: i64,
    pub total_overdue: i64,

    pub total_installments: usize,
    pub paid_count: usize,
    pub pending_count: usize,
    pub overdue_count: usize,

    pub upcoming: Vec<InstallmentView>,
    pub overdue: Vec<InstallmentView>,
    pub payment_status: Vec<PaymentStatusSlice>,
}

// Fatia do gráfico de pizza; fatias zeradas são omitidas
#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct PaymentStatusSlice {
    pub status: InstallmentStatus,
    pub value: i64,
}

// 2. Gráfico de vendas por dia
#[derive(Debug, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesChartEntry {
    pub date: NaiveDate,
    // dd/mm/aaaa
    pub label: String,
    pub total: i64,
}

// 3. Ranking de clientes (top 5)
#[derive(Debug, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientRankingEntry {
    pub rank: usize,
    pub client_id: i64,
    pub client_name: String,
    pub total: i64,
    pub count: usize,
}
