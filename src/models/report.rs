// src/models/report.rs

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

// Filtros da exportação. Vendas filtram pela data da venda; parcelas pelo vencimento.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub client_id: Option<i64>,
}

impl ReportQuery {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| date >= start) && self.end_date.is_none_or(|end| date <= end)
    }
}
