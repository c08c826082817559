// src/services/collections_service.rs
//
// Tela de cobrança: parcelas pendentes que vencem nos próximos N dias, agrupadas por cliente.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::InstallmentRepository,
    models::{
        collections::{ClientCollectionGroup, CollectionItem, CollectionsOverview, DueInstallmentRow, DEFAULT_DAYS_AHEAD},
        installment::InstallmentStatus,
    },
    services::status::derive_status,
};

pub fn window_end(today: NaiveDate, days_ahead: i64) -> NaiveDate {
    today
        .checked_add_days(Days::new(days_ahead.max(0) as u64))
        .unwrap_or(NaiveDate::MAX)
}

/// Agrupa as parcelas por cliente na ordem em que aparecem (vencimento asc).
///
/// As estatísticas globais são calculadas antes da busca; a busca só esconde grupos.
pub fn build_collections(
    rows: Vec<DueInstallmentRow>,
    today: NaiveDate,
    days_ahead: i64,
    search: Option<&str>,
) -> CollectionsOverview {
    let end = window_end(today, days_ahead);

    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut clients: Vec<ClientCollectionGroup> = Vec::new();

    let due_rows = rows.into_iter().filter(|row| {
        derive_status(row.status, row.due_date, today) == InstallmentStatus::Pending
            && row.due_date >= today
            && row.due_date <= end
    });

    for row in due_rows {
        let slot = *index.entry(row.client_id).or_insert_with(|| {
            clients.push(ClientCollectionGroup {
                client_id: row.client_id,
                client_name: row.client_name.clone(),
                client_phone: row.client_phone.clone(),
                installments: Vec::new(),
                total_count: 0,
                total_amount: 0,
                contacted_count: 0,
                not_contacted_count: 0,
                fully_contacted: false,
            });
            clients.len() - 1
        });

        let group = &mut clients[slot];
        group.total_count += 1;
        group.total_amount += row.amount;
        if row.contacted {
            group.contacted_count += 1;
        } else {
            group.not_contacted_count += 1;
        }
        group.installments.push(CollectionItem {
            installment_id: row.installment_id,
            installment_number: row.installment_number,
            sale_id: row.sale_id,
            due_date: row.due_date,
            amount: row.amount,
            contacted: row.contacted,
            days_until_due: (row.due_date - today).num_days(),
        });
    }

    for group in &mut clients {
        group.fully_contacted = group.total_count > 0 && group.not_contacted_count == 0;
    }

    let total_count = clients.iter().map(|g| g.total_count).sum();
    let total_amount = clients.iter().map(|g| g.total_amount).sum();
    let contacted_count = clients.iter().map(|g| g.contacted_count).sum();
    let not_contacted_count = clients.iter().map(|g| g.not_contacted_count).sum();

    if let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let needle = needle.to_lowercase();
        clients.retain(|g| g.client_name.to_lowercase().contains(&needle));
    }

    CollectionsOverview {
        days_ahead,
        today,
        window_end: end,
        total_count,
        total_amount,
        contacted_count,
        not_contacted_count,
        clients,
    }
}

#[derive(Clone)]
pub struct CollectionsService {
    installment_repo: InstallmentRepository,
}

impl CollectionsService {
    pub fn new(installment_repo: InstallmentRepository) -> Self {
        Self { installment_repo }
    }

    pub async fn overview(
        &self,
        pool: Option<&PgPool>,
        user_id: i64,
        today: NaiveDate,
        days_ahead: Option<i64>,
        search: Option<&str>,
    ) -> Result<CollectionsOverview, AppError> {
        let days_ahead = days_ahead.unwrap_or(DEFAULT_DAYS_AHEAD);

        let rows = match pool {
            Some(pool) => {
                self.installment_repo
                    .list_due_between(pool, user_id, today, window_end(today, days_ahead))
                    .await?
            }
            None => Vec::new(),
        };

        Ok(build_collections(rows, today, days_ahead, search))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(id: i64, client_id: i64, client_name: &str, due: NaiveDate, contacted: bool) -> DueInstallmentRow {
        DueInstallmentRow {
            client_id,
            client_name: client_name.to_string(),
            client_phone: Some("11987654321".to_string()),
            installment_id: id,
            installment_number: 1,
            sale_id: id,
            due_date: due,
            amount: 1000,
            status: InstallmentStatus::Pending,
            contacted,
        }
    }

    #[test]
    fn window_includes_last_day_and_excludes_next() {
        let today = date(2024, 3, 1);
        let rows = vec![
            row(1, 1, "João Silva", date(2024, 3, 8), false),
            row(2, 1, "João Silva", date(2024, 3, 9), false),
        ];

        let overview = build_collections(rows, today, 7, None);

        assert_eq!(overview.window_end, date(2024, 3, 8));
        assert_eq!(overview.total_count, 1);
        assert_eq!(overview.clients[0].installments[0].installment_id, 1);
        assert_eq!(overview.clients[0].installments[0].days_until_due, 7);
    }

    #[test]
    fn groups_by_client_in_first_encounter_order() {
        let today = date(2024, 3, 1);
        let rows = vec![
            row(1, 2, "Maria Souza", date(2024, 3, 2), true),
            row(2, 1, "João Silva", date(2024, 3, 3), false),
            row(3, 2, "Maria Souza", date(2024, 3, 4), true),
            row(4, 1, "João Silva", date(2024, 3, 5), true),
        ];

        let overview = build_collections(rows, today, 7, None);

        assert_eq!(overview.clients.len(), 2);
        let maria = &overview.clients[0];
        assert_eq!(maria.client_name, "Maria Souza");
        assert_eq!(maria.total_count, 2);
        assert_eq!(maria.total_amount, 2000);
        assert!(maria.fully_contacted);

        let joao = &overview.clients[1];
        assert_eq!(joao.contacted_count, 1);
        assert_eq!(joao.not_contacted_count, 1);
        assert!(!joao.fully_contacted);

        assert_eq!(overview.total_count, 4);
        assert_eq!(overview.contacted_count, 3);
        assert_eq!(overview.not_contacted_count, 1);
    }

    #[test]
    fn search_filters_groups_after_global_stats() {
        let today = date(2024, 3, 1);
        let rows = vec![
            row(1, 1, "João Silva", date(2024, 3, 2), false),
            row(2, 2, "Maria Souza", date(2024, 3, 3), false),
        ];

        let overview = build_collections(rows, today, 7, Some("jo"));

        assert_eq!(overview.clients.len(), 1);
        assert_eq!(overview.clients[0].client_name, "João Silva");
        assert_eq!(overview.total_count, 2);
        assert_eq!(overview.total_amount, 2000);
    }

    #[test]
    fn overdue_and_paid_rows_are_skipped() {
        let today = date(2024, 3, 10);
        let mut paid = row(2, 1, "João Silva", date(2024, 3, 12), false);
        paid.status = InstallmentStatus::Paid;
        let rows = vec![row(1, 1, "João Silva", date(2024, 3, 9), false), paid];

        let overview = build_collections(rows, today, 7, None);

        assert!(overview.clients.is_empty());
        assert_eq!(overview.total_count, 0);
    }
}
