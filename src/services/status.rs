// src/services/status.rs
//
// Status efetivo da parcela. Nada aqui lê o relógio: `today`/`now` vêm de quem chama,
// calculados uma única vez por requisição a partir do `BusinessClock`.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::installment::{
    Installment, InstallmentFilter, InstallmentStatus, InstallmentView, InstallmentWithClient,
};

/// pago continua pago; vencida antes de hoje é atrasada; o resto é pendente.
pub fn derive_status(stored: InstallmentStatus, due_date: NaiveDate, today: NaiveDate) -> InstallmentStatus {
    match stored {
        InstallmentStatus::Paid => InstallmentStatus::Paid,
        _ if due_date < today => InstallmentStatus::Overdue,
        _ => InstallmentStatus::Pending,
    }
}

pub fn effective_status(installment: &Installment, today: NaiveDate) -> InstallmentStatus {
    derive_status(installment.status, installment.due_date, today)
}

pub fn to_view(row: InstallmentWithClient, today: NaiveDate) -> InstallmentView {
    let effective_status = effective_status(&row.installment, today);
    InstallmentView { row, effective_status }
}

pub fn matches_filter(status: InstallmentStatus, filter: InstallmentFilter) -> bool {
    match filter {
        InstallmentFilter::All => true,
        InstallmentFilter::Paid => status == InstallmentStatus::Paid,
        InstallmentFilter::Pending => status == InstallmentStatus::Pending,
        InstallmentFilter::Overdue => status == InstallmentStatus::Overdue,
    }
}

/// Alteração a ser gravada numa parcela: novo status e o `paid_at` correspondente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

/// "Marcar como paga". `None` quando já está paga: a segunda chamada não muda nada
/// e o `paid_at` original é preservado.
pub fn plan_mark_paid(current: &Installment, now: DateTime<Utc>) -> Option<StatusChange> {
    if current.status == InstallmentStatus::Paid {
        return None;
    }
    Some(StatusChange {
        status: InstallmentStatus::Paid,
        paid_at: Some(now),
    })
}

/// Correção manual de status: `paid_at` só existe quando o alvo é pago.
pub fn plan_status_update(target: InstallmentStatus, now: DateTime<Utc>) -> StatusChange {
    StatusChange {
        status: target,
        paid_at: (target == InstallmentStatus::Paid).then_some(now),
    }
}

/// Reverter uma parcela paga apaga o registro do pagamento.
pub fn is_payment_reversal(current: InstallmentStatus, target: InstallmentStatus) -> bool {
    current == InstallmentStatus::Paid && target != InstallmentStatus::Paid
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn installment(status: InstallmentStatus, paid_at: Option<DateTime<Utc>>) -> Installment {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Installment {
            id: 1,
            sale_id: 1,
            number: 1,
            due_date: date(2024, 1, 1),
            amount: 1000,
            status,
            paid_at,
            contacted: false,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn pending_past_due_is_overdue() {
        let status = derive_status(InstallmentStatus::Pending, date(2024, 1, 1), date(2024, 1, 10));
        assert_eq!(status, InstallmentStatus::Overdue);
    }

    #[test]
    fn due_today_is_still_pending() {
        let status = derive_status(InstallmentStatus::Pending, date(2024, 1, 10), date(2024, 1, 10));
        assert_eq!(status, InstallmentStatus::Pending);
    }

    #[test]
    fn paid_stays_paid_regardless_of_due_date() {
        for due in [date(2020, 1, 1), date(2024, 1, 10), date(2030, 1, 1)] {
            assert_eq!(derive_status(InstallmentStatus::Paid, due, date(2024, 1, 10)), InstallmentStatus::Paid);
        }
    }

    #[test]
    fn stored_overdue_with_future_due_date_is_pending() {
        // Status gravado "overdue" por correção manual, mas o vencimento foi adiado
        let status = derive_status(InstallmentStatus::Overdue, date(2024, 2, 1), date(2024, 1, 10));
        assert_eq!(status, InstallmentStatus::Pending);
    }

    #[test]
    fn mark_paid_twice_keeps_first_timestamp() {
        let first_call = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
        let second_call = Utc.with_ymd_and_hms(2024, 1, 6, 10, 0, 0).unwrap();

        let pending = installment(InstallmentStatus::Pending, None);
        let change = plan_mark_paid(&pending, first_call).unwrap();
        assert_eq!(change.status, InstallmentStatus::Paid);
        assert_eq!(change.paid_at, Some(first_call));

        let paid = installment(change.status, change.paid_at);
        assert_eq!(plan_mark_paid(&paid, second_call), None);
        assert_eq!(paid.paid_at, Some(first_call));
    }

    #[test]
    fn status_update_sets_paid_at_only_for_paid() {
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();

        assert_eq!(plan_status_update(InstallmentStatus::Paid, now).paid_at, Some(now));
        assert_eq!(plan_status_update(InstallmentStatus::Pending, now).paid_at, None);
        assert_eq!(plan_status_update(InstallmentStatus::Overdue, now).paid_at, None);
    }

    #[test]
    fn detects_payment_reversal() {
        assert!(is_payment_reversal(InstallmentStatus::Paid, InstallmentStatus::Pending));
        assert!(!is_payment_reversal(InstallmentStatus::Paid, InstallmentStatus::Paid));
        assert!(!is_payment_reversal(InstallmentStatus::Pending, InstallmentStatus::Paid));
    }

    #[test]
    fn filter_uses_effective_status() {
        assert!(matches_filter(InstallmentStatus::Overdue, InstallmentFilter::Overdue));
        assert!(matches_filter(InstallmentStatus::Paid, InstallmentFilter::All));
        assert!(!matches_filter(InstallmentStatus::Pending, InstallmentFilter::Overdue));
    }
}
