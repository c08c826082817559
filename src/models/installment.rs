// src/models/installment.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Status persistido. O status exibido/agregado ("efetivo") é derivado em `services::status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "installment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Pending, // Pendente
    Paid,    // Pago
    Overdue, // Atrasado
}

impl InstallmentStatus {
    pub fn label_pt(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "Pendente",
            InstallmentStatus::Paid => "Pago",
            InstallmentStatus::Overdue => "Atrasado",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: i64,
    pub sale_id: i64,

    // Sequência 1-based dentro da venda
    pub number: i32,

    #[schema(example = "2024-04-10")]
    pub due_date: NaiveDate,

    // Centavos
    pub amount: i64,

    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub contacted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Parcela + cliente (consulta composta ordenada por vencimento desc)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentWithClient {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub installment: Installment,
    pub client_id: i64,
    pub client_name: String,
}

// O que a API devolve nas listagens: inclui o status efetivo do dia
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentView {
    #[serde(flatten)]
    pub row: InstallmentWithClient,
    pub effective_status: InstallmentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentFilter {
    All,
    Paid,
    Pending,
    Overdue,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentListQuery {
    pub status: Option<InstallmentFilter>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusPayload {
    pub status: InstallmentStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactedPayload {
    pub contacted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidResponse {
    pub installment: Installment,
    // `false` quando a parcela já estava paga (chamada repetida é um no-op)
    pub changed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub success: bool,
    pub message: String,
}
