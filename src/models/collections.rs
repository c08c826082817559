// src/models/collections.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::installment::InstallmentStatus;

pub const DEFAULT_DAYS_AHEAD: i64 = 7;

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionsQuery {
    #[validate(range(min = 1, max = 30, message = "days_ahead_out_of_range"))]
    pub days_ahead: Option<i64>,

    // Busca por nome do cliente (aplicada depois do agrupamento)
    pub search: Option<String>,
}

// Linha da consulta composta "parcelas a vencer em N dias com cliente", ordenada por vencimento asc
#[derive(Debug, Clone, FromRow)]
pub struct DueInstallmentRow {
    pub client_id: i64,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub installment_id: i64,
    pub installment_number: i32,
    pub sale_id: i64,
    pub due_date: NaiveDate,
    pub amount: i64,
    pub status: InstallmentStatus,
    pub contacted: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub installment_id: i64,
    pub installment_number: i32,
    pub sale_id: i64,
    pub due_date: NaiveDate,
    pub amount: i64,
    pub contacted: bool,
    pub days_until_due: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientCollectionGroup {
    pub client_id: i64,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub installments: Vec<CollectionItem>,

    pub total_count: usize,
    pub total_amount: i64,
    pub contacted_count: usize,
    pub not_contacted_count: usize,

    // Recalculado a cada requisição, nunca persistido
    pub fully_contacted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionsOverview {
    pub days_ahead: i64,
    pub today: NaiveDate,
    pub window_end: NaiveDate,

    pub total_count: usize,
    pub total_amount: i64,
    pub contacted_count: usize,
    pub not_contacted_count: usize,

    pub clients: Vec<ClientCollectionGroup>,
}
