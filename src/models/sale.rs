// src/models/sale.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::common::money::MoneyInput;
use crate::models::installment::{Installment, InstallmentStatus};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Cash,        // À vista
    Installment, // Parcelado
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,

    #[schema(ignore)]
    pub user_id: i64,

    pub client_id: i64,
    pub date: NaiveDate,

    // Centavos
    #[schema(example = 15050)]
    pub total: i64,

    pub payment_type: PaymentType,
    pub installment_count: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Venda com o nome do cliente (listagens, ranking, relatórios)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleWithClient {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub sale: Sale,
    pub client_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub sale_id: i64,

    #[schema(example = "Jogo de panelas")]
    pub description: String,

    // Preço unitário em centavos
    pub price: i64,
    pub quantity: i32,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: SaleWithClient,
    pub products: Vec<Product>,
    pub installments: Vec<Installment>,
}

// --- Linhas prontas para inserir (já validadas, em centavos) ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub description: String,
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstallment {
    pub number: i32,
    pub due_date: NaiveDate,
    pub amount: i64,
    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[schema(example = "Jogo de panelas")]
    pub description: String,

    // Em reais: 150.5 ou "150,50"
    pub price: MoneyInput,

    #[serde(default = "default_quantity")]
    #[schema(example = 1)]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentPayload {
    // Quando ausente, usa a posição na lista (1, 2, 3...)
    pub number: Option<i32>,

    #[schema(example = "2024-04-10")]
    pub due_date: NaiveDate,

    pub amount: MoneyInput,
}

// Validado por `sale_service::build_sale_plan`, que junta todos os erros por campo
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    pub client_id: i64,

    #[schema(example = "2024-03-10")]
    pub date: NaiveDate,

    pub payment_type: PaymentType,

    pub products: Vec<ProductPayload>,

    // Obrigatório para vendas parceladas; proibido para vendas à vista
    pub installments: Option<Vec<InstallmentPayload>>,

    // Opcional: se enviado, precisa bater com a soma dos produtos
    pub total: Option<MoneyInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedSaleResponse {
    pub id: i64,
}

// Prévia de distribuição das parcelas enquanto o usuário edita o formulário
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub total: MoneyInput,

    // `null` = parcela ainda vazia
    pub amounts: Vec<Option<MoneyInput>>,

    // Índice (0-based) da parcela editada por último
    pub edited_index: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub amounts: Vec<i64>,
    pub allocated: i64,
    pub remaining: i64,
    pub balanced: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleListQuery {
    pub client_id: Option<i64>,
}
