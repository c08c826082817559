// src/models/client.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::sale::SaleWithClient;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,

    #[schema(ignore)]
    pub user_id: i64,

    #[schema(example = "João Silva")]
    pub name: String,

    #[schema(example = "(11) 98765-4321")]
    pub phone: Option<String>,

    pub whatsapp_enabled: bool,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Histórico de compras do cliente
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSalesHistory {
    pub client: Client,
    pub sales: Vec<SaleWithClient>,
    pub sale_count: usize,
    pub total_spent: i64,
}

// Usado tanto na criação quanto na edição (a edição substitui todos os campos)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_whatsapp_phone", skip_on_field_errors = false))]
pub struct ClientPayload {
    #[validate(length(min = 1, max = 255, message = "required"))]
    #[schema(example = "João Silva")]
    pub name: String,

    #[validate(length(max = 20, message = "phone_too_long"))]
    #[schema(example = "(11) 98765-4321")]
    pub phone: Option<String>,

    #[serde(default)]
    pub whatsapp_enabled: bool,

    pub notes: Option<String>,
}

impl ClientPayload {
    /// Telefone em branco é tratado como ausente.
    pub fn normalized_phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

fn validate_whatsapp_phone(payload: &ClientPayload) -> Result<(), ValidationError> {
    if payload.whatsapp_enabled && payload.normalized_phone().is_none() {
        let mut err = ValidationError::new("phone");
        err.message = Some("required_when_whatsapp_enabled".into());
        return Err(err);
    }
    Ok(())
}
