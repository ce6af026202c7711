// src/models/pricing.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_negative, validate_percentage};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPrice {
    pub id: Uuid,
    pub client_id: Uuid,
    pub product_id: Uuid,
    pub base_price: Decimal,
    pub iva_percent: Decimal,
    pub price_with_iva: Decimal,
    pub discount_percent: Decimal,
    pub final_price: Decimal,
    pub active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Preço com os nomes do cliente e do produto
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPriceView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub price: ClientPrice,
    pub client_name: String,
    pub product_code: String,
    pub product_name: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPriceHistory {
    pub id: Uuid,
    pub client_price_id: Uuid,
    pub previous_price: Decimal,
    pub new_price: Decimal,
    pub changed_by: Option<Uuid>,
    pub changed_by_name: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationResult {
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignPricePayload {
    pub client_id: Uuid,
    pub product_id: Uuid,

    #[validate(custom(function = "validate_not_negative"))]
    pub base_price: Decimal,

    /// Padrão: IVA configurado
    #[validate(custom(function = "validate_percentage"))]
    pub iva_percent: Option<Decimal>,

    #[validate(custom(function = "validate_percentage"))]
    #[serde(default)]
    pub discount_percent: Decimal,

    #[validate(length(max = 500, message = "O motivo deve ter no máximo 500 caracteres."))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatePricePayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_not_negative"))]
    pub base_price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_must_be_a_percentage() {
        let payload: AssignPricePayload = serde_json::from_str(
            r#"{"clientId": "00000000-0000-0000-0000-000000000001",
                "productId": "00000000-0000-0000-0000-000000000002",
                "basePrice": 1000, "discountPercent": 120}"#,
        )
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn discount_defaults_to_zero() {
        let payload: AssignPricePayload = serde_json::from_str(
            r#"{"clientId": "00000000-0000-0000-0000-000000000001",
                "productId": "00000000-0000-0000-0000-000000000002",
                "basePrice": 1000}"#,
        )
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.discount_percent, Decimal::ZERO);
        assert!(payload.iva_percent.is_none());
    }
}
