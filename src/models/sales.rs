// src/models/sales.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_blank, validate_not_negative, validate_percentage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sale_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Completed,
    Annulled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    #[schema(example = "900123456-7")]
    pub document: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    #[schema(example = "VEN-2025-0001")]
    pub number: String,
    pub client_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub iva_percent: Decimal,
    pub iva: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub seller_id: Option<Uuid>,
    pub annulled_by: Option<Uuid>,
    pub annulled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Venda com os nomes já resolvidos, usada em listagens e PDFs
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub sale: Sale,
    pub client_name: Option<String>,
    pub client_document: Option<String>,
    pub seller_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub summary: SaleSummary,
    pub lines: Vec<SaleLine>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SaleFilter {
    /// Número, nome ou documento do cliente
    pub search: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleStats {
    pub completed_count: i64,
    pub completed_total: Decimal,
    pub today_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleListResponse {
    pub sales: Vec<SaleSummary>,
    pub stats: SaleStats,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub day: NaiveDate,
    pub count: i64,
    pub total: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub total: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub stats: SaleStats,
    pub daily: Vec<DailySales>,
    pub top_products: Vec<ProductSales>,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."), custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(length(min = 1, max = 50, message = "O documento é obrigatório."), custom(function = "validate_not_blank"))]
    pub document: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLinePayload {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que 0."))]
    pub quantity: i32,

    /// Preço do cadastro quando ausente
    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    pub client_id: Option<Uuid>,

    #[validate(length(min = 1, message = "Adicione pelo menos um produto."), nested)]
    pub lines: Vec<SaleLinePayload>,

    /// Padrão configurado (19%) quando ausente
    #[validate(custom(function = "validate_percentage"))]
    pub iva_percent: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub discount: Decimal,

    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClientFilter {
    /// Nome, documento ou e-mail
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_needs_lines() {
        let payload: CreateSalePayload = serde_json::from_str(r#"{"lines": []}"#).unwrap();
        assert!(payload.validate().unwrap_err().field_errors().contains_key("lines"));
    }

    #[test]
    fn well_formed_sale_passes() {
        let payload: CreateSalePayload = serde_json::from_str(
            r#"{"lines": [{"productId": "7b0b1f8e-6c1d-4f5e-9a38-0d7d7e3c9d11", "quantity": 2, "unitPrice": 1500}], "discount": 100}"#,
        )
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.lines[0].quantity, 2);
    }

    #[test]
    fn sale_lines_are_validated() {
        let payload: CreateSalePayload = serde_json::from_str(
            r#"{"lines": [{"productId": "7b0b1f8e-6c1d-4f5e-9a38-0d7d7e3c9d11", "quantity": 0}], "ivaPercent": 19}"#,
        )
        .unwrap();
        assert!(payload.validate().is_err());
        assert_eq!(payload.discount, Decimal::ZERO);
    }

    #[test]
    fn iva_percent_is_bounded() {
        let payload: CreateSalePayload = serde_json::from_str(
            r#"{"lines": [{"productId": "7b0b1f8e-6c1d-4f5e-9a38-0d7d7e3c9d11", "quantity": 2}], "ivaPercent": 120}"#,
        )
        .unwrap();
        assert!(payload.validate().unwrap_err().field_errors().contains_key("iva_percent"));
    }

    #[test]
    fn client_email_is_optional_but_checked() {
        let ok: ClientPayload = serde_json::from_str(r#"{"name": "Oficinas SAS", "document": "900123"}"#).unwrap();
        assert!(ok.validate().is_ok());
        let bad: ClientPayload =
            serde_json::from_str(r#"{"name": "Oficinas SAS", "document": "900123", "email": "x"}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}
