// src/models/purchase.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_blank, validate_not_negative, validate_percentage};

// Origem de compras e fornecedores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "origin_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OriginKind {
    National,
    International,
}

impl OriginKind {
    pub fn label(self) -> &'static str {
        match self {
            OriginKind::National => "Nacional",
            OriginKind::International => "Internacional",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub supplier: String,
    pub supplier_id: Option<Uuid>,
    #[schema(example = "FE-10293")]
    pub invoice_number: String,
    pub kind: OriginKind,
    pub product: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub iva_percent: Decimal,
    pub subtotal: Decimal,
    pub iva: Decimal,
    pub total: Decimal,
    pub purchase_date: NaiveDate,
    pub notes: Option<String>,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub document_path: Option<String>,
    pub registered_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    pub fn has_document(&self) -> bool {
        self.document_path.is_some()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseView {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub has_document: bool,
}

impl From<Purchase> for PurchaseView {
    fn from(purchase: Purchase) -> Self {
        Self { has_document: purchase.has_document(), purchase }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PurchaseFilter {
    /// Fornecedor, fatura ou produto
    pub search: Option<String>,
    pub kind: Option<OriginKind>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPurchases {
    pub supplier: String,
    pub count: i64,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTotals {
    pub count: i64,
    pub amount: Decimal,
    pub national: i64,
    pub international: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReport {
    #[serde(flatten)]
    pub totals: PurchaseTotals,
    pub top_suppliers: Vec<SupplierPurchases>,
}

// Cadastro e edição. Os totais são sempre recalculados.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePayload {
    #[validate(length(min = 1, max = 200, message = "O fornecedor é obrigatório."), custom(function = "validate_not_blank"))]
    pub supplier: String,

    pub supplier_id: Option<Uuid>,

    #[validate(length(min = 1, max = 50, message = "O número da fatura é obrigatório."), custom(function = "validate_not_blank"))]
    pub invoice_number: String,

    pub kind: OriginKind,

    #[validate(length(min = 1, max = 200, message = "O produto é obrigatório."), custom(function = "validate_not_blank"))]
    pub product: String,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que 0."))]
    pub quantity: i32,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Decimal,

    #[validate(custom(function = "validate_percentage"))]
    pub iva_percent: Option<Decimal>,

    /// Hoje quando ausente
    pub purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_payload_rules() {
        let payload: PurchasePayload = serde_json::from_str(
            r#"{"supplier": "Maderas SAS", "invoiceNumber": "FE-1", "kind": "NATIONAL",
                "product": "Tablero", "quantity": 0, "unitPrice": 10}"#,
        )
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("quantity"));
        assert!(payload.iva_percent.is_none());
    }

    #[test]
    fn view_flags_document() {
        let json = serde_json::json!({
            "id": Uuid::nil(), "supplier": "Maderas SAS", "supplierId": null, "invoiceNumber": "FE-1",
            "kind": "INTERNATIONAL", "product": "Tablero", "quantity": 1, "unitPrice": 10,
            "ivaPercent": 19, "subtotal": 10, "iva": 1.9, "total": 11.9, "purchaseDate": "2025-01-02",
            "notes": null, "registeredBy": null,
            "createdAt": "2025-01-02T00:00:00Z", "updatedAt": "2025-01-02T00:00:00Z"
        });
        let mut purchase: Purchase = serde_json::from_value(json).unwrap();
        purchase.document_path = Some("FE-1_factura.pdf".into());
        let view = serde_json::to_value(PurchaseView::from(purchase)).unwrap();
        assert_eq!(view["hasDocument"], true);
        assert!(view.get("documentPath").is_none());
        assert_eq!(view["kind"], "INTERNATIONAL");
    }
}
