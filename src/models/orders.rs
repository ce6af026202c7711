// src/models/orders.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_negative, validate_percentage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    Client,   // Ordem de compra do cliente (OC)
    Supplier, // Ordem ao fornecedor (OP)
}

impl OrderKind {
    pub fn prefix(self) -> &'static str {
        match self {
            OrderKind::Client => "OC",
            OrderKind::Supplier => "OP",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            OrderKind::Client => "ORDEN DE COMPRA",
            OrderKind::Supplier => "ORDEN A PROVEEDOR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_final(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        !self.is_final() && self != next
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pendiente",
            OrderStatus::Approved => "Aprobada",
            OrderStatus::Completed => "Completada",
            OrderStatus::Cancelled => "Cancelada",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,
    #[schema(example = "OC-2025-0001")]
    pub number: String,
    pub kind: OrderKind,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: String,
    pub supplier_address: Option<String>,
    pub supplier_phone: Option<String>,
    pub issue_date: NaiveDate,
    pub client_order_number: Option<String>,
    pub client_branch: Option<String>,
    pub subtotal: Decimal,
    pub iva_percent: Decimal,
    pub iva: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub prepared_by: Option<Uuid>,
    pub verified_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub description: String,
    pub quantity: Decimal,
    #[schema(example = "UND")]
    pub unit: String,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub prepared_by_name: Option<String>,
    pub verified_by_name: Option<String>,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub kind: Option<OrderKind>,
    /// Número, fornecedor ou número de ordem do cliente
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCounts {
    pub total: i64,
    pub pending: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderListResponse {
    pub orders: Vec<PurchaseOrder>,
    pub counts: OrderCounts,
}

// ---
// Payloads
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinePayload {
    /// Linhas sem descrição ou sem quantidade são ignoradas
    #[serde(default)]
    pub description: String,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub quantity: Decimal,

    pub unit: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    /// Só vale na criação; a edição mantém o tipo
    pub kind: OrderKind,

    /// Fornecedor do cadastro. Sem ele, `supplierName` é obrigatório.
    pub supplier_id: Option<Uuid>,
    #[validate(length(max = 200, message = "O nome do fornecedor deve ter no máximo 200 caracteres."))]
    pub supplier_name: Option<String>,
    pub supplier_address: Option<String>,
    pub supplier_phone: Option<String>,

    pub issue_date: Option<NaiveDate>,
    pub client_order_number: Option<String>,
    pub client_branch: Option<String>,

    #[validate(custom(function = "validate_percentage"))]
    pub iva_percent: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub discount: Decimal,

    pub notes: Option<String>,

    #[validate(nested)]
    #[serde(default)]
    pub lines: Vec<OrderLinePayload>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderStatusPayload {
    pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_payload_defaults() {
        let payload: OrderPayload = serde_json::from_str(
            r#"{"kind": "CLIENT", "supplierName": "Oficinas SAS",
                "lines": [{"description": "Silla", "quantity": 2, "unitPrice": 100}, {}]}"#,
        )
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.discount, Decimal::ZERO);
        assert_eq!(payload.lines[1].description, "");
        assert!(payload.lines[1].unit.is_none());
    }

    #[test]
    fn negative_line_values_fail() {
        let payload: OrderPayload = serde_json::from_str(
            r#"{"kind": "SUPPLIER", "lines": [{"description": "Silla", "quantity": -1, "unitPrice": 100}]}"#,
        )
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn final_statuses_are_locked() {
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Approved));
    }

    #[test]
    fn open_orders_move_freely() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Approved));
        assert!(OrderStatus::Approved.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::Approved.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn prefixes_per_kind() {
        assert_eq!(OrderKind::Client.prefix(), "OC");
        assert_eq!(OrderKind::Supplier.prefix(), "OP");
    }
}
