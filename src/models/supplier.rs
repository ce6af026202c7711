// src/models/supplier.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{common::validation::validate_not_blank, models::purchase::OriginKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "supplier_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplierStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    #[schema(example = "900123456-1")]
    pub nit: Option<String>,
    pub kind: OriginKind,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub contact_name: Option<String>,
    pub status: SupplierStatus,
    pub notes: Option<String>,
    pub registered_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SupplierFilter {
    /// Nome, NIT ou e-mail
    pub search: Option<String>,
    pub status: Option<SupplierStatus>,
    pub kind: Option<OriginKind>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierCounts {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub national: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierListResponse {
    pub suppliers: Vec<Supplier>,
    pub counts: SupplierCounts,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."), custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(length(max = 50, message = "O NIT deve ter no máximo 50 caracteres."))]
    pub nit: Option<String>,

    #[serde(default = "default_kind")]
    pub kind: OriginKind,

    pub address: Option<String>,
    pub phone: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub contact_name: Option<String>,

    #[serde(default)]
    pub status: SupplierStatus,

    pub notes: Option<String>,
}

fn default_kind() -> OriginKind {
    OriginKind::National
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SupplierStatusPayload {
    pub status: SupplierStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_active_national() {
        let payload: SupplierPayload = serde_json::from_str(r#"{"name": "Maderas del Norte"}"#).unwrap();
        assert_eq!(payload.kind, OriginKind::National);
        assert_eq!(payload.status, SupplierStatus::Active);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn blank_name_and_bad_email_fail() {
        let payload: SupplierPayload =
            serde_json::from_str(r#"{"name": " ", "email": "sin-arroba"}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("email"));
    }
}
