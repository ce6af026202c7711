// src/models/audit.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::db_utils::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    Logout,
    Create,
    Edit,
    Delete,
    Export,
    View,
    Purge,
}

// Módulos da aplicação (usados na bitácora e no mapa de acesso por cargo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "app_module", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppModule {
    Auth,
    Users,
    Inventory,
    Barcode,
    Sales,
    Purchases,
    Orders,
    Suppliers,
    Prices,
    Reports,
    Dashboard,
    Audit,
}

impl AppModule {
    pub const ALL: [AppModule; 12] = [
        AppModule::Auth,
        AppModule::Users,
        AppModule::Inventory,
        AppModule::Barcode,
        AppModule::Sales,
        AppModule::Purchases,
        AppModule::Orders,
        AppModule::Suppliers,
        AppModule::Prices,
        AppModule::Reports,
        AppModule::Dashboard,
        AppModule::Audit,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub username: String,
    pub action: AuditAction,
    pub module: AppModule,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Filtros da listagem
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AuditFilter {
    /// Parte do nome de usuário
    pub user: Option<String>,
    pub module: Option<AppModule>,
    pub action: Option<AuditAction>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total_events: i64,
    pub events_today: i64,
    pub distinct_users: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditListResponse {
    pub entries: Page<AuditEntry>,
    pub stats: AuditStats,
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PurgeQuery {
    /// Apaga eventos mais antigos que isto (padrão 90)
    #[validate(range(min = 1, max = 36500, message = "Informe entre 1 e 36500 dias."))]
    pub days: Option<i64>,
}

impl PurgeQuery {
    pub const DEFAULT_DAYS: i64 = 90;

    pub fn days(&self) -> i64 {
        self.days.unwrap_or(Self::DEFAULT_DAYS)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResult {
    pub days: i64,
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_defaults_to_ninety_days() {
        let query = PurgeQuery::default();
        assert!(query.validate().is_ok());
        assert_eq!(query.days(), 90);
    }

    #[test]
    fn purge_needs_at_least_one_day() {
        assert!(PurgeQuery { days: Some(0) }.validate().is_err());
        assert!(PurgeQuery { days: Some(1) }.validate().is_ok());
    }

    #[test]
    fn purge_days_fit_in_a_postgres_int() {
        assert!(PurgeQuery { days: Some(36_500) }.validate().is_ok());
        assert!(PurgeQuery { days: Some(36_501) }.validate().is_err());
        assert!(PurgeQuery { days: Some(i64::from(i32::MAX) + 1) }.validate().is_err());
    }
}
