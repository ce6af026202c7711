// src/models/dashboard.rs

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    /// Intervalo [início, fim] em dias, terminando sempre em `today`.
    pub fn range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            Period::Today => today,
            Period::Week => today - Duration::days(today.weekday().num_days_from_monday() as i64),
            Period::Month => today.with_day(1).unwrap_or(today),
            Period::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        };
        (start, today)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Cop,
    Usd,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    pub period: Option<Period>,
    pub currency: Option<Currency>,
}

// 1. Cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub period: Period,
    pub currency: Currency,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub active_users: i64,
    pub purchases_count: i64,
    pub purchases_total: Decimal,
    pub sales_count: i64,
    pub sales_total: Decimal,
    pub gross_margin: Decimal,
    pub margin_percent: Decimal,
    pub critical_stock: i64,
    pub low_stock: i64,
    pub pending_orders: i64,
    pub top_products: Vec<TopProductEntry>,
    pub top_clients: Vec<TopClientEntry>,
    pub monthly_sales: Vec<MonthlySalesEntry>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    pub product_id: Uuid,
    pub product_name: String,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopClientEntry {
    pub client_id: Uuid,
    pub client_name: String,
    pub sales_count: i64,
    pub total: Decimal,
}

// 3. Gráfico mensal (mês sem vendas vem com zero)
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySalesEntry {
    pub year: i32,
    pub month: i32,
    pub total: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub count: i64,
    pub total: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportsOverview {
    pub products: i64,
    pub inventory_value: Decimal,
    pub clients: i64,
    pub suppliers: i64,
    pub sales_count: i64,
    pub sales_total: Decimal,
    pub purchases_count: i64,
    pub purchases_total: Decimal,
    pub orders_count: i64,
    pub orders_total: Decimal,
    pub pending_orders: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_monday() {
        // 2025-03-13 é quinta-feira
        let (start, end) = Period::Week.range(date(2025, 3, 13));
        assert_eq!(start, date(2025, 3, 10));
        assert_eq!(end, date(2025, 3, 13));

        let (start, _) = Period::Week.range(date(2025, 3, 10));
        assert_eq!(start, date(2025, 3, 10));
    }

    #[test]
    fn month_and_year_ranges() {
        assert_eq!(Period::Month.range(date(2025, 3, 13)).0, date(2025, 3, 1));
        assert_eq!(Period::Year.range(date(2025, 3, 13)).0, date(2025, 1, 1));
        assert_eq!(Period::Today.range(date(2025, 3, 13)).0, date(2025, 3, 13));
    }

    #[test]
    fn defaults_are_month_and_cop() {
        let q = DashboardQuery::default();
        assert_eq!(q.period.unwrap_or_default(), Period::Month);
        assert_eq!(q.currency.unwrap_or_default(), Currency::Cop);
    }
}
