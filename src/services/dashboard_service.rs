// src/services/dashboard_service.rs

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};

use crate::{
    common::{error::AppError, money::round_money},
    db::dashboard_repo::DashboardRepository,
    models::dashboard::{
        Currency, DashboardQuery, DashboardSummary, MonthlySalesEntry, ReportsOverview,
    },
};

pub const CHART_MONTHS: u32 = 6;

/// Primeiro dia do mês `months_back` meses antes de `today`.
pub fn month_start(today: NaiveDate, months_back: u32) -> NaiveDate {
    let index = today.year() * 12 + today.month0() as i32 - months_back as i32;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1).unwrap_or(today)
}

/// Últimos `CHART_MONTHS` meses em ordem, com zero onde não houve venda.
pub fn fill_months(today: NaiveDate, rows: &[MonthlySalesEntry]) -> Vec<MonthlySalesEntry> {
    (0..CHART_MONTHS)
        .rev()
        .map(|back| {
            let start = month_start(today, back);
            let (year, month) = (start.year(), start.month() as i32);
            let total = rows
                .iter()
                .find(|r| r.year == year && r.month == month)
                .map_or(Decimal::ZERO, |r| r.total);
            MonthlySalesEntry { year, month, total }
        })
        .collect()
}

/// Converte um valor em COP para a moeda pedida.
pub fn convert(amount: Decimal, currency: Currency, usd_rate: Decimal) -> Decimal {
    match currency {
        Currency::Cop => amount,
        Currency::Usd if usd_rate > Decimal::ZERO => round_money(amount / usd_rate),
        Currency::Usd => Decimal::ZERO,
    }
}

/// Margem bruta (vendas − compras) e seu percentual sobre as vendas.
pub fn gross_margin(sales: Decimal, purchases: Decimal) -> (Decimal, Decimal) {
    let margin = sales - purchases;
    let percent = if sales > Decimal::ZERO {
        round_money(margin / sales * Decimal::ONE_HUNDRED)
    } else {
        Decimal::ZERO
    };
    (margin, percent)
}

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    usd_rate: Decimal,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, usd_rate: Decimal) -> Self {
        Self { repo, usd_rate }
    }

    pub async fn summary<'e, E>(
        &self,
        executor: E,
        query: &DashboardQuery,
        today: NaiveDate,
    ) -> Result<DashboardSummary, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let period = query.period.unwrap_or_default();
        let currency = query.currency.unwrap_or_default();
        let (from, to) = period.range(today);

        let figures = self
            .repo
            .figures(executor, from, to, month_start(today, CHART_MONTHS - 1))
            .await?;

        let (margin, margin_percent) = gross_margin(figures.sales.total, figures.purchases.total);
        let money = |amount: Decimal| convert(amount, currency, self.usd_rate);

        Ok(DashboardSummary {
            period,
            currency,
            from,
            to,
            active_users: figures.active_users,
            purchases_count: figures.purchases.count,
            purchases_total: money(figures.purchases.total),
            sales_count: figures.sales.count,
            sales_total: money(figures.sales.total),
            gross_margin: money(margin),
            margin_percent,
            critical_stock: figures.critical_stock,
            low_stock: figures.low_stock,
            pending_orders: figures.pending_orders,
            top_products: figures
                .top_products
                .into_iter()
                .map(|mut p| {
                    p.total_revenue = money(p.total_revenue);
                    p
                })
                .collect(),
            top_clients: figures
                .top_clients
                .into_iter()
                .map(|mut c| {
                    c.total = money(c.total);
                    c
                })
                .collect(),
            monthly_sales: fill_months(today, &figures.monthly_sales)
                .into_iter()
                .map(|mut m| {
                    m.total = money(m.total);
                    m
                })
                .collect(),
        })
    }

    pub async fn reports_overview(&self) -> Result<ReportsOverview, AppError> {
        self.repo.overview().await
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        self.repo.pool()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    fn date(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_start_crosses_years() {
        assert_eq!(month_start(date(2025, 3, 13), 0), date(2025, 3, 1));
        assert_eq!(month_start(date(2025, 3, 13), 5), date(2024, 10, 1));
        assert_eq!(month_start(date(2025, 1, 31), 1), date(2024, 12, 1));
    }

    #[test]
    fn missing_months_are_zero() {
        let rows = vec![
            MonthlySalesEntry { year: 2024, month: 11, total: d("1500") },
            MonthlySalesEntry { year: 2025, month: 3, total: d("200") },
        ];
        let months = fill_months(date(2025, 3, 13), &rows);

        assert_eq!(months.len(), 6);
        assert_eq!((months[0].year, months[0].month), (2024, 10));
        assert_eq!(months[0].total, Decimal::ZERO);
        assert_eq!(months[1].total, d("1500"));
        assert_eq!((months[5].year, months[5].month), (2025, 3));
        assert_eq!(months[5].total, d("200"));
    }

    #[test]
    fn usd_conversion_rounds_to_cents() {
        assert_eq!(convert(d("100000"), Currency::Usd, d("4000")), d("25"));
        assert_eq!(convert(d("10000"), Currency::Usd, d("3900")), d("2.56"));
        assert_eq!(convert(d("10000"), Currency::Cop, d("3900")), d("10000"));
    }

    #[test]
    fn margin_is_percent_of_sales() {
        assert_eq!(gross_margin(d("1000"), d("600")), (d("400"), d("40")));
        assert_eq!(gross_margin(Decimal::ZERO, d("50")), (d("-50"), Decimal::ZERO));
    }
}
