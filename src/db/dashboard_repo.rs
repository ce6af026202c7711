// src/db/dashboard_repo.rs

use chrono::NaiveDate;
use sqlx::{Acquire, Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::dashboard::{MonthlySalesEntry, PeriodTotals, ReportsOverview, TopClientEntry, TopProductEntry},
};

const TOP_LIMIT: i64 = 5;

// Números brutos do painel (em COP)
#[derive(Debug)]
pub struct DashboardFigures {
    pub active_users: i64,
    pub purchases: PeriodTotals,
    pub sales: PeriodTotals,
    pub critical_stock: i64,
    pub low_stock: i64,
    pub pending_orders: i64,
    pub top_products: Vec<TopProductEntry>,
    pub top_clients: Vec<TopClientEntry>,
    pub monthly_sales: Vec<MonthlySalesEntry>,
}

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Todos os números do período numa mesma transação (snapshot consistente).
    pub async fn figures<'e, E>(
        &self,
        executor: E,
        from: NaiveDate,
        to: NaiveDate,
        months_since: NaiveDate,
    ) -> Result<DashboardFigures, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // A. Usuários ativos
        let active_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active")
            .fetch_one(&mut *tx)
            .await?;

        // B. Compras do período
        let purchases = sqlx::query_as::<_, PeriodTotals>(
            r#"
            SELECT COUNT(*) AS count, COALESCE(SUM(total), 0) AS total
            FROM purchases
            WHERE purchase_date BETWEEN $1 AND $2
            "#,
        )
            .bind(from)
            .bind(to)
            .fetch_one(&mut *tx)
            .await?;

        // C. Vendas concluídas do período
        let sales = sqlx::query_as::<_, PeriodTotals>(
            r#"
            SELECT COUNT(*) AS count, COALESCE(SUM(total), 0) AS total
            FROM sales
            WHERE status = 'COMPLETED' AND created_at::date BETWEEN $1 AND $2
            "#,
        )
            .bind(from)
            .bind(to)
            .fetch_one(&mut *tx)
            .await?;

        // D. Estoque e ordens pendentes
        let (critical_stock, low_stock, pending_orders) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE active AND quantity <= 5),
                (SELECT COUNT(*) FROM products WHERE active AND quantity > 5 AND quantity <= 10),
                (SELECT COUNT(*) FROM purchase_orders WHERE status = 'PENDING')
            "#,
        )
            .fetch_one(&mut *tx)
            .await?;

        // E. Rankings
        let top_products = sqlx::query_as::<_, TopProductEntry>(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                COALESCE(SUM(sl.quantity), 0)::bigint AS total_quantity,
                COALESCE(SUM(sl.subtotal), 0) AS total_revenue
            FROM sale_lines sl
            JOIN sales s ON s.id = sl.sale_id
            JOIN products p ON p.id = sl.product_id
            WHERE s.status = 'COMPLETED' AND s.created_at::date BETWEEN $1 AND $2
            GROUP BY p.id, p.name
            ORDER BY total_quantity DESC, total_revenue DESC
            LIMIT $3
            "#,
        )
            .bind(from)
            .bind(to)
            .bind(TOP_LIMIT)
            .fetch_all(&mut *tx)
            .await?;

        let top_clients = sqlx::query_as::<_, TopClientEntry>(
            r#"
            SELECT
                c.id AS client_id,
                c.name AS client_name,
                COUNT(s.id) AS sales_count,
                COALESCE(SUM(s.total), 0) AS total
            FROM sales s
            JOIN clients c ON c.id = s.client_id
            WHERE s.status = 'COMPLETED' AND s.created_at::date BETWEEN $1 AND $2
            GROUP BY c.id, c.name
            ORDER BY total DESC
            LIMIT $3
            "#,
        )
            .bind(from)
            .bind(to)
            .bind(TOP_LIMIT)
            .fetch_all(&mut *tx)
            .await?;

        // F. Série mensal (só meses com venda; o serviço completa com zeros)
        let monthly_sales = sqlx::query_as::<_, MonthlySalesEntry>(
            r#"
            SELECT
                EXTRACT(YEAR FROM created_at)::int AS year,
                EXTRACT(MONTH FROM created_at)::int AS month,
                COALESCE(SUM(total), 0) AS total
            FROM sales
            WHERE status = 'COMPLETED' AND created_at::date >= $1
            GROUP BY 1, 2
            ORDER BY 1, 2
            "#,
        )
            .bind(months_since)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DashboardFigures {
            active_users,
            purchases,
            sales,
            critical_stock,
            low_stock,
            pending_orders,
            top_products,
            top_clients,
            monthly_sales,
        })
    }

    /// Contagens e somas de todos os módulos.
    pub async fn overview(&self) -> Result<ReportsOverview, AppError> {
        let overview = sqlx::query_as::<_, ReportsOverview>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE active) AS products,
                (SELECT COALESCE(SUM(quantity * unit_cost), 0) FROM products WHERE active) AS inventory_value,
                (SELECT COUNT(*) FROM clients) AS clients,
                (SELECT COUNT(*) FROM suppliers) AS suppliers,
                (SELECT COUNT(*) FROM sales WHERE status = 'COMPLETED') AS sales_count,
                (SELECT COALESCE(SUM(total), 0) FROM sales WHERE status = 'COMPLETED') AS sales_total,
                (SELECT COUNT(*) FROM purchases) AS purchases_count,
                (SELECT COALESCE(SUM(total), 0) FROM purchases) AS purchases_total,
                (SELECT COUNT(*) FROM purchase_orders) AS orders_count,
                (SELECT COALESCE(SUM(total), 0) FROM purchase_orders WHERE status <> 'CANCELLED') AS orders_total,
                (SELECT COUNT(*) FROM purchase_orders WHERE status = 'PENDING') AS pending_orders
            "#,
        )
            .fetch_one(&self.pool)
            .await?;
        Ok(overview)
    }
}
