// src/db/sales_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_db_error, AppError},
    models::sales::{
        Client, DailySales, ProductSales, Sale, SaleLine, SaleStats, SaleSummary,
    },
};

fn unique_violation(constraint: &str) -> Option<AppError> {
    match constraint {
        "clients_document_key" => Some(AppError::ClientDocumentAlreadyExists),
        _ => None,
    }
}

pub struct ClientFields<'a> {
    pub name: &'a str,
    pub document: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
}

pub struct NewSale<'a> {
    pub number: &'a str,
    pub client_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub iva_percent: Decimal,
    pub iva: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub notes: Option<&'a str>,
    pub seller_id: Uuid,
}

pub struct NewSaleLine<'a> {
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub description: &'a str,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

const SALE_SUMMARY_SELECT: &str = r#"
    SELECT s.*,
           c.name AS client_name,
           c.document AS client_document,
           COALESCE(u.full_name, u.username) AS seller_name
    FROM sales s
    LEFT JOIN clients c ON c.id = s.client_id
    LEFT JOIN users u ON u.id = s.seller_id
"#;

#[derive(Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // CLIENTES
    // ---

    pub async fn list_clients(&self, pattern: Option<&str>) -> Result<Vec<Client>, AppError> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE ($1::text IS NULL OR name ILIKE $1 OR document ILIKE $1 OR email ILIKE $1)
            ORDER BY name
            "#,
        )
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    pub async fn all_clients<'e, E>(&self, executor: E) -> Result<Vec<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let clients = sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY name")
            .fetch_all(executor)
            .await?;
        Ok(clients)
    }

    pub async fn find_client<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(client)
    }

    pub async fn create_client<'e, E>(&self, executor: E, fields: &ClientFields<'_>) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, document, email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(fields.name)
            .bind(fields.document)
            .bind(fields.email)
            .bind(fields.phone)
            .bind(fields.address)
            .fetch_one(executor)
            .await
            .map_err(|e| map_db_error(e, unique_violation))
    }

    pub async fn update_client<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &ClientFields<'_>,
    ) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = $2, document = $3, email = $4, phone = $5, address = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(fields.name)
            .bind(fields.document)
            .bind(fields.email)
            .bind(fields.phone)
            .bind(fields.address)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_db_error(e, unique_violation))
    }

    // ---
    // VENDAS
    // ---

    /// Último número emitido (a sequência ignora o ano).
    pub async fn last_number<'e, E>(&self, executor: E) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let number = sqlx::query_scalar::<_, String>(
            r#"
            SELECT number FROM sales
            ORDER BY split_part(number, '-', 3)::int DESC
            LIMIT 1
            "#,
        )
            .fetch_optional(executor)
            .await?;
        Ok(number)
    }

    pub async fn insert_sale<'e, E>(&self, executor: E, sale: &NewSale<'_>) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (number, client_id, subtotal, iva_percent, iva, discount, total, notes, seller_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
            .bind(sale.number)
            .bind(sale.client_id)
            .bind(sale.subtotal)
            .bind(sale.iva_percent)
            .bind(sale.iva)
            .bind(sale.discount)
            .bind(sale.total)
            .bind(sale.notes)
            .bind(sale.seller_id)
            .fetch_one(executor)
            .await?;
        Ok(sale)
    }

    pub async fn insert_line<'e, E>(&self, executor: E, line: &NewSaleLine<'_>) -> Result<SaleLine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let line = sqlx::query_as::<_, SaleLine>(
            r#"
            INSERT INTO sale_lines (sale_id, product_id, description, quantity, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(line.sale_id)
            .bind(line.product_id)
            .bind(line.description)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .fetch_one(executor)
            .await?;
        Ok(line)
    }

    pub async fn list_sales(
        &self,
        pattern: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<SaleSummary>, AppError> {
        let sql = format!(
            r#"{}
            WHERE ($1::text IS NULL OR s.number ILIKE $1 OR c.name ILIKE $1 OR c.document ILIKE $1)
              AND ($2::date IS NULL OR s.created_at::date >= $2)
              AND ($3::date IS NULL OR s.created_at::date <= $3)
            ORDER BY s.created_at DESC
            "#,
            SALE_SUMMARY_SELECT
        );
        let sales = sqlx::query_as::<_, SaleSummary>(&sql)
            .bind(pattern)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    pub async fn find_summary(&self, id: Uuid) -> Result<Option<SaleSummary>, AppError> {
        let sql = format!("{} WHERE s.id = $1", SALE_SUMMARY_SELECT);
        let sale = sqlx::query_as::<_, SaleSummary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    pub async fn lock_sale<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn lines<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<Vec<SaleLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, SaleLine>(
            "SELECT * FROM sale_lines WHERE sale_id = $1 ORDER BY description",
        )
            .bind(sale_id)
            .fetch_all(executor)
            .await?;
        Ok(lines)
    }

    pub async fn mark_annulled<'e, E>(&self, executor: E, id: Uuid, user_id: Uuid) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET status = 'ANNULLED', annulled_by = $2, annulled_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(user_id)
            .fetch_one(executor)
            .await?;
        Ok(sale)
    }

    // ---
    // INDICADORES
    // ---

    pub async fn stats(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<SaleStats, AppError> {
        let stats = sqlx::query_as::<_, SaleStats>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'COMPLETED') AS completed_count,
                COALESCE(SUM(total) FILTER (WHERE status = 'COMPLETED'), 0) AS completed_total,
                COUNT(*) FILTER (WHERE status = 'COMPLETED' AND created_at::date = CURRENT_DATE) AS today_count
            FROM sales
            WHERE ($1::date IS NULL OR created_at::date >= $1)
              AND ($2::date IS NULL OR created_at::date <= $2)
            "#,
        )
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;
        Ok(stats)
    }

    pub async fn daily(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Vec<DailySales>, AppError> {
        let days = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT created_at::date AS day, COUNT(*) AS count, COALESCE(SUM(total), 0) AS total
            FROM sales
            WHERE status = 'COMPLETED'
              AND ($1::date IS NULL OR created_at::date >= $1)
              AND ($2::date IS NULL OR created_at::date <= $2)
            GROUP BY day
            ORDER BY day
            "#,
        )
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(days)
    }

    pub async fn top_products(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: i64,
    ) -> Result<Vec<ProductSales>, AppError> {
        let products = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT l.product_id, p.name AS product_name,
                   SUM(l.quantity)::bigint AS quantity,
                   COALESCE(SUM(l.subtotal), 0) AS total
            FROM sale_lines l
            JOIN sales s ON s.id = l.sale_id
            JOIN products p ON p.id = l.product_id
            WHERE s.status = 'COMPLETED'
              AND ($1::date IS NULL OR s.created_at::date >= $1)
              AND ($2::date IS NULL OR s.created_at::date <= $2)
            GROUP BY l.product_id, p.name
            ORDER BY quantity DESC
            LIMIT $3
            "#,
        )
            .bind(from)
            .bind(to)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }
}
