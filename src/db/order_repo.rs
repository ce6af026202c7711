// src/db/order_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::orders::{OrderCounts, OrderKind, OrderLine, OrderStatus, PurchaseOrder},
};

// Cabeçalho da ordem (totais já calculados)
pub struct OrderFields<'a> {
    pub supplier_id: Option<Uuid>,
    pub supplier_name: &'a str,
    pub supplier_address: Option<&'a str>,
    pub supplier_phone: Option<&'a str>,
    pub issue_date: NaiveDate,
    pub client_order_number: Option<&'a str>,
    pub client_branch: Option<&'a str>,
    pub subtotal: Decimal,
    pub iva_percent: Decimal,
    pub iva: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub notes: Option<&'a str>,
}

pub struct NewOrderLine<'a> {
    pub position: i32,
    pub description: &'a str,
    pub quantity: Decimal,
    pub unit: &'a str,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn last_number<'e, E>(&self, executor: E, prefix: &str) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let number = sqlx::query_scalar::<_, String>(
            r#"
            SELECT number FROM purchase_orders
            WHERE number LIKE $1 || '-%'
            ORDER BY split_part(number, '-', 3)::int DESC
            LIMIT 1
            "#,
        )
            .bind(prefix)
            .fetch_optional(executor)
            .await?;
        Ok(number)
    }

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        number: &str,
        kind: OrderKind,
        fields: &OrderFields<'_>,
        prepared_by: Uuid,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders (
                number, kind, supplier_id, supplier_name, supplier_address, supplier_phone,
                issue_date, client_order_number, client_branch, subtotal, iva_percent, iva,
                discount, total, notes, prepared_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
            .bind(number)
            .bind(kind)
            .bind(fields.supplier_id)
            .bind(fields.supplier_name)
            .bind(fields.supplier_address)
            .bind(fields.supplier_phone)
            .bind(fields.issue_date)
            .bind(fields.client_order_number)
            .bind(fields.client_branch)
            .bind(fields.subtotal)
            .bind(fields.iva_percent)
            .bind(fields.iva)
            .bind(fields.discount)
            .bind(fields.total)
            .bind(fields.notes)
            .bind(prepared_by)
            .fetch_one(executor)
            .await?;
        Ok(order)
    }

    pub async fn update_order<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &OrderFields<'_>,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders
            SET supplier_id = $2, supplier_name = $3, supplier_address = $4, supplier_phone = $5,
                issue_date = $6, client_order_number = $7, client_branch = $8, subtotal = $9,
                iva_percent = $10, iva = $11, discount = $12, total = $13, notes = $14,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(fields.supplier_id)
            .bind(fields.supplier_name)
            .bind(fields.supplier_address)
            .bind(fields.supplier_phone)
            .bind(fields.issue_date)
            .bind(fields.client_order_number)
            .bind(fields.client_branch)
            .bind(fields.subtotal)
            .bind(fields.iva_percent)
            .bind(fields.iva)
            .bind(fields.discount)
            .bind(fields.total)
            .bind(fields.notes)
            .fetch_one(executor)
            .await?;
        Ok(order)
    }

    pub async fn insert_line<'e, E>(&self, executor: E, order_id: Uuid, line: &NewOrderLine<'_>) -> Result<OrderLine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let line = sqlx::query_as::<_, OrderLine>(
            r#"
            INSERT INTO order_lines (order_id, position, description, quantity, unit, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
            .bind(order_id)
            .bind(line.position)
            .bind(line.description)
            .bind(line.quantity)
            .bind(line.unit)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .fetch_one(executor)
            .await?;
        Ok(line)
    }

    pub async fn delete_lines<'e, E>(&self, executor: E, order_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM order_lines WHERE order_id = $1")
            .bind(order_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn lines<'e, E>(&self, executor: E, order_id: Uuid) -> Result<Vec<OrderLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT * FROM order_lines WHERE order_id = $1 ORDER BY position",
        )
            .bind(order_id)
            .fetch_all(executor)
            .await?;
        Ok(lines)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<PurchaseOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>("SELECT * FROM purchase_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<PurchaseOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders WHERE id = $1 FOR UPDATE",
        )
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    /// Nomes de quem elaborou e de quem verificou.
    pub async fn signer_names(
        &self,
        prepared_by: Option<Uuid>,
        verified_by: Option<Uuid>,
    ) -> Result<(Option<String>, Option<String>), AppError> {
        let names = sqlx::query_as::<_, (Option<String>, Option<String>)>(
            r#"
            SELECT
                (SELECT COALESCE(full_name, username) FROM users WHERE id = $1),
                (SELECT COALESCE(full_name, username) FROM users WHERE id = $2)
            "#,
        )
            .bind(prepared_by)
            .bind(verified_by)
            .fetch_one(&self.pool)
            .await?;
        Ok(names)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: OrderStatus,
        verified_by: Option<Uuid>,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders
            SET status = $2, verified_by = COALESCE(verified_by, $3), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(status)
            .bind(verified_by)
            .fetch_one(executor)
            .await?;
        Ok(order)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        &self,
        kind: Option<OrderKind>,
        pattern: Option<&str>,
        status: Option<OrderStatus>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PurchaseOrder>, AppError> {
        let orders = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            SELECT * FROM purchase_orders
            WHERE ($1::order_kind IS NULL OR kind = $1)
              AND ($2::text IS NULL OR number ILIKE $2 OR supplier_name ILIKE $2 OR client_order_number ILIKE $2)
              AND ($3::order_status IS NULL OR status = $3)
              AND ($4::date IS NULL OR issue_date >= $4)
              AND ($5::date IS NULL OR issue_date <= $5)
            ORDER BY issue_date DESC, number DESC
            "#,
        )
            .bind(kind)
            .bind(pattern)
            .bind(status)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    pub async fn counts(&self, kind: Option<OrderKind>) -> Result<OrderCounts, AppError> {
        let counts = sqlx::query_as::<_, OrderCounts>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'PENDING') AS pending,
                COUNT(*) FILTER (WHERE status = 'COMPLETED') AS completed,
                COUNT(*) FILTER (WHERE status = 'CANCELLED') AS cancelled,
                COALESCE(SUM(total) FILTER (WHERE status <> 'CANCELLED'), 0) AS amount
            FROM purchase_orders
            WHERE ($1::order_kind IS NULL OR kind = $1)
            "#,
        )
            .bind(kind)
            .fetch_one(&self.pool)
            .await?;
        Ok(counts)
    }
}
