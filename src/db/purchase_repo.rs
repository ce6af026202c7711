// src/db/purchase_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_db_error, AppError},
    models::purchase::{OriginKind, Purchase, PurchaseTotals, SupplierPurchases},
};

fn unique_violation(constraint: &str) -> Option<AppError> {
    match constraint {
        "purchases_invoice_number_key" => Some(AppError::InvoiceNumberAlreadyExists),
        _ => None,
    }
}

// Colunas gravadas em criação e edição (totais já calculados)
pub struct PurchaseFields<'a> {
    pub supplier: &'a str,
    pub supplier_id: Option<Uuid>,
    pub invoice_number: &'a str,
    pub kind: OriginKind,
    pub product: &'a str,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub iva_percent: Decimal,
    pub subtotal: Decimal,
    pub iva: Decimal,
    pub total: Decimal,
    pub purchase_date: NaiveDate,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct PurchaseRepository {
    pool: PgPool,
}

impl PurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        pattern: Option<&str>,
        kind: Option<OriginKind>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Purchase>, AppError> {
        let purchases = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT * FROM purchases
            WHERE ($1::text IS NULL OR supplier ILIKE $1 OR invoice_number ILIKE $1 OR product ILIKE $1)
              AND ($2::origin_kind IS NULL OR kind = $2)
              AND ($3::date IS NULL OR purchase_date >= $3)
              AND ($4::date IS NULL OR purchase_date <= $4)
            ORDER BY purchase_date DESC, created_at DESC
            "#,
        )
            .bind(pattern)
            .bind(kind)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(purchases)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Purchase>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = sqlx::query_as::<_, Purchase>("SELECT * FROM purchases WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(purchase)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        fields: &PurchaseFields<'_>,
        registered_by: Uuid,
    ) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases (
                supplier, supplier_id, invoice_number, kind, product, quantity, unit_price,
                iva_percent, subtotal, iva, total, purchase_date, notes, registered_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
            .bind(fields.supplier)
            .bind(fields.supplier_id)
            .bind(fields.invoice_number)
            .bind(fields.kind)
            .bind(fields.product)
            .bind(fields.quantity)
            .bind(fields.unit_price)
            .bind(fields.iva_percent)
            .bind(fields.subtotal)
            .bind(fields.iva)
            .bind(fields.total)
            .bind(fields.purchase_date)
            .bind(fields.notes)
            .bind(registered_by)
            .fetch_one(executor)
            .await
            .map_err(|e| map_db_error(e, unique_violation))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &PurchaseFields<'_>,
    ) -> Result<Option<Purchase>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Purchase>(
            r#"
            UPDATE purchases
            SET supplier = $2, supplier_id = $3, invoice_number = $4, kind = $5, product = $6,
                quantity = $7, unit_price = $8, iva_percent = $9, subtotal = $10, iva = $11,
                total = $12, purchase_date = $13, notes = $14, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(fields.supplier)
            .bind(fields.supplier_id)
            .bind(fields.invoice_number)
            .bind(fields.kind)
            .bind(fields.product)
            .bind(fields.quantity)
            .bind(fields.unit_price)
            .bind(fields.iva_percent)
            .bind(fields.subtotal)
            .bind(fields.iva)
            .bind(fields.total)
            .bind(fields.purchase_date)
            .bind(fields.notes)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_db_error(e, unique_violation))
    }

    pub async fn set_document<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        document_path: Option<&str>,
    ) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = sqlx::query_as::<_, Purchase>(
            "UPDATE purchases SET document_path = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
            .bind(id)
            .bind(document_path)
            .fetch_one(executor)
            .await?;
        Ok(purchase)
    }

    /// Remove e devolve a linha apagada (para limpar o arquivo).
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Purchase>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = sqlx::query_as::<_, Purchase>("DELETE FROM purchases WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(purchase)
    }

    // --- RELATÓRIO ---

    pub async fn totals(&self) -> Result<PurchaseTotals, AppError> {
        let totals = sqlx::query_as::<_, PurchaseTotals>(
            r#"
            SELECT
                COUNT(*) AS count,
                COALESCE(SUM(total), 0) AS amount,
                COUNT(*) FILTER (WHERE kind = 'NATIONAL') AS national,
                COUNT(*) FILTER (WHERE kind = 'INTERNATIONAL') AS international
            FROM purchases
            "#,
        )
            .fetch_one(&self.pool)
            .await?;
        Ok(totals)
    }

    pub async fn top_suppliers(&self, limit: i64) -> Result<Vec<SupplierPurchases>, AppError> {
        let suppliers = sqlx::query_as::<_, SupplierPurchases>(
            r#"
            SELECT supplier, COUNT(*) AS count, COALESCE(SUM(total), 0) AS amount
            FROM purchases
            GROUP BY supplier
            ORDER BY count DESC, amount DESC
            LIMIT $1
            "#,
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }
}
