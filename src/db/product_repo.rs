// src/db/product_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_db_error, map_delete_error, AppError},
    models::product::{
        BarcodeLabel, InventoryStats, MovementEntry, MovementKind, Product, ProductStatus,
        StockMovement, StockTotals,
    },
};

fn unique_violation(constraint: &str) -> Option<AppError> {
    match constraint {
        "products_code_key" => Some(AppError::ProductCodeAlreadyExists),
        "products_barcode_key" | "products_qr_code_key" => Some(AppError::BarcodeAlreadyExists),
        "products_sku_key" => Some(AppError::SkuAlreadyExists),
        _ => None,
    }
}

// Colunas gravadas no cadastro. A quantidade nasce zerada e entra pelo livro.
pub struct NewProduct<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub reference: Option<&'a str>,
    pub internal_code: Option<&'a str>,
    pub equipment_code: Option<&'a str>,
    pub serial: Option<&'a str>,
    pub barcode: &'a str,
    pub qr_code: &'a str,
    pub sku: Option<&'a str>,
    pub price: rust_decimal::Decimal,
    pub unit_cost: rust_decimal::Decimal,
    pub min_stock: i32,
    pub status: ProductStatus,
    pub category: Option<&'a str>,
    pub supplier: Option<&'a str>,
    pub created_by: Option<Uuid>,
}

// Campos descritivos (nunca a quantidade)
pub struct ProductChanges<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub reference: Option<&'a str>,
    pub internal_code: Option<&'a str>,
    pub equipment_code: Option<&'a str>,
    pub serial: Option<&'a str>,
    pub sku: Option<&'a str>,
    pub price: rust_decimal::Decimal,
    pub unit_cost: rust_decimal::Decimal,
    pub min_stock: i32,
    pub status: ProductStatus,
    pub category: Option<&'a str>,
    pub supplier: Option<&'a str>,
    pub active: bool,
}

pub struct NewMovement<'a> {
    pub product_id: Uuid,
    pub kind: MovementKind,
    pub quantity: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reason: Option<&'a str>,
    pub reference: Option<&'a str>,
    pub barcode_scanned: Option<&'a str>,
    pub user_id: Option<Uuid>,
}

const MOVEMENT_ENTRY_SELECT: &str = r#"
    SELECT m.*, p.code AS product_code, p.name AS product_name, u.username
    FROM stock_movements m
    JOIN products p ON p.id = m.product_id
    LEFT JOIN users u ON u.id = m.user_id
"#;

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // --- Leitura ---

    pub async fn list_products(
        &self,
        search: Option<&str>,
        status: Option<ProductStatus>,
        category: Option<&str>,
    ) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1::text IS NULL OR code ILIKE $1 OR name ILIKE $1 OR description ILIKE $1)
              AND ($2::product_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR category = $3)
            ORDER BY name
            "#,
        )
            .bind(search)
            .bind(status)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn inventory_stats(&self) -> Result<InventoryStats, AppError> {
        let stats = sqlx::query_as::<_, InventoryStats>(
            r#"
            SELECT
                COUNT(*) AS total_products,
                COUNT(*) FILTER (WHERE quantity > 5 AND quantity <= 10) AS low_stock,
                COUNT(*) FILTER (WHERE quantity <= 5) AS critical_stock,
                COUNT(DISTINCT category) AS categories
            FROM products
            "#,
        )
            .fetch_one(&self.pool)
            .await?;
        Ok(stats)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    // Trava a linha do produto até o fim da transação
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn lock_active_by_barcode<'e, E>(&self, executor: E, barcode: &str) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE barcode = $1 AND active FOR UPDATE",
        )
            .bind(barcode)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Leitura do scanner: aceita código de barras, QR, código interno ou SKU.
    pub async fn find_active_by_scan(&self, code: &str) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE active AND (barcode = $1 OR qr_code = $1 OR code = $1 OR sku = $1)
            ORDER BY (barcode = $1) DESC
            LIMIT 1
            "#,
        )
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn find_by_barcode(&self, barcode: &str) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE barcode = $1")
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn search_active(
        &self,
        pattern: Option<&str>,
        category: Option<&str>,
        low_stock_only: bool,
        limit: i64,
    ) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE active
              AND ($1::text IS NULL OR name ILIKE $1 OR code ILIKE $1 OR barcode ILIKE $1 OR sku ILIKE $1)
              AND ($2::text IS NULL OR category = $2)
              AND (NOT $3 OR quantity < min_stock)
            ORDER BY name
            LIMIT $4
            "#,
        )
            .bind(pattern)
            .bind(category)
            .bind(low_stock_only)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn page_active(&self, limit: i64, offset: i64) -> Result<(Vec<Product>, i64), AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE active ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE active")
            .fetch_one(&self.pool)
            .await?;

        Ok((products, total))
    }

    pub async fn categories(&self) -> Result<Vec<String>, AppError> {
        let categories = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT category FROM products
            WHERE category IS NOT NULL AND category <> ''
            ORDER BY category
            "#,
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn stock_totals(&self) -> Result<StockTotals, AppError> {
        let totals = sqlx::query_as::<_, StockTotals>(
            r#"
            SELECT
                COUNT(*) AS total_products,
                COUNT(*) FILTER (WHERE quantity < min_stock) AS low_stock,
                COUNT(*) FILTER (WHERE quantity = 0) AS out_of_stock,
                COALESCE(SUM(quantity * unit_cost), 0) AS inventory_value
            FROM products
            WHERE active
            "#,
        )
            .fetch_one(&self.pool)
            .await?;
        Ok(totals)
    }

    // --- Escrita ---

    pub async fn create_product<'e, E>(&self, executor: E, new_product: &NewProduct<'_>) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                code, name, description, reference, internal_code, equipment_code, serial,
                barcode, qr_code, sku, price, unit_cost, quantity, min_stock, status,
                category, supplier, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
            .bind(new_product.code)
            .bind(new_product.name)
            .bind(new_product.description)
            .bind(new_product.reference)
            .bind(new_product.internal_code)
            .bind(new_product.equipment_code)
            .bind(new_product.serial)
            .bind(new_product.barcode)
            .bind(new_product.qr_code)
            .bind(new_product.sku)
            .bind(new_product.price)
            .bind(new_product.unit_cost)
            .bind(new_product.min_stock)
            .bind(new_product.status)
            .bind(new_product.category)
            .bind(new_product.supplier)
            .bind(new_product.created_by)
            .fetch_one(executor)
            .await
            .map_err(|e| map_db_error(e, unique_violation))?;
        Ok(product)
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: &ProductChanges<'_>,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                code = $2, name = $3, description = $4, reference = $5,
                internal_code = $6, equipment_code = $7, serial = $8, sku = $9,
                price = $10, unit_cost = $11, min_stock = $12, status = $13,
                category = $14, supplier = $15, active = $16, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(changes.code)
            .bind(changes.name)
            .bind(changes.description)
            .bind(changes.reference)
            .bind(changes.internal_code)
            .bind(changes.equipment_code)
            .bind(changes.serial)
            .bind(changes.sku)
            .bind(changes.price)
            .bind(changes.unit_cost)
            .bind(changes.min_stock)
            .bind(changes.status)
            .bind(changes.category)
            .bind(changes.supplier)
            .bind(changes.active)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_db_error(e, unique_violation))?;
        Ok(product)
    }

    pub async fn set_quantity<'e, E>(&self, executor: E, id: Uuid, quantity: i32) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET quantity = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
            .bind(id)
            .bind(quantity)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        Ok(product)
    }

    // Os movimentos vão junto (ON DELETE CASCADE); linhas de venda bloqueiam.
    pub async fn delete_product<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(map_delete_error)?;
        Ok(result.rows_affected() > 0)
    }

    // --- Livro de movimentos ---

    pub async fn insert_movement<'e, E>(&self, executor: E, movement: &NewMovement<'_>) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (
                product_id, kind, quantity, previous_quantity, new_quantity,
                reason, reference, barcode_scanned, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
            .bind(movement.product_id)
            .bind(movement.kind)
            .bind(movement.quantity)
            .bind(movement.previous_quantity)
            .bind(movement.new_quantity)
            .bind(movement.reason)
            .bind(movement.reference)
            .bind(movement.barcode_scanned)
            .bind(movement.user_id)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn movements_for_product(&self, product_id: Uuid, limit: i64) -> Result<Vec<MovementEntry>, AppError> {
        let sql = format!(
            "{} WHERE m.product_id = $1 ORDER BY m.created_at DESC LIMIT $2",
            MOVEMENT_ENTRY_SELECT
        );
        let rows = sqlx::query_as::<_, MovementEntry>(&sql)
            .bind(product_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn recent_movements(&self, limit: i64) -> Result<Vec<MovementEntry>, AppError> {
        let sql = format!("{} ORDER BY m.created_at DESC LIMIT $1", MOVEMENT_ENTRY_SELECT);
        let rows = sqlx::query_as::<_, MovementEntry>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // --- Etiquetas ---

    pub async fn record_label(
        &self,
        product_id: Uuid,
        symbology: &str,
        includes_qr: bool,
        size_bytes: i32,
        created_by: Option<Uuid>,
    ) -> Result<BarcodeLabel, AppError> {
        let label = sqlx::query_as::<_, BarcodeLabel>(
            r#"
            INSERT INTO barcode_labels (product_id, symbology, includes_qr, size_bytes, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(product_id)
            .bind(symbology)
            .bind(includes_qr)
            .bind(size_bytes)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;
        Ok(label)
    }
}
