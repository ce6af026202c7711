// src/services/inventory_service.rs

use chrono::{DateTime, Utc};
use sqlx::{Acquire, Executor, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    barcode::{ean13, Symbology},
    common::{db_utils::like_pattern, error::AppError},
    db::product_repo::{NewProduct, ProductChanges, ProductRepository},
    models::product::{
        CreateProductPayload, InventoryStats, MovementEntry, MovementKind, Product, ProductDetail, ProductFilter,
        ProductListResponse, ProductStatus, ProductView, StockMovement, StockOperationResult,
        UpdateProductPayload,
    },
    services::stock_ledger::{MovementMeta, StockLedger},
};

pub const INITIAL_STOCK_REASON: &str = "Ingreso inicial";
pub const MANUAL_ADJUSTMENT_REASON: &str = "Ajuste manual";

const DETAIL_MOVEMENTS: i64 = 20;
const HISTORY_MOVEMENTS: i64 = 100;
const BARCODE_ATTEMPTS: usize = 5;

/// Conteúdo do QR de um produto: `PROD-{barcode}-{YYYYmmddHHMMSS}`.
pub fn qr_payload(barcode: &str, at: DateTime<Utc>) -> String {
    format!("PROD-{}-{}", barcode, at.format("%Y%m%d%H%M%S"))
}

pub fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct InventoryService {
    product_repo: ProductRepository,
    ledger: StockLedger,
}

impl InventoryService {
    pub fn new(product_repo: ProductRepository, ledger: StockLedger) -> Self {
        Self { product_repo, ledger }
    }

    // --- LISTAGEM ---
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<ProductListResponse, AppError> {
        let search = like_pattern(filter.search.as_deref());
        let category = blank_to_none(filter.category.as_deref());

        let products = self
            .product_repo
            .list_products(search.as_deref(), filter.status, category)
            .await?;
        let stats = self.product_repo.inventory_stats().await?;

        Ok(ProductListResponse {
            products: products.into_iter().map(ProductView::from).collect(),
            stats,
        })
    }

    /// Produtos filtrados e o resumo, para o PDF de inventário.
    pub async fn report_data(&self, filter: &ProductFilter) -> Result<(Vec<Product>, InventoryStats), AppError> {
        let search = like_pattern(filter.search.as_deref());
        let products = self
            .product_repo
            .list_products(search.as_deref(), filter.status, blank_to_none(filter.category.as_deref()))
            .await?;
        let stats = self.product_repo.inventory_stats().await?;
        Ok((products, stats))
    }

    pub async fn get_product(&self, id: Uuid) -> Result<ProductDetail, AppError> {
        self.product_detail(id, DETAIL_MOVEMENTS).await
    }

    pub async fn product_detail(&self, id: Uuid, movements: i64) -> Result<ProductDetail, AppError> {
        let product = self.find_product(id).await?;
        let movements = self.product_repo.movements_for_product(id, movements).await?;
        Ok(ProductDetail { product: product.into(), movements })
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<MovementEntry>, AppError> {
        self.find_product(id).await?;
        self.product_repo.movements_for_product(id, HISTORY_MOVEMENTS).await
    }

    pub async fn recent_movements(&self, limit: i64) -> Result<Vec<MovementEntry>, AppError> {
        self.product_repo.recent_movements(limit).await
    }

    pub async fn categories(&self) -> Result<Vec<String>, AppError> {
        self.product_repo.categories().await
    }

    pub async fn find_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.product_repo
            .find_by_id(self.product_repo.pool(), id)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    // --- CÓDIGOS ---

    /// Valida um EAN-13 informado ou sorteia um livre.
    pub async fn resolve_barcode(&self, requested: Option<&str>) -> Result<String, AppError> {
        if let Some(code) = blank_to_none(requested) {
            Symbology::Ean13.validate(code)?;
            if self.product_repo.find_by_barcode(code).await?.is_some() {
                return Err(AppError::BarcodeAlreadyExists);
            }
            return Ok(code.to_string());
        }

        for _ in 0..BARCODE_ATTEMPTS {
            let candidate = ean13::generate();
            if self.product_repo.find_by_barcode(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
        Err(AppError::BarcodeAlreadyExists)
    }

    // --- CREATE ---

    /// Cria o produto zerado e, havendo estoque inicial, lança a entrada no livro.
    pub async fn create_with_initial_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        new_product: &NewProduct<'_>,
        initial_quantity: i32,
    ) -> Result<Product, AppError> {
        let product = self.product_repo.create_product(&mut **tx, new_product).await?;

        if initial_quantity <= 0 {
            return Ok(product);
        }

        let meta = MovementMeta {
            reason: Some(INITIAL_STOCK_REASON),
            user_id: new_product.created_by,
            ..Default::default()
        };
        let (product, _) = self
            .ledger
            .record_locked(tx, product, MovementKind::Entry, initial_quantity, meta)
            .await?;
        Ok(product)
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        payload: &CreateProductPayload,
        user_id: Uuid,
    ) -> Result<ProductView, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let barcode = self.resolve_barcode(payload.barcode.as_deref()).await?;
        let qr_code = qr_payload(&barcode, Utc::now());

        let new_product = NewProduct {
            code: payload.code.trim(),
            name: payload.name.trim(),
            description: blank_to_none(payload.description.as_deref()),
            reference: blank_to_none(payload.reference.as_deref()),
            internal_code: blank_to_none(payload.internal_code.as_deref()),
            equipment_code: blank_to_none(payload.equipment_code.as_deref()),
            serial: blank_to_none(payload.serial.as_deref()),
            barcode: &barcode,
            qr_code: &qr_code,
            sku: blank_to_none(payload.sku.as_deref()),
            price: payload.price,
            unit_cost: payload.unit_cost,
            min_stock: payload.min_stock,
            status: payload.status.unwrap_or(ProductStatus::Available),
            category: blank_to_none(payload.category.as_deref()),
            supplier: blank_to_none(payload.supplier.as_deref()),
            created_by: Some(user_id),
        };

        let mut tx = executor.begin().await?;
        let product = self
            .create_with_initial_stock(&mut tx, &new_product, payload.quantity)
            .await?;
        tx.commit().await?;

        tracing::info!("✅ Produto {} criado com {} unidades", product.code, product.quantity);
        Ok(product.into())
    }

    // --- UPDATE ---
    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateProductPayload,
        user_id: Uuid,
    ) -> Result<ProductView, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .product_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let changes = ProductChanges {
            code: payload.code.trim(),
            name: payload.name.trim(),
            description: blank_to_none(payload.description.as_deref()),
            reference: blank_to_none(payload.reference.as_deref()),
            internal_code: blank_to_none(payload.internal_code.as_deref()),
            equipment_code: blank_to_none(payload.equipment_code.as_deref()),
            serial: blank_to_none(payload.serial.as_deref()),
            sku: blank_to_none(payload.sku.as_deref()),
            price: payload.price,
            unit_cost: payload.unit_cost,
            min_stock: payload.min_stock,
            status: payload.status,
            category: blank_to_none(payload.category.as_deref()),
            supplier: blank_to_none(payload.supplier.as_deref()),
            active: payload.active.unwrap_or(current.active),
        };

        let mut product = self
            .product_repo
            .update_product(&mut *tx, id, &changes)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        // Quantidade diferente: ajuste no livro
        if let Some(quantity) = payload.quantity.filter(|q| *q != current.quantity) {
            let meta = MovementMeta {
                reason: Some(MANUAL_ADJUSTMENT_REASON),
                user_id: Some(user_id),
                ..Default::default()
            };
            let (adjusted, _) = self
                .ledger
                .record_locked(&mut tx, product, MovementKind::Adjustment, quantity, meta)
                .await?;
            product = adjusted;
        }

        tx.commit().await?;
        Ok(product.into())
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<Product, AppError> {
        let product = self.find_product(id).await?;
        if !self.product_repo.delete_product(self.product_repo.pool(), id).await? {
            return Err(AppError::ProductNotFound);
        }
        tracing::info!("🗑️ Produto {} removido", product.code);
        Ok(product)
    }

    // --- MOVIMENTOS ---

    /// Entrada, saída, empréstimo ou ajuste de um produto pelo id.
    pub async fn move_stock<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        kind: MovementKind,
        quantity: i32,
        meta: MovementMeta<'_>,
    ) -> Result<StockOperationResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let (product, movement) = self.ledger.record(&mut tx, id, kind, quantity, meta).await?;
        tx.commit().await?;

        Ok(operation_result(product, movement))
    }
}

/// Resposta das operações de estoque, com o alerta de estoque baixo.
pub fn operation_result(product: Product, movement: StockMovement) -> StockOperationResult {
    let low_stock_alert = product.is_low_stock();
    if low_stock_alert {
        tracing::warn!("⚠️ Estoque baixo: {} ({} < {})", product.code, product.quantity, product.min_stock);
    }
    StockOperationResult {
        product: product.into(),
        movement,
        low_stock_alert,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn qr_payload_embeds_barcode_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 3, 7, 14, 5, 9).unwrap();
        assert_eq!(qr_payload("7701234567897", at), "PROD-7701234567897-20250307140509");
    }

    #[test]
    fn blank_values_become_none() {
        assert_eq!(blank_to_none(Some("  ")), None);
        assert_eq!(blank_to_none(Some(" Sillas ")), Some("Sillas"));
        assert_eq!(blank_to_none(None), None);
    }
}
