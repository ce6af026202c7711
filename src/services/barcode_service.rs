// src/services/barcode_service.rs

use base64::{engine::general_purpose::STANDARD, Engine};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    barcode::render,
    common::{
        db_utils::{like_pattern, Page, PageParams},
        error::AppError,
    },
    db::product_repo::{NewProduct, ProductChanges, ProductRepository},
    models::product::{
        BarcodeProductPayload, BarcodeProductUpdatePayload, BarcodeStats, BatchLabelPayload,
        BatchLabelResponse, CodeImageResponse, GenerateBarcodePayload, GenerateQrPayload,
        LabelFailure, LabelFile, MovementKind, Product, ProductDetail, ProductSearchQuery,
        ProductStatus, ProductView, ScanStockPayload, StockOperationResult, VerifyBarcodePayload,
        VerifyBarcodeResponse,
    },
    services::{
        document_service::DocumentService,
        inventory_service::{blank_to_none, operation_result, qr_payload, InventoryService},
        stock_ledger::{MovementMeta, StockLedger},
    },
};

pub const SEARCH_LIMIT: i64 = 50;
const DETAIL_MOVEMENTS: i64 = 10;
const STATS_MOVEMENTS: i64 = 10;

// Barras: 2 px por módulo, 100 px de altura
const BAR_MODULE_WIDTH: u32 = 2;
const BAR_HEIGHT: u32 = 100;
const DEFAULT_QR_MODULE: u32 = 10;

const SCAN_ENTRY_REASON: &str = "Entrada por escáner";
const SCAN_EXIT_REASON: &str = "Salida por escáner";

pub fn label_file_name(product: &Product) -> String {
    let code: String = product
        .code
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("etiqueta_{}.pdf", code)
}

#[derive(Clone)]
pub struct BarcodeService {
    product_repo: ProductRepository,
    inventory: InventoryService,
    ledger: StockLedger,
    documents: DocumentService,
}

impl BarcodeService {
    pub fn new(
        product_repo: ProductRepository,
        inventory: InventoryService,
        ledger: StockLedger,
        documents: DocumentService,
    ) -> Self {
        Self { product_repo, inventory, ledger, documents }
    }

    // --- LEITURA ---

    /// Produto ativo pelo código lido (barras, QR, código interno ou SKU).
    pub async fn scan(&self, code: &str) -> Result<ProductView, AppError> {
        let code = code.trim();
        self.product_repo
            .find_active_by_scan(code)
            .await?
            .map(ProductView::from)
            .ok_or_else(|| AppError::UnknownBarcode(code.to_string()))
    }

    pub async fn verify(&self, payload: &VerifyBarcodePayload) -> Result<VerifyBarcodeResponse, AppError> {
        let code = payload.code.trim();
        if let Err(e) = payload.symbology.validate(code) {
            return Ok(VerifyBarcodeResponse {
                valid: false,
                message: e.to_string(),
                exists: false,
                product: None,
            });
        }

        let product = self.product_repo.find_by_barcode(code).await?;
        let message = if product.is_some() {
            "Código válido e já cadastrado"
        } else {
            "Código válido"
        };
        Ok(VerifyBarcodeResponse {
            valid: true,
            message: message.to_string(),
            exists: product.is_some(),
            product: product.map(ProductView::from),
        })
    }

    pub async fn search(&self, query: &ProductSearchQuery) -> Result<Vec<ProductView>, AppError> {
        let pattern = like_pattern(query.q.as_deref());
        let products = self
            .product_repo
            .search_active(
                pattern.as_deref(),
                blank_to_none(query.category.as_deref()),
                query.low_stock.unwrap_or(false),
                SEARCH_LIMIT,
            )
            .await?;
        Ok(products.into_iter().map(ProductView::from).collect())
    }

    pub async fn list(&self, params: &PageParams) -> Result<Page<ProductView>, AppError> {
        let (products, total) = self
            .product_repo
            .page_active(params.per_page(), params.offset())
            .await?;
        Ok(Page::new(
            products.into_iter().map(ProductView::from).collect(),
            params,
            total,
        ))
    }

    pub async fn get(&self, id: Uuid) -> Result<ProductDetail, AppError> {
        self.inventory.product_detail(id, DETAIL_MOVEMENTS).await
    }

    pub async fn stats(&self) -> Result<BarcodeStats, AppError> {
        Ok(BarcodeStats {
            totals: self.product_repo.stock_totals().await?,
            recent_movements: self.product_repo.recent_movements(STATS_MOVEMENTS).await?,
        })
    }

    // --- CADASTRO ---

    /// Cadastro rápido pela tela de leitura. Sem código informado, usa o próprio código de barras.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &BarcodeProductPayload,
        user_id: Uuid,
    ) -> Result<ProductView, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let barcode = self.inventory.resolve_barcode(payload.barcode.as_deref()).await?;
        let qr_code = qr_payload(&barcode, chrono::Utc::now());
        let code = blank_to_none(payload.code.as_deref()).unwrap_or(&barcode);

        let new_product = NewProduct {
            code,
            name: payload.name.trim(),
            description: blank_to_none(payload.description.as_deref()),
            reference: None,
            internal_code: None,
            equipment_code: None,
            serial: None,
            barcode: &barcode,
            qr_code: &qr_code,
            sku: blank_to_none(payload.sku.as_deref()),
            price: payload.price,
            unit_cost: payload.cost,
            min_stock: payload.min_stock,
            status: ProductStatus::Available,
            category: blank_to_none(payload.category.as_deref()),
            supplier: blank_to_none(payload.supplier.as_deref()),
            created_by: Some(user_id),
        };

        let mut tx = executor.begin().await?;
        let product = self
            .inventory
            .create_with_initial_stock(&mut tx, &new_product, payload.quantity)
            .await?;
        tx.commit().await?;

        tracing::info!("✅ Produto {} cadastrado pelo leitor ({})", product.code, product.barcode);
        Ok(product.into())
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &BarcodeProductUpdatePayload,
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

        // Só os campos da tela de leitura; o resto permanece
        let changes = ProductChanges {
            code: &current.code,
            name: payload.name.trim(),
            description: blank_to_none(payload.description.as_deref()),
            reference: current.reference.as_deref(),
            internal_code: current.internal_code.as_deref(),
            equipment_code: current.equipment_code.as_deref(),
            serial: current.serial.as_deref(),
            sku: blank_to_none(payload.sku.as_deref()),
            price: payload.price,
            unit_cost: payload.cost,
            min_stock: payload.min_stock,
            status: current.status,
            category: blank_to_none(payload.category.as_deref()),
            supplier: blank_to_none(payload.supplier.as_deref()),
            active: payload.active,
        };

        let product = self
            .product_repo
            .update_product(&mut *tx, id, &changes)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        tx.commit().await?;
        Ok(product.into())
    }

    // --- MOVIMENTOS PELO LEITOR ---

    pub async fn scan_stock<'e, E>(
        &self,
        executor: E,
        kind: MovementKind,
        payload: &ScanStockPayload,
        user_id: Uuid,
    ) -> Result<StockOperationResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let barcode = payload.barcode.trim();
        let default_reason = match kind {
            MovementKind::Entry => SCAN_ENTRY_REASON,
            _ => SCAN_EXIT_REASON,
        };

        let mut tx = executor.begin().await?;

        let product = self
            .product_repo
            .lock_active_by_barcode(&mut *tx, barcode)
            .await?
            .ok_or_else(|| AppError::UnknownBarcode(barcode.to_string()))?;

        let meta = MovementMeta {
            reason: Some(blank_to_none(payload.reason.as_deref()).unwrap_or(default_reason)),
            reference: blank_to_none(payload.reference.as_deref()),
            barcode_scanned: Some(barcode),
            user_id: Some(user_id),
        };
        let (product, movement) = self
            .ledger
            .record_locked(&mut tx, product, kind, payload.quantity, meta)
            .await?;

        tx.commit().await?;
        Ok(operation_result(product, movement))
    }

    // --- IMAGENS ---

    pub fn barcode_image(&self, payload: &GenerateBarcodePayload) -> Result<CodeImageResponse, AppError> {
        let data = payload.data.trim();
        let modules = payload.symbology.encode(data)?;
        let png = render::png_bytes(render::bars_image(&modules, BAR_MODULE_WIDTH, BAR_HEIGHT))?;

        Ok(CodeImageResponse {
            data: data.to_string(),
            kind: payload.symbology.name().to_string(),
            image: render::data_url("image/png", &png),
        })
    }

    pub fn qr_image(&self, payload: &GenerateQrPayload) -> Result<CodeImageResponse, AppError> {
        let image = render::qr_image(
            &payload.data,
            payload.size.unwrap_or(DEFAULT_QR_MODULE),
            payload.error_correction,
        )?;
        let png = render::png_bytes(image)?;

        Ok(CodeImageResponse {
            data: payload.data.clone(),
            kind: "qr".to_string(),
            image: render::data_url("image/png", &png),
        })
    }

    // --- ETIQUETAS ---

    /// Gera o PDF da etiqueta e registra a emissão.
    pub async fn label(&self, id: Uuid, include_qr: bool, user_id: Uuid) -> Result<(Product, Vec<u8>), AppError> {
        let product = self.inventory.find_product(id).await?;
        let (pdf, symbology) = self.documents.product_label(&product, include_qr)?;

        self.product_repo
            .record_label(
                product.id,
                symbology.name(),
                include_qr,
                i32::try_from(pdf.len()).unwrap_or(i32::MAX),
                Some(user_id),
            )
            .await?;

        Ok((product, pdf))
    }

    /// Etiquetas em lote. Falhas não interrompem o lote; vão para `errors`.
    pub async fn batch_labels(&self, payload: &BatchLabelPayload, user_id: Uuid) -> BatchLabelResponse {
        let mut response = BatchLabelResponse { labels: Vec::new(), errors: Vec::new() };

        for &product_id in &payload.product_ids {
            match self.label(product_id, payload.include_qr, user_id).await {
                Ok((product, pdf)) => response.labels.push(LabelFile {
                    product_id,
                    file_name: label_file_name(&product),
                    pdf_base64: STANDARD.encode(&pdf),
                }),
                Err(e) => {
                    tracing::warn!("⚠️ Etiqueta do produto {} falhou: {}", product_id, e);
                    response.errors.push(LabelFailure { product_id, error: e.to_string() });
                }
            }
        }

        tracing::info!(
            "🏷️ Lote de etiquetas: {} geradas, {} com erro",
            response.labels.len(),
            response.errors.len()
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::{render::ErrorCorrection, Symbology};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> BarcodeService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/backoffice_test")
            .unwrap();
        let repo = ProductRepository::new(pool);
        let ledger = StockLedger::new(repo.clone());
        let inventory = InventoryService::new(repo.clone(), ledger.clone());
        let documents = DocumentService::new("./fonts".into(), "Roboto".into(), "BUTACORS".into());
        BarcodeService::new(repo, inventory, ledger, documents)
    }

    fn product(code: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            code: code.into(),
            name: "Silla".into(),
            description: None,
            reference: None,
            internal_code: None,
            equipment_code: None,
            serial: None,
            barcode: "7701234567897".into(),
            qr_code: "PROD-7701234567897-20250101000000".into(),
            sku: None,
            price: Decimal::ONE,
            unit_cost: Decimal::ONE,
            quantity: 0,
            min_stock: 10,
            status: ProductStatus::Available,
            category: None,
            supplier: None,
            active: true,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn label_file_name_is_safe() {
        assert_eq!(label_file_name(&product("SIL-001")), "etiqueta_SIL-001.pdf");
        assert_eq!(label_file_name(&product("A/B \"x\"")), "etiqueta_A_B__x_.pdf");
    }

    #[tokio::test]
    async fn barcode_image_is_a_png_data_url() {
        let response = service()
            .barcode_image(&GenerateBarcodePayload {
                data: "ABC-123".into(),
                symbology: Symbology::Code128,
            })
            .unwrap();
        assert_eq!(response.kind, "code128");
        assert!(response.image.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn invalid_data_is_rejected_before_rendering() {
        let result = service().barcode_image(&GenerateBarcodePayload {
            data: "123".into(),
            symbology: Symbology::Ean13,
        });
        assert!(matches!(result, Err(AppError::InvalidBarcode(_))));
    }

    #[tokio::test]
    async fn qr_image_uses_requested_level() {
        let response = service()
            .qr_image(&GenerateQrPayload {
                data: "PROD-7701234567897".into(),
                size: Some(4),
                error_correction: ErrorCorrection::H,
            })
            .unwrap();
        assert_eq!(response.kind, "qr");
        assert!(response.image.starts_with("data:image/png;base64,"));
    }
}
