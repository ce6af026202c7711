// src/services/purchase_service.rs

use std::path::{Path, PathBuf};

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::like_pattern,
        error::AppError,
        money::{line_subtotal, Totals},
    },
    db::purchase_repo::{PurchaseFields, PurchaseRepository},
    models::purchase::{Purchase, PurchaseFilter, PurchasePayload, PurchaseReport, PurchaseView},
    services::inventory_service::blank_to_none,
};

pub const ALLOWED_DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "xml", "txt"];
const TOP_SUPPLIERS: i64 = 10;

// ---
// Arquivos anexos
// ---

fn clean_chars(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

/// Só o nome final do caminho, com caracteres fora de `[A-Za-z0-9._-]` trocados por `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = clean_chars(base).trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "documento".to_string()
    } else {
        cleaned
    }
}

/// Extensão em minúsculas, se estiver na lista permitida.
pub fn document_extension(name: &str) -> Result<String, AppError> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if ALLOWED_DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::InvalidDocumentType(ext))
    }
}

pub fn content_type(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "xml" => "application/xml",
        _ => "text/plain; charset=utf-8",
    }
}

/// Pasta de anexos. O banco guarda só o nome do arquivo.
#[derive(Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn stored_name(invoice_number: &str, original: &str) -> String {
        format!("{}_{}", clean_chars(invoice_number.trim()), sanitize_file_name(original))
    }

    fn path_of(&self, stored_name: &str) -> PathBuf {
        self.dir.join(sanitize_file_name(stored_name))
    }

    pub async fn save(&self, stored_name: &str, bytes: &[u8]) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_of(stored_name), bytes).await?;
        Ok(())
    }

    pub async fn read(&self, stored_name: &str) -> Result<Vec<u8>, AppError> {
        match tokio::fs::read(self.path_of(stored_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::DocumentNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Remoção tolerante: arquivo ausente não é erro.
    pub async fn remove(&self, stored_name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.path_of(stored_name)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("⚠️ Não foi possível remover o anexo {}: {}", stored_name, e);
            }
        }
    }
}

// Arquivo pronto para download
pub struct StoredDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

// ---
// Serviço
// ---

fn purchase_fields(payload: &PurchasePayload, default_iva: Decimal) -> Result<PurchaseFields<'_>, AppError> {
    let iva_percent = payload.iva_percent.unwrap_or(default_iva);
    let subtotal = line_subtotal(Decimal::from(payload.quantity), payload.unit_price);
    let totals = Totals::compute([subtotal], iva_percent, Decimal::ZERO)?;

    Ok(PurchaseFields {
        supplier: payload.supplier.trim(),
        supplier_id: payload.supplier_id,
        invoice_number: payload.invoice_number.trim(),
        kind: payload.kind,
        product: payload.product.trim(),
        quantity: payload.quantity,
        unit_price: payload.unit_price,
        iva_percent,
        subtotal: totals.subtotal,
        iva: totals.iva,
        total: totals.total,
        purchase_date: payload.purchase_date.unwrap_or_else(|| Utc::now().date_naive()),
        notes: blank_to_none(payload.notes.as_deref()),
    })
}

#[derive(Clone)]
pub struct PurchaseService {
    purchase_repo: PurchaseRepository,
    store: DocumentStore,
    default_iva: Decimal,
}

impl PurchaseService {
    pub fn new(purchase_repo: PurchaseRepository, store: DocumentStore, default_iva: Decimal) -> Self {
        Self { purchase_repo, store, default_iva }
    }

    pub async fn list(&self, filter: &PurchaseFilter) -> Result<Vec<PurchaseView>, AppError> {
        let pattern = like_pattern(filter.search.as_deref());
        let purchases = self
            .purchase_repo
            .list(pattern.as_deref(), filter.kind, filter.from, filter.to)
            .await?;
        Ok(purchases.into_iter().map(PurchaseView::from).collect())
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.purchase_repo
            .find_by_id(executor, id)
            .await?
            .ok_or(AppError::PurchaseNotFound)
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &PurchasePayload, user_id: Uuid) -> Result<PurchaseView, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fields = purchase_fields(payload, self.default_iva)?;
        let purchase = self.purchase_repo.create(executor, &fields, user_id).await?;
        tracing::info!("✅ Compra {} registrada: total {}", purchase.invoice_number, purchase.total);
        Ok(purchase.into())
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, payload: &PurchasePayload) -> Result<PurchaseView, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fields = purchase_fields(payload, self.default_iva)?;
        self.purchase_repo
            .update(executor, id, &fields)
            .await?
            .map(PurchaseView::from)
            .ok_or(AppError::PurchaseNotFound)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let purchase = self
            .purchase_repo
            .delete(executor, id)
            .await?
            .ok_or(AppError::PurchaseNotFound)?;

        if let Some(path) = &purchase.document_path {
            self.store.remove(path).await;
        }
        tracing::info!("🗑️ Compra {} removida", purchase.invoice_number);
        Ok(purchase)
    }

    // --- ANEXOS ---

    /// Grava `{fatura}_{nome}` e substitui o anexo anterior.
    pub async fn attach_document<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<PurchaseView, AppError>
    where
        E: Executor<'e, Database = Postgres> + Copy,
    {
        document_extension(original_name)?;
        let purchase = self.get(executor, id).await?;

        let stored = DocumentStore::stored_name(&purchase.invoice_number, original_name);
        self.store.save(&stored, bytes).await?;

        if let Some(previous) = purchase.document_path.as_deref().filter(|p| *p != stored) {
            self.store.remove(previous).await;
        }

        let updated = self.purchase_repo.set_document(executor, id, Some(&stored)).await?;
        tracing::info!("📎 Anexo {} salvo para a compra {}", stored, updated.invoice_number);
        Ok(updated.into())
    }

    pub async fn document(&self, purchase: &Purchase) -> Result<StoredDocument, AppError> {
        let stored = purchase.document_path.as_deref().ok_or(AppError::DocumentNotFound)?;
        let ext = document_extension(stored).unwrap_or_default();
        Ok(StoredDocument {
            file_name: stored.to_string(),
            content_type: content_type(&ext),
            bytes: self.store.read(stored).await?,
        })
    }

    pub async fn report(&self) -> Result<PurchaseReport, AppError> {
        Ok(PurchaseReport {
            totals: self.purchase_repo.totals().await?,
            top_suppliers: self.purchase_repo.top_suppliers(TOP_SUPPLIERS).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::purchase::OriginKind;

    fn d(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("factura enero.pdf"), "factura_enero.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\fe-1.xml"), "fe-1.xml");
        assert_eq!(sanitize_file_name(".."), "documento");
        assert_eq!(DocumentStore::stored_name("FE 10/2", "a.pdf"), "FE_10_2_a.pdf");
    }

    #[test]
    fn only_known_extensions_are_accepted() {
        assert_eq!(document_extension("Factura.PDF").unwrap(), "pdf");
        assert!(document_extension("notas.txt").is_ok());
        assert!(matches!(
            document_extension("virus.exe"),
            Err(AppError::InvalidDocumentType(ext)) if ext == "exe"
        ));
        assert!(document_extension("sin_extension").is_err());
    }

    #[test]
    fn totals_are_recomputed_without_discount() {
        let payload = PurchasePayload {
            supplier: " Maderas SAS ".into(),
            supplier_id: None,
            invoice_number: "FE-1".into(),
            kind: OriginKind::National,
            product: "Tablero".into(),
            quantity: 3,
            unit_price: d("12.50"),
            iva_percent: None,
            purchase_date: None,
            notes: Some("  ".into()),
        };
        let fields = purchase_fields(&payload, d("19")).unwrap();
        assert_eq!(fields.supplier, "Maderas SAS");
        assert_eq!(fields.subtotal, d("37.50"));
        assert_eq!(fields.iva, d("7.13"));
        assert_eq!(fields.total, d("44.63"));
        assert_eq!(fields.notes, None);
    }

    #[tokio::test]
    async fn store_replaces_and_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("uploads"));

        store.save("FE-1_a.pdf", b"%PDF-1").await.unwrap();
        assert_eq!(store.read("FE-1_a.pdf").await.unwrap(), b"%PDF-1");

        store.save("FE-1_a.pdf", b"%PDF-2").await.unwrap();
        assert_eq!(store.read("FE-1_a.pdf").await.unwrap(), b"%PDF-2");

        store.remove("FE-1_a.pdf").await;
        assert!(matches!(store.read("FE-1_a.pdf").await, Err(AppError::DocumentNotFound)));

        // remover de novo não falha
        store.remove("FE-1_a.pdf").await;
    }
}
