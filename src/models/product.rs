// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    barcode::{render::ErrorCorrection, Symbology},
    common::{
        money::profit_margin,
        validation::{validate_not_blank, validate_not_negative},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "product_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Available, // Vira "AVAILABLE"
    OnLoan,    // Vira "ON_LOAN"
    Damaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movement_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Entry,
    Exit,
    Adjustment,
    Loan,
}

impl MovementKind {
    /// Nome usado na bitácora.
    pub fn label(self) -> &'static str {
        match self {
            MovementKind::Entry => "Entrada",
            MovementKind::Exit => "Salida",
            MovementKind::Adjustment => "Ajuste",
            MovementKind::Loan => "Préstamo",
        }
    }
}

// Faixas fixas usadas na listagem do inventário
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockLevel {
    Sufficient,
    Low,
    Critical,
}

impl StockLevel {
    pub fn from_quantity(quantity: i32) -> Self {
        if quantity > 10 {
            StockLevel::Sufficient
        } else if quantity > 5 {
            StockLevel::Low
        } else {
            StockLevel::Critical
        }
    }
}

// --- Produto (tabela `products`) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "SIL-001")]
    pub code: String,
    #[schema(example = "Silla ejecutiva")]
    pub name: String,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub internal_code: Option<String>,
    pub equipment_code: Option<String>,
    pub serial: Option<String>,
    #[schema(example = "7701234567897")]
    pub barcode: String,
    pub qr_code: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub unit_cost: Decimal,
    pub quantity: i32,
    pub min_stock: i32,
    pub status: ProductStatus,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.min_stock
    }
}

// Produto + indicadores calculados
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub stock_level: StockLevel,
    pub is_low_stock: bool,
    pub profit_margin: Decimal,
    pub inventory_value: Decimal,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            stock_level: StockLevel::from_quantity(product.quantity),
            is_low_stock: product.is_low_stock(),
            profit_margin: profit_margin(product.price, product.unit_cost),
            inventory_value: Decimal::from(product.quantity) * product.unit_cost,
            product,
        }
    }
}

// --- Movimentação de Estoque (Histórico) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub kind: MovementKind,
    pub quantity: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reason: Option<String>,
    pub reference: Option<String>,
    pub barcode_scanned: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Movimento com os nomes já resolvidos (produto e usuário)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub movement: StockMovement,
    pub product_code: String,
    pub product_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_products: i64,
    pub low_stock: i64,
    pub critical_stock: i64,
    pub categories: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockTotals {
    pub total_products: i64,
    pub low_stock: i64,
    pub out_of_stock: i64,
    pub inventory_value: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeStats {
    #[serde(flatten)]
    pub totals: StockTotals,
    pub recent_movements: Vec<MovementEntry>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeLabel {
    pub id: Uuid,
    pub product_id: Uuid,
    pub symbology: String,
    pub includes_qr: bool,
    pub size_bytes: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// ---
// Payloads
// ---

fn default_min_stock() -> i32 {
    10
}

// Cadastro pelo inventário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, max = 50, message = "O código é obrigatório."))]
    pub code: String,

    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    pub name: String,

    pub description: Option<String>,
    pub reference: Option<String>,
    pub internal_code: Option<String>,
    pub equipment_code: Option<String>,
    pub serial: Option<String>,

    /// Gerado (EAN-13) quando ausente
    pub barcode: Option<String>,
    pub sku: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub unit_cost: Decimal,

    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    #[serde(default)]
    pub quantity: i32,

    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    #[serde(default = "default_min_stock")]
    pub min_stock: i32,

    pub status: Option<ProductStatus>,
    pub category: Option<String>,
    pub supplier: Option<String>,
}

// Edição pelo inventário. Uma quantidade diferente vira um ajuste no livro.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, max = 50, message = "O código é obrigatório."))]
    pub code: String,

    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    pub name: String,

    pub description: Option<String>,
    pub reference: Option<String>,
    pub internal_code: Option<String>,
    pub equipment_code: Option<String>,
    pub serial: Option<String>,
    pub sku: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_cost: Decimal,

    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity: Option<i32>,

    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    pub min_stock: i32,

    pub status: ProductStatus,
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub active: Option<bool>,
}

// Cadastro pela tela de código de barras
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeProductPayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."), custom(function = "validate_not_blank"))]
    pub name: String,

    /// Assume o código de barras quando ausente
    pub code: Option<String>,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub supplier: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub cost: Decimal,

    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    #[serde(default)]
    pub quantity: i32,

    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    #[serde(default = "default_min_stock")]
    pub min_stock: i32,
}

// Campos editáveis pela tela de código de barras
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeProductUpdatePayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    pub name: String,

    pub description: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub supplier: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub cost: Decimal,

    #[validate(range(min = 0, message = "O estoque mínimo não pode ser negativo."))]
    pub min_stock: i32,

    pub active: bool,
}

// Entrada / saída pelo inventário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockChangePayload {
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,

    pub reason: Option<String>,
    pub reference: Option<String>,

    /// Só na saída: registra como empréstimo
    #[serde(default)]
    pub loan: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub new_quantity: i32,

    pub reason: Option<String>,
}

// Entrada / saída por leitura de código de barras
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanStockPayload {
    #[validate(length(min = 1, message = "O código de barras é obrigatório."))]
    pub barcode: String,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,

    pub reason: Option<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBarcodePayload {
    pub code: String,
    #[serde(rename = "type", default)]
    pub symbology: Symbology,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBarcodePayload {
    #[validate(length(min = 1, max = 80, message = "Os dados são obrigatórios."))]
    pub data: String,
    #[serde(rename = "type", default)]
    pub symbology: Symbology,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQrPayload {
    #[validate(length(min = 1, message = "Os dados são obrigatórios."))]
    pub data: String,

    #[validate(range(min = 1, max = 40, message = "O tamanho deve estar entre 1 e 40."))]
    pub size: Option<u32>,

    #[serde(default)]
    pub error_correction: ErrorCorrection,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchLabelPayload {
    pub product_ids: Vec<Uuid>,
    #[serde(default)]
    pub include_qr: bool,
}

// ---
// Filtros
// ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Código, nome ou descrição
    pub search: Option<String>,
    pub status: Option<ProductStatus>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductSearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub low_stock: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MovementsQuery {
    pub limit: Option<i64>,
}

impl MovementsQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 500)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LabelQuery {
    pub include_qr: Option<bool>,
}

// ---
// Respostas
// ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    pub products: Vec<ProductView>,
    pub stats: InventoryStats,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub product: ProductView,
    pub movements: Vec<MovementEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockOperationResult {
    pub product: ProductView,
    pub movement: StockMovement,
    pub low_stock_alert: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyBarcodeResponse {
    pub valid: bool,
    pub message: String,
    pub exists: bool,
    pub product: Option<ProductView>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeImageResponse {
    pub data: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub image: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelFile {
    pub product_id: Uuid,
    pub file_name: String,
    pub pdf_base64: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelFailure {
    pub product_id: Uuid,
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchLabelResponse {
    pub labels: Vec<LabelFile>,
    pub errors: Vec<LabelFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movements_limit_is_capped() {
        assert_eq!(MovementsQuery::default().limit(), 50);
        assert_eq!(MovementsQuery { limit: Some(5000) }.limit(), 500);
        assert_eq!(MovementsQuery { limit: Some(0) }.limit(), 1);
    }

    #[test]
    fn stock_change_needs_positive_quantity() {
        let payload = StockChangePayload { quantity: 0, reason: None, reference: None, loan: false };
        assert!(payload.validate().is_err());
        let payload = StockChangePayload { quantity: 3, ..payload };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn barcode_product_requires_a_name() {
        let payload: BarcodeProductPayload =
            serde_json::from_str(r#"{"name": "  ", "price": 10, "cost": 5}"#).unwrap();
        assert_eq!(payload.min_stock, 10);
        assert!(payload.validate().unwrap_err().field_errors().contains_key("name"));
    }

    #[test]
    fn stock_level_thresholds() {
        assert_eq!(StockLevel::from_quantity(11), StockLevel::Sufficient);
        assert_eq!(StockLevel::from_quantity(10), StockLevel::Low);
        assert_eq!(StockLevel::from_quantity(6), StockLevel::Low);
        assert_eq!(StockLevel::from_quantity(5), StockLevel::Critical);
        assert_eq!(StockLevel::from_quantity(0), StockLevel::Critical);
    }
}
