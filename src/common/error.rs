// src/common/error.rs

use std::{collections::HashMap, sync::LazyLock};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Nosso tipo de erro de domínio. Tudo que sai de repositórios e serviços passa por aqui.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Auth / Usuários ---
    #[error("Nome de usuário já existe")]
    UsernameAlreadyExists,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Usuário inativo")]
    InactiveUser,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Cargo não encontrado")]
    RoleNotFound,

    #[error("Permissão negada: {0}")]
    PermissionDenied(&'static str),

    #[error("Operação não permitida sobre o próprio usuário")]
    CannotModifySelf,

    // --- Inventário / Códigos de barras ---
    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Código de produto já existe")]
    ProductCodeAlreadyExists,

    #[error("Código de barras já existe")]
    BarcodeAlreadyExists,

    #[error("SKU já existe")]
    SkuAlreadyExists,

    #[error("Código de barras inválido: {0}")]
    InvalidBarcode(String),

    #[error("Estoque insuficiente para {product}: disponível {available}, solicitado {requested}")]
    InsufficientStock {
        product: String,
        available: i32,
        requested: i32,
    },

    #[error("Quantidade inválida")]
    InvalidQuantity,

    #[error("Código lido não cadastrado: {0}")]
    UnknownBarcode(String),

    #[error("Dados do QR inválidos: {0}")]
    QrError(#[from] qrcode::types::QrError),

    // --- Clientes / Vendas ---
    #[error("Cliente não encontrado")]
    ClientNotFound,

    #[error("Documento de cliente já existe")]
    ClientDocumentAlreadyExists,

    #[error("Venda não encontrada")]
    SaleNotFound,

    #[error("Venda já anulada")]
    SaleAlreadyAnnulled,

    #[error("Documento sem linhas")]
    EmptyDocument,

    #[error("Desconto maior que o total")]
    DiscountExceedsTotal,

    // --- Compras ---
    #[error("Compra não encontrada")]
    PurchaseNotFound,

    #[error("Número de fatura já existe")]
    InvoiceNumberAlreadyExists,

    #[error("Tipo de arquivo não permitido: {0}")]
    InvalidDocumentType(String),

    #[error("Arquivo não encontrado")]
    DocumentNotFound,

    // --- Ordens / Fornecedores / Preços ---
    #[error("Ordem não encontrada")]
    OrderNotFound,

    #[error("Ordem bloqueada no estado atual")]
    OrderLocked,

    #[error("Fornecedor não encontrado")]
    SupplierNotFound,

    #[error("NIT já existe")]
    NitAlreadyExists,

    #[error("Preço não encontrado")]
    PriceNotFound,

    #[error("Registro em uso")]
    RecordInUse,

    #[error("Registro relacionado não encontrado")]
    ReferenceNotFound,

    // --- Documentos ---
    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro ao gerar PDF: {0}")]
    PdfError(#[from] genpdf::error::Error),

    #[error("Erro de imagem: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Erro de E/S: {0}")]
    IoError(#[from] std::io::Error),

    // --- Infra ---
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Chave estável usada pelo catálogo de mensagens e devolvida ao cliente.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::UsernameAlreadyExists => "USERNAME_ALREADY_EXISTS",
            AppError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InactiveUser => "USER_INACTIVE",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::RoleNotFound => "ROLE_NOT_FOUND",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::CannotModifySelf => "CANNOT_MODIFY_SELF",
            AppError::ProductNotFound => "PRODUCT_NOT_FOUND",
            AppError::ProductCodeAlreadyExists => "PRODUCT_CODE_ALREADY_EXISTS",
            AppError::BarcodeAlreadyExists => "BARCODE_ALREADY_EXISTS",
            AppError::SkuAlreadyExists => "SKU_ALREADY_EXISTS",
            AppError::InvalidBarcode(_) => "INVALID_BARCODE",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::InvalidQuantity => "INVALID_QUANTITY",
            AppError::UnknownBarcode(_) => "UNKNOWN_BARCODE",
            AppError::QrError(_) => "INVALID_QR_DATA",
            AppError::ClientNotFound => "CLIENT_NOT_FOUND",
            AppError::ClientDocumentAlreadyExists => "CLIENT_DOCUMENT_ALREADY_EXISTS",
            AppError::SaleNotFound => "SALE_NOT_FOUND",
            AppError::SaleAlreadyAnnulled => "SALE_ALREADY_ANNULLED",
            AppError::EmptyDocument => "EMPTY_DOCUMENT",
            AppError::DiscountExceedsTotal => "DISCOUNT_EXCEEDS_TOTAL",
            AppError::PurchaseNotFound => "PURCHASE_NOT_FOUND",
            AppError::InvoiceNumberAlreadyExists => "INVOICE_NUMBER_ALREADY_EXISTS",
            AppError::InvalidDocumentType(_) => "INVALID_DOCUMENT_TYPE",
            AppError::DocumentNotFound => "DOCUMENT_NOT_FOUND",
            AppError::OrderNotFound => "ORDER_NOT_FOUND",
            AppError::OrderLocked => "ORDER_LOCKED",
            AppError::SupplierNotFound => "SUPPLIER_NOT_FOUND",
            AppError::NitAlreadyExists => "NIT_ALREADY_EXISTS",
            AppError::PriceNotFound => "PRICE_NOT_FOUND",
            AppError::RecordInUse => "RECORD_IN_USE",
            AppError::ReferenceNotFound => "REFERENCE_NOT_FOUND",
            AppError::FontNotFound(_)
            | AppError::PdfError(_)
            | AppError::ImageError(_)
            | AppError::IoError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::CannotModifySelf
            | AppError::InvalidBarcode(_)
            | AppError::InsufficientStock { .. }
            | AppError::InvalidQuantity
            | AppError::QrError(_)
            | AppError::EmptyDocument
            | AppError::DiscountExceedsTotal
            | AppError::InvalidDocumentType(_) => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials | AppError::InactiveUser | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }

            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            AppError::UserNotFound
            | AppError::RoleNotFound
            | AppError::ProductNotFound
            | AppError::UnknownBarcode(_)
            | AppError::ClientNotFound
            | AppError::SaleNotFound
            | AppError::PurchaseNotFound
            | AppError::DocumentNotFound
            | AppError::OrderNotFound
            | AppError::SupplierNotFound
            | AppError::PriceNotFound
            | AppError::ReferenceNotFound => StatusCode::NOT_FOUND,

            AppError::UsernameAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::ProductCodeAlreadyExists
            | AppError::BarcodeAlreadyExists
            | AppError::SkuAlreadyExists
            | AppError::ClientDocumentAlreadyExists
            | AppError::SaleAlreadyAnnulled
            | AppError::InvoiceNumberAlreadyExists
            | AppError::OrderLocked
            | AppError::NitAlreadyExists
            | AppError::RecordInUse => StatusCode::CONFLICT,

            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Dados extras que acompanham a mensagem traduzida.
    fn details(&self) -> Option<Value> {
        match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::InvalidBarcode(reason) => Some(json!({ "reason": reason })),
            AppError::InsufficientStock { product, available, requested } => Some(json!({
                "product": product,
                "available": available,
                "requested": requested,
            })),
            AppError::PermissionDenied(slug) => Some(json!({ "permission": slug })),
            AppError::UnknownBarcode(code) => Some(json!({
                "code": code,
                "suggestion": "create_product",
            })),
            AppError::QrError(e) => Some(json!({ "reason": e.to_string() })),
            AppError::InvalidDocumentType(ext) => Some(json!({
                "extension": ext,
                "allowed": crate::services::purchase_service::ALLOWED_DOCUMENT_EXTENSIONS,
            })),
            _ => None,
        }
    }

    /// Converte o erro de domínio numa resposta HTTP já traduzida.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        ApiError {
            status,
            error: store.translate(&locale.0, self.code()),
            details: self.details(),
        }
    }
}

// Resposta de erro pronta para o cliente
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

static DEFAULT_STORE: LazyLock<I18nStore> = LazyLock::new(I18nStore::new);

// Usado pelo middleware, onde ainda não temos o Locale do cliente.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &DEFAULT_STORE).into_response()
    }
}

/// Traduz violações de constraint do Postgres num erro de domínio (INSERT/UPDATE).
/// `on_unique` recebe o nome da constraint violada; FK aqui é pai inexistente.
pub fn map_db_error(e: sqlx::Error, on_unique: impl Fn(&str) -> Option<AppError>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(mapped) = on_unique(db_err.constraint().unwrap_or_default()) {
                return mapped;
            }
        }
        if db_err.is_foreign_key_violation() {
            return AppError::ReferenceNotFound;
        }
    }
    e.into()
}

/// DELETE: FK violada quer dizer que outros dados ainda apontam para a linha.
pub fn map_delete_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::RecordInUse;
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn insufficient_stock_carries_quantities() {
        let err = AppError::InsufficientStock {
            product: "Silla".into(),
            available: 2,
            requested: 5,
        };
        let api = err.to_api_error(&Locale("es".into()), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["available"], 2);
        assert_eq!(details["requested"], 5);
    }

    #[test]
    fn validation_details_are_grouped_by_field() {
        let mut errors = ValidationErrors::new();
        let mut e = ValidationError::new("length");
        e.message = Some("obrigatório".into());
        errors.add("name", e);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("en".into()), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.details.expect("details")["name"][0], "obrigatório");
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let api = AppError::FontNotFound("./fonts".into())
            .to_api_error(&Locale("en".into()), &I18nStore::new());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(api.details.is_none());
        assert!(!api.error.contains("fonts"));
    }

    #[test]
    fn unknown_scan_suggests_creating_the_product() {
        let api = AppError::UnknownBarcode("7701234567897".into())
            .to_api_error(&Locale("es".into()), &I18nStore::new());
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        let details = api.details.expect("details");
        assert_eq!(details["code"], "7701234567897");
        assert_eq!(details["suggestion"], "create_product");
    }

    // Erro de banco mínimo para exercitar o mapeamento sem Postgres
    #[derive(Debug)]
    struct ConstraintError {
        foreign_key: bool,
    }

    impl std::fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("violação de constraint")
        }
    }

    impl std::error::Error for ConstraintError {}

    impl sqlx::error::DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "violação de constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.foreign_key {
                sqlx::error::ErrorKind::ForeignKeyViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }
    }

    fn db_error(foreign_key: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintError { foreign_key }))
    }

    #[test]
    fn missing_parent_on_write_is_not_found() {
        let err = map_db_error(db_error(true), |_| None);
        assert!(matches!(err, AppError::ReferenceNotFound));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn referenced_row_on_delete_is_in_use() {
        let err = map_delete_error(db_error(true));
        assert!(matches!(err, AppError::RecordInUse));
        assert_eq!(err.status(), StatusCode::CONFLICT);

        assert!(matches!(map_delete_error(db_error(false)), AppError::DatabaseError(_)));
    }

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(AppError::NitAlreadyExists.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::SaleAlreadyAnnulled.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::PermissionDenied("users:manage").status(), StatusCode::FORBIDDEN);
    }
}
