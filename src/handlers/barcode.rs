// src/handlers/barcode.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::{Page, PageParams},
        error::{ApiError, AppError},
    },
    config::AppState,
    handlers::pdf_attachment,
    middleware::{
        auth::AuthenticatedUser,
        client_ip::ClientIp,
        i18n::Locale,
        rbac::{PermCreateBarcode, PermEditBarcode, PermView, RequirePermission},
    },
    models::{
        audit::{AppModule, AuditAction},
        product::{
            BarcodeProductPayload, BarcodeProductUpdatePayload, BarcodeStats, BatchLabelPayload,
            BatchLabelResponse, CodeImageResponse, GenerateBarcodePayload, GenerateQrPayload, LabelQuery,
            MovementKind, ProductDetail, ProductSearchQuery, ProductView, ScanStockPayload,
            StockOperationResult, VerifyBarcodePayload, VerifyBarcodeResponse,
        },
    },
    services::barcode_service::label_file_name,
};

// ---
// Leitura e consulta
// ---

#[utoipa::path(
    get,
    path = "/api/barcode/scan/{code}",
    tag = "Barcode",
    params(("code" = String, Path, description = "Código de barras, QR, código interno ou SKU")),
    responses(
        (status = 200, description = "Produto ativo encontrado", body = ProductView),
        (status = 404, description = "Código desconhecido (sugere cadastrar o produto)")
    ),
    security(("api_jwt" = []))
)]
pub async fn scan(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .barcode_service
        .scan(&code)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/barcode/verify",
    tag = "Barcode",
    request_body = VerifyBarcodePayload,
    responses((status = 200, description = "Resultado da verificação", body = VerifyBarcodeResponse)),
    security(("api_jwt" = []))
)]
pub async fn verify(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Json(payload): Json<VerifyBarcodePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .barcode_service
        .verify(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/barcode/search",
    tag = "Barcode",
    params(ProductSearchQuery),
    responses((status = 200, description = "Até 50 produtos ativos", body = Vec<ProductView>)),
    security(("api_jwt" = []))
)]
pub async fn search(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(query): Query<ProductSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .barcode_service
        .search(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/barcode/products",
    tag = "Barcode",
    params(PageParams),
    responses((status = 200, description = "Produtos ativos paginados", body = Page<ProductView>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .barcode_service
        .list(&params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/barcode/products/{id}",
    tag = "Barcode",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto e últimos 10 movimentos", body = ProductDetail),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .barcode_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

#[utoipa::path(
    get,
    path = "/api/barcode/stats",
    tag = "Barcode",
    responses((status = 200, description = "Totais de estoque e últimos movimentos", body = BarcodeStats)),
    security(("api_jwt" = []))
)]
pub async fn stats(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .barcode_service
        .stats()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}

// ---
// Cadastro
// ---

#[utoipa::path(
    post,
    path = "/api/barcode/products",
    tag = "Barcode",
    request_body = BarcodeProductPayload,
    responses(
        (status = 201, description = "Produto cadastrado pelo leitor", body = ProductView),
        (status = 409, description = "Código de barras já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermCreateBarcode>,
    Json(payload): Json<BarcodeProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .barcode_service
        .create(&app_state.db_pool, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Create,
            AppModule::Barcode,
            &format!("Producto {} creado con código {}", product.product.name, product.product.barcode),
            ip.as_deref(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/barcode/products/{id}",
    tag = "Barcode",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = BarcodeProductUpdatePayload,
    responses((status = 200, description = "Produto atualizado", body = ProductView)),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEditBarcode>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BarcodeProductUpdatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .barcode_service
        .update(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Barcode,
            &format!("Producto {} editado", product.product.code),
            ip.as_deref(),
        )
        .await;

    Ok(Json(product))
}

// ---
// Entrada / saída pelo leitor
// ---

async fn scan_movement(
    app_state: &AppState,
    locale: &Locale,
    user: &AuthenticatedUser,
    ip: &ClientIp,
    kind: MovementKind,
    payload: &ScanStockPayload,
) -> Result<StockOperationResult, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(locale, &app_state.i18n_store))?;

    let result = app_state
        .barcode_service
        .scan_stock(&app_state.db_pool, kind, payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Barcode,
            &format!(
                "{} por escáner: {} unidades de {} ({})",
                kind.label(),
                result.movement.quantity,
                result.product.product.code,
                payload.barcode.trim()
            ),
            ip.as_deref(),
        )
        .await;

    Ok(result)
}

#[utoipa::path(
    post,
    path = "/api/barcode/inventory/entry",
    tag = "Barcode",
    request_body = ScanStockPayload,
    responses(
        (status = 200, description = "Entrada registrada", body = StockOperationResult),
        (status = 404, description = "Código desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn scan_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEditBarcode>,
    Json(payload): Json<ScanStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = scan_movement(&app_state, &locale, &user, &ip, MovementKind::Entry, &payload).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/barcode/inventory/exit",
    tag = "Barcode",
    request_body = ScanStockPayload,
    responses(
        (status = 200, description = "Saída registrada", body = StockOperationResult),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn scan_exit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEditBarcode>,
    Json(payload): Json<ScanStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = scan_movement(&app_state, &locale, &user, &ip, MovementKind::Exit, &payload).await?;
    Ok(Json(result))
}

// ---
// Imagens e etiquetas
// ---

#[utoipa::path(
    post,
    path = "/api/barcode/generate",
    tag = "Barcode",
    request_body = GenerateBarcodePayload,
    responses(
        (status = 200, description = "Imagem PNG em data URL", body = CodeImageResponse),
        (status = 400, description = "Dados incompatíveis com o tipo")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_barcode(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Json(payload): Json<GenerateBarcodePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let image = app_state
        .barcode_service
        .barcode_image(&payload)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(image))
}

#[utoipa::path(
    post,
    path = "/api/barcode/qr",
    tag = "Barcode",
    request_body = GenerateQrPayload,
    responses((status = 200, description = "QR PNG em data URL", body = CodeImageResponse)),
    security(("api_jwt" = []))
)]
pub async fn generate_qr(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Json(payload): Json<GenerateQrPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let image = app_state
        .barcode_service
        .qr_image(&payload)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(image))
}

#[utoipa::path(
    get,
    path = "/api/barcode/products/{id}/label",
    tag = "Barcode",
    params(("id" = Uuid, Path, description = "ID do produto"), LabelQuery),
    responses((status = 200, description = "Etiqueta em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn product_label(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
    Query(query): Query<LabelQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (product, pdf_bytes) = app_state
        .barcode_service
        .label(id, query.include_qr.unwrap_or(false), user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(pdf_attachment(&label_file_name(&product), pdf_bytes))
}

#[utoipa::path(
    post,
    path = "/api/barcode/labels/batch",
    tag = "Barcode",
    request_body = BatchLabelPayload,
    responses((status = 200, description = "Etiquetas em base64 e falhas por produto", body = BatchLabelResponse)),
    security(("api_jwt" = []))
)]
pub async fn batch_labels(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermView>,
    Json(payload): Json<BatchLabelPayload>,
) -> impl IntoResponse {
    Json(app_state.barcode_service.batch_labels(&payload, user.0.id).await)
}
