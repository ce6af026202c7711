// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::pdf_attachment,
    middleware::{
        auth::AuthenticatedUser,
        client_ip::ClientIp,
        i18n::Locale,
        rbac::{PermCreateInventory, PermDelete, PermEditInventory, PermView, RequirePermission},
    },
    models::{
        audit::{AppModule, AuditAction},
        product::{
            AdjustStockPayload, CreateProductPayload, MovementEntry, MovementKind, MovementsQuery,
            ProductDetail, ProductFilter, ProductListResponse, ProductView, StockChangePayload,
            StockOperationResult, UpdateProductPayload,
        },
    },
    services::{
        document_service::inventory_report,
        inventory_service::blank_to_none,
        stock_ledger::MovementMeta,
    },
};

// ---
// Produtos
// ---

#[utoipa::path(
    get,
    path = "/api/inventory/products",
    tag = "Inventory",
    params(ProductFilter),
    responses((status = 200, description = "Produtos com nível de estoque e resumo", body = ProductListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .inventory_service
        .list_products(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/inventory/products",
    tag = "Inventory",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado com o movimento inicial", body = ProductView),
        (status = 409, description = "Código, código de barras ou SKU duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermCreateInventory>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .create_product(&app_state.db_pool, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Create,
            AppModule::Inventory,
            &format!("Producto {} - {} creado", product.product.code, product.product.name),
            ip.as_deref(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto e últimos movimentos", body = ProductDetail),
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
        .inventory_service
        .get_product(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

#[utoipa::path(
    put,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses((status = 200, description = "Produto atualizado", body = ProductView)),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEditInventory>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .update_product(&app_state.db_pool, id, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Inventory,
            &format!("Producto {} editado", product.product.code),
            ip.as_deref(),
        )
        .await;

    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto removido"),
        (status = 409, description = "Produto referenciado por vendas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .inventory_service
        .delete_product(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Delete,
            AppModule::Inventory,
            &format!("Producto {} - {} eliminado", product.code, product.name),
            ip.as_deref(),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/inventory/products/{id}/history",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Últimos 100 movimentos", body = Vec<MovementEntry>)),
    security(("api_jwt" = []))
)]
pub async fn product_history(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .inventory_service
        .history(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(movements))
}

// ---
// Movimentos (livro de estoque)
// ---

async fn register_movement(
    app_state: &AppState,
    locale: &Locale,
    user: &AuthenticatedUser,
    ip: &ClientIp,
    id: Uuid,
    kind: MovementKind,
    quantity: i32,
    reason: Option<&str>,
    reference: Option<&str>,
) -> Result<StockOperationResult, ApiError> {
    let meta = MovementMeta {
        reason: blank_to_none(reason),
        reference: blank_to_none(reference),
        barcode_scanned: None,
        user_id: Some(user.0.id),
    };

    let result = app_state
        .inventory_service
        .move_stock(&app_state.db_pool, id, kind, quantity, meta)
        .await
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Inventory,
            &format!(
                "{} de {} unidades en {} ({} -> {})",
                kind.label(),
                result.movement.quantity,
                result.product.product.code,
                result.movement.previous_quantity,
                result.movement.new_quantity
            ),
            ip.as_deref(),
        )
        .await;

    Ok(result)
}

#[utoipa::path(
    post,
    path = "/api/inventory/products/{id}/entry",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = StockChangePayload,
    responses((status = 200, description = "Entrada registrada", body = StockOperationResult)),
    security(("api_jwt" = []))
)]
pub async fn stock_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEditInventory>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockChangePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = register_movement(
        &app_state,
        &locale,
        &user,
        &ip,
        id,
        MovementKind::Entry,
        payload.quantity,
        payload.reason.as_deref(),
        payload.reference.as_deref(),
    )
    .await?;

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/inventory/products/{id}/exit",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = StockChangePayload,
    responses(
        (status = 200, description = "Saída registrada (com alerta de estoque baixo)", body = StockOperationResult),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn stock_exit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEditInventory>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockChangePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let kind = if payload.loan { MovementKind::Loan } else { MovementKind::Exit };
    let result = register_movement(
        &app_state,
        &locale,
        &user,
        &ip,
        id,
        kind,
        payload.quantity,
        payload.reason.as_deref(),
        payload.reference.as_deref(),
    )
    .await?;

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/inventory/products/{id}/adjust",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = AdjustStockPayload,
    responses((status = 200, description = "Ajuste registrado", body = StockOperationResult)),
    security(("api_jwt" = []))
)]
pub async fn stock_adjust(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEditInventory>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = register_movement(
        &app_state,
        &locale,
        &user,
        &ip,
        id,
        MovementKind::Adjustment,
        payload.new_quantity,
        payload.reason.as_deref(),
        None,
    )
    .await?;

    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/inventory/movements",
    tag = "Inventory",
    params(MovementsQuery),
    responses((status = 200, description = "Movimentos mais recentes", body = Vec<MovementEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(query): Query<MovementsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .inventory_service
        .recent_movements(query.limit())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(movements))
}

#[utoipa::path(
    get,
    path = "/api/inventory/categories",
    tag = "Inventory",
    responses((status = 200, description = "Categorias distintas", body = Vec<String>)),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .inventory_service
        .categories()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

// GET /api/inventory/report.pdf
#[utoipa::path(
    get,
    path = "/api/inventory/report.pdf",
    tag = "Inventory",
    params(ProductFilter),
    responses((status = 200, description = "PDF do inventário", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn inventory_report_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (products, stats) = app_state
        .inventory_service
        .report_data(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let report = inventory_report(&products, &stats, user.0.display_name(), Utc::now());
    let pdf_bytes = app_state
        .document_service
        .render(&report)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Export,
            AppModule::Inventory,
            &format!("Reporte de inventario ({} productos)", products.len()),
            ip.as_deref(),
        )
        .await;

    let file_name = format!("inventario_{}.pdf", Utc::now().format("%Y%m%d"));
    Ok(pdf_attachment(&file_name, pdf_bytes))
}
