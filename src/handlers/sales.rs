// src/handlers/sales.rs

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
        rbac::{PermAccessFullReports, PermCreate, PermEdit, PermView, RequirePermission},
    },
    models::{
        audit::{AppModule, AuditAction},
        sales::{
            Client, ClientFilter, ClientPayload, CreateSalePayload, DateRangeQuery, SaleDetail, SaleFilter,
            SaleListResponse, SalesReport,
        },
    },
    services::{document_service::sale_invoice, sales_service::annulment_reason},
};

// ---
// Clientes
// ---

#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Sales",
    params(ClientFilter),
    responses((status = 200, description = "Clientes", body = Vec<Client>)),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<ClientFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let clients = app_state
        .sales_service
        .list_clients(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(clients))
}

#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Sales",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Client),
        (status = 409, description = "Documento já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermCreate>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .sales_service
        .create_client(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Create,
            AppModule::Sales,
            &format!("Cliente {} ({}) creado", client.name, client.document),
            ip.as_deref(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(client)))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Client),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let client = app_state
        .sales_service
        .get_client(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(client))
}

#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = ClientPayload,
    responses((status = 200, description = "Cliente atualizado", body = Client)),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .sales_service
        .update_client(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Sales,
            &format!("Cliente {} editado", client.name),
            ip.as_deref(),
        )
        .await;

    Ok(Json(client))
}

// ---
// Vendas
// ---

#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(SaleFilter),
    responses((status = 200, description = "Vendas e estatísticas", body = SaleListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<SaleFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .sales_service
        .list_sales(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda registrada e estoque baixado", body = SaleDetail),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermCreate>,
    Json(payload): Json<CreateSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .sales_service
        .create_sale(&app_state.db_pool, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Create,
            AppModule::Sales,
            &format!(
                "Venta {} registrada por {} ({} líneas)",
                detail.summary.sale.number,
                detail.summary.sale.total,
                detail.lines.len()
            ),
            ip.as_deref(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda com linhas", body = SaleDetail),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .sales_service
        .get_sale(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/sales/{id}/annul",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda anulada e estoque devolvido", body = SaleDetail),
        (status = 409, description = "Venda já anulada")
    ),
    security(("api_jwt" = []))
)]
pub async fn annul_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEdit>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .sales_service
        .annul_sale(&app_state.db_pool, id, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Sales,
            &annulment_reason(&detail.summary.sale.number),
            ip.as_deref(),
        )
        .await;

    Ok(Json(detail))
}

// GET /api/sales/{id}/invoice.pdf
#[utoipa::path(
    get,
    path = "/api/sales/{id}/invoice.pdf",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses((status = 200, description = "Factura de venta em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn sale_invoice_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .sales_service
        .get_sale(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .render(&sale_invoice(&detail, user.0.display_name(), Utc::now()))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let number = &detail.summary.sale.number;
    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Export,
            AppModule::Sales,
            &format!("Factura {} exportada", number),
            ip.as_deref(),
        )
        .await;

    Ok(pdf_attachment(&format!("factura_{}.pdf", number), pdf_bytes))
}

#[utoipa::path(
    get,
    path = "/api/sales/report",
    tag = "Sales",
    params(DateRangeQuery),
    responses((status = 200, description = "Totais, série diária e produtos mais vendidos", body = SalesReport)),
    security(("api_jwt" = []))
)]
pub async fn sales_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAccessFullReports>,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .sales_service
        .report(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
