// src/handlers/orders.rs

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
        rbac::{ensure_permission, PermCreateOrders, PermDelete, PermEditOrders, PermView, RequirePermission},
    },
    models::{
        audit::{AppModule, AuditAction},
        orders::{OrderDetail, OrderFilter, OrderListResponse, OrderPayload, OrderStatus, OrderStatusPayload},
        rbac::Permission,
    },
    services::document_service::{order_document, orders_report},
};

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrderFilter),
    responses((status = 200, description = "Ordens e contagens", body = OrderListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .order_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = OrderPayload,
    responses(
        (status = 201, description = "Ordem criada com número sequencial", body = OrderDetail),
        (status = 400, description = "Sem fornecedor ou sem linhas válidas")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermCreateOrders>,
    Json(payload): Json<OrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .order_service
        .create(&app_state.db_pool, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Create,
            AppModule::Orders,
            &format!("Orden {} creada para {}", detail.order.number, detail.order.supplier_name),
            ip.as_deref(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses(
        (status = 200, description = "Ordem com linhas", body = OrderDetail),
        (status = 404, description = "Ordem não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .order_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    request_body = OrderPayload,
    responses(
        (status = 200, description = "Ordem atualizada", body = OrderDetail),
        (status = 409, description = "Ordem completada ou cancelada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEditOrders>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .order_service
        .update(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Orders,
            &format!("Orden {} editada", detail.order.number),
            ip.as_deref(),
        )
        .await;

    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/status",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    request_body = OrderStatusPayload,
    responses(
        (status = 200, description = "Estado alterado", body = OrderDetail),
        (status = 403, description = "Aprovar exige permissão de aprovação"),
        (status = 409, description = "Ordem em estado final")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEditOrders>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrderStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    // Aprovar exige a permissão própria, além de editar ordens
    if payload.status == OrderStatus::Approved {
        ensure_permission(&app_state, &user.0, Permission::ApproveOrders)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    }

    let detail = app_state
        .order_service
        .set_status(&app_state.db_pool, id, payload.status, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Orders,
            &format!("Orden {} cambiada a {}", detail.order.number, payload.status.label()),
            ip.as_deref(),
        )
        .await;

    Ok(Json(detail))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses(
        (status = 204, description = "Ordem removida"),
        (status = 409, description = "Ordem completada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .order_service
        .delete(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Delete,
            AppModule::Orders,
            &format!("Orden {} eliminada", order.number),
            ip.as_deref(),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// PDFs
// ---

#[utoipa::path(
    get,
    path = "/api/orders/{id}/pdf",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses((status = 200, description = "Ordem em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn order_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .order_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .render(&order_document(&detail, user.0.display_name(), Utc::now()))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Export,
            AppModule::Orders,
            &format!("Orden {} exportada", detail.order.number),
            ip.as_deref(),
        )
        .await;

    Ok(pdf_attachment(&format!("orden_{}.pdf", detail.order.number), pdf_bytes))
}

// GET /api/orders/report.pdf?kind
#[utoipa::path(
    get,
    path = "/api/orders/report.pdf",
    tag = "Orders",
    params(OrderFilter),
    responses((status = 200, description = "Relatório de ordens (paisagem)", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn orders_report_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .order_service
        .report(filter.kind)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .render(&orders_report(&report.orders, &report.counts, user.0.display_name(), Utc::now()))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Export,
            AppModule::Orders,
            &format!("Reporte de órdenes ({} registros)", report.orders.len()),
            ip.as_deref(),
        )
        .await;

    let file_name = format!("ordenes_{}.pdf", Utc::now().format("%Y%m%d"));
    Ok(pdf_attachment(&file_name, pdf_bytes))
}
