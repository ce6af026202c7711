// src/handlers/suppliers.rs

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
        rbac::{PermCreate, PermDelete, PermEdit, PermView, RequirePermission},
    },
    models::{
        audit::{AppModule, AuditAction},
        supplier::{Supplier, SupplierFilter, SupplierListResponse, SupplierPayload, SupplierStatus, SupplierStatusPayload},
    },
    services::document_service::suppliers_report,
};

#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "Suppliers",
    params(SupplierFilter),
    responses((status = 200, description = "Fornecedores e contagens", body = SupplierListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<SupplierFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .supplier_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/suppliers",
    tag = "Suppliers",
    request_body = SupplierPayload,
    responses(
        (status = 201, description = "Fornecedor criado", body = Supplier),
        (status = 409, description = "NIT duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermCreate>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let supplier = app_state
        .supplier_service
        .create(&app_state.db_pool, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Create,
            AppModule::Suppliers,
            &format!("Proveedor {} creado", supplier.name),
            ip.as_deref(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    get,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor", body = Supplier),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = app_state
        .supplier_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supplier))
}

#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    request_body = SupplierPayload,
    responses((status = 200, description = "Fornecedor atualizado", body = Supplier)),
    security(("api_jwt" = []))
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let supplier = app_state
        .supplier_service
        .update(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Suppliers,
            &format!("Proveedor {} editado", supplier.name),
            ip.as_deref(),
        )
        .await;

    Ok(Json(supplier))
}

#[utoipa::path(
    post,
    path = "/api/suppliers/{id}/status",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    request_body = SupplierStatusPayload,
    responses((status = 200, description = "Estado alterado", body = Supplier)),
    security(("api_jwt" = []))
)]
pub async fn change_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = app_state
        .supplier_service
        .set_status(&app_state.db_pool, id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let state = match supplier.status {
        SupplierStatus::Active => "activado",
        SupplierStatus::Inactive => "desactivado",
    };
    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Suppliers,
            &format!("Proveedor {} {}", supplier.name, state),
            ip.as_deref(),
        )
        .await;

    Ok(Json(supplier))
}

#[utoipa::path(
    delete,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 204, description = "Fornecedor removido"),
        (status = 409, description = "Fornecedor em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = app_state
        .supplier_service
        .delete(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Delete,
            AppModule::Suppliers,
            &format!("Proveedor {} eliminado", supplier.name),
            ip.as_deref(),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/suppliers/report.pdf
#[utoipa::path(
    get,
    path = "/api/suppliers/report.pdf",
    tag = "Suppliers",
    params(SupplierFilter),
    responses((status = 200, description = "Relatório de fornecedores (paisagem)", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn suppliers_report_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<SupplierFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .supplier_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .render(&suppliers_report(
            &response.suppliers,
            &response.counts,
            user.0.display_name(),
            Utc::now(),
        ))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Export,
            AppModule::Suppliers,
            &format!("Reporte de proveedores ({} registros)", response.suppliers.len()),
            ip.as_deref(),
        )
        .await;

    let file_name = format!("proveedores_{}.pdf", Utc::now().format("%Y%m%d"));
    Ok(pdf_attachment(&file_name, pdf_bytes))
}
