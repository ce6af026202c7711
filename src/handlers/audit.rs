// src/handlers/audit.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    common::{
        db_utils::PageParams,
        error::{ApiError, AppError},
    },
    config::AppState,
    handlers::pdf_attachment,
    middleware::{
        auth::AuthenticatedUser,
        client_ip::ClientIp,
        i18n::Locale,
        rbac::{PermManageUsers, RequirePermission},
    },
    models::audit::{AppModule, AuditAction, AuditFilter, AuditListResponse, PurgeQuery, PurgeResult},
    services::document_service::audit_report,
};

#[utoipa::path(
    get,
    path = "/api/audit",
    tag = "Audit",
    params(AuditFilter, PageParams),
    responses(
        (status = 200, description = "Eventos paginados e estatísticas", body = AuditListResponse),
        (status = 403, description = "Somente administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_entries(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageUsers>,
    Query(filter): Query<AuditFilter>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .audit_service
        .list(&filter, &params)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let stats = app_state
        .audit_service
        .stats()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(AuditListResponse { entries, stats }))
}

// GET /api/audit/export.pdf
#[utoipa::path(
    get,
    path = "/api/audit/export.pdf",
    tag = "Audit",
    params(AuditFilter),
    responses((status = 200, description = "Bitácora em PDF (até 500 eventos)", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn export_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermManageUsers>,
    Query(filter): Query<AuditFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .audit_service
        .export(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .render(&audit_report(&entries, user.0.display_name(), Utc::now()))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Export,
            AppModule::Audit,
            &format!("Bitácora exportada ({} registros)", entries.len()),
            ip.as_deref(),
        )
        .await;

    let file_name = format!("bitacora_{}.pdf", Utc::now().format("%Y%m%d"));
    Ok(pdf_attachment(&file_name, pdf_bytes))
}

// DELETE /api/audit?days=90
#[utoipa::path(
    delete,
    path = "/api/audit",
    tag = "Audit",
    params(PurgeQuery),
    responses(
        (status = 200, description = "Eventos antigos removidos", body = PurgeResult),
        (status = 400, description = "Dias menor que 1")
    ),
    security(("api_jwt" = []))
)]
pub async fn purge(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermManageUsers>,
    Query(query): Query<PurgeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .audit_service
        .purge(query.days(), &user.0.username, ip.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}
