// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermAccessReports, PermView, RequirePermission},
    },
    models::dashboard::{DashboardQuery, DashboardSummary, ReportsOverview},
};

// GET /api/dashboard?period&currency
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Indicadores do período", body = DashboardSummary),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .dashboard_service
        .summary(&app_state.db_pool, &query, Utc::now().date_naive())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}

// GET /api/reports/overview
#[utoipa::path(
    get,
    path = "/api/reports/overview",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Contagens e somas de todos os módulos", body = ReportsOverview),
        (status = 403, description = "Sem acesso a relatórios")
    ),
    security(("api_jwt" = []))
)]
pub async fn reports_overview(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAccessReports>,
) -> Result<impl IntoResponse, ApiError> {
    let overview = app_state
        .dashboard_service
        .reports_overview()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(overview))
}
