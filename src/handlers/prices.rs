// src/handlers/prices.rs

use axum::{
    extract::{Path, State},
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
        rbac::{PermEdit, PermView, RequirePermission},
    },
    models::{
        audit::{AppModule, AuditAction},
        pricing::{
            AssignPricePayload, ClientPrice, ClientPriceHistory, ClientPriceView, ReplicatePricePayload,
            ReplicationResult,
        },
    },
    services::{document_service::client_price_list, purchase_service::sanitize_file_name},
};

#[utoipa::path(
    post,
    path = "/api/prices",
    tag = "Prices",
    request_body = AssignPricePayload,
    responses(
        (status = 200, description = "Preço criado ou atualizado (com histórico)", body = ClientPriceView),
        (status = 404, description = "Cliente ou produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_price(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEdit>,
    Json(payload): Json<AssignPricePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let price = app_state
        .pricing_service
        .assign(&app_state.db_pool, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Prices,
            &format!(
                "Precio de {} para {}: {}",
                price.product_code, price.client_name, price.price.final_price
            ),
            ip.as_deref(),
        )
        .await;

    Ok(Json(price))
}

#[utoipa::path(
    post,
    path = "/api/prices/{id}/deactivate",
    tag = "Prices",
    params(("id" = Uuid, Path, description = "ID do preço")),
    responses(
        (status = 200, description = "Preço desativado", body = ClientPrice),
        (status = 404, description = "Preço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_price(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEdit>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let price = app_state
        .pricing_service
        .deactivate(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Prices,
            &format!("Precio {} desactivado", price.id),
            ip.as_deref(),
        )
        .await;

    Ok(Json(price))
}

#[utoipa::path(
    get,
    path = "/api/prices/{id}/history",
    tag = "Prices",
    params(("id" = Uuid, Path, description = "ID do preço")),
    responses((status = 200, description = "Histórico de alterações", body = Vec<ClientPriceHistory>)),
    security(("api_jwt" = []))
)]
pub async fn price_history(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let history = app_state
        .pricing_service
        .history(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(history))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}/prices",
    tag = "Prices",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Preços ativos do cliente", body = Vec<ClientPriceView>)),
    security(("api_jwt" = []))
)]
pub async fn client_prices(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (_, prices) = app_state
        .pricing_service
        .client_prices(client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(prices))
}

#[utoipa::path(
    post,
    path = "/api/prices/replicate",
    tag = "Prices",
    request_body = ReplicatePricePayload,
    responses((status = 200, description = "Preço base aplicado a todos os clientes", body = ReplicationResult)),
    security(("api_jwt" = []))
)]
pub async fn replicate_price(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEdit>,
    Json(payload): Json<ReplicatePricePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .pricing_service
        .replicate(&app_state.db_pool, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Prices,
            &format!(
                "Precio base {} replicado: {} nuevos, {} actualizados",
                payload.base_price, result.created, result.updated
            ),
            ip.as_deref(),
        )
        .await;

    Ok(Json(result))
}

// GET /api/clients/{id}/prices.pdf
#[utoipa::path(
    get,
    path = "/api/clients/{id}/prices.pdf",
    tag = "Prices",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Lista de preços do cliente em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn price_list_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermView>,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (client, prices) = app_state
        .pricing_service
        .client_prices(client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .render(&client_price_list(&client, &prices, user.0.display_name(), Utc::now()))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Export,
            AppModule::Prices,
            &format!("Lista de precios de {} exportada", client.name),
            ip.as_deref(),
        )
        .await;

    let file_name = sanitize_file_name(&format!("precios_{}.pdf", client.document));
    Ok(pdf_attachment(&file_name, pdf_bytes))
}
