// src/handlers/purchases.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::pdf_attachment,
    middleware::{
        auth::AuthenticatedUser,
        client_ip::ClientIp,
        i18n::Locale,
        rbac::{PermAccessFullReports, PermCreate, PermDelete, PermEdit, PermView, RequirePermission},
    },
    models::{
        audit::{AppModule, AuditAction},
        purchase::{Purchase, PurchaseFilter, PurchasePayload, PurchaseReport, PurchaseView},
    },
    services::{document_service::purchase_voucher, purchase_service::sanitize_file_name},
};

// Campo do formulário multipart com o arquivo
const DOCUMENT_FIELD: &str = "document";

fn missing_document() -> AppError {
    let mut errors = ValidationErrors::new();
    let mut err = ValidationError::new("required");
    err.message = Some("Envie o arquivo no campo 'document'.".into());
    errors.add(DOCUMENT_FIELD, err);
    AppError::ValidationError(errors)
}

#[utoipa::path(
    get,
    path = "/api/purchases",
    tag = "Purchases",
    params(PurchaseFilter),
    responses((status = 200, description = "Compras", body = Vec<PurchaseView>)),
    security(("api_jwt" = []))
)]
pub async fn list_purchases(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Query(filter): Query<PurchaseFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let purchases = app_state
        .purchase_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(purchases))
}

#[utoipa::path(
    post,
    path = "/api/purchases",
    tag = "Purchases",
    request_body = PurchasePayload,
    responses(
        (status = 201, description = "Compra registrada", body = PurchaseView),
        (status = 409, description = "Número de fatura duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermCreate>,
    Json(payload): Json<PurchasePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let purchase = app_state
        .purchase_service
        .create(&app_state.db_pool, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Create,
            AppModule::Purchases,
            &format!(
                "Compra {} de {} registrada",
                purchase.purchase.invoice_number, purchase.purchase.supplier
            ),
            ip.as_deref(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(purchase)))
}

#[utoipa::path(
    get,
    path = "/api/purchases/{id}",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Compra", body = PurchaseView),
        (status = 404, description = "Compra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = app_state
        .purchase_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(PurchaseView::from(purchase)))
}

#[utoipa::path(
    put,
    path = "/api/purchases/{id}",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    request_body = PurchasePayload,
    responses((status = 200, description = "Compra atualizada", body = PurchaseView)),
    security(("api_jwt" = []))
)]
pub async fn update_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEdit>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PurchasePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let purchase = app_state
        .purchase_service
        .update(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Purchases,
            &format!("Compra {} editada", purchase.purchase.invoice_number),
            ip.as_deref(),
        )
        .await;

    Ok(Json(purchase))
}

#[utoipa::path(
    delete,
    path = "/api/purchases/{id}",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    responses((status = 204, description = "Compra e anexo removidos")),
    security(("api_jwt" = []))
)]
pub async fn delete_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = app_state
        .purchase_service
        .delete(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Delete,
            AppModule::Purchases,
            &format!("Compra {} eliminada", purchase.invoice_number),
            ip.as_deref(),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Anexos (pdf, xml, txt)
// ---

#[utoipa::path(
    post,
    path = "/api/purchases/{id}/document",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    request_body(content_type = "multipart/form-data", description = "Campo 'document' com o arquivo"),
    responses(
        (status = 200, description = "Anexo salvo", body = PurchaseView),
        (status = 400, description = "Extensão não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_document(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermEdit>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("⚠️ Multipart inválido: {}", e);
        missing_document().to_api_error(&locale, &app_state.i18n_store)
    })? {
        if field.name() != Some(DOCUMENT_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!("⚠️ Falha ao ler o arquivo enviado: {}", e);
            missing_document().to_api_error(&locale, &app_state.i18n_store)
        })?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let (file_name, bytes) = upload
        .filter(|(name, bytes)| !name.is_empty() && !bytes.is_empty())
        .ok_or_else(|| missing_document().to_api_error(&locale, &app_state.i18n_store))?;

    let purchase = app_state
        .purchase_service
        .attach_document(&app_state.db_pool, id, &file_name, &bytes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Purchases,
            &format!("Documento {} adjuntado a la compra {}", file_name, purchase.purchase.invoice_number),
            ip.as_deref(),
        )
        .await;

    Ok(Json(purchase))
}

#[utoipa::path(
    get,
    path = "/api/purchases/{id}/document",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Arquivo anexado"),
        (status = 404, description = "Compra sem anexo")
    ),
    security(("api_jwt" = []))
)]
pub async fn download_document(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = app_state
        .purchase_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let document = app_state
        .purchase_service
        .document(&purchase)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, document.content_type.to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", document.file_name)),
    ];
    Ok((headers, document.bytes).into_response())
}

// GET /api/purchases/{id}/voucher.pdf
#[utoipa::path(
    get,
    path = "/api/purchases/{id}/voucher.pdf",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    responses((status = 200, description = "Comprovante de compra em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn purchase_voucher_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase: Purchase = app_state
        .purchase_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .render(&purchase_voucher(&purchase, user.0.display_name(), Utc::now()))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Export,
            AppModule::Purchases,
            &format!("Comprobante de compra {} exportado", purchase.invoice_number),
            ip.as_deref(),
        )
        .await;

    let file_name = sanitize_file_name(&format!("compra_{}.pdf", purchase.invoice_number));
    Ok(pdf_attachment(&file_name, pdf_bytes))
}

#[utoipa::path(
    get,
    path = "/api/purchases/report",
    tag = "Purchases",
    responses((status = 200, description = "Totais por tipo e principais fornecedores", body = PurchaseReport)),
    security(("api_jwt" = []))
)]
pub async fn purchases_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAccessFullReports>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .purchase_service
        .report()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
