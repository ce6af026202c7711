// src/handlers/rbac.rs

use axum::{response::IntoResponse, Json};

use crate::{middleware::auth::AuthenticatedUser, models::rbac::PermissionInfo, services::rbac_service::permission_catalog};

// GET /api/permissions (Para o frontend saber o que mostrar na tela de cargos)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Users",
    responses((status = 200, description = "Catálogo de permissões", body = Vec<PermissionInfo>)),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(_user: AuthenticatedUser) -> impl IntoResponse {
    Json(permission_catalog())
}
