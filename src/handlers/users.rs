// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        client_ip::ClientIp,
        i18n::Locale,
        rbac::{has_permission, PermManageUsers, RequirePermission},
    },
    models::{
        audit::{AppModule, AuditAction},
        auth::{CreateUserPayload, UpdateUserPayload, User, UserWithRole},
        rbac::{Permission, Role, UpdateRolePayload},
    },
};

// ---
// Usuários
// ---

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Usuários com seus cargos", body = Vec<UserWithRole>),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageUsers>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = UserWithRole),
        (status = 409, description = "Usuário ou e-mail duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermManageUsers>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .user_service
        .create(&app_state.db_pool, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Create,
            AppModule::Users,
            &format!("Usuario {} creado", created.user.username),
            ip.as_deref(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário", body = UserWithRole),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageUsers>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let found = app_state
        .user_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(found))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "Usuário atualizado", body = UserWithRole),
        (status = 403, description = "Troca de cargo sem permissão de atribuir cargos")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermManageUsers>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let can_assign_roles = has_permission(&app_state, &user.0, Permission::AssignRoles)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .user_service
        .update(&app_state.db_pool, id, &payload, &user.0, can_assign_roles)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Users,
            &format!("Usuario {} editado", updated.user.username),
            ip.as_deref(),
        )
        .await;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Usuário removido"),
        (status = 400, description = "Não é possível remover a si mesmo")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermManageUsers>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let target = app_state
        .user_service
        .get(&app_state.db_pool, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .user_service
        .delete(&app_state.db_pool, id, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Delete,
            AppModule::Users,
            &format!("Usuario {} eliminado", target.user.username),
            ip.as_deref(),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/toggle-active",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Estado ativo invertido", body = User),
        (status = 400, description = "Não é possível desativar a si mesmo")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_active(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermManageUsers>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let toggled = app_state
        .user_service
        .toggle_active(&app_state.db_pool, id, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let state = if toggled.is_active { "activado" } else { "desactivado" };
    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Users,
            &format!("Usuario {} {}", toggled.username, state),
            ip.as_deref(),
        )
        .await;

    Ok(Json(toggled))
}

// ---
// Cargos
// ---

#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Users",
    responses((status = 200, description = "Cargos com suas permissões", body = Vec<Role>)),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageUsers>,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .rbac_service
        .list_roles()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(roles))
}

#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do cargo")),
    responses(
        (status = 200, description = "Cargo", body = Role),
        (status = 404, description = "Cargo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_role(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManageUsers>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let role = app_state
        .rbac_service
        .get_role(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(role))
}

#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do cargo")),
    request_body = UpdateRolePayload,
    responses((status = 200, description = "Cargo atualizado", body = Role)),
    security(("api_jwt" = []))
)]
pub async fn update_role(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    ip: ClientIp,
    _guard: RequirePermission<PermManageUsers>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let role = app_state
        .rbac_service
        .update_role(&app_state.db_pool, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .audit_service
        .log(
            &user.0.username,
            AuditAction::Edit,
            AppModule::Users,
            &format!("Permisos del rol {} actualizados", role.name),
            ip.as_deref(),
        )
        .await;

    Ok(Json(role))
}
