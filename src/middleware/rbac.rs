// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{auth::User, rbac::Permission},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn permission() -> Permission;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

/// Confere no banco se o cargo do usuário concede a permissão.
pub async fn has_permission(
    app_state: &AppState,
    user: &User,
    permission: Permission,
) -> Result<bool, AppError> {
    let role = app_state
        .rbac_repo
        .find_role_by_id(&app_state.db_pool, user.role_id)
        .await?
        .ok_or(AppError::RoleNotFound)?;
    Ok(role.flags.allows(permission))
}

/// Também usado pelos handlers para checagens condicionais (ex.: aprovar ordem).
pub async fn ensure_permission(
    app_state: &AppState,
    user: &User,
    permission: Permission,
) -> Result<(), AppError> {
    if !has_permission(app_state, user, permission).await? {
        tracing::debug!("⛔ {} sem a permissão '{}'", user.username, permission.slug());
        return Err(AppError::PermissionDenied(permission.slug()));
    }
    Ok(())
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();

        // A. Extrai Usuário (pendurado pelo auth_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Verifica no Banco
        ensure_permission(&app_state, &user.0, T::permission())
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission_types {
    ($($name:ident => $permission:ident),* $(,)?) => {
        $(
            pub struct $name;
            impl PermissionDef for $name {
                fn permission() -> Permission { Permission::$permission }
            }
        )*
    };
}

permission_types! {
    PermCreate => Create,
    PermEdit => Edit,
    PermDelete => Delete,
    PermView => View,
    PermManageUsers => ManageUsers,
    PermAssignRoles => AssignRoles,
    PermAccessReports => AccessReports,
    PermAccessFullReports => AccessFullReports,
    PermCreateOrders => CreateOrders,
    PermEditOrders => EditOrders,
    PermCreateInventory => CreateInventory,
    PermEditInventory => EditInventory,
    PermCreateBarcode => CreateBarcode,
    PermEditBarcode => EditBarcode,
}
