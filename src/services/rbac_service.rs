// src/services/rbac_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::rbac_repo::RbacRepository,
    models::rbac::{Permission, PermissionInfo, Role, UpdateRolePayload},
    services::inventory_service::blank_to_none,
};

pub fn permission_catalog() -> Vec<PermissionInfo> {
    Permission::ALL
        .iter()
        .map(|p| PermissionInfo { permission: *p, slug: p.slug().to_string() })
        .collect()
}

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
}

impl RbacService {
    pub fn new(repo: RbacRepository) -> Self {
        Self { repo }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.repo.list_roles().await
    }

    pub async fn get_role(&self, id: Uuid) -> Result<Role, AppError> {
        self.repo
            .find_role_by_id(self.repo.pool(), id)
            .await?
            .ok_or(AppError::RoleNotFound)
    }

    /// Regrava nome de exibição, descrição e a matriz inteira de flags.
    pub async fn update_role<'e, E>(&self, executor: E, id: Uuid, payload: &UpdateRolePayload) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = self
            .repo
            .update_role(
                executor,
                id,
                payload.display_name.trim(),
                blank_to_none(payload.description.as_deref()),
                &payload.flags,
            )
            .await?
            .ok_or(AppError::RoleNotFound)?;

        tracing::info!("✅ Cargo {} atualizado: {} permissões", role.name, role.flags.granted().len());
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_permission() {
        let catalog = permission_catalog();
        assert_eq!(catalog.len(), 17);
        assert_eq!(catalog[0].slug, "create");
        assert!(catalog.iter().any(|p| p.slug == "approve_orders"));
    }
}
