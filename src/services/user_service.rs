// src/services/user_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        rbac_repo::RbacRepository,
        user_repo::{NewUser, UserRepository},
    },
    models::{
        auth::{CreateUserPayload, UpdateUserPayload, User, UserWithRole},
        rbac::Permission,
    },
    services::{auth::hash_password, inventory_service::blank_to_none},
};

/// Administrador não pode apagar nem desativar a si mesmo.
pub fn ensure_not_self(actor_id: Uuid, target_id: Uuid) -> Result<(), AppError> {
    if actor_id == target_id {
        return Err(AppError::CannotModifySelf);
    }
    Ok(())
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
}

impl UserService {
    pub fn new(user_repo: UserRepository, rbac_repo: RbacRepository) -> Self {
        Self { user_repo, rbac_repo }
    }

    pub async fn list(&self) -> Result<Vec<UserWithRole>, AppError> {
        self.user_repo.list_users(self.rbac_repo.pool()).await
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<UserWithRole, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.user_repo
            .find_with_role(executor, id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    async fn ensure_role<'e, E>(&self, executor: E, role_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.rbac_repo
            .find_role_by_id(executor, role_id)
            .await?
            .ok_or(AppError::RoleNotFound)?;
        Ok(())
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &CreateUserPayload, created_by: Uuid) -> Result<UserWithRole, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let password_hash = hash_password(&payload.password).await?;

        let mut tx = executor.begin().await?;
        self.ensure_role(&mut *tx, payload.role_id).await?;

        let user = self
            .user_repo
            .create_user(
                &mut *tx,
                NewUser {
                    username: payload.username.trim(),
                    email: payload.email.trim(),
                    password_hash: &password_hash,
                    full_name: blank_to_none(payload.full_name.as_deref()),
                    phone: blank_to_none(payload.phone.as_deref()),
                    role_id: payload.role_id,
                    is_active: payload.is_active,
                    created_by: Some(created_by),
                },
            )
            .await?;
        let created = self.get(&mut *tx, user.id).await?;
        tx.commit().await?;

        tracing::info!("✅ Usuário {} criado", created.user.username);
        Ok(created)
    }

    /// `can_assign_roles` vem do cargo de quem edita; só conta se o cargo mudar.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateUserPayload,
        actor: &User,
        can_assign_roles: bool,
    ) -> Result<UserWithRole, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if !payload.is_active {
            ensure_not_self(actor.id, id)?;
        }

        let password_hash = match blank_to_none(payload.password.as_deref()) {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let mut tx = executor.begin().await?;
        let current = self
            .user_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if current.role_id != payload.role_id {
            if !can_assign_roles {
                return Err(AppError::PermissionDenied(Permission::AssignRoles.slug()));
            }
            self.ensure_role(&mut *tx, payload.role_id).await?;
        }

        self.user_repo
            .update_user(
                &mut *tx,
                id,
                payload.email.trim(),
                blank_to_none(payload.full_name.as_deref()),
                blank_to_none(payload.phone.as_deref()),
                payload.role_id,
                payload.is_active,
            )
            .await?
            .ok_or(AppError::UserNotFound)?;

        if let Some(hash) = &password_hash {
            self.user_repo.update_password(&mut *tx, id, hash).await?;
        }

        let updated = self.get(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid, actor_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        ensure_not_self(actor_id, id)?;
        if !self.user_repo.delete_user(executor, id).await? {
            return Err(AppError::UserNotFound);
        }
        tracing::info!("🗑️ Usuário {} removido", id);
        Ok(())
    }

    /// Inverte o estado ativo.
    pub async fn toggle_active<'e, E>(&self, executor: E, id: Uuid, actor_id: Uuid) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        ensure_not_self(actor_id, id)?;

        let mut tx = executor.begin().await?;
        let user = self
            .user_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let user = self
            .user_repo
            .set_active(&mut *tx, id, !user.is_active)
            .await?
            .ok_or(AppError::UserNotFound)?;
        tx.commit().await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acting_on_yourself_is_refused() {
        let id = Uuid::new_v4();
        assert!(matches!(ensure_not_self(id, id), Err(AppError::CannotModifySelf)));
        assert!(ensure_not_self(id, Uuid::new_v4()).is_ok());
    }
}
