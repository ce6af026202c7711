// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::rbac::{PermissionFlags, Role};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // 1. Buscar o cargo
    pub async fn find_role_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }

    pub async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    // 2. Listar todos
    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    // 3. Regravar a matriz de permissões
    pub async fn update_role<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        display_name: &str,
        description: Option<&str>,
        flags: &PermissionFlags,
    ) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles SET
                display_name = $2, description = $3,
                can_create = $4, can_edit = $5, can_delete = $6, can_view = $7,
                can_manage_users = $8, can_assign_roles = $9, can_approve_orders = $10,
                can_create_tasks = $11, can_complete_tasks = $12,
                can_access_reports = $13, can_access_full_reports = $14,
                can_create_orders = $15, can_edit_orders = $16,
                can_create_inventory = $17, can_edit_inventory = $18,
                can_create_barcode = $19, can_edit_barcode = $20,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(display_name)
            .bind(description)
            .bind(flags.can_create)
            .bind(flags.can_edit)
            .bind(flags.can_delete)
            .bind(flags.can_view)
            .bind(flags.can_manage_users)
            .bind(flags.can_assign_roles)
            .bind(flags.can_approve_orders)
            .bind(flags.can_create_tasks)
            .bind(flags.can_complete_tasks)
            .bind(flags.can_access_reports)
            .bind(flags.can_access_full_reports)
            .bind(flags.can_create_orders)
            .bind(flags.can_edit_orders)
            .bind(flags.can_create_inventory)
            .bind(flags.can_edit_inventory)
            .bind(flags.can_create_barcode)
            .bind(flags.can_edit_barcode)
            .fetch_optional(executor)
            .await?;
        Ok(role)
    }
}
