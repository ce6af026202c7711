// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::audit::AppModule;

// As 17 permissões que um cargo pode conceder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Create,
    Edit,
    Delete,
    View,
    ManageUsers,
    AssignRoles,
    ApproveOrders,
    CreateTasks,
    CompleteTasks,
    AccessReports,
    AccessFullReports,
    CreateOrders,
    EditOrders,
    CreateInventory,
    EditInventory,
    CreateBarcode,
    EditBarcode,
}

impl Permission {
    pub const ALL: [Permission; 17] = [
        Permission::Create,
        Permission::Edit,
        Permission::Delete,
        Permission::View,
        Permission::ManageUsers,
        Permission::AssignRoles,
        Permission::ApproveOrders,
        Permission::CreateTasks,
        Permission::CompleteTasks,
        Permission::AccessReports,
        Permission::AccessFullReports,
        Permission::CreateOrders,
        Permission::EditOrders,
        Permission::CreateInventory,
        Permission::EditInventory,
        Permission::CreateBarcode,
        Permission::EditBarcode,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Permission::Create => "create",
            Permission::Edit => "edit",
            Permission::Delete => "delete",
            Permission::View => "view",
            Permission::ManageUsers => "manage_users",
            Permission::AssignRoles => "assign_roles",
            Permission::ApproveOrders => "approve_orders",
            Permission::CreateTasks => "create_tasks",
            Permission::CompleteTasks => "complete_tasks",
            Permission::AccessReports => "access_reports",
            Permission::AccessFullReports => "access_full_reports",
            Permission::CreateOrders => "create_orders",
            Permission::EditOrders => "edit_orders",
            Permission::CreateInventory => "create_inventory",
            Permission::EditInventory => "edit_inventory",
            Permission::CreateBarcode => "create_barcode",
            Permission::EditBarcode => "edit_barcode",
        }
    }
}

// Colunas booleanas da tabela `roles`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionFlags {
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_view: bool,
    pub can_manage_users: bool,
    pub can_assign_roles: bool,
    pub can_approve_orders: bool,
    pub can_create_tasks: bool,
    pub can_complete_tasks: bool,
    pub can_access_reports: bool,
    pub can_access_full_reports: bool,
    pub can_create_orders: bool,
    pub can_edit_orders: bool,
    pub can_create_inventory: bool,
    pub can_edit_inventory: bool,
    pub can_create_barcode: bool,
    pub can_edit_barcode: bool,
}

impl PermissionFlags {
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Create => self.can_create,
            Permission::Edit => self.can_edit,
            Permission::Delete => self.can_delete,
            Permission::View => self.can_view,
            Permission::ManageUsers => self.can_manage_users,
            Permission::AssignRoles => self.can_assign_roles,
            Permission::ApproveOrders => self.can_approve_orders,
            Permission::CreateTasks => self.can_create_tasks,
            Permission::CompleteTasks => self.can_complete_tasks,
            Permission::AccessReports => self.can_access_reports,
            Permission::AccessFullReports => self.can_access_full_reports,
            Permission::CreateOrders => self.can_create_orders,
            Permission::EditOrders => self.can_edit_orders,
            Permission::CreateInventory => self.can_create_inventory,
            Permission::EditInventory => self.can_edit_inventory,
            Permission::CreateBarcode => self.can_create_barcode,
            Permission::EditBarcode => self.can_edit_barcode,
        }
    }

    pub fn granted(&self) -> Vec<Permission> {
        Permission::ALL.into_iter().filter(|p| self.allows(*p)).collect()
    }

    /// Acesso por módulo da aplicação. Módulos sem regra própria dependem de `can_view`.
    pub fn can_access_module(&self, module: AppModule) -> bool {
        match module {
            AppModule::Orders => self.can_create_orders || self.can_edit_orders,
            AppModule::Inventory => self.can_create_inventory || self.can_edit_inventory,
            AppModule::Barcode => self.can_create_barcode || self.can_edit_barcode,
            AppModule::Reports => self.can_access_reports,
            AppModule::Users | AppModule::Audit => self.can_manage_users,
            _ => self.can_view,
        }
    }

    pub fn accessible_modules(&self) -> Vec<AppModule> {
        AppModule::ALL
            .into_iter()
            .filter(|m| self.can_access_module(*m))
            .collect()
    }
}

// O que sai do banco (Tabela Roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(example = "COMERCIAL")]
    pub name: String,

    #[schema(example = "Comercial")]
    pub display_name: String,

    pub description: Option<String>,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub flags: PermissionFlags,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Payload para editar um cargo (substitui todas as flags)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePayload {
    #[validate(length(min = 1, max = 100, message = "O nome de exibição é obrigatório."))]
    pub display_name: String,

    pub description: Option<String>,

    pub flags: PermissionFlags,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionInfo {
    pub permission: Permission,
    pub slug: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    // Matriz do cargo COMERCIAL semeado na migração
    fn comercial() -> PermissionFlags {
        PermissionFlags {
            can_view: true,
            can_access_reports: true,
            can_create_orders: true,
            ..Default::default()
        }
    }

    fn admin() -> PermissionFlags {
        let mut flags = PermissionFlags::default();
        flags.can_create = true;
        flags.can_edit = true;
        flags.can_delete = true;
        flags.can_view = true;
        flags.can_manage_users = true;
        flags.can_assign_roles = true;
        flags.can_approve_orders = true;
        flags.can_create_tasks = true;
        flags.can_complete_tasks = true;
        flags.can_access_reports = true;
        flags.can_access_full_reports = true;
        flags.can_create_orders = true;
        flags.can_edit_orders = true;
        flags.can_create_inventory = true;
        flags.can_edit_inventory = true;
        flags.can_create_barcode = true;
        flags.can_edit_barcode = true;
        flags
    }

    #[test]
    fn admin_is_granted_everything() {
        assert_eq!(admin().granted().len(), Permission::ALL.len());
        assert!(AppModule::ALL.iter().all(|m| admin().can_access_module(*m)));
    }

    #[test]
    fn comercial_module_access() {
        let flags = comercial();
        assert!(flags.can_access_module(AppModule::Orders));
        assert!(flags.can_access_module(AppModule::Reports));
        assert!(flags.can_access_module(AppModule::Sales));
        assert!(!flags.can_access_module(AppModule::Inventory));
        assert!(!flags.can_access_module(AppModule::Barcode));
        assert!(!flags.can_access_module(AppModule::Users));
        assert_eq!(
            flags.granted(),
            vec![Permission::View, Permission::AccessReports, Permission::CreateOrders]
        );
    }

    #[test]
    fn other_modules_fall_back_to_view() {
        let flags = PermissionFlags::default();
        assert!(!flags.can_access_module(AppModule::Suppliers));
        let flags = PermissionFlags { can_view: true, ..Default::default() };
        assert!(flags.can_access_module(AppModule::Suppliers));
        assert!(flags.can_access_module(AppModule::Dashboard));
    }

    #[test]
    fn slugs_are_unique() {
        let mut slugs: Vec<_> = Permission::ALL.iter().map(|p| p.slug()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), 17);
    }
}
