pub mod audit_repo;
pub mod dashboard_repo;
pub mod order_repo;
pub mod pricing_repo;
pub mod product_repo;
pub mod purchase_repo;
pub mod rbac_repo;
pub mod sales_repo;
pub mod supplier_repo;
pub mod user_repo;
