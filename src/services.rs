pub mod audit_service;
pub mod auth;
pub mod barcode_service;
pub mod dashboard_service;
pub mod document_service;
pub mod inventory_service;
pub mod order_service;
pub mod pricing_service;
pub mod purchase_service;
pub mod rbac_service;
pub mod sales_service;
pub mod stock_ledger;
pub mod supplier_service;
pub mod user_service;
