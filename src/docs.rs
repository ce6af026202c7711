// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::barcode;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::register,
        handlers::auth::logout,
        handlers::auth::get_me,

        // --- Users / Roles ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::toggle_active,
        handlers::users::list_roles,
        handlers::users::get_role,
        handlers::users::update_role,
        handlers::rbac::list_permissions,

        // --- Inventory ---
        handlers::inventory::list_products,
        handlers::inventory::create_product,
        handlers::inventory::get_product,
        handlers::inventory::update_product,
        handlers::inventory::delete_product,
        handlers::inventory::product_history,
        handlers::inventory::stock_entry,
        handlers::inventory::stock_exit,
        handlers::inventory::stock_adjust,
        handlers::inventory::list_movements,
        handlers::inventory::list_categories,
        handlers::inventory::inventory_report_pdf,

        // --- Barcode ---
        handlers::barcode::scan,
        handlers::barcode::verify,
        handlers::barcode::search,
        handlers::barcode::list_products,
        handlers::barcode::get_product,
        handlers::barcode::stats,
        handlers::barcode::create_product,
        handlers::barcode::update_product,
        handlers::barcode::scan_entry,
        handlers::barcode::scan_exit,
        handlers::barcode::generate_barcode,
        handlers::barcode::generate_qr,
        handlers::barcode::product_label,
        handlers::barcode::batch_labels,

        // --- Clients / Sales ---
        handlers::sales::list_clients,
        handlers::sales::create_client,
        handlers::sales::get_client,
        handlers::sales::update_client,
        handlers::sales::list_sales,
        handlers::sales::create_sale,
        handlers::sales::get_sale,
        handlers::sales::annul_sale,
        handlers::sales::sale_invoice_pdf,
        handlers::sales::sales_report,

        // --- Purchases ---
        handlers::purchases::list_purchases,
        handlers::purchases::create_purchase,
        handlers::purchases::get_purchase,
        handlers::purchases::update_purchase,
        handlers::purchases::delete_purchase,
        handlers::purchases::upload_document,
        handlers::purchases::download_document,
        handlers::purchases::purchase_voucher_pdf,
        handlers::purchases::purchases_report,

        // --- Orders ---
        handlers::orders::list_orders,
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::orders::update_order,
        handlers::orders::change_status,
        handlers::orders::delete_order,
        handlers::orders::order_pdf,
        handlers::orders::orders_report_pdf,

        // --- Suppliers ---
        handlers::suppliers::list_suppliers,
        handlers::suppliers::create_supplier,
        handlers::suppliers::get_supplier,
        handlers::suppliers::update_supplier,
        handlers::suppliers::change_status,
        handlers::suppliers::delete_supplier,
        handlers::suppliers::suppliers_report_pdf,

        // --- Prices ---
        handlers::prices::assign_price,
        handlers::prices::deactivate_price,
        handlers::prices::price_history,
        handlers::prices::client_prices,
        handlers::prices::replicate_price,
        handlers::prices::price_list_pdf,

        // --- Audit ---
        handlers::audit::list_entries,
        handlers::audit::export_pdf,
        handlers::audit::purge,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::reports_overview,
    ),
    components(
        schemas(
            // Auth / RBAC
            models::auth::User,
            models::auth::UserWithRole,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::AuthResponse,
            models::auth::Profile,
            models::auth::LoginResponse,
            models::rbac::Permission,
            models::rbac::PermissionFlags,
            models::rbac::PermissionInfo,
            models::rbac::Role,
            models::rbac::UpdateRolePayload,

            // Produtos e estoque
            barcode::Symbology,
            models::product::ProductStatus,
            models::product::MovementKind,
            models::product::StockLevel,
            models::product::Product,
            models::product::ProductView,
            models::product::ProductDetail,
            models::product::ProductListResponse,
            models::product::StockMovement,
            models::product::MovementEntry,
            models::product::InventoryStats,
            models::product::StockTotals,
            models::product::StockOperationResult,
            models::product::CreateProductPayload,
            models::product::UpdateProductPayload,
            models::product::StockChangePayload,
            models::product::AdjustStockPayload,
            models::product::BarcodeStats,
            models::product::BarcodeLabel,
            models::product::BarcodeProductPayload,
            models::product::BarcodeProductUpdatePayload,
            models::product::ScanStockPayload,
            models::product::VerifyBarcodePayload,
            models::product::VerifyBarcodeResponse,
            models::product::GenerateBarcodePayload,
            models::product::GenerateQrPayload,
            models::product::CodeImageResponse,
            models::product::BatchLabelPayload,
            models::product::BatchLabelResponse,
            models::product::LabelFile,
            models::product::LabelFailure,

            // Clientes / Vendas
            models::sales::Client,
            models::sales::ClientPayload,
            models::sales::SaleStatus,
            models::sales::Sale,
            models::sales::SaleSummary,
            models::sales::SaleLine,
            models::sales::SaleDetail,
            models::sales::SaleStats,
            models::sales::SaleListResponse,
            models::sales::SaleLinePayload,
            models::sales::CreateSalePayload,
            models::sales::DailySales,
            models::sales::ProductSales,
            models::sales::SalesReport,

            // Compras
            models::purchase::OriginKind,
            models::purchase::Purchase,
            models::purchase::PurchaseView,
            models::purchase::PurchasePayload,
            models::purchase::PurchaseTotals,
            models::purchase::SupplierPurchases,
            models::purchase::PurchaseReport,

            // Pedidos
            models::orders::OrderKind,
            models::orders::OrderStatus,
            models::orders::PurchaseOrder,
            models::orders::OrderLine,
            models::orders::OrderDetail,
            models::orders::OrderCounts,
            models::orders::OrderListResponse,
            models::orders::OrderLinePayload,
            models::orders::OrderPayload,
            models::orders::OrderStatusPayload,

            // Fornecedores
            models::supplier::SupplierStatus,
            models::supplier::Supplier,
            models::supplier::SupplierCounts,
            models::supplier::SupplierListResponse,
            models::supplier::SupplierPayload,
            models::supplier::SupplierStatusPayload,

            // Preços por cliente
            models::pricing::ClientPrice,
            models::pricing::ClientPriceView,
            models::pricing::ClientPriceHistory,
            models::pricing::AssignPricePayload,
            models::pricing::ReplicatePricePayload,
            models::pricing::ReplicationResult,

            // Auditoria
            models::audit::AuditAction,
            models::audit::AppModule,
            models::audit::AuditEntry,
            models::audit::AuditStats,
            models::audit::AuditListResponse,
            models::audit::PurgeResult,

            // Dashboard
            models::dashboard::Period,
            models::dashboard::Currency,
            models::dashboard::DashboardSummary,
            models::dashboard::TopProductEntry,
            models::dashboard::TopClientEntry,
            models::dashboard::MonthlySalesEntry,
            models::dashboard::PeriodTotals,
            models::dashboard::ReportsOverview,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Usuários, Cargos e Permissões"),
        (name = "Inventory", description = "Produtos e Movimentações de Estoque"),
        (name = "Barcode", description = "Códigos de Barras, QR e Etiquetas"),
        (name = "Sales", description = "Clientes e Vendas"),
        (name = "Purchases", description = "Compras e Comprovantes"),
        (name = "Orders", description = "Pedidos de Compra e Produção"),
        (name = "Suppliers", description = "Fornecedores"),
        (name = "Prices", description = "Preços Especiais por Cliente"),
        (name = "Audit", description = "Log de Auditoria"),
        (name = "Dashboard", description = "Indicadores e Relatórios"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/inventory/products/{id}/entry"));
        assert!(doc.paths.paths.contains_key("/api/orders/{id}/status"));
        assert!(doc.paths.paths.contains_key("/api/audit"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
        assert!(components.schemas.contains_key("ProductView"));
    }
}
