// src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod barcode;
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

// Comprovantes de compra (pdf/xml/txt) podem passar do limite padrão de 2 MB
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let app_state = AppState::new().await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let settings = app_state.settings.clone();
    app_state
        .auth_service
        .ensure_admin(&settings.admin_username, &settings.admin_email, settings.admin_password.as_deref())
        .await?;

    let app = build_router(app_state);

    let listener = TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(app_state: AppState) -> Router {
    // --- Protegidas (auth_guard em tudo abaixo) ---
    let auth_routes = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::get_me));

    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users).post(handlers::users::create_user))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/{id}/toggle-active", post(handlers::users::toggle_active));

    let role_routes = Router::new()
        .route("/", get(handlers::users::list_roles))
        .route("/{id}", get(handlers::users::get_role).put(handlers::users::update_role));

    let inventory_routes = Router::new()
        .route(
            "/products",
            get(handlers::inventory::list_products).post(handlers::inventory::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::inventory::get_product)
                .put(handlers::inventory::update_product)
                .delete(handlers::inventory::delete_product),
        )
        .route("/products/{id}/history", get(handlers::inventory::product_history))
        .route("/products/{id}/entry", post(handlers::inventory::stock_entry))
        .route("/products/{id}/exit", post(handlers::inventory::stock_exit))
        .route("/products/{id}/adjust", post(handlers::inventory::stock_adjust))
        .route("/movements", get(handlers::inventory::list_movements))
        .route("/categories", get(handlers::inventory::list_categories))
        .route("/report.pdf", get(handlers::inventory::inventory_report_pdf));

    let barcode_routes = Router::new()
        .route("/scan/{code}", get(handlers::barcode::scan))
        .route("/verify", post(handlers::barcode::verify))
        .route("/search", get(handlers::barcode::search))
        .route("/stats", get(handlers::barcode::stats))
        .route(
            "/products",
            get(handlers::barcode::list_products).post(handlers::barcode::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::barcode::get_product).put(handlers::barcode::update_product),
        )
        .route("/products/{id}/label", get(handlers::barcode::product_label))
        .route("/inventory/entry", post(handlers::barcode::scan_entry))
        .route("/inventory/exit", post(handlers::barcode::scan_exit))
        .route("/generate", post(handlers::barcode::generate_barcode))
        .route("/qr", post(handlers::barcode::generate_qr))
        .route("/labels/batch", post(handlers::barcode::batch_labels));

    let client_routes = Router::new()
        .route("/", get(handlers::sales::list_clients).post(handlers::sales::create_client))
        .route("/{id}", get(handlers::sales::get_client).put(handlers::sales::update_client))
        .route("/{id}/prices", get(handlers::prices::client_prices))
        .route("/{id}/prices.pdf", get(handlers::prices::price_list_pdf));

    let sales_routes = Router::new()
        .route("/", get(handlers::sales::list_sales).post(handlers::sales::create_sale))
        .route("/report", get(handlers::sales::sales_report))
        .route("/{id}", get(handlers::sales::get_sale))
        .route("/{id}/annul", post(handlers::sales::annul_sale))
        .route("/{id}/invoice.pdf", get(handlers::sales::sale_invoice_pdf));

    let purchase_routes = Router::new()
        .route(
            "/",
            get(handlers::purchases::list_purchases).post(handlers::purchases::create_purchase),
        )
        .route("/report", get(handlers::purchases::purchases_report))
        .route(
            "/{id}",
            get(handlers::purchases::get_purchase)
                .put(handlers::purchases::update_purchase)
                .delete(handlers::purchases::delete_purchase),
        )
        .route(
            "/{id}/document",
            post(handlers::purchases::upload_document).get(handlers::purchases::download_document),
        )
        .route("/{id}/voucher.pdf", get(handlers::purchases::purchase_voucher_pdf))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES));

    let order_routes = Router::new()
        .route("/", get(handlers::orders::list_orders).post(handlers::orders::create_order))
        .route("/report.pdf", get(handlers::orders::orders_report_pdf))
        .route(
            "/{id}",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        .route("/{id}/status", post(handlers::orders::change_status))
        .route("/{id}/pdf", get(handlers::orders::order_pdf));

    let supplier_routes = Router::new()
        .route(
            "/",
            get(handlers::suppliers::list_suppliers).post(handlers::suppliers::create_supplier),
        )
        .route("/report.pdf", get(handlers::suppliers::suppliers_report_pdf))
        .route(
            "/{id}",
            get(handlers::suppliers::get_supplier)
                .put(handlers::suppliers::update_supplier)
                .delete(handlers::suppliers::delete_supplier),
        )
        .route("/{id}/status", post(handlers::suppliers::change_status));

    let price_routes = Router::new()
        .route("/", post(handlers::prices::assign_price))
        .route("/replicate", post(handlers::prices::replicate_price))
        .route("/{id}/deactivate", post(handlers::prices::deactivate_price))
        .route("/{id}/history", get(handlers::prices::price_history));

    let audit_routes = Router::new()
        .route("/", get(handlers::audit::list_entries).delete(handlers::audit::purge))
        .route("/export.pdf", get(handlers::audit::export_pdf));

    let protected = Router::new()
        .route("/api/permissions", get(handlers::rbac::list_permissions))
        .route("/api/dashboard", get(handlers::dashboard::get_summary))
        .route("/api/reports/overview", get(handlers::dashboard::reports_overview))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/roles", role_routes)
        .nest("/api/inventory", inventory_routes)
        .nest("/api/barcode", barcode_routes)
        .nest("/api/clients", client_routes)
        .nest("/api/sales", sales_routes)
        .nest("/api/purchases", purchase_routes)
        .nest("/api/orders", order_routes)
        .nest("/api/suppliers", supplier_routes)
        .nest("/api/prices", price_routes)
        .nest("/api/audit", audit_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas públicas + protegidas
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/register", post(handlers::auth::register))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::Settings;

    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/backoffice_test")
            .unwrap();
        let settings = Settings::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/backoffice_test".to_string()),
            "JWT_SECRET" => Some("segredo-de-teste".to_string()),
            _ => None,
        })
        .unwrap();
        build_router(AppState::from_parts(pool, settings))
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_is_public() {
        assert_eq!(status_of("GET", "/api/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        assert_eq!(status_of("GET", "/api/docs/openapi.json").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        assert_eq!(status_of("GET", "/api/auth/me").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("GET", "/api/inventory/products").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("DELETE", "/api/audit").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("GET", "/api/orders/report.pdf").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_bearer_is_rejected() {
        let request = Request::builder()
            .uri("/api/dashboard")
            .header("authorization", "Bearer nao-e-um-jwt")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
