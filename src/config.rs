// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        audit_repo::AuditRepository, dashboard_repo::DashboardRepository, order_repo::OrderRepository,
        pricing_repo::PricingRepository, product_repo::ProductRepository, purchase_repo::PurchaseRepository,
        rbac_repo::RbacRepository, sales_repo::SalesRepository, supplier_repo::SupplierRepository,
        user_repo::UserRepository,
    },
    services::{
        audit_service::AuditService, auth::AuthService, barcode_service::BarcodeService,
        dashboard_service::DashboardService, document_service::DocumentService,
        inventory_service::InventoryService, order_service::OrderService, pricing_service::PricingService,
        purchase_service::{DocumentStore, PurchaseService}, rbac_service::RbacService,
        sales_service::SalesService, stock_ledger::StockLedger, supplier_service::SupplierService,
        user_service::UserService,
    },
};

// ---
// Configurações (variáveis de ambiente)
// ---

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub fonts_dir: String,
    pub font_family: String,
    pub upload_dir: String,
    pub company_name: String,
    pub usd_exchange_rate: Decimal,
    pub default_iva_percent: Decimal,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta as configurações a partir de uma função de consulta (testável sem mexer no ambiente).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: lookup("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            server_addr: text("SERVER_ADDR", "0.0.0.0:3000"),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            fonts_dir: text("FONTS_DIR", "./fonts"),
            font_family: text("FONT_FAMILY", "Roboto"),
            upload_dir: text("UPLOAD_DIR", "./uploads"),
            company_name: text("COMPANY_NAME", "BUTACORS"),
            usd_exchange_rate: parse_or(&lookup, "USD_EXCHANGE_RATE", Decimal::from(4200))?,
            default_iva_percent: parse_or(&lookup, "DEFAULT_IVA_PERCENT", Decimal::from(19))?,
            admin_username: text("ADMIN_USERNAME", "admin"),
            admin_email: text("ADMIN_EMAIL", "admin@butacors.com"),
            admin_password: lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválido ({}): {}", key, raw, e)),
        None => Ok(default),
    }
}

// ---
// Estado compartilhado
// ---

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,

    pub rbac_repo: RbacRepository,

    pub auth_service: AuthService,
    pub user_service: UserService,
    pub rbac_service: RbacService,
    pub inventory_service: InventoryService,
    pub barcode_service: BarcodeService,
    pub sales_service: SalesService,
    pub purchase_service: PurchaseService,
    pub order_service: OrderService,
    pub supplier_service: SupplierService,
    pub pricing_service: PricingService,
    pub audit_service: AuditService,
    pub dashboard_service: DashboardService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = Settings::from_env()?;

        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_parts(db_pool, settings))
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn from_parts(db_pool: PgPool, settings: Settings) -> Self {
        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let sales_repo = SalesRepository::new(db_pool.clone());
        let supplier_repo = SupplierRepository::new(db_pool.clone());

        // --- Serviços ---
        let ledger = StockLedger::new(product_repo.clone());
        let document_service = DocumentService::new(
            settings.fonts_dir.clone(),
            settings.font_family.clone(),
            settings.company_name.clone(),
        );
        let inventory_service = InventoryService::new(product_repo.clone(), ledger.clone());
        let iva = settings.default_iva_percent;

        Self {
            auth_service: AuthService::new(user_repo.clone(), rbac_repo.clone(), settings.jwt_secret.clone()),
            user_service: UserService::new(user_repo, rbac_repo.clone()),
            rbac_service: RbacService::new(rbac_repo.clone()),
            barcode_service: BarcodeService::new(
                product_repo.clone(),
                inventory_service.clone(),
                ledger.clone(),
                document_service.clone(),
            ),
            sales_service: SalesService::new(sales_repo.clone(), product_repo.clone(), ledger, iva),
            purchase_service: PurchaseService::new(
                PurchaseRepository::new(db_pool.clone()),
                DocumentStore::new(settings.upload_dir.clone()),
                iva,
            ),
            order_service: OrderService::new(OrderRepository::new(db_pool.clone()), supplier_repo.clone(), iva),
            supplier_service: SupplierService::new(supplier_repo),
            pricing_service: PricingService::new(PricingRepository::new(db_pool.clone()), product_repo, sales_repo, iva),
            audit_service: AuditService::new(AuditRepository::new(db_pool.clone())),
            dashboard_service: DashboardService::new(
                DashboardRepository::new(db_pool.clone()),
                settings.usd_exchange_rate,
            ),
            inventory_service,
            document_service,
            rbac_repo,
            i18n_store: Arc::new(I18nStore::new()),
            settings: Arc::new(settings),
            db_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_settings() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/backoffice"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(settings.server_addr, "0.0.0.0:3000");
        assert_eq!(settings.db_max_connections, 5);
        assert_eq!(settings.font_family, "Roboto");
        assert_eq!(settings.company_name, "BUTACORS");
        assert_eq!(settings.usd_exchange_rate, Decimal::from(4200));
        assert_eq!(settings.default_iva_percent, Decimal::from(19));
        assert_eq!(settings.admin_username, "admin");
        assert!(settings.admin_password.is_none());
    }

    #[test]
    fn required_settings_are_enforced() {
        assert!(Settings::from_lookup(lookup(&[("JWT_SECRET", "x")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("DATABASE_URL", "x")])).is_err());
    }

    #[test]
    fn malformed_numbers_are_reported() {
        let err = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "x"),
            ("JWT_SECRET", "y"),
            ("USD_EXCHANGE_RATE", "muito"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("USD_EXCHANGE_RATE"));
    }

    #[test]
    fn empty_admin_password_means_no_bootstrap() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "x"),
            ("JWT_SECRET", "y"),
            ("ADMIN_PASSWORD", ""),
        ]))
        .unwrap();
        assert!(settings.admin_password.is_none());
    }
}
