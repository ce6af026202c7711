// src/services/sales_service.rs

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, lock_sequence},
        error::AppError,
        money::{line_subtotal, Totals},
        numbering::next_document_number,
    },
    db::{
        product_repo::ProductRepository,
        sales_repo::{ClientFields, NewSale, NewSaleLine, SalesRepository},
    },
    models::{
        product::MovementKind,
        sales::{
            Client, ClientFilter, ClientPayload, CreateSalePayload, DateRangeQuery, SaleDetail,
            SaleFilter, SaleListResponse, SaleStatus, SalesReport,
        },
    },
    services::{
        inventory_service::blank_to_none,
        stock_ledger::{MovementMeta, StockLedger},
    },
};

pub const SALE_PREFIX: &str = "VEN";
const TOP_PRODUCTS: i64 = 10;

pub fn sale_reason(number: &str) -> String {
    format!("Venta {}", number)
}

pub fn annulment_reason(number: &str) -> String {
    format!("Anulación venta {}", number)
}

// Linha já com o preço resolvido
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl PricedLine {
    pub fn new(product_id: Uuid, description: String, quantity: i32, unit_price: Decimal) -> Self {
        Self {
            product_id,
            description,
            quantity,
            unit_price,
            subtotal: line_subtotal(Decimal::from(quantity), unit_price),
        }
    }
}

#[derive(Clone)]
pub struct SalesService {
    sales_repo: SalesRepository,
    product_repo: ProductRepository,
    ledger: StockLedger,
    default_iva: Decimal,
}

impl SalesService {
    pub fn new(
        sales_repo: SalesRepository,
        product_repo: ProductRepository,
        ledger: StockLedger,
        default_iva: Decimal,
    ) -> Self {
        Self { sales_repo, product_repo, ledger, default_iva }
    }

    // --- CLIENTES ---

    pub async fn list_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>, AppError> {
        let pattern = like_pattern(filter.search.as_deref());
        self.sales_repo.list_clients(pattern.as_deref()).await
    }

    pub async fn get_client<'e, E>(&self, executor: E, id: Uuid) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.sales_repo
            .find_client(executor, id)
            .await?
            .ok_or(AppError::ClientNotFound)
    }

    fn client_fields(payload: &ClientPayload) -> ClientFields<'_> {
        ClientFields {
            name: payload.name.trim(),
            document: payload.document.trim(),
            email: blank_to_none(payload.email.as_deref()),
            phone: blank_to_none(payload.phone.as_deref()),
            address: blank_to_none(payload.address.as_deref()),
        }
    }

    pub async fn create_client<'e, E>(&self, executor: E, payload: &ClientPayload) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = self
            .sales_repo
            .create_client(executor, &Self::client_fields(payload))
            .await?;
        tracing::info!("✅ Cliente {} cadastrado", client.document);
        Ok(client)
    }

    pub async fn update_client<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &ClientPayload,
    ) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.sales_repo
            .update_client(executor, id, &Self::client_fields(payload))
            .await?
            .ok_or(AppError::ClientNotFound)
    }

    // --- VENDAS ---

    pub async fn list_sales(&self, filter: &SaleFilter) -> Result<SaleListResponse, AppError> {
        let pattern = like_pattern(filter.search.as_deref());
        let sales = self
            .sales_repo
            .list_sales(pattern.as_deref(), filter.from, filter.to)
            .await?;
        let stats = self.sales_repo.stats(None, None).await?;
        Ok(SaleListResponse { sales, stats })
    }

    pub async fn get_sale(&self, id: Uuid) -> Result<SaleDetail, AppError> {
        let summary = self
            .sales_repo
            .find_summary(id)
            .await?
            .ok_or(AppError::SaleNotFound)?;
        let lines = self.sales_repo.lines(self.product_repo.pool(), id).await?;
        Ok(SaleDetail { summary, lines })
    }

    /// Registra a venda: numeração sob trava, totais, linhas e uma saída no livro por linha.
    pub async fn create_sale<'e, E>(
        &self,
        executor: E,
        payload: &CreateSalePayload,
        seller_id: Uuid,
    ) -> Result<SaleDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.lines.is_empty() {
            return Err(AppError::EmptyDocument);
        }

        let mut tx = executor.begin().await?;

        // 1. Numeração
        lock_sequence(&mut *tx, SALE_PREFIX).await?;

        if let Some(client_id) = payload.client_id {
            self.get_client(&mut *tx, client_id).await?;
        }

        // 2. Preços (do cadastro quando a linha não informa)
        let mut priced = Vec::with_capacity(payload.lines.len());
        for line in &payload.lines {
            let product = self
                .product_repo
                .find_by_id(&mut *tx, line.product_id)
                .await?
                .filter(|p| p.active)
                .ok_or(AppError::ProductNotFound)?;
            priced.push(PricedLine::new(
                product.id,
                product.name,
                line.quantity,
                line.unit_price.unwrap_or(product.price),
            ));
        }

        // 3. Totais
        let iva_percent = payload.iva_percent.unwrap_or(self.default_iva);
        let totals = Totals::compute(priced.iter().map(|l| l.subtotal), iva_percent, payload.discount)?;

        let last = self.sales_repo.last_number(&mut *tx).await?;
        let number = next_document_number(SALE_PREFIX, Utc::now().year(), last.as_deref());

        let sale = self
            .sales_repo
            .insert_sale(
                &mut *tx,
                &NewSale {
                    number: &number,
                    client_id: payload.client_id,
                    subtotal: totals.subtotal,
                    iva_percent,
                    iva: totals.iva,
                    discount: totals.discount,
                    total: totals.total,
                    notes: blank_to_none(payload.notes.as_deref()),
                    seller_id,
                },
            )
            .await?;

        // 4. Linhas + baixa de estoque
        let reason = sale_reason(&number);
        for line in &priced {
            self.sales_repo
                .insert_line(
                    &mut *tx,
                    &NewSaleLine {
                        sale_id: sale.id,
                        product_id: line.product_id,
                        description: &line.description,
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                        subtotal: line.subtotal,
                    },
                )
                .await?;

            let meta = MovementMeta {
                reason: Some(reason.as_str()),
                reference: Some(number.as_str()),
                user_id: Some(seller_id),
                ..Default::default()
            };
            self.ledger
                .record(&mut tx, line.product_id, MovementKind::Exit, line.quantity, meta)
                .await?;
        }

        tx.commit().await?;
        tracing::info!("✅ Venda {} registrada: total {}", number, totals.total);

        self.get_sale(sale.id).await
    }

    /// Anula a venda e devolve ao estoque cada linha.
    pub async fn annul_sale<'e, E>(&self, executor: E, id: Uuid, user_id: Uuid) -> Result<SaleDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let sale = self
            .sales_repo
            .lock_sale(&mut *tx, id)
            .await?
            .ok_or(AppError::SaleNotFound)?;

        if sale.status == SaleStatus::Annulled {
            return Err(AppError::SaleAlreadyAnnulled);
        }

        let reason = annulment_reason(&sale.number);
        let lines = self.sales_repo.lines(&mut *tx, id).await?;
        for line in &lines {
            let meta = MovementMeta {
                reason: Some(reason.as_str()),
                reference: Some(sale.number.as_str()),
                user_id: Some(user_id),
                ..Default::default()
            };
            self.ledger
                .record(&mut tx, line.product_id, MovementKind::Entry, line.quantity, meta)
                .await?;
        }

        self.sales_repo.mark_annulled(&mut *tx, id, user_id).await?;
        tx.commit().await?;

        tracing::info!("🗑️ Venda {} anulada ({} linhas devolvidas ao estoque)", sale.number, lines.len());
        self.get_sale(id).await
    }

    pub async fn report(&self, query: &DateRangeQuery) -> Result<SalesReport, AppError> {
        Ok(SalesReport {
            from: query.from,
            to: query.to,
            stats: self.sales_repo.stats(query.from, query.to).await?,
            daily: self.sales_repo.daily(query.from, query.to).await?,
            top_products: self
                .sales_repo
                .top_products(query.from, query.to, TOP_PRODUCTS)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    #[test]
    fn ledger_reasons_carry_the_number() {
        assert_eq!(sale_reason("VEN-2025-0012"), "Venta VEN-2025-0012");
        assert_eq!(annulment_reason("VEN-2025-0012"), "Anulación venta VEN-2025-0012");
    }

    #[test]
    fn priced_line_rounds_subtotal() {
        let line = PricedLine::new(Uuid::new_v4(), "Silla".into(), 3, d("10.335"));
        assert_eq!(line.subtotal, d("31.01"));
    }

    #[test]
    fn sale_totals_from_lines() {
        let lines = [
            PricedLine::new(Uuid::new_v4(), "Silla".into(), 2, d("100")),
            PricedLine::new(Uuid::new_v4(), "Mesa".into(), 1, d("50")),
        ];
        let totals = Totals::compute(lines.iter().map(|l| l.subtotal), d("19"), d("10")).unwrap();
        assert_eq!(totals.subtotal, d("250"));
        assert_eq!(totals.iva, d("47.50"));
        assert_eq!(totals.total, d("287.50"));
    }
}
