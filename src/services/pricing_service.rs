// src/services/pricing_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        money::{apply_discount, price_with_iva, round_money},
    },
    db::{
        pricing_repo::{PriceValues, PricingRepository},
        product_repo::ProductRepository,
        sales_repo::SalesRepository,
    },
    models::{
        pricing::{
            AssignPricePayload, ClientPrice, ClientPriceHistory, ClientPriceView, ReplicatePricePayload,
            ReplicationResult,
        },
        sales::Client,
    },
    services::inventory_service::blank_to_none,
};

pub const REPLICATION_REASON: &str = "Replicación de precio base";

/// base → com IVA → com desconto, cada passo arredondado a 2 casas.
pub fn price_values(base_price: Decimal, iva_percent: Decimal, discount_percent: Decimal) -> PriceValues {
    let with_iva = price_with_iva(base_price, iva_percent);
    PriceValues {
        base_price: round_money(base_price),
        iva_percent,
        price_with_iva: with_iva,
        discount_percent,
        final_price: apply_discount(with_iva, discount_percent),
    }
}

#[derive(Clone)]
pub struct PricingService {
    pricing_repo: PricingRepository,
    product_repo: ProductRepository,
    sales_repo: SalesRepository,
    default_iva: Decimal,
}

impl PricingService {
    pub fn new(
        pricing_repo: PricingRepository,
        product_repo: ProductRepository,
        sales_repo: SalesRepository,
        default_iva: Decimal,
    ) -> Self {
        Self { pricing_repo, product_repo, sales_repo, default_iva }
    }

    async fn view(&self, id: Uuid) -> Result<ClientPriceView, AppError> {
        self.pricing_repo.find_view(id).await?.ok_or(AppError::PriceNotFound)
    }

    /// Atualiza o preço ativo do par (com histórico) ou cria um novo.
    pub async fn assign<'e, E>(&self, executor: E, payload: &AssignPricePayload, user_id: Uuid) -> Result<ClientPriceView, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.sales_repo
            .find_client(&mut *tx, payload.client_id)
            .await?
            .ok_or(AppError::ClientNotFound)?;
        self.product_repo
            .find_by_id(&mut *tx, payload.product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let values = price_values(
            payload.base_price,
            payload.iva_percent.unwrap_or(self.default_iva),
            payload.discount_percent,
        );
        let reason = blank_to_none(payload.reason.as_deref());

        let current = self
            .pricing_repo
            .lock_active(&mut *tx, payload.client_id, payload.product_id)
            .await?;
        let price = self
            .upsert(&mut tx, current, payload.client_id, payload.product_id, &values, user_id, reason)
            .await?;

        tx.commit().await?;
        tracing::info!("🏷️ Preço {} atribuído: final {}", price.id, price.final_price);
        self.view(price.id).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn upsert(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        current: Option<ClientPrice>,
        client_id: Uuid,
        product_id: Uuid,
        values: &PriceValues,
        user_id: Uuid,
        reason: Option<&str>,
    ) -> Result<ClientPrice, AppError> {
        match current {
            Some(current) => {
                let price = self.pricing_repo.update_values(&mut **tx, current.id, values).await?;
                self.pricing_repo
                    .insert_history(&mut **tx, current.id, current.final_price, price.final_price, user_id, reason)
                    .await?;
                Ok(price)
            }
            None => {
                self.pricing_repo
                    .insert(&mut **tx, client_id, product_id, values, user_id)
                    .await
            }
        }
    }

    pub async fn deactivate<'e, E>(&self, executor: E, id: Uuid) -> Result<ClientPrice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.pricing_repo
            .deactivate(executor, id)
            .await?
            .ok_or(AppError::PriceNotFound)
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<ClientPriceHistory>, AppError> {
        if !self.pricing_repo.exists(id).await? {
            return Err(AppError::PriceNotFound);
        }
        self.pricing_repo.history(id).await
    }

    pub async fn client_prices(&self, client_id: Uuid) -> Result<(Client, Vec<ClientPriceView>), AppError> {
        let client = self
            .sales_repo
            .find_client(self.product_repo.pool(), client_id)
            .await?
            .ok_or(AppError::ClientNotFound)?;
        let prices = self.pricing_repo.list_for_client(client_id).await?;
        Ok((client, prices))
    }

    /// Aplica o preço base a todos os clientes com o IVA padrão, mantendo descontos existentes.
    pub async fn replicate<'e, E>(
        &self,
        executor: E,
        payload: &ReplicatePricePayload,
        user_id: Uuid,
    ) -> Result<ReplicationResult, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        self.product_repo
            .find_by_id(&mut *tx, payload.product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        let clients = self.sales_repo.all_clients(&mut *tx).await?;
        let mut result = ReplicationResult { created: 0, updated: 0 };

        for client in &clients {
            let current = self
                .pricing_repo
                .lock_active(&mut *tx, client.id, payload.product_id)
                .await?;
            let discount = current.as_ref().map_or(Decimal::ZERO, |p| p.discount_percent);
            let values = price_values(payload.base_price, self.default_iva, discount);

            if current.is_some() {
                result.updated += 1;
            } else {
                result.created += 1;
            }
            self.upsert(&mut tx, current, client.id, payload.product_id, &values, user_id, Some(REPLICATION_REASON))
                .await?;
        }

        tx.commit().await?;
        tracing::info!(
            "🏷️ Preço base replicado para {} clientes ({} novos, {} atualizados)",
            clients.len(),
            result.created,
            result.updated
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    #[test]
    fn final_price_applies_iva_then_discount() {
        let values = price_values(d("10000"), d("19"), d("10"));
        assert_eq!(values.price_with_iva, d("11900"));
        assert_eq!(values.final_price, d("10710"));
    }

    #[test]
    fn values_are_rounded_to_cents() {
        let values = price_values(d("99.999"), d("19"), d("3.5"));
        assert_eq!(values.base_price, d("100.00"));
        assert_eq!(values.price_with_iva, d("119.00"));
        assert_eq!(values.final_price, d("114.84"));
    }

    #[test]
    fn full_discount_gives_zero() {
        let values = price_values(d("500"), d("0"), d("100"));
        assert_eq!(values.price_with_iva, d("500"));
        assert_eq!(values.final_price, Decimal::ZERO);
    }
}
