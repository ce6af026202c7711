// src/db/pricing_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::pricing::{ClientPrice, ClientPriceHistory, ClientPriceView},
};

// Valores calculados de um preço
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceValues {
    pub base_price: Decimal,
    pub iva_percent: Decimal,
    pub price_with_iva: Decimal,
    pub discount_percent: Decimal,
    pub final_price: Decimal,
}

const VIEW_SELECT: &str = r#"
    SELECT cp.*, c.name AS client_name, p.code AS product_code, p.name AS product_name
    FROM client_prices cp
    JOIN clients c ON c.id = cp.client_id
    JOIN products p ON p.id = cp.product_id
"#;

#[derive(Clone)]
pub struct PricingRepository {
    pool: PgPool,
}

impl PricingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Preço ativo do par cliente/produto, travado para atualização.
    pub async fn lock_active<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<ClientPrice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let price = sqlx::query_as::<_, ClientPrice>(
            r#"
            SELECT * FROM client_prices
            WHERE client_id = $1 AND product_id = $2 AND active
            FOR UPDATE
            "#,
        )
            .bind(client_id)
            .bind(product_id)
            .fetch_optional(executor)
            .await?;
        Ok(price)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        client_id: Uuid,
        product_id: Uuid,
        values: &PriceValues,
        created_by: Uuid,
    ) -> Result<ClientPrice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let price = sqlx::query_as::<_, ClientPrice>(
            r#"
            INSERT INTO client_prices (
                client_id, product_id, base_price, iva_percent, price_with_iva,
                discount_percent, final_price, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(client_id)
            .bind(product_id)
            .bind(values.base_price)
            .bind(values.iva_percent)
            .bind(values.price_with_iva)
            .bind(values.discount_percent)
            .bind(values.final_price)
            .bind(created_by)
            .fetch_one(executor)
            .await?;
        Ok(price)
    }

    pub async fn update_values<'e, E>(&self, executor: E, id: Uuid, values: &PriceValues) -> Result<ClientPrice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let price = sqlx::query_as::<_, ClientPrice>(
            r#"
            UPDATE client_prices
            SET base_price = $2, iva_percent = $3, price_with_iva = $4,
                discount_percent = $5, final_price = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(values.base_price)
            .bind(values.iva_percent)
            .bind(values.price_with_iva)
            .bind(values.discount_percent)
            .bind(values.final_price)
            .fetch_one(executor)
            .await?;
        Ok(price)
    }

    pub async fn insert_history<'e, E>(
        &self,
        executor: E,
        client_price_id: Uuid,
        previous_price: Decimal,
        new_price: Decimal,
        changed_by: Uuid,
        reason: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO client_price_history (client_price_id, previous_price, new_price, changed_by, reason)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
            .bind(client_price_id)
            .bind(previous_price)
            .bind(new_price)
            .bind(changed_by)
            .bind(reason)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn deactivate<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ClientPrice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let price = sqlx::query_as::<_, ClientPrice>(
            "UPDATE client_prices SET active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(price)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM client_prices WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn find_view(&self, id: Uuid) -> Result<Option<ClientPriceView>, AppError> {
        let query = format!("{VIEW_SELECT} WHERE cp.id = $1");
        let price = sqlx::query_as::<_, ClientPriceView>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(price)
    }

    /// Preços ativos do cliente, por nome de produto.
    pub async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<ClientPriceView>, AppError> {
        let query = format!("{VIEW_SELECT} WHERE cp.client_id = $1 AND cp.active ORDER BY p.name");
        let prices = sqlx::query_as::<_, ClientPriceView>(&query)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(prices)
    }

    pub async fn history(&self, client_price_id: Uuid) -> Result<Vec<ClientPriceHistory>, AppError> {
        let history = sqlx::query_as::<_, ClientPriceHistory>(
            r#"
            SELECT h.*, COALESCE(u.full_name, u.username) AS changed_by_name
            FROM client_price_history h
            LEFT JOIN users u ON u.id = h.changed_by
            WHERE h.client_price_id = $1
            ORDER BY h.created_at DESC
            "#,
        )
            .bind(client_price_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(history)
    }
}
