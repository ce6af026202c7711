// src/db/supplier_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_db_error, map_delete_error, AppError},
    models::{
        purchase::OriginKind,
        supplier::{Supplier, SupplierCounts, SupplierStatus},
    },
};

fn unique_violation(constraint: &str) -> Option<AppError> {
    match constraint {
        "suppliers_nit_key" => Some(AppError::NitAlreadyExists),
        _ => None,
    }
}

pub struct SupplierFields<'a> {
    pub name: &'a str,
    pub nit: Option<&'a str>,
    pub kind: OriginKind,
    pub address: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub contact_name: Option<&'a str>,
    pub status: SupplierStatus,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct SupplierRepository {
    pool: PgPool,
}

impl SupplierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        pattern: Option<&str>,
        status: Option<SupplierStatus>,
        kind: Option<OriginKind>,
    ) -> Result<Vec<Supplier>, AppError> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT * FROM suppliers
            WHERE ($1::text IS NULL OR name ILIKE $1 OR nit ILIKE $1 OR email ILIKE $1)
              AND ($2::supplier_status IS NULL OR status = $2)
              AND ($3::origin_kind IS NULL OR kind = $3)
            ORDER BY name
            "#,
        )
            .bind(pattern)
            .bind(status)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    pub async fn counts(&self) -> Result<SupplierCounts, AppError> {
        let counts = sqlx::query_as::<_, SupplierCounts>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'ACTIVE') AS active,
                COUNT(*) FILTER (WHERE status = 'INACTIVE') AS inactive,
                COUNT(*) FILTER (WHERE kind = 'NATIONAL') AS national
            FROM suppliers
            "#,
        )
            .fetch_one(&self.pool)
            .await?;
        Ok(counts)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(supplier)
    }

    /// NIT já usado por outro fornecedor (ignorando `exclude`).
    pub async fn nit_taken(&self, nit: &str, exclude: Option<Uuid>) -> Result<bool, AppError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM suppliers WHERE nit = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
            .bind(nit)
            .bind(exclude)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        fields: &SupplierFields<'_>,
        registered_by: Uuid,
    ) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, nit, kind, address, phone, email, contact_name, status, notes, registered_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
            .bind(fields.name)
            .bind(fields.nit)
            .bind(fields.kind)
            .bind(fields.address)
            .bind(fields.phone)
            .bind(fields.email)
            .bind(fields.contact_name)
            .bind(fields.status)
            .bind(fields.notes)
            .bind(registered_by)
            .fetch_one(executor)
            .await
            .map_err(|e| map_db_error(e, unique_violation))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &SupplierFields<'_>,
    ) -> Result<Option<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers
            SET name = $2, nit = $3, kind = $4, address = $5, phone = $6, email = $7,
                contact_name = $8, status = $9, notes = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(fields.name)
            .bind(fields.nit)
            .bind(fields.kind)
            .bind(fields.address)
            .bind(fields.phone)
            .bind(fields.email)
            .bind(fields.contact_name)
            .bind(fields.status)
            .bind(fields.notes)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_db_error(e, unique_violation))
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: SupplierStatus,
    ) -> Result<Option<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let supplier = sqlx::query_as::<_, Supplier>(
            "UPDATE suppliers SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
            .bind(id)
            .bind(status)
            .fetch_optional(executor)
            .await?;
        Ok(supplier)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Supplier>("DELETE FROM suppliers WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(map_delete_error)
    }
}
