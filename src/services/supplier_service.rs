// src/services/supplier_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::like_pattern, error::AppError},
    db::supplier_repo::{SupplierFields, SupplierRepository},
    models::supplier::{Supplier, SupplierFilter, SupplierListResponse, SupplierPayload, SupplierStatus},
    services::inventory_service::blank_to_none,
};

fn supplier_fields(payload: &SupplierPayload) -> SupplierFields<'_> {
    SupplierFields {
        name: payload.name.trim(),
        nit: blank_to_none(payload.nit.as_deref()),
        kind: payload.kind,
        address: blank_to_none(payload.address.as_deref()),
        phone: blank_to_none(payload.phone.as_deref()),
        email: blank_to_none(payload.email.as_deref()),
        contact_name: blank_to_none(payload.contact_name.as_deref()),
        status: payload.status,
        notes: blank_to_none(payload.notes.as_deref()),
    }
}

#[derive(Clone)]
pub struct SupplierService {
    supplier_repo: SupplierRepository,
}

impl SupplierService {
    pub fn new(supplier_repo: SupplierRepository) -> Self {
        Self { supplier_repo }
    }

    pub async fn list(&self, filter: &SupplierFilter) -> Result<SupplierListResponse, AppError> {
        let pattern = like_pattern(filter.search.as_deref());
        let suppliers = self
            .supplier_repo
            .list(pattern.as_deref(), filter.status, filter.kind)
            .await?;
        let counts = self.supplier_repo.counts().await?;
        Ok(SupplierListResponse { suppliers, counts })
    }

    pub async fn get<'e, E>(&self, executor: E, id: Uuid) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.supplier_repo
            .find_by_id(executor, id)
            .await?
            .ok_or(AppError::SupplierNotFound)
    }

    async fn ensure_nit_free(&self, nit: Option<&str>, exclude: Option<Uuid>) -> Result<(), AppError> {
        if let Some(nit) = nit {
            if self.supplier_repo.nit_taken(nit, exclude).await? {
                return Err(AppError::NitAlreadyExists);
            }
        }
        Ok(())
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &SupplierPayload, user_id: Uuid) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fields = supplier_fields(payload);
        self.ensure_nit_free(fields.nit, None).await?;

        let supplier = self.supplier_repo.create(executor, &fields, user_id).await?;
        tracing::info!("✅ Fornecedor {} cadastrado", supplier.name);
        Ok(supplier)
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, payload: &SupplierPayload) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fields = supplier_fields(payload);
        self.ensure_nit_free(fields.nit, Some(id)).await?;

        self.supplier_repo
            .update(executor, id, &fields)
            .await?
            .ok_or(AppError::SupplierNotFound)
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: Uuid, status: SupplierStatus) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.supplier_repo
            .set_status(executor, id, status)
            .await?
            .ok_or(AppError::SupplierNotFound)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let supplier = self
            .supplier_repo
            .delete(executor, id)
            .await?
            .ok_or(AppError::SupplierNotFound)?;
        tracing::info!("🗑️ Fornecedor {} removido", supplier.name);
        Ok(supplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_are_dropped() {
        let payload: SupplierPayload = serde_json::from_str(
            r#"{"name": "  Maderas del Norte ", "nit": "  ", "email": "", "phone": "300 123"}"#,
        )
        .unwrap();
        let fields = supplier_fields(&payload);
        assert_eq!(fields.name, "Maderas del Norte");
        assert_eq!(fields.nit, None);
        assert_eq!(fields.email, None);
        assert_eq!(fields.phone, Some("300 123"));
        assert_eq!(fields.status, SupplierStatus::Active);
    }
}
