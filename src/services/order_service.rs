// src/services/order_service.rs

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::{
        db_utils::{like_pattern, lock_sequence},
        error::AppError,
        money::{line_subtotal, Totals},
        numbering::next_document_number,
    },
    db::{
        order_repo::{NewOrderLine, OrderFields, OrderRepository},
        supplier_repo::SupplierRepository,
    },
    models::orders::{
        OrderDetail, OrderFilter, OrderKind, OrderLinePayload, OrderListResponse, OrderPayload,
        OrderStatus, PurchaseOrder,
    },
    services::inventory_service::blank_to_none,
};

pub const DEFAULT_UNIT: &str = "UND";

// Linha aproveitável do formulário
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineDraft {
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Descarta linhas sem descrição ou com quantidade zero.
pub fn usable_lines(lines: &[OrderLinePayload]) -> Vec<OrderLineDraft> {
    lines
        .iter()
        .filter(|l| !l.description.trim().is_empty() && l.quantity > Decimal::ZERO)
        .map(|l| OrderLineDraft {
            description: l.description.trim().to_string(),
            quantity: l.quantity,
            unit: blank_to_none(l.unit.as_deref())
                .map(str::to_uppercase)
                .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            unit_price: l.unit_price,
            subtotal: line_subtotal(l.quantity, l.unit_price),
        })
        .collect()
}

fn supplier_required() -> AppError {
    let mut error = ValidationError::new("required");
    error.message = Some("Informe o fornecedor.".into());
    let mut errors = ValidationErrors::new();
    errors.add("supplierName", error);
    AppError::ValidationError(errors)
}

struct OrderSupplier {
    id: Option<Uuid>,
    name: String,
    address: Option<String>,
    phone: Option<String>,
}

#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    supplier_repo: SupplierRepository,
    default_iva: Decimal,
}

impl OrderService {
    pub fn new(order_repo: OrderRepository, supplier_repo: SupplierRepository, default_iva: Decimal) -> Self {
        Self { order_repo, supplier_repo, default_iva }
    }

    pub async fn list(&self, filter: &OrderFilter) -> Result<OrderListResponse, AppError> {
        let pattern = like_pattern(filter.search.as_deref());
        let orders = self
            .order_repo
            .list(filter.kind, pattern.as_deref(), filter.status, filter.from, filter.to)
            .await?;
        let counts = self.order_repo.counts(filter.kind).await?;
        Ok(OrderListResponse { orders, counts })
    }

    pub async fn get(&self, id: Uuid) -> Result<OrderDetail, AppError> {
        let order = self
            .order_repo
            .find_by_id(self.order_repo.pool(), id)
            .await?
            .ok_or(AppError::OrderNotFound)?;
        self.detail(order).await
    }

    async fn detail(&self, order: PurchaseOrder) -> Result<OrderDetail, AppError> {
        let lines = self.order_repo.lines(self.order_repo.pool(), order.id).await?;
        let (prepared_by_name, verified_by_name) = self
            .order_repo
            .signer_names(order.prepared_by, order.verified_by)
            .await?;
        Ok(OrderDetail { order, prepared_by_name, verified_by_name, lines })
    }

    // Fornecedor do cadastro tem prioridade sobre o digitado
    async fn resolve_supplier<'e, E>(&self, executor: E, payload: &OrderPayload) -> Result<OrderSupplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if let Some(supplier_id) = payload.supplier_id {
            let supplier = self
                .supplier_repo
                .find_by_id(executor, supplier_id)
                .await?
                .ok_or(AppError::SupplierNotFound)?;
            return Ok(OrderSupplier {
                id: Some(supplier.id),
                name: supplier.name,
                address: supplier.address,
                phone: supplier.phone,
            });
        }

        let name = blank_to_none(payload.supplier_name.as_deref()).ok_or_else(supplier_required)?;
        Ok(OrderSupplier {
            id: None,
            name: name.to_string(),
            address: blank_to_none(payload.supplier_address.as_deref()).map(str::to_string),
            phone: blank_to_none(payload.supplier_phone.as_deref()).map(str::to_string),
        })
    }

    fn prepare(&self, payload: &OrderPayload) -> Result<(Vec<OrderLineDraft>, Decimal, Totals), AppError> {
        let lines = usable_lines(&payload.lines);
        if lines.is_empty() {
            return Err(AppError::EmptyDocument);
        }
        let iva_percent = payload.iva_percent.unwrap_or(self.default_iva);
        let totals = Totals::compute(lines.iter().map(|l| l.subtotal), iva_percent, payload.discount)?;
        Ok((lines, iva_percent, totals))
    }

    async fn write_lines(&self, conn: &mut PgConnection, order_id: Uuid, lines: &[OrderLineDraft]) -> Result<(), AppError> {
        for (index, line) in lines.iter().enumerate() {
            self.order_repo
                .insert_line(
                    &mut *conn,
                    order_id,
                    &NewOrderLine {
                        position: index as i32 + 1,
                        description: &line.description,
                        quantity: line.quantity,
                        unit: &line.unit,
                        unit_price: line.unit_price,
                        subtotal: line.subtotal,
                    },
                )
                .await?;
        }
        Ok(())
    }

    /// Cria a ordem com número `OC-AAAA-NNNN` ou `OP-AAAA-NNNN`.
    pub async fn create<'e, E>(&self, executor: E, payload: &OrderPayload, user_id: Uuid) -> Result<OrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let (lines, iva_percent, totals) = self.prepare(payload)?;
        let prefix = payload.kind.prefix();

        let mut tx = executor.begin().await?;
        lock_sequence(&mut *tx, prefix).await?;

        let supplier = self.resolve_supplier(&mut *tx, payload).await?;
        let last = self.order_repo.last_number(&mut *tx, prefix).await?;
        let number = next_document_number(prefix, Utc::now().year(), last.as_deref());

        let fields = OrderFields {
            supplier_id: supplier.id,
            supplier_name: &supplier.name,
            supplier_address: supplier.address.as_deref(),
            supplier_phone: supplier.phone.as_deref(),
            issue_date: payload.issue_date.unwrap_or_else(|| Utc::now().date_naive()),
            client_order_number: blank_to_none(payload.client_order_number.as_deref()),
            client_branch: blank_to_none(payload.client_branch.as_deref()),
            subtotal: totals.subtotal,
            iva_percent,
            iva: totals.iva,
            discount: totals.discount,
            total: totals.total,
            notes: blank_to_none(payload.notes.as_deref()),
        };
        let order = self
            .order_repo
            .insert_order(&mut *tx, &number, payload.kind, &fields, user_id)
            .await?;
        self.write_lines(&mut *tx, order.id, &lines).await?;

        tx.commit().await?;
        tracing::info!("✅ Ordem {} criada: total {}", number, totals.total);

        self.detail(order).await
    }

    /// Regrava cabeçalho e linhas. Ordens finalizadas não mudam.
    pub async fn update<'e, E>(&self, executor: E, id: Uuid, payload: &OrderPayload) -> Result<OrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let (lines, iva_percent, totals) = self.prepare(payload)?;

        let mut tx = executor.begin().await?;
        let current = self
            .order_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::OrderNotFound)?;
        if current.status.is_final() {
            return Err(AppError::OrderLocked);
        }

        let supplier = self.resolve_supplier(&mut *tx, payload).await?;
        let fields = OrderFields {
            supplier_id: supplier.id,
            supplier_name: &supplier.name,
            supplier_address: supplier.address.as_deref(),
            supplier_phone: supplier.phone.as_deref(),
            issue_date: payload.issue_date.unwrap_or(current.issue_date),
            client_order_number: blank_to_none(payload.client_order_number.as_deref()),
            client_branch: blank_to_none(payload.client_branch.as_deref()),
            subtotal: totals.subtotal,
            iva_percent,
            iva: totals.iva,
            discount: totals.discount,
            total: totals.total,
            notes: blank_to_none(payload.notes.as_deref()),
        };
        let order = self.order_repo.update_order(&mut *tx, id, &fields).await?;
        self.order_repo.delete_lines(&mut *tx, id).await?;
        self.write_lines(&mut *tx, id, &lines).await?;

        tx.commit().await?;
        self.detail(order).await
    }

    /// Aprovação registra quem verificou (se ainda vazio).
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: OrderStatus,
        user_id: Uuid,
    ) -> Result<OrderDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let current = self
            .order_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::OrderNotFound)?;
        if !current.status.can_transition_to(status) {
            return Err(AppError::OrderLocked);
        }

        let verified_by = (status == OrderStatus::Approved).then_some(user_id);
        let order = self.order_repo.set_status(&mut *tx, id, status, verified_by).await?;
        tx.commit().await?;

        tracing::info!("🏷️ Ordem {}: {:?} -> {:?}", order.number, current.status, status);
        self.detail(order).await
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let order = self
            .order_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::OrderNotFound)?;
        if order.status == OrderStatus::Completed {
            return Err(AppError::OrderLocked);
        }
        self.order_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("🗑️ Ordem {} removida", order.number);
        Ok(order)
    }

    /// Ordens do tipo para o relatório em PDF.
    pub async fn report(&self, kind: Option<OrderKind>) -> Result<OrderListResponse, AppError> {
        self.list(&OrderFilter { kind, ..Default::default() }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    fn line(description: &str, quantity: &str, unit: Option<&str>, price: &str) -> OrderLinePayload {
        OrderLinePayload {
            description: description.into(),
            quantity: d(quantity),
            unit: unit.map(Into::into),
            unit_price: d(price),
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        let lines = usable_lines(&[
            line("Escritorio en L", "2", None, "450000"),
            line("   ", "5", None, "10"),
            line("Silla", "0", Some("und"), "90000"),
            line(" Archivador ", "1.5", Some(" m2 "), "100.10"),
        ]);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit, DEFAULT_UNIT);
        assert_eq!(lines[0].subtotal, d("900000"));
        assert_eq!(lines[1].description, "Archivador");
        assert_eq!(lines[1].unit, "M2");
        assert_eq!(lines[1].subtotal, d("150.15"));
    }

    #[test]
    fn missing_supplier_is_a_validation_error() {
        match supplier_required() {
            AppError::ValidationError(errors) => {
                assert!(errors.field_errors().contains_key("supplierName"));
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn final_orders_do_not_move() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Approved));
        assert!(OrderStatus::Approved.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Approved));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }
}
