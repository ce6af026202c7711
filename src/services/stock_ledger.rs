// src/services/stock_ledger.rs
//
// Toda mudança de quantidade passa por aqui: trava o produto, calcula o novo saldo,
// grava o saldo e o movimento na mesma transação do chamador.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::product_repo::{NewMovement, ProductRepository},
    models::product::{MovementKind, Product, StockMovement},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerChange {
    pub previous: i32,
    pub new: i32,
    /// Quantidade gravada no movimento (no ajuste, a diferença absoluta)
    pub recorded: i32,
}

/// Regra de saldo por tipo de movimento.
/// No ajuste `quantity` é o saldo final desejado.
pub fn apply_movement(
    kind: MovementKind,
    current: i32,
    quantity: i32,
    product_name: &str,
) -> Result<LedgerChange, AppError> {
    match kind {
        MovementKind::Adjustment => {
            if quantity < 0 {
                return Err(AppError::InvalidQuantity);
            }
            Ok(LedgerChange {
                previous: current,
                new: quantity,
                recorded: (quantity - current).abs(),
            })
        }
        _ if quantity <= 0 => Err(AppError::InvalidQuantity),
        MovementKind::Entry => {
            let new = current.checked_add(quantity).ok_or(AppError::InvalidQuantity)?;
            Ok(LedgerChange { previous: current, new, recorded: quantity })
        }
        MovementKind::Exit | MovementKind::Loan => {
            if quantity > current {
                return Err(AppError::InsufficientStock {
                    product: product_name.to_string(),
                    available: current,
                    requested: quantity,
                });
            }
            Ok(LedgerChange {
                previous: current,
                new: current - quantity,
                recorded: quantity,
            })
        }
    }
}

// Metadados do movimento
#[derive(Debug, Default, Clone, Copy)]
pub struct MovementMeta<'a> {
    pub reason: Option<&'a str>,
    pub reference: Option<&'a str>,
    pub barcode_scanned: Option<&'a str>,
    pub user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct StockLedger {
    product_repo: ProductRepository,
}

impl StockLedger {
    pub fn new(product_repo: ProductRepository) -> Self {
        Self { product_repo }
    }

    /// Trava o produto e registra o movimento.
    pub async fn record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        kind: MovementKind,
        quantity: i32,
        meta: MovementMeta<'_>,
    ) -> Result<(Product, StockMovement), AppError> {
        let product = self
            .product_repo
            .lock_by_id(&mut **tx, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        self.record_locked(tx, product, kind, quantity, meta).await
    }

    /// Para quem já travou a linha na mesma transação (ex.: leitura por código de barras).
    pub async fn record_locked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: Product,
        kind: MovementKind,
        quantity: i32,
        meta: MovementMeta<'_>,
    ) -> Result<(Product, StockMovement), AppError> {
        let change = apply_movement(kind, product.quantity, quantity, &product.name)?;

        let updated = self
            .product_repo
            .set_quantity(&mut **tx, product.id, change.new)
            .await?;

        let movement = self
            .product_repo
            .insert_movement(
                &mut **tx,
                &NewMovement {
                    product_id: product.id,
                    kind,
                    quantity: change.recorded,
                    previous_quantity: change.previous,
                    new_quantity: change.new,
                    reason: meta.reason,
                    reference: meta.reference,
                    barcode_scanned: meta.barcode_scanned,
                    user_id: meta.user_id,
                },
            )
            .await?;

        tracing::debug!(
            "📦 {:?} {} ({} -> {}) em {}",
            kind, change.recorded, change.previous, change.new, product.code
        );

        Ok((updated, movement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_adds() {
        let change = apply_movement(MovementKind::Entry, 4, 6, "Silla").unwrap();
        assert_eq!(change, LedgerChange { previous: 4, new: 10, recorded: 6 });
    }

    #[test]
    fn exit_and_loan_subtract() {
        assert_eq!(apply_movement(MovementKind::Exit, 10, 10, "Silla").unwrap().new, 0);
        assert_eq!(apply_movement(MovementKind::Loan, 10, 3, "Silla").unwrap().new, 7);
    }

    #[test]
    fn exit_reports_available_stock() {
        match apply_movement(MovementKind::Exit, 2, 5, "Silla") {
            Err(AppError::InsufficientStock { product, available, requested }) => {
                assert_eq!(product, "Silla");
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("esperava estoque insuficiente, veio {:?}", other),
        }
    }

    #[test]
    fn adjustment_records_absolute_difference() {
        let down = apply_movement(MovementKind::Adjustment, 12, 5, "Silla").unwrap();
        assert_eq!(down, LedgerChange { previous: 12, new: 5, recorded: 7 });

        let up = apply_movement(MovementKind::Adjustment, 5, 12, "Silla").unwrap();
        assert_eq!(up.recorded, 7);

        assert_eq!(apply_movement(MovementKind::Adjustment, 5, 0, "Silla").unwrap().new, 0);
    }

    #[test]
    fn quantities_must_be_positive() {
        assert!(matches!(
            apply_movement(MovementKind::Entry, 5, 0, "Silla"),
            Err(AppError::InvalidQuantity)
        ));
        assert!(matches!(
            apply_movement(MovementKind::Exit, 5, -1, "Silla"),
            Err(AppError::InvalidQuantity)
        ));
        assert!(matches!(
            apply_movement(MovementKind::Adjustment, 5, -1, "Silla"),
            Err(AppError::InvalidQuantity)
        ));
    }
}
