// src/common/money.rs

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::error::AppError;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn line_subtotal(quantity: Decimal, unit_price: Decimal) -> Decimal {
    round_money(quantity * unit_price)
}

// Totais de um documento (venda, compra, ordem)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Decimal,
    pub iva: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// subtotal = Σ linhas; iva = subtotal · pct / 100; total = subtotal + iva − desconto.
    pub fn compute<I>(line_subtotals: I, iva_percent: Decimal, discount: Decimal) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = Decimal>,
    {
        let subtotal = round_money(line_subtotals.into_iter().sum());
        let iva = round_money(subtotal * iva_percent / HUNDRED);
        let discount = round_money(discount);

        if discount > subtotal + iva {
            return Err(AppError::DiscountExceedsTotal);
        }

        Ok(Self {
            subtotal,
            iva,
            discount,
            total: subtotal + iva - discount,
        })
    }
}

pub fn price_with_iva(base: Decimal, iva_percent: Decimal) -> Decimal {
    round_money(base * (Decimal::ONE + iva_percent / HUNDRED))
}

pub fn apply_discount(price: Decimal, discount_percent: Decimal) -> Decimal {
    round_money(price * (Decimal::ONE - discount_percent / HUNDRED))
}

/// Margem sobre o preço de venda, em %. Zero quando preço ou custo não estão definidos.
pub fn profit_margin(price: Decimal, cost: Decimal) -> Decimal {
    if price > Decimal::ZERO && cost > Decimal::ZERO {
        round_money((price - cost) / price * HUNDRED)
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    #[test]
    fn totals_apply_iva_then_discount() {
        let t = Totals::compute([d("100"), d("50")], d("19"), d("10")).unwrap();
        assert_eq!(t.subtotal, d("150"));
        assert_eq!(t.iva, d("28.50"));
        assert_eq!(t.total, d("168.50"));
    }

    #[test]
    fn totals_round_to_cents() {
        let t = Totals::compute([line_subtotal(d("3"), d("0.333"))], d("19"), Decimal::ZERO).unwrap();
        assert_eq!(t.subtotal, d("1.00"));
        assert_eq!(t.iva, d("0.19"));
        assert_eq!(t.total, d("1.19"));
    }

    #[test]
    fn discount_cannot_exceed_total() {
        let err = Totals::compute([d("10")], d("0"), d("10.01")).unwrap_err();
        assert!(matches!(err, AppError::DiscountExceedsTotal));
        assert!(Totals::compute([d("10")], d("0"), d("10")).is_ok());
    }

    #[test]
    fn client_price_formula() {
        let with_iva = price_with_iva(d("1000"), d("19"));
        assert_eq!(with_iva, d("1190"));
        assert_eq!(apply_discount(with_iva, d("10")), d("1071"));
    }

    #[test]
    fn margin_needs_price_and_cost() {
        assert_eq!(profit_margin(d("150"), d("100")), d("33.33"));
        assert_eq!(profit_margin(d("150"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(profit_margin(Decimal::ZERO, d("10")), Decimal::ZERO);
    }
}
