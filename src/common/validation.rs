// src/common/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_percentage(val: &Decimal) -> Result<(), ValidationError> {
    if *val < Decimal::ZERO || *val > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.add_param("max".into(), &100.0);
        err.message = Some("O percentual deve estar entre 0 e 100.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("O campo é obrigatório.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    #[test]
    fn negatives_are_rejected() {
        assert!(validate_not_negative(&d("0")).is_ok());
        assert!(validate_not_negative(&d("10.50")).is_ok());
        assert!(validate_not_negative(&d("-0.01")).is_err());
    }

    #[test]
    fn percentages_stay_within_bounds() {
        assert!(validate_percentage(&d("0")).is_ok());
        assert!(validate_percentage(&d("100")).is_ok());
        assert!(validate_percentage(&d("19")).is_ok());
        assert!(validate_percentage(&d("100.01")).is_err());
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("x").is_ok());
    }
}
