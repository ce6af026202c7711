// src/barcode.rs
//
// Simbologias suportadas e a conversão de um código em módulos (barra = true).

pub mod code128;
pub mod code39;
pub mod ean13;
pub mod render;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::common::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarcodeError {
    #[error("o código está vazio")]
    Empty,

    #[error("o código deve ter {expected} dígitos (recebido {actual})")]
    WrongLength { expected: usize, actual: usize },

    #[error("o código deve conter apenas dígitos")]
    NonDigit,

    #[error("dígito verificador incorreto: esperado {expected}, recebido {found}")]
    CheckDigit { expected: u8, found: u8 },

    #[error("caractere não suportado: {0:?}")]
    UnsupportedChar(char),
}

impl From<BarcodeError> for AppError {
    fn from(e: BarcodeError) -> Self {
        AppError::InvalidBarcode(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    #[default]
    Ean13,
    Upc,
    Code128,
    Code39,
}

impl Symbology {
    pub fn name(self) -> &'static str {
        match self {
            Symbology::Ean13 => "ean13",
            Symbology::Upc => "upc",
            Symbology::Code128 => "code128",
            Symbology::Code39 => "code39",
        }
    }

    pub fn validate(self, code: &str) -> Result<(), BarcodeError> {
        match self {
            Symbology::Ean13 => ean13::validate(code),
            Symbology::Upc => ean13::validate_upc(code),
            Symbology::Code128 => code128::validate(code),
            Symbology::Code39 => code39::validate(code),
        }
    }

    /// Converte o código na sequência de módulos, já com as guardas.
    pub fn encode(self, code: &str) -> Result<Vec<bool>, BarcodeError> {
        match self {
            Symbology::Ean13 => ean13::encode(code),
            Symbology::Upc => ean13::encode_upc(code),
            Symbology::Code128 => code128::encode(code),
            Symbology::Code39 => code39::encode(code),
        }
    }
}

/// Expande larguras alternadas (barra, espaço, barra...) em módulos.
pub(crate) fn widths_to_modules(widths: impl IntoIterator<Item = u8>, out: &mut Vec<bool>) {
    for (i, width) in widths.into_iter().enumerate() {
        let bar = i % 2 == 0;
        out.extend(std::iter::repeat_n(bar, width as usize));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_alternate_bars_and_spaces() {
        let mut modules = Vec::new();
        widths_to_modules([2, 1, 3], &mut modules);
        assert_eq!(modules, vec![true, true, false, true, true, true]);
    }

    #[test]
    fn symbology_dispatch() {
        assert!(Symbology::Ean13.validate("4006381333931").is_ok());
        assert!(Symbology::Upc.validate("036000291452").is_ok());
        assert!(Symbology::Code39.validate("ABC-123").is_ok());
        assert!(Symbology::Code128.validate("Silla #4").is_ok());
        assert_eq!(Symbology::Code39.validate(""), Err(BarcodeError::Empty));
    }

    #[test]
    fn invalid_barcode_becomes_bad_request() {
        let err: AppError = BarcodeError::NonDigit.into();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
