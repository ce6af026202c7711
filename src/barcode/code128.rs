// src/barcode/code128.rs
//
// Code 128 restrito ao conjunto B (ASCII imprimível).

use super::{widths_to_modules, BarcodeError};

const START_B: usize = 104;
const STOP: &str = "2331112";

// Larguras (barra, espaço, ...) dos valores 0..=105
const PATTERNS: [&str; 106] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212", "221213",
    "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221", "223211", "221132",
    "221231", "213212", "223112", "312131", "311222", "321122", "321221", "312212", "322112", "322211",
    "212123", "212321", "232121", "111323", "131123", "131321", "112313", "132113", "132311", "211313",
    "231113", "231311", "112133", "112331", "132131", "113123", "113321", "133121", "313121", "211331",
    "231131", "213113", "213311", "213131", "311123", "311321", "331121", "312113", "312311", "332111",
    "314111", "221411", "431111", "111224", "111422", "121124", "121421", "141122", "141221", "112214",
    "112412", "122114", "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111",
    "111242", "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311", "113141",
    "114131", "311141", "411131", "211412", "211214", "211232",
];

pub fn validate(code: &str) -> Result<(), BarcodeError> {
    if code.is_empty() {
        return Err(BarcodeError::Empty);
    }
    match code.chars().find(|c| !(' '..='~').contains(c)) {
        Some(c) => Err(BarcodeError::UnsupportedChar(c)),
        None => Ok(()),
    }
}

fn values(code: &str) -> Vec<usize> {
    code.bytes().map(|b| (b - b' ') as usize).collect()
}

/// Soma ponderada módulo 103, começando pelo valor do START B.
pub fn checksum(values: &[usize]) -> usize {
    let weighted: usize = values.iter().enumerate().map(|(i, v)| (i + 1) * v).sum();
    (START_B + weighted) % 103
}

fn widths(pattern: &str) -> impl Iterator<Item = u8> + '_ {
    pattern.bytes().map(|b| b - b'0')
}

pub fn encode(code: &str) -> Result<Vec<bool>, BarcodeError> {
    validate(code)?;
    let values = values(code);

    let mut modules = Vec::with_capacity((values.len() + 3) * 11 + 2);
    widths_to_modules(widths(PATTERNS[START_B]), &mut modules);
    for v in &values {
        widths_to_modules(widths(PATTERNS[*v]), &mut modules);
    }
    widths_to_modules(widths(PATTERNS[checksum(&values)]), &mut modules);
    widths_to_modules(widths(STOP), &mut modules);
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_symbol_is_eleven_modules() {
        for (i, p) in PATTERNS.iter().enumerate() {
            let total: u32 = p.bytes().map(|b| (b - b'0') as u32).sum();
            assert_eq!(total, 11, "valor {}", i);
        }
        let stop: u32 = STOP.bytes().map(|b| (b - b'0') as u32).sum();
        assert_eq!(stop, 13);
    }

    #[test]
    fn checksum_of_reference_value() {
        // "PJJ123C": 104 + 48·1 + 42·2 + 42·3 + 17·4 + 18·5 + 19·6 + 35·7 = 879 ≡ 55
        assert_eq!(checksum(&values("PJJ123C")), 55);
    }

    #[test]
    fn encoded_length() {
        let modules = encode("PJJ123C").unwrap();
        // start + 7 símbolos + checksum = 9 × 11, mais o stop de 13
        assert_eq!(modules.len(), 9 * 11 + 13);
        assert!(modules[0]);
        assert!(*modules.last().unwrap());
    }

    #[test]
    fn rejects_non_printable() {
        assert_eq!(validate("año"), Err(BarcodeError::UnsupportedChar('ñ')));
        assert_eq!(validate("a\tb"), Err(BarcodeError::UnsupportedChar('\t')));
        assert_eq!(validate(""), Err(BarcodeError::Empty));
    }
}
