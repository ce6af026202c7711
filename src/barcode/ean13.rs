// src/barcode/ean13.rs

use rand::Rng;

use super::BarcodeError;

const L_CODES: [&str; 10] = [
    "0001101", "0011001", "0010011", "0111101", "0100011",
    "0110001", "0101111", "0111011", "0110111", "0001011",
];

const G_CODES: [&str; 10] = [
    "0100111", "0110011", "0011011", "0100001", "0011101",
    "0111001", "0000101", "0010001", "0001001", "0010111",
];

const R_CODES: [&str; 10] = [
    "1110010", "1100110", "1101100", "1000010", "1011100",
    "1001110", "1010000", "1000100", "1001000", "1110100",
];

// Paridade do bloco esquerdo, escolhida pelo primeiro dígito
const PARITY: [&str; 10] = [
    "LLLLLL", "LLGLGG", "LLGGLG", "LLGGGL", "LGLLGG",
    "LGGLLG", "LGGGLL", "LGLGLG", "LGLGGL", "LGGLGL",
];

/// Dígito verificador sobre os 12 primeiros dígitos.
/// Posições pares (0, 2, …, 10) têm peso 1 e ímpares (1, 3, …, 11) peso 3.
pub fn check_digit(digits: &[u8]) -> u8 {
    let odd: u32 = digits.iter().step_by(2).map(|d| *d as u32).sum();
    let even: u32 = digits.iter().skip(1).step_by(2).map(|d| *d as u32).sum();
    ((10 - (odd + 3 * even) % 10) % 10) as u8
}

fn parse_digits(code: &str, expected: usize) -> Result<Vec<u8>, BarcodeError> {
    if code.is_empty() {
        return Err(BarcodeError::Empty);
    }
    let actual = code.chars().count();
    if actual != expected {
        return Err(BarcodeError::WrongLength { expected, actual });
    }
    code.chars()
        .map(|c| c.to_digit(10).map(|d| d as u8).ok_or(BarcodeError::NonDigit))
        .collect()
}

pub fn validate(code: &str) -> Result<(), BarcodeError> {
    let digits = parse_digits(code, 13)?;
    let expected = check_digit(&digits[..12]);
    if digits[12] != expected {
        return Err(BarcodeError::CheckDigit { expected, found: digits[12] });
    }
    Ok(())
}

/// UPC-A é um EAN-13 com o primeiro dígito zero.
pub fn validate_upc(code: &str) -> Result<(), BarcodeError> {
    parse_digits(code, 12)?;
    validate(&format!("0{}", code))
}

/// Gera um EAN-13 aleatório com dígito verificador válido.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    let digits: Vec<u8> = (0..12).map(|_| rng.gen_range(0..10)).collect();
    complete(&digits)
}

/// Acrescenta o dígito verificador aos 12 dígitos informados.
pub fn complete(digits: &[u8]) -> String {
    let mut code: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
    code.push(char::from(b'0' + check_digit(digits)));
    code
}

fn push_pattern(pattern: &str, out: &mut Vec<bool>) {
    out.extend(pattern.bytes().map(|b| b == b'1'));
}

pub fn encode(code: &str) -> Result<Vec<bool>, BarcodeError> {
    validate(code)?;
    let digits = parse_digits(code, 13)?;
    let parity = PARITY[digits[0] as usize].as_bytes();

    let mut modules = Vec::with_capacity(95);
    push_pattern("101", &mut modules);
    for (i, d) in digits[1..7].iter().enumerate() {
        let table = if parity[i] == b'L' { &L_CODES } else { &G_CODES };
        push_pattern(table[*d as usize], &mut modules);
    }
    push_pattern("01010", &mut modules);
    for d in &digits[7..] {
        push_pattern(R_CODES[*d as usize], &mut modules);
    }
    push_pattern("101", &mut modules);
    Ok(modules)
}

pub fn encode_upc(code: &str) -> Result<Vec<bool>, BarcodeError> {
    validate_upc(code)?;
    encode(&format!("0{}", code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn digits(s: &str) -> Vec<u8> {
        s.bytes().map(|b| b - b'0').collect()
    }

    #[test]
    fn known_check_digits() {
        assert_eq!(check_digit(&digits("400638133393")), 1);
        assert_eq!(check_digit(&digits("590123412345")), 7);
        assert_eq!(check_digit(&digits("000000000000")), 0);
    }

    #[test]
    fn validation_reports_the_problem() {
        assert_eq!(validate(""), Err(BarcodeError::Empty));
        assert_eq!(
            validate("123"),
            Err(BarcodeError::WrongLength { expected: 13, actual: 3 })
        );
        assert_eq!(validate("40063813339A1"), Err(BarcodeError::NonDigit));
        assert_eq!(
            validate("4006381333932"),
            Err(BarcodeError::CheckDigit { expected: 1, found: 2 })
        );
        assert!(validate("4006381333931").is_ok());
    }

    #[test]
    fn upc_shares_the_checksum() {
        assert!(validate_upc("036000291452").is_ok());
        assert!(validate_upc("036000291453").is_err());
        assert!(validate_upc("4006381333931").is_err());
    }

    #[test]
    fn encoding_has_95_modules_and_guards() {
        let modules = encode("4006381333931").unwrap();
        assert_eq!(modules.len(), 95);
        assert_eq!(&modules[..3], &[true, false, true]);
        assert_eq!(&modules[45..50], &[false, true, false, true, false]);
        assert_eq!(&modules[92..], &[true, false, true]);
    }

    #[test]
    fn first_digit_selects_parity() {
        // Primeiro dígito 0: bloco esquerdo todo em L, igual ao UPC-A
        let ean = encode("0036000291452").unwrap();
        let upc = encode_upc("036000291452").unwrap();
        assert_eq!(ean, upc);
        assert_eq!(&ean[3..10], &[false, false, false, true, true, false, true]);
    }

    #[test]
    fn r_codes_mirror_l_codes() {
        for (l, r) in L_CODES.iter().zip(R_CODES.iter()) {
            let inverted: String = l.chars().map(|c| if c == '0' { '1' } else { '0' }).collect();
            assert_eq!(&inverted, r);
        }
    }

    #[test]
    fn generated_codes_validate() {
        for _ in 0..50 {
            let code = generate();
            assert_eq!(code.len(), 13);
            assert!(validate(&code).is_ok(), "{}", code);
        }
    }

    proptest! {
        #[test]
        fn completed_codes_always_validate(ds in proptest::collection::vec(0u8..10, 12)) {
            let code = complete(&ds);
            prop_assert!(validate(&code).is_ok());
        }

        #[test]
        fn any_single_digit_change_is_detected(
            ds in proptest::collection::vec(0u8..10, 12),
            pos in 0usize..13,
            delta in 1u8..10,
        ) {
            let code = complete(&ds);
            let mut bytes = code.into_bytes();
            bytes[pos] = b'0' + (bytes[pos] - b'0' + delta) % 10;
            let altered = String::from_utf8(bytes).unwrap();
            prop_assert!(validate(&altered).is_err());
        }
    }
}
