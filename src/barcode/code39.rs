// src/barcode/code39.rs

use super::{widths_to_modules, BarcodeError};

const NARROW: u8 = 1;
const WIDE: u8 = 3;

// 9 elementos por caractere (5 barras, 4 espaços), 3 deles largos
const PATTERNS: [(char, &str); 44] = [
    ('0', "nnnwwnwnn"), ('1', "wnnwnnnnw"), ('2', "nnwwnnnnw"), ('3', "wnwwnnnnn"),
    ('4', "nnnwwnnnw"), ('5', "wnnwwnnnn"), ('6', "nnwwwnnnn"), ('7', "nnnwnnwnw"),
    ('8', "wnnwnnwnn"), ('9', "nnwwnnwnn"), ('A', "wnnnnwnnw"), ('B', "nnwnnwnnw"),
    ('C', "wnwnnwnnn"), ('D', "nnnnwwnnw"), ('E', "wnnnwwnnn"), ('F', "nnwnwwnnn"),
    ('G', "nnnnnwwnw"), ('H', "wnnnnwwnn"), ('I', "nnwnnwwnn"), ('J', "nnnnwwwnn"),
    ('K', "wnnnnnnww"), ('L', "nnwnnnnww"), ('M', "wnwnnnnwn"), ('N', "nnnnwnnww"),
    ('O', "wnnnwnnwn"), ('P', "nnwnwnnwn"), ('Q', "nnnnnnwww"), ('R', "wnnnnnwwn"),
    ('S', "nnwnnnwwn"), ('T', "nnnnwnwwn"), ('U', "wwnnnnnnw"), ('V', "nwwnnnnnw"),
    ('W', "wwwnnnnnn"), ('X', "nwnnwnnnw"), ('Y', "wwnnwnnnn"), ('Z', "nwwnwnnnn"),
    ('-', "nwnnnnwnw"), ('.', "wwnnnnwnn"), (' ', "nwwnnnwnn"), ('$', "nwnwnwnnn"),
    ('/', "nwnwnnnwn"), ('+', "nwnnnwnwn"), ('%', "nnnwnwnwn"), ('*', "nwnnwnwnn"),
];

fn pattern(c: char) -> Option<&'static str> {
    PATTERNS.iter().find(|(ch, _)| *ch == c).map(|(_, p)| *p)
}

/// `*` é reservado para as guardas de início e fim.
pub fn validate(code: &str) -> Result<(), BarcodeError> {
    if code.is_empty() {
        return Err(BarcodeError::Empty);
    }
    match code.chars().find(|c| *c == '*' || pattern(*c).is_none()) {
        Some(c) => Err(BarcodeError::UnsupportedChar(c)),
        None => Ok(()),
    }
}

pub fn encode(code: &str) -> Result<Vec<bool>, BarcodeError> {
    validate(code)?;

    let mut modules = Vec::new();
    let framed = std::iter::once('*').chain(code.chars()).chain(std::iter::once('*'));
    for (i, c) in framed.enumerate() {
        if i > 0 {
            // espaço estreito entre caracteres
            modules.push(false);
        }
        let p = pattern(c).ok_or(BarcodeError::UnsupportedChar(c))?;
        widths_to_modules(p.bytes().map(|b| if b == b'w' { WIDE } else { NARROW }), &mut modules);
    }
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_has_three_wide_elements() {
        for (c, p) in PATTERNS {
            assert_eq!(p.len(), 9, "{:?}", c);
            assert_eq!(p.matches('w').count(), 3, "{:?}", c);
        }
    }

    #[test]
    fn patterns_are_distinct() {
        let mut all: Vec<_> = PATTERNS.iter().map(|(_, p)| *p).collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), PATTERNS.len());
    }

    #[test]
    fn rejects_lowercase_and_guards() {
        assert_eq!(validate("abc"), Err(BarcodeError::UnsupportedChar('a')));
        assert_eq!(validate("A*B"), Err(BarcodeError::UnsupportedChar('*')));
        assert!(validate("SIL-001 $/+%.").is_ok());
    }

    #[test]
    fn encoded_width_matches_character_count() {
        // Cada caractere: 6 estreitos + 3 largos = 15 módulos, mais 1 de separação
        let modules = encode("AB").unwrap();
        assert_eq!(modules.len(), 4 * 15 + 3);
        assert!(modules[0]);
        assert!(*modules.last().unwrap());
    }
}
