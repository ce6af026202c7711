// src/common/numbering.rs

/// Próximo número de documento no formato `{PREFIXO}-{ANO}-{NNNN}`.
/// A sequência continua a partir do último número emitido, mesmo na virada do ano.
pub fn next_document_number(prefix: &str, year: i32, last: Option<&str>) -> String {
    let next = last
        .and_then(|n| n.rsplit('-').next())
        .and_then(|seq| seq.parse::<u32>().ok())
        .map(|seq| seq + 1)
        .unwrap_or(1);

    format!("{}-{}-{:04}", prefix, year, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        assert_eq!(next_document_number("VEN", 2025, None), "VEN-2025-0001");
    }

    #[test]
    fn continues_from_last_number() {
        assert_eq!(next_document_number("OC", 2025, Some("OC-2025-0041")), "OC-2025-0042");
        assert_eq!(next_document_number("OP", 2026, Some("OP-2025-0009")), "OP-2026-0010");
    }

    #[test]
    fn grows_past_four_digits() {
        assert_eq!(next_document_number("VEN", 2025, Some("VEN-2025-9999")), "VEN-2025-10000");
    }

    #[test]
    fn unparsable_last_number_restarts() {
        assert_eq!(next_document_number("VEN", 2025, Some("manual")), "VEN-2025-0001");
    }
}
