//! Text normalization for header and title matching.

use unicode_normalization::UnicodeNormalization;

/// Normalize text for comparison: lowercase, decompose, drop combining marks
/// (accents) and trim.
///
/// Applied to both sides of every locator comparison, so "Órdenes Sin Asignar "
/// matches "ordenes sin asignar".
pub fn normalize(s: &str) -> String {
    // Lowercasing first: some lowercase mappings introduce combining marks (İ -> i̇).
    s.to_lowercase()
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn test_strips_accents_and_case() {
        assert_eq!(normalize("  Órdenes SIN Asignar "), "ordenes sin asignar");
        assert_eq!(normalize("En distribución"), "en distribucion");
        assert_eq!(normalize("Ñandú"), "nandu");
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n"), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Plan $",
            "  SUM of IMPORTE",
            "Reporte TKC",
            "Ordenado Desp. y Distrib.",
            "İstanbul",
            "e\u{301}\u{301}",
            "",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }
}
