//! ISO 4217 minor units.
//!
//! The number of decimal places of a currency decides how finalized tax
//! buckets and document totals are rounded.

/// Minor-unit digits used when a currency is not in the table.
pub const DEFAULT_MINOR_UNITS: u32 = 2;

/// Decimal places of `code`, or `None` if the code is unknown.
pub fn minor_units(code: &str) -> Option<u32> {
    MINOR_UNITS
        .binary_search_by(|(c, _)| (*c).cmp(code))
        .ok()
        .map(|idx| MINOR_UNITS[idx].1)
}

/// Decimal places of `code`, falling back to [`DEFAULT_MINOR_UNITS`].
pub fn minor_units_or_default(code: &str) -> u32 {
    minor_units(code).unwrap_or(DEFAULT_MINOR_UNITS)
}

/// Sorted by code for binary search.
static MINOR_UNITS: &[(&str, u32)] = &[
    ("AED", 2),
    ("AUD", 2),
    ("BGN", 2),
    ("BHD", 3),
    ("BRL", 2),
    ("CAD", 2),
    ("CHF", 2),
    ("CLP", 0),
    ("CNY", 2),
    ("CZK", 2),
    ("DKK", 2),
    ("EUR", 2),
    ("GBP", 2),
    ("HKD", 2),
    ("HUF", 2),
    ("ISK", 0),
    ("JOD", 3),
    ("JPY", 0),
    ("KRW", 0),
    ("KWD", 3),
    ("NOK", 2),
    ("NZD", 2),
    ("OMR", 3),
    ("PLN", 2),
    ("RON", 2),
    ("RSD", 2),
    ("SEK", 2),
    ("TND", 3),
    ("TRY", 2),
    ("UAH", 2),
    ("USD", 2),
    ("VND", 0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_minor_units() {
        assert_eq!(minor_units("EUR"), Some(2));
        assert_eq!(minor_units("JPY"), Some(0));
        assert_eq!(minor_units("KWD"), Some(3));
    }

    #[test]
    fn unknown_falls_back() {
        assert_eq!(minor_units("XYZ"), None);
        assert_eq!(minor_units_or_default("XYZ"), DEFAULT_MINOR_UNITS);
        assert_eq!(minor_units_or_default(""), DEFAULT_MINOR_UNITS);
    }

    #[test]
    fn table_is_sorted() {
        for window in MINOR_UNITS.windows(2) {
            assert!(
                window[0].0 < window[1].0,
                "currency codes not sorted: {} >= {}",
                window[0].0,
                window[1].0
            );
        }
    }
}
