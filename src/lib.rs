//! # ubl2ebi
//!
//! Converts UBL 2.1 invoices and credit notes into Austrian ebInterface 6.1.
//!
//! The core of the crate is tax category resolution: every line of a UBL
//! document names a tax category, while the percentage behind it is declared
//! (or only implied by amounts) in the document's tax subtotals. The
//! [`core`] module builds that mapping, assigns each line a percentage and
//! regroups the amounts into per-percentage tax buckets. Problems are
//! collected as [`ConversionIssue`]s instead of aborting, so the caller can
//! decide between lax conversion and strict (ERB) rejection.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use ubl2ebi::core::*;
//! use rust_decimal_macros::dec;
//!
//! let standard = TaxCategoryKey::from_codes("VAT", "S").unwrap();
//! let input = TaxInput {
//!     currency_code: "EUR".into(),
//!     subtotals: vec![TaxSubtotal::new(standard.clone()).amounts(dec!(150), dec!(30))],
//!     entries: vec![
//!         TaxableEntry { context: "lines[0]".into(), key: standard.clone(), amount: dec!(100), declared_percentage: None },
//!         TaxableEntry { context: "lines[1]".into(), key: standard, amount: dec!(50), declared_percentage: None },
//!     ],
//! };
//!
//! let resolution = resolve_taxes(&input, &ConversionSettings::strict()).unwrap();
//! assert_eq!(resolution.breakdown.buckets()[0].percentage(), dec!(20));
//! assert_eq!(resolution.breakdown.tax_total(), dec!(30.00));
//! assert_eq!(resolution.issues.most_severe(), Some(Severity::Info));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Tax category resolution, aggregation, issues, settings |
//! | `ubl` | UBL 2.1 Invoice / CreditNote reader |
//! | `ebinterface` | ebInterface 6.1 conversion and writer |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "ubl")]
pub mod ubl;

#[cfg(feature = "ebinterface")]
pub mod ebinterface;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
