//! UBL 2.1 Invoice / CreditNote reader.
//!
//! Reads the fields the conversion needs into a
//! [`SourceDocument`](crate::core::SourceDocument). Namespace prefixes are
//! ignored, so documents using a default namespace parse the same way as
//! documents using `ubl:` / `cac:` / `cbc:` prefixes.
//!
//! # Example
//!
//! ```no_run
//! let xml = std::fs::read_to_string("invoice.xml").unwrap();
//! let doc = ubl2ebi::ubl::from_ubl_xml(&xml).unwrap();
//! println!("{} tax subtotals", doc.tax_subtotals.len());
//! ```

mod parse;

pub use parse::from_ubl_xml;

