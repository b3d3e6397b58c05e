//! ebInterface 6.1 output.
//!
//! [`convert_document`] maps a [`SourceDocument`](crate::core::SourceDocument)
//! onto the [`EbInvoice`] model, using the tax breakdown from
//! [`resolve_taxes`](crate::core::resolve_taxes). [`to_ebinterface_xml`]
//! serializes the model. [`ubl_to_ebinterface`] runs the whole chain.
//!
//! # Example
//!
//! ```no_run
//! use ubl2ebi::core::ConversionSettings;
//! use ubl2ebi::ebinterface::ubl_to_ebinterface;
//!
//! let ubl = std::fs::read_to_string("invoice.xml").unwrap();
//! let converted = ubl_to_ebinterface(&ubl, &ConversionSettings::strict()).unwrap();
//! for issue in &converted.issues {
//!     eprintln!("{issue}");
//! }
//! std::fs::write("invoice.ebi.xml", converted.xml).unwrap();
//! ```

mod convert;
mod model;
mod write;
pub mod xml_utils;

pub use convert::*;
pub use model::*;
pub use write::to_ebinterface_xml;

/// ebInterface 6.1 namespace URI.
pub const EBINTERFACE_NS: &str = "http://www.ebinterface.at/schema/6p1/";
