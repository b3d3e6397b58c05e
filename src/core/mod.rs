//! Tax category resolution and tax breakdown aggregation.
//!
//! This module is independent of any XML syntax. It works on the boundary
//! records ([`TaxSubtotal`], [`TaxableEntry`]) and produces a [`TaxBreakdown`]
//! plus the [`IssueSink`] a caller needs to apply its lax or strict policy.

mod aggregate;
pub mod currencies;
mod engine;
mod error;
mod issues;
mod resolver;
mod scheme;
mod settings;
mod types;

pub use aggregate::*;
pub use engine::*;
pub use error::*;
pub use issues::*;
pub use resolver::*;
pub use scheme::*;
pub use settings::*;
pub use types::*;
