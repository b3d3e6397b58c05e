//! Tax category → percentage resolution.
//!
//! Subtotal declarations are registered first (in document order), then
//! lines are resolved against the finished mapping. A line may reference a
//! category whose subtotal appears later in the document, so the two phases
//! must not be interleaved.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::aggregate::{BucketRate, round_half_up};
use super::error::ConversionError;
use super::issues::{ConversionIssue, IssueKind, IssueSink};
use super::scheme::TaxCategoryKey;
use super::types::{TaxSubtotal, TaxableEntry};

/// Where a resolved percentage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PercentageSource {
    /// Stated in the subtotal's tax category.
    Explicit,
    /// Computed as tax amount / taxable amount * 100.
    Derived,
}

/// The percentage in force for one tax category of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPercentage {
    pub key: TaxCategoryKey,
    pub percentage: Decimal,
    pub source: PercentageSource,
}

/// Mapping from [`TaxCategoryKey`] to the percentage applicable in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxCategoryResolver {
    percentage_scale: u32,
    entries: BTreeMap<TaxCategoryKey, ResolvedPercentage>,
}

impl Default for TaxCategoryResolver {
    fn default() -> Self {
        Self::new(2)
    }
}

impl TaxCategoryResolver {
    /// Create an empty resolver; derived percentages are rounded to
    /// `percentage_scale` decimal places.
    pub fn new(percentage_scale: u32) -> Self {
        Self {
            percentage_scale,
            entries: BTreeMap::new(),
        }
    }

    /// Register one subtotal declaration.
    ///
    /// A stated percentage is recorded as is. Without one, the percentage is
    /// derived from the subtotal amounts. When the category is already known
    /// with a different percentage, the first value is kept and a warning is
    /// recorded. Unusable declarations are recorded as error-level issues and
    /// leave the category unresolved. A negative stated percentage, or amounts
    /// whose ratio leaves the `Decimal` range, is fatal.
    pub fn register_subtotal(
        &mut self,
        subtotal: &TaxSubtotal,
        context: &str,
        issues: &mut IssueSink,
    ) -> Result<(), ConversionError> {
        let key = &subtotal.key;

        let (percentage, source) = match subtotal.declared_percentage {
            Some(percentage) => {
                if percentage < Decimal::ZERO {
                    return Err(ConversionError::invalid(format!(
                        "{context}: negative tax percentage {percentage} for category {key}"
                    )));
                }
                (percentage, PercentageSource::Explicit)
            }
            None => match (subtotal.taxable_amount, subtotal.tax_amount) {
                (Some(base), Some(tax)) => {
                    if base.is_zero() {
                        issues.append(ConversionIssue::new(
                            IssueKind::ZeroBaseDerivation,
                            context,
                            format!(
                                "cannot derive tax percentage for category {key}: taxable amount is zero"
                            ),
                        ));
                        return Ok(());
                    }
                    let Some(derived) = derive_percentage(base, tax, self.percentage_scale) else {
                        return Err(ConversionError::invalid(format!(
                            "{context}: tax amount {tax} / taxable amount {base} is out of range"
                        )));
                    };
                    if derived < Decimal::ZERO {
                        issues.append(ConversionIssue::new(
                            IssueKind::NegativeDerivedPercentage,
                            context,
                            format!(
                                "derived tax percentage {derived} for category {key} is negative"
                            ),
                        ));
                        return Ok(());
                    }
                    issues.append(ConversionIssue::new(
                        IssueKind::DerivedPercentage,
                        context,
                        format!("derived tax percentage {derived} for category {key}"),
                    ));
                    (derived, PercentageSource::Derived)
                }
                _ => {
                    issues.append(ConversionIssue::new(
                        IssueKind::MissingPercentageAndAmounts,
                        context,
                        format!(
                            "category {key} has neither a tax percentage nor taxable and tax amounts"
                        ),
                    ));
                    return Ok(());
                }
            },
        };

        match self.entries.entry(key.clone()) {
            Entry::Vacant(slot) => {
                log::debug!("{context}: category {key} -> {percentage}% ({source:?})");
                slot.insert(ResolvedPercentage {
                    key: key.clone(),
                    percentage,
                    source,
                });
            }
            Entry::Occupied(existing) => {
                let first = existing.get().percentage;
                if first != percentage {
                    issues.append(ConversionIssue::new(
                        IssueKind::ConflictingDeclaration,
                        context,
                        format!(
                            "conflicting tax percentage for category {key}: keeping {first}, ignoring {percentage}"
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Look up the percentage for a line that does not state one.
    ///
    /// An unknown category yields [`BucketRate::Unresolved`] and an
    /// error-level issue; processing continues.
    pub fn resolve_percentage_for_line(
        &self,
        key: &TaxCategoryKey,
        context: &str,
        issues: &mut IssueSink,
    ) -> BucketRate {
        match self.entries.get(key) {
            Some(entry) => BucketRate::Resolved(entry.percentage),
            None => {
                issues.append(ConversionIssue::new(
                    IssueKind::UnresolvedCategory,
                    context,
                    format!("no tax percentage could be determined for category {key}"),
                ));
                BucketRate::Unresolved
            }
        }
    }

    /// Rate for a line or allowance/charge: its own percentage if stated,
    /// the mapping otherwise.
    pub fn resolve_entry(
        &self,
        entry: &TaxableEntry,
        issues: &mut IssueSink,
    ) -> Result<BucketRate, ConversionError> {
        match entry.declared_percentage {
            Some(percentage) if percentage < Decimal::ZERO => {
                Err(ConversionError::invalid(format!(
                    "{}: negative tax percentage {percentage} for category {}",
                    entry.context, entry.key
                )))
            }
            Some(percentage) => Ok(BucketRate::Resolved(percentage)),
            None => Ok(self.resolve_percentage_for_line(&entry.key, &entry.context, issues)),
        }
    }

    pub fn get(&self, key: &TaxCategoryKey) -> Option<&ResolvedPercentage> {
        self.entries.get(key)
    }

    /// Resolved entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = &ResolvedPercentage> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `tax / base * 100`, rounded half-up. `None` on arithmetic overflow.
fn derive_percentage(base: Decimal, tax: Decimal, scale: u32) -> Option<Decimal> {
    let ratio = tax.checked_mul(dec!(100))?.checked_div(base)?;
    Some(round_half_up(ratio, scale))
}
