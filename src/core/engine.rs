//! Two-phase tax pipeline: build the category mapping from all subtotals,
//! then resolve and aggregate every line and allowance/charge.

use rust_decimal::Decimal;
use serde::Serialize;

use super::aggregate::{BucketRate, LineTaxAggregator, TaxBreakdown};
use super::error::ConversionError;
use super::issues::{ConversionIssue, IssueKind, IssueSink};
use super::resolver::TaxCategoryResolver;
use super::settings::ConversionSettings;
use super::types::{TaxSubtotal, TaxableEntry};

/// Everything the tax engine reads from a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxInput {
    pub currency_code: String,
    pub subtotals: Vec<TaxSubtotal>,
    pub entries: Vec<TaxableEntry>,
}

/// A taxable entry with the rate it was booked under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEntry {
    pub entry: TaxableEntry,
    pub rate: BucketRate,
}

/// Result of [`resolve_taxes`].
#[derive(Debug, Clone)]
pub struct TaxResolution {
    pub mapping: TaxCategoryResolver,
    /// Resolved entries, in input order.
    pub entries: Vec<ResolvedEntry>,
    pub breakdown: TaxBreakdown,
    pub issues: IssueSink,
}

/// Phase one: register every subtotal in document order.
pub fn build_mapping(
    subtotals: &[TaxSubtotal],
    percentage_scale: u32,
    issues: &mut IssueSink,
) -> Result<TaxCategoryResolver, ConversionError> {
    let mut resolver = TaxCategoryResolver::new(percentage_scale);
    for (i, subtotal) in subtotals.iter().enumerate() {
        resolver.register_subtotal(subtotal, &format!("tax_subtotals[{i}]"), issues)?;
    }
    Ok(resolver)
}

/// Phase two: assign a rate to every entry.
pub fn resolve_entries(
    mapping: &TaxCategoryResolver,
    entries: &[TaxableEntry],
    issues: &mut IssueSink,
) -> Result<Vec<ResolvedEntry>, ConversionError> {
    entries
        .iter()
        .map(|entry| {
            let rate = mapping.resolve_entry(entry, issues)?;
            Ok(ResolvedEntry {
                entry: entry.clone(),
                rate,
            })
        })
        .collect()
}

/// Aggregate resolved entries and flag a non-empty unresolved bucket.
///
/// Amounts whose sums or tax leave the `Decimal` range are rejected as
/// invalid input, naming the first offending entry.
pub fn aggregate(
    entries: &[ResolvedEntry],
    amount_scale: u32,
    issues: &mut IssueSink,
) -> Result<TaxBreakdown, ConversionError> {
    let mut aggregator = LineTaxAggregator::new(amount_scale);
    for resolved in entries {
        aggregator
            .add_contribution(resolved.rate, resolved.entry.amount)
            .map_err(|e| e.in_context(&resolved.entry.context))?;
    }
    let breakdown = TaxBreakdown::from_aggregator(aggregator)?;

    if let Some(bucket) = breakdown.unresolved() {
        let count = entries.iter().filter(|e| !e.rate.is_resolved()).count();
        issues.append(ConversionIssue::new(
            IssueKind::UnresolvedBucket,
            "document",
            format!(
                "{count} amount(s) totalling {} could not be assigned a tax percentage",
                bucket.taxable_base
            ),
        ));
    }
    Ok(breakdown)
}

/// Run the complete pipeline for one document.
pub fn resolve_taxes(
    input: &TaxInput,
    settings: &ConversionSettings,
) -> Result<TaxResolution, ConversionError> {
    let mut issues = IssueSink::new();
    let mapping = build_mapping(&input.subtotals, settings.percentage_scale, &mut issues)?;
    let entries = resolve_entries(&mapping, &input.entries, &mut issues)?;
    let breakdown = aggregate(
        &entries,
        settings.amount_scale_for(&input.currency_code),
        &mut issues,
    )?;

    log::debug!(
        "resolved {} categories, {} entries into {} buckets (net {}, tax {})",
        mapping.len(),
        entries.len(),
        breakdown.buckets().len(),
        breakdown.net_total(),
        breakdown.tax_total()
    );

    Ok(TaxResolution {
        mapping,
        entries,
        breakdown,
        issues,
    })
}

impl TaxResolution {
    /// Net amount booked under the unresolved sentinel.
    pub fn unresolved_amount(&self) -> Decimal {
        self.breakdown
            .unresolved()
            .map(|b| b.taxable_base)
            .unwrap_or(Decimal::ZERO)
    }
}
