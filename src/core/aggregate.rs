//! Grouping of taxable amounts into per-percentage tax buckets.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

use super::error::ConversionError;

/// Percentage a bucket is keyed by.
///
/// Ordering puts every resolved percentage (ascending) before the
/// unresolved bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum BucketRate {
    Resolved(Decimal),
    /// No percentage could be determined; amounts are kept, tax is zero.
    Unresolved,
}

impl BucketRate {
    /// The percentage, or the sentinel 0 for [`BucketRate::Unresolved`].
    pub fn percentage(&self) -> Decimal {
        match self {
            Self::Resolved(p) => *p,
            Self::Unresolved => Decimal::ZERO,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// A finalized entry of the target tax breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxBucket {
    pub rate: BucketRate,
    pub taxable_base: Decimal,
    pub tax_amount: Decimal,
}

impl TaxBucket {
    pub fn percentage(&self) -> Decimal {
        self.rate.percentage()
    }
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    taxable_base: Decimal,
    tax_amount: Decimal,
}

/// Collects taxable amounts per percentage.
///
/// Tax is accumulated without rounding; [`finalize`](Self::finalize) rounds
/// each bucket once.
#[derive(Debug, Clone)]
pub struct LineTaxAggregator {
    amount_scale: u32,
    buckets: BTreeMap<BucketRate, Accumulator>,
}

impl LineTaxAggregator {
    /// `amount_scale` is the minor-unit precision of the document currency.
    pub fn new(amount_scale: u32) -> Self {
        Self {
            amount_scale,
            buckets: BTreeMap::new(),
        }
    }

    /// Book `taxable_amount` under `rate`.
    ///
    /// Fails without touching the bucket when the running base or tax would
    /// leave the `Decimal` range.
    pub fn add_contribution(
        &mut self,
        rate: BucketRate,
        taxable_amount: Decimal,
    ) -> Result<(), ConversionError> {
        let out_of_range = || {
            ConversionError::invalid(format!(
                "amount {taxable_amount} at {}% is out of range",
                rate.percentage()
            ))
        };
        let bucket = self.buckets.entry(rate).or_default();
        let taxable_base = bucket
            .taxable_base
            .checked_add(taxable_amount)
            .ok_or_else(out_of_range)?;
        let tax_amount = match rate {
            BucketRate::Resolved(percentage) => taxable_amount
                .checked_mul(percentage)
                .and_then(|t| t.checked_div(dec!(100)))
                .and_then(|t| bucket.tax_amount.checked_add(t))
                .ok_or_else(out_of_range)?,
            BucketRate::Unresolved => bucket.tax_amount,
        };
        bucket.taxable_base = taxable_base;
        bucket.tax_amount = tax_amount;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Round every bucket half-up to the amount scale and return them by
    /// ascending percentage, the unresolved bucket last.
    pub fn finalize(self) -> Vec<TaxBucket> {
        let scale = self.amount_scale;
        self.buckets
            .into_iter()
            .map(|(rate, acc)| TaxBucket {
                rate,
                taxable_base: round_half_up(acc.taxable_base, scale),
                tax_amount: round_half_up(acc.tax_amount, scale),
            })
            .collect()
    }
}

/// Finalized buckets of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    buckets: Vec<TaxBucket>,
    net_total: Decimal,
    tax_total: Decimal,
}

impl TaxBreakdown {
    /// Finalize `aggregator` and compute the document totals.
    ///
    /// Each bucket fits in a `Decimal`, but their sum may not.
    pub fn from_aggregator(aggregator: LineTaxAggregator) -> Result<Self, ConversionError> {
        let buckets = aggregator.finalize();
        let net_total = checked_sum(buckets.iter().map(|b| b.taxable_base))
            .ok_or_else(|| ConversionError::invalid("net total is out of range"))?;
        let tax_total = checked_sum(
            buckets
                .iter()
                .filter(|b| b.rate.is_resolved())
                .map(|b| b.tax_amount),
        )
        .ok_or_else(|| ConversionError::invalid("tax total is out of range"))?;
        Ok(Self {
            buckets,
            net_total,
            tax_total,
        })
    }

    /// All buckets, unresolved last.
    pub fn buckets(&self) -> &[TaxBucket] {
        &self.buckets
    }

    pub fn resolved(&self) -> impl Iterator<Item = &TaxBucket> {
        self.buckets.iter().filter(|b| b.rate.is_resolved())
    }

    pub fn unresolved(&self) -> Option<&TaxBucket> {
        self.buckets.iter().find(|b| !b.rate.is_resolved())
    }

    /// Sum of all taxable bases, including the unresolved bucket.
    pub fn net_total(&self) -> Decimal {
        self.net_total
    }

    /// Sum of the resolved buckets' tax amounts.
    pub fn tax_total(&self) -> Decimal {
        self.tax_total
    }
}

/// Sum `values`, or `None` on overflow.
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Round a Decimal to `dp` decimal places using half-up (commercial rounding).
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
