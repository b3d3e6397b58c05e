//! Conversion settings.
//!
//! Settings are plain data and can be loaded from JSON. Every field has a
//! default, so `{}` is a valid settings document.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::currencies;
use super::error::ConversionError;
use super::issues::{IssueSink, Severity};

/// How strictly collected issues block acceptance of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMode {
    /// Accept the document with issues attached for audit.
    #[default]
    Lax,
    /// Reject the document if any error-level issue was recorded
    /// (the policy of the Austrian federal e-invoice portal, ERB).
    Strict,
}

impl ConversionMode {
    /// Whether a document with these issues is accepted in this mode.
    pub fn accepts(&self, issues: &IssueSink) -> bool {
        match self {
            Self::Lax => true,
            Self::Strict => issues.most_severe() < Some(Severity::Error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    pub mode: ConversionMode,
    /// Decimal places of percentages derived from subtotal amounts.
    pub percentage_scale: u32,
    /// Fixed decimal places for amounts; `None` uses the currency's minor unit.
    pub amount_scale: Option<u32>,
    /// Largest accepted difference between declared and recomputed totals.
    pub total_tolerance: Decimal,
    /// Value of the target `GeneratingSystem` attribute.
    pub generating_system: String,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            mode: ConversionMode::Lax,
            percentage_scale: 2,
            amount_scale: None,
            total_tolerance: dec!(0.01),
            generating_system: concat!("ubl2ebi ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ConversionSettings {
    pub fn lax() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            mode: ConversionMode::Strict,
            ..Self::default()
        }
    }

    /// Load settings from a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConversionError> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| ConversionError::Settings(e.to_string()))?;
        if settings.percentage_scale > 10 {
            return Err(ConversionError::Settings(format!(
                "percentage_scale {} exceeds 10",
                settings.percentage_scale
            )));
        }
        if settings.total_tolerance.is_sign_negative() {
            return Err(ConversionError::Settings(
                "total_tolerance must not be negative".into(),
            ));
        }
        Ok(settings)
    }

    /// Rounding scale for amounts in `currency_code`.
    pub fn amount_scale_for(&self, currency_code: &str) -> u32 {
        self.amount_scale
            .unwrap_or_else(|| currencies::minor_units_or_default(currency_code))
    }
}
