use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::checked_sum;

/// ebInterface `DocumentType` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EbDocumentType {
    Invoice,
    CreditMemo,
}

impl EbDocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::CreditMemo => "CreditMemo",
        }
    }
}

/// An ebInterface 6.1 invoice, ready for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct EbInvoice {
    pub generating_system: String,
    pub document_type: EbDocumentType,
    pub currency: String,
    /// Decimal places written for amounts.
    pub amount_scale: u32,
    pub number: String,
    pub issue_date: NaiveDate,
    pub biller: EbParty,
    pub recipient: EbParty,
    pub order_reference: Option<String>,
    pub items: Vec<EbLineItem>,
    pub reductions_surcharges: Vec<EbReductionSurcharge>,
    /// Summary `Tax` block, ascending percentage.
    pub tax_items: Vec<EbTaxItem>,
    pub total_gross_amount: Decimal,
    pub prepaid_amount: Option<Decimal>,
    pub payable_amount: Decimal,
    pub comments: Vec<String>,
}

/// `Biller` / `InvoiceRecipient`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EbParty {
    pub vat_id: Option<String>,
    pub name: Option<String>,
    pub street: Option<String>,
    pub town: Option<String>,
    pub zip: Option<String>,
    pub country_code: Option<String>,
    pub email: Option<String>,
}

/// `TaxItem`, used per line, per reduction/surcharge and in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EbTaxItem {
    pub taxable_amount: Decimal,
    pub percent: Decimal,
    /// UNCL 5305 code written as `TaxCategoryCode`.
    pub category_code: String,
    pub tax_amount: Decimal,
}

/// `ListLineItem`.
#[derive(Debug, Clone, Serialize)]
pub struct EbLineItem {
    pub position_number: u32,
    pub description: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    /// Written as the `BaseQuantity` attribute of `UnitPrice`; absent means one.
    pub unit_price_base_quantity: Option<Decimal>,
    pub tax_item: EbTaxItem,
    pub line_item_amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReductionOrSurcharge {
    Reduction,
    Surcharge,
}

impl ReductionOrSurcharge {
    pub fn element_name(&self) -> &'static str {
        match self {
            Self::Reduction => "Reduction",
            Self::Surcharge => "Surcharge",
        }
    }
}

/// `Reduction` / `Surcharge` in `ReductionAndSurchargeDetails`.
#[derive(Debug, Clone, Serialize)]
pub struct EbReductionSurcharge {
    pub kind: ReductionOrSurcharge,
    pub base_amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
    /// Always positive.
    pub amount: Decimal,
    pub tax_item: EbTaxItem,
    pub comment: Option<String>,
}

impl EbInvoice {
    /// Sum of the summary tax items' taxable amounts, `None` on overflow.
    pub fn summary_taxable_total(&self) -> Option<Decimal> {
        checked_sum(self.tax_items.iter().map(|t| t.taxable_amount))
    }

    /// Sum of the summary tax items' tax amounts, `None` on overflow.
    pub fn summary_tax_total(&self) -> Option<Decimal> {
        checked_sum(self.tax_items.iter().map(|t| t.tax_amount))
    }
}
