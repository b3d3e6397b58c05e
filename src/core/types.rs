use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::engine::TaxInput;
use super::scheme::TaxCategoryKey;

/// Source document type (UBL root element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentKind {
    /// `Invoice`
    Invoice,
    /// `CreditNote`
    CreditNote,
}

/// A source document reduced to the fields the conversion reads.
#[derive(Debug, Clone, Serialize)]
pub struct SourceDocument {
    pub kind: DocumentKind,
    /// BT-1: Document number.
    pub number: String,
    /// BT-2: Issue date.
    pub issue_date: NaiveDate,
    /// BT-3: Invoice / credit note type code (UNTDID 1001).
    pub type_code: Option<String>,
    /// BT-5: Document currency code.
    pub currency_code: String,
    /// BT-22: Notes.
    pub notes: Vec<String>,
    /// BT-13: Purchase order reference.
    pub order_reference: Option<String>,
    /// BT-10: Buyer reference.
    pub buyer_reference: Option<String>,
    /// BG-4: Seller.
    pub seller: Party,
    /// BG-7: Buyer.
    pub buyer: Party,
    /// BG-23: Document tax subtotals, in document order.
    pub tax_subtotals: Vec<TaxSubtotal>,
    /// BG-25: Lines, in document order.
    pub lines: Vec<SourceLine>,
    /// BG-20 / BG-21: Document-level allowances and charges, in document order.
    pub allowances_charges: Vec<SourceAllowanceCharge>,
    /// BG-22: Totals as declared by the sender.
    pub declared_totals: DeclaredTotals,
}

/// BG-4 / BG-7: Party.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Party {
    /// Legal registration name, falling back to the trading name.
    pub name: Option<String>,
    /// VAT identifier (`PartyTaxScheme/CompanyID`).
    pub vat_id: Option<String>,
    pub address: Address,
    pub email: Option<String>,
}

/// BG-5 / BG-8: Postal address.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Address {
    pub street: Option<String>,
    pub additional: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country_code: Option<String>,
}

/// One `TaxTotal/TaxSubtotal` declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxSubtotal {
    pub key: TaxCategoryKey,
    /// BT-119: Percentage, if stated.
    pub declared_percentage: Option<Decimal>,
    /// BT-116: Taxable amount.
    pub taxable_amount: Option<Decimal>,
    /// BT-117: Tax amount.
    pub tax_amount: Option<Decimal>,
}

impl TaxSubtotal {
    pub fn new(key: TaxCategoryKey) -> Self {
        Self {
            key,
            declared_percentage: None,
            taxable_amount: None,
            tax_amount: None,
        }
    }

    pub fn percentage(mut self, percentage: Decimal) -> Self {
        self.declared_percentage = Some(percentage);
        self
    }

    pub fn amounts(mut self, taxable_amount: Decimal, tax_amount: Decimal) -> Self {
        self.taxable_amount = Some(taxable_amount);
        self.tax_amount = Some(tax_amount);
        self
    }
}

/// BG-25: Document line.
#[derive(Debug, Clone, Serialize)]
pub struct SourceLine {
    /// BT-126: Line identifier.
    pub id: String,
    /// BT-153: Item name.
    pub item_name: Option<String>,
    /// BT-154: Item description.
    pub description: Option<String>,
    /// BT-129: Quantity.
    pub quantity: Option<Decimal>,
    /// BT-130: Unit code.
    pub unit: Option<String>,
    /// BT-146: Net price.
    pub unit_price: Option<Decimal>,
    /// BT-149: Quantity the net price applies to, when other than one.
    pub price_base_quantity: Option<Decimal>,
    /// BT-131: Line net amount.
    pub net_amount: Decimal,
    /// BT-151 with its tax scheme.
    pub tax: TaxCategoryKey,
    /// BT-152: Percentage, if stated on the line.
    pub declared_percentage: Option<Decimal>,
}

/// BG-20 / BG-21: Document-level allowance or charge.
#[derive(Debug, Clone, Serialize)]
pub struct SourceAllowanceCharge {
    pub is_charge: bool,
    /// Always positive; allowances reduce the taxable base.
    pub amount: Decimal,
    pub base_amount: Option<Decimal>,
    pub multiplier: Option<Decimal>,
    pub reason: Option<String>,
    pub tax: TaxCategoryKey,
    pub declared_percentage: Option<Decimal>,
}

impl SourceAllowanceCharge {
    /// Amount as it affects the taxable base.
    pub fn signed_amount(&self) -> Decimal {
        if self.is_charge {
            self.amount
        } else {
            -self.amount
        }
    }
}

/// BG-22: Totals as stated in the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeclaredTotals {
    pub line_extension_amount: Option<Decimal>,
    pub tax_exclusive_amount: Option<Decimal>,
    pub tax_inclusive_amount: Option<Decimal>,
    pub prepaid_amount: Option<Decimal>,
    pub payable_amount: Option<Decimal>,
}

/// A line or allowance/charge amount to distribute over tax buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxableEntry {
    /// Locator used in issues, e.g. "lines[2]".
    pub context: String,
    pub key: TaxCategoryKey,
    /// Signed taxable amount.
    pub amount: Decimal,
    pub declared_percentage: Option<Decimal>,
}

impl SourceDocument {
    /// Lines followed by document allowances/charges, in document order.
    pub fn taxable_entries(&self) -> Vec<TaxableEntry> {
        let lines = self.lines.iter().enumerate().map(|(i, line)| TaxableEntry {
            context: format!("lines[{i}]"),
            key: line.tax.clone(),
            amount: line.net_amount,
            declared_percentage: line.declared_percentage,
        });
        let allowances_charges =
            self.allowances_charges
                .iter()
                .enumerate()
                .map(|(i, ac)| TaxableEntry {
                    context: format!("allowances_charges[{i}]"),
                    key: ac.tax.clone(),
                    amount: ac.signed_amount(),
                    declared_percentage: ac.declared_percentage,
                });
        lines.chain(allowances_charges).collect()
    }

    /// Input for [`resolve_taxes`](super::resolve_taxes).
    pub fn tax_input(&self) -> TaxInput {
        TaxInput {
            currency_code: self.currency_code.clone(),
            subtotals: self.tax_subtotals.clone(),
            entries: self.taxable_entries(),
        }
    }
}
