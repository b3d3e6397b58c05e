use chrono::NaiveDate;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::core::*;

/// Parse a UBL 2.1 Invoice or CreditNote.
///
/// Missing identifiers the schema requires (document ID, issue date,
/// currency, tax category and tax scheme IDs, line amounts) are fatal.
pub fn from_ubl_xml(xml: &str) -> Result<SourceDocument, ConversionError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = ParsedDocument::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e);
                if path.is_empty() {
                    doc.kind = match name.as_str() {
                        "Invoice" => Some(DocumentKind::Invoice),
                        "CreditNote" => Some(DocumentKind::CreditNote),
                        other => {
                            return Err(ConversionError::invalid(format!(
                                "unsupported root element '{other}', expected Invoice or CreditNote"
                            )));
                        }
                    };
                }
                doc.current_scheme_id = None;
                doc.current_unit_code = None;
                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map_err(|err| ConversionError::Xml(err.to_string()))?
                        .to_string();
                    match attr.key.local_name().as_ref() {
                        b"schemeID" => doc.current_scheme_id = Some(value),
                        b"unitCode" => doc.current_unit_code = Some(value),
                        _ => {}
                    }
                }
                doc.open_element(&path, &name);
                path.push(name);
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| ConversionError::Xml(err.to_string()))?
                    .to_string();
                if !text.is_empty() {
                    doc.handle_text(&path, &text);
                }
            }
            Ok(Event::End(_)) => {
                let ended = path.pop().unwrap_or_default();
                doc.close_element(&path, &ended);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConversionError::Xml(format!(
                    "parse error at byte {}: {e}",
                    reader.error_position()
                )));
            }
            _ => {}
        }
    }

    doc.into_document()
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

#[derive(Default)]
struct ParsedDocument {
    kind: Option<DocumentKind>,
    number: Option<String>,
    issue_date: Option<String>,
    type_code: Option<String>,
    currency_code: Option<String>,
    notes: Vec<String>,
    order_reference: Option<String>,
    buyer_reference: Option<String>,

    seller: RawParty,
    buyer: RawParty,

    subtotals: Vec<RawSubtotal>,
    current_subtotal: Option<RawSubtotal>,
    lines: Vec<RawLine>,
    current_line: Option<RawLine>,
    allowances_charges: Vec<RawAllowanceCharge>,
    current_ac: Option<RawAllowanceCharge>,

    line_extension_amount: Option<String>,
    tax_exclusive_amount: Option<String>,
    tax_inclusive_amount: Option<String>,
    prepaid_amount: Option<String>,
    payable_amount: Option<String>,

    // Attribute values of the element currently open
    current_scheme_id: Option<String>,
    current_unit_code: Option<String>,
}

#[derive(Default)]
struct RawParty {
    registration_name: Option<String>,
    trading_name: Option<String>,
    vat_id: Option<String>,
    pending_company_id: Option<String>,
    pending_tax_scheme: Option<String>,
    street: Option<String>,
    additional: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    country_code: Option<String>,
    email: Option<String>,
}

#[derive(Default)]
struct RawTaxCategory {
    id: Option<String>,
    id_scheme: Option<String>,
    percent: Option<String>,
    tax_scheme: Option<String>,
    tax_scheme_scheme: Option<String>,
}

#[derive(Default)]
struct RawSubtotal {
    taxable_amount: Option<String>,
    tax_amount: Option<String>,
    category: RawTaxCategory,
}

#[derive(Default)]
struct RawLine {
    id: Option<String>,
    quantity: Option<String>,
    unit: Option<String>,
    line_amount: Option<String>,
    item_name: Option<String>,
    description: Option<String>,
    price: Option<String>,
    price_base_quantity: Option<String>,
    category: RawTaxCategory,
}

#[derive(Default)]
struct RawAllowanceCharge {
    charge_indicator: Option<String>,
    reason: Option<String>,
    multiplier: Option<String>,
    amount: Option<String>,
    base_amount: Option<String>,
    category: RawTaxCategory,
}

fn contains(path: &[String], name: &str) -> bool {
    path.iter().any(|p| p == name)
}

fn in_line(path: &[String]) -> bool {
    contains(path, "InvoiceLine") || contains(path, "CreditNoteLine")
}

impl RawTaxCategory {
    fn handle_text(&mut self, leaf: &str, parent: &str, scheme_id: Option<String>, text: &str) {
        match (leaf, parent) {
            ("ID", "TaxCategory" | "ClassifiedTaxCategory") => {
                self.id = Some(text.to_string());
                self.id_scheme = scheme_id;
            }
            ("Percent", "TaxCategory" | "ClassifiedTaxCategory") => {
                self.percent = Some(text.to_string());
            }
            ("ID", "TaxScheme") => {
                self.tax_scheme = Some(text.to_string());
                self.tax_scheme_scheme = scheme_id;
            }
            _ => {}
        }
    }

    fn into_key(&self, context: &str) -> Result<TaxCategoryKey, ConversionError> {
        let id = self.id.as_deref().ok_or_else(|| {
            ConversionError::invalid(format!("{context}: missing tax category ID"))
        })?;
        let scheme = self.tax_scheme.as_deref().ok_or_else(|| {
            ConversionError::invalid(format!("{context}: missing tax scheme ID"))
        })?;
        let with_context = |e: ConversionError| e.in_context(context);
        Ok(TaxCategoryKey::new(
            SchemedId::new(self.tax_scheme_scheme.as_deref(), scheme).map_err(with_context)?,
            SchemedId::new(self.id_scheme.as_deref(), id).map_err(with_context)?,
        ))
    }
}

impl RawParty {
    fn handle_text(&mut self, leaf: &str, parent: &str, text: &str) {
        match (leaf, parent) {
            ("RegistrationName", "PartyLegalEntity") => {
                self.registration_name = Some(text.to_string())
            }
            ("Name", "PartyName") => self.trading_name = Some(text.to_string()),
            ("CompanyID", "PartyTaxScheme") => self.pending_company_id = Some(text.to_string()),
            ("ID", "TaxScheme") => self.pending_tax_scheme = Some(text.to_string()),
            ("StreetName", "PostalAddress") => self.street = Some(text.to_string()),
            ("AdditionalStreetName", "PostalAddress") => self.additional = Some(text.to_string()),
            ("CityName", "PostalAddress") => self.city = Some(text.to_string()),
            ("PostalZone", "PostalAddress") => self.postal_code = Some(text.to_string()),
            ("IdentificationCode", "Country") => self.country_code = Some(text.to_string()),
            ("ElectronicMail", "Contact") => self.email = Some(text.to_string()),
            _ => {}
        }
    }

    /// A `PartyTaxScheme` closed: keep its company ID if it is the VAT one.
    fn close_tax_scheme(&mut self) {
        let company_id = self.pending_company_id.take();
        let scheme = self.pending_tax_scheme.take();
        if self.vat_id.is_none() && scheme.as_deref().is_none_or(|s| s == "VAT") {
            self.vat_id = company_id;
        }
    }

    fn into_party(self) -> Party {
        Party {
            name: self.registration_name.or(self.trading_name),
            vat_id: self.vat_id,
            address: Address {
                street: self.street,
                additional: self.additional,
                city: self.city,
                postal_code: self.postal_code,
                country_code: self.country_code,
            },
            email: self.email,
        }
    }
}

impl ParsedDocument {
    fn open_element(&mut self, path: &[String], name: &str) {
        let line_ctx = in_line(path);
        match name {
            "InvoiceLine" | "CreditNoteLine" => self.current_line = Some(RawLine::default()),
            "TaxSubtotal" if !line_ctx => self.current_subtotal = Some(RawSubtotal::default()),
            "AllowanceCharge" if !line_ctx => self.current_ac = Some(RawAllowanceCharge::default()),
            _ => {}
        }
    }

    fn close_element(&mut self, path: &[String], ended: &str) {
        let line_ctx = in_line(path);
        match ended {
            "InvoiceLine" | "CreditNoteLine" => {
                if let Some(line) = self.current_line.take() {
                    self.lines.push(line);
                }
            }
            "TaxSubtotal" if !line_ctx => {
                if let Some(subtotal) = self.current_subtotal.take() {
                    self.subtotals.push(subtotal);
                }
            }
            "AllowanceCharge" if !line_ctx => {
                if let Some(ac) = self.current_ac.take() {
                    self.allowances_charges.push(ac);
                }
            }
            "PartyTaxScheme" => {
                if contains(path, "AccountingSupplierParty") {
                    self.seller.close_tax_scheme();
                } else if contains(path, "AccountingCustomerParty") {
                    self.buyer.close_tax_scheme();
                }
            }
            _ => {}
        }
    }

    fn handle_text(&mut self, path: &[String], text: &str) {
        let leaf = path.last().map(String::as_str).unwrap_or("");
        let parent = if path.len() >= 2 {
            path[path.len() - 2].as_str()
        } else {
            ""
        };
        let at_root = path.len() == 2;

        if in_line(path) {
            self.handle_line_text(path, leaf, parent, text);
            return;
        }

        if contains(path, "AccountingSupplierParty") {
            self.seller.handle_text(leaf, parent, text);
            return;
        }
        if contains(path, "AccountingCustomerParty") {
            self.buyer.handle_text(leaf, parent, text);
            return;
        }

        if contains(path, "TaxSubtotal") {
            if let Some(subtotal) = self.current_subtotal.as_mut() {
                match (leaf, parent) {
                    ("TaxableAmount", "TaxSubtotal") => {
                        subtotal.taxable_amount = Some(text.to_string())
                    }
                    ("TaxAmount", "TaxSubtotal") => subtotal.tax_amount = Some(text.to_string()),
                    _ => subtotal.category.handle_text(
                        leaf,
                        parent,
                        self.current_scheme_id.take(),
                        text,
                    ),
                }
            }
            return;
        }

        if contains(path, "AllowanceCharge") {
            if let Some(ac) = self.current_ac.as_mut() {
                match (leaf, parent) {
                    ("ChargeIndicator", "AllowanceCharge") => {
                        ac.charge_indicator = Some(text.to_string())
                    }
                    ("AllowanceChargeReason", "AllowanceCharge") => {
                        ac.reason = Some(text.to_string())
                    }
                    ("MultiplierFactorNumeric", "AllowanceCharge") => {
                        ac.multiplier = Some(text.to_string())
                    }
                    ("Amount", "AllowanceCharge") => ac.amount = Some(text.to_string()),
                    ("BaseAmount", "AllowanceCharge") => ac.base_amount = Some(text.to_string()),
                    _ => ac.category.handle_text(
                        leaf,
                        parent,
                        self.current_scheme_id.take(),
                        text,
                    ),
                }
            }
            return;
        }

        if parent == "LegalMonetaryTotal" {
            match leaf {
                "LineExtensionAmount" => self.line_extension_amount = Some(text.to_string()),
                "TaxExclusiveAmount" => self.tax_exclusive_amount = Some(text.to_string()),
                "TaxInclusiveAmount" => self.tax_inclusive_amount = Some(text.to_string()),
                "PrepaidAmount" => self.prepaid_amount = Some(text.to_string()),
                "PayableAmount" => self.payable_amount = Some(text.to_string()),
                _ => {}
            }
            return;
        }

        match leaf {
            "ID" if at_root => self.number = Some(text.to_string()),
            "IssueDate" if at_root => self.issue_date = Some(text.to_string()),
            "InvoiceTypeCode" | "CreditNoteTypeCode" if at_root => {
                self.type_code = Some(text.to_string())
            }
            "DocumentCurrencyCode" if at_root => self.currency_code = Some(text.to_string()),
            "Note" if at_root => self.notes.push(text.to_string()),
            "BuyerReference" if at_root => self.buyer_reference = Some(text.to_string()),
            "ID" if parent == "OrderReference" => self.order_reference = Some(text.to_string()),
            _ => {}
        }
    }

    fn handle_line_text(&mut self, path: &[String], leaf: &str, parent: &str, text: &str) {
        // Line-level and price-level allowances are already part of the
        // line extension amount.
        if contains(path, "AllowanceCharge") {
            return;
        }
        let Some(line) = self.current_line.as_mut() else {
            return;
        };
        match (leaf, parent) {
            ("ID", "InvoiceLine" | "CreditNoteLine") => line.id = Some(text.to_string()),
            ("InvoicedQuantity" | "CreditedQuantity", _) => {
                line.quantity = Some(text.to_string());
                line.unit = self.current_unit_code.take();
            }
            ("LineExtensionAmount", "InvoiceLine" | "CreditNoteLine") => {
                line.line_amount = Some(text.to_string())
            }
            ("Name", "Item") => line.item_name = Some(text.to_string()),
            ("Description", "Item") => line.description = Some(text.to_string()),
            ("PriceAmount", "Price") => line.price = Some(text.to_string()),
            ("BaseQuantity", "Price") => line.price_base_quantity = Some(text.to_string()),
            _ if contains(path, "ClassifiedTaxCategory") => {
                line.category
                    .handle_text(leaf, parent, self.current_scheme_id.take(), text)
            }
            _ => {}
        }
    }

    fn into_document(self) -> Result<SourceDocument, ConversionError> {
        let kind = self
            .kind
            .ok_or_else(|| ConversionError::invalid("document has no root element"))?;
        let number = self
            .number
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ConversionError::invalid("missing document ID (BT-1)"))?;
        let issue_date = self
            .issue_date
            .ok_or_else(|| ConversionError::invalid("missing issue date (BT-2)"))?;
        let issue_date = NaiveDate::parse_from_str(issue_date.trim(), "%Y-%m-%d").map_err(|e| {
            ConversionError::invalid(format!("invalid issue date '{issue_date}': {e}"))
        })?;
        let currency_code = self
            .currency_code
            .ok_or_else(|| ConversionError::invalid("missing document currency code (BT-5)"))?;

        let mut tax_subtotals = Vec::with_capacity(self.subtotals.len());
        for (i, raw) in self.subtotals.iter().enumerate() {
            let context = format!("tax_subtotals[{i}]");
            tax_subtotals.push(TaxSubtotal {
                key: raw.category.into_key(&context)?,
                declared_percentage: parse_opt_decimal(&raw.category.percent, &context)?,
                taxable_amount: parse_opt_decimal(&raw.taxable_amount, &context)?,
                tax_amount: parse_opt_decimal(&raw.tax_amount, &context)?,
            });
        }

        let mut lines = Vec::with_capacity(self.lines.len());
        for (i, raw) in self.lines.into_iter().enumerate() {
            let context = format!("lines[{i}]");
            let net_amount = parse_opt_decimal(&raw.line_amount, &context)?.ok_or_else(|| {
                ConversionError::invalid(format!("{context}: missing line net amount (BT-131)"))
            })?;
            lines.push(SourceLine {
                tax: raw.category.into_key(&context)?,
                declared_percentage: parse_opt_decimal(&raw.category.percent, &context)?,
                quantity: parse_opt_decimal(&raw.quantity, &context)?,
                unit_price: parse_opt_decimal(&raw.price, &context)?,
                price_base_quantity: parse_opt_decimal(&raw.price_base_quantity, &context)?
                    .filter(|q| *q != Decimal::ONE),
                id: raw.id.unwrap_or_else(|| (i + 1).to_string()),
                item_name: raw.item_name,
                description: raw.description,
                unit: raw.unit,
                net_amount,
            });
        }

        let mut allowances_charges = Vec::with_capacity(self.allowances_charges.len());
        for (i, raw) in self.allowances_charges.into_iter().enumerate() {
            let context = format!("allowances_charges[{i}]");
            let amount = parse_opt_decimal(&raw.amount, &context)?.ok_or_else(|| {
                ConversionError::invalid(format!("{context}: missing allowance/charge amount"))
            })?;
            let is_charge = match raw.charge_indicator.as_deref().map(str::trim) {
                Some("true") => true,
                Some("false") => false,
                other => {
                    return Err(ConversionError::invalid(format!(
                        "{context}: invalid charge indicator {other:?}"
                    )));
                }
            };
            allowances_charges.push(SourceAllowanceCharge {
                is_charge,
                amount,
                base_amount: parse_opt_decimal(&raw.base_amount, &context)?,
                multiplier: parse_opt_decimal(&raw.multiplier, &context)?,
                reason: raw.reason,
                tax: raw.category.into_key(&context)?,
                declared_percentage: parse_opt_decimal(&raw.category.percent, &context)?,
            });
        }

        let declared_totals = DeclaredTotals {
            line_extension_amount: parse_opt_decimal(&self.line_extension_amount, "totals")?,
            tax_exclusive_amount: parse_opt_decimal(&self.tax_exclusive_amount, "totals")?,
            tax_inclusive_amount: parse_opt_decimal(&self.tax_inclusive_amount, "totals")?,
            prepaid_amount: parse_opt_decimal(&self.prepaid_amount, "totals")?,
            payable_amount: parse_opt_decimal(&self.payable_amount, "totals")?,
        };

        Ok(SourceDocument {
            kind,
            number,
            issue_date,
            type_code: self.type_code,
            currency_code,
            notes: self.notes,
            order_reference: self.order_reference,
            buyer_reference: self.buyer_reference,
            seller: self.seller.into_party(),
            buyer: self.buyer.into_party(),
            tax_subtotals,
            lines,
            allowances_charges,
            declared_totals,
        })
    }
}

fn parse_opt_decimal(
    value: &Option<String>,
    context: &str,
) -> Result<Option<Decimal>, ConversionError> {
    value
        .as_deref()
        .map(|s| {
            Decimal::from_str(s.trim()).map_err(|e| {
                ConversionError::invalid(format!("{context}: invalid decimal '{s}': {e}"))
            })
        })
        .transpose()
}
