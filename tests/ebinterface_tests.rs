#![cfg(feature = "ebinterface")]

use rust_decimal_macros::dec;
use std::path::Path;
use ubl2ebi::core::*;
use ubl2ebi::ebinterface::{self, EbDocumentType};
use ubl2ebi::ubl;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/ubl")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn convert(name: &str, settings: &ConversionSettings) -> ebinterface::Conversion {
    let doc = ubl::from_ubl_xml(&fixture(name)).unwrap();
    ebinterface::convert_document(&doc, settings).unwrap()
}

// --- Model ---

#[test]
fn standard_invoice_summary() {
    let conversion = convert("standard_invoice.xml", &ConversionSettings::strict());
    let inv = &conversion.invoice;

    assert_eq!(inv.document_type, EbDocumentType::Invoice);
    assert_eq!(inv.tax_items.len(), 2);
    assert_eq!(inv.tax_items[0].percent, dec!(10));
    assert_eq!(inv.tax_items[0].category_code, "AA");
    assert_eq!(inv.tax_items[1].percent, dec!(20));
    assert_eq!(inv.tax_items[1].category_code, "S");
    assert_eq!(inv.summary_taxable_total(), Some(dec!(400.00)));
    assert_eq!(inv.summary_tax_total(), Some(dec!(75.10)));
    assert_eq!(inv.total_gross_amount, dec!(475.10));
    assert_eq!(inv.prepaid_amount, Some(dec!(100.00)));
    assert_eq!(inv.payable_amount, dec!(375.10));
    assert!(!conversion.issues().has_errors());
}

#[test]
fn standard_invoice_lines() {
    let conversion = convert("standard_invoice.xml", &ConversionSettings::lax());
    let inv = &conversion.invoice;

    assert_eq!(inv.items.len(), 2);
    assert_eq!(inv.items[0].position_number, 1);
    assert_eq!(inv.items[0].description, "Schulung");
    assert_eq!(inv.items[0].unit, "HUR");
    assert_eq!(inv.items[0].tax_item.tax_amount, dec!(72.00));
    assert_eq!(inv.items[1].tax_item.percent, dec!(10));
    assert_eq!(inv.items[1].tax_item.tax_amount, dec!(4.90));

    let allowance = &inv.reductions_surcharges[0];
    assert_eq!(allowance.kind, ebinterface::ReductionOrSurcharge::Reduction);
    assert_eq!(allowance.amount, dec!(9.00));
    assert_eq!(allowance.tax_item.tax_amount, dec!(1.80));
    assert_eq!(allowance.comment.as_deref(), Some("Treuerabatt"));

    assert_eq!(inv.biller.street.as_deref(), Some("Mariahilfer Straße 10, Top 4"));
    assert!(inv.comments.iter().any(|c| c.contains("ABT-4711")));
}

#[test]
fn credit_note_becomes_credit_memo() {
    let conversion = convert("credit_note.xml", &ConversionSettings::strict());
    assert_eq!(conversion.invoice.document_type, EbDocumentType::CreditMemo);
    assert_eq!(conversion.invoice.total_gross_amount, dec!(120.00));
    assert!(conversion.issues().is_empty());
}

#[test]
fn conflicting_declaration_is_accepted_with_warning() {
    let conversion = convert("conflicting_declaration.xml", &ConversionSettings::strict());
    assert_eq!(conversion.invoice.tax_items.len(), 1);
    assert_eq!(conversion.invoice.tax_items[0].percent, dec!(20));
    assert_eq!(conversion.issues().most_severe(), Some(Severity::Warning));
    assert_eq!(
        conversion
            .issues()
            .of_kind(IssueKind::ConflictingDeclaration)
            .count(),
        1
    );
}

#[test]
fn unresolved_category_strict_vs_lax() {
    let doc = ubl::from_ubl_xml(&fixture("lax_only_unresolved_category.xml")).unwrap();

    let err = ebinterface::convert_document(&doc, &ConversionSettings::strict()).unwrap_err();
    let ConversionError::Rejected { issues } = err else {
        panic!("expected rejection");
    };
    assert_eq!(issues.of_kind(IssueKind::UnresolvedCategory).count(), 1);
    assert_eq!(issues.of_kind(IssueKind::UnresolvedBucket).count(), 1);
    assert_eq!(issues.first_error().unwrap().context, "lines[1]");

    let conversion = ebinterface::convert_document(&doc, &ConversionSettings::lax()).unwrap();
    let inv = &conversion.invoice;
    assert_eq!(inv.tax_items.len(), 1);
    assert_eq!(inv.tax_items[0].taxable_amount, dec!(100.00));
    assert_eq!(inv.total_gross_amount, dec!(170.00));
    assert_eq!(conversion.resolution.unresolved_amount(), dec!(50.00));
}

#[test]
fn total_mismatch_is_reported() {
    let xml = fixture("credit_note.xml").replace(
        r#"<cbc:TaxInclusiveAmount currencyID="EUR">120.00</cbc:TaxInclusiveAmount>"#,
        r#"<cbc:TaxInclusiveAmount currencyID="EUR">121.00</cbc:TaxInclusiveAmount>"#,
    );
    let doc = ubl::from_ubl_xml(&xml).unwrap();
    let conversion = ebinterface::convert_document(&doc, &ConversionSettings::strict()).unwrap();
    let mismatches: Vec<_> = conversion
        .issues()
        .of_kind(IssueKind::TotalMismatch)
        .collect();
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].message.contains("TaxInclusiveAmount"));
}

#[test]
fn payable_mismatch_is_reported() {
    let xml = fixture("credit_note.xml").replace(
        r#"<cbc:PayableAmount currencyID="EUR">120.00</cbc:PayableAmount>"#,
        r#"<cbc:PayableAmount currencyID="EUR">110.00</cbc:PayableAmount>"#,
    );
    let doc = ubl::from_ubl_xml(&xml).unwrap();
    let conversion = ebinterface::convert_document(&doc, &ConversionSettings::strict()).unwrap();
    let mismatches: Vec<_> = conversion
        .issues()
        .of_kind(IssueKind::TotalMismatch)
        .collect();
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].message.contains("PayableAmount"));
    assert_eq!(conversion.invoice.payable_amount, dec!(120.00));
}

#[test]
fn invoice_with_credit_note_type_code_is_credit_memo() {
    let xml = fixture("conflicting_declaration.xml").replace(
        "<cbc:InvoiceTypeCode>380</cbc:InvoiceTypeCode>",
        "<cbc:InvoiceTypeCode>381</cbc:InvoiceTypeCode>",
    );
    let out = ebinterface::ubl_to_ebinterface(&xml, &ConversionSettings::lax()).unwrap();
    assert!(out.xml.contains(r#"DocumentType="CreditMemo""#));
}

#[test]
fn tolerance_absorbs_small_differences() {
    let xml = fixture("credit_note.xml").replace(
        r#"<cbc:TaxInclusiveAmount currencyID="EUR">120.00</cbc:TaxInclusiveAmount>"#,
        r#"<cbc:TaxInclusiveAmount currencyID="EUR">120.01</cbc:TaxInclusiveAmount>"#,
    );
    let doc = ubl::from_ubl_xml(&xml).unwrap();
    let conversion = ebinterface::convert_document(&doc, &ConversionSettings::lax()).unwrap();
    assert!(conversion.issues().is_empty());
}

// --- XML ---

#[test]
fn writes_standard_invoice() {
    let settings = ConversionSettings {
        generating_system: "test".into(),
        ..ConversionSettings::strict()
    };
    let out = ebinterface::ubl_to_ebinterface(&fixture("standard_invoice.xml"), &settings).unwrap();
    let xml = &out.xml;

    assert!(xml.contains(r#"GeneratingSystem="test""#));
    assert!(xml.contains("<InvoiceNumber>RE-2024-0815</InvoiceNumber>"));
    assert!(xml.contains("<VATIdentificationNumber>ATU12345678</VATIdentificationNumber>"));
    assert!(xml.contains(r#"<Country CountryCode="AT">AT</Country>"#));
    assert!(xml.contains("<OrderID>PO-2024-77</OrderID>"));
    assert!(xml.contains(r#"<TaxPercent TaxCategoryCode="AA">10.00</TaxPercent>"#));
    assert!(xml.contains("<TaxAmount>70.20</TaxAmount>"));
    assert!(xml.contains("<PrepaidAmount>100.00</PrepaidAmount>"));
    assert!(xml.contains("<PayableAmount>375.10</PayableAmount>"));

    let first_reduced = xml.find(r#"TaxCategoryCode="AA">10.00"#).unwrap();
    let tax_block = xml.find("<Tax>").unwrap();
    assert!(first_reduced < tax_block, "line tax item precedes summary");
    assert_eq!(out.issues.len(), 1);
}

#[test]
fn writes_credit_memo() {
    let out = ebinterface::ubl_to_ebinterface(&fixture("credit_note.xml"), &ConversionSettings::lax())
        .unwrap();
    assert!(out.xml.contains(r#"DocumentType="CreditMemo""#));
    assert!(out.xml.contains("<TotalGrossAmount>120.00</TotalGrossAmount>"));
}

#[test]
fn zero_decimal_currency_amounts() {
    let out = ebinterface::ubl_to_ebinterface(&fixture("jpy_invoice.xml"), &ConversionSettings::strict())
        .unwrap();
    assert!(out.xml.contains(r#"InvoiceCurrency="JPY""#));
    assert!(out.xml.contains("<TaxAmount>201</TaxAmount>"));
    assert!(out.xml.contains("<TotalGrossAmount>2206</TotalGrossAmount>"));
    assert!(out.issues.is_empty());
}

#[test]
fn parse_errors_propagate() {
    let err = ebinterface::ubl_to_ebinterface("<Invoice>", &ConversionSettings::lax()).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::Xml(_) | ConversionError::InvalidInput(_)
    ));
}

#[test]
fn price_base_quantity_is_written() {
    let xml = fixture("standard_invoice.xml").replace(
        r#"<cbc:PriceAmount currencyID="EUR">120.00</cbc:PriceAmount>"#,
        r#"<cbc:PriceAmount currencyID="EUR">1200.00</cbc:PriceAmount>
      <cbc:BaseQuantity unitCode="HUR">10</cbc:BaseQuantity>"#,
    );
    let out = ebinterface::ubl_to_ebinterface(&xml, &ConversionSettings::strict()).unwrap();
    assert!(out.xml.contains(r#"<UnitPrice BaseQuantity="10.00">1200.00</UnitPrice>"#));
    assert!(out.xml.contains(r#"<Quantity Unit="HUR">3.00</Quantity>"#));
}

const TINY_QUANTITY_INVOICE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Invoice xmlns="urn:oasis:names:specification:ubl:schema:xsd:Invoice-2"
         xmlns:cac="urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2"
         xmlns:cbc="urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2">
  <cbc:ID>INV-Q</cbc:ID>
  <cbc:IssueDate>2024-06-01</cbc:IssueDate>
  <cbc:DocumentCurrencyCode>EUR</cbc:DocumentCurrencyCode>
  <cac:InvoiceLine>
    <cbc:ID>1</cbc:ID>
    <cbc:InvoicedQuantity unitCode="C62">0.0000001</cbc:InvoicedQuantity>
    <cbc:LineExtensionAmount currencyID="EUR">70000000000000000000000</cbc:LineExtensionAmount>
    <cac:Item>
      <cbc:Name>Sample</cbc:Name>
      <cac:ClassifiedTaxCategory>
        <cbc:ID>S</cbc:ID>
        <cbc:Percent>20</cbc:Percent>
        <cac:TaxScheme><cbc:ID>VAT</cbc:ID></cac:TaxScheme>
      </cac:ClassifiedTaxCategory>
    </cac:Item>
  </cac:InvoiceLine>
</Invoice>"#;

#[test]
fn unit_price_overflow_is_invalid_input() {
    let err = ebinterface::ubl_to_ebinterface(TINY_QUANTITY_INVOICE, &ConversionSettings::lax())
        .unwrap_err();
    let ConversionError::InvalidInput(message) = err else {
        panic!("expected invalid input");
    };
    assert!(message.starts_with("lines[0]: "), "{message}");
    assert!(message.contains("out of range"), "{message}");
}
