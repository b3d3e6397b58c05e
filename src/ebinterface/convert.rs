use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::model::*;
use super::write::to_ebinterface_xml;
use crate::core::*;

/// A converted document with the issues collected on the way.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub invoice: EbInvoice,
    pub resolution: TaxResolution,
}

impl Conversion {
    pub fn issues(&self) -> &IssueSink {
        &self.resolution.issues
    }
}

/// Serialized result of [`ubl_to_ebinterface`].
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    pub xml: String,
    pub issues: IssueSink,
}

/// Convert a parsed source document into an ebInterface invoice.
///
/// In strict mode a document with error-level issues is rejected with
/// [`ConversionError::Rejected`]. In lax mode it is converted, the summary
/// tax block carries only the resolved buckets, and the issues are returned
/// alongside.
pub fn convert_document(
    doc: &SourceDocument,
    settings: &ConversionSettings,
) -> Result<Conversion, ConversionError> {
    let mut resolution = resolve_taxes(&doc.tax_input(), settings)?;
    let scale = settings.amount_scale_for(&doc.currency_code);

    // Lines come first in the resolved entries, allowances/charges after.
    let (line_rates, ac_rates) = resolution.entries.split_at(doc.lines.len());

    let items = doc
        .lines
        .iter()
        .zip(line_rates)
        .enumerate()
        .map(|(i, (line, resolved))| {
            line_item(i, line, resolved, scale).map_err(|e| e.in_context(&resolved.entry.context))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let reductions_surcharges = doc
        .allowances_charges
        .iter()
        .zip(ac_rates)
        .map(|(ac, resolved)| {
            Ok(EbReductionSurcharge {
                kind: if ac.is_charge {
                    ReductionOrSurcharge::Surcharge
                } else {
                    ReductionOrSurcharge::Reduction
                },
                base_amount: ac.base_amount,
                percentage: ac.multiplier,
                amount: ac.amount,
                tax_item: tax_item(ac.amount, resolved, scale)
                    .map_err(|e| e.in_context(&resolved.entry.context))?,
                comment: ac.reason.clone(),
            })
        })
        .collect::<Result<Vec<_>, ConversionError>>()?;

    // First-seen category code per percentage
    let mut codes: BTreeMap<Decimal, String> = BTreeMap::new();
    for resolved in resolution.entries.iter().filter(|e| e.rate.is_resolved()) {
        codes
            .entry(resolved.rate.percentage())
            .or_insert_with(|| resolved.entry.key.category_code().to_string());
    }
    let tax_items = resolution
        .breakdown
        .resolved()
        .map(|bucket| EbTaxItem {
            taxable_amount: bucket.taxable_base,
            percent: bucket.percentage(),
            category_code: codes.get(&bucket.percentage()).cloned().unwrap_or_default(),
            tax_amount: bucket.tax_amount,
        })
        .collect::<Vec<_>>();

    let net_total = resolution.breakdown.net_total();
    let total_gross_amount = net_total
        .checked_add(resolution.breakdown.tax_total())
        .ok_or_else(|| ConversionError::invalid("total gross amount is out of range"))?;
    let prepaid_amount = doc.declared_totals.prepaid_amount.filter(|p| !p.is_zero());
    let payable_amount = total_gross_amount
        .checked_sub(prepaid_amount.unwrap_or(Decimal::ZERO))
        .ok_or_else(|| ConversionError::invalid("payable amount is out of range"))?;
    let line_total = checked_sum(doc.lines.iter().map(|line| line.net_amount))
        .ok_or_else(|| ConversionError::invalid("sum of line net amounts is out of range"))?;

    let totals = &doc.declared_totals;
    for (field, declared, computed) in [
        ("LineExtensionAmount", totals.line_extension_amount, line_total),
        ("TaxExclusiveAmount", totals.tax_exclusive_amount, net_total),
        ("TaxInclusiveAmount", totals.tax_inclusive_amount, total_gross_amount),
        ("PayableAmount", totals.payable_amount, payable_amount),
    ] {
        check_total(field, declared, computed, settings, &mut resolution.issues);
    }

    if !settings.mode.accepts(&resolution.issues) {
        log::warn!(
            "document {} rejected: {} error-level issue(s)",
            doc.number,
            resolution.issues.count(Severity::Error)
        );
        return Err(ConversionError::Rejected {
            issues: resolution.issues,
        });
    }

    let mut comments = doc.notes.clone();
    if let Some(reference) = &doc.buyer_reference {
        comments.push(format!("Buyer reference: {reference}"));
    }

    let invoice = EbInvoice {
        generating_system: settings.generating_system.clone(),
        document_type: document_type(doc),
        currency: doc.currency_code.clone(),
        amount_scale: scale,
        number: doc.number.clone(),
        issue_date: doc.issue_date,
        biller: party(&doc.seller),
        recipient: party(&doc.buyer),
        order_reference: doc.order_reference.clone(),
        items,
        reductions_surcharges,
        tax_items,
        total_gross_amount,
        prepaid_amount,
        payable_amount,
        comments,
    };

    log::info!(
        "converted {} {} ({} lines, {} tax items, {} issue(s))",
        invoice.document_type.as_str(),
        invoice.number,
        invoice.items.len(),
        invoice.tax_items.len(),
        resolution.issues.len()
    );

    Ok(Conversion {
        invoice,
        resolution,
    })
}

/// Parse a UBL document, convert it and serialize the ebInterface result.
pub fn ubl_to_ebinterface(
    xml: &str,
    settings: &ConversionSettings,
) -> Result<ConvertedDocument, ConversionError> {
    let doc = crate::ubl::from_ubl_xml(xml)?;
    let conversion = convert_document(&doc, settings)?;
    let xml = to_ebinterface_xml(&conversion.invoice)?;
    Ok(ConvertedDocument {
        xml,
        issues: conversion.resolution.issues,
    })
}

/// A `CreditNote` root, or an `Invoice` root typed as a credit note (UNTDID 1001 code 381).
fn document_type(doc: &SourceDocument) -> EbDocumentType {
    match (doc.kind, doc.type_code.as_deref().map(str::trim)) {
        (DocumentKind::CreditNote, _) | (DocumentKind::Invoice, Some("381")) => {
            EbDocumentType::CreditMemo
        }
        (DocumentKind::Invoice, _) => EbDocumentType::Invoice,
    }
}

fn line_item(
    index: usize,
    line: &SourceLine,
    resolved: &ResolvedEntry,
    scale: u32,
) -> Result<EbLineItem, ConversionError> {
    let quantity = line.quantity.unwrap_or(Decimal::ONE);
    let unit_price = match line.unit_price {
        Some(price) => price,
        None if !quantity.is_zero() => {
            let price = line.net_amount.checked_div(quantity).ok_or_else(|| {
                ConversionError::invalid(format!(
                    "net amount {} / quantity {quantity} is out of range",
                    line.net_amount
                ))
            })?;
            round_half_up(price, scale)
        }
        None => line.net_amount,
    };
    let description = line
        .item_name
        .clone()
        .or_else(|| line.description.clone())
        .unwrap_or_else(|| line.id.clone());

    Ok(EbLineItem {
        position_number: u32::try_from(index + 1).unwrap_or(u32::MAX),
        description,
        quantity,
        unit: line.unit.clone().unwrap_or_else(|| "C62".to_string()),
        unit_price,
        unit_price_base_quantity: line.unit_price.and(line.price_base_quantity),
        tax_item: tax_item(line.net_amount, resolved, scale)?,
        line_item_amount: line.net_amount,
    })
}

fn tax_item(
    taxable_amount: Decimal,
    resolved: &ResolvedEntry,
    scale: u32,
) -> Result<EbTaxItem, ConversionError> {
    let percent = resolved.rate.percentage();
    let tax_amount = taxable_amount
        .checked_mul(percent)
        .and_then(|tax| tax.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| {
            ConversionError::invalid(format!(
                "tax on {taxable_amount} at {percent}% is out of range"
            ))
        })?;
    Ok(EbTaxItem {
        taxable_amount,
        percent,
        category_code: resolved.entry.key.category_code().to_string(),
        tax_amount: round_half_up(tax_amount, scale),
    })
}

fn party(source: &Party) -> EbParty {
    EbParty {
        vat_id: source.vat_id.clone(),
        name: source.name.clone(),
        street: match (&source.address.street, &source.address.additional) {
            (Some(street), Some(additional)) => Some(format!("{street}, {additional}")),
            (street, additional) => street.clone().or_else(|| additional.clone()),
        },
        town: source.address.city.clone(),
        zip: source.address.postal_code.clone(),
        country_code: source.address.country_code.clone(),
        email: source.email.clone(),
    }
}

fn check_total(
    field: &str,
    declared: Option<Decimal>,
    computed: Decimal,
    settings: &ConversionSettings,
    issues: &mut IssueSink,
) {
    let Some(declared) = declared else {
        return;
    };
    let within_tolerance = declared
        .checked_sub(computed)
        .is_some_and(|diff| diff.abs() <= settings.total_tolerance);
    if !within_tolerance {
        issues.append(ConversionIssue::new(
            IssueKind::TotalMismatch,
            "totals",
            format!("declared {field} {declared} differs from recomputed {computed}"),
        ));
    }
}
