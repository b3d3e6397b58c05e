use super::EBINTERFACE_NS;
use super::model::*;
use super::xml_utils::{XmlWriter, format_decimal};
use crate::core::ConversionError;

/// Serialize an [`EbInvoice`] to ebInterface 6.1 XML.
pub fn to_ebinterface_xml(invoice: &EbInvoice) -> Result<String, ConversionError> {
    let mut w = XmlWriter::new(invoice.amount_scale)?;

    w.start_element_with_attrs(
        "Invoice",
        &[
            ("xmlns", EBINTERFACE_NS),
            ("GeneratingSystem", invoice.generating_system.as_str()),
            ("DocumentType", invoice.document_type.as_str()),
            ("InvoiceCurrency", invoice.currency.as_str()),
            ("Language", "ger"),
        ],
    )?;

    w.text_element("InvoiceNumber", &invoice.number)?;
    w.text_element("InvoiceDate", &invoice.issue_date.format("%Y-%m-%d").to_string())?;

    write_party(&mut w, "Biller", &invoice.biller, None)?;
    write_party(
        &mut w,
        "InvoiceRecipient",
        &invoice.recipient,
        invoice.order_reference.as_deref(),
    )?;

    w.start_element("Details")?;
    w.start_element("ItemList")?;
    for item in &invoice.items {
        write_line_item(&mut w, item)?;
    }
    w.end_element("ItemList")?;
    w.end_element("Details")?;

    if !invoice.reductions_surcharges.is_empty() {
        w.start_element("ReductionAndSurchargeDetails")?;
        for rs in &invoice.reductions_surcharges {
            write_reduction_surcharge(&mut w, rs)?;
        }
        w.end_element("ReductionAndSurchargeDetails")?;
    }

    w.start_element("Tax")?;
    for tax in &invoice.tax_items {
        write_tax_item(&mut w, tax)?;
    }
    w.end_element("Tax")?;

    w.amount_element("TotalGrossAmount", invoice.total_gross_amount)?;
    if let Some(prepaid) = invoice.prepaid_amount {
        w.amount_element("PrepaidAmount", prepaid)?;
    }
    w.amount_element("PayableAmount", invoice.payable_amount)?;

    for comment in &invoice.comments {
        w.text_element("Comment", comment)?;
    }

    w.end_element("Invoice")?;
    w.into_string()
}

fn write_party(
    w: &mut XmlWriter,
    element: &str,
    party: &EbParty,
    order_reference: Option<&str>,
) -> Result<(), ConversionError> {
    w.start_element(element)?;
    w.optional_text_element("VATIdentificationNumber", party.vat_id.as_deref())?;

    w.start_element("Address")?;
    w.optional_text_element("Name", party.name.as_deref())?;
    w.optional_text_element("Street", party.street.as_deref())?;
    w.optional_text_element("Town", party.town.as_deref())?;
    w.optional_text_element("ZIP", party.zip.as_deref())?;
    if let Some(cc) = &party.country_code {
        w.text_element_with_attrs("Country", cc, &[("CountryCode", cc.as_str())])?;
    }
    w.optional_text_element("Email", party.email.as_deref())?;
    w.end_element("Address")?;

    if let Some(order_id) = order_reference {
        w.start_element("OrderReference")?;
        w.text_element("OrderID", order_id)?;
        w.end_element("OrderReference")?;
    }

    w.end_element(element)?;
    Ok(())
}

fn write_line_item(w: &mut XmlWriter, item: &EbLineItem) -> Result<(), ConversionError> {
    w.start_element("ListLineItem")?;
    w.text_element("PositionNumber", &item.position_number.to_string())?;
    w.text_element("Description", &item.description)?;
    w.text_element_with_attrs(
        "Quantity",
        &format_decimal(item.quantity),
        &[("Unit", item.unit.as_str())],
    )?;
    let unit_price = format_decimal(item.unit_price);
    match item.unit_price_base_quantity {
        Some(base_quantity) => w.text_element_with_attrs(
            "UnitPrice",
            &unit_price,
            &[("BaseQuantity", format_decimal(base_quantity).as_str())],
        )?,
        None => w.text_element("UnitPrice", &unit_price)?,
    };
    write_tax_item(w, &item.tax_item)?;
    w.amount_element("LineItemAmount", item.line_item_amount)?;
    w.end_element("ListLineItem")?;
    Ok(())
}

fn write_reduction_surcharge(
    w: &mut XmlWriter,
    rs: &EbReductionSurcharge,
) -> Result<(), ConversionError> {
    let name = rs.kind.element_name();
    w.start_element(name)?;
    if let Some(base) = rs.base_amount {
        w.amount_element("BaseAmount", base)?;
    }
    if let Some(pct) = rs.percentage {
        w.text_element("Percentage", &format_decimal(pct))?;
    }
    w.amount_element("Amount", rs.amount)?;
    write_tax_item(w, &rs.tax_item)?;
    w.optional_text_element("Comment", rs.comment.as_deref())?;
    w.end_element(name)?;
    Ok(())
}

fn write_tax_item(w: &mut XmlWriter, tax: &EbTaxItem) -> Result<(), ConversionError> {
    w.start_element("TaxItem")?;
    w.amount_element("TaxableAmount", tax.taxable_amount)?;
    w.text_element_with_attrs(
        "TaxPercent",
        &format_decimal(tax.percent),
        &[("TaxCategoryCode", tax.category_code.as_str())],
    )?;
    w.amount_element("TaxAmount", tax.tax_amount)?;
    w.end_element("TaxItem")?;
    Ok(())
}
