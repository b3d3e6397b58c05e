use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::{ConversionError, round_half_up};

fn xml_io(e: std::io::Error) -> ConversionError {
    ConversionError::Xml(format!("write error: {e}"))
}

/// Indenting writer producing a UTF-8 document in memory.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
    amount_scale: u32,
}

impl XmlWriter {
    /// `amount_scale` is the number of decimal places written for amounts.
    pub fn new(amount_scale: u32) -> Result<Self, ConversionError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self {
            writer,
            amount_scale,
        })
    }

    pub fn into_string(self) -> Result<String, ConversionError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| ConversionError::Xml(format!("UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, ConversionError> {
        self.start_element_with_attrs(name, &[])
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, ConversionError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, ConversionError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, ConversionError> {
        self.text_element_with_attrs(name, text, &[])
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, ConversionError> {
        self.start_element_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    pub fn optional_text_element(
        &mut self,
        name: &str,
        text: Option<&str>,
    ) -> Result<&mut Self, ConversionError> {
        if let Some(text) = text {
            self.text_element(name, text)?;
        }
        Ok(self)
    }

    /// Write an amount with the document's fixed number of decimals.
    pub fn amount_element(
        &mut self,
        name: &str,
        amount: Decimal,
    ) -> Result<&mut Self, ConversionError> {
        let text = format_amount(amount, self.amount_scale);
        self.text_element(name, &text)
    }
}

/// Format an amount with exactly `scale` decimal places, rounding half-up.
pub fn format_amount(amount: Decimal, scale: u32) -> String {
    let mut rounded = round_half_up(amount, scale);
    rounded.rescale(scale);
    rounded.to_string()
}

/// Format a percentage or quantity: at least 2 decimal places, trailing
/// zeros beyond that stripped.
pub fn format_decimal(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format_amount_cases() {
        assert_eq!(format_amount(dec!(100), 2), "100.00");
        assert_eq!(format_amount(dec!(49.9), 2), "49.90");
        assert_eq!(format_amount(dec!(0.005), 2), "0.01");
        assert_eq!(format_amount(dec!(1234.5), 0), "1235");
        assert_eq!(format_amount(dec!(-3.5), 2), "-3.50");
    }

    #[test]
    fn format_decimal_cases() {
        assert_eq!(format_decimal(dec!(20)), "20.00");
        assert_eq!(format_decimal(dec!(20.000)), "20.00");
        assert_eq!(format_decimal(dec!(13.5)), "13.50");
        assert_eq!(format_decimal(dec!(0.125)), "0.125");
    }
}
