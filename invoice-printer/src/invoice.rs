//! Invoice document fields
//!
//! Every field the renderer understands is listed here with its default.
//! Input is deserialised leniently: numbers and booleans are accepted as
//! text, `null` and missing fields fall back to defaults, so a sparse or
//! sloppy payload still yields a (possibly degraded) receipt.

use serde::{Deserialize, Serialize};

/// One product row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub variation: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sell_line_note: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sub_sku: String,
    #[serde(deserialize_with = "lenient::text")]
    pub brand: String,
    #[serde(deserialize_with = "lenient::text")]
    pub cat_code: String,
    #[serde(deserialize_with = "lenient::quantity")]
    pub quantity: String,
    #[serde(deserialize_with = "lenient::amount")]
    pub unit_price_exc_tax: String,
    #[serde(deserialize_with = "lenient::amount")]
    pub line_total: String,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            name: String::new(),
            variation: String::new(),
            sell_line_note: String::new(),
            sub_sku: String::new(),
            brand: String::new(),
            cat_code: String::new(),
            quantity: DEFAULT_QUANTITY.to_string(),
            unit_price_exc_tax: DEFAULT_AMOUNT.to_string(),
            line_total: DEFAULT_AMOUNT.to_string(),
        }
    }
}

impl LineItem {
    /// Product column text: `name variation(note), sku, brand, category`
    pub fn description(&self) -> String {
        let mut product = format!("{} {}", self.name, self.variation);
        if is_present(&self.sell_line_note) {
            product.push_str(&format!("({})", self.sell_line_note));
        }
        for extra in [&self.sub_sku, &self.brand, &self.cat_code] {
            if is_present(extra) {
                product.push_str(", ");
                product.push_str(extra);
            }
        }
        product
    }
}

/// One tender used to settle the invoice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    #[serde(deserialize_with = "lenient::text")]
    pub method: String,
    #[serde(deserialize_with = "lenient::text")]
    pub amount: String,
}

/// All recognised invoice fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceData {
    // Logo reference (path or data: URI)
    #[serde(deserialize_with = "lenient::text")]
    pub logo: String,

    // Shop header
    #[serde(deserialize_with = "lenient::text")]
    pub header_text: String,
    #[serde(deserialize_with = "lenient::text")]
    pub display_name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub address: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sub_heading_line1: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sub_heading_line2: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sub_heading_line3: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sub_heading_line4: String,
    #[serde(deserialize_with = "lenient::text")]
    pub sub_heading_line5: String,

    // Tax registration
    #[serde(deserialize_with = "lenient::text")]
    pub tax_label1: String,
    #[serde(deserialize_with = "lenient::text")]
    pub tax_info1: String,
    #[serde(deserialize_with = "lenient::text")]
    pub tax_label2: String,
    #[serde(deserialize_with = "lenient::text")]
    pub tax_info2: String,

    #[serde(deserialize_with = "lenient::text")]
    pub invoice_heading: String,

    // Invoice info
    #[serde(deserialize_with = "lenient::text")]
    pub invoice_no_prefix: String,
    #[serde(deserialize_with = "lenient::text")]
    pub invoice_no: String,
    #[serde(deserialize_with = "lenient::text")]
    pub date_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub invoice_date: String,

    // Customer
    #[serde(deserialize_with = "lenient::text")]
    pub customer_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub customer_info: String,
    #[serde(deserialize_with = "lenient::text")]
    pub client_id_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub client_id: String,

    // Product table
    #[serde(deserialize_with = "lenient::text")]
    pub table_qty_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub table_product_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub table_unit_price_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub table_subtotal_label: String,
    #[serde(deserialize_with = "lenient::list")]
    pub lines: Vec<LineItem>,

    // Totals
    #[serde(deserialize_with = "lenient::text")]
    pub subtotal_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub subtotal: String,
    #[serde(deserialize_with = "lenient::text")]
    pub discount_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub discount: String,
    #[serde(deserialize_with = "lenient::text")]
    pub tax_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub tax: String,
    #[serde(deserialize_with = "lenient::text")]
    pub total_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub total: String,

    // Payments
    #[serde(deserialize_with = "lenient::text")]
    pub total_paid_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub total_paid: String,
    #[serde(deserialize_with = "lenient::list")]
    pub payments: Vec<Payment>,
    #[serde(deserialize_with = "lenient::text")]
    pub total_due_label: String,
    #[serde(deserialize_with = "lenient::text")]
    pub total_due: String,

    /// Tax breakdown, in document order
    #[serde(deserialize_with = "lenient::pairs")]
    pub taxes: Vec<(String, String)>,

    #[serde(deserialize_with = "lenient::text")]
    pub footer_text: String,

    #[serde(deserialize_with = "lenient::flag")]
    pub cash_drawer: bool,
}

impl InvoiceData {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

pub const DEFAULT_QUANTITY: &str = "1";
pub const DEFAULT_AMOUNT: &str = "0";

/// Non-blank text
pub fn is_present(s: &str) -> bool {
    !s.trim().is_empty() && s != "0"
}

/// Present and not numerically zero ("0.00", "-0" count as zero)
pub fn is_nonzero(s: &str) -> bool {
    if !is_present(s) {
        return false;
    }
    match s.trim().parse::<f64>() {
        Ok(v) => v != 0.0,
        Err(_) => true,
    }
}

/// Remove HTML tags, keeping the text between them
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Lenient field deserializers
mod lenient {
    use std::fmt;

    use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
    use serde::Deserialize;
    use serde::de::DeserializeOwned;
    use serde_json::Value;

    use super::{DEFAULT_AMOUNT, DEFAULT_QUANTITY};

    fn value_to_text(v: Value) -> Option<String> {
        match v {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(if b { "1".into() } else { String::new() }),
            other => Some(other.to_string()),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(value_to_text(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn quantity<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(value_to_text(Value::deserialize(d)?)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_QUANTITY.to_string()))
    }

    pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(value_to_text(Value::deserialize(d)?)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AMOUNT.to_string()))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Value::String(s) => super::is_present(&s) && s != "false",
            Value::Null => false,
            _ => true,
        })
    }

    /// Elements of an array, or values of an object in document order
    ///
    /// Any other shape is an empty list; elements that do not fit `T` are
    /// dropped.
    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let items = match Value::deserialize(d)? {
            Value::Array(items) => items,
            Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
            _ => Vec::new(),
        };
        Ok(items
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }

    /// Ordered key/value pairs from an object, an array of pairs, or null
    pub fn pairs<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, String)>, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object or a list of [key, value] pairs")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::new();
                while let Some((k, v)) = map.next_entry::<String, Value>()? {
                    out.push((k, value_to_text(v).unwrap_or_default()));
                }
                Ok(out)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::new();
                while let Some((k, v)) = seq.next_element::<(Value, Value)>()? {
                    out.push((
                        value_to_text(k).unwrap_or_default(),
                        value_to_text(v).unwrap_or_default(),
                    ));
                }
                Ok(out)
            }
        }

        d.deserialize_any(PairsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_are_coerced_to_text() {
        let inv = InvoiceData::from_json(r#"{"invoice_no": 1001, "total": 12.5, "header_text": null}"#).unwrap();
        assert_eq!(inv.invoice_no, "1001");
        assert_eq!(inv.total, "12.5");
        assert_eq!(inv.header_text, "");
    }

    #[test]
    fn test_missing_line_fields_get_defaults() {
        let inv = InvoiceData::from_json(r#"{"lines": [{"name": "Tea", "quantity": null}]}"#).unwrap();
        let line = &inv.lines[0];
        assert_eq!(line.quantity, "1");
        assert_eq!(line.unit_price_exc_tax, "0");
        assert_eq!(line.line_total, "0");
        assert_eq!(line.variation, "");
    }

    #[test]
    fn test_null_lists_are_empty() {
        let inv = InvoiceData::from_json(r#"{"lines": null, "payments": null, "taxes": null}"#).unwrap();
        assert!(inv.lines.is_empty());
        assert!(inv.payments.is_empty());
        assert!(inv.taxes.is_empty());
    }

    #[test]
    fn test_keyed_lines_are_accepted() {
        let inv = InvoiceData::from_json(
            r#"{"lines": {"0": {"name": "Tea"}, "2": {"name": "Cake", "quantity": 3}, "1": {"name": "Soup"}}}"#,
        )
        .unwrap();
        let names: Vec<&str> = inv.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Tea", "Cake", "Soup"]);
        assert_eq!(inv.lines[1].quantity, "3");
    }

    #[test]
    fn test_malformed_lists_become_empty() {
        let inv = InvoiceData::from_json(r#"{"payments": "x", "lines": 7, "total": "9.00"}"#).unwrap();
        assert!(inv.payments.is_empty());
        assert!(inv.lines.is_empty());
        assert_eq!(inv.total, "9.00");

        let inv = InvoiceData::from_json(r#"{"payments": [{"method": "Cash", "amount": 2}, "junk"]}"#).unwrap();
        assert_eq!(inv.payments.len(), 1);
        assert_eq!(inv.payments[0].amount, "2");
    }

    #[test]
    fn test_taxes_keep_document_order() {
        let inv = InvoiceData::from_json(r#"{"taxes": {"VAT 21%": "2.10", "VAT 10%": 0.5, "Eco": "0.10"}}"#).unwrap();
        assert_eq!(
            inv.taxes,
            vec![
                ("VAT 21%".to_string(), "2.10".to_string()),
                ("VAT 10%".to_string(), "0.5".to_string()),
                ("Eco".to_string(), "0.10".to_string()),
            ]
        );

        let inv = InvoiceData::from_json(r#"{"taxes": [["GST", 5]]}"#).unwrap();
        assert_eq!(inv.taxes, vec![("GST".to_string(), "5".to_string())]);
    }

    #[test]
    fn test_cash_drawer_flag() {
        for (json, expected) in [
            (r#"{"cash_drawer": true}"#, true),
            (r#"{"cash_drawer": 1}"#, true),
            (r#"{"cash_drawer": "1"}"#, true),
            (r#"{"cash_drawer": "0"}"#, false),
            (r#"{"cash_drawer": ""}"#, false),
            (r#"{}"#, false),
        ] {
            assert_eq!(InvoiceData::from_json(json).unwrap().cash_drawer, expected, "{}", json);
        }
    }

    #[test]
    fn test_description() {
        let line = LineItem {
            name: "Latte".into(),
            variation: "Large".into(),
            sell_line_note: "oat milk".into(),
            sub_sku: "LAT-L".into(),
            brand: String::new(),
            cat_code: "HOT".into(),
            ..Default::default()
        };
        assert_eq!(line.description(), "Latte Large(oat milk), LAT-L, HOT");
    }

    #[test]
    fn test_presence_rules() {
        assert!(!is_present(""));
        assert!(!is_present("  "));
        assert!(!is_present("0"));
        assert!(is_present("0.00"));
        assert!(!is_nonzero("0.00"));
        assert!(!is_nonzero("-0"));
        assert!(is_nonzero("1.50"));
        assert!(is_nonzero("N/A"));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>Thank you</b> for <i>shopping</i>!"), "Thank you for shopping!");
        assert_eq!(strip_tags("a > b"), "a > b");
    }
}
