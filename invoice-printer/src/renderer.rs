//! Invoice renderer
//!
//! Renders [`InvoiceData`] into ESC/POS bytes for thermal printers.

use crate::encoding::CapabilityProfile;
use crate::escpos::{EscPosBuilder, Justification};
use crate::invoice::{InvoiceData, is_nonzero, is_present, strip_tags};
use crate::layout::TextColumnFormatter;
use crate::matrix::Bitmap;

/// Invoice renderer
///
/// Section order: logo, shop header, invoice info, product table,
/// totals, payments, tax breakdown, footer, cut.
pub struct InvoiceRenderer {
    columns: TextColumnFormatter,
    profile: CapabilityProfile,
}

impl InvoiceRenderer {
    pub fn new(chars_per_line: usize, profile: CapabilityProfile) -> Self {
        Self {
            columns: TextColumnFormatter::with_profile(chars_per_line, profile),
            profile,
        }
    }

    /// Render a full invoice, with an already dithered logo if any
    pub fn render(&self, inv: &InvoiceData, logo: Option<&Bitmap>) -> Vec<u8> {
        let mut b = EscPosBuilder::new(self.profile);

        if let Some(logo) = logo {
            b.justify(Justification::Center);
            b.bit_image(logo);
            b.feed(1);
        }

        self.render_header(&mut b, inv);
        self.render_invoice_info(&mut b, inv);
        self.render_lines(&mut b, inv);
        self.render_totals(&mut b, inv);
        self.render_payments(&mut b, inv);
        b.text(&self.columns.draw_line());
        self.render_taxes(&mut b, inv);
        b.text(&self.columns.draw_line());
        self.render_footer(&mut b, inv);

        b.feed(1);
        b.cut();
        if inv.cash_drawer {
            b.pulse();
        }

        b.build()
    }

    /// Drawer kick with no printed content
    pub fn render_drawer_pulse(&self) -> Vec<u8> {
        let mut b = EscPosBuilder::new(self.profile);
        b.pulse();
        b.build()
    }

    /// Two-column row, right-trimmed, followed by a feed
    fn row(&self, b: &mut EscPosBuilder, left: &str, right: &str, lp: usize, rp: usize) {
        b.text(self.columns.columnify(left, right, lp, rp, 0, 0).trim_end());
        b.feed(1);
    }

    fn render_header(&self, b: &mut EscPosBuilder, inv: &InvoiceData) {
        b.justify(Justification::Center);
        b.emphasis(true);
        b.text_size(2, 2);
        if is_present(&inv.header_text) {
            b.text(&strip_tags(&inv.header_text));
            b.feed(1);
        }
        if is_present(&inv.display_name) {
            b.text(&inv.display_name);
            b.feed(1);
        }

        b.text_size(1, 1);
        if is_present(&inv.address) {
            b.text(&inv.address);
            b.feed(2);
        }

        for line in [
            &inv.sub_heading_line1,
            &inv.sub_heading_line2,
            &inv.sub_heading_line3,
            &inv.sub_heading_line4,
            &inv.sub_heading_line5,
        ] {
            if is_present(line) {
                b.text(line);
                b.feed(1);
            }
        }

        for (label, info) in [(&inv.tax_label1, &inv.tax_info1), (&inv.tax_label2, &inv.tax_info2)] {
            if is_present(info) {
                b.emphasis(true);
                b.text(label);
                b.emphasis(false);
                b.text(info);
                b.feed(1);
            }
        }

        if is_present(&inv.invoice_heading) {
            b.emphasis(true);
            b.text(&inv.invoice_heading);
            b.emphasis(false);
            b.feed(1);
        }

        b.justify(Justification::Left);
    }

    fn render_invoice_info(&self, b: &mut EscPosBuilder, inv: &InvoiceData) {
        b.feed(1);
        let invoice_no = format!("{} {}", inv.invoice_no_prefix, inv.invoice_no);
        let date = format!("{} {}", inv.date_label, inv.invoice_date);
        self.row(b, &invoice_no, &date, 50, 50);

        if is_present(&inv.customer_info) || is_present(&inv.client_id) {
            let customer = if is_present(&inv.customer_info) {
                format!("{} {}", inv.customer_label, inv.customer_info)
            } else {
                String::new()
            };
            let client = if is_present(&inv.client_id) {
                format!("{} {}", inv.client_id_label, inv.client_id)
            } else {
                String::new()
            };
            self.row(b, &customer, &client, 50, 50);
        }
    }

    /// Four-column product row: qty | product | unit price | subtotal
    ///
    /// Built by nesting two-column layouts: 10/40, then 50/25, then 75/25.
    pub fn table_row(&self, qty: &str, product: &str, unit_price: &str, subtotal: &str) -> String {
        let c = &self.columns;
        let qty_product = c.columnify(qty, product, 10, 40, 0, 0);
        let with_price = c.columnify(&qty_product, unit_price, 50, 25, 0, 0);
        c.columnify(&with_price, subtotal, 75, 25, 0, 0)
    }

    fn render_lines(&self, b: &mut EscPosBuilder, inv: &InvoiceData) {
        if inv.lines.is_empty() {
            return;
        }

        b.text(&self.columns.draw_line());
        let header = self.table_row(
            &inv.table_qty_label,
            &format!(" {}", inv.table_product_label),
            &inv.table_unit_price_label,
            &format!(" {}", inv.table_subtotal_label),
        );
        b.emphasis(true);
        b.text(header.trim_end());
        b.feed(1);
        b.emphasis(false);
        b.text(&self.columns.draw_line());

        for line in &inv.lines {
            let row = self.table_row(
                &line.quantity,
                &line.description(),
                &line.unit_price_exc_tax,
                &line.line_total,
            );
            b.text(row.trim_end());
            b.feed(2);
        }

        b.feed(1);
        b.text(&self.columns.draw_line());
    }

    fn render_totals(&self, b: &mut EscPosBuilder, inv: &InvoiceData) {
        if is_present(&inv.subtotal) {
            self.row(b, &inv.subtotal_label, &inv.subtotal, 50, 50);
        }
        if is_nonzero(&inv.discount) {
            self.row(b, &inv.discount_label, &inv.discount, 50, 50);
        }
        if is_nonzero(&inv.tax) {
            self.row(b, &inv.tax_label, &inv.tax, 50, 50);
        }
        if is_present(&inv.total) {
            b.emphasis(true);
            self.row(b, &inv.total_label, &inv.total, 50, 50);
            b.emphasis(false);
        }
    }

    fn render_payments(&self, b: &mut EscPosBuilder, inv: &InvoiceData) {
        if !inv.payments.is_empty() {
            b.emphasis(true);
            b.text(inv.total_paid_label.trim_end());
            b.feed(1);
            b.emphasis(false);
            for payment in &inv.payments {
                self.row(b, &payment.method, &payment.amount, 50, 50);
            }
        } else if is_present(&inv.total_paid) {
            self.row(b, &inv.total_paid_label, &inv.total_paid, 50, 50);
        }

        if is_nonzero(&inv.total_due) {
            self.row(b, &inv.total_due_label, &inv.total_due, 50, 50);
        }
    }

    fn render_taxes(&self, b: &mut EscPosBuilder, inv: &InvoiceData) {
        if inv.taxes.is_empty() {
            return;
        }

        b.emphasis(true);
        b.justify(Justification::Center);
        b.line(&inv.tax_label);
        b.justify(Justification::Left);
        b.emphasis(false);
        b.text(&self.columns.draw_line());
        for (name, amount) in &inv.taxes {
            self.row(b, name, amount, 50, 45);
        }
    }

    fn render_footer(&self, b: &mut EscPosBuilder, inv: &InvoiceData) {
        if is_present(&inv.footer_text) {
            b.justify(Justification::Center);
            b.feed(1);
            b.line(&strip_tags(&inv.footer_text));
            b.feed(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{LineItem, Payment};

    fn text_of(data: &[u8]) -> String {
        String::from_utf8_lossy(data).into_owned()
    }

    fn sample() -> InvoiceData {
        InvoiceData {
            header_text: "<b>Corner Cafe</b>".into(),
            display_name: "Main St".into(),
            invoice_no_prefix: "Invoice No.".into(),
            invoice_no: "1001".into(),
            date_label: "Date".into(),
            invoice_date: "2024-05-01".into(),
            table_qty_label: "Qty".into(),
            table_product_label: "Product".into(),
            table_unit_price_label: "Price".into(),
            table_subtotal_label: "Total".into(),
            lines: vec![LineItem {
                name: "Espresso".into(),
                variation: "Double".into(),
                quantity: "2".into(),
                unit_price_exc_tax: "2.50".into(),
                line_total: "5.00".into(),
                ..Default::default()
            }],
            subtotal_label: "Subtotal".into(),
            subtotal: "5.00".into(),
            discount_label: "Discount".into(),
            discount: "0.00".into(),
            total_label: "Total".into(),
            total: "5.00".into(),
            total_paid_label: "Paid".into(),
            payments: vec![Payment {
                method: "Cash".into(),
                amount: "5.00".into(),
            }],
            footer_text: "Thanks!".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_table_row_layout() {
        let r = InvoiceRenderer::new(42, CapabilityProfile::Simple);
        let row = r.table_row("2", "Espresso Double", "2.50", "5.00");
        assert_eq!(row.trim_end(), "2   Espresso Double  2.50      5.00");
    }

    #[test]
    fn test_render_sections() {
        let r = InvoiceRenderer::new(42, CapabilityProfile::Simple);
        let data = r.render(&sample(), None);
        let s = text_of(&data);

        assert!(data.starts_with(&[0x1B, 0x40]));
        assert!(s.contains("Corner Cafe"));
        assert!(!s.contains("<b>"));
        assert!(s.contains(&format!("{:<21}{}", "Invoice No. 1001", "Date 2024-05-01")));
        assert!(s.contains(&format!("{:<21}{}", "Subtotal", "5.00")));
        assert!(!s.contains("Discount"));
        assert!(s.contains(&format!("{:<21}{}", "Cash", "5.00")));
        assert!(s.contains("Thanks!\n"));
        assert!(data.ends_with(&[0x1D, 0x56, 0x41, 3]));
    }

    #[test]
    fn test_render_order() {
        let r = InvoiceRenderer::new(42, CapabilityProfile::Simple);
        let s = text_of(&r.render(&sample(), None));
        let pos = |needle: &str| s.find(needle).unwrap_or_else(|| panic!("missing {}", needle));
        assert!(pos("Corner Cafe") < pos("Invoice No."));
        assert!(pos("Invoice No.") < pos("Espresso"));
        assert!(pos("Espresso") < pos("Subtotal"));
        assert!(pos("Subtotal") < pos("Cash"));
        assert!(pos("Cash") < pos("Thanks!"));
    }

    #[test]
    fn test_cash_drawer_pulse() {
        let r = InvoiceRenderer::new(32, CapabilityProfile::Simple);
        let mut inv = sample();
        inv.cash_drawer = true;
        let data = r.render(&inv, None);
        assert!(data.ends_with(&[0x1D, 0x56, 0x41, 3, 0x1B, 0x70, 0, 60, 120]));
    }

    #[test]
    fn test_logo_comes_first() {
        let r = InvoiceRenderer::new(32, CapabilityProfile::Simple);
        let logo = Bitmap::from_rows(&[vec![true; 8]]).unwrap();
        let data = r.render(&InvoiceData::default(), Some(&logo));
        assert_eq!(&data[2..5], &[0x1B, 0x61, 1]);
        assert_eq!(&data[5..13], &[0x1B, 0x33, 24, 0x1B, 0x2A, 33, 8, 0]);
    }

    #[test]
    fn test_single_total_paid_without_payments() {
        let r = InvoiceRenderer::new(32, CapabilityProfile::Simple);
        let mut inv = sample();
        inv.payments.clear();
        inv.total_paid = "5.00".into();
        inv.total_due_label = "Due".into();
        inv.total_due = "1.25".into();
        let s = text_of(&r.render(&inv, None));
        assert!(s.contains(&format!("{:<16}{}", "Paid", "5.00")));
        assert!(s.contains(&format!("{:<16}{}", "Due", "1.25")));
    }

    #[test]
    fn test_tax_breakdown() {
        let r = InvoiceRenderer::new(40, CapabilityProfile::Simple);
        let mut inv = sample();
        inv.tax_label = "Taxes".into();
        inv.taxes = vec![("VAT 21%".into(), "0.87".into()), ("VAT 10%".into(), "0.10".into())];
        let s = text_of(&r.render(&inv, None));
        assert!(s.contains("Taxes\n"));
        assert!(s.find("VAT 21%").unwrap() < s.find("VAT 10%").unwrap());
        assert!(s.contains(&format!("{:<20}{}", "VAT 21%", "0.87")));
    }

    #[test]
    fn test_drawer_only() {
        let r = InvoiceRenderer::new(42, CapabilityProfile::Default);
        assert_eq!(r.render_drawer_pulse(), vec![0x1B, 0x40, 0x1B, 0x74, 16, 0x1B, 0x70, 0, 60, 120]);
    }

    #[test]
    fn test_gbk_table_row_keeps_columns_aligned() {
        let r = InvoiceRenderer::new(32, CapabilityProfile::Gbk);
        let row = r.table_row("1", "宫保鸡丁", "28.00", "28.00");
        assert_eq!(CapabilityProfile::Gbk.text_width(row.trim_end_matches('\n')), 32);
        assert_eq!(row.trim_end(), format!("1  宫保鸡丁{}28.00   28.00", " ".repeat(5)));
    }
}
