//! End-to-end: JSON invoice + data URI logo → device file

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use invoice_printer::{
    ConnectionConfig, HttpImageSource, InvoiceData, InvoicePrinter, LocalImageSource, PrinterConfig,
    ToneAdjustment,
};

fn logo_png(width: u32, height: u32) -> Vec<u8> {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 0]));
    for y in 0..height / 2 {
        for x in 0..width {
            img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn logo_data_uri(width: u32, height: u32) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(logo_png(width, height)))
}

fn printer_for(path: &std::path::Path) -> InvoicePrinter {
    let mut cfg = PrinterConfig::with_connection(ConnectionConfig::Linux {
        path: path.to_str().unwrap().to_string(),
    });
    cfg.char_per_line = 42;
    cfg.tone = ToneAdjustment::none();
    InvoicePrinter::new(cfg).unwrap()
}

fn invoice_json(logo: &str) -> String {
    serde_json::json!({
        "logo": logo,
        "header_text": "<h1>Corner Cafe</h1>",
        "address": "1 Main St",
        "invoice_no_prefix": "Invoice No.",
        "invoice_no": 1001,
        "date_label": "Date",
        "invoice_date": "2024-05-01",
        "table_qty_label": "Qty",
        "table_product_label": "Product",
        "table_unit_price_label": "Price",
        "table_subtotal_label": "Total",
        "lines": [
            {"name": "Flat white", "variation": "", "quantity": 2, "unit_price_exc_tax": "3.20", "line_total": "6.40"},
            {"name": "Croissant", "quantity": null}
        ],
        "subtotal_label": "Subtotal",
        "subtotal": "6.40",
        "total_label": "Total",
        "total": "6.40",
        "total_paid_label": "Total paid",
        "payments": [{"method": "Card", "amount": 6.4}],
        "tax_label": "Tax",
        "taxes": {"VAT 10%": "0.58"},
        "footer_text": "See you soon",
        "cash_drawer": 1
    })
    .to_string()
}

#[tokio::test]
async fn test_invoice_with_logo_reaches_device() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("lp0");
    let printer = printer_for(&device);

    let invoice = InvoiceData::from_json(&invoice_json(&logo_data_uri(48, 30))).unwrap();
    printer
        .print_invoice(&invoice, &LocalImageSource::new())
        .await
        .unwrap();

    let data = std::fs::read(&device).unwrap();
    let text = String::from_utf8_lossy(&data);

    // ESC @ then ESC t 16, center, line spacing 24, first band header
    assert_eq!(&data[..5], &[0x1B, 0x40, 0x1B, 0x74, 16]);
    assert_eq!(&data[5..8], &[0x1B, 0x61, 1]);
    assert_eq!(&data[8..11], &[0x1B, 0x33, 24]);
    assert_eq!(&data[11..16], &[0x1B, 0x2A, 33, 48, 0]);

    // 30 rows → 2 bands of 3 * 48 data bytes each
    let first_band = &data[16..16 + 144];
    assert!(first_band.chunks(3).all(|col| col == [0xFF, 0xFE, 0x00]));
    assert_eq!(data[16 + 144], b'\n');
    let second = 16 + 145;
    assert_eq!(&data[second..second + 5], &[0x1B, 0x2A, 33, 48, 0]);
    assert!(data[second + 5..second + 5 + 144].iter().all(|b| *b == 0));

    assert!(text.contains("Corner Cafe"));
    assert!(text.contains("Invoice No. 1001"));
    assert!(text.contains("2   Flat white"));
    assert!(text.contains("1   Croissant"));
    assert!(text.contains("VAT 10%"));
    assert!(data.ends_with(&[0x1D, 0x56, 0x41, 3, 0x1B, 0x70, 0, 60, 120]));
}

#[tokio::test]
async fn test_url_logo_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("lp0");
    let cache = dir.path().join("logos");
    std::fs::create_dir(&cache).unwrap();
    std::fs::write(cache.join("corner-cafe.png"), logo_png(48, 30)).unwrap();

    let source = HttpImageSource::new(&cache, LocalImageSource::new()).unwrap();
    let invoice =
        InvoiceData::from_json(&invoice_json("https://shop.invalid/uploads/corner-cafe.png")).unwrap();
    printer_for(&device).print_invoice(&invoice, &source).await.unwrap();

    let data = std::fs::read(&device).unwrap();
    assert_eq!(&data[11..16], &[0x1B, 0x2A, 33, 48, 0]);
}

#[tokio::test]
async fn test_broken_logo_still_prints_invoice() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("lp0");
    let printer = printer_for(&device);

    let invoice = InvoiceData::from_json(&invoice_json("data:image/png;base64,AAAA")).unwrap();
    printer
        .print_invoice(&invoice, &LocalImageSource::new())
        .await
        .unwrap();

    let data = std::fs::read(&device).unwrap();
    assert!(!data.windows(2).any(|w| w == [0x1B, 0x2A]));
    assert!(String::from_utf8_lossy(&data).contains("See you soon"));
}

#[tokio::test]
async fn test_open_drawer() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("lp0");
    printer_for(&device).open_drawer().await.unwrap();

    assert_eq!(
        std::fs::read(&device).unwrap(),
        vec![0x1B, 0x40, 0x1B, 0x74, 16, 0x1B, 0x70, 0, 60, 120]
    );
}

#[tokio::test]
async fn test_unreachable_directory_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let device = dir.path().join("missing").join("lp0");
    let err = printer_for(&device).open_drawer().await.unwrap_err();
    assert!(matches!(err, invoice_printer::PrintError::Connection(_)));
}
