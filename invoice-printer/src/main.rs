//! invoice-print - send an invoice to a thermal printer
//!
//! Usage:
//!   invoice-print print <invoice.json> [printer.json]
//!   invoice-print render <invoice.json> <out.bin> [printer.json]
//!   invoice-print drawer [printer.json]
//!
//! Without a printer JSON the printer is configured from PRINTER_* variables.
//! Logos: LOGO_DIR (local logos, default next to the invoice) and
//! LOGO_CACHE_DIR (downloaded logos, default LOGO_DIR/logos).
//! Logging: LOG_LEVEL (default info), LOG_JSON=1, LOG_DIR.

use std::path::PathBuf;

use anyhow::{Context, bail};
use invoice_printer::{
    HttpImageSource, InvoiceData, InvoicePrinter, LocalImageSource, PrinterConfig, logger,
};

fn load_printer(path: Option<&String>) -> anyhow::Result<PrinterConfig> {
    let config = match path {
        Some(p) => {
            let json = std::fs::read_to_string(p).with_context(|| format!("reading {}", p))?;
            PrinterConfig::from_json(&json)?
        }
        None => PrinterConfig::from_env()?,
    };
    Ok(config)
}

fn load_invoice(path: &str) -> anyhow::Result<InvoiceData> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    InvoiceData::from_json(&json).with_context(|| format!("parsing {}", path))
}

/// Logos referenced by relative path are looked up next to the invoice;
/// URLs are downloaded once into the cache directory
fn image_source(invoice_path: &str) -> anyhow::Result<HttpImageSource> {
    let base_dir = match std::env::var("LOGO_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => PathBuf::from(invoice_path)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default(),
    };
    let cache_dir = std::env::var("LOGO_CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| base_dir.join("logos"));

    let source = HttpImageSource::new(cache_dir, LocalImageSource::with_base_dir(base_dir))?;
    Ok(source)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let json = std::env::var("LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    let log_dir = std::env::var("LOG_DIR").ok();
    logger::init_logger(&level, json, log_dir.as_deref())?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("print") => {
            let invoice_path = args.get(1).context("missing <invoice.json>")?;
            let printer = InvoicePrinter::new(load_printer(args.get(2))?)?;
            let invoice = load_invoice(invoice_path)?;
            printer
                .print_invoice(&invoice, &image_source(invoice_path)?)
                .await?;
            tracing::info!(invoice_no = %invoice.invoice_no, "invoice printed");
        }
        Some("render") => {
            let invoice_path = args.get(1).context("missing <invoice.json>")?;
            let out = args.get(2).context("missing <out.bin>")?;
            let printer = InvoicePrinter::new(load_printer(args.get(3))?)?;
            let invoice = load_invoice(invoice_path)?;
            let data = printer
                .render_invoice(&invoice, &image_source(invoice_path)?)
                .await;
            std::fs::write(out, &data).with_context(|| format!("writing {}", out))?;
            tracing::info!(bytes = data.len(), out = %out, "invoice rendered");
        }
        Some("drawer") => {
            let printer = InvoicePrinter::new(load_printer(args.get(1))?)?;
            printer.open_drawer().await?;
            tracing::info!("cash drawer opened");
        }
        _ => bail!(
            "usage: invoice-print print <invoice.json> [printer.json] | render <invoice.json> <out.bin> [printer.json] | drawer [printer.json]"
        ),
    }

    Ok(())
}
