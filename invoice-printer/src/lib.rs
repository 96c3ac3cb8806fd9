//! # invoice-printer
//!
//! Renders invoices and receipts into ESC/POS byte streams for thermal
//! line printers and sends them over a network socket, a device file or
//! the OS spooler.
//!
//! ## Pipeline
//!
//! Text and images are independent pure transforms that interleave in
//! document order:
//! - Text: invoice fields → [`TextColumnFormatter`] → fixed-width lines
//! - Images: bytes → [`ImagePreprocessor`] → [`IntensityMatrix`] →
//!   [`dither`] → [`Bitmap`] → [`raster::encode`]
//!
//! Only decoding, fetching and the transport can fail.
//!
//! Logos come from an [`ImageSource`]: inline `data:` URIs and local files
//! via [`LocalImageSource`], or URLs downloaded and cached on disk via
//! [`HttpImageSource`].
//!
//! ## Example
//!
//! ```ignore
//! use invoice_printer::{InvoiceData, InvoicePrinter, LocalImageSource, PrinterConfig};
//!
//! let printer = InvoicePrinter::new(PrinterConfig::network("192.168.1.100", 9100))?;
//! let invoice = InvoiceData::from_json(&json)?;
//! printer.print_invoice(&invoice, &LocalImageSource::new()).await?;
//! ```

mod config;
pub mod dither;
mod encoding;
mod error;
mod escpos;
mod invoice;
mod job;
pub mod layout;
pub mod logger;
mod matrix;
mod preprocess;
pub mod raster;
mod renderer;
mod source;
mod transport;

// Re-exports
pub use config::{ConnectionConfig, PrinterConfig};
pub use dither::dither;
pub use encoding::CapabilityProfile;
pub use error::{PrintError, PrintResult};
pub use escpos::{EscPosBuilder, Justification};
pub use invoice::{InvoiceData, LineItem, Payment};
pub use job::{InvoicePrinter, send_to};
pub use layout::{ColumnSpec, RightAlign, TextColumnFormatter};
pub use matrix::{Bitmap, IntensityMatrix};
pub use preprocess::{ImagePreprocessor, ToneAdjustment};
pub use renderer::InvoiceRenderer;
pub use source::{HttpImageSource, ImageSource, LocalImageSource, NoImages};
pub use transport::{Connector, FileConnector, NetworkConnector, SpoolerConnector, Transport};
