//! Print jobs
//!
//! Ties a printer config, the image pipeline, the renderer and a transport
//! together. Logo failures are logged and the invoice prints without it;
//! transport failures abort the job.

use tracing::{info, instrument, warn};

use crate::config::PrinterConfig;
use crate::dither::dither;
use crate::error::{PrintError, PrintResult};
use crate::invoice::{InvoiceData, is_present};
use crate::matrix::Bitmap;
use crate::preprocess::ImagePreprocessor;
use crate::renderer::InvoiceRenderer;
use crate::source::ImageSource;
use crate::transport::{Connector, DEFAULT_DOCUMENT, Transport};

/// Renders and prints invoices on one printer
pub struct InvoicePrinter {
    config: PrinterConfig,
    renderer: InvoiceRenderer,
    preprocessor: ImagePreprocessor,
}

impl InvoicePrinter {
    pub fn new(config: PrinterConfig) -> PrintResult<Self> {
        config.validate()?;
        Ok(Self {
            renderer: InvoiceRenderer::new(config.char_per_line, config.capability_profile),
            preprocessor: ImagePreprocessor::new(config.tone),
            config,
        })
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Fetch, shrink and dither a logo for this printer
    ///
    /// Decoding and dithering run on the blocking pool.
    pub async fn load_logo<S: ImageSource>(&self, reference: &str, source: &S) -> PrintResult<Bitmap> {
        let bytes = source.fetch(reference).await?;
        let preprocessor = self.preprocessor.clone();
        let max_width = self.config.logo_width_limit();

        tokio::task::spawn_blocking(move || -> PrintResult<Bitmap> {
            let matrix = preprocessor.preprocess_fit(&bytes, max_width)?;
            Ok(dither(matrix))
        })
        .await
        .map_err(|e| PrintError::ImageUnavailable(format!("image task failed: {}", e)))?
    }

    /// Render the complete byte stream for an invoice
    ///
    /// An unavailable or undecodable logo is skipped.
    #[instrument(skip(self, invoice, source), fields(invoice_no = %invoice.invoice_no))]
    pub async fn render_invoice<S: ImageSource>(&self, invoice: &InvoiceData, source: &S) -> Vec<u8> {
        let logo = if is_present(&invoice.logo) {
            match self.load_logo(&invoice.logo, source).await {
                Ok(bmp) => {
                    info!(width = bmp.width(), height = bmp.height(), "logo ready");
                    Some(bmp)
                }
                Err(e) => {
                    warn!(error = %e, "logo skipped, continuing without it");
                    None
                }
            }
        } else {
            None
        };

        self.renderer.render(invoice, logo.as_ref())
    }

    /// Render and send an invoice to the configured printer
    pub async fn print_invoice<S: ImageSource>(&self, invoice: &InvoiceData, source: &S) -> PrintResult<()> {
        let data = self.render_invoice(invoice, source).await;
        info!(bytes = data.len(), "invoice rendered");
        let document = format!("{} {}", DEFAULT_DOCUMENT, invoice.invoice_no);
        self.send(document.trim_end(), &data).await
    }

    /// Kick the cash drawer
    pub async fn open_drawer(&self) -> PrintResult<()> {
        let data = self.renderer.render_drawer_pulse();
        self.send("Cash drawer", &data).await
    }

    async fn send(&self, document: &str, data: &[u8]) -> PrintResult<()> {
        let mut transport = Connector::open(&self.config, document).await?;
        send_to(&mut transport, data).await
    }
}

/// Write a job to a transport and close it
pub async fn send_to<T: Transport>(transport: &mut T, data: &[u8]) -> PrintResult<()> {
    transport.write(data).await?;
    transport.close().await
}
