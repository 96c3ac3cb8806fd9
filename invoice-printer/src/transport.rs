//! Transports for sending ESC/POS data
//!
//! Supports:
//! - Network printers (raw TCP, usually port 9100)
//! - Device files (e.g. /dev/usb/lp0)
//! - OS print spoolers (Win32 RAW jobs on Windows, `lp -o raw` elsewhere)

use std::net::SocketAddr;
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

use crate::config::{ConnectionConfig, PrinterConfig};
use crate::error::{PrintError, PrintResult};

/// Job name used when the caller gives none
pub const DEFAULT_DOCUMENT: &str = "Invoice";

/// Byte sink for a print job
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send bytes, in document order
    async fn write(&mut self, data: &[u8]) -> PrintResult<()>;

    /// Finish the job and release the connection
    async fn close(&mut self) -> PrintResult<()>;
}

/// The transport variants a printer config can select
#[derive(Debug)]
pub enum Connector {
    Network(NetworkConnector),
    File(FileConnector),
    Spooler(SpoolerConnector),
}

impl Connector {
    /// Open the transport named by the printer config
    ///
    /// `document` names the job where the transport has job names (spoolers).
    #[instrument(skip(config), fields(connection = ?config.connection))]
    pub async fn open(config: &PrinterConfig, document: &str) -> PrintResult<Self> {
        let connector = match &config.connection {
            ConnectionConfig::Network { ip_address, port } => Connector::Network(
                NetworkConnector::connect(
                    ip_address,
                    *port,
                    Duration::from_secs(config.connect_timeout_secs),
                )
                .await?,
            ),
            ConnectionConfig::Linux { path } => Connector::File(FileConnector::open(path).await?),
            ConnectionConfig::Windows { path } => {
                Connector::Spooler(SpoolerConnector::new(path).with_document(document))
            }
        };
        Ok(connector)
    }
}

impl Transport for Connector {
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        match self {
            Connector::Network(c) => c.write(data).await,
            Connector::File(c) => c.write(data).await,
            Connector::Spooler(c) => c.write(data).await,
        }
    }

    async fn close(&mut self) -> PrintResult<()> {
        match self {
            Connector::Network(c) => c.close().await,
            Connector::File(c) => c.close().await,
            Connector::Spooler(c) => c.close().await,
        }
    }
}

/// Network printer (raw TCP)
///
/// Most thermal printers accept raw print data on port 9100.
#[derive(Debug)]
pub struct NetworkConnector {
    addr: SocketAddr,
    stream: Option<TcpStream>,
}

impl NetworkConnector {
    /// Parse `host:port` into a socket address
    pub fn parse_addr(host: &str, port: u16) -> PrintResult<SocketAddr> {
        let addr_str = format!("{}:{}", host, port);
        addr_str
            .parse()
            .map_err(|_| PrintError::InvalidConfig(format!("Invalid address: {}", addr_str)))
    }

    /// Connect with a timeout
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> PrintResult<Self> {
        let addr = Self::parse_addr(host, port)?;
        info!(%addr, "Connecting to printer");

        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", addr, e)))?;

        Ok(Self {
            addr,
            stream: Some(stream),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Transport for NetworkConnector {
    #[instrument(skip(self, data), fields(addr = %self.addr, data_len = data.len()))]
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| PrintError::Write(format!("{}: connection closed", self.addr)))?;

        stream
            .write_all(data)
            .await
            .map_err(|e| PrintError::Write(format!("{}: {}", self.addr, e)))
    }

    async fn close(&mut self) -> PrintResult<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.flush().await?;
            stream.shutdown().await?;
            info!(addr = %self.addr, "Print job sent");
        }
        Ok(())
    }
}

/// Device file printer (Linux /dev/usb/lp*, or any file for capture)
#[derive(Debug)]
pub struct FileConnector {
    path: String,
    file: Option<File>,
}

impl FileConnector {
    pub async fn open(path: &str) -> PrintResult<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(|e| PrintError::Connection(format!("{}: {}", path, e)))?;

        Ok(Self {
            path: path.to_string(),
            file: Some(file),
        })
    }
}

impl Transport for FileConnector {
    #[instrument(skip(self, data), fields(path = %self.path, data_len = data.len()))]
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| PrintError::Write(format!("{}: file closed", self.path)))?;

        file.write_all(data)
            .await
            .map_err(|e| PrintError::Write(format!("{}: {}", self.path, e)))
    }

    async fn close(&mut self) -> PrintResult<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await.or_else(|e| {
                // Character devices often refuse fsync
                warn!(path = %self.path, error = %e, "sync failed");
                Ok::<(), std::io::Error>(())
            })?;
        }
        Ok(())
    }
}

/// OS spooler queue
///
/// Spoolers take whole jobs, so writes are buffered and submitted as one
/// RAW document on close. A failed submission keeps the buffer, so `close`
/// can be retried.
#[derive(Debug)]
pub struct SpoolerConnector {
    queue: String,
    document: String,
    buf: Vec<u8>,
    submitted: bool,
}

impl SpoolerConnector {
    pub fn new(queue: &str) -> Self {
        Self {
            queue: queue.to_string(),
            document: DEFAULT_DOCUMENT.to_string(),
            buf: Vec::new(),
            submitted: false,
        }
    }

    /// Job name shown in the print queue
    pub fn with_document(mut self, document: &str) -> Self {
        if !document.trim().is_empty() {
            self.document = document.to_string();
        }
        self
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    #[cfg(windows)]
    async fn submit(&self) -> PrintResult<()> {
        let job = spool::RawJob {
            queue: self.queue.clone(),
            document: self.document.clone(),
            data: self.buf.clone(),
        };
        tokio::task::spawn_blocking(move || job.submit())
            .await
            .map_err(|e| PrintError::Spooler(format!("{}: spool task failed: {}", self.queue, e)))?
    }

    #[cfg(not(windows))]
    async fn submit(&self) -> PrintResult<()> {
        use std::process::Stdio;
        use tokio::process::Command;

        let mut child = Command::new("lp")
            .args(["-d", &self.queue, "-t", &self.document, "-o", "raw"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PrintError::Spooler(format!("{}: lp: {}", self.queue, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&self.buf)
                .await
                .map_err(|e| PrintError::Write(format!("{}: lp stdin: {}", self.queue, e)))?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(PrintError::Spooler(format!(
                "{}: lp exited with {}: {}",
                self.queue,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Transport for SpoolerConnector {
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        if self.submitted {
            return Err(PrintError::Write(format!("{}: job already submitted", self.queue)));
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    #[instrument(skip(self), fields(queue = %self.queue, document = %self.document, data_len = self.buf.len()))]
    async fn close(&mut self) -> PrintResult<()> {
        if self.submitted {
            return Ok(());
        }
        self.submit().await?;
        self.submitted = true;
        self.buf.clear();
        info!("Print job spooled");
        Ok(())
    }
}

/// Win32 RAW spooling
///
/// Each handle is released by a guard, so every early return unwinds the
/// page, document and printer in reverse order.
#[cfg(windows)]
mod spool {
    use core::ffi::c_void;

    use windows::Win32::Graphics::Printing::{
        ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, OpenPrinterW, PRINTER_HANDLE,
        StartDocPrinterW, StartPagePrinter, WritePrinter,
    };
    use windows::core::{PCWSTR, PWSTR};

    use crate::error::{PrintError, PrintResult};

    /// One RAW document for one queue
    pub struct RawJob {
        pub queue: String,
        pub document: String,
        pub data: Vec<u8>,
    }

    struct Printer(PRINTER_HANDLE);

    impl Drop for Printer {
        fn drop(&mut self) {
            unsafe {
                let _ = ClosePrinter(self.0);
            }
        }
    }

    struct Document<'a>(&'a Printer);

    impl Drop for Document<'_> {
        fn drop(&mut self) {
            unsafe {
                let _ = EndDocPrinter((self.0).0);
            }
        }
    }

    struct Page<'a>(&'a Printer);

    impl Drop for Page<'_> {
        fn drop(&mut self) {
            unsafe {
                let _ = EndPagePrinter((self.0).0);
            }
        }
    }

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    impl RawJob {
        pub fn submit(&self) -> PrintResult<()> {
            let fail = |step: &str| PrintError::Spooler(format!("{}: {} failed", self.queue, step));

            let queue = wide(&self.queue);
            let mut handle = PRINTER_HANDLE::default();
            unsafe { OpenPrinterW(PCWSTR::from_raw(queue.as_ptr()), &mut handle, None) }
                .map_err(|_| fail("OpenPrinter"))?;
            let printer = Printer(handle);

            let mut name = wide(&self.document);
            let mut datatype = wide("RAW");
            let info = DOC_INFO_1W {
                pDocName: PWSTR(name.as_mut_ptr()),
                pOutputFile: PWSTR::null(),
                pDatatype: PWSTR(datatype.as_mut_ptr()),
            };
            if unsafe { StartDocPrinterW(printer.0, 1, &info) } == 0 {
                return Err(fail("StartDocPrinter"));
            }
            let _document = Document(&printer);

            if !unsafe { StartPagePrinter(printer.0) }.as_bool() {
                return Err(fail("StartPagePrinter"));
            }
            let _page = Page(&printer);

            let len = u32::try_from(self.data.len())
                .map_err(|_| PrintError::Write(format!("{}: job too large", self.queue)))?;
            let mut written = 0u32;
            let ok = unsafe {
                WritePrinter(printer.0, self.data.as_ptr() as *const c_void, len, &mut written)
            };
            if !ok.as_bool() {
                return Err(PrintError::Write(format!("{}: WritePrinter failed", self.queue)));
            }
            if written != len {
                return Err(PrintError::Write(format!(
                    "{}: wrote {} of {} bytes",
                    self.queue, written, len
                )));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        let addr = NetworkConnector::parse_addr("192.168.1.100", 9100).unwrap();
        assert_eq!(addr.port(), 9100);
        assert!(NetworkConnector::parse_addr("not an address", 9100).is_err());
    }

    #[tokio::test]
    async fn test_file_connector_writes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lp0");
        let path_str = path.to_str().unwrap();

        let mut conn = FileConnector::open(path_str).await.unwrap();
        conn.write(b"\x1B@").await.unwrap();
        conn.write(b"hello\n").await.unwrap();
        conn.close().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"\x1B@hello\n");
        assert!(matches!(conn.write(b"late").await, Err(PrintError::Write(_))));
    }

    #[tokio::test]
    async fn test_network_connector_sends_bytes() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut got = Vec::new();
            sock.read_to_end(&mut got).await.unwrap();
            got
        });

        let mut conn = NetworkConnector::connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
        conn.write(b"receipt").await.unwrap();
        conn.close().await.unwrap();

        assert_eq!(server.await.unwrap(), b"receipt");
    }

    #[tokio::test]
    async fn test_spooler_rejects_writes_after_submit() {
        let mut conn = SpoolerConnector::new("POS-80");
        conn.submitted = true;
        assert!(matches!(conn.write(b"x").await, Err(PrintError::Write(_))));
        assert!(conn.close().await.is_ok());
    }

    #[test]
    fn test_spooler_document_name() {
        assert_eq!(SpoolerConnector::new("POS-80").document(), DEFAULT_DOCUMENT);
        let conn = SpoolerConnector::new("POS-80").with_document("Invoice 1001");
        assert_eq!(conn.document(), "Invoice 1001");
        assert_eq!(SpoolerConnector::new("POS-80").with_document(" ").document(), DEFAULT_DOCUMENT);
    }

    #[cfg(not(windows))]
    #[tokio::test]
    async fn test_failed_submission_keeps_job() {
        let mut conn = SpoolerConnector::new("no-such-queue-7f3a");
        conn.write(b"receipt").await.unwrap();

        assert!(conn.close().await.is_err());
        assert!(!conn.submitted);
        assert_eq!(conn.buf, b"receipt");
        assert!(conn.close().await.is_err());
    }
}
