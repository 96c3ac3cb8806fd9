//! Image sources for logos
//!
//! The renderer only needs the encoded bytes of an image. Where those bytes
//! come from (files, inline data URIs, a web server) is decided by an
//! [`ImageSource`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, instrument, warn};

use crate::error::{PrintError, PrintResult};

/// Download timeout for remote logos
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Supplies encoded image bytes for a reference string
#[allow(async_fn_in_trait)]
pub trait ImageSource {
    /// Fetch the bytes for `reference`, or `PrintError::ImageUnavailable`
    async fn fetch(&self, reference: &str) -> PrintResult<Vec<u8>>;
}

/// Source that never has an image
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageSource for NoImages {
    async fn fetch(&self, reference: &str) -> PrintResult<Vec<u8>> {
        Err(PrintError::ImageUnavailable(reference.to_string()))
    }
}

/// Reads `data:` URIs and files on the local disk
///
/// Relative paths resolve against `base_dir` when one is set.
#[derive(Debug, Clone, Default)]
pub struct LocalImageSource {
    base_dir: Option<PathBuf>,
}

impl LocalImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageSource for LocalImageSource {
    #[instrument(skip(self, reference), fields(reference = %truncate(reference)))]
    async fn fetch(&self, reference: &str) -> PrintResult<Vec<u8>> {
        if let Some(rest) = reference.strip_prefix("data:") {
            return decode_data_uri(rest);
        }

        if is_remote(reference) {
            return Err(PrintError::ImageUnavailable(format!(
                "remote image without a downloader: {}",
                reference
            )));
        }

        let path = self.resolve(reference);
        debug!(path = %path.display(), "reading image file");
        tokio::fs::read(&path)
            .await
            .map_err(|e| PrintError::ImageUnavailable(format!("{}: {}", path.display(), e)))
    }
}

/// Downloads `http(s)` logos and keeps them in a cache directory
///
/// The cache is keyed by the URL's file name, so a logo is fetched once
/// and read from disk on every later print. Anything that is not a URL is
/// handed to the wrapped [`LocalImageSource`].
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
    cache_dir: PathBuf,
    local: LocalImageSource,
}

impl HttpImageSource {
    pub fn new(cache_dir: impl Into<PathBuf>, local: LocalImageSource) -> PrintResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| PrintError::InvalidConfig(format!("HTTP client: {}", e)))?;
        Ok(Self::with_client(client, cache_dir, local))
    }

    pub fn with_client(client: reqwest::Client, cache_dir: impl Into<PathBuf>, local: LocalImageSource) -> Self {
        Self {
            client,
            cache_dir: cache_dir.into(),
            local,
        }
    }

    /// Where the download of `url` is cached, if its file name is usable
    pub fn cache_path(&self, url: &str) -> Option<PathBuf> {
        cache_key(url).map(|name| self.cache_dir.join(name))
    }

    async fn download(&self, url: &str) -> PrintResult<Vec<u8>> {
        info!(url = %url, "downloading logo");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PrintError::ImageUnavailable(format!("{}: {}", url, e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PrintError::ImageUnavailable(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }

    async fn store(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let partial = path.with_extension("part");
        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, path).await
    }
}

impl ImageSource for HttpImageSource {
    #[instrument(skip(self, reference), fields(reference = %truncate(reference)))]
    async fn fetch(&self, reference: &str) -> PrintResult<Vec<u8>> {
        if !is_remote(reference) {
            return self.local.fetch(reference).await;
        }

        let cached = self.cache_path(reference);
        if let Some(path) = &cached {
            if let Ok(bytes) = tokio::fs::read(path).await {
                debug!(path = %path.display(), bytes = bytes.len(), "logo cache hit");
                return Ok(bytes);
            }
        }

        let bytes = self.download(reference).await?;

        // Error pages served with 200 must not poison the cache
        match cached {
            Some(path) if image::guess_format(&bytes).is_ok() => {
                if let Err(e) = self.store(&path, &bytes).await {
                    warn!(path = %path.display(), error = %e, "logo not cached");
                }
            }
            _ => debug!("download not cached"),
        }
        Ok(bytes)
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// File name of a URL path, restricted to a safe character set
fn cache_key(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or("");
    let after_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
    let (_, file) = after_scheme.rsplit_once('/')?;
    let name: String = file
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    if name.is_empty() || name.chars().all(|c| c == '.') {
        return None;
    }
    Some(name)
}

/// Decode the part of a data URI after `data:`
fn decode_data_uri(rest: &str) -> PrintResult<Vec<u8>> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| PrintError::ImageUnavailable("malformed data URI".to_string()))?;

    if !meta.ends_with(";base64") {
        return Err(PrintError::ImageUnavailable(
            "data URI is not base64 encoded".to_string(),
        ));
    }

    STANDARD
        .decode(payload.trim())
        .map_err(|e| PrintError::ImageUnavailable(format!("invalid base64: {}", e)))
}

/// Keep long data URIs out of log lines
fn truncate(s: &str) -> &str {
    match s.char_indices().nth(64) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
