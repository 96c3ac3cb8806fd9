//! Printer configuration
//!
//! A printer record names how to reach the printer and what it can do.
//! It can be read from JSON (the shape stored by the back office) or from
//! environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | PRINTER_CONNECTION_TYPE | network | `network`, `linux` or `windows` |
//! | PRINTER_IP | 127.0.0.1 | network printer address |
//! | PRINTER_PORT | 9100 | network printer port |
//! | PRINTER_PATH | /dev/usb/lp0 | device file or spooler queue name |
//! | PRINTER_CHARS_PER_LINE | 42 | text grid width |
//! | PRINTER_PROFILE | default | `default`, `simple` or `gbk` |
//! | PRINTER_RASTER_WIDTH | 576 | printable width in dots |
//! | PRINTER_LOGO_MAX_WIDTH | 200 | logo width cap in dots |
//! | PRINTER_TIMEOUT_SECS | 30 | network connect timeout |

use serde::{Deserialize, Serialize};

use crate::encoding::CapabilityProfile;
use crate::error::{PrintError, PrintResult};
use crate::preprocess::ToneAdjustment;

pub const DEFAULT_PORT: u16 = 9100;
pub const DEFAULT_CHARS_PER_LINE: usize = 42;
/// 72mm printable on 80mm paper at 203 dpi
pub const DEFAULT_RASTER_WIDTH: u32 = 576;
pub const DEFAULT_LOGO_MAX_WIDTH: u32 = 200;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// How the printer is reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "connection_type", rename_all = "lowercase")]
pub enum ConnectionConfig {
    /// Raw TCP
    Network {
        ip_address: String,
        #[serde(default = "default_port")]
        port: u16,
    },
    /// Device file such as /dev/usb/lp0
    Linux { path: String },
    /// OS print queue
    Windows { path: String },
}

/// Everything needed to render for and talk to one printer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterConfig {
    #[serde(flatten)]
    pub connection: ConnectionConfig,
    #[serde(default = "default_chars_per_line")]
    pub char_per_line: usize,
    #[serde(default)]
    pub capability_profile: CapabilityProfile,
    #[serde(default = "default_raster_width")]
    pub raster_width: u32,
    #[serde(default = "default_logo_max_width")]
    pub logo_max_width: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub tone: ToneAdjustment,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_chars_per_line() -> usize {
    DEFAULT_CHARS_PER_LINE
}

fn default_raster_width() -> u32 {
    DEFAULT_RASTER_WIDTH
}

fn default_logo_max_width() -> u32 {
    DEFAULT_LOGO_MAX_WIDTH
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl PrinterConfig {
    /// Config for a network printer with default capabilities
    pub fn network(ip_address: &str, port: u16) -> Self {
        Self::with_connection(ConnectionConfig::Network {
            ip_address: ip_address.to_string(),
            port,
        })
    }

    pub fn with_connection(connection: ConnectionConfig) -> Self {
        Self {
            connection,
            char_per_line: DEFAULT_CHARS_PER_LINE,
            capability_profile: CapabilityProfile::default(),
            raster_width: DEFAULT_RASTER_WIDTH,
            logo_max_width: DEFAULT_LOGO_MAX_WIDTH,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            tone: ToneAdjustment::default(),
        }
    }

    pub fn from_json(json: &str) -> PrintResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PrintError::InvalidConfig(format!("printer config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> PrintResult<Self> {
        let kind = env_or("PRINTER_CONNECTION_TYPE", "network");
        let connection = match kind.as_str() {
            "network" => ConnectionConfig::Network {
                ip_address: env_or("PRINTER_IP", "127.0.0.1"),
                port: env_parse("PRINTER_PORT", DEFAULT_PORT),
            },
            "linux" => ConnectionConfig::Linux {
                path: env_or("PRINTER_PATH", "/dev/usb/lp0"),
            },
            "windows" => ConnectionConfig::Windows {
                path: env_or("PRINTER_PATH", ""),
            },
            other => {
                return Err(PrintError::InvalidConfig(format!(
                    "unknown connection type: {}",
                    other
                )));
            }
        };

        let capability_profile = match env_or("PRINTER_PROFILE", "default").as_str() {
            "default" => CapabilityProfile::Default,
            "simple" => CapabilityProfile::Simple,
            "gbk" => CapabilityProfile::Gbk,
            other => {
                return Err(PrintError::InvalidConfig(format!(
                    "unknown capability profile: {}",
                    other
                )));
            }
        };

        let config = Self {
            connection,
            char_per_line: env_parse("PRINTER_CHARS_PER_LINE", DEFAULT_CHARS_PER_LINE),
            capability_profile,
            raster_width: env_parse("PRINTER_RASTER_WIDTH", DEFAULT_RASTER_WIDTH),
            logo_max_width: env_parse("PRINTER_LOGO_MAX_WIDTH", DEFAULT_LOGO_MAX_WIDTH),
            connect_timeout_secs: env_parse("PRINTER_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            tone: ToneAdjustment::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PrintResult<()> {
        if self.char_per_line == 0 {
            return Err(PrintError::InvalidConfig("char_per_line must be > 0".into()));
        }
        if self.raster_width == 0 || self.raster_width > u16::MAX as u32 {
            return Err(PrintError::InvalidConfig(format!(
                "raster_width out of range: {}",
                self.raster_width
            )));
        }
        match &self.connection {
            ConnectionConfig::Linux { path } | ConnectionConfig::Windows { path } if path.is_empty() => {
                Err(PrintError::InvalidConfig("printer path is empty".into()))
            }
            _ => Ok(()),
        }
    }

    /// Widest logo that may be sent, in dots
    pub fn logo_width_limit(&self) -> u32 {
        self.logo_max_width.min(self.raster_width)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
