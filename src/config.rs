//! # Configuration Management
//!
//! Centralized configuration for packet construction, wire encoding and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Environment variables (`STREAM_PACKET_*`) via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Example
//! ```toml
//! [factory]
//! max_payload_size = 4194304
//! struct_format = "msgpack"
//! stamp_capture_time = true
//! default_series = "lobby-cam"
//!
//! [wire]
//! compression_enabled = true
//! compression_kind = "lz4"
//! compression_threshold_bytes = 512
//! max_frame_payload = 16777216
//! ```

use crate::core::packet::WireOptions;
use crate::core::serialization::SerializationFormat;
use crate::error::{PacketError, Result};
use crate::utils::compression::CompressionKind;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Current packet wire version
pub const PACKET_VERSION: u8 = 1;

/// Magic bytes to identify packets ("VAPK")
pub const MAGIC_BYTES: [u8; 4] = *b"VAPK";

/// Max allowed payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Max allowed encoded header size (64 KB)
pub const MAX_HEADER_SIZE: usize = 64 * 1024;

/// Whether to enable compression by default
pub const ENABLE_COMPRESSION: bool = false;

/// Max length of a series name
pub const MAX_SERIES_NAME_LEN: usize = 256;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BridgeConfig {
    /// Packet factory configuration
    #[serde(default)]
    pub factory: FactoryConfig,

    /// Wire encoding configuration
    #[serde(default)]
    pub wire: WireConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| PacketError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| PacketError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| PacketError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup, starting from defaults
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(size) = lookup("STREAM_PACKET_MAX_PAYLOAD_SIZE") {
            config.factory.max_payload_size = parse_env("STREAM_PACKET_MAX_PAYLOAD_SIZE", &size)?;
        }

        if let Some(format) = lookup("STREAM_PACKET_STRUCT_FORMAT") {
            config.factory.struct_format = match format.to_ascii_lowercase().as_str() {
                "json" => SerializationFormat::Json,
                "msgpack" => SerializationFormat::MessagePack,
                "bincode" => SerializationFormat::Bincode,
                other => {
                    return Err(PacketError::ConfigError(format!(
                        "Invalid STREAM_PACKET_STRUCT_FORMAT: '{other}'"
                    )))
                }
            };
        }

        if let Some(series) = lookup("STREAM_PACKET_DEFAULT_SERIES") {
            config.factory.default_series = Some(series);
        }

        if let Some(compression) = lookup("STREAM_PACKET_COMPRESSION") {
            match compression.to_ascii_lowercase().as_str() {
                "off" | "none" => config.wire.compression_enabled = false,
                "lz4" => {
                    config.wire.compression_enabled = true;
                    config.wire.compression_kind = CompressionKind::Lz4;
                }
                "zstd" => {
                    config.wire.compression_enabled = true;
                    config.wire.compression_kind = CompressionKind::Zstd;
                }
                other => {
                    return Err(PacketError::ConfigError(format!(
                        "Invalid STREAM_PACKET_COMPRESSION: '{other}'"
                    )))
                }
            }
        }

        if let Some(threshold) = lookup("STREAM_PACKET_COMPRESSION_THRESHOLD") {
            config.wire.compression_threshold_bytes =
                parse_env("STREAM_PACKET_COMPRESSION_THRESHOLD", &threshold)?;
        }

        if let Some(level) = lookup("STREAM_PACKET_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                PacketError::ConfigError(format!("Invalid STREAM_PACKET_LOG_LEVEL: '{level}'"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PacketError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| PacketError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(self.factory.validate());
        errors.extend(self.wire.validate());
        errors.extend(self.logging.validate());

        if self.factory.max_payload_size > self.wire.max_frame_payload {
            errors.push(format!(
                "Factory max payload size ({}) exceeds wire frame limit ({})",
                self.factory.max_payload_size, self.wire.max_frame_payload
            ));
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PacketError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| PacketError::ConfigError(format!("Invalid {key}: '{value}'")))
}

/// Packet factory configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FactoryConfig {
    /// Maximum serialized payload size in bytes
    pub max_payload_size: usize,

    /// Encoding for structured payloads (`json` or `msgpack`)
    pub struct_format: SerializationFormat,

    /// Whether to stamp packets with the current time
    pub stamp_capture_time: bool,

    /// Series name applied when a call does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_series: Option<String>,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD_SIZE,
            struct_format: SerializationFormat::default(),
            stamp_capture_time: true,
            default_series: None,
        }
    }
}

impl FactoryConfig {
    /// Validate factory configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_payload_size == 0 {
            errors.push("Max payload size cannot be 0".to_string());
        } else if self.max_payload_size > MAX_PAYLOAD_SIZE {
            errors.push(format!(
                "Max payload size too large: {} bytes (wire limit: {MAX_PAYLOAD_SIZE})",
                self.max_payload_size
            ));
        }

        if !self.struct_format.is_self_describing() {
            errors.push(format!(
                "Struct format '{}' is not self-describing (use json or msgpack)",
                self.struct_format.name()
            ));
        }

        if let Some(ref series) = self.default_series {
            if series.is_empty() {
                errors.push("Default series name cannot be empty".to_string());
            } else if series.len() > MAX_SERIES_NAME_LEN {
                errors.push(format!(
                    "Default series name too long: {} characters (maximum: {MAX_SERIES_NAME_LEN})",
                    series.len()
                ));
            }
        }

        errors
    }
}

/// Wire encoding configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireConfig {
    /// Whether to compress payloads on encode
    pub compression_enabled: bool,

    /// Compression algorithm
    pub compression_kind: CompressionKind,

    /// Minimum payload size (bytes) before compression is attempted
    #[serde(default)]
    pub compression_threshold_bytes: usize,

    /// Maximum payload bytes accepted in one frame
    pub max_frame_payload: usize,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            compression_enabled: ENABLE_COMPRESSION,
            compression_kind: CompressionKind::Lz4,
            compression_threshold_bytes: 512,
            max_frame_payload: MAX_PAYLOAD_SIZE,
        }
    }
}

impl WireConfig {
    /// Validate wire configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_frame_payload == 0 {
            errors.push("Max frame payload cannot be 0".to_string());
        } else if self.max_frame_payload > MAX_PAYLOAD_SIZE {
            errors.push(format!(
                "Max frame payload too large: {} bytes (wire limit: {MAX_PAYLOAD_SIZE})",
                self.max_frame_payload
            ));
        }

        if self.compression_enabled && self.compression_threshold_bytes > self.max_frame_payload {
            errors.push("Compression threshold cannot be larger than max frame payload".to_string());
        }

        errors
    }

    /// Encoder options derived from this configuration
    pub fn wire_options(&self) -> WireOptions {
        WireOptions {
            compression: self.compression_enabled.then_some(self.compression_kind),
            compression_threshold_bytes: self.compression_threshold_bytes,
            max_payload_size: self.max_frame_payload,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("stream-packet"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
