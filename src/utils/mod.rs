//! # Utility Modules
//!
//! Supporting utilities used throughout the crate.
//!
//! ## Components
//! - **Compression**: LZ4 and Zstd with output limits and entropy-adaptive skipping
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Thread-safe observability counters
//! - **Time**: Capture timestamps

pub mod compression;
pub mod logging;
pub mod metrics;
pub mod time;

pub use metrics::{Metrics, MetricsSnapshot};
