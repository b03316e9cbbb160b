//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields: login, path, request id)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs (fmt subscriber on stdout, EnvFilter)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (UUID v4) set by tower-http and attached to the trace span
//! - Passwords and salts never appear in log fields

pub mod logging;
pub mod metrics;
