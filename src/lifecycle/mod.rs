//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Open store → Default users → Resolver → Route tables
//!
//! Shutdown (shutdown.rs):
//!     Trigger (watch flag) → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a malformed route table or unreadable store stops startup
//! - Listener binds last, so traffic only arrives once the app is built

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownListener};
pub use startup::{build_app, App, StartupError};
