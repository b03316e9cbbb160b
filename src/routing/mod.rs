//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered route lookup)
//!     → matcher.rs (segment count + literal comparison, parameter binding)
//!     → Return: RouteMatch { pattern, value, params } or no match
//!
//! Route Registration (at startup):
//!     (method, template, payload)[]
//!     → Parse templates into segments
//!     → Reject malformed templates (fatal)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - No regex, no wildcards
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod router;

pub use matcher::{Method, PathPattern, RouteError, Segment};
pub use router::{RouteMatch, Router};
