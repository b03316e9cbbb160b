//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, static files)
//!     → dispatch.rs (resolve identity, pick group and route, check access)
//!     → pages.rs (run the handler)
//!     → response.rs (outcome to status, headers, JSON view)
//! ```
//!
//! Route tables live in routes.rs.

pub mod dispatch;
pub mod pages;
pub mod response;
pub mod routes;
pub mod server;

pub use dispatch::{Access, Decision, RequestDispatcher, RouteGroup};
pub use pages::Pages;
pub use response::Outcome;
pub use routes::{build_dispatcher, Page};
pub use server::{AppState, HttpServer};
