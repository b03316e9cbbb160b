//! Inkwell: the serving core of a small blog.
//!
//! Path routing with named parameters, cookie and ticket based sessions,
//! and a dispatcher that puts the two together in front of the page
//! handlers.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::BlogConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
