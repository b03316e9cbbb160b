//! Route lookup.
//!
//! # Responsibilities
//! - Store registered patterns with their payload, in registration order
//! - Look up the first pattern matching a request method and path
//! - Return the match with its bound parameters, or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after startup (shared via `Arc`, read without locks)
//! - O(n) scan; route tables are small and static
//! - Registration order decides between overlapping patterns, not specificity

use std::collections::HashMap;

use crate::routing::matcher::{split_path, Method, PathPattern, RouteError};

/// Ordered route table carrying a payload per pattern.
#[derive(Debug, Clone)]
pub struct Router<T> {
    routes: Vec<(PathPattern, T)>,
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    pub pattern: &'a PathPattern,
    pub value: &'a T,
    pub params: HashMap<String, String>,
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a route. Fails only when the template is malformed.
    pub fn add(&mut self, method: Method, template: &str, value: T) -> Result<(), RouteError> {
        let pattern = PathPattern::parse(method, template)?;
        self.routes.push((pattern, value));
        Ok(())
    }

    /// Find the first registered route for `method` and `path`.
    ///
    /// The query string must already be stripped from `path`.
    pub fn match_route(&self, method: Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let segments = split_path(path);
        self.routes.iter().find_map(|(pattern, value)| {
            pattern
                .matches(method, &segments)
                .map(|params| RouteMatch { pattern, value, params })
        })
    }

    /// Registered routes in order.
    pub fn routes(&self) -> impl Iterator<Item = (&PathPattern, &T)> {
        self.routes.iter().map(|(p, v)| (p, v))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}
