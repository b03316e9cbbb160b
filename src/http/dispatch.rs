//! Request dispatch: identity, route group, route, access check.
//!
//! # Responsibilities
//! - Resolve the caller once per request
//! - Pick the route group owning the path (longest prefix)
//! - Match the route and enforce its access requirement
//! - Hand the handler tag and parameters back to the caller
//!
//! # Design Decisions
//! - The handler is never reached for a protected route without an
//!   authenticated identity
//! - Not found and not authorized are outcomes, not errors

use axum_extra::extract::cookie::CookieJar;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{Identity, SessionResolver};
use crate::routing::{Method, PathPattern, RouteError, Router};

/// Who may reach a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

impl Access {
    pub fn allows(&self, identity: &Identity) -> bool {
        match self {
            Access::Public => true,
            Access::Authenticated => identity.is_authenticated(),
        }
    }
}

/// Payload stored per registered pattern.
#[derive(Debug, Clone)]
pub struct Route<H> {
    pub handler: H,
    pub access: Access,
}

/// Routes sharing a path prefix, like `/auth/`.
#[derive(Debug)]
pub struct RouteGroup<H> {
    name: &'static str,
    prefix: String,
    router: Router<Route<H>>,
}

impl<H> RouteGroup<H> {
    pub fn new(name: &'static str, prefix: impl Into<String>) -> Self {
        Self {
            name,
            prefix: prefix.into(),
            router: Router::new(),
        }
    }

    /// Register a route anyone may reach.
    pub fn public(mut self, method: Method, template: &str, handler: H) -> Result<Self, RouteError> {
        self.router.add(method, template, Route { handler, access: Access::Public })?;
        Ok(self)
    }

    /// Register a route that requires an authenticated identity.
    pub fn authenticated(
        mut self,
        method: Method,
        template: &str,
        handler: H,
    ) -> Result<Self, RouteError> {
        self.router.add(method, template, Route { handler, access: Access::Authenticated })?;
        Ok(self)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn router(&self) -> &Router<Route<H>> {
        &self.router
    }

    fn claims(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// What to do with a request.
#[derive(Debug)]
pub enum Decision<'a, H> {
    Invoke {
        handler: &'a H,
        pattern: &'a PathPattern,
        params: HashMap<String, String>,
    },
    NotFound,
    NotAuthorized,
}

/// Result of [`RequestDispatcher::dispatch`].
pub struct Dispatched<'a, H> {
    pub identity: Identity,
    /// Cookies to send back (a redeemed ticket adds one).
    pub jar: CookieJar,
    pub decision: Decision<'a, H>,
}

/// Wires the session resolver to the route groups.
pub struct RequestDispatcher<H> {
    groups: Vec<RouteGroup<H>>,
    resolver: Arc<SessionResolver>,
}

impl<H> RequestDispatcher<H> {
    pub fn new(resolver: Arc<SessionResolver>) -> Self {
        Self {
            groups: Vec::new(),
            resolver,
        }
    }

    pub fn with_group(mut self, group: RouteGroup<H>) -> Self {
        self.groups.push(group);
        self
    }

    pub fn groups(&self) -> &[RouteGroup<H>] {
        &self.groups
    }

    pub fn resolver(&self) -> &Arc<SessionResolver> {
        &self.resolver
    }

    /// Resolve the identity, then decide.
    pub async fn dispatch(
        &self,
        method: &axum::http::Method,
        path: &str,
        jar: CookieJar,
        query_ticket: Option<&str>,
    ) -> Dispatched<'_, H> {
        let (identity, jar) = self.resolver.resolve(jar, query_ticket).await;
        let decision = self.decide(&identity, method, path);
        Dispatched {
            identity,
            jar,
            decision,
        }
    }

    /// Route and authorize for an already resolved identity.
    pub fn decide(&self, identity: &Identity, method: &axum::http::Method, path: &str) -> Decision<'_, H> {
        let Ok(method) = Method::try_from(method) else {
            return Decision::NotFound;
        };

        let Some(group) = self
            .groups
            .iter()
            .filter(|g| g.claims(path))
            .max_by_key(|g| g.prefix.len())
        else {
            return Decision::NotFound;
        };

        let Some(found) = group.router.match_route(method, path) else {
            return Decision::NotFound;
        };

        if !found.value.access.allows(identity) {
            tracing::info!(
                group = group.name,
                method = %method,
                path = %path,
                login = %identity.display_name,
                "Not authorized"
            );
            return Decision::NotAuthorized;
        }

        Decision::Invoke {
            handler: &found.value.handler,
            pattern: found.pattern,
            params: found.params,
        }
    }
}
