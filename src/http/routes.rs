//! Site route tables.
//!
//! Two groups, chosen by path prefix: `/auth/` for sign-in pages, `/` for
//! everything else. Order inside a group is significant: first match wins.

use std::sync::Arc;

use crate::auth::SessionResolver;
use crate::http::dispatch::{RequestDispatcher, RouteGroup};
use crate::routing::{Method, RouteError};

/// Handler selected by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    BlogViewShared,
    BlogViewLegacy,
    BlogViewOne,
    BlogViewYear,
    BlogViewAll,
    About,
    BlogViewRecent,
    BlogEditNewEditor,
    BlogEdit,
    BlogSave,
    BlogNew,
    Login,
    LoginPost,
    Logout,
    ChangePassword,
    ChangePasswordPost,
}

/// Blog pages. Only shared posts are visible without signing in.
pub fn blog_routes() -> Result<RouteGroup<Page>, RouteError> {
    RouteGroup::new("blog", "/")
        .public(Method::Get, "/shared/:alias", Page::BlogViewShared)?
        .authenticated(Method::Get, "/blogs/:title_id", Page::BlogViewLegacy)?
        .authenticated(Method::Get, "/:year/:title/:id", Page::BlogViewOne)?
        .authenticated(Method::Get, "/archive/:year", Page::BlogViewYear)?
        .authenticated(Method::Get, "/archive", Page::BlogViewAll)?
        .authenticated(Method::Get, "/about", Page::About)?
        .authenticated(Method::Get, "/", Page::BlogViewRecent)?
        .authenticated(Method::Post, "/:year/:title/:id/edit2", Page::BlogEditNewEditor)?
        .authenticated(Method::Get, "/:year/:title/:id/edit", Page::BlogEdit)?
        .authenticated(Method::Post, "/:year/:title/:id/save", Page::BlogSave)?
        .authenticated(Method::Post, "/new", Page::BlogNew)
}

/// Sign-in pages.
pub fn auth_routes() -> Result<RouteGroup<Page>, RouteError> {
    RouteGroup::new("auth", "/auth/")
        .public(Method::Get, "/auth/login", Page::Login)?
        .public(Method::Post, "/auth/login", Page::LoginPost)?
        .public(Method::Get, "/auth/logout", Page::Logout)?
        .authenticated(Method::Get, "/auth/changepassword", Page::ChangePassword)?
        .authenticated(Method::Post, "/auth/changepassword", Page::ChangePasswordPost)
}

/// Build the site dispatcher. A malformed table is a startup error.
pub fn build_dispatcher(resolver: Arc<SessionResolver>) -> Result<RequestDispatcher<Page>, RouteError> {
    let dispatcher = RequestDispatcher::new(resolver)
        .with_group(blog_routes()?)
        .with_group(auth_routes()?);

    for group in dispatcher.groups() {
        for (pattern, route) in group.router().routes() {
            tracing::debug!(
                group = group.name(),
                route = %pattern,
                access = ?route.access,
                handler = ?route.handler,
                "Route registered"
            );
        }
    }
    Ok(dispatcher)
}
