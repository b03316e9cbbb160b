//! Page outcomes and their HTTP form.
//!
//! Template rendering lives outside this crate; a view is sent as JSON
//! (`{"view": ..., "model": ...}`) for the renderer to consume.

use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::Identity;

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    View { template: &'static str, model: Value },
    Redirect { status: StatusCode, location: String },
    NotFound,
    NotAuthorized,
    Error { title: String },
}

impl Outcome {
    pub fn view(template: &'static str, model: Value) -> Self {
        Outcome::View { template, model }
    }

    /// 302 Found.
    pub fn found(location: impl Into<String>) -> Self {
        Outcome::Redirect {
            status: StatusCode::FOUND,
            location: location.into(),
        }
    }

    /// 301 Moved Permanently.
    pub fn moved(location: impl Into<String>) -> Self {
        Outcome::Redirect {
            status: StatusCode::MOVED_PERMANENTLY,
            location: location.into(),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Outcome::Error { title: title.into() }
    }

    /// Label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::View { .. } => "view",
            Outcome::Redirect { .. } => "redirect",
            Outcome::NotFound => "not_found",
            Outcome::NotAuthorized => "not_authorized",
            Outcome::Error { .. } => "error",
        }
    }
}

/// Session part of every view model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub login_name: String,
    pub is_auth: bool,
    pub is_admin: bool,
    pub is_guest: bool,
}

impl From<&Identity> for SessionView {
    fn from(identity: &Identity) -> Self {
        Self {
            login_name: identity.display_name.clone(),
            is_auth: identity.is_authenticated(),
            is_admin: identity.is_admin(),
            is_guest: identity.is_guest(),
        }
    }
}

/// Turn an outcome into a response for `identity`.
pub fn render(outcome: Outcome, identity: &Identity, method: &Method, path: &str) -> Response {
    let session = SessionView::from(identity);
    match outcome {
        Outcome::View { template, model } => {
            tracing::debug!(view = template, path = %path, login = %identity.display_name, "Rendering view");
            let body = json!({ "view": template, "session": session, "model": model });
            (StatusCode::OK, Json(body)).into_response()
        }
        Outcome::Redirect { status, location } => {
            tracing::debug!(status = %status, location = %location, "Redirect");
            (status, [(header::LOCATION, location)]).into_response()
        }
        Outcome::NotFound => {
            tracing::info!(path = %path, login = %identity.display_name, "Not found");
            let body = json!({ "view": "notFound", "session": session });
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
        Outcome::NotAuthorized => {
            tracing::info!(method = %method, path = %path, login = %identity.display_name, "Not authorized");
            let body = json!({
                "view": "notAuthorized",
                "session": session,
                "model": { "title": "Not authorized", "httpVerb": method.as_str(), "targetUrl": path },
            });
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
        Outcome::Error { title } => {
            tracing::error!(title = %title, path = %path, login = %identity.display_name, "Request failed");
            let body = json!({ "view": "error", "session": session, "model": { "title": title } });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
