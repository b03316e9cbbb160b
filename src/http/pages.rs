//! Page handlers.
//!
//! Sign-in pages do their work here. Blog pages validate their route
//! parameters and produce a view for the external renderer; post storage is
//! not part of this crate.

use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{Accounts, Identity, SessionResolver};
use crate::http::response::{Outcome, SessionView};
use crate::http::routes::Page;

/// Everything a handler gets for one request.
pub struct PageRequest {
    pub identity: Identity,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
    pub jar: CookieJar,
}

impl PageRequest {
    fn param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or("")
    }

    fn form_value(&self, name: &str) -> &str {
        self.form.get(name).map(String::as_str).unwrap_or("")
    }

    fn session(&self) -> SessionView {
        SessionView::from(&self.identity)
    }
}

/// Handler table shared by all requests.
pub struct Pages {
    resolver: Arc<SessionResolver>,
    accounts: Arc<Accounts>,
}

impl Pages {
    pub fn new(resolver: Arc<SessionResolver>, accounts: Arc<Accounts>) -> Self {
        Self { resolver, accounts }
    }

    /// Run the handler for `page`. Returns the cookies to send back.
    pub async fn handle(&self, page: Page, req: PageRequest) -> (CookieJar, Outcome) {
        match page {
            Page::Login => {
                let outcome = login_view("", req.query.get("url").map(String::as_str), &req);
                (req.jar, outcome)
            }
            Page::LoginPost => self.login_post(req).await,
            Page::Logout => {
                let jar = self.resolver.logout(&req.identity, req.jar).await;
                (jar, Outcome::found(format!("/?cb={}", fastrand::u64(..))))
            }
            Page::ChangePassword => {
                let outcome = change_password_view("", &req);
                (req.jar, outcome)
            }
            Page::ChangePasswordPost => {
                let outcome = self.change_password_post(&req).await;
                (req.jar, outcome)
            }
            blog => {
                let outcome = blog_page(blog, &req);
                (req.jar, outcome)
            }
        }
    }

    async fn login_post(&self, req: PageRequest) -> (CookieJar, Outcome) {
        let login = req.form_value("user").trim();
        let password = req.form_value("password").trim();
        let url = req.form_value("url");

        match self.resolver.login(login, password).await {
            Ok((_, cookie)) => {
                let target = safe_target(url);
                tracing::debug!(login = %login, url = %target, "Redirecting after login");
                (req.jar.add(cookie), Outcome::found(target))
            }
            Err(e) => {
                tracing::debug!(login = %login, error = %e, "Showing login form again");
                let outcome = login_view("Sorry, not sorry", Some(url), &req);
                (req.jar, outcome)
            }
        }
    }

    async fn change_password_post(&self, req: &PageRequest) -> Outcome {
        let login = req.identity.display_name.as_str();
        if req.form_value("user") != login {
            return Outcome::NotAuthorized;
        }

        let new_password = req.form_value("newPassword");
        let mut problems = Vec::new();

        match self.resolver.verify_password(login, req.form_value("oldPassword")).await {
            Ok(true) => {}
            Ok(false) => problems.push("Invalid password."),
            Err(e) => return Outcome::error(format!("Could not verify password: {}", e)),
        }
        if new_password.is_empty() {
            problems.push("New password cannot be empty.");
        }
        if new_password != req.form_value("repeatPassword") {
            problems.push("Password and Repeat Password must match.");
        }

        if !problems.is_empty() {
            return change_password_view(&problems.join(" "), req);
        }

        match self.accounts.set_password(login, new_password).await {
            Ok(()) => Outcome::found("/"),
            Err(e) => Outcome::error(format!("Could not change password: {}", e)),
        }
    }
}

fn login_view(message: &str, url: Option<&str>, req: &PageRequest) -> Outcome {
    Outcome::view(
        "login",
        json!({ "message": message, "targetUrl": safe_target(url.unwrap_or("")), "session": req.session() }),
    )
}

fn change_password_view(message: &str, req: &PageRequest) -> Outcome {
    Outcome::view("changePassword", json!({ "message": message, "session": req.session() }))
}

fn blog_page(page: Page, req: &PageRequest) -> Outcome {
    match page {
        Page::BlogViewShared => Outcome::view("blogView", json!({ "alias": req.param("alias") })),
        Page::BlogViewLegacy => {
            let id = id_from_legacy_url(req.param("title_id"));
            if id == 0 {
                tracing::info!("Legacy post without an ID. Redirected to home page.");
                return Outcome::moved("/");
            }
            Outcome::view("blogView", json!({ "id": id }))
        }
        Page::BlogViewOne => {
            let id = id_from_str(req.param("id"));
            if id == 0 {
                return Outcome::error("No Blog ID was received");
            }
            Outcome::view(
                "blogView",
                json!({ "id": id, "year": req.param("year"), "slug": req.param("title") }),
            )
        }
        Page::BlogViewYear => match req.param("year").parse::<i32>() {
            Ok(year) => Outcome::view(
                "archiveYear",
                json!({ "title": format!("Archive for {}", year), "year": year }),
            ),
            Err(_) => Outcome::error("Invalid year received"),
        },
        Page::BlogViewAll => Outcome::view("archiveAll", json!({ "title": "Archive (all years)" })),
        Page::About => Outcome::view("about", json!({})),
        Page::BlogViewRecent => Outcome::view("home", json!({})),
        Page::BlogEdit | Page::BlogEditNewEditor => {
            let id = id_from_str(req.param("id"));
            if id == 0 {
                return Outcome::error("No blog ID was received");
            }
            let template = if page == Page::BlogEdit { "blogEdit" } else { "blogEditNewEditor" };
            Outcome::view(template, json!({ "id": id, "form": req.form }))
        }
        Page::BlogSave => {
            let id = id_from_str(req.param("id"));
            if id == 0 {
                return Outcome::error("No blog ID was received");
            }
            Outcome::moved(format!("/{}/{}/{}", req.param("year"), req.param("title"), id))
        }
        Page::BlogNew => Outcome::view("blogEdit", json!({ "id": null, "form": req.form })),
        Page::Login | Page::LoginPost | Page::Logout | Page::ChangePassword | Page::ChangePasswordPost => {
            Outcome::NotFound
        }
    }
}

/// Numeric id from a path parameter, 0 when it is not a positive number.
pub fn id_from_str(s: &str) -> i64 {
    s.parse::<i64>().ok().filter(|id| *id > 0).unwrap_or(0)
}

/// Id at the end of a legacy URL such as `2017-some-title-123`.
pub fn id_from_legacy_url(url: &str) -> i64 {
    match url.rsplit_once('-') {
        Some((_, id)) => id_from_str(id),
        None => 0,
    }
}

/// Redirect target after login: local absolute paths only, `/` otherwise.
pub fn safe_target(url: &str) -> String {
    if url.starts_with('/') && !url.starts_with("//") && !url.contains('\\') {
        url.to_string()
    } else {
        "/".to_string()
    }
}
