//! Shared utilities for integration tests.

use std::fs;
use tempfile::TempDir;
use tokio::net::TcpListener;

use inkwell::lifecycle::build_app;
use inkwell::{BlogConfig, HttpServer, Shutdown};

/// A running server on an ephemeral port. Stops when dropped.
pub struct TestServer {
    pub base: String,
    shutdown: Shutdown,
    _public: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Ticket created for every test server.
#[allow(dead_code)]
pub const TICKET: &str = "t-7f3a";

/// Start the blog with default users (user1 admin, user2 guest), the
/// [`TICKET`] guest, an in-memory store and a public directory holding
/// `robots.txt`.
pub async fn start_server() -> TestServer {
    let public = tempfile::tempdir().unwrap();
    fs::write(public.path().join("robots.txt"), "User-agent: *\n").unwrap();

    let mut config = BlogConfig::default();
    config.site.public_dir = public.path().to_string_lossy().into_owned();

    let app = build_app(&config).await.unwrap();
    app.accounts.create_ticket(TICKET).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let stop = shutdown.listener();
    let server = HttpServer::new(config, app.state);
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });

    TestServer {
        base: format!("http://{}", addr),
        shutdown,
        _public: public,
    }
}

/// Client with its own cookie store that does not follow redirects.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Post the login form and return the response status.
#[allow(dead_code)]
pub async fn login(server: &TestServer, client: &reqwest::Client, user: &str, password: &str) -> u16 {
    client
        .post(server.url("/auth/login"))
        .form(&[("user", user), ("password", password), ("url", "/archive")])
        .send()
        .await
        .unwrap()
        .status()
        .as_u16()
}
