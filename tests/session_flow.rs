//! End-to-end tests against a live server.

mod common;

use common::{browser, login, start_server, TICKET};
use serde_json::Value;

async fn status(client: &reqwest::Client, url: String) -> u16 {
    client.get(url).send().await.unwrap().status().as_u16()
}

#[tokio::test]
async fn test_anonymous_access() {
    let server = start_server().await;
    let client = browser();

    assert_eq!(status(&client, server.url("/")).await, 401);
    assert_eq!(status(&client, server.url("/2020/my-post/42")).await, 401);
    assert_eq!(status(&client, server.url("/auth/login")).await, 200);
    assert_eq!(status(&client, server.url("/no/such/page/here")).await, 404);

    let res = client.get(server.url("/shared/abc")).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["view"], "blogView");
    assert_eq!(body["model"]["alias"], "abc");
    assert_eq!(body["session"]["isAuth"], false);
}

#[tokio::test]
async fn test_login_then_logout() {
    let server = start_server().await;
    let client = browser();

    let res = client
        .post(server.url("/auth/login"))
        .form(&[("user", "user2"), ("password", "welcome2"), ("url", "/archive")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 302);
    assert_eq!(res.headers()["location"], "/archive");
    let set_cookie = res.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("sessionId="));
    assert!(set_cookie.contains("HttpOnly"));

    let body: Value = client
        .get(server.url("/archive/2020"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["view"], "archiveYear");
    assert_eq!(body["session"]["loginName"], "user2");
    assert_eq!(body["session"]["isGuest"], true);

    let res = client.get(server.url("/auth/logout")).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 302);
    assert!(res.headers()["location"].to_str().unwrap().starts_with("/?cb="));

    assert_eq!(status(&client, server.url("/archive")).await, 401);
    // Logging out twice is fine.
    assert_eq!(status(&client, server.url("/auth/logout")).await, 302);
}

#[tokio::test]
async fn test_failed_login_shows_form_again() {
    let server = start_server().await;
    let client = browser();

    let res = client
        .post(server.url("/auth/login"))
        .form(&[("user", "user2"), ("password", "wrong"), ("url", "/about")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("set-cookie").is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["view"], "login");
    assert_eq!(body["model"]["message"], "Sorry, not sorry");
    assert_eq!(body["model"]["targetUrl"], "/about");

    assert_eq!(status(&client, server.url("/about")).await, 401);
}

#[tokio::test]
async fn test_admin_has_one_session() {
    let server = start_server().await;
    let first = browser();
    let second = browser();

    assert_eq!(login(&server, &first, "user1", "welcome1").await, 302);
    assert_eq!(status(&first, server.url("/about")).await, 200);

    assert_eq!(login(&server, &second, "user1", "welcome1").await, 302);
    assert_eq!(status(&second, server.url("/about")).await, 200);
    assert_eq!(status(&first, server.url("/about")).await, 401);
}

#[tokio::test]
async fn test_guest_sessions_coexist() {
    let server = start_server().await;
    let first = browser();
    let second = browser();

    assert_eq!(login(&server, &first, "user2", "welcome2").await, 302);
    assert_eq!(login(&server, &second, "user2", "welcome2").await, 302);
    assert_eq!(status(&first, server.url("/about")).await, 200);
    assert_eq!(status(&second, server.url("/about")).await, 200);
}

#[tokio::test]
async fn test_ticket_link() {
    let server = start_server().await;
    let client = browser();

    let res = client
        .get(server.url(&format!("/about?ticket={}", TICKET)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let set_cookie = res.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("ticketId="));

    // The ticket cookie carries the guest from now on.
    assert_eq!(status(&client, server.url("/archive")).await, 200);

    // Accounts with a password are not tickets, guest or admin.
    let other = browser();
    let res = other.get(server.url("/about?ticket=user2")).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 401);
    assert!(res.headers().get("set-cookie").is_none());
    assert_eq!(status(&other, server.url("/about?ticket=user1")).await, 401);
    assert_eq!(status(&other, server.url("/about?ticket=nobody")).await, 401);

    // And a ticket never signs in through the password form.
    assert_eq!(login(&server, &other, TICKET, "").await, 200);
}

#[tokio::test]
async fn test_change_password() {
    let server = start_server().await;
    let client = browser();
    assert_eq!(login(&server, &client, "user2", "welcome2").await, 302);

    let body: Value = client
        .post(server.url("/auth/changepassword"))
        .form(&[
            ("user", "user2"),
            ("oldPassword", "bad"),
            ("newPassword", "n3w"),
            ("repeatPassword", "other"),
        ])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["view"], "changePassword");
    assert_eq!(
        body["model"]["message"],
        "Invalid password. Password and Repeat Password must match."
    );

    let res = client
        .post(server.url("/auth/changepassword"))
        .form(&[
            ("user", "user2"),
            ("oldPassword", "welcome2"),
            ("newPassword", "n3w"),
            ("repeatPassword", "n3w"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 302);

    let fresh = browser();
    assert_eq!(login(&server, &fresh, "user2", "welcome2").await, 200);
    assert_eq!(login(&server, &fresh, "user2", "n3w").await, 302);
}

#[tokio::test]
async fn test_static_files_and_request_id() {
    let server = start_server().await;
    let client = browser();

    let res = client.get(server.url("/robots.txt")).send().await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "User-agent: *\n");

    let res = client.get(server.url("/no/such/page/here")).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
}
