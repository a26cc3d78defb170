//! End-to-end tests over the real reqwest transport against a loopback
//! mockito server.

use scrapline::{Client, ClientConfig, ClientError};

fn quick_config() -> ClientConfig {
    ClientConfig::builder()
        .rate_limit(0.0)
        .retries(0)
        .build()
        .expect("config")
}

#[tokio::test]
async fn get_returns_body_and_final_url() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/hello")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body("hello world")
        .create_async()
        .await;

    let client = Client::new(quick_config()).expect("client");
    let url = format!("{}/hello", server.url());
    let resp = client.get(&url).send().await.expect("response");

    assert_eq!(resp.status, 200);
    assert!(resp.ok());
    assert_eq!(resp.text(), "hello world");
    assert!(resp.url.ends_with("/hello"));
    assert!(resp.elapsed.as_nanos() > 0);
    assert_eq!(
        resp.headers.get("content-type"),
        Some("text/plain")
    );

    mock.assert_async().await;
    client.close().await;
}

#[tokio::test]
async fn json_body_and_decode() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": true, "id": 7}"#)
        .create_async()
        .await;

    let client = Client::new(quick_config()).expect("client");
    let url = format!("{}/api", server.url());
    let resp = client
        .post(&url)
        .json(serde_json::json!({"name": "scrapline"}))
        .send()
        .await
        .expect("response");

    let value: serde_json::Value = resp.json().expect("json");
    assert_eq!(value["id"], 7);

    mock.assert_async().await;
}

#[tokio::test]
async fn query_params_and_headers_are_forwarded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::UrlEncoded("q".into(), "rust".into()))
        .match_header("x-api-key", "secret")
        .with_status(200)
        .with_body("found")
        .create_async()
        .await;

    let client = Client::new(quick_config()).expect("client");
    let url = format!("{}/search", server.url());
    let resp = client
        .get(&url)
        .query("q", "rust")
        .header("X-Api-Key", "secret")
        .send()
        .await
        .expect("response");
    assert_eq!(resp.text(), "found");

    mock.assert_async().await;
}

#[tokio::test]
async fn cookie_session_against_real_server() {
    let mut server = mockito::Server::new_async().await;
    let login = server
        .mock("POST", "/login")
        .with_status(200)
        .with_header("set-cookie", "sid=abc; Path=/")
        .with_body("welcome")
        .create_async()
        .await;
    let dashboard = server
        .mock("GET", "/dashboard")
        .match_header("cookie", "sid=abc")
        .with_status(200)
        .with_body("dash")
        .create_async()
        .await;

    let config = ClientConfig::builder()
        .rate_limit(0.0)
        .retries(0)
        .persist_cookies(true)
        .build()
        .expect("config");
    let client = Client::new(config).expect("client");

    let resp = client
        .post(format!("{}/login", server.url()))
        .form([("user", "u"), ("pass", "p")])
        .send()
        .await
        .expect("login");
    assert_eq!(resp.cookie_values(), vec![("sid".to_string(), "abc".to_string())]);

    let resp = client
        .get(format!("{}/dashboard", server.url()))
        .send()
        .await
        .expect("dashboard");
    assert_eq!(resp.text(), "dash");

    login.assert_async().await;
    dashboard.assert_async().await;

    // After clearing the domain, no Cookie header goes out.
    client.clear_cookies(None);
    let bare = server
        .mock("GET", "/bare")
        .match_header("cookie", mockito::Matcher::Missing)
        .with_status(200)
        .create_async()
        .await;
    client
        .get(format!("{}/bare", server.url()))
        .send()
        .await
        .expect("bare");
    bare.assert_async().await;
}

#[tokio::test]
async fn redirects_update_final_url() {
    let mut server = mockito::Server::new_async().await;
    let hop = server
        .mock("GET", "/start")
        .with_status(302)
        .with_header("location", "/final")
        .create_async()
        .await;
    let target = server
        .mock("GET", "/final")
        .with_status(200)
        .with_body("landed")
        .create_async()
        .await;

    let client = Client::new(quick_config()).expect("client");
    let resp = client
        .get(format!("{}/start", server.url()))
        .send()
        .await
        .expect("response");

    assert_eq!(resp.status, 200);
    assert!(resp.url.ends_with("/final"));
    assert_eq!(resp.text(), "landed");

    hop.assert_async().await;
    target.assert_async().await;
}

#[tokio::test]
async fn redirects_can_be_disabled() {
    let mut server = mockito::Server::new_async().await;
    let hop = server
        .mock("GET", "/start")
        .with_status(302)
        .with_header("location", "/final")
        .create_async()
        .await;

    let config = ClientConfig::builder()
        .rate_limit(0.0)
        .retries(0)
        .follow_redirects(false)
        .build()
        .expect("config");
    let client = Client::new(config).expect("client");
    let resp = client
        .get(format!("{}/start", server.url()))
        .send()
        .await
        .expect("response");

    assert_eq!(resp.status, 302);
    assert_eq!(resp.headers.get("location"), Some("/final"));

    hop.assert_async().await;
}

#[tokio::test]
async fn connection_failure_maps_to_transport_error() {
    // Nothing listens on this port.
    let config = quick_config();
    let client = Client::new(config).expect("client");

    let err = client
        .get("http://127.0.0.1:9/unreachable")
        .send()
        .await
        .unwrap_err();
    match err {
        ClientError::MaxRetriesExceeded {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 1);
            assert!(matches!(source.as_deref(), Some(ClientError::Transport(_))));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn last_response_tracks_real_requests() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/a")
        .with_status(204)
        .create_async()
        .await;

    let client = Client::new(quick_config()).expect("client");
    client
        .get(format!("{}/a", server.url()))
        .send()
        .await
        .expect("response");

    assert_eq!(client.last_status(), Some(204));
    assert!(client.last_elapsed().unwrap().as_nanos() > 0);
}
