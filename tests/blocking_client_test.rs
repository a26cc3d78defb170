//! Blocking facade smoke tests. These run outside any async runtime;
//! the facade owns its own.

use scrapline::blocking::Client;
use scrapline::ClientConfig;

fn quick_config() -> ClientConfig {
    ClientConfig::builder()
        .rate_limit(0.0)
        .retries(0)
        .max_workers(2)
        .build()
        .expect("config")
}

#[test]
fn blocking_get_round_trip() -> anyhow::Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/sync")
        .with_status(200)
        .with_body("from blocking")
        .create();

    let client = Client::new(quick_config())?;
    let resp = client.get(format!("{}/sync", server.url())).send()?;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.text(), "from blocking");
    assert_eq!(client.last_status(), Some(200));

    mock.assert();
    client.close();
    Ok(())
}

#[test]
fn blocking_gather_preserves_order() {
    let mut server = mockito::Server::new();
    for i in 0..4 {
        server
            .mock("GET", format!("/item/{i}").as_str())
            .with_status(200)
            .with_body(format!("item-{i}"))
            .create();
    }

    let client = Client::new(quick_config()).expect("client");
    let urls: Vec<String> = (0..4)
        .map(|i| format!("{}/item/{i}", server.url()))
        .collect();
    let result = client.gather_urls(urls, Some(2), false);

    assert!(result.all_succeeded());
    for (i, slot) in result.responses.iter().enumerate() {
        let resp = slot.as_ref().expect("response");
        assert_eq!(resp.text(), format!("item-{i}"));
    }
}

#[test]
fn blocking_cookie_session() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/login")
        .with_status(200)
        .with_header("set-cookie", "tok=42; Path=/")
        .create();
    let authed = server
        .mock("GET", "/authed")
        .match_header("cookie", "tok=42")
        .with_status(200)
        .create();

    let config = ClientConfig::builder()
        .rate_limit(0.0)
        .retries(0)
        .persist_cookies(true)
        .build()
        .expect("config");
    let client = Client::new(config).expect("client");

    client
        .get(format!("{}/login", server.url()))
        .send()
        .expect("login");
    client
        .get(format!("{}/authed", server.url()))
        .send()
        .expect("authed");

    authed.assert();
    assert!(!client.cookies().is_empty());

    client.reset_session();
    assert!(client.cookies().is_empty());
    assert!(client.last_status().is_none());
}
