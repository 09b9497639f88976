use std::time::Duration;

use barrage::{Cookie, LoadConfig, LoadDriver, ReqwestTransport, StatusBucket};

#[tokio::test(flavor = "multi_thread")]
async fn get_run_against_a_live_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .match_header("user-agent", "barrage-test")
        .with_status(200)
        .with_header("server", "mockito")
        .with_body("hello world")
        .expect(6)
        .create_async()
        .await;

    let config = LoadConfig::builder()
        .url(format!("{}/health", server.url()))
        .user_agent("barrage-test")
        .concurrency(2)
        .requests(6)
        .delay(Duration::from_millis(5))
        .build();
    let summary = LoadDriver::new(config, ReqwestTransport::new().unwrap())
        .run()
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(summary.attempted, 6);
    assert_eq!(summary.passed, 6);
    assert_eq!(summary.bytes_downloaded, 6 * "hello world".len() as u64);
    assert_eq!(summary.server_type.as_deref(), Some("mockito"));
}

#[tokio::test(flavor = "multi_thread")]
async fn post_form_with_cookies_and_headers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/login")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_header("cookie", "sid=abc; theme=dark")
        .match_header("x-run", "42")
        .match_body("user=alice&note=two+words")
        .with_status(200)
        .expect(3)
        .create_async()
        .await;

    let config = LoadConfig::builder()
        .url(format!("{}/login", server.url()))
        .post_data(vec![
            ("user".to_owned(), "alice".to_owned()),
            ("note".to_owned(), "two words".to_owned()),
        ])
        .cookies(vec![Cookie::new("sid", "abc"), Cookie::new("theme", "dark")])
        .headers(vec![("X-Run".to_owned(), "42".to_owned())])
        .concurrency(3)
        .requests(3)
        .build();
    let summary = LoadDriver::new(config, ReqwestTransport::new().unwrap())
        .run()
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(summary.passed, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_200_responses_are_bucketed_and_failed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;

    let config = LoadConfig::builder()
        .url(format!("{}/missing", server.url()))
        .concurrency(4)
        .requests(4)
        .build();
    let summary = LoadDriver::new(config, ReqwestTransport::new().unwrap())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.failed, 4);
    assert_eq!(summary.histogram[&StatusBucket::ClientError], 4);
    assert_eq!(summary.latencies, vec![0; 4]);
    assert_eq!(summary.bytes_downloaded, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_target_is_a_transport_failure() {
    let config = LoadConfig::builder()
        .url("http://127.0.0.1:1/")
        .concurrency(2)
        .requests(2)
        .timeout(Duration::from_secs(5))
        .build();
    let summary = LoadDriver::new(config, ReqwestTransport::new().unwrap())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.histogram[&StatusBucket::TransportFailure], 2);
}
