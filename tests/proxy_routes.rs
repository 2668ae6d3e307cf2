mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use patent_relay::relay::links::encode_component;
use patent_relay::RelayConfig;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0, 1, 2, 255];

fn upstream() -> Router {
    Router::new()
        .route(
            "/img.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], PNG) }),
        )
        .route(
            "/raw",
            get(|| async { Response::new(Body::from("raw bytes")) }),
        )
        .route("/moved", get(|| async { Redirect::temporary("/img.png") }))
        .route(
            "/page",
            get(|| async {
                Html(
                    r##"<html><head><title>t</title></head><body>
                    <a id="abs-path" href="/next?x=1">next</a>
                    <img id="abs-url" src="https://cdn.example.com/a.png">
                    <a id="relative" href="other.html">rel</a>
                    <a id="fragment" href="#top">top</a>
                    </body></html>"##,
                )
            }),
        )
        .route(
            "/files/report.docx",
            get(|| async {
                (
                    [(
                        header::CONTENT_TYPE,
                        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    )],
                    "PK",
                )
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "late"
            }),
        )
        .route(
            "/drip",
            get(|| async {
                let chunks = futures_util::stream::unfold(0u8, |i| async move {
                    if i == 6 {
                        return None;
                    }
                    tokio::time::sleep(Duration::from_millis(400)).await;
                    Some((Ok::<_, std::io::Error>(vec![b'a' + i]), i + 1))
                });
                (
                    [(header::CONTENT_TYPE, "application/pdf")],
                    Body::from_stream(chunks),
                )
            }),
        )
        .route(
            "/missing",
            get(|| async { StatusCode::NOT_FOUND.into_response() }),
        )
}

#[tokio::test]
async fn test_passthrough_keeps_bytes_and_type() {
    let up = common::start_upstream(upstream()).await;
    let relay = common::start_relay(RelayConfig::default()).await;

    let res = common::client()
        .get(relay.proxy(&format!("http://{}/img.png", up)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(res.headers()[header::CONTENT_DISPOSITION], "inline");
    assert_eq!(res.bytes().await.unwrap().as_ref(), PNG);
}

#[tokio::test]
async fn test_missing_content_type_defaults_to_octet_stream() {
    let up = common::start_upstream(upstream()).await;
    let relay = common::start_relay(RelayConfig::default()).await;

    let res = common::client()
        .get(relay.proxy(&format!("http://{}/raw", up)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(res.text().await.unwrap(), "raw bytes");
}

#[tokio::test]
async fn test_redirects_are_followed_upstream() {
    let up = common::start_upstream(upstream()).await;
    let relay = common::start_relay(RelayConfig::default()).await;

    let res = common::client()
        .get(relay.proxy(&format!("http://{}/moved", up)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.bytes().await.unwrap().as_ref(), PNG);
}

#[tokio::test]
async fn test_url_validation() {
    let relay = common::start_relay(RelayConfig::default()).await;
    let client = common::client();

    let res = client.get(relay.url("/api/proxy")).send().await.unwrap();
    assert_eq!(res.status(), 400);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "URL parameter is required");

    let res = client
        .get(relay.url("/proxy?url=not-a-url"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = client
        .get(relay.url("/api/proxy?url=ftp%3A%2F%2Fexample.com%2Ff"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn test_upstream_status_is_mirrored() {
    let up = common::start_upstream(upstream()).await;
    let relay = common::start_relay(RelayConfig::default()).await;

    let res = common::client()
        .get(relay.proxy(&format!("http://{}/missing", up)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Failed to fetch URL: Not Found");
}

#[tokio::test]
async fn test_unreachable_upstream_is_500() {
    let dead = common::closed_port().await;
    let relay = common::start_relay(RelayConfig::default()).await;

    let res = common::client()
        .get(relay.proxy(&format!("http://{}/x", dead)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to fetch URL"));
}

#[tokio::test]
async fn test_slow_upstream_times_out_with_504() {
    let up = common::start_upstream(upstream()).await;
    let mut config = RelayConfig::default();
    config.upstream.timeout_secs = 1;
    let relay = common::start_relay(config).await;

    let res = common::client()
        .get(relay.proxy(&format!("http://{}/slow", up)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 504);
}

#[tokio::test]
async fn test_slow_stream_outlives_upstream_timeout() {
    let up = common::start_upstream(upstream()).await;
    let mut config = RelayConfig::default();
    config.upstream.timeout_secs = 1;
    let relay = common::start_relay(config).await;

    let res = common::client()
        .get(relay.proxy(&format!("http://{}/drip", up)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(res.text().await.unwrap(), "abcdef");
}

#[tokio::test]
async fn test_html_links_route_through_relay() {
    let up = common::start_upstream(upstream()).await;
    let relay = common::start_relay(RelayConfig::default()).await;

    let res = common::client()
        .get(relay.proxy(&format!("http://{}/page", up)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let html = res.text().await.unwrap();

    let next = relay.proxy(&format!("http://{}/next?x=1", up));
    assert!(html.contains(&format!(r#"href="{}""#, next)), "{}", html);

    let cdn = relay.proxy("https://cdn.example.com/a.png");
    assert!(html.contains(&format!(r#"src="{}""#, cdn)));

    assert!(html.contains(r#"href="other.html""#));
    assert!(html.contains(r##"href="#top""##));
    assert!(html.contains(&format!(r#"<base href="http://{}/">"#, up)));
    assert!(html.contains("linkClick"));
}

#[tokio::test]
async fn test_rewritten_links_resolve_when_followed() {
    let up = common::start_upstream(upstream()).await;
    let relay = common::start_relay(RelayConfig::default()).await;

    // A page link pointing at the image, as the rewriter would emit it.
    let rewritten = relay.proxy(&format!("http://{}/img.png", up));
    let res = common::client().get(&rewritten).send().await.unwrap();
    assert_eq!(res.bytes().await.unwrap().as_ref(), PNG);
}

#[tokio::test]
async fn test_nested_relay_url_is_unwrapped_once() {
    let up = common::start_upstream(upstream()).await;
    let relay = common::start_relay(RelayConfig::default()).await;
    let client = common::client();

    let inner = relay.proxy(&format!("http://{}/img.png", up));
    let res = client.get(relay.proxy(&inner)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.bytes().await.unwrap().as_ref(), PNG);

    let twice = relay.proxy(&inner);
    let res = client.get(relay.proxy(&twice)).send().await.unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn test_office_documents_go_to_viewer() {
    let up = common::start_upstream(upstream()).await;
    let relay = common::start_relay(RelayConfig::default()).await;

    let target = format!("http://{}/files/report.docx", up);
    let res = common::client()
        .get(relay.proxy(&target))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 302);
    assert_eq!(
        res.headers()[header::LOCATION].to_str().unwrap(),
        format!(
            "https://docs.google.com/gview?url={}&embedded=true",
            encode_component(&target)
        )
    );
}

#[tokio::test]
async fn test_cors_allow_list() {
    let relay = common::start_relay(RelayConfig::default()).await;
    let client = common::client();

    let res = client
        .get(relay.url("/health"))
        .header(header::ORIGIN, "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let res = client
        .get(relay.url("/health"))
        .header(header::ORIGIN, "https://evil.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_health_fallback_and_request_id() {
    let relay = common::start_relay(RelayConfig::default()).await;
    let client = common::client();

    let res = client.get(relay.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "OK" }));

    let res = client
        .get(relay.url("/health"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");

    let res = client.get(relay.url("/does/not/exist")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Endpoint not found");
}
