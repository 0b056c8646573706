use quill_telemetry::{create_noop_metrics, create_prom_metrics};
use serial_test::serial;
use std::time::Duration;

mod common;

use common::TestServer;

#[tokio::test]
#[serial]
async fn prometheus_metrics_expose_request_latency_and_writes() {
    // ---
    let metrics = create_prom_metrics().expect("Failed to install recorder");
    let server = TestServer::with_metrics(metrics).await;

    let response = server
        .client
        .get(server.url("/dashboard/page-views"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    // Both counters are updated after the response goes out.
    let mut body = String::new();
    for _ in 0..100 {
        body = server
            .client
            .get(server.url("/metrics"))
            .send()
            .await
            .expect("Failed to scrape")
            .text()
            .await
            .expect("Failed to read body");

        if body.contains("http_request_duration_seconds")
            && body.contains("telemetry_writes_total")
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert!(body.contains("http_request_duration_seconds"), "{body}");
    assert!(body.contains(r#"path="/dashboard/page-views""#), "{body}");
    assert!(body.contains("telemetry_writes_total"), "{body}");
}

#[tokio::test]
#[serial]
async fn unknown_urls_collapse_into_one_series() {
    // ---
    let metrics = create_prom_metrics().expect("Failed to install recorder");
    let server = TestServer::with_metrics(metrics).await;

    for i in 0..3 {
        let response = server
            .client
            .get(server.url(&format!("/wp-admin/scan-{i}")))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 404);
    }

    let body = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .expect("Failed to scrape")
        .text()
        .await
        .expect("Failed to read body");

    assert!(body.contains(r#"path="unmatched""#), "{body}");
    assert!(!body.contains("/wp-admin/scan-"), "{body}");
}

#[tokio::test]
#[serial]
async fn noop_metrics_render_empty() {
    // ---
    let server = TestServer::with_metrics(create_noop_metrics().unwrap()).await;

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
    assert!(response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/plain")));
    assert!(response.text().await.unwrap().is_empty());
}
