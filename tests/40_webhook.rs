mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[tokio::test]
async fn provider_posts_are_stored_and_listed() -> Result<()> {
    let app = common::router();

    let response = app
        .clone()
        .oneshot(form_request(
            "/api/v1/webhook/email",
            "recipient=alice%40campdir.dev&sender=bob%40example.com&subject=Hi&body-plain=Hello+there",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = common::body_json(response).await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["data"]["recipient"], "alice@campdir.dev");
    assert_eq!(payload["data"]["body_plain"], "Hello there");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/webhook/email/alice@campdir.dev")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let payload = common::body_json(response).await;
    assert_eq!(payload["count"], 1);
    assert_eq!(payload["data"][0]["subject"], "Hi");
    assert_eq!(payload["data"][0]["sender"], "bob@example.com");
    Ok(())
}

#[tokio::test]
async fn unknown_recipients_have_empty_mailboxes() -> Result<()> {
    let app = common::router();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/webhook/email/nobody@campdir.dev")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = common::body_json(response).await;
    assert_eq!(payload["count"], 0);
    assert_eq!(payload["data"], serde_json::json!([]));
    Ok(())
}

#[tokio::test]
async fn incomplete_provider_posts_are_rejected() -> Result<()> {
    let app = common::router();
    let response = app
        .oneshot(form_request("/api/v1/webhook/email", "recipient=alice%40campdir.dev"))
        .await?;

    // Missing sender fails form deserialization before the store is touched.
    assert!(response.status().is_client_error());
    Ok(())
}
