mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

#[tokio::test]
async fn banner_lists_the_mounted_endpoints() -> Result<()> {
    let app = common::router();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = common::body_json(response).await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["data"]["endpoints"]["bootcamps"], "/api/v1/bootcamps");
    assert_eq!(payload["data"]["endpoints"]["auth"], "/api/v1/auth");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_fall_through_to_404() -> Result<()> {
    let app = common::router();
    let response = app
        .oneshot(Request::builder().uri("/api/v2/nope").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_ids_read_as_missing_resources() -> Result<()> {
    let app = common::router();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/bootcamps/not-a-uuid")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = common::body_json(response).await;
    assert_eq!(payload["success"], false);
    assert_eq!(payload["error"], "Bootcamp not found with id of not-a-uuid");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/courses/42")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = common::body_json(response).await;
    assert_eq!(payload["error"], "Course not found with id of 42");
    Ok(())
}

#[tokio::test]
async fn radius_distance_must_be_numeric() -> Result<()> {
    let app = common::router();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/bootcamps/radius/02215/ten")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = common::body_json(response).await;
    assert_eq!(payload["error"], "Distance must be a number");
    Ok(())
}

#[tokio::test]
async fn radius_without_a_geocoder_is_a_bad_gateway() -> Result<()> {
    let app = common::router();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/bootcamps/radius/02215/10")
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload = common::body_json(response).await;
    assert_eq!(payload["success"], false);
    Ok(())
}
