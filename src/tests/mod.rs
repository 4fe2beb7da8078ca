
use axum::http::{header, Method, StatusCode};
use serde_json::Value;

use crate::keepalive;
use test_utils::*;

#[tokio::test]
async fn upload_creates_one_record_from_the_media_response() {
    let harness = Harness::new();
    let body = MultipartBody::new()
        .text("title", "t")
        .text("description", "d")
        .file("file", "clip.mp4", &[7u8; 1024])
        .finish();

    let (status, json) = harness.send(upload_request(Some(&valid_token()), body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "t");
    assert_eq!(json["description"], "d");
    assert_eq!(json["publicId"], FAKE_PUBLIC_ID);
    assert_eq!(json["compressedSize"], FAKE_COMPRESSED_BYTES.to_string());
    assert_eq!(json["originalSize"], "0");
    assert_eq!(json["duration"], 12.5);

    assert_eq!(harness.media.uploaded_sizes(), vec![1024]);
    let records = harness.store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].public_id, FAKE_PUBLIC_ID);
    assert_eq!(json["id"], records[0].id.to_string());
}

#[tokio::test]
async fn upload_keeps_client_reported_original_size() {
    let harness = Harness::new();
    let body = MultipartBody::new()
        .text("title", "t")
        .text("originalSize", "2048")
        .file("file", "clip.mp4", &[1u8; 16])
        .finish();

    let (status, json) = harness.send(upload_request(Some(&valid_token()), body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["originalSize"], "2048");
    assert_eq!(json["description"], Value::Null);
}

#[tokio::test]
async fn upload_without_file_is_rejected_before_any_external_call() {
    let harness = Harness::new();
    let body = MultipartBody::new().text("title", "t").finish();

    let (status, json) = harness.send(upload_request(Some(&valid_token()), body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "File not found");
    assert!(harness.media.uploaded_sizes().is_empty());
    assert_eq!(harness.store.calls(), 0);
}

#[tokio::test]
async fn empty_file_part_counts_as_missing() {
    let harness = Harness::new();
    let body = MultipartBody::new()
        .text("title", "t")
        .file("file", "", &[])
        .finish();

    let (status, _) = harness.send(upload_request(Some(&valid_token()), body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(harness.media.uploaded_sizes().is_empty());
}

#[tokio::test]
async fn upload_without_title_is_rejected() {
    let harness = Harness::new();
    let body = MultipartBody::new().file("file", "clip.mp4", &[1u8; 8]).finish();

    let (status, json) = harness.send(upload_request(Some(&valid_token()), body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Title is required");
    assert!(harness.media.uploaded_sizes().is_empty());
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let harness = Harness::with_max_file_size(512);
    let body = MultipartBody::new()
        .text("title", "t")
        .file("file", "clip.mp4", &[0u8; 2048])
        .finish();

    let (status, _) = harness.send(upload_request(Some(&valid_token()), body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(harness.media.uploaded_sizes().is_empty());
    assert_eq!(harness.store.calls(), 0);
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected_before_touching_anything() {
    let harness = Harness::new();
    let body = MultipartBody::new()
        .text("title", "t")
        .file("file", "clip.mp4", &[1u8; 8])
        .finish();

    let (status, json) = harness.send(upload_request(None, body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Unauthorized");

    let (status, _) = harness
        .send(delete_request(None, r#"{"videoId":"anything"}"#))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = harness
        .send(delete_request(Some("not-a-jwt"), r#"{"videoId":"anything"}"#))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(harness.media.uploaded_sizes().is_empty());
    assert!(harness.media.destroyed().is_empty());
    assert_eq!(harness.store.calls(), 0);
}

#[tokio::test]
async fn session_cookie_is_accepted() {
    let harness = Harness::new();
    let seeded = harness.store.seed("video-uploads/seeded");

    let request = axum::http::Request::builder()
        .method(Method::DELETE)
        .uri("/api/video-upload")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("__session={}", valid_token()))
        .body(axum::body::Body::from(format!(r#"{{"videoId":"{}"}}"#, seeded.id)))
        .unwrap();

    let (status, _) = harness.send(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_credentials_is_a_server_error() {
    let harness = Harness::without_media();
    let body = MultipartBody::new()
        .text("title", "t")
        .file("file", "clip.mp4", &[1u8; 8])
        .finish();

    let (status, json) = harness.send(upload_request(Some(&valid_token()), body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Cloudinary credentials not found");
    assert_eq!(harness.store.calls(), 0);
}

#[tokio::test]
async fn delete_without_credentials_is_checked_after_lookup() {
    let harness = Harness::without_media();
    let seeded = harness.store.seed("video-uploads/kept");

    let (status, json) = harness
        .send(delete_request(
            Some(&valid_token()),
            &format!(r#"{{"videoId":"{}"}}"#, seeded.id),
        ))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Cloudinary credentials not found");
    assert_eq!(harness.store.records().len(), 1);

    let (status, json) = harness
        .send(delete_request(
            Some(&valid_token()),
            &format!(r#"{{"videoId":"{}"}}"#, uuid::Uuid::new_v4()),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Video not found");
    assert!(harness.media.destroyed().is_empty());
}

#[tokio::test]
async fn media_failure_collapses_to_generic_error() {
    let harness = Harness::new();
    harness.media.fail_next();
    let body = MultipartBody::new()
        .text("title", "t")
        .file("file", "clip.mp4", &[1u8; 8])
        .finish();

    let (status, json) = harness.send(upload_request(Some(&valid_token()), body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Upload video failed");
    assert!(harness.store.records().is_empty());
}

#[tokio::test]
async fn database_failure_after_upload_leaves_asset_behind() {
    let harness = Harness::new();
    harness.store.set_reachable(false);
    let body = MultipartBody::new()
        .text("title", "t")
        .file("file", "clip.mp4", &[1u8; 8])
        .finish();

    let (status, json) = harness.send(upload_request(Some(&valid_token()), body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Upload video failed");
    assert_eq!(harness.media.uploaded_sizes(), vec![8]);
}

#[tokio::test]
async fn delete_removes_record_and_asset() {
    let harness = Harness::new();
    let seeded = harness.store.seed("video-uploads/to-delete");
    let other = harness.store.seed("video-uploads/keep-me");

    let (status, json) = harness
        .send(delete_request(
            Some(&valid_token()),
            &format!(r#"{{"videoId":"{}"}}"#, seeded.id),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Video deleted successfully");
    assert_eq!(harness.media.destroyed(), vec!["video-uploads/to-delete".to_string()]);

    let remaining = harness.store.records();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, other.id);
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() {
    let harness = Harness::new();

    let (status, json) = harness
        .send(delete_request(Some(&valid_token()), r#"{"videoId":"missing-id"}"#))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, serde_json::json!({ "error": "Video not found" }));

    let (status, _) = harness
        .send(delete_request(
            Some(&valid_token()),
            &format!(r#"{{"videoId":"{}"}}"#, uuid::Uuid::new_v4()),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(harness.media.destroyed().is_empty());
}

#[tokio::test]
async fn delete_without_id_is_a_client_error() {
    let harness = Harness::new();

    for body in ["{}", r#"{"videoId":""}"#, "not json"] {
        let (status, json) = harness.send(delete_request(Some(&valid_token()), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(json["error"], "Video ID required");
    }
    assert_eq!(harness.store.calls(), 0);
}

#[tokio::test]
async fn delete_media_failure_keeps_record() {
    let harness = Harness::new();
    let seeded = harness.store.seed("video-uploads/stuck");
    harness.media.fail_next();

    let (status, json) = harness
        .send(delete_request(
            Some(&valid_token()),
            &format!(r#"{{"videoId":"{}"}}"#, seeded.id),
        ))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Delete video failed");
    assert_eq!(harness.store.records().len(), 1);
}

#[tokio::test]
async fn keep_alive_reports_database_state() {
    let harness = Harness::new();

    let (status, json) = harness.send(get_request("/api/keep-alive")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Database is alive");

    harness.store.set_reachable(false);
    let (status, json) = harness.send(get_request("/api/keep-alive")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to keep DB alive");
}

#[tokio::test]
async fn background_ping_follows_store_reachability() {
    let store = FakeStore::default();
    assert!(keepalive::ping_once(&store).await);

    store.set_reachable(false);
    assert!(!keepalive::ping_once(&store).await);
}

#[tokio::test]
async fn upload_page_is_served() {
    let harness = Harness::new();

    let (status, html) = harness.send_raw(get_request("/video-upload")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("70 * 1024 * 1024"));
    assert!(html.contains("/api/video-upload"));

    // successful uploads redirect to the root
    assert!(html.contains(r#"window.location.assign("/")"#));
    let (status, root) = harness.send_raw(get_request("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root, html);
}
