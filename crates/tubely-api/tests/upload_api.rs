//! End-to-end upload tests against the real router.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{multipart_body, token_for, upload_request, FakeMedia, TestApp, BOUNDARY, PUBLIC_BASE};
use tubely_catalog::VideoCatalog;
use tubely_models::{UserId, VideoId};

fn thumbnail_uri(id: impl std::fmt::Display) -> String {
    format!("/api/videos/{}/thumbnail", id)
}

fn video_uri(id: impl std::fmt::Display) -> String {
    format!("/api/videos/{}/video", id)
}

#[tokio::test]
async fn test_owner_uploads_jpeg_thumbnail() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let token = token_for(&app.owner());

    let body = multipart_body("thumbnail", Some("image/jpeg"), b"\xff\xd8\xff jpeg");
    let (status, json) = app
        .send(upload_request(&thumbnail_uri(app.video.id), Some(&token), body))
        .await;

    assert_eq!(status, StatusCode::OK);
    let url = json["thumbnail_url"].as_str().unwrap();
    let key = url.strip_prefix(PUBLIC_BASE).unwrap();
    assert!(!key.is_empty());
    assert!(key.ends_with(".jpg"));
    assert_eq!(json["id"], app.video.id.to_string());

    // Served back from the local asset host
    let (status, bytes) = app.get_raw(&format!("/assets/{}", key)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"\xff\xd8\xff jpeg");

    let stored = app.catalog.get_video(&app.video.id).await.unwrap();
    assert_eq!(stored.thumbnail_url.as_deref(), Some(url));
    assert_eq!(app.temp_entries(), 0);
}

#[tokio::test]
async fn test_landscape_video_key_prefix() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let token = token_for(&app.owner());

    let body = multipart_body("video", Some("video/mp4"), b"ftyp mdat moov");
    let (status, json) = app
        .send(upload_request(&video_uri(app.video.id), Some(&token), body))
        .await;

    assert_eq!(status, StatusCode::OK);
    let url = json["video_url"].as_str().unwrap();
    let key = url.strip_prefix(PUBLIC_BASE).unwrap();
    assert!(key.starts_with("landscape/"));
    assert!(key.ends_with(".mp4"));
    assert!(app.assets_dir().join(key).exists());

    let stored = app.catalog.get_video(&app.video.id).await.unwrap();
    assert_eq!(stored.video_url.as_deref(), Some(url));
    assert_eq!(app.temp_entries(), 0);
}

#[tokio::test]
async fn test_portrait_video_without_api_prefix() {
    let app = TestApp::new(FakeMedia::reporting(1080, 1920)).await;
    let token = token_for(&app.owner());

    let body = multipart_body("video", Some("video/mp4; codecs=avc1"), b"mp4");
    let (status, json) = app
        .send(upload_request(
            &format!("/videos/{}/video", app.video.id),
            Some(&token),
            body,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    let key = json["video_url"]
        .as_str()
        .unwrap()
        .strip_prefix(PUBLIC_BASE)
        .unwrap()
        .to_string();
    assert!(key.starts_with("portrait/"));
}

#[tokio::test]
async fn test_no_streams_fails_and_cleans_up() {
    let app = TestApp::new(FakeMedia::no_streams()).await;
    let token = token_for(&app.owner());

    let body = multipart_body("video", Some("video/mp4"), b"definitely not a video");
    let (status, json) = app
        .send(upload_request(&video_uri(app.video.id), Some(&token), body))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].is_string());
    assert_eq!(app.temp_entries(), 0);
    assert!(!app.assets_dir().exists());

    let stored = app.catalog.get_video(&app.video.id).await.unwrap();
    assert_eq!(stored, app.video);
}

#[tokio::test]
async fn test_non_owner_is_forbidden() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let stranger = token_for(&UserId::new());

    let body = multipart_body("video", Some("video/mp4"), b"mp4");
    let (status, json) = app
        .send(upload_request(&video_uri(app.video.id), Some(&stranger), body))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json["error"].is_string());
    // Nothing was staged; the directory was never even created
    assert!(!app.dir.path().join("tmp").exists());
    assert_eq!(app.catalog.get_video(&app.video.id).await.unwrap(), app.video);
}

#[tokio::test]
async fn test_unknown_video_is_not_found() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let token = token_for(&app.owner());

    let body = multipart_body("thumbnail", Some("image/png"), b"png");
    let (status, json) = app
        .send(upload_request(&thumbnail_uri(VideoId::new()), Some(&token), body))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Couldn't find video");
}

#[tokio::test]
async fn test_invalid_video_id() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let token = token_for(&app.owner());

    let body = multipart_body("thumbnail", Some("image/png"), b"png");
    let (status, json) = app
        .send(upload_request(&thumbnail_uri("not-a-uuid"), Some(&token), body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid ID");
}

#[tokio::test]
async fn test_missing_or_invalid_token() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;

    let body = multipart_body("thumbnail", Some("image/png"), b"png");
    let (status, _) = app
        .send(upload_request(&thumbnail_uri(app.video.id), None, body.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = app
        .send(upload_request(&thumbnail_uri(app.video.id), Some("not.a.jwt"), body))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].is_string());
    assert_eq!(app.temp_entries(), 0);
}

#[tokio::test]
async fn test_client_input_errors() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let token = token_for(&app.owner());
    let uri = thumbnail_uri(app.video.id);

    // Wrong field name
    let body = multipart_body("image", Some("image/png"), b"png");
    let (status, _) = app.send(upload_request(&uri, Some(&token), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing part content type
    let body = multipart_body("thumbnail", None, b"png");
    let (status, _) = app.send(upload_request(&uri, Some(&token), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unsupported media type
    let body = multipart_body("thumbnail", Some("image/gif"), b"GIF89a");
    let (status, _) = app.send(upload_request(&uri, Some(&token), body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A video route only takes mp4
    let body = multipart_body("video", Some("video/quicktime"), b"mov");
    let (status, _) = app
        .send(upload_request(&video_uri(app.video.id), Some(&token), body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.temp_entries(), 0);
    assert_eq!(app.catalog.get_video(&app.video.id).await.unwrap(), app.video);
}

#[tokio::test]
async fn test_truncated_form_is_client_error() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let token = token_for(&app.owner());

    // Part starts but the closing boundary never arrives
    let body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"thumbnail\"; filename=\"a.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNG partial",
        BOUNDARY
    );
    let (status, json) = app
        .send(upload_request(
            &thumbnail_uri(app.video.id),
            Some(&token),
            body.into_bytes(),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
    assert_eq!(app.temp_entries(), 0);
    assert_eq!(app.catalog.get_video(&app.video.id).await.unwrap(), app.video);
}

fn json_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(r#"{"thumbnail":"x"}"#)).unwrap()
}

#[tokio::test]
async fn test_non_multipart_body_is_json_error() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let token = token_for(&app.owner());

    let (status, json) = app
        .send(json_request(&thumbnail_uri(app.video.id), Some(&token)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().starts_with("Unable to parse form"));
}

#[tokio::test]
async fn test_non_multipart_body_checks_id_and_token_first() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;

    let (status, json) = app
        .send(json_request(&thumbnail_uri(app.video.id), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["error"].is_string());

    let (status, json) = app.send(json_request(&video_uri("not-a-uuid"), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid ID");

    let stranger = token_for(&UserId::new());
    let (status, _) = app
        .send(json_request(&video_uri(app.video.id), Some(&stranger)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_oversized_thumbnail_is_rejected() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let token = token_for(&app.owner());

    // Cap is 1 KiB in the test config
    let body = multipart_body("thumbnail", Some("image/png"), &vec![0u8; 4096]);
    let (status, _) = app
        .send(upload_request(&thumbnail_uri(app.video.id), Some(&token), body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.temp_entries(), 0);
}

#[tokio::test]
async fn test_body_over_route_limit_is_rejected() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let token = token_for(&app.owner());

    // Past the 64 KiB video cap and the multipart overhead on top of it
    let body = multipart_body("video", Some("video/mp4"), &vec![0u8; 256 * 1024]);
    let (status, _) = app
        .send(upload_request(&video_uri(app.video.id), Some(&token), body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.temp_entries(), 0);
}

#[tokio::test]
async fn test_repeat_uploads_last_writer_wins() {
    let app = TestApp::new(FakeMedia::reporting(1920, 1080)).await;
    let token = token_for(&app.owner());
    let uri = thumbnail_uri(app.video.id);

    let (_, first) = app
        .send(upload_request(&uri, Some(&token), multipart_body("thumbnail", Some("image/png"), b"one")))
        .await;
    let (_, second) = app
        .send(upload_request(&uri, Some(&token), multipart_body("thumbnail", Some("image/png"), b"two")))
        .await;

    assert_ne!(first["thumbnail_url"], second["thumbnail_url"]);
    let stored = app.catalog.get_video(&app.video.id).await.unwrap();
    assert_eq!(stored.thumbnail_url.as_deref(), second["thumbnail_url"].as_str());
}
