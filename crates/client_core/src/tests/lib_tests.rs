use super::*;
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    routing::{get, post},
    Router,
};
use shared::protocol::Prediction;
use tokio::{net::TcpListener, sync::Mutex};
use url::Url;

#[derive(Debug, Clone)]
struct CapturedField {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct MockReply {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

impl MockReply {
    fn json(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }
}

#[derive(Clone)]
struct ServerState {
    reply: MockReply,
    requests: Arc<Mutex<Vec<Vec<CapturedField>>>>,
}

async fn handle_classify(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        fields.push(CapturedField {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    state.requests.lock().await.push(fields);

    if let Some(delay) = state.reply.delay {
        tokio::time::sleep(delay).await;
    }
    (
        state.reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.reply.body.clone(),
    )
}

async fn handle_health() -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"status":"healthy","model":"ResNet50","service":"Image Classification API"}"#
            .to_string(),
    )
}

async fn spawn_classify_server(
    reply: MockReply,
) -> Result<(Url, Arc<Mutex<Vec<Vec<CapturedField>>>>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = ServerState {
        reply,
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/classify", post(handle_classify))
        .route("/health", get(handle_health))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((Url::parse(&format!("http://{addr}"))?, requests))
}

fn jpeg_upload() -> ClassificationUpload {
    ClassificationUpload {
        file_name: "photo.jpg".to_string(),
        mime_type: "image/jpeg".to_string(),
        bytes: b"\xff\xd8\xff\xe0fake-jpeg".to_vec(),
    }
}

fn client_for(url: Url) -> HttpClassifierClient {
    HttpClassifierClient::new(url, Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn classify_posts_single_image_field_with_declared_type() {
    let (url, requests) = spawn_classify_server(MockReply::json(
        StatusCode::OK,
        r#"{"success":true,"predictions":[{"class":"cat","probability":90},{"class":"dog","probability":10}],"processing_time":0.2,"filename":"20240101_120000_photo.jpg"}"#,
    ))
    .await
    .expect("spawn server");

    let response = client_for(url)
        .classify(jpeg_upload())
        .await
        .expect("classify");

    assert_eq!(
        response.predictions,
        vec![Prediction::new("cat", 90.0), Prediction::new("dog", 10.0)]
    );
    assert_eq!(response.processing_time_seconds, 0.2);
    assert_eq!(
        response.stored_filename.as_deref(),
        Some("20240101_120000_photo.jpg")
    );

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 1);
    let fields = &requests[0];
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].name, "image");
    assert_eq!(fields[0].file_name.as_deref(), Some("photo.jpg"));
    assert_eq!(fields[0].content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(fields[0].bytes, jpeg_upload().bytes);
}

#[tokio::test]
async fn endpoint_with_path_prefix_keeps_prefix() {
    let (url, _requests) = spawn_classify_server(MockReply::json(StatusCode::OK, "{}"))
        .await
        .expect("spawn server");
    let prefixed = url.join("api").expect("join");
    let client = client_for(prefixed);
    assert!(client.endpoint().path().ends_with("/api/"));
}

#[tokio::test]
async fn success_false_body_maps_to_application_error() {
    let (url, _requests) = spawn_classify_server(MockReply::json(
        StatusCode::OK,
        r#"{"success":false,"error":"Error classifying image"}"#,
    ))
    .await
    .expect("spawn server");

    let err = client_for(url)
        .classify(jpeg_upload())
        .await
        .expect_err("must fail");
    assert!(matches!(
        &err,
        ClassifyError::Application(Some(message)) if message == "Error classifying image"
    ));
    assert_eq!(err.user_message(), "Error classifying image");
}

#[tokio::test]
async fn success_false_without_message_uses_generic_text() {
    let (url, _requests) =
        spawn_classify_server(MockReply::json(StatusCode::OK, r#"{"success":false}"#))
            .await
            .expect("spawn server");

    let err = client_for(url)
        .classify(jpeg_upload())
        .await
        .expect_err("must fail");
    assert!(matches!(err, ClassifyError::Application(None)));
    assert!(!err.user_message().is_empty());
}

#[tokio::test]
async fn server_error_status_maps_to_transport_error() {
    let (url, _requests) = spawn_classify_server(MockReply::json(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"success":false,"error":"Internal server error occurred."}"#,
    ))
    .await
    .expect("spawn server");

    let err = client_for(url)
        .classify(jpeg_upload())
        .await
        .expect_err("must fail");
    match &err {
        ClassifyError::Transport(TransportError::Status {
            status,
            server_message,
        }) => {
            assert_eq!(*status, 500);
            assert_eq!(
                server_message.as_deref(),
                Some("Internal server error occurred.")
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.user_message().contains("500"));
}

#[tokio::test]
async fn error_status_with_html_body_is_still_transport_error() {
    let (url, _requests) = spawn_classify_server(MockReply::json(
        StatusCode::BAD_GATEWAY,
        "<html>bad gateway</html>",
    ))
    .await
    .expect("spawn server");

    let err = client_for(url)
        .classify(jpeg_upload())
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        ClassifyError::Transport(TransportError::Status {
            status: 502,
            server_message: None
        })
    ));
}

#[tokio::test]
async fn undecodable_success_body_is_transport_error() {
    let (url, _requests) = spawn_classify_server(MockReply::json(StatusCode::OK, "not json"))
        .await
        .expect("spawn server");

    let err = client_for(url)
        .classify(jpeg_upload())
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        ClassifyError::Transport(TransportError::Decode(_))
    ));
}

#[tokio::test]
async fn slow_endpoint_hits_client_timeout() {
    let mut reply = MockReply::json(StatusCode::OK, r#"{"success":true,"predictions":[]}"#);
    reply.delay = Some(Duration::from_secs(3));
    let (url, _requests) = spawn_classify_server(reply).await.expect("spawn server");

    let client = HttpClassifierClient::new(url, Duration::from_millis(200)).expect("client");
    let err = client
        .classify(jpeg_upload())
        .await
        .expect_err("must time out");
    assert!(matches!(
        err,
        ClassifyError::Transport(TransportError::Timeout)
    ));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let url = Url::parse(&format!("http://{addr}")).expect("url");
    let err = client_for(url)
        .classify(jpeg_upload())
        .await
        .expect_err("must fail");
    assert!(err.is_transport());
}

#[tokio::test]
async fn unencodable_content_type_is_not_reported_as_network_failure() {
    let (url, requests) = spawn_classify_server(MockReply::json(StatusCode::OK, "{}"))
        .await
        .expect("spawn server");

    let upload = ClassificationUpload {
        mime_type: "not a mime".to_string(),
        ..jpeg_upload()
    };
    let err = client_for(url)
        .classify(upload)
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        ClassifyError::Transport(TransportError::InvalidUpload(_))
    ));
    assert!(err.user_message().contains("could not be prepared"));
    assert!(requests.lock().await.is_empty());
}

#[tokio::test]
async fn endpoint_that_cannot_hold_routes_reports_invalid_route() {
    let url = Url::parse("mailto:ops@example.com").expect("url");
    let client = client_for(url);

    let err = client
        .classify(jpeg_upload())
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        ClassifyError::Transport(TransportError::InvalidRoute { ref path, .. }) if path == "classify"
    ));
    assert!(err.user_message().contains("endpoint address is invalid"));

    let err = client.health().await.expect_err("must fail");
    assert!(matches!(
        err,
        ClassifyError::Transport(TransportError::InvalidRoute { .. })
    ));
}

#[tokio::test]
async fn health_reports_service_status() {
    let (url, _requests) = spawn_classify_server(MockReply::json(StatusCode::OK, "{}"))
        .await
        .expect("spawn server");

    let health = client_for(url).health().await.expect("health");
    assert!(health.is_healthy());
    assert_eq!(health.model, "ResNet50");
}
