//! End-to-end router tests against the local storage provider.

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use qrshare_api::{AppState, create_router};
use qrshare_core::cors::OriginPolicy;
use qrshare_core::fake::FakeQrIssuer;
use qrshare_core::qr::{QrConfig, QrIssuer, QrService};
use qrshare_core::storage::{AssetStore, StorageConfig, StorageProvider, StorageService};
use qrshare_core::upload::{UploadPolicy, UploadService};
use tower::ServiceExt;

const BASE_URL: &str = "http://localhost:8080";
const BOUNDARY: &str = "router-test-boundary";

fn local_store(root: &Path) -> Arc<StorageService> {
    let config = StorageConfig::new(StorageProvider::local_fs(root), format!("{BASE_URL}/files"));
    Arc::new(StorageService::from_config(config).expect("local storage"))
}

fn app(root: &Path, qr: Option<Arc<dyn QrIssuer>>, origins: Option<&str>) -> Router {
    let store = local_store(root);
    let qr = qr.unwrap_or_else(|| {
        let store: Arc<dyn AssetStore> = store.clone();
        Arc::new(QrService::new(store, QrConfig::default()))
    });
    let uploads = UploadService::new(
        store.clone(),
        qr,
        UploadPolicy::new(64 * 1024, ["image/", "application/pdf", "text/plain"], ["txt"]),
    );

    create_router(AppState {
        policy: Arc::new(OriginPolicy::from_config(origins)),
        uploads: Arc::new(uploads),
        storage_provider: store.provider_name(),
        files_root: Some(root.to_path_buf()),
    })
}

fn upload_request(file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::from(body))
        .unwrap()
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Router path of a URL issued by the local store.
fn local_path(url: &str) -> &str {
    url.strip_prefix(BASE_URL).expect("local URL")
}

fn decode_qr(png: &[u8]) -> String {
    let image = image::load_from_memory(png).unwrap().to_luma8();
    let (w, h) = image.dimensions();
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
            image.get_pixel(x as u32, y as u32).0[0]
        });
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1);
    grids[0].decode().unwrap().1
}

#[tokio::test]
async fn test_upload_then_fetch_file_and_qr() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), None, Some("https://app.example.com"));

    let response = app
        .clone()
        .oneshot(upload_request("notes.txt", "text/plain", b"hello qr"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.com"
    );

    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let file_url = body["publicFileUrl"].as_str().unwrap();
    let qr_url = body["qrCodeUrl"].as_str().unwrap();
    assert_eq!(body["qrTargetUrl"], file_url);

    let file = app.clone().oneshot(get(local_path(file_url))).await.unwrap();
    assert_eq!(file.status(), StatusCode::OK);
    assert_eq!(body_bytes(file).await, b"hello qr");

    let qr = app.oneshot(get(local_path(qr_url))).await.unwrap();
    assert_eq!(qr.status(), StatusCode::OK);
    assert_eq!(decode_qr(&body_bytes(qr).await), file_url);
}

#[tokio::test]
async fn test_qr_failure_leaves_file_fetchable() {
    let dir = tempfile::tempdir().unwrap();
    let qr: Arc<dyn QrIssuer> = Arc::new(FakeQrIssuer::failing("renderer unavailable"));
    let app = app(dir.path(), Some(qr), None);

    let response = app
        .clone()
        .oneshot(upload_request("scan.pdf", "application/pdf", b"%PDF-1.7"))
        .await
        .unwrap();
    assert!(response.status().is_server_error());

    // The file was stored before issuance failed; find it on disk.
    let uploads = std::fs::read_dir(dir.path().join("uploads"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect::<Vec<_>>();
    assert_eq!(uploads.len(), 1);
    let id = uploads[0].file_name().unwrap().to_str().unwrap();

    let file = app
        .oneshot(get(&format!("/files/uploads/{id}/scan.pdf")))
        .await
        .unwrap();
    assert_eq!(file.status(), StatusCode::OK);
    assert_eq!(body_bytes(file).await, b"%PDF-1.7");
}

#[tokio::test]
async fn test_denied_origin_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), None, Some("https://*.trusted.example"));

    let response = app
        .oneshot(upload_request("notes.txt", "text/plain", b"hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(!dir.path().join("uploads").exists());
}

#[tokio::test]
async fn test_bare_options_upload_is_no_content() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), None, Some("https://app.example.com"));

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/upload")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.com"
    );
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_health_reports_provider() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(dir.path(), None, None)
        .oneshot(get("/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "local");
}
