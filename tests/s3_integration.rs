//! Integration tests for the S3 path using MinIO via testcontainers
//!
//! These tests require Docker to be running and use the testcontainers crate
//! to spin up a MinIO instance for realistic S3 testing.
//!
//! Run with: cargo test --test s3_integration
//!
//! Note: Tests are conditionally skipped if Docker is not available.

use image_uploader::s3::{ObjectStore, PublicUrl, S3Client, S3ClientConfig};
use image_uploader::{ImageUploader, UploadError, UploaderConfig};
use std::time::Duration;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::minio::MinIO;

/// MinIO default credentials
const MINIO_ACCESS_KEY: &str = "minioadmin";
const MINIO_SECRET_KEY: &str = "minioadmin";

const PUBLIC_BASE: &str = "https://pub-test.r2.dev";

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01";

/// Test helper to check if Docker is available
fn docker_available() -> bool {
    std::process::Command::new("docker")
        .arg("info")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Start MinIO and return the container with its endpoint URL
async fn start_minio() -> (ContainerAsync<MinIO>, String) {
    let container = MinIO::default()
        .with_env_var("MINIO_ROOT_USER", MINIO_ACCESS_KEY)
        .with_env_var("MINIO_ROOT_PASSWORD", MINIO_SECRET_KEY)
        .start()
        .await
        .expect("Failed to start MinIO container");

    let host = container.get_host().await.expect("Failed to get container host");
    let port = container
        .get_host_port_ipv4(9000)
        .await
        .expect("Failed to get MinIO port");

    // Wait for MinIO to be ready
    tokio::time::sleep(Duration::from_secs(2)).await;

    (container, format!("http://{}:{}", host, port))
}

fn minio_config(endpoint: &str, bucket: &str) -> UploaderConfig {
    UploaderConfig {
        s3: S3ClientConfig {
            endpoint_url: Some(endpoint.to_string()),
            force_path_style: true,
            region: Some("us-east-1".to_string()),
            access_key_id: Some(MINIO_ACCESS_KEY.to_string()),
            secret_access_key: Some(MINIO_SECRET_KEY.to_string()),
            bucket: bucket.to_string(),
            operation_timeout: Some(Duration::from_secs(30)),
        },
        public_url: PublicUrl::parse(PUBLIC_BASE).unwrap(),
        request_timeout: None,
    }
}

/// Create the bucket and an uploader pointing at it
async fn minio_uploader(endpoint: &str, bucket: &str) -> ImageUploader<S3Client> {
    let config = minio_config(endpoint, bucket);
    S3Client::with_config(config.s3.clone())
        .create_bucket()
        .await
        .expect("Failed to create bucket");
    ImageUploader::new(config)
}

/// Upload, fetch back, check URL and content type
#[tokio::test]
async fn test_upload_and_fetch() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    let uploader = minio_uploader(&endpoint, "images").await;

    let url = uploader.upload(PNG, "frog.png").await.expect("Failed to upload");
    assert_eq!(url, format!("{}/frog.png", PUBLIC_BASE));

    let fetched = uploader.fetch("frog.png").await.expect("Failed to fetch");
    assert_eq!(fetched.as_ref(), PNG);

    assert!(uploader.store().object_exists("frog.png").await.unwrap());
}

/// Objects are stored with the sniffed content type
#[tokio::test]
async fn test_upload_sets_content_type() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    let uploader = minio_uploader(&endpoint, "typed").await;

    uploader.upload(PNG, "frog.jpg").await.unwrap();

    let sdk = aws_sdk_s3::Client::from_conf(
        aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .endpoint_url(&endpoint)
            .force_path_style(true)
            .credentials_provider(aws_sdk_s3::config::Credentials::new(
                MINIO_ACCESS_KEY,
                MINIO_SECRET_KEY,
                None,
                None,
                "test",
            ))
            .build(),
    );
    let head = sdk
        .head_object()
        .bucket("typed")
        .key("frog.jpg")
        .send()
        .await
        .expect("Failed to head object");

    assert_eq!(head.content_type(), Some("image/png"));
}

/// Delete removes the object; a second fetch is not-found
#[tokio::test]
async fn test_delete_then_fetch() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    let uploader = minio_uploader(&endpoint, "delete-test").await;

    uploader.upload(PNG, "to-delete.png").await.unwrap();
    uploader.delete("to-delete.png").await.expect("Failed to delete");

    assert!(!uploader.store().object_exists("to-delete.png").await.unwrap());

    let err = uploader.fetch("to-delete.png").await.unwrap_err();
    assert!(err.is_not_found(), "expected not found, got {err:?}");
}

/// Deleting a key that never existed succeeds
#[tokio::test]
async fn test_delete_missing_key() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    let uploader = minio_uploader(&endpoint, "idempotent").await;

    uploader
        .delete("never-uploaded.png")
        .await
        .expect("Delete of missing key should succeed");
}

/// Overwrites keep the last write
#[tokio::test]
async fn test_overwrite() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    let uploader = minio_uploader(&endpoint, "overwrite").await;

    uploader.upload(&b"first"[..], "same.txt").await.unwrap();
    uploader.upload(&b"second"[..], "same.txt").await.unwrap();

    let fetched = uploader.store().get_object("same.txt").await.unwrap();
    assert_eq!(fetched.as_ref(), b"second");
}

/// Bad credentials are only reported on first use
#[tokio::test]
async fn test_bad_credentials_fail_on_first_use() {
    if !docker_available() {
        eprintln!("Skipping test: Docker not available");
        return;
    }

    let (_container, endpoint) = start_minio().await;
    minio_uploader(&endpoint, "secured").await;

    let mut config = minio_config(&endpoint, "secured");
    config.s3.secret_access_key = Some("wrong-secret".to_string());
    let uploader = ImageUploader::new(config);

    let err = uploader.upload(PNG, "frog.png").await.unwrap_err();
    assert!(matches!(err, UploadError::Store(_)), "got {err:?}");
    assert!(!err.is_not_found());
}
