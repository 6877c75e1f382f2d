//! Round trips against a local MinIO. Run with `cargo test -- --ignored` once
//! the object storage container is up.

use std::time::Duration;

use aws_sdk_s3::Client as AwsS3SdkClient;
use common_s3::{create_s3_client, S3Client, S3Config, S3Error, S3Impl};

const TEST_BUCKET: &str = "media-sync-test-bucket";
const S3_ENDPOINT: &str = "http://127.0.0.1:19000"; // MinIO

async fn create_test_s3_client() -> (S3Impl, AwsS3SdkClient) {
    std::env::set_var("AWS_ACCESS_KEY_ID", "object_storage_root_user");
    std::env::set_var("AWS_SECRET_ACCESS_KEY", "object_storage_root_password");

    let aws_client = create_s3_client(&S3Config {
        region: "us-east-1".to_string(),
        endpoint: Some(S3_ENDPOINT.to_string()),
        force_path_style: true,
        operation_timeout: Duration::from_secs(10),
    })
    .await;

    (S3Impl::new(aws_client.clone()), aws_client)
}

async fn ensure_bucket_exists(client: &AwsS3SdkClient) {
    // Ignore "already exists"
    if let Err(e) = client.create_bucket().bucket(TEST_BUCKET).send().await {
        eprintln!("create_bucket: {e}");
    }
}

#[tokio::test]
#[ignore = "requires MinIO on 127.0.0.1:19000"]
async fn test_head_copy_put_round_trip() {
    let (s3_client, aws_client) = create_test_s3_client().await;
    ensure_bucket_exists(&aws_client).await;

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("round trip.jpg");
    std::fs::write(&local, b"not really a jpeg").unwrap();

    s3_client
        .put_object_from_file(TEST_BUCKET, "it/round trip.jpg", &local, "image/jpeg")
        .await
        .expect("Failed to upload");

    let head = s3_client
        .head_object(TEST_BUCKET, "it/round trip.jpg")
        .await
        .expect("Failed to head uploaded object");
    assert_eq!(head.content_length, Some(17));
    assert_eq!(head.content_type.as_deref(), Some("image/jpeg"));
    assert!(head.last_modified.is_some());
    assert!(head.etag.is_some());

    s3_client
        .copy_object(TEST_BUCKET, "it/round trip.jpg", "it/round trip.psd")
        .await
        .expect("Failed to copy");
    let backup = s3_client
        .head_object(TEST_BUCKET, "it/round trip.psd")
        .await
        .expect("Failed to head backup");
    assert_eq!(backup.content_length, Some(17));

    for key in ["it/round trip.jpg", "it/round trip.psd"] {
        if let Err(e) = aws_client
            .delete_object()
            .bucket(TEST_BUCKET)
            .key(key)
            .send()
            .await
        {
            eprintln!("cleanup of {key} failed: {e}");
        }
    }
}

#[tokio::test]
#[ignore = "requires MinIO on 127.0.0.1:19000"]
async fn test_head_missing_object_is_not_found() {
    let (s3_client, aws_client) = create_test_s3_client().await;
    ensure_bucket_exists(&aws_client).await;

    let result = s3_client
        .head_object(TEST_BUCKET, "it/definitely-not-there.jpg")
        .await;
    assert!(matches!(result, Err(S3Error::NotFound(_))));
}
