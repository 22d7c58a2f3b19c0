use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
};

use crate::{
    conf::settings,
    prelude::{AppError, Result},
};

#[async_trait]
pub trait S3Ops: Send + Sync {
    /// Stores the object, overwriting any previous one under `key`, and returns its URL.
    async fn upload_object(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: &str) -> Result<String>;
    async fn retrieve_object(&self, bucket: &str, key: &str) -> Result<(Vec<u8>, String)>;
    async fn signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String>;
}

/// Recovers the object key from a URL produced by `upload_object`.
pub fn key_from_url(bucket: &str, url: &str) -> Option<String> {
    let marker = format!("/{}/", bucket);
    url.split_once(&marker).map(|(_, key)| key.to_string())
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    endpoint: String,
}

impl S3Storage {
    pub fn from_settings() -> Self {
        let creds = Credentials::new(
            &settings.s3_access_key,
            &settings.s3_secret_key,
            None,
            None,
            "casereel-static",
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.s3_region.clone()))
            .endpoint_url(&settings.s3_endpoint)
            .credentials_provider(creds)
            .force_path_style(true)
            .build();
        S3Storage {
            client: Client::from_conf(config),
            endpoint: settings.s3_endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl S3Ops for S3Storage {
    async fn upload_object(&self, bucket: &str, key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("{}: {}", key, e)))?;
        tracing::debug!("uploaded {} bytes to {}/{}", size, bucket, key);
        Ok(format!("{}/{}/{}", self.endpoint, bucket, key))
    }

    async fn retrieve_object(&self, bucket: &str, key: &str) -> Result<(Vec<u8>, String)> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("{}: {}", key, e)))?;
        let content_type = output
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?
            .into_bytes()
            .to_vec();
        Ok((data, content_type))
    }

    async fn signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        let presign = PresigningConfig::expires_in(ttl).map_err(|e| AppError::Storage(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presign)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        Ok(request.uri().to_string())
    }
}

pub async fn create_bucket(
    client: &aws_sdk_s3::Client,
    bucket_name: &str,
) -> Result<Option<aws_sdk_s3::operation::create_bucket::CreateBucketOutput>> {
    let mut create = client.create_bucket().bucket(bucket_name);
    // us-east-1 rejects an explicit location constraint
    if settings.s3_region != "us-east-1" {
        let constraint = aws_sdk_s3::types::BucketLocationConstraint::from(settings.s3_region.as_str());
        let cfg = aws_sdk_s3::types::CreateBucketConfiguration::builder()
            .location_constraint(constraint)
            .build();
        create = create.create_bucket_configuration(cfg);
    }
    create.send().await.map(Some).or_else(|err| {
        if err
            .as_service_error()
            .map(|se| se.is_bucket_already_exists() || se.is_bucket_already_owned_by_you())
            == Some(true)
        {
            Ok(None)
        } else {
            Err(AppError::Storage(format!("create bucket {}: {}", bucket_name, err)))
        }
    })
}
