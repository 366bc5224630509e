//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from lambo-core.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ObjectCannedAcl, StorageClass};
use bytes::Bytes;
use lambo_core::{
    Error, GetObjectOutput, ListOptions, ListResult, ObjectBody, ObjectInfo, ObjectStore,
    PutObjectRequest, Result, StorageConfig,
};

/// S3 client wrapper
#[derive(Debug, Clone)]
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from a storage configuration
    pub async fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        // Without static credentials the default provider chain applies
        // (environment, profile, instance metadata).
        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            let credentials = aws_credential_types::Credentials::new(
                access_key,
                secret_key,
                None, // session token
                None, // expiry
                "lambo-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        // Path-style addressing only matters for custom endpoints
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some() && config.bucket_lookup.force_path_style())
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Wrap an already configured SDK client
    pub fn from_sdk(inner: aws_sdk_s3::Client) -> Self {
        Self { inner }
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    /// Format AWS SDK error into a detailed error message
    fn format_sdk_error<E: std::fmt::Display>(error: &SdkError<E>) -> String {
        match error {
            SdkError::ServiceError(service_err) => {
                let err = service_err.err();
                let meta = service_err.raw();
                let mut msg = format!("Service error: {}", err);
                // Try to extract additional error information from headers
                if let Some(code) = meta.headers().get("x-amz-error-code") {
                    msg.push_str(&format!(" (code: {})", code));
                }
                msg
            }
            SdkError::ConstructionFailure(err) => {
                format!("Request construction failed: {:?}", err)
            }
            SdkError::TimeoutError(_) => "Request timeout".to_string(),
            SdkError::DispatchFailure(err) => {
                format!("Network dispatch error: {:?}", err)
            }
            SdkError::ResponseError(err) => {
                format!("Response error: {:?}", err)
            }
            _ => error.to_string(),
        }
    }

    /// Backend error for a failed request, keeping the SDK error as cause
    fn sdk_error<E>(bucket: &str, key: Option<&str>, context: &str, error: SdkError<E>) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let detail = Self::format_sdk_error(&error);
        Error::Backend {
            bucket: bucket.to_string(),
            key: key.map(str::to_string),
            message: format!("{context}: {detail}"),
            source: Some(Box::new(error)),
        }
    }
}

fn require_bucket(bucket: &str) -> Result<()> {
    if bucket.is_empty() {
        return Err(Error::backend("", "missing required bucket name"));
    }
    Ok(())
}

async fn byte_stream(body: ObjectBody) -> Result<ByteStream> {
    match body {
        ObjectBody::Bytes(bytes) => Ok(ByteStream::from(bytes)),
        ObjectBody::File { path, file } => ByteStream::read_from()
            .file(file)
            .build()
            .await
            .map_err(|e| Error::Filesystem {
                message: format!("unable to read {}: {e}", path.display()),
                path,
                source: Some(std::io::Error::other(e)),
            }),
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        let PutObjectRequest {
            bucket,
            key,
            content_type,
            body,
            options,
        } = request;
        require_bucket(&bucket)?;

        let body = byte_stream(body).await?;

        let mut builder = self
            .inner
            .put_object()
            .bucket(&bucket)
            .key(&key)
            .content_type(&content_type)
            .body(body)
            .set_cache_control(options.cache_control)
            .set_content_disposition(options.content_disposition)
            .set_content_encoding(options.content_encoding)
            .set_content_language(options.content_language);

        if let Some(class) = options.storage_class {
            builder = builder.storage_class(StorageClass::from(class.as_str()));
        }

        if let Some(acl) = options.acl {
            builder = builder.acl(ObjectCannedAcl::from(acl.as_str()));
        }

        if !options.metadata.is_empty() {
            let metadata: HashMap<String, String> = options.metadata.into_iter().collect();
            builder = builder.set_metadata(Some(metadata));
        }

        builder.send().await.map_err(|e| {
            Self::sdk_error(&bucket, Some(&key), &format!("unable to put object {key}"), e)
        })?;

        tracing::debug!(bucket = %bucket, key = %key, content_type = %content_type, "put object");
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetObjectOutput> {
        require_bucket(bucket)?;

        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let no_such_key = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if no_such_key {
                    Error::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    Self::sdk_error(bucket, Some(key), &format!("unable to get object {key}"), e)
                }
            })?;

        let content_type = response.content_type().map(str::to_string);
        let body: Bytes = response
            .body
            .collect()
            .await
            .map_err(|e| {
                let message = format!("unable to read object {key}: {e}");
                Error::backend_key(bucket, key, message, e)
            })?
            .into_bytes();

        Ok(GetObjectOutput { body, content_type })
    }

    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult> {
        require_bucket(bucket)?;

        let mut request = self
            .inner
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(options.prefix)
            .set_continuation_token(options.continuation_token);

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        let response = request.send().await.map_err(|e| {
            Self::sdk_error(bucket, None, &format!("unable to list objects in bucket {bucket}"), e)
        })?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let mut info = ObjectInfo::new(
                    object.key().unwrap_or_default(),
                    object.size().unwrap_or(0),
                );
                if let Some(modified) = object.last_modified() {
                    info.last_modified = jiff::Timestamp::from_second(modified.secs()).ok();
                }
                if let Some(etag) = object.e_tag() {
                    info.etag = Some(etag.trim_matches('"').to_string());
                }
                info
            })
            .collect();

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambo_core::{ErrorKind, PutOptions};

    fn local_config() -> StorageConfig {
        StorageConfig {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            access_key: Some("test".to_string()),
            secret_key: Some("test".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let config = StorageConfig {
            access_key: Some("only-access".to_string()),
            ..Default::default()
        };
        let err = S3Client::new(config).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_put_without_bucket_is_backend_error() {
        let client = S3Client::new(local_config()).await.unwrap();
        let err = client
            .put_object(PutObjectRequest {
                bucket: String::new(),
                key: "a.txt".to_string(),
                content_type: "text/plain".to_string(),
                body: ObjectBody::Bytes(Bytes::from_static(b"a")),
                options: PutOptions::default(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[tokio::test]
    async fn test_get_and_list_without_bucket() {
        let client = S3Client::new(local_config()).await.unwrap();
        let err = client.get_object("", "k").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);

        let err = client
            .list_objects("", ListOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[tokio::test]
    async fn test_file_body_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let file = tokio::fs::File::open(&path).await.unwrap();
        let stream = byte_stream(ObjectBody::File { path, file }).await.unwrap();
        let bytes = stream.collect().await.unwrap().into_bytes();
        assert_eq!(bytes.as_ref(), b"hello");
    }
}
