//! Single-object uploads

use std::path::PathBuf;

use bytes::Bytes;

use crate::content_type;
use crate::error::{Error, Result};
use crate::traits::{ObjectBody, ObjectStore, PutObjectRequest, PutOptions};

/// A local file and where it should land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub local_path: PathBuf,
    pub bucket: String,
    pub key: String,
    /// Resolved from `local_path` when `None`
    pub content_type: Option<String>,
}

impl UploadTarget {
    pub fn new(
        local_path: impl Into<PathBuf>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            bucket: bucket.into(),
            key: key.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Stream a local file to `target.bucket`/`target.key`.
///
/// Failing to open the file is a filesystem error. Any failure reported by
/// the store is a backend error carrying bucket and key, except a filesystem
/// error raised while the store was reading the body, which is kept as is.
pub async fn upload_file(
    store: &dyn ObjectStore,
    target: UploadTarget,
    options: &PutOptions,
) -> Result<()> {
    let UploadTarget {
        local_path,
        bucket,
        key,
        content_type,
    } = target;

    let file = tokio::fs::File::open(&local_path).await.map_err(|e| {
        Error::filesystem(
            &local_path,
            format!("unable to upload file {}: {e}", local_path.display()),
            e,
        )
    })?;

    let content_type = content_type.unwrap_or_else(|| content_type::resolve(&local_path));
    let request = PutObjectRequest {
        bucket: bucket.clone(),
        key: key.clone(),
        content_type: content_type.clone(),
        body: ObjectBody::File {
            path: local_path.clone(),
            file,
        },
        options: options.clone(),
    };

    match store.put_object(request).await {
        Ok(()) => {
            tracing::debug!(
                bucket = %bucket,
                key = %key,
                content_type = %content_type,
                "uploaded file"
            );
            Ok(())
        }
        Err(e @ Error::Filesystem { .. }) => Err(e),
        Err(e) => {
            let message = format!(
                "unable to upload file {} at {key} in bucket {bucket}: {e}",
                local_path.display()
            );
            Err(Error::backend_key(bucket, key, message, e))
        }
    }
}

/// Upload in-memory content to `bucket`/`key`, typed from the key's extension.
pub async fn upload_bytes(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
    body: Bytes,
    options: &PutOptions,
) -> Result<()> {
    let content_type = content_type::resolve(key);
    let request = PutObjectRequest {
        bucket: bucket.to_string(),
        key: key.to_string(),
        content_type: content_type.clone(),
        body: ObjectBody::Bytes(body),
        options: options.clone(),
    };

    store.put_object(request).await.map_err(|e| {
        let message = format!("unable to upload content at {key} in bucket {bucket}: {e}");
        Error::backend_key(bucket, key, message, e)
    })?;

    tracing::debug!(bucket, key, content_type = %content_type, "uploaded content");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::MemoryStore;
    use crate::traits::MockObjectStore;

    #[tokio::test]
    async fn test_upload_file_resolves_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.json");
        std::fs::write(&path, r#"{"upload":"test"}"#).unwrap();

        let store = MemoryStore::new();
        upload_file(
            &store,
            UploadTarget::new(&path, "bucket", "b.json"),
            &PutOptions::default(),
        )
        .await
        .unwrap();

        let object = store.object("bucket", "b.json").await.unwrap();
        assert_eq!(object.content_type, "application/json");
        assert_eq!(object.body.as_ref(), br#"{"upload":"test"}"#);
    }

    #[tokio::test]
    async fn test_upload_file_keeps_supplied_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page");
        std::fs::write(&path, "<p>hi</p>").unwrap();

        let store = MemoryStore::new();
        let options = PutOptions {
            cache_control: Some("max-age=60".to_string()),
            ..Default::default()
        };
        upload_file(
            &store,
            UploadTarget::new(&path, "bucket", "page").with_content_type("text/html"),
            &options,
        )
        .await
        .unwrap();

        let object = store.object("bucket", "page").await.unwrap();
        assert_eq!(object.content_type, "text/html");
        assert_eq!(object.options, options);
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unknown_file.js");

        // The store must never be called.
        let store = MockObjectStore::new();
        let err = upload_file(
            &store,
            UploadTarget::new(&path, "bucket", "unknown_file.js"),
            &PutOptions::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Filesystem);
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_store_failure_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "a").unwrap();

        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .withf(|req| req.key == "a.txt" && req.content_type == "text/plain")
            .times(1)
            .returning(|req| Err(Error::backend(req.bucket, "AccessDenied")));

        let err = upload_file(
            &store,
            UploadTarget::new(&path, "bucket", "a.txt"),
            &PutOptions::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Backend);
        assert_eq!(err.bucket(), Some("bucket"));
        assert_eq!(err.key(), Some("a.txt"));
        assert!(err.to_string().contains("AccessDenied"));
    }

    #[tokio::test]
    async fn test_store_filesystem_failure_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "a").unwrap();

        let mut store = MockObjectStore::new();
        store.expect_put_object().returning(|req| {
            let ObjectBody::File { path, .. } = req.body else {
                panic!("expected a file body");
            };
            Err(Error::filesystem_msg(path, "read failed"))
        });

        let err = upload_file(
            &store,
            UploadTarget::new(&path, "bucket", "a.txt"),
            &PutOptions::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Filesystem);
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_upload_bytes() {
        let store = MemoryStore::new();
        upload_bytes(
            &store,
            "bucket",
            "upload_test.txt",
            Bytes::from_static(b"{\"upload\":\"test\"}"),
            &PutOptions::default(),
        )
        .await
        .unwrap();

        let object = store.object("bucket", "upload_test.txt").await.unwrap();
        assert_eq!(object.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_upload_bytes_without_bucket() {
        let store = MemoryStore::new();
        let err = upload_bytes(
            &store,
            "",
            "upload_test.txt",
            Bytes::new(),
            &PutOptions::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Backend);
        assert_eq!(err.key(), Some("upload_test.txt"));
    }
}
