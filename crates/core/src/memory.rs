//! In-memory object store
//!
//! A complete [`ObjectStore`] that keeps objects in process memory. Useful as
//! a substitute backend when exercising uploads without a live service.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::traits::{
    GetObjectOutput, ListOptions, ListResult, ObjectBody, ObjectInfo, ObjectStore,
    PutObjectRequest, PutOptions,
};

const DEFAULT_MAX_KEYS: usize = 1000;

/// An object held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
    pub options: PutOptions,
}

/// Object store backed by a map of `(bucket, key)` to object
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<(String, String), StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently stored in `bucket`, sorted
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .read()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// A stored object, if present
    pub async fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Total number of objects across all buckets
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

async fn read_body(body: ObjectBody) -> Result<Bytes> {
    match body {
        ObjectBody::Bytes(bytes) => Ok(bytes),
        ObjectBody::File { path, mut file } => {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf).await.map_err(|e| {
                Error::filesystem(&path, format!("unable to read {}: {e}", path.display()), e)
            })?;
            Ok(Bytes::from(buf))
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        if request.bucket.is_empty() {
            return Err(Error::backend("", "missing required bucket name"));
        }
        if request.key.is_empty() {
            return Err(Error::backend(&request.bucket, "missing required key"));
        }

        // The body is fully read before the map is touched so a failed read
        // leaves any previous object in place.
        let body = read_body(request.body).await?;

        self.objects.write().await.insert(
            (request.bucket, request.key),
            StoredObject {
                body,
                content_type: request.content_type,
                options: request.options,
            },
        );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetObjectOutput> {
        if bucket.is_empty() {
            return Err(Error::backend("", "missing required bucket name"));
        }

        self.object(bucket, key)
            .await
            .map(|object| GetObjectOutput {
                body: object.body,
                content_type: Some(object.content_type),
            })
            .ok_or_else(|| Error::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult> {
        if bucket.is_empty() {
            return Err(Error::backend("", "missing required bucket name"));
        }

        let max_keys = options
            .max_keys
            .and_then(|m| usize::try_from(m).ok())
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_MAX_KEYS);
        let prefix = options.prefix.unwrap_or_default();

        let objects = self.objects.read().await;
        let mut matching = objects
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(&prefix))
            .filter(|((_, k), _)| match &options.continuation_token {
                Some(after) => k > after,
                None => true,
            })
            .map(|((_, k), object)| ObjectInfo::new(k, object.body.len() as i64));

        let items: Vec<ObjectInfo> = matching.by_ref().take(max_keys).collect();
        let truncated = matching.next().is_some();
        let continuation_token = if truncated {
            items.last().map(|item| item.key.clone())
        } else {
            None
        };

        Ok(ListResult {
            items,
            truncated,
            continuation_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn put(bucket: &str, key: &str, body: &'static str) -> PutObjectRequest {
        PutObjectRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: "text/plain".to_string(),
            body: ObjectBody::Bytes(Bytes::from_static(body.as_bytes())),
            options: PutOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        store.put_object(put("b", "a.txt", "hello")).await.unwrap();

        let out = store.get_object("b", "a.txt").await.unwrap();
        assert_eq!(out.body, Bytes::from_static(b"hello"));
        assert_eq!(out.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_overwrite_does_not_duplicate() {
        let store = MemoryStore::new();
        store.put_object(put("b", "a.txt", "one")).await.unwrap();
        store.put_object(put("b", "a.txt", "two")).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.object("b", "a.txt").await.unwrap().body,
            Bytes::from_static(b"two")
        );
    }

    #[tokio::test]
    async fn test_missing_bucket_rejected() {
        let store = MemoryStore::new();
        let err = store.put_object(put("", "a.txt", "x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemoryStore::new();
        let err = store.get_object("b", "nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.key(), Some("nope"));
    }

    #[tokio::test]
    async fn test_file_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"\x00\x01\x02").unwrap();

        let store = MemoryStore::new();
        let file = tokio::fs::File::open(&path).await.unwrap();
        store
            .put_object(PutObjectRequest {
                bucket: "b".to_string(),
                key: "f.bin".to_string(),
                content_type: "application/octet-stream".to_string(),
                body: ObjectBody::File { path, file },
                options: PutOptions::default(),
            })
            .await
            .unwrap();

        assert_eq!(
            store.object("b", "f.bin").await.unwrap().body.as_ref(),
            b"\x00\x01\x02"
        );
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let store = MemoryStore::new();
        for key in ["a", "b", "c", "d", "e"] {
            store.put_object(put("b", key, "x")).await.unwrap();
        }
        store.put_object(put("other", "z", "x")).await.unwrap();

        let first = store
            .list_objects(
                "b",
                ListOptions {
                    max_keys: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.truncated);
        assert_eq!(first.continuation_token.as_deref(), Some("b"));

        let rest = store
            .list_objects(
                "b",
                ListOptions {
                    continuation_token: first.continuation_token,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let keys: Vec<_> = rest.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, ["c", "d", "e"]);
        assert!(!rest.truncated);
        assert!(rest.continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_list_prefix() {
        let store = MemoryStore::new();
        store.put_object(put("b", "pub/a", "x")).await.unwrap();
        store.put_object(put("b", "priv/b", "x")).await.unwrap();

        let page = store
            .list_objects(
                "b",
                ListOptions {
                    prefix: Some("pub/".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.items, vec![ObjectInfo::new("pub/a", 1)]);
    }
}
