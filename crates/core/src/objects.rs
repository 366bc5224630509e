//! Read helpers: object content, content hash and key listing

use bytes::Bytes;
use md5::{Digest, Md5};

use crate::error::{Error, Result};
use crate::filter::ListKeysOptions;
use crate::traits::{ListOptions, ObjectStore};

const LIST_PAGE_SIZE: i32 = 1000;

/// Decoded object content, chosen from the object's content type
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectContent {
    /// `application/json`
    Json(serde_json::Value),
    /// `text/*`
    Text(String),
    /// Anything else, including objects without a content type
    Binary(Bytes),
}

impl ObjectContent {
    fn decode(
        body: Bytes,
        content_type: Option<&str>,
    ) -> std::result::Result<Self, serde_json::Error> {
        match content_type {
            Some("application/json") => serde_json::from_slice(&body).map(ObjectContent::Json),
            Some(ct) if ct.starts_with("text") => {
                Ok(ObjectContent::Text(String::from_utf8_lossy(&body).into_owned()))
            }
            _ => Ok(ObjectContent::Binary(body)),
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ObjectContent::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ObjectContent::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ObjectContent::Binary(b) => Some(b),
            _ => None,
        }
    }
}

/// Keep `NotFound` as is, turn anything else into a backend error with context.
fn classify(bucket: &str, key: &str, message: String, error: Error) -> Error {
    match error {
        e @ Error::NotFound { .. } => e,
        e => Error::backend_key(bucket, key, format!("{message}: {e}"), e),
    }
}

/// Fetch an object and decode it according to its content type.
pub async fn get_object_content(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<ObjectContent> {
    let object = store
        .get_object(bucket, key)
        .await
        .map_err(|e| classify(bucket, key, format!("unable to get object {key}"), e))?;

    tracing::debug!(
        bucket,
        key,
        content_type = object.content_type.as_deref().unwrap_or_default(),
        "got object"
    );

    let content_type = object.content_type;
    ObjectContent::decode(object.body, content_type.as_deref()).map_err(|e| {
        let message = format!("unable to get object {key}, invalid JSON content: {e}");
        Error::backend_key(bucket, key, message, e)
    })
}

/// MD5 of an object's content, as lowercase hex.
pub async fn get_object_hash(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<String> {
    let object = store.get_object(bucket, key).await.map_err(|e| {
        classify(
            bucket,
            key,
            format!("unable to generate object {key} hash from bucket {bucket}"),
            e,
        )
    })?;

    let hash = hex::encode(Md5::digest(&object.body));
    tracing::debug!(bucket, key, "generated object hash");
    Ok(hash)
}

/// Every key in `bucket`, across all listing pages, filtered by `options`.
pub async fn list_keys(
    store: &dyn ObjectStore,
    bucket: &str,
    options: &ListKeysOptions,
) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let page = store
            .list_objects(
                bucket,
                ListOptions {
                    max_keys: Some(LIST_PAGE_SIZE),
                    continuation_token: continuation_token.take(),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                let message = format!("unable to list objects in bucket {bucket}: {e}");
                Error::Backend {
                    bucket: bucket.to_string(),
                    key: None,
                    message,
                    source: Some(Box::new(e)),
                }
            })?;

        keys.extend(
            page.items
                .into_iter()
                .map(|item| item.key)
                .filter(|key| options.accepts(key))
                .map(|key| options.present(key)),
        );

        match page.continuation_token {
            Some(token) if page.truncated => continuation_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!(bucket, count = keys.len(), "listed keys");
    Ok(keys)
}
