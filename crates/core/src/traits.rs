//! Storage backend abstraction
//!
//! [`ObjectStore`] is the seam between the SDK-independent logic in this
//! crate and a concrete backend such as the S3 adapter or [`crate::MemoryStore`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Backend-specific options applied to every uploaded object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PutOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,

    /// Storage class name, e.g. `STANDARD_IA`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,

    /// Canned ACL, e.g. `public-read`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,

    /// User metadata (`x-amz-meta-*`)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Source of an object's bytes
#[derive(Debug)]
pub enum ObjectBody {
    /// Content already in memory
    Bytes(Bytes),
    /// An opened local file, streamed by the backend and closed when dropped
    File { path: PathBuf, file: tokio::fs::File },
}

impl From<Bytes> for ObjectBody {
    fn from(bytes: Bytes) -> Self {
        ObjectBody::Bytes(bytes)
    }
}

/// A single put request
#[derive(Debug)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub body: ObjectBody,
    pub options: PutOptions,
}

/// Content and media type of a downloaded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetObjectOutput {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Metadata for one listed object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
}

impl ObjectInfo {
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            etag: None,
            last_modified: None,
        }
    }
}

/// Options for a single listing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub prefix: Option<String>,
    pub max_keys: Option<i32>,
    pub continuation_token: Option<String>,
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResult {
    pub items: Vec<ObjectInfo>,
    pub truncated: bool,
    pub continuation_token: Option<String>,
}

/// Object storage operations used by lambo
///
/// Implementations classify their own failures: a missing key on read is
/// [`crate::Error::NotFound`], any other rejection is [`crate::Error::Backend`],
/// and a failure reading a local body is [`crate::Error::Filesystem`].
/// An empty bucket name must be rejected with a backend error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object, replacing any existing object at the same key
    async fn put_object(&self, request: PutObjectRequest) -> Result<()>;

    /// Fetch an object's content
    async fn get_object(&self, bucket: &str, key: &str) -> Result<GetObjectOutput>;

    /// List one page of objects in a bucket
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult>;
}
