//! lambo-core: Core library for the lambo S3 helpers
//!
//! This crate provides:
//! - Error taxonomy and storage configuration
//! - The ObjectStore trait and an in-memory implementation
//! - Object key construction and key filters
//! - Single-file uploads and recursive directory upload
//! - Object content, hash and key listing helpers
//!
//! This crate is independent of any specific S3 SDK; the S3 adapter lives
//! in lambo-s3.

pub mod config;
pub mod content_type;
pub mod error;
pub mod filter;
pub mod key;
pub mod memory;
pub mod objects;
pub mod sync;
pub mod traits;
pub mod upload;

pub use config::{BucketLookup, StorageConfig};
pub use error::{Error, ErrorKind, Result};
pub use filter::{IgnoreFilter, ListKeysOptions, is_ignored};
pub use key::build_key;
pub use memory::MemoryStore;
pub use objects::{ObjectContent, get_object_content, get_object_hash, list_keys};
pub use sync::{DirectorySynchronizer, SyncRequest};
pub use traits::{
    GetObjectOutput, ListOptions, ListResult, ObjectBody, ObjectInfo, ObjectStore,
    PutObjectRequest, PutOptions,
};
pub use upload::{UploadTarget, upload_bytes, upload_file};
