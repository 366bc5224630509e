//! Recursive directory upload
//!
//! [`DirectorySynchronizer`] mirrors a local directory tree into a bucket.
//! Every entry of a directory is handled by its own task: files are
//! uploaded, subdirectories are synchronized recursively with their key as
//! the new root key. A directory level returns only after all of its tasks
//! have finished, and reports the first error any of them produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::filter::IgnoreFilter;
use crate::key::build_key;
use crate::traits::{ObjectStore, PutOptions};
use crate::upload::{UploadTarget, upload_file};

/// Parameters of one synchronization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Local directory to upload
    pub root_path: PathBuf,
    pub bucket: String,
    /// Applied to every uploaded object
    pub options: PutOptions,
    /// Key prefix for everything under `root_path`
    pub root_key: String,
    /// Keys containing any of these substrings are skipped
    pub ignore: IgnoreFilter,
}

impl SyncRequest {
    pub fn new(root_path: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            bucket: bucket.into(),
            options: PutOptions::default(),
            root_key: String::new(),
            ignore: IgnoreFilter::default(),
        }
    }

    pub fn root_key(mut self, root_key: impl Into<String>) -> Self {
        self.root_key = root_key.into();
        self
    }

    pub fn ignore<I, S>(mut self, ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = IgnoreFilter::new(ignore);
        self
    }

    pub fn options(mut self, options: PutOptions) -> Self {
        self.options = options;
        self
    }

    /// The same request rooted at a subdirectory
    fn descend(&self, root_path: PathBuf, root_key: String) -> Self {
        Self {
            root_path,
            root_key,
            ..self.clone()
        }
    }
}

/// Uploads directory trees through an [`ObjectStore`]
#[derive(Clone)]
pub struct DirectorySynchronizer {
    store: Arc<dyn ObjectStore>,
}

impl DirectorySynchronizer {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Upload every file below `request.root_path`.
    ///
    /// Fails with a filesystem error before any upload if the root is not an
    /// existing directory. Otherwise returns the first error observed once
    /// every file and subdirectory has been processed.
    pub async fn synchronize(&self, request: SyncRequest) -> Result<()> {
        let root = check_directory(&request.root_path).await?;
        tracing::info!(
            path = %root.display(),
            bucket = %request.bucket,
            root_key = %request.root_key,
            "uploading directory"
        );

        upload_dir(Arc::clone(&self.store), request, root.clone()).await?;

        tracing::info!(path = %root.display(), "directory successfully uploaded");
        Ok(())
    }
}

fn sync_dir(store: Arc<dyn ObjectStore>, request: SyncRequest) -> BoxFuture<'static, Result<()>> {
    async move {
        let dir = check_directory(&request.root_path).await?;
        upload_dir(store, request, dir).await
    }
    .boxed()
}

/// Spawn one task per entry of the already validated `dir` and wait for
/// all of them.
async fn upload_dir(
    store: Arc<dyn ObjectStore>,
    request: SyncRequest,
    dir: PathBuf,
) -> Result<()> {
    tracing::debug!(path = %dir.display(), "listing directory");

    let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
        Error::filesystem(
            &dir,
            format!("unable to upload directory {}: {e}", dir.display()),
            e,
        )
    })?;

    let mut tasks = JoinSet::new();
    let mut listing_error = None;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                // Entries already spawned still run to completion.
                listing_error = Some(Error::filesystem(
                    &dir,
                    format!("unable to read directory {}: {e}", dir.display()),
                    e,
                ));
                break;
            }
        };

        tasks.spawn(sync_entry(
            Arc::clone(&store),
            request.clone(),
            entry.path(),
        ));
    }

    settle(tasks, &dir, listing_error).await
}

/// Await every task in `tasks`, keeping `first_error` or else the first
/// failure in completion order.
async fn settle(
    mut tasks: JoinSet<Result<()>>,
    dir: &Path,
    mut first_error: Option<Error>,
) -> Result<()> {
    while let Some(joined) = tasks.join_next().await {
        let error = match joined {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Error::filesystem_msg(
                dir,
                format!("upload task for {} did not complete: {e}", dir.display()),
            ),
        };

        if first_error.is_none() {
            first_error = Some(error);
        } else {
            tracing::debug!(error = %error, "additional failure while uploading directory");
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Stat, filter and dispatch a single directory entry.
async fn sync_entry(
    store: Arc<dyn ObjectStore>,
    request: SyncRequest,
    path: PathBuf,
) -> Result<()> {
    // Follows symlinks; a dangling link fails here.
    let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
        Error::filesystem(&path, format!("unable to stat {}: {e}", path.display()), e)
    })?;

    let name = entry_name(&path)?;
    let key = build_key(&request.root_key, name);

    if request.ignore.is_ignored(&key) {
        tracing::debug!(key = %key, "ignored");
        return Ok(());
    }

    if metadata.is_file() {
        let target = UploadTarget::new(&path, &request.bucket, key);
        upload_file(store.as_ref(), target, &request.options).await
    } else if metadata.is_dir() {
        let sub = request.descend(path, key);
        sync_dir(store, sub).await
    } else {
        tracing::debug!(path = %path.display(), "skipping entry that is neither file nor directory");
        Ok(())
    }
}

/// Resolve `path` to an absolute path and make sure it is a directory.
async fn check_directory(path: &Path) -> Result<PathBuf> {
    let dir = std::path::absolute(path).map_err(|e| {
        Error::filesystem(
            path,
            format!("unable to upload directory {}: {e}", path.display()),
            e,
        )
    })?;

    let metadata = tokio::fs::metadata(&dir).await.map_err(|e| {
        Error::filesystem(
            &dir,
            format!("unable to upload directory {}: {e}", dir.display()),
            e,
        )
    })?;

    if !metadata.is_dir() {
        return Err(Error::filesystem_msg(
            &dir,
            format!("{} is not a directory", dir.display()),
        ));
    }

    Ok(dir)
}

fn entry_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            Error::filesystem_msg(
                path,
                format!("{} has a name that is not valid UTF-8", path.display()),
            )
        })
}
