//! Media type resolution from file extensions

use std::path::Path;

/// Fallback for unknown or missing extensions
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Resolve the media type of a local path or object key from its extension.
pub fn resolve(path_or_key: impl AsRef<Path>) -> String {
    mime_guess::from_path(path_or_key)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}
