//! Object key construction

/// Join `name` onto `root_key` with `/` separators.
///
/// Empty and `.` segments are dropped so repeated or trailing slashes
/// collapse; a leading `/` on `root_key` is kept. `..` is not resolved.
pub fn build_key(root_key: &str, name: &str) -> String {
    let mut key = String::with_capacity(root_key.len() + name.len() + 1);
    if root_key.starts_with('/') || (root_key.is_empty() && name.starts_with('/')) {
        key.push('/');
    }

    let segments = root_key
        .split('/')
        .chain(name.split('/'))
        .filter(|s| !s.is_empty() && *s != ".");

    for (i, segment) in segments.enumerate() {
        if i > 0 {
            key.push('/');
        }
        key.push_str(segment);
    }

    key
}
