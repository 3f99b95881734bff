use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

/// The only file types served. Lookup is by exact (case-sensitive)
/// extension including the leading dot.
static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (".html", "text/html"),
        (".txt", "text/plain"),
        (".gif", "image/gif"),
        (".jpeg", "image/jpeg"),
        (".jpg", "image/jpeg"),
        (".css", "text/css"),
    ])
});

/// Extension of `path` with its leading dot, or an empty string.
pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

pub fn content_type(path: &Path) -> Option<&'static str> {
    MIME_TYPES.get(extension(path).as_str()).copied()
}
