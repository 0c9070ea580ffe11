//! Content-Type lookup for files served from `dist/`.

use std::path::Path;

pub const HTML: &str = "text/html; charset=utf-8";
pub const PLAIN: &str = "text/plain; charset=utf-8";
pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// Known extensions, compared case-insensitively.
const BY_EXTENSION: &[(&str, &str)] = &[
    ("html", HTML),
    ("htm", HTML),
    ("css", "text/css; charset=utf-8"),
    ("js", JAVASCRIPT),
    ("mjs", JAVASCRIPT),
    ("json", "application/json"),
    ("map", "application/json"),
    ("xml", "application/xml"),
    ("txt", PLAIN),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("eot", "application/vnd.ms-fontobject"),
];

/// Content-Type for `path`, `application/octet-stream` when unknown.
pub fn from_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return OCTET_STREAM;
    };
    BY_EXTENSION
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map_or(OCTET_STREAM, |&(_, content_type)| content_type)
}

pub fn is_html(content_type: &str) -> bool {
    content_type.starts_with("text/html")
}
