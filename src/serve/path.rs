//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Resolve URL to filesystem path, handling index.html for directories
///
/// Returns `None` for missing files and for anything resolving outside
/// `serve_root`.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    // Reject paths with suspicious patterns early
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let local = serve_root.join(&clean);

    // Canonicalize to resolve symlinks and verify path is under serve_root
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Normalize URL: strip query string and fragment, decode, trim slashes
pub fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();
    decoded.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn dist() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dist/css")).unwrap();
        fs::create_dir_all(dir.path().join("dist/docs")).unwrap();
        fs::write(dir.path().join("dist/index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("dist/css/main.css"), "a{}").unwrap();
        fs::write(dir.path().join("dist/my page.html"), "x").unwrap();
        fs::write(dir.path().join("secret.txt"), "secret").unwrap();
        dir
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/css/main.css?v=2"), "css/main.css");
        assert_eq!(normalize_url("/my%20page.html#top"), "my page.html");
        assert_eq!(normalize_url("/"), "");
    }

    #[test]
    fn test_resolve_file_and_index() {
        let dir = dist();
        let root = dir.path().join("dist");
        let index = root.join("index.html").canonicalize().unwrap();

        assert_eq!(resolve_path("/", &root), Some(index.clone()));
        assert_eq!(resolve_path("/index.html", &root), Some(index));
        assert!(resolve_path("/css/main.css?v=1", &root).is_some());
        assert!(resolve_path("/my%20page.html", &root).is_some());
    }

    #[test]
    fn test_directory_without_index() {
        let dir = dist();
        assert_eq!(resolve_path("/docs/", &dir.path().join("dist")), None);
    }

    #[test]
    fn test_missing_file() {
        let dir = dist();
        assert_eq!(resolve_path("/nope.html", &dir.path().join("dist")), None);
    }

    #[test]
    fn test_traversal_rejected() {
        let dir = dist();
        let root = dir.path().join("dist");
        assert_eq!(resolve_path("/../secret.txt", &root), None);
        assert_eq!(resolve_path("/%2e%2e/secret.txt", &root), None);
        assert_eq!(resolve_path("/css/..%2F..%2Fsecret.txt", &root), None);
    }
}
