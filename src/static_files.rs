//! Static files and view files, read from a root directory.
//!
//! Both are looked up the same way: the request path is resolved under the
//! root and must stay inside it after canonicalization.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::dispatch::Forward;
use crate::response::{ContentType, Response};

/// Reads `request_path` from under `root`.
///
/// Returns `None` for anything that is not a regular file inside `root`.
pub fn load(root: &Path, request_path: &str) -> Option<(Vec<u8>, ContentType)> {
    let relative = request_path.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }

    let root_canonical = match root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            warn!(root = %root.display(), "document root not accessible: {e}");
            return None;
        }
    };

    // Not found is the common case; no need to log it.
    let file = root.join(relative).canonicalize().ok()?;
    if !file.starts_with(&root_canonical) {
        warn!(path = request_path, resolved = %file.display(), "path traversal attempt blocked");
        return None;
    }
    if !file.is_file() {
        return None;
    }

    let content = match fs::read(&file) {
        Ok(c) => c,
        Err(e) => {
            error!(file = %file.display(), "failed to read file: {e}");
            return None;
        }
    };
    let content_type = ContentType::from_extension(file.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}

/// Serves the percent-encoded `request_path` from `root` as a 200 response.
pub fn serve(root: &Path, request_path: &str) -> Option<Response> {
    let decoded = match urlencoding::decode(request_path) {
        Ok(p) => p,
        Err(e) => {
            debug!(path = request_path, "undecodable request path: {e}");
            return None;
        }
    };
    load(root, &decoded).map(|(body, content_type)| Response::builder().bytes(content_type, body))
}

/// Produces the response for a view forward.
pub trait ViewRenderer: Send + Sync {
    /// `None` when no view exists under the forwarded path.
    fn render(&self, forward: &Forward) -> Option<Response>;
}

/// Serves the forwarded view as a file from a directory.
///
/// `/dashboard` is looked up as `dashboard`, then `dashboard.html`. The
/// forwarded attributes are not interpolated.
#[derive(Clone, Debug)]
pub struct FileViews {
    dir: PathBuf,
}

impl FileViews {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ViewRenderer for FileViews {
    fn render(&self, forward: &Forward) -> Option<Response> {
        let path = forward.path();
        load(&self.dir, path)
            .or_else(|| load(&self.dir, &format!("{path}.html")))
            .map(|(body, _)| Response::builder().bytes(ContentType::Html, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataMap;

    fn scratch_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("switchyard-static-{}", uuid::Uuid::new_v4().simple()));
        fs::create_dir_all(dir.join("public/css")).unwrap();
        fs::write(dir.join("public/css/site.css"), "body{}").unwrap();
        fs::write(dir.join("secret.txt"), "top secret").unwrap();
        dir
    }

    #[test]
    fn serves_files_with_content_type() {
        let dir = scratch_root();
        let (body, ct) = load(&dir.join("public"), "/css/site.css").unwrap();
        assert_eq!(body, b"body{}");
        assert_eq!(ct, ContentType::Css);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn refuses_traversal_directories_and_missing_files() {
        let dir = scratch_root();
        let root = dir.join("public");
        assert!(load(&root, "/../secret.txt").is_none());
        assert!(load(&root, "/css").is_none());
        assert!(load(&root, "/").is_none());
        assert!(load(&root, "/nope.js").is_none());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn served_paths_are_percent_decoded() {
        let dir = scratch_root();
        let root = dir.join("public");
        fs::write(root.join("my file.css"), "p{}").unwrap();

        let resp = serve(&root, "/my%20file.css").unwrap();
        assert_eq!(resp.text_body(), "p{}");
        assert!(serve(&root, "/%2e%2e/secret.txt").is_none());
        assert!(serve(&root, "/bad%ff.css").is_none());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn views_fall_back_to_html_extension() {
        let dir = scratch_root();
        fs::write(dir.join("home.html"), "<h1>home</h1>").unwrap();
        let views = FileViews::new(&dir);

        let resp = views.render(&Forward::new("home", DataMap::new())).unwrap();
        assert_eq!(resp.content_type(), Some("text/html; charset=utf-8"));
        assert_eq!(resp.text_body(), "<h1>home</h1>");
        assert!(views.render(&Forward::new("missing", DataMap::new())).is_none());
        fs::remove_dir_all(&dir).unwrap();
    }
}
