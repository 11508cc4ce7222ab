//! Collection and storage of uploaded multipart parts.
//!
//! Every part lands in the returned [`FileMap`] under its part name, even
//! when no file was chosen (the browser then sends an empty part with an
//! empty filename). Only parts carrying a non-empty client filename are also
//! written to the upload directory, and only under their bare file name:
//! `../../evil.txt` is stored as `evil.txt`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::error::UploadError;
use crate::request::FilePart;

/// Part contents keyed by part name.
pub type FileMap = BTreeMap<String, Bytes>;

/// Reads uploaded parts and persists the named files.
#[derive(Clone, Debug)]
pub struct UploadCollector {
    dir: PathBuf,
}

impl UploadCollector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    /// Collects every part into a name → bytes map, saving named files.
    ///
    /// A file that cannot be written is logged and still collected.
    pub fn collect(&self, parts: &[FilePart]) -> FileMap {
        let mut files = FileMap::new();
        for part in parts {
            let filename = part
                .header("content-disposition")
                .and_then(client_filename);

            if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                match self.persist(&filename, part.body()) {
                    Ok(Some(path)) => debug!(part = part.name(), path = %path.display(), "upload stored"),
                    Ok(None) => warn!(part = part.name(), filename = %filename, "refusing upload filename"),
                    Err(e) => error!(part = part.name(), "upload not stored: {e}"),
                }
            }

            files.insert(part.name().to_owned(), part.body().clone());
        }
        files
    }

    /// Writes `bytes` under the base name of `filename`.
    ///
    /// Returns `Ok(None)` when nothing usable is left of the name.
    pub fn persist(&self, filename: &str, bytes: &[u8]) -> Result<Option<PathBuf>, UploadError> {
        let Some(base) = sanitize(filename) else {
            return Ok(None);
        };
        fs::create_dir_all(&self.dir).map_err(|source| UploadError {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(base);
        fs::write(&path, bytes).map_err(|source| UploadError { path: path.clone(), source })?;
        Ok(Some(path))
    }
}

/// Extracts the client filename from a `content-disposition` header value.
///
/// Quotes are dropped and only the last segment after `/` or `\` is kept, so
/// paths sent by Windows browsers reduce to the file name as well.
pub fn client_filename(disposition: &str) -> Option<String> {
    let raw = disposition
        .split(';')
        .map(str::trim)
        .find(|segment| segment.starts_with("filename"))?;
    let value = raw.split_once('=')?.1.trim().replace('"', "");
    Some(value.rsplit(['/', '\\']).next().unwrap_or_default().to_owned())
}

/// Reduces `filename` to a bare file name that cannot leave the upload
/// directory, or `None` if nothing remains (`""`, `"."`, `".."`).
pub fn sanitize(filename: &str) -> Option<&str> {
    let last = filename.rsplit(['/', '\\']).next()?;
    Path::new(last).file_name().and_then(|n| n.to_str()).filter(|n| !n.is_empty())
}
