// SPDX-License-Identifier: GPL-3.0-only

//! Image directory: capture naming, listing and safe lookup
//!
//! All methods use blocking `std::fs`; async callers wrap them in
//! `tokio::task::spawn_blocking`.

use crate::constants::{CAPTURE_FILE_PREFIX, CAPTURE_TIMESTAMP_FORMAT, IMAGE_EXTENSIONS};
use crate::errors::StorageError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::cmp::Reverse;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// One page of the image listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePage {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub files: Vec<String>,
}

/// The directory captured stills are written to
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Open the store, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        debug!(path = %root.display(), "Image store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve the path for a still taken at `at`
    ///
    /// `RF_pic_<YYYY-MM-DDTHH_MM_SS>.jpeg`, with `_1`, `_2`, ... appended when
    /// the name is already taken. The name is claimed by creating an empty
    /// file with `create_new`, so concurrent captures in the same second
    /// never share a path. Callers overwrite the placeholder, or remove it
    /// with [`ImageStore::release`] if the capture fails.
    pub fn claim_capture_path(&self, at: DateTime<Local>) -> Result<PathBuf, StorageError> {
        let stem = format!(
            "{}{}",
            CAPTURE_FILE_PREFIX,
            at.format(CAPTURE_TIMESTAMP_FORMAT)
        );

        let mut candidate = self.root.join(format!("{stem}.jpeg"));
        let mut suffix = 1;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    candidate = self.root.join(format!("{stem}_{suffix}.jpeg"));
                    suffix += 1;
                }
                Err(source) => {
                    return Err(StorageError::Io {
                        path: candidate,
                        source,
                    });
                }
            }
        }
    }

    /// Drop a claimed path whose capture never completed
    pub fn release(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove unused capture file");
        }
    }

    /// Image file names, newest first, paginated from page 1
    ///
    /// A page past the end is empty, not an error.
    pub fn list(&self, page: usize, per_page: usize) -> Result<FilePage, StorageError> {
        if page < 1 || per_page < 1 {
            return Err(StorageError::InvalidPage(format!(
                "page and per_page must be at least 1 (got page={page}, per_page={per_page})"
            )));
        }

        let entries = std::fs::read_dir(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut images: Vec<(String, SystemTime)> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                if !is_image_name(&name) {
                    return None;
                }
                let modified = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                Some((name, modified))
            })
            .collect();

        // Newest first, name as a stable tie-break
        images.sort_by(|a, b| Reverse(a.1).cmp(&Reverse(b.1)).then_with(|| a.0.cmp(&b.0)));

        let total = images.len();
        let files = images
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .map(|(name, _)| name)
            .collect();

        Ok(FilePage {
            page,
            per_page,
            total,
            files,
        })
    }

    /// Resolve a requested name to a file inside the store
    ///
    /// Only plain file names are accepted: no separators, no `..`, no
    /// absolute paths.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let requested = Path::new(name);
        let mut components = requested.components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !plain || name.contains('\\') {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        let path = self.root.join(requested);
        if path.is_file() {
            Ok(path)
        } else {
            Err(StorageError::NotFound(name.to_string()))
        }
    }
}

/// Whether a file name carries one of the listed image extensions
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// MIME type for an image file name
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs::File;
    use std::time::Duration;

    fn temp_store() -> ImageStore {
        let root = std::env::temp_dir().join(format!("uvcam-store-{}", uuid::Uuid::new_v4()));
        ImageStore::open(root).unwrap()
    }

    fn touch_at(store: &ImageStore, name: &str, age_secs: u64) {
        let file = File::create(store.root().join(name)).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        file.set_modified(mtime).unwrap();
    }

    #[test]
    fn test_claim_capture_path_format_and_collision() {
        let store = temp_store();
        let at = Local.with_ymd_and_hms(2024, 5, 17, 9, 3, 7).unwrap();

        let first = store.claim_capture_path(at).unwrap();
        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            "RF_pic_2024-05-17T09_03_07.jpeg"
        );
        assert!(first.is_file());

        // Claimed but still empty: the name is taken all the same
        let second = store.claim_capture_path(at).unwrap();
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "RF_pic_2024-05-17T09_03_07_1.jpeg"
        );

        store.release(&first);
        assert!(!first.exists());
        let third = store.claim_capture_path(at).unwrap();
        assert_eq!(third, first);
    }

    #[test]
    fn test_concurrent_claims_get_distinct_paths() {
        let store = temp_store();
        let at = Local.with_ymd_and_hms(2024, 5, 17, 9, 3, 7).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.claim_capture_path(at).unwrap())
            })
            .collect();
        let mut paths: Vec<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        paths.sort();
        paths.dedup();

        assert_eq!(paths.len(), 8);
    }

    #[test]
    fn test_list_newest_first_with_pagination() {
        let store = temp_store();
        touch_at(&store, "old.jpg", 300);
        touch_at(&store, "mid.PNG", 200);
        touch_at(&store, "new.jpeg", 100);
        touch_at(&store, "notes.txt", 0);
        std::fs::create_dir(store.root().join("dir.jpg")).unwrap();

        let page = store.list(1, 2).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.files, vec!["new.jpeg", "mid.PNG"]);

        let page = store.list(2, 2).unwrap();
        assert_eq!(page.files, vec!["old.jpg"]);

        let page = store.list(5, 2).unwrap();
        assert!(page.files.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_list_rejects_zero_page() {
        let store = temp_store();
        assert!(matches!(store.list(0, 10), Err(StorageError::InvalidPage(_))));
        assert!(matches!(store.list(1, 0), Err(StorageError::InvalidPage(_))));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = temp_store();
        touch_at(&store, "a.jpeg", 0);

        assert!(store.resolve("a.jpeg").is_ok());
        assert!(matches!(store.resolve("../etc/passwd"), Err(StorageError::InvalidName(_))));
        assert!(matches!(store.resolve("/etc/passwd"), Err(StorageError::InvalidName(_))));
        assert!(matches!(store.resolve("sub/a.jpeg"), Err(StorageError::InvalidName(_))));
        assert!(matches!(store.resolve("missing.jpeg"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("x.JPG"), "image/jpeg");
        assert_eq!(content_type_for("x.gif"), "image/gif");
        assert_eq!(content_type_for("x"), "application/octet-stream");
    }
}
