//! Source scanner
//!
//! Walks every configured root in file-name order and picks up the files a
//! registered handler accepts. A root that cannot be fully walked fails the
//! whole scan: a partial listing would read as "those artifacts were
//! removed" and trigger deletions.

use artisync_core::errors::{ExError, ExErrorKind, SyncError};
use artisync_core::handler::HandlerRegistry;
use artisync_core::model::SourceFile;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A matched file whose content could not be read
#[derive(Debug, Clone, PartialEq)]
pub struct UnreadableSource {
    pub location: String,
    pub artifact_type: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Accepted files, roots in configured order, file-name order within a root
    pub files: Vec<SourceFile>,
    pub unreadable: Vec<UnreadableSource>,
    /// Locations also produced by a later root and ignored there
    pub duplicates: Vec<SyncError>,
}

impl ScanOutcome {
    /// Every location the scan saw, readable or not
    pub fn seen_locations(&self) -> HashSet<String> {
        self.files
            .iter()
            .map(|f| f.location.clone())
            .chain(self.unreadable.iter().map(|u| u.location.clone()))
            .collect()
    }
}

/// Scan `roots` for artifact sources
///
/// # Errors
///
/// Returns an `Io` error if a root is missing or any directory under it
/// cannot be listed.
pub fn scan_roots(roots: &[PathBuf], registry: &HandlerRegistry) -> Result<ScanOutcome, ExError> {
    let mut outcome = ScanOutcome::default();
    let mut locations: HashSet<String> = HashSet::new();

    for root in roots {
        if !root.is_dir() {
            return Err(scan_error(root, "source root is missing or not a directory"));
        }

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(|e| scan_error(root, &e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                tracing::warn!(path = %entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };
            let Some((artifact_type, _)) = registry.handler_for_file(file_name) else {
                continue;
            };
            let Some(location) = to_location(root, entry.path()) else {
                continue;
            };

            if !locations.insert(location.clone()) {
                tracing::warn!(location = %location, root = %root.display(), "duplicate location ignored");
                outcome.duplicates.push(SyncError::DuplicateLocation { location });
                continue;
            }

            match std::fs::read(entry.path()) {
                Ok(raw) => outcome
                    .files
                    .push(SourceFile::new(location, artifact_type, raw)),
                Err(e) => outcome.unreadable.push(UnreadableSource {
                    location,
                    artifact_type: artifact_type.to_string(),
                    message: e.to_string(),
                }),
            }
        }
    }

    Ok(outcome)
}

/// Root-relative location with `/` separators and a leading `/`
pub fn to_location(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut location = String::new();
    for component in relative.components() {
        location.push('/');
        location.push_str(component.as_os_str().to_str()?);
    }
    if location.is_empty() {
        None
    } else {
        Some(location)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn scan_error(root: &Path, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op("scan")
        .with_message(format!("Cannot scan {}: {}", root.display(), reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_is_root_relative_with_leading_slash() {
        let root = Path::new("/srv/sources");
        assert_eq!(
            to_location(root, Path::new("/srv/sources/project/roles.role")),
            Some("/project/roles.role".to_string())
        );
        assert_eq!(to_location(root, root), None);
        assert_eq!(to_location(root, Path::new("/elsewhere/x.role")), None);
    }
}
