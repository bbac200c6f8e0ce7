//! Where artifacts come from.
//!
//! Analyses never touch the file system directly; they go through an
//! [`ArtifactSource`]. Paths handed to and returned by a source are relative to
//! the project root.

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub trait ArtifactSource: Send + Sync {
    /// Artifacts under `dir` whose extension is one of `extensions`, sorted.
    /// A missing directory yields an empty list.
    fn list_artifacts(&self, dir: &str, extensions: &[&str], recursive: bool) -> Result<Vec<PathBuf>>;

    /// Full text of an artifact; a missing artifact reads as empty. Invalid
    /// UTF-8 is replaced rather than rejected.
    fn read_artifact(&self, path: &Path) -> Result<String>;

    /// Last modification time, when the source knows it.
    fn modified(&self, path: &Path) -> Option<DateTime<Utc>>;
}

// ---------------------------------------------------------------------------
// FsSource
// ---------------------------------------------------------------------------

/// Artifact source backed by a project directory on disk.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(&self, rel: &Path, extensions: &[&str], recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
        let entries = match std::fs::read_dir(self.root.join(rel)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let child = rel.join(entry.file_name());
            if file_type.is_dir() {
                if recursive {
                    self.walk(&child, extensions, recursive, out)?;
                }
            } else if file_type.is_file() {
                let matches = child
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| extensions.contains(&ext));
                if matches {
                    out.push(child);
                }
            }
        }
        Ok(())
    }
}

impl ArtifactSource for FsSource {
    fn list_artifacts(&self, dir: &str, extensions: &[&str], recursive: bool) -> Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        self.walk(Path::new(dir), extensions, recursive, &mut out)?;
        out.sort();
        Ok(out)
    }

    fn read_artifact(&self, path: &Path) -> Result<String> {
        match std::fs::read(self.root.join(path)) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        let meta = std::fs::metadata(self.root.join(path)).ok()?;
        meta.modified().ok().map(DateTime::<Utc>::from)
    }
}
