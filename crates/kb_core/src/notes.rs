//! Repository scanner: enumerate note files under the configured
//! directories and parse them through the document codec.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::KbError;
use crate::frontmatter::{read_doc, NoteMeta};

/// A note on disk. `path` is absolute (rooted at the repo root); the
/// organizer may relocate it.
#[derive(Debug, Clone)]
pub struct Note {
    pub path: PathBuf,
    pub meta: NoteMeta,
    pub body: String,
}

/// Enumerate every `.md` file under the configured note directories.
///
/// Missing directories are skipped. The result is sorted by path so
/// user-facing output stays stable.
pub fn iter_note_paths(repo_root: &Path, note_dirs: &[String]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for dir in note_dirs {
        let base = repo_root.join(dir);
        if !base.exists() {
            continue;
        }
        for entry in WalkDir::new(&base) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::debug!("skipping unreadable entry under {}: {err}", base.display());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) == Some("md") {
                paths.push(entry.into_path());
            }
        }
    }
    paths.sort();
    paths
}

pub fn read_note(path: &Path) -> Result<Note, KbError> {
    let doc = read_doc(path)?;
    Ok(Note {
        path: path.to_path_buf(),
        meta: doc.meta,
        body: doc.body,
    })
}

/// Best-effort read for consumers that must not fail on a malformed
/// neighbor note (the organizer). Failures are logged and swallowed.
pub fn try_read_note(path: &Path) -> Option<Note> {
    match read_note(path) {
        Ok(note) => Some(note),
        Err(err) => {
            log::debug!("skipping unparseable note {}: {err}", path.display());
            None
        }
    }
}
