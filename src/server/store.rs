//! Upload and image storage for the web form.
//!
//! Every file gets a fresh uuid-based name and is never rewritten, so
//! concurrent requests never touch each other's files.

use crate::charts::ChartArtifact;
use crate::data::{has_csv_extension, LoadError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Name used when sanitising leaves nothing of the client's file name.
const FALLBACK_UPLOAD_NAME: &str = "upload.csv";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    uploads_dir: PathBuf,
    images_dir: PathBuf,
}

impl ArtifactStore {
    /// Open the store, creating both directories when missing.
    pub fn open(uploads_dir: PathBuf, images_dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&uploads_dir)?;
        fs::create_dir_all(&images_dir)?;
        Ok(Self {
            uploads_dir,
            images_dir,
        })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Store an uploaded CSV and return its opaque reference.
    pub fn save_upload(&self, client_name: &str, bytes: &[u8]) -> Result<String, LoadError> {
        if !has_csv_extension(Path::new(client_name)) {
            return Err(LoadError::UnsupportedExtension(client_name.to_string()));
        }

        let reference = format!("{}_{}", Uuid::new_v4().simple(), secure_filename(client_name));
        fs::write(self.uploads_dir.join(&reference), bytes)?;
        tracing::debug!(reference = %reference, bytes = bytes.len(), "upload stored");
        Ok(reference)
    }

    /// Path of a stored upload. `None` when the reference is malformed or the
    /// file no longer exists.
    pub fn resolve_upload(&self, reference: &str) -> Option<PathBuf> {
        if !is_upload_reference(reference) {
            tracing::warn!(reference, "rejected malformed upload reference");
            return None;
        }
        let path = self.uploads_dir.join(reference);
        path.is_file().then_some(path)
    }

    pub fn discard_upload(&self, reference: &str) {
        if let Some(path) = self.resolve_upload(reference) {
            if let Err(err) = fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %err, "could not remove upload");
            }
        }
    }

    /// Write a chart under a fresh name; returns the file name and the
    /// artifact tagged with its location.
    pub fn save_image(&self, artifact: &ChartArtifact) -> io::Result<(String, ChartArtifact)> {
        let name = format!("{}.png", Uuid::new_v4().simple());
        let saved = artifact.save_to(&self.images_dir.join(&name))?;
        Ok((name, saved))
    }

    /// Delete every stored upload and image. Returns how many files went.
    pub fn purge(&self) -> io::Result<usize> {
        let mut removed = 0;
        for dir in [&self.uploads_dir, &self.images_dir] {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.is_file() {
                    fs::remove_file(&path)?;
                    removed += 1;
                }
            }
        }
        tracing::debug!(removed, "stored files purged");
        Ok(removed)
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, without
/// directories or leading dots.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();

    if cleaned.is_empty() || !has_csv_extension(Path::new(&cleaned)) {
        FALLBACK_UPLOAD_NAME.to_string()
    } else {
        cleaned
    }
}

/// `<32 hex digits>_<secure file name>`
fn is_upload_reference(reference: &str) -> bool {
    let Some((id, name)) = reference.split_once('_') else {
        return false;
    };
    id.len() == 32
        && id.chars().all(|c| c.is_ascii_hexdigit())
        && !name.is_empty()
        && secure_filename(name) == name
}
