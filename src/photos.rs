//! Photo attachment storage.
//!
//! Uploaded photos are written under the project's uploads directory with a
//! generated name. Records keep only that name.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use uuid::Uuid;

use crate::error::{HumidorError, Result};

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Save and delete binary attachments keyed by a stored reference.
pub trait PhotoStore {
    /// Persist the bytes and return the stored reference.
    fn save(&self, bytes: &[u8], original_name: &str) -> Result<String>;
    /// Remove a stored attachment. Missing attachments are not an error.
    fn delete(&self, reference: &str) -> Result<()>;
}

/// Photos on the local filesystem.
#[derive(Debug, Clone)]
pub struct DiskPhotoStore {
    dir: PathBuf,
}

impl DiskPhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, reference: &str) -> PathBuf {
        self.dir.join(sanitize_filename(reference))
    }
}

impl PhotoStore for DiskPhotoStore {
    fn save(&self, bytes: &[u8], original_name: &str) -> Result<String> {
        if !is_allowed(original_name) {
            return Err(HumidorError::validation(format!(
                "unsupported photo type '{}', expected one of: {}",
                original_name,
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let reference = format!("{}_{}", Uuid::new_v4(), sanitize_filename(original_name));
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(&reference), bytes)?;
        tracing::debug!(reference = %reference, size = bytes.len(), "saved photo");
        Ok(reference)
    }

    fn delete(&self, reference: &str) -> Result<()> {
        match fs::remove_file(self.path_for(reference)) {
            Ok(()) => {
                tracing::debug!(reference = %reference, "deleted photo");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether the file name carries one of the accepted image extensions.
pub fn is_allowed(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Reduce a client-supplied name to `[A-Za-z0-9._-]` with no leading dots.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "photo".to_string()
    } else {
        trimmed.to_string()
    }
}
