//! Per-identity storage buckets.
//!
//! Each identity owns a directory under the storage root where callers keep
//! whatever files belong to that entity (exports, screenshots, ...). The
//! directory contents are opaque here; directories are created on demand,
//! renamed when an evolution is confirmed and copied when a clone is kept.

use crate::config::PathsConfig;
use crate::error::{BoxtrackError, Result};
use crate::identity::Identity;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use walkdir::WalkDir;

/// Characters allowed in a storage directory name.
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-()]").unwrap());

/// Directory tree holding one subdirectory per identity.
#[derive(Debug, Clone)]
pub struct EntityStorage {
    root: PathBuf,
}

impl EntityStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage rooted next to the running executable.
    pub fn beside_executable() -> Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().ok_or_else(|| {
            BoxtrackError::Other(format!("Executable has no parent: {}", exe.display()))
        })?;
        Ok(Self::new(dir.join(PathsConfig::ENTITY_STORAGE_DIR_NAME)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory name used for `identity`.
    pub fn dir_name(identity: &Identity) -> String {
        let name = UNSAFE_CHARS.replace_all(identity.as_str(), "_");
        if name.is_empty() {
            "_".to_string()
        } else {
            name.into_owned()
        }
    }

    /// Directory for `identity`, whether or not it exists.
    pub fn dir_for(&self, identity: &Identity) -> PathBuf {
        self.root.join(Self::dir_name(identity))
    }

    /// Create the directory for `identity` if needed.
    pub fn ensure(&self, identity: &Identity) -> Result<PathBuf> {
        let dir = self.dir_for(identity);
        fs::create_dir_all(&dir).map_err(|e| BoxtrackError::io_with_path(e, &dir))?;
        Ok(dir)
    }

    /// Move the directory of `old` to `new`.
    ///
    /// Returns `Ok(false)` when `old` has no directory. Refuses to merge into
    /// an existing `new` directory.
    pub fn relocate(&self, old: &Identity, new: &Identity) -> Result<bool> {
        let src = self.dir_for(old);
        if !src.is_dir() {
            return Ok(false);
        }
        let dest = self.dir_for(new);
        if dest.exists() {
            return Err(BoxtrackError::Validation {
                field: "storage".to_string(),
                message: format!("{} already exists", dest.display()),
            });
        }

        // Rename first, fall back to copy+delete across filesystems
        if fs::rename(&src, &dest).is_err() {
            copy_dir_recursive(&src, &dest)?;
            fs::remove_dir_all(&src).map_err(|e| BoxtrackError::Io {
                message: format!("Failed to clean up source after copy: {}", src.display()),
                path: Some(src.clone()),
                source: Some(e),
            })?;
        }

        debug!("Relocated storage {} -> {}", src.display(), dest.display());
        Ok(true)
    }

    /// Copy the directory of `source` to `target`.
    ///
    /// An existing `target` directory is left untouched. A missing `source`
    /// yields an empty `target` directory. Returns `true` if anything was
    /// created.
    pub fn duplicate(&self, source: &Identity, target: &Identity) -> Result<bool> {
        let dest = self.dir_for(target);
        if dest.exists() {
            return Ok(false);
        }
        let src = self.dir_for(source);
        if src.is_dir() {
            copy_dir_recursive(&src, &dest)?;
        } else {
            fs::create_dir_all(&dest).map_err(|e| BoxtrackError::io_with_path(e, &dest))?;
        }
        debug!("Duplicated storage {} -> {}", src.display(), dest.display());
        Ok(true)
    }
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| BoxtrackError::Io {
            message: format!("Failed to walk {}: {}", src.display(), e),
            path: e.path().map(Path::to_path_buf),
            source: None,
        })?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| BoxtrackError::Other(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| BoxtrackError::io_with_path(e, &target))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| BoxtrackError::Io {
                message: format!(
                    "Failed to copy file: {} -> {}",
                    entry.path().display(),
                    target.display()
                ),
                path: Some(entry.path().to_path_buf()),
                source: Some(e),
            })?;
        }
    }
    Ok(())
}
