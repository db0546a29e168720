//! Image storage for sixchan.
//!
//! Uploaded images are written under the media root as
//! `uploads/<kind>/<uuid>.<ext>`. The client's file name is discarded apart
//! from its extension, and only image extensions are accepted.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{ChanError, Result};

/// Directory under the media root that holds all uploads.
pub const UPLOADS_DIR: &str = "uploads";

/// Accepted image extensions (lowercase).
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Resource an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Thread,
    Reply,
}

impl ImageKind {
    /// Directory name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Thread => "thread",
            ImageKind::Reply => "reply",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image storage rooted at the media directory.
///
/// ```text
/// {root}/
/// └── uploads/
///     ├── thread/
///     │   └── 0b6c3b0e-....png
///     └── reply/
///         └── 9f1d2a44-....jpg
/// ```
#[derive(Debug, Clone)]
pub struct ImageStorage {
    root: PathBuf,
}

impl ImageStorage {
    /// Create a new ImageStorage with the given media root.
    ///
    /// The upload directories are created if they don't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for kind in [ImageKind::Thread, ImageKind::Reply] {
            fs::create_dir_all(root.join(UPLOADS_DIR).join(kind.as_str()))?;
        }
        Ok(Self { root })
    }

    /// Directory served as `/uploads`.
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    /// Save an uploaded image.
    ///
    /// Returns the stored path relative to the media root, e.g.
    /// `uploads/thread/<uuid>.png`.
    pub fn save(&self, kind: ImageKind, content: &[u8], original_name: &str) -> Result<String> {
        if content.is_empty() {
            return Err(ChanError::invalid("image", "The submitted file is empty."));
        }
        let ext = image_extension(original_name)?;
        let relative = format!("{UPLOADS_DIR}/{kind}/{}.{ext}", Uuid::new_v4());

        fs::write(self.root.join(&relative), content)?;
        Ok(relative)
    }

    /// Delete a stored image.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub fn delete(&self, relative: &str) -> Result<bool> {
        let path = self.resolve(relative)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Map a relative stored path to a file under the uploads directory.
    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let mut parts = relative.split('/');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next(), parts.next()),
            (Some(UPLOADS_DIR), Some("thread" | "reply"), Some(name), None)
                if !name.is_empty() && name != "." && name != ".." && !name.contains('\\')
        );
        if !valid {
            return Err(ChanError::NotFound(format!("image {relative}")));
        }
        Ok(self.root.join(relative))
    }
}

/// Extract and check the image extension of an uploaded file name.
fn image_extension(original_name: &str) -> Result<String> {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let is_image = mime_guess::from_ext(&ext)
        .first()
        .map(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(false);

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) || !is_image {
        return Err(ChanError::invalid(
            "image",
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        ));
    }
    Ok(ext)
}
