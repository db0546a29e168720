//! Media module for sixchan.
//!
//! Storage for images attached to threads and replies.

mod storage;

pub use storage::{ImageKind, ImageStorage, ALLOWED_EXTENSIONS, UPLOADS_DIR};
