//! Client half of action-log synchronization.
//!
//! Entries are appended locally by [`crate::db::ActionLogRepository`] and
//! drained here; the server decides what it keeps.

mod uploader;

pub use uploader::{ActionLogUploader, UploadError, UploadReport};
