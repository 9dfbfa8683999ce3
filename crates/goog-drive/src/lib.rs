//! Google Drive facade with `Root/folder/file` path resolution.
//!
//! Paths start at a name from the configured root mapping and are resolved
//! one "children of parent by name" query per segment.

pub mod client;
pub mod error;
pub mod path;
mod resolve;
pub mod types;

pub use client::{DriveClient, UPLOAD_CHUNK_SIZE};
pub use error::DriveError;
pub use types::{
    DriveFile, Permission, WalkEntry, WalkOptions, WriteOptions, WriteSource, FOLDER_MIME_TYPE,
    SPREADSHEET_MIME_TYPE,
};
