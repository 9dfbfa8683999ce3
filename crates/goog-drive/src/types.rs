//! Drive API types and data structures.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// File metadata as returned by `files.get` / `files.list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub parents: Vec<String>,
    pub web_content_link: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// API response for `files.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    pub next_page_token: Option<String>,
}

/// A sharing permission on a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub perm_type: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_file_discovery: Option<bool>,
}

impl Permission {
    /// Build a permission for `value`, which is an email address for `user` and
    /// `group`, a domain for `domain`, and ignored for `anyone`.
    pub fn new(value: &str, perm_type: &str, role: &str) -> Self {
        let mut perm = Self {
            perm_type: perm_type.to_string(),
            role: role.to_string(),
            ..Default::default()
        };
        match perm_type {
            "user" | "group" => perm.email_address = Some(value.to_string()),
            "domain" => perm.domain = Some(value.to_string()),
            _ => {}
        }
        perm
    }

    pub fn is_owner(&self) -> bool {
        self.role == "owner"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionListResponse {
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub next_page_token: Option<String>,
}

/// Options for [`walk`](crate::DriveClient::walk).
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub recursive: bool,
    /// Request `webContentLink`
    pub links: bool,
    /// Request `createdTime`
    pub ctime: bool,
    /// Request `modifiedTime`
    pub mtime: bool,
    /// Only files modified at or after this instant
    pub since: Option<DateTime<Utc>>,
    pub exclude_trashed: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            links: false,
            ctime: false,
            mtime: false,
            since: None,
            exclude_trashed: true,
        }
    }
}

impl WalkOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            ..Default::default()
        }
    }

    /// The `fields` selector for listing calls.
    pub fn fields(&self) -> String {
        let mut fields = vec!["id", "name", "mimeType"];
        if self.links {
            fields.push("webContentLink");
        }
        if self.ctime {
            fields.push("createdTime");
        }
        if self.mtime {
            fields.push("modifiedTime");
        }
        format!("nextPageToken, files({})", fields.join(", "))
    }

    /// The `q` expression for the children of `folder_id`.
    pub fn query(&self, folder_id: &str) -> String {
        let mut q = format!("'{}' in parents", folder_id);
        if let Some(since) = self.since {
            q.push_str(&format!(
                " and modifiedTime>='{}'",
                since.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            ));
        }
        if self.exclude_trashed {
            q.push_str(" and trashed=false");
        }
        q
    }
}

/// A file found by [`walk`](crate::DriveClient::walk).
#[derive(Debug, Clone, PartialEq)]
pub struct WalkEntry {
    /// `<folder>/<name>`
    pub path: String,
    pub id: String,
    pub mime_type: String,
    pub web_content_link: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
}

/// Content for [`write`](crate::DriveClient::write).
#[derive(Debug, Clone)]
pub enum WriteSource {
    /// A local regular file
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for WriteSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<u8>> for WriteSource {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data)
    }
}

#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Overrides detection from the name and content
    pub mime_type: Option<String>,
    /// Replace an existing file of the same name
    pub overwrite: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            mime_type: None,
            overwrite: true,
        }
    }
}
