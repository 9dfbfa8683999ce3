//! Path resolution: `Root/folder/file` to Drive IDs, one lookup per segment.

use goog_core::{clean_filename, ConfigError};
use tracing::instrument;

use crate::client::DriveClient;
use crate::error::DriveError;
use crate::path;
use crate::types::FOLDER_MIME_TYPE;

const LOOKUP_FIELDS: &str = "nextPageToken, files(id, name)";

impl DriveClient {
    /// The first segment of `folder` must name a configured root.
    pub fn validate_folder(&self, folder: &str) -> Result<(), DriveError> {
        let folder = path::normalize(folder);
        let base = path::segments(&folder).first().copied().unwrap_or_default();
        if !self.roots.contains_key(base) {
            return Err(ConfigError::UnknownSharedDrive(base.to_string()).into());
        }
        Ok(())
    }

    /// ID of the folder part of `path` (everything before the last `/`).
    ///
    /// `None` when a segment below the root does not exist.
    #[instrument(skip(self), level = "debug")]
    pub async fn resolve_folder_id(&self, path: &str) -> Result<Option<String>, DriveError> {
        let path = path::normalize(path);
        let (folder, _) = path::split(&path);
        self.validate_folder(folder)?;

        let segments = path::segments(folder);
        let Some((root, rest)) = segments.split_first() else {
            return Ok(None);
        };
        let Some(mut folder_id) = self.roots.get(*root).cloned() else {
            return Ok(None);
        };

        for segment in rest {
            match self.find_child(segment, &folder_id, true).await? {
                Some(child) => folder_id = child,
                None => {
                    tracing::debug!("Could not locate folder {}", folder);
                    return Ok(None);
                }
            }
        }

        tracing::debug!("Found folder {} with folderid {}", folder, folder_id);
        Ok(Some(folder_id))
    }

    /// ID of the item named by the last segment of `path`, any MIME type.
    #[instrument(skip(self), level = "debug")]
    pub async fn resolve_file_id(&self, path: &str) -> Result<Option<String>, DriveError> {
        let path = path::normalize(path);
        let (folder, name) = path::split(&path);
        if name.is_empty() {
            return self.resolve_folder_id(&path).await;
        }

        let Some(parent) = self.resolve_folder_id(&format!("{}/", folder)).await? else {
            return Ok(None);
        };
        self.find_child(name, &parent, false).await
    }

    /// Drive ID for a path: the file when the last segment is non-empty,
    /// the folder when the path ends with `/`.
    ///
    /// A bare root name (`Reports` or `Reports/`) is its mapped ID.
    #[instrument(skip(self), level = "info")]
    pub async fn id(&self, path: &str) -> Result<String, DriveError> {
        let path = path::normalize(path);
        let (folder, name) = path::split(&path);

        if !name.is_empty() {
            if folder.is_empty() {
                if let Some(root_id) = self.roots.get(name) {
                    return Ok(root_id.clone());
                }
            }
            return self.resolve_file_id(&path).await?.ok_or_else(|| {
                DriveError::NotFound(format!("No such file {} in folder {}", name, folder))
            });
        }

        self.resolve_folder_id(&path)
            .await?
            .ok_or_else(|| DriveError::NotFound(format!("No such folder {}/", folder)))
    }

    /// Whether the path resolves. Unknown roots and missing items are `false`.
    pub async fn exists(&self, path: &str) -> Result<bool, DriveError> {
        match self.id(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_lookup_failure() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// First child of `parent_id` with this name. Duplicate names resolve to
    /// whichever Drive lists first.
    async fn find_child(
        &self,
        name: &str,
        parent_id: &str,
        folder_only: bool,
    ) -> Result<Option<String>, DriveError> {
        let name = clean_filename(name);
        let q = if folder_only {
            format!(
                "name='{}' and mimeType='{}' and '{}' in parents",
                name, FOLDER_MIME_TYPE, parent_id
            )
        } else {
            format!("name='{}' and '{}' in parents", name, parent_id)
        };

        let mut page_token: Option<String> = None;
        loop {
            let resp = self.list_files(&q, LOOKUP_FIELDS, page_token.as_deref()).await?;
            if let Some(found) = resp.files.into_iter().next() {
                tracing::debug!("Found {}", found.name);
                return Ok(Some(found.id));
            }

            match resp.next_page_token {
                Some(pt) => page_token = Some(pt),
                None => return Ok(None),
            }
        }
    }
}
