//! Google Drive API client.

use std::collections::BTreeMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use goog_auth::{ContextOptions, GoogleApp, ServiceContext};
use goog_core::mime;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::instrument;

use crate::error::DriveError;
use crate::path;
use crate::types::*;

const DRIVE_API_BASE: &str = "https://www.googleapis.com";
const SHARED_DRIVE_PARAMS: &str = "supportsAllDrives=true&includeItemsFromAllDrives=true";
const FILE_FIELDS: &str = "id,name,mimeType,parents";

/// Consecutive 308 responses without progress before an upload is abandoned.
const MAX_STALLED_CHUNKS: u32 = 3;

/// Resumable upload chunk size. Drive wants multiples of 256 KiB.
pub const UPLOAD_CHUNK_SIZE: usize = 8 * 1024 * 1024;

pub struct DriveClient {
    client: reqwest::Client,
    ctx: ServiceContext,
    base_url: String,
    pub(crate) roots: BTreeMap<String, String>,
    tmpdir: Option<PathBuf>,
    chunk_size: usize,
}

impl DriveClient {
    /// Build a client from configured `drive` credentials.
    pub fn new(opts: ContextOptions) -> Result<Self, DriveError> {
        let ctx = ServiceContext::new(GoogleApp::Drive, opts)?;
        Ok(Self::from_context(ctx))
    }

    /// Root mapping and temp directory are read from settings here, once.
    pub fn from_context(ctx: ServiceContext) -> Self {
        let settings = goog_core::settings();
        Self {
            client: reqwest::Client::new(),
            ctx,
            base_url: DRIVE_API_BASE.to_string(),
            roots: settings.rootid,
            tmpdir: settings.tmpdir,
            chunk_size: UPLOAD_CHUNK_SIZE,
        }
    }

    /// Point the client at another host (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_roots(mut self, roots: BTreeMap<String, String>) -> Self {
        self.roots = roots;
        self
    }

    pub fn with_tmpdir(mut self, tmpdir: Option<PathBuf>) -> Self {
        self.tmpdir = tmpdir;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn files_url(&self, path: &str) -> String {
        format!("{}/drive/{}/files{}", self.base_url, self.ctx.version(), path)
    }

    fn upload_url(&self) -> String {
        format!("{}/upload/drive/{}/files", self.base_url, self.ctx.version())
    }

    /// One page of `files.list` across all drives.
    pub(crate) async fn list_files(
        &self,
        q: &str,
        fields: &str,
        page_token: Option<&str>,
    ) -> Result<FileListResponse, DriveError> {
        let mut url = format!(
            "{}?q={}&fields={}&spaces=drive&{}",
            self.files_url(""),
            urlencoding::encode(q),
            urlencoding::encode(fields),
            SHARED_DRIVE_PARAMS
        );
        if let Some(pt) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(pt)));
        }

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Permanently delete a file. Folders are refused.
    #[instrument(skip(self), level = "info")]
    pub async fn delete(&self, path: &str) -> Result<(), DriveError> {
        let path = path::normalize(path);
        if path::is_folder(&path) {
            return Err(DriveError::NotAFile("delete"));
        }

        let file_id = self.id(&path).await?;
        self.delete_id(&file_id).await?;
        tracing::info!("Deleted {} from drive", path);
        Ok(())
    }

    /// Permanently delete by ID.
    pub async fn delete_id(&self, file_id: &str) -> Result<(), DriveError> {
        let url = format!(
            "{}?supportsAllDrives=true",
            self.files_url(&format!("/{}", urlencoding::encode(file_id)))
        );

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        self.check_status(response).await.map(|_| ())
    }

    /// Stream a file to `<directory>/<file name>`, returning the local path.
    ///
    /// `directory` defaults to the configured temp directory.
    #[instrument(skip(self), level = "info")]
    pub async fn download(
        &self,
        path: &str,
        directory: Option<&Path>,
    ) -> Result<PathBuf, DriveError> {
        let directory = directory
            .map(Path::to_path_buf)
            .or_else(|| self.tmpdir.clone())
            .ok_or(DriveError::MissingSetting("directory"))?;

        let path = path::normalize(path);
        let (_, name) = path::split(&path);
        if name.is_empty() {
            return Err(DriveError::NotAFile("download"));
        }

        let file_id = self.id(&path).await?;
        let mut response = self.media(&file_id).await?;
        let total = response.content_length().filter(|len| *len > 0);

        let target = directory.join(name);
        let io_err = |source: std::io::Error| DriveError::Io {
            path: target.display().to_string(),
            source,
        };
        let mut file = tokio::fs::File::create(&target).await.map_err(io_err)?;

        let mut received: u64 = 0;
        let mut last_pct = None;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(io_err)?;
            received += chunk.len() as u64;
            if let Some(total) = total {
                let pct = received * 100 / total;
                if last_pct != Some(pct) {
                    tracing::info!("Download Progress: {}%", pct);
                    last_pct = Some(pct);
                }
            }
        }
        file.flush().await.map_err(io_err)?;

        tracing::info!("Downloaded file {}", name);
        Ok(target)
    }

    /// File contents in memory.
    #[instrument(skip(self), level = "info")]
    pub async fn read(&self, path: &str) -> Result<Vec<u8>, DriveError> {
        let path = path::normalize(path);
        if path::is_folder(&path) {
            return Err(DriveError::NotAFile("read"));
        }

        let file_id = self.id(&path).await?;
        let bytes = self.media(&file_id).await?.bytes().await?;
        tracing::info!("Downloaded file {}", path::split(&path).1);
        Ok(bytes.to_vec())
    }

    async fn media(&self, file_id: &str) -> Result<reqwest::Response, DriveError> {
        let url = format!(
            "{}?alt=media&supportsAllDrives=true",
            self.files_url(&format!("/{}", urlencoding::encode(file_id)))
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        self.check_status(response).await
    }

    /// Files under `folder`, descending into sub-folders when `recursive`.
    #[instrument(skip(self, opts), level = "info")]
    pub async fn walk(&self, folder: &str, opts: &WalkOptions) -> Result<Vec<WalkEntry>, DriveError> {
        let folder = path::normalize(folder);
        let folder_id = self.id(&folder).await?;

        let mut entries = vec![];
        self.walk_folder(folder, folder_id, opts, &mut entries).await?;
        Ok(entries)
    }

    fn walk_folder<'a>(
        &'a self,
        folder: String,
        folder_id: String,
        opts: &'a WalkOptions,
        out: &'a mut Vec<WalkEntry>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), DriveError>> + Send + 'a>>
    {
        Box::pin(async move {
            let q = opts.query(&folder_id);
            let fields = opts.fields();
            let mut page_token: Option<String> = None;

            loop {
                let resp = self.list_files(&q, &fields, page_token.as_deref()).await?;
                tracing::info!("Returned {} items from {}", resp.files.len(), folder);

                for file in resp.files {
                    let child = path::join(&folder, &file.name);
                    if file.is_folder() {
                        if opts.recursive {
                            self.walk_folder(child, file.id, opts, out).await?;
                        }
                        continue;
                    }
                    out.push(WalkEntry {
                        path: child,
                        id: file.id,
                        mime_type: file.mime_type,
                        web_content_link: file.web_content_link,
                        created_time: file.created_time,
                        modified_time: file.modified_time,
                    });
                }

                match resp.next_page_token {
                    Some(pt) => page_token = Some(pt),
                    None => break,
                }
            }

            Ok(())
        })
    }

    /// Move a file into `to_folder`, dropping all previous parents.
    #[instrument(skip(self), level = "info")]
    pub async fn move_file(&self, path: &str, to_folder: &str) -> Result<DriveFile, DriveError> {
        let path = path::normalize(path);
        let (_, name) = path::split(&path);
        if name.is_empty() {
            return Err(DriveError::NotAFile("move"));
        }

        let file_id = self.id(&path).await?;
        let to_folder_id = self.id(to_folder).await?;
        let previous = self.get_file(&file_id, "parents").await?.parents.join(",");

        let url = format!(
            "{}?addParents={}&removeParents={}&fields={}&supportsAllDrives=true",
            self.files_url(&format!("/{}", urlencoding::encode(&file_id))),
            urlencoding::encode(&to_folder_id),
            urlencoding::encode(&previous),
            urlencoding::encode("id,parents"),
        );

        let response = self
            .client
            .patch(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let moved: DriveFile = self.handle_response(response).await?;
        tracing::info!("Moved {} to Drive folder {}", name, to_folder);
        Ok(moved)
    }

    /// Upload `source` as `<folder>/<name>` with the resumable protocol.
    #[instrument(skip(self, source, opts), level = "info")]
    pub async fn write(
        &self,
        source: WriteSource,
        name: &str,
        folder: &str,
        opts: &WriteOptions,
    ) -> Result<DriveFile, DriveError> {
        let folder = path::normalize(folder);
        self.validate_folder(&folder)?;

        let (mut upload, total) = UploadSource::open(source).await?;

        let mime_type = match opts
            .mime_type
            .clone()
            .or_else(|| mime::guess_from_name(name).map(String::from))
        {
            Some(mime_type) => mime_type,
            None => {
                tracing::warn!("Unable to guess mimetype of file name {}, trying again", name);
                let head = upload.read_at(0, 64).await.map_err(|e| upload.io_error(e))?;
                mime::sniff(&head)
                    .map(String::from)
                    .ok_or_else(|| DriveError::UnknownMimeType(name.to_string()))?
            }
        };

        let target = path::join(&folder, name);
        self.protect(&target, opts.overwrite).await?;
        let folder_id = self.id(&folder).await?;

        let session = self.start_upload(name, &folder_id, &mime_type, total).await?;
        let file = self.upload_chunks(&session, &mut upload, total, name).await?;

        tracing::info!("Wrote file: {} id: {} to Drive {}", file.name, file.id, folder);
        Ok(file)
    }

    /// Clear the way for a new file at `path`: delete an existing one when
    /// `overwrite`, otherwise fail with `AlreadyExists`.
    pub async fn protect(&self, path: &str, overwrite: bool) -> Result<(), DriveError> {
        match self.id(path).await {
            Ok(_) if overwrite => {
                tracing::info!("Overwriting existing {}", path);
                self.delete(path).await
            }
            Ok(_) => Err(DriveError::AlreadyExists(path.to_string())),
            Err(e) if e.is_lookup_failure() => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn start_upload(
        &self,
        name: &str,
        folder_id: &str,
        mime_type: &str,
        total: u64,
    ) -> Result<String, DriveError> {
        let url = format!(
            "{}?uploadType=resumable&supportsAllDrives=true&fields={}",
            self.upload_url(),
            urlencoding::encode(FILE_FIELDS)
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .header("X-Upload-Content-Type", mime_type)
            .header("X-Upload-Content-Length", total.to_string())
            .json(&serde_json::json!({
                "name": name,
                "parents": [folder_id],
                "mimeType": mime_type,
            }))
            .send()
            .await?;

        let response = self.check_status(response).await?;
        response
            .headers()
            .get("Location")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| DriveError::Upload("no upload session returned".to_string()))
    }

    async fn upload_chunks(
        &self,
        session: &str,
        upload: &mut UploadSource,
        total: u64,
        name: &str,
    ) -> Result<DriveFile, DriveError> {
        let mut offset: u64 = 0;
        let mut stalled = 0;

        loop {
            let chunk = upload
                .read_at(offset, self.chunk_size)
                .await
                .map_err(|e| upload.io_error(e))?;
            if chunk.is_empty() && offset < total {
                return Err(DriveError::Upload(format!("{} ended at byte {}", name, offset)));
            }

            let end = offset + chunk.len() as u64;
            let range = if total == 0 {
                "bytes */0".to_string()
            } else {
                format!("bytes {}-{}/{}", offset, end - 1, total)
            };

            let response = self
                .client
                .put(session)
                .header("Authorization", self.ctx.auth_header().await?)
                .header("Content-Range", range)
                .body(chunk)
                .send()
                .await?;

            if response.status().as_u16() == 308 {
                // Range is "bytes=0-<last received>"; absent means nothing stored yet.
                let next = response
                    .headers()
                    .get("Range")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|r| r.rsplit('-').next())
                    .and_then(|last| last.parse::<u64>().ok())
                    .map(|last| last.saturating_add(1))
                    .unwrap_or(0);

                if next <= offset {
                    stalled += 1;
                    tracing::warn!("Upload of {} did not advance past byte {}", name, offset);
                    if stalled >= MAX_STALLED_CHUNKS {
                        return Err(DriveError::Upload(format!(
                            "{} stalled at byte {} after {} attempts",
                            name, offset, stalled
                        )));
                    }
                } else {
                    stalled = 0;
                }
                offset = next.min(total);
                tracing::info!("Uploading {} {}%", name, offset * 100 / total.max(1));
                continue;
            }

            let file: DriveFile = self.handle_response(response).await?;
            tracing::info!("Uploading {} 100%", name);
            return Ok(file);
        }
    }

    /// File metadata by ID.
    pub async fn get_file(&self, file_id: &str, fields: &str) -> Result<DriveFile, DriveError> {
        let url = format!(
            "{}?fields={}&supportsAllDrives=true",
            self.files_url(&format!("/{}", urlencoding::encode(file_id))),
            urlencoding::encode(fields)
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Create a content-less file (Google-native types such as spreadsheets).
    #[instrument(skip(self), level = "info")]
    pub async fn create_file(
        &self,
        name: &str,
        mime_type: &str,
        parents: &[String],
    ) -> Result<DriveFile, DriveError> {
        let url = format!(
            "{}?supportsAllDrives=true&fields={}",
            self.files_url(""),
            urlencoding::encode(FILE_FIELDS)
        );

        let mut body = serde_json::json!({ "name": name, "mimeType": mime_type });
        if !parents.is_empty() {
            body["parents"] = serde_json::json!(parents);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Copy a file under a new name, optionally into other parents.
    #[instrument(skip(self), level = "info")]
    pub async fn copy_file(
        &self,
        file_id: &str,
        name: &str,
        parents: &[String],
    ) -> Result<DriveFile, DriveError> {
        let url = format!(
            "{}?supportsAllDrives=true&fields={}",
            self.files_url(&format!("/{}/copy", urlencoding::encode(file_id))),
            urlencoding::encode(FILE_FIELDS)
        );

        let mut body = serde_json::json!({ "name": name });
        if !parents.is_empty() {
            body["parents"] = serde_json::json!(parents);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .json(&body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// All permissions on a file, following pagination.
    #[instrument(skip(self), level = "info")]
    pub async fn list_permissions(&self, file_id: &str) -> Result<Vec<Permission>, DriveError> {
        let mut permissions = vec![];
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}?supportsAllDrives=true&fields={}",
                self.files_url(&format!("/{}/permissions", urlencoding::encode(file_id))),
                urlencoding::encode(
                    "nextPageToken, permissions(id, type, role, emailAddress, domain, allowFileDiscovery)"
                )
            );
            if let Some(pt) = &page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(pt)));
            }

            let response = self
                .client
                .get(&url)
                .header("Authorization", self.ctx.auth_header().await?)
                .send()
                .await?;

            let resp: PermissionListResponse = self.handle_response(response).await?;
            permissions.extend(resp.permissions);

            match resp.next_page_token {
                Some(pt) => page_token = Some(pt),
                None => break,
            }
        }

        Ok(permissions)
    }

    /// Grant a permission on a file.
    #[instrument(skip(self), level = "info")]
    pub async fn create_permission(
        &self,
        file_id: &str,
        permission: &Permission,
        notify: bool,
        email_message: Option<&str>,
    ) -> Result<Permission, DriveError> {
        let mut url = format!(
            "{}?supportsAllDrives=true&sendNotificationEmail={}",
            self.files_url(&format!("/{}/permissions", urlencoding::encode(file_id))),
            notify
        );
        if let Some(message) = email_message {
            url.push_str(&format!("&emailMessage={}", urlencoding::encode(message)));
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .json(permission)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Revoke a permission by its ID.
    #[instrument(skip(self), level = "info")]
    pub async fn delete_permission(
        &self,
        file_id: &str,
        permission_id: &str,
    ) -> Result<(), DriveError> {
        let url = format!(
            "{}?supportsAllDrives=true",
            self.files_url(&format!(
                "/{}/permissions/{}",
                urlencoding::encode(file_id),
                urlencoding::encode(permission_id)
            ))
        );

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        self.check_status(response).await.map(|_| ())
    }

    /// Pass successful responses through, map the rest onto `DriveError`.
    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DriveError> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else if status.as_u16() == 401 {
            Err(DriveError::TokenExpired)
        } else if status.as_u16() == 403 {
            Err(DriveError::AuthRequired)
        } else if status.as_u16() == 404 {
            let text = response.text().await.unwrap_or_default();
            Err(DriveError::ApiNotFound(text))
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(DriveError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(DriveError::ApiError(format!("{}: {}", status, text)))
        }
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, DriveError> {
        self.check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| DriveError::ApiError(format!("JSON parse error: {}", e)))
    }
}

/// Content being uploaded, read one chunk at a time.
enum UploadSource {
    File { file: tokio::fs::File, path: PathBuf },
    Bytes(Vec<u8>),
}

impl UploadSource {
    /// Open the source and report its length. Paths must be regular files.
    async fn open(source: WriteSource) -> Result<(Self, u64), DriveError> {
        match source {
            WriteSource::Path(path) => {
                if path.is_dir() {
                    return Err(DriveError::InvalidSource(format!(
                        "{} is a directory, not a file",
                        path.display()
                    )));
                }
                if !path.is_file() {
                    return Err(DriveError::InvalidSource(format!(
                        "Cannot verify file {}",
                        path.display()
                    )));
                }
                let io_err = |source: std::io::Error| DriveError::Io {
                    path: path.display().to_string(),
                    source,
                };
                let file = tokio::fs::File::open(&path).await.map_err(io_err)?;
                let len = file.metadata().await.map_err(io_err)?.len();
                Ok((Self::File { file, path }, len))
            }
            WriteSource::Bytes(data) => {
                let len = data.len() as u64;
                Ok((Self::Bytes(data), len))
            }
        }
    }

    async fn read_at(&mut self, offset: u64, len: usize) -> std::io::Result<Vec<u8>> {
        match self {
            Self::File { file, .. } => {
                file.seek(SeekFrom::Start(offset)).await?;
                let mut buf = Vec::with_capacity(len);
                (&mut *file).take(len as u64).read_to_end(&mut buf).await?;
                Ok(buf)
            }
            Self::Bytes(data) => {
                let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
                let end = start.saturating_add(len).min(data.len());
                Ok(data[start..end].to_vec())
            }
        }
    }

    fn io_error(&self, source: std::io::Error) -> DriveError {
        let path = match self {
            Self::File { path, .. } => path.display().to_string(),
            Self::Bytes(_) => "<memory>".to_string(),
        };
        DriveError::Io { path, source }
    }
}
