//! Google Sheets client: spreadsheet lifecycle through Drive, data through
//! the Sheets values API.

use std::collections::BTreeMap;

use goog_auth::{ContextOptions, GoogleApp, ServiceContext};
use goog_core::Settings;
use goog_drive::{path, DriveClient, DriveFile, Permission, SPREADSHEET_MIME_TYPE};
use tracing::instrument;

use crate::cell::{parse_cell, CellValue};
use crate::error::SheetsError;
use crate::types::*;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

pub struct SheetsClient {
    client: reqwest::Client,
    ctx: ServiceContext,
    drive: DriveClient,
    base_url: String,
}

/// The Sheets credentials addressed at Drive, honouring a configured Drive version.
fn drive_context(ctx: &ServiceContext, settings: &Settings) -> ServiceContext {
    let version = settings.app_config(GoogleApp::Drive.name()).and_then(|c| c.version.clone());
    ctx.for_app(GoogleApp::Drive, version)
}

impl SheetsClient {
    /// Build a client from configured `sheets` credentials. Key and scopes
    /// fall back to `app_configs.sheets` unless both are given.
    pub fn new(opts: ContextOptions) -> Result<Self, SheetsError> {
        let ctx = ServiceContext::new(GoogleApp::Sheets, opts)?;
        Ok(Self::from_context(ctx))
    }

    /// Drive calls reuse the same credentials.
    pub fn from_context(ctx: ServiceContext) -> Self {
        let drive = DriveClient::from_context(drive_context(&ctx, &goog_core::settings()));
        Self {
            client: reqwest::Client::new(),
            ctx,
            drive,
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// Point the client at another host (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_drive(mut self, drive: DriveClient) -> Self {
        self.drive = drive;
        self
    }

    pub fn drive(&self) -> &DriveClient {
        &self.drive
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/spreadsheets{}", self.base_url, self.ctx.version(), path)
    }

    pub async fn id(&self, path: &str) -> Result<String, SheetsError> {
        Ok(self.drive.id(path).await?)
    }

    pub async fn exists(&self, path: &str) -> Result<bool, SheetsError> {
        Ok(self.drive.exists(path).await?)
    }

    /// Spreadsheet metadata: title and worksheets.
    #[instrument(skip(self), level = "info")]
    pub async fn open_by_key(&self, path: &str) -> Result<Spreadsheet, SheetsError> {
        let spreadsheet_id = self.id(path).await?;
        let url = format!(
            "{}?includeGridData=false",
            self.url(&format!("/{}", urlencoding::encode(&spreadsheet_id)))
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Alias of [`open_by_key`](Self::open_by_key).
    pub async fn get_sheet(&self, path: &str) -> Result<Spreadsheet, SheetsError> {
        self.open_by_key(path).await
    }

    /// Create an empty spreadsheet at `path`.
    #[instrument(skip(self), level = "info")]
    pub async fn create(&self, path: &str, overwrite: bool) -> Result<DriveFile, SheetsError> {
        let path = path::normalize(path);
        let (folder, name) = path::split(&path);
        self.clear_target(&path, overwrite).await?;

        let parents = self.parents_of(folder).await?;
        let file = self
            .drive
            .create_file(name, SPREADSHEET_MIME_TYPE, &parents)
            .await?;

        tracing::info!("Created spreadsheet {} id: {}", name, file.id);
        Ok(file)
    }

    /// Copy a spreadsheet as `title` into `folder` (default: the source's folder).
    #[instrument(skip(self), level = "info")]
    pub async fn copy(
        &self,
        path: &str,
        title: &str,
        copy_permissions: bool,
        folder: Option<&str>,
        overwrite: bool,
    ) -> Result<DriveFile, SheetsError> {
        let path = path::normalize(path);
        let new_folder = folder
            .map(path::normalize)
            .unwrap_or_else(|| path::split(&path).0.to_string());
        let new_path = path::join(&new_folder, title);
        self.clear_target(&new_path, overwrite).await?;

        let source_id = self.id(&path).await?;
        let parents = match folder {
            Some(_) => self.parents_of(&new_folder).await?,
            None => vec![],
        };
        let copied = self.drive.copy_file(&source_id, title, &parents).await?;

        if copy_permissions {
            for perm in self.drive.list_permissions(&source_id).await? {
                if perm.is_owner() {
                    continue;
                }
                let grant = Permission {
                    id: String::new(),
                    ..perm
                };
                self.drive
                    .create_permission(&copied.id, &grant, false, None)
                    .await?;
            }
        }

        tracing::info!("Copied {} to {}", path, new_path);
        Ok(copied)
    }

    /// Share a spreadsheet.
    ///
    /// `value` is an email address for `user`/`group`, a domain for `domain`
    /// and ignored for `anyone`. `with_link` makes `anyone`/`domain` grants
    /// link-only instead of discoverable.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, email_message), level = "info")]
    pub async fn insert_permission(
        &self,
        path: &str,
        value: &str,
        perm_type: &str,
        role: &str,
        notify: bool,
        email_message: Option<&str>,
        with_link: bool,
    ) -> Result<Permission, SheetsError> {
        if !matches!(perm_type, "user" | "group" | "domain" | "anyone") {
            return Err(SheetsError::InvalidArgument(format!(
                "Invalid permission type {}",
                perm_type
            )));
        }

        let mut perm = Permission::new(value, perm_type, role);
        if matches!(perm_type, "domain" | "anyone") {
            perm.allow_file_discovery = Some(!with_link);
        }

        let file_id = self.id(path).await?;
        Ok(self
            .drive
            .create_permission(&file_id, &perm, notify, email_message)
            .await?)
    }

    #[instrument(skip(self), level = "info")]
    pub async fn del_spreadsheet(&self, path: &str) -> Result<(), SheetsError> {
        let file_id = self.id(path).await?;
        self.drive.delete_id(&file_id).await?;
        tracing::info!("Deleted spreadsheet {}", path);
        Ok(())
    }

    pub async fn list_permissions(&self, path: &str) -> Result<Vec<Permission>, SheetsError> {
        let file_id = self.id(path).await?;
        Ok(self.drive.list_permissions(&file_id).await?)
    }

    /// Revoke the permission held by `email`.
    #[instrument(skip(self), level = "info")]
    pub async fn remove_permission(&self, path: &str, email: &str) -> Result<(), SheetsError> {
        let file_id = self.id(path).await?;
        let permission_id = self
            .drive
            .list_permissions(&file_id)
            .await?
            .into_iter()
            .find(|p| p.email_address.as_deref() == Some(email))
            .map(|p| p.id)
            .ok_or_else(|| SheetsError::PermissionNotFound(email.to_string()))?;

        self.drive.delete_permission(&file_id, &permission_id).await?;
        Ok(())
    }

    /// Rows of a worksheet as header-keyed maps.
    ///
    /// `header` is the 1-based header row; data starts at `skip`
    /// (default `header + 1`). Rows and headers are zipped, so the shorter
    /// side wins; columns with a blank header are dropped.
    #[instrument(skip(self), level = "info")]
    pub async fn get_iterdict(
        &self,
        path: &str,
        header: u32,
        skip: Option<u32>,
        sheetname: Option<&str>,
    ) -> Result<Vec<BTreeMap<String, CellValue>>, SheetsError> {
        if header < 1 {
            return Err(SheetsError::InvalidArgument("Must include header row".to_string()));
        }
        let skip = skip.filter(|s| *s > 0).unwrap_or(header.saturating_add(1));

        let spreadsheet = self.open_by_key(path).await?;
        let worksheet = match sheetname {
            Some(name) => spreadsheet.worksheet(name),
            None => spreadsheet.sheets.first(),
        };
        let Some(worksheet) = worksheet else {
            tracing::error!(
                "Unable to open {}:{}",
                spreadsheet.title(),
                sheetname.unwrap_or_default()
            );
            return Ok(vec![]);
        };

        let quoted = worksheet.title().replace('\'', "''");
        let header_range = format!("'{}'!A{}:ZZ{}", quoted, header, header);
        let data_range = format!("'{}'!A{}:ZZ{}", quoted, skip, worksheet.row_count());

        let columns: Vec<String> = self
            .values_get(&spreadsheet.spreadsheet_id, &header_range)
            .await?
            .rows()
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.trim().to_string())
            .collect();

        let rows = self
            .values_get(&spreadsheet.spreadsheet_id, &data_range)
            .await?
            .rows();

        let records: Vec<BTreeMap<String, CellValue>> = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row.iter())
                    .filter(|(key, _)| !key.is_empty())
                    .map(|(key, value)| (key.clone(), parse_cell(value)))
                    .collect::<BTreeMap<_, _>>()
            })
            .collect();

        tracing::info!("Built iterdict from {}:{}", spreadsheet.title(), worksheet.title());
        Ok(records)
    }

    /// Formatted values of an A1 range.
    #[instrument(skip(self), level = "debug")]
    pub async fn values_get(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<ValueRange, SheetsError> {
        let url = self.url(&format!(
            "/{}/values/{}",
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        ));

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.ctx.auth_header().await?)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Refuse or delete an existing spreadsheet at `path`.
    async fn clear_target(&self, path: &str, overwrite: bool) -> Result<(), SheetsError> {
        if !self.exists(path).await? {
            return Ok(());
        }
        if !overwrite {
            let (folder, name) = path::split(path);
            return Err(SheetsError::AlreadyExists {
                name: name.to_string(),
                folder: folder.to_string(),
            });
        }
        self.del_spreadsheet(path).await
    }

    /// Parent list for a new file in `folder`; empty when no folder is given.
    async fn parents_of(&self, folder: &str) -> Result<Vec<String>, SheetsError> {
        if folder.is_empty() {
            return Ok(vec![]);
        }
        let folder_path = format!("{}/", folder.trim_end_matches('/'));
        match self.drive.resolve_folder_id(&folder_path).await? {
            Some(id) => Ok(vec![id]),
            None => Err(SheetsError::NotFound(format!("No such folder {}", folder_path))),
        }
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, SheetsError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| SheetsError::ApiError(format!("JSON parse error: {}", e)))
        } else if status.as_u16() == 401 {
            Err(SheetsError::TokenExpired)
        } else if status.as_u16() == 403 {
            Err(SheetsError::AuthRequired)
        } else if status.as_u16() == 404 {
            let text = response.text().await.unwrap_or_default();
            Err(SheetsError::NotFound(text))
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(SheetsError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(SheetsError::ApiError(format!("{}: {}", status, text)))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use goog_core::AppConfig;
    use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BUDGET_Q: &str = "name='Budget' and 'root1' in parents";

    fn client(server: &MockServer) -> SheetsClient {
        let ctx = ServiceContext::with_token(GoogleApp::Sheets, "me@example.com", "test_token");
        let drive = DriveClient::from_context(ctx.for_app(GoogleApp::Drive, None))
            .with_base_url(&server.uri())
            .with_roots(BTreeMap::from([("Reports".to_string(), "root1".to_string())]));
        SheetsClient::from_context(ctx)
            .with_base_url(&server.uri())
            .with_drive(drive)
    }

    async fn mock_list(server: &MockServer, q: &str, files: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/drive/v3/files"))
            .and(query_param("q", q))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": files
            })))
            .mount(server)
            .await;
    }

    async fn mock_budget(server: &MockServer) {
        mock_list(server, BUDGET_Q, serde_json::json!([{"id": "sheet1", "name": "Budget"}])).await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "spreadsheetId": "sheet1",
                "properties": {"title": "Budget"},
                "sheets": [
                    {"properties": {"sheetId": 0, "title": "Data", "index": 0,
                                    "gridProperties": {"rowCount": 50, "columnCount": 10}}}
                ]
            })))
            .mount(server)
            .await;
    }

    fn values_path(range: &str) -> String {
        format!("/v4/spreadsheets/sheet1/values/{}", urlencoding::encode(range))
    }

    #[tokio::test]
    async fn test_open_by_key() {
        let server = MockServer::start().await;
        mock_budget(&server).await;

        let sheet = client(&server).get_sheet("Reports/Budget").await.unwrap();
        assert_eq!(sheet.title(), "Budget");
        assert_eq!(sheet.sheets[0].title(), "Data");
        assert_eq!(sheet.sheets[0].column_count(), 10);
    }

    #[tokio::test]
    async fn test_get_iterdict() {
        let server = MockServer::start().await;
        mock_budget(&server).await;

        Mock::given(method("GET"))
            .and(path(values_path("'Data'!A1:ZZ1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [[" Name ", "Amount", "", "Share"]]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(values_path("'Data'!A2:ZZ50")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    ["Rent", "(1,200)", "ignored", "40%"],
                    ["Food", "350.50"]
                ]
            })))
            .mount(&server)
            .await;

        let rows = client(&server)
            .get_iterdict("Reports/Budget", 1, None, None)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Name"], CellValue::Text("Rent".into()));
        assert_eq!(rows[0]["Amount"], CellValue::Int(-1200));
        assert_eq!(rows[0]["Share"], CellValue::Int(40));
        assert!(!rows[0].contains_key(""));
        assert_eq!(rows[1].len(), 2);
        assert_eq!(rows[1]["Amount"], CellValue::Float(350.5));
    }

    #[tokio::test]
    async fn test_get_iterdict_unknown_sheet_is_empty() {
        let server = MockServer::start().await;
        mock_budget(&server).await;

        let rows = client(&server)
            .get_iterdict("Reports/Budget", 1, None, Some("Nope"))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_get_iterdict_requires_header() {
        let server = MockServer::start().await;
        let result = client(&server).get_iterdict("Reports/Budget", 0, None, None).await;
        assert!(matches!(result, Err(SheetsError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_create_in_folder() {
        let server = MockServer::start().await;
        mock_list(&server, BUDGET_Q, serde_json::json!([])).await;

        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .and(body_partial_json(serde_json::json!({
                "name": "Budget",
                "mimeType": "application/vnd.google-apps.spreadsheet",
                "parents": ["root1"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "new1",
                "name": "Budget",
                "mimeType": "application/vnd.google-apps.spreadsheet"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = client(&server).create("Reports/Budget", false).await.unwrap();
        assert_eq!(file.id, "new1");
    }

    #[tokio::test]
    async fn test_create_existing_without_overwrite() {
        let server = MockServer::start().await;
        mock_list(&server, BUDGET_Q, serde_json::json!([{"id": "sheet1", "name": "Budget"}])).await;

        let err = client(&server).create("Reports/Budget", false).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Budget exists in folder Reports and overwrite set to false"
        );
    }

    #[tokio::test]
    async fn test_create_overwrite_deletes_first() {
        let server = MockServer::start().await;
        mock_list(&server, BUDGET_Q, serde_json::json!([{"id": "sheet1", "name": "Budget"}])).await;

        Mock::given(method("DELETE"))
            .and(path("/drive/v3/files/sheet1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "new2", "name": "Budget"
            })))
            .mount(&server)
            .await;

        let file = client(&server).create("Reports/Budget", true).await.unwrap();
        assert_eq!(file.id, "new2");
    }

    #[tokio::test]
    async fn test_copy_with_permissions() {
        let server = MockServer::start().await;
        mock_budget(&server).await;
        mock_list(&server, "name='Budget 2025' and 'root1' in parents", serde_json::json!([])).await;

        Mock::given(method("POST"))
            .and(path("/drive/v3/files/sheet1/copy"))
            .and(body_partial_json(serde_json::json!({"name": "Budget 2025"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "copy1", "name": "Budget 2025"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files/sheet1/permissions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "permissions": [
                    {"id": "p0", "type": "user", "role": "owner", "emailAddress": "me@example.com"},
                    {"id": "p1", "type": "user", "role": "writer", "emailAddress": "ann@example.com"}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/drive/v3/files/copy1/permissions"))
            .and(query_param("sendNotificationEmail", "false"))
            .and(body_partial_json(serde_json::json!({
                "type": "user",
                "role": "writer",
                "emailAddress": "ann@example.com"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "p9", "type": "user", "role": "writer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let copied = client(&server)
            .copy("Reports/Budget", "Budget 2025", true, None, false)
            .await
            .unwrap();
        assert_eq!(copied.id, "copy1");
    }

    #[tokio::test]
    async fn test_copy_into_folder_overwrites_existing() {
        let server = MockServer::start().await;
        mock_list(&server, BUDGET_Q, serde_json::json!([{"id": "sheet1", "name": "Budget"}])).await;
        mock_list(
            &server,
            "name='archive' and mimeType='application/vnd.google-apps.folder' and 'root1' in parents",
            serde_json::json!([{"id": "arch", "name": "archive"}]),
        )
        .await;
        mock_list(
            &server,
            "name='Budget 2025' and 'arch' in parents",
            serde_json::json!([{"id": "old", "name": "Budget 2025"}]),
        )
        .await;

        Mock::given(method("DELETE"))
            .and(path("/drive/v3/files/old"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/drive/v3/files/sheet1/copy"))
            .and(body_partial_json(serde_json::json!({
                "name": "Budget 2025",
                "parents": ["arch"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "copy2", "name": "Budget 2025", "parents": ["arch"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let copied = client(&server)
            .copy("Reports/Budget", "Budget 2025", false, Some("Reports/archive"), true)
            .await
            .unwrap();
        assert_eq!(copied.id, "copy2");
        assert_eq!(copied.parents, vec!["arch".to_string()]);
    }

    #[tokio::test]
    async fn test_copy_into_existing_without_overwrite() {
        let server = MockServer::start().await;
        mock_list(
            &server,
            "name='archive' and mimeType='application/vnd.google-apps.folder' and 'root1' in parents",
            serde_json::json!([{"id": "arch", "name": "archive"}]),
        )
        .await;
        mock_list(
            &server,
            "name='Budget 2025' and 'arch' in parents",
            serde_json::json!([{"id": "old", "name": "Budget 2025"}]),
        )
        .await;

        let err = client(&server)
            .copy("Reports/Budget", "Budget 2025", false, Some("Reports/archive"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, SheetsError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_get_iterdict_with_last_row_as_header() {
        let server = MockServer::start().await;
        mock_budget(&server).await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/v4/spreadsheets/sheet1/values/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let rows = client(&server)
            .get_iterdict("Reports/Budget", u32::MAX, None, None)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_drive_context_uses_configured_drive_version() {
        let ctx = ServiceContext::with_token(GoogleApp::Sheets, "me@example.com", "t");

        let mut settings = Settings::default();
        assert_eq!(drive_context(&ctx, &settings).version(), "v3");

        settings.app_configs.insert(
            "drive".into(),
            AppConfig {
                key: "/keys/drive.json".into(),
                scopes: vec!["https://www.googleapis.com/auth/drive".into()],
                version: Some("v2".into()),
            },
        );
        let drive = drive_context(&ctx, &settings);
        assert_eq!(drive.version(), "v2");
        assert_eq!(drive.app(), GoogleApp::Drive);
        assert_eq!(drive.account(), "me@example.com");
    }

    #[tokio::test]
    async fn test_insert_permission() {
        let server = MockServer::start().await;
        mock_list(&server, BUDGET_Q, serde_json::json!([{"id": "sheet1", "name": "Budget"}])).await;

        Mock::given(method("POST"))
            .and(path("/drive/v3/files/sheet1/permissions"))
            .and(query_param("sendNotificationEmail", "true"))
            .and(query_param("emailMessage", "Numbers are in"))
            .and(body_partial_json(serde_json::json!({
                "type": "domain",
                "role": "reader",
                "domain": "example.com",
                "allowFileDiscovery": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pd", "type": "domain", "role": "reader", "domain": "example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let perm = client(&server)
            .insert_permission(
                "Reports/Budget",
                "example.com",
                "domain",
                "reader",
                true,
                Some("Numbers are in"),
                true,
            )
            .await
            .unwrap();
        assert_eq!(perm.id, "pd");
    }

    #[tokio::test]
    async fn test_insert_permission_rejects_unknown_type() {
        let server = MockServer::start().await;
        let result = client(&server)
            .insert_permission("Reports/Budget", "x", "robot", "reader", false, None, false)
            .await;
        assert!(matches!(result, Err(SheetsError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_remove_permission() {
        let server = MockServer::start().await;
        mock_list(&server, BUDGET_Q, serde_json::json!([{"id": "sheet1", "name": "Budget"}])).await;

        Mock::given(method("GET"))
            .and(path("/drive/v3/files/sheet1/permissions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "permissions": [
                    {"id": "p1", "type": "user", "role": "writer", "emailAddress": "ann@example.com"}
                ]
            })))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/drive/v3/files/sheet1/permissions/p1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let sheets = client(&server);
        sheets
            .remove_permission("Reports/Budget", "ann@example.com")
            .await
            .unwrap();

        let missing = sheets.remove_permission("Reports/Budget", "bob@example.com").await;
        assert!(matches!(missing, Err(SheetsError::PermissionNotFound(_))));
    }

    #[tokio::test]
    async fn test_del_spreadsheet() {
        let server = MockServer::start().await;
        mock_list(&server, BUDGET_Q, serde_json::json!([{"id": "sheet1", "name": "Budget"}])).await;

        Mock::given(method("DELETE"))
            .and(path("/drive/v3/files/sheet1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).del_spreadsheet("Reports/Budget").await.unwrap();
    }
}
