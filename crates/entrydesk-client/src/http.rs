use crate::{AdminApi, ClientError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use entrydesk_core::{
    validate_path, CreatedEntry, Entry, EntryRow, LinkPalletData, LinkedPaths, UploadedFile,
    Visibility,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`AdminApi`] over the service's JSON REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpAdminClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct VisibilityBody {
    visibility: Visibility,
}

impl HttpAdminClient {
    /// `base_url` is the API root, e.g. `"http://localhost:5173/api"`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/{}", self.base_url, tail)
    }

    /// URL under `/entries/{path}`, with the path encoded as one segment.
    fn entry_url(&self, path: &str, rest: &str) -> Result<String> {
        let path = validate_path(path)?;
        let encoded = urlencoding::encode(path);
        Ok(if rest.is_empty() {
            self.url(&format!("entries/{}", encoded))
        } else {
            self.url(&format!("entries/{}/{}", encoded, rest))
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    async fn send(&self, request: RequestBuilder, subject: &str) -> Result<Response> {
        let response = request.send().await?;
        check_status(response, subject).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, subject: &str) -> Result<T> {
        let response = self.send(request, subject).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Map non-success statuses to typed errors, preferring the service's own
/// `message` or `error` field as the description.
async fn check_status(response: Response, subject: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| {
            body.get("message")
                .or_else(|| body.get("error"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text.trim().to_string()
            }
        });

    Err(match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(subject.to_string()),
        StatusCode::CONFLICT => ClientError::Conflict(message),
        _ => ClientError::Status {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl AdminApi for HttpAdminClient {
    #[instrument(skip(self))]
    async fn latest_entries(&self, cursor: Option<DateTime<Utc>>) -> Result<Vec<EntryRow>> {
        let mut request = self.request(Method::GET, &self.url("entries"));
        if let Some(cursor) = cursor {
            request = request.query(&[(
                "last_last_edited_at",
                cursor.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )]);
        }
        let rows: Option<Vec<EntryRow>> = self.send_json(request, "entries").await?;
        Ok(rows.unwrap_or_default())
    }

    async fn entry_titles(&self) -> Result<Vec<String>> {
        let request = self.request(Method::GET, &self.url("entries/titles"));
        let titles: Option<Vec<String>> = self.send_json(request, "titles").await?;
        Ok(titles.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn get_entry(&self, path: &str) -> Result<Entry> {
        let request = self.request(Method::GET, &self.entry_url(path, "")?);
        let row: EntryRow = self.send_json(request, path).await?;
        row.to_entry()
            .ok_or_else(|| ClientError::NotFound(path.to_string()))
    }

    #[instrument(skip(self))]
    async fn create_entry(&self, title: &str) -> Result<CreatedEntry> {
        let request = self
            .request(Method::POST, &self.url("entries"))
            .json(&json!({ "title": title }));
        self.send_json(request, title).await
    }

    #[instrument(skip(self, body), fields(len = body.len()))]
    async fn update_body(&self, path: &str, body: &str) -> Result<()> {
        let request = self
            .request(Method::PUT, &self.entry_url(path, "body")?)
            .json(&json!({ "body": body }));
        self.send(request, path).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_title(&self, path: &str, title: &str) -> Result<()> {
        let request = self
            .request(Method::PUT, &self.entry_url(path, "title")?)
            .json(&json!({ "title": title }));
        self.send(request, path).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_visibility(&self, path: &str, visibility: Visibility) -> Result<Visibility> {
        let request = self
            .request(Method::PUT, &self.entry_url(path, "visibility")?)
            .json(&json!({ "visibility": visibility }));
        let body: VisibilityBody = self.send_json(request, path).await?;
        Ok(body.visibility)
    }

    #[instrument(skip(self))]
    async fn delete_entry(&self, path: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &self.entry_url(path, "")?);
        self.send(request, path).await?;
        Ok(())
    }

    async fn linked_entry_paths(&self, path: &str) -> Result<LinkedPaths> {
        let request = self.request(Method::GET, &self.entry_url(path, "links")?);
        let links: Option<LinkedPaths> = self.send_json(request, path).await?;
        // Unresolved titles may come back as empty strings.
        Ok(links
            .unwrap_or_default()
            .into_iter()
            .map(|(title, dst)| (title, dst.filter(|p| !p.is_empty())))
            .collect())
    }

    #[instrument(skip(self))]
    async fn link_pallet(&self, path: &str) -> Result<LinkPalletData> {
        let request = self.request(Method::GET, &self.entry_url(path, "link-pallet")?);
        self.send_json(request, path).await
    }

    #[instrument(skip(self))]
    async fn regenerate_entry_image(&self, path: &str) -> Result<()> {
        let request = self.request(Method::POST, &self.entry_url(path, "image/regenerate")?);
        self.send(request, path).await?;
        Ok(())
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload_file(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedFile> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self.request(Method::POST, &self.url("upload")).multipart(form);
        self.send_json(request, file_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_url_encodes_single_segment() {
        let client = HttpAdminClient::new("http://localhost:8080/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(
            client.entry_url("2024/hello world", "body").unwrap(),
            "http://localhost:8080/api/entries/2024%2Fhello%20world/body"
        );
        assert_eq!(
            client.entry_url("abc", "").unwrap(),
            "http://localhost:8080/api/entries/abc"
        );
    }

    #[test]
    fn test_entry_url_rejects_bad_paths() {
        let client = HttpAdminClient::new("http://localhost").unwrap();
        assert!(matches!(client.entry_url("/", "links"), Err(ClientError::Core(_))));
        assert!(client.entry_url("../etc", "").is_err());
    }
}
