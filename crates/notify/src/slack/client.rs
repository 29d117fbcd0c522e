use async_trait::async_trait;
use courier_core::notify::entity::Attachment;
use courier_core::notify::error::NotifyError;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

/// Default base URL of the Slack Web API.
pub const DEFAULT_API_URL: &str = "https://slack.com/api/";

/// # Summary
/// Transport used by the Slack service. The service owns exactly one.
///
/// # Invariants
/// * Implementations must be `Send + Sync`; one client serves concurrent sends.
/// * `text` arrives fully rendered and escaped.
#[async_trait]
pub trait SlackClient: Send + Sync {
    /// Posts `text` into the channel identified by `channel_id`.
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), NotifyError>;

    /// Shares `attachment` as a file in the channel identified by `channel_id`.
    async fn upload_file(
        &self,
        channel_id: &str,
        attachment: &Attachment,
    ) -> Result<(), NotifyError>;
}

/// # Summary
/// A `SlackClient` backed by the Slack Web API.
///
/// # Invariants
/// * `token` is sent as a Bearer token on every call; it is not validated
///   until the first request.
pub struct SlackApi {
    /// The bot or user OAuth token.
    token: String,
    /// Base URL ending in `/`.
    base_url: String,
    /// The HTTP client used for requests.
    client: reqwest::Client,
}

/// Common envelope of every Web API response.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    ok: bool,
    error: Option<String>,
    upload_url: Option<String>,
    file_id: Option<String>,
}

impl SlackApi {
    /// # Summary
    /// Creates a client bound to `token` against the public Slack API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_API_URL.to_string(),
            client: crate::http_client(),
        }
    }

    /// # Summary
    /// Points the client at another API root (e.g. an enterprise proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    fn endpoint(&self, method: &str) -> Result<Url, NotifyError> {
        Url::parse(&format!("{}{}", self.base_url, method))
            .map_err(|e| NotifyError::Config(format!("Invalid Slack API URL: {}", e)))
    }

    /// # Summary
    /// Sends a prepared request and decodes the JSON body.
    ///
    /// # Logic
    /// 1. Attaches the Bearer token.
    /// 2. Maps transport failures to `Network`, non-2xx statuses to `Platform`.
    /// 3. Decodes the body as `T`.
    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, NotifyError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Platform(format!(
                "Slack API HTTP {}: {}",
                status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| NotifyError::Platform(format!("Invalid Slack API response: {}", e)))
    }
}

/// Maps Slack's `{"ok": false, "error": ".."}` onto `NotifyError::Platform`.
fn check_ok(ok: bool, error: Option<String>) -> Result<(), NotifyError> {
    if ok {
        Ok(())
    } else {
        Err(NotifyError::Platform(
            error.unwrap_or_else(|| "unknown_error".to_string()),
        ))
    }
}

#[async_trait]
impl SlackClient for SlackApi {
    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), NotifyError> {
        let url = self.endpoint("chat.postMessage")?;
        let payload = json!({
            "channel": channel_id,
            "text": text,
        });

        let response: ApiResponse = self.call(self.client.post(url).json(&payload)).await?;
        check_ok(response.ok, response.error)
    }

    /// # Logic
    /// 1. Reserves an upload URL via `files.getUploadURLExternal`.
    /// 2. Uploads the raw bytes to that URL.
    /// 3. Shares the file into the channel via `files.completeUploadExternal`.
    async fn upload_file(
        &self,
        channel_id: &str,
        attachment: &Attachment,
    ) -> Result<(), NotifyError> {
        let mut url = self.endpoint("files.getUploadURLExternal")?;
        url.query_pairs_mut()
            .append_pair("filename", &attachment.name)
            .append_pair("length", &attachment.len().to_string());

        let reserved: UploadUrlResponse = self.call(self.client.post(url)).await?;
        check_ok(reserved.ok, reserved.error)?;
        let (upload_url, file_id) = match (reserved.upload_url, reserved.file_id) {
            (Some(upload_url), Some(file_id)) => (upload_url, file_id),
            _ => {
                return Err(NotifyError::Platform(
                    "Slack did not return an upload URL".to_string(),
                ));
            }
        };

        let mut upload = self.client.post(&upload_url).body(attachment.data.clone());
        if let Some(content_type) = &attachment.content_type {
            upload = upload.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        let uploaded = upload
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;
        if !uploaded.status().is_success() {
            return Err(NotifyError::Platform(format!(
                "Slack file upload HTTP {}",
                uploaded.status()
            )));
        }

        let complete = self.endpoint("files.completeUploadExternal")?;
        let payload = json!({
            "files": [{ "id": file_id, "title": attachment.name }],
            "channel_id": channel_id,
        });
        let response: ApiResponse = self.call(self.client.post(complete).json(&payload)).await?;
        check_ok(response.ok, response.error)
    }
}
