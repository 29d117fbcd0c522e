use super::entity::ParseMode;
use super::send_config::SendConfig;
use async_trait::async_trait;
use courier_core::notify::entity::Attachment;
use courier_core::notify::error::NotifyError;
use reqwest::Url;
use serde::Serialize;

/// # Summary
/// JSON body of an ntfy publish request.
///
/// # Invariants
/// - Empty optional fields are left out of the payload.
/// - `priority` is always within 1..=5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publish {
    pub topic: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub message: String,
    pub priority: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub delay: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub click: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub markdown: bool,
}

impl Publish {
    /// # Summary
    /// Builds the publish body for `topic` from a rendered send configuration.
    pub fn new(topic: &str, conf: &SendConfig) -> Self {
        Self {
            topic: topic.to_string(),
            title: conf.subject.clone(),
            message: conf.message.clone(),
            priority: conf.priority.as_u8(),
            tags: conf.tags.clone(),
            delay: conf.delay.clone(),
            click: conf.click_action.clone(),
            markdown: conf.parse_mode == ParseMode::Markdown,
        }
    }
}

/// # Summary
/// Transport used by the ntfy service. The service owns exactly one.
#[async_trait]
pub trait NtfyClient: Send + Sync {
    /// Publishes one message.
    async fn publish(&self, message: &Publish) -> Result<(), NotifyError>;

    /// Publishes `attachment` as a file message on `topic`.
    async fn upload(&self, topic: &str, attachment: &Attachment) -> Result<(), NotifyError>;
}

/// # Summary
/// Parses and checks an ntfy server URL.
///
/// # Logic
/// 1. Parses the string as an absolute URL.
/// 2. Rejects schemes other than http and https.
/// 3. Ensures the path ends with `/` so topics join below it.
pub fn parse_server_url(server_url: &str) -> Result<Url, NotifyError> {
    let mut url = Url::parse(server_url)
        .map_err(|e| NotifyError::Config(format!("Invalid ntfy server URL {}: {}", server_url, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(NotifyError::Config(format!(
            "ntfy server URL must use http or https, got {}",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// # Summary
/// Whether `topic` is a name ntfy accepts: 1 to 64 characters of `[-_A-Za-z0-9]`.
pub fn is_valid_topic(topic: &str) -> bool {
    !topic.is_empty()
        && topic.len() <= 64
        && topic
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// # Summary
/// Resolves the publish URL of `topic` as a single path segment below `base`.
///
/// # Logic
/// 1. Rejects topics that are not valid ntfy names.
/// 2. Drops the trailing empty segment of `base` and pushes the topic.
pub fn topic_url(base: &Url, topic: &str) -> Result<Url, NotifyError> {
    if !is_valid_topic(topic) {
        return Err(NotifyError::Config(format!("Invalid ntfy topic {:?}", topic)));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| NotifyError::Config(format!("ntfy server URL {} has no path", base)))?
        .pop_if_empty()
        .push(topic);
    Ok(url)
}

/// # Summary
/// An `NtfyClient` speaking ntfy's HTTP publish API.
///
/// # Invariants
/// * `server_url` passed `parse_server_url`.
pub struct NtfyHttp {
    server_url: Url,
    token: Option<String>,
    client: reqwest::Client,
}

impl NtfyHttp {
    pub fn new(server_url: &str, token: Option<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            server_url: parse_server_url(server_url)?,
            token,
            client: crate::http_client(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<(), NotifyError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Platform(format!(
                "ntfy HTTP {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl NtfyClient for NtfyHttp {
    async fn publish(&self, message: &Publish) -> Result<(), NotifyError> {
        if !is_valid_topic(&message.topic) {
            return Err(NotifyError::Config(format!(
                "Invalid ntfy topic {:?}",
                message.topic
            )));
        }
        let request = self.client.post(self.server_url.clone()).json(message);
        self.execute(request).await
    }

    async fn upload(&self, topic: &str, attachment: &Attachment) -> Result<(), NotifyError> {
        let url = topic_url(&self.server_url, topic)?;

        let request = self
            .client
            .put(url)
            .header("Filename", &attachment.name)
            .body(attachment.data.clone());
        self.execute(request).await
    }
}
