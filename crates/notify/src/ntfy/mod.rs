//! ntfy backend: publishes messages to ntfy topics over HTTP.

mod client;
mod entity;
mod send_config;

pub use client::{NtfyClient, NtfyHttp, Publish, is_valid_topic, parse_server_url, topic_url};
pub use courier_core::config::DEFAULT_NTFY_SERVER;
pub use entity::{ParseMode, Priority};
pub use send_config::{
    SendConfig, send_with_click_action, send_with_delay, send_with_parse_mode,
    send_with_priority, send_with_tags,
};

use async_trait::async_trait;
use courier_core::notify::error::{DeliveryFailure, NotifyError};
use courier_core::notify::log::Logger;
use courier_core::notify::port::Service;
use courier_core::notify::send::{SendOption, apply_send_options};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Renders the final message body from a send configuration.
pub type MessageRenderer = Arc<dyn Fn(&SendConfig) -> String + Send + Sync>;

// The subject travels separately as the ntfy title.
fn default_message_renderer(conf: &SendConfig) -> String {
    conf.message.clone()
}

struct State {
    // None until `new` has applied the options
    client: Option<Arc<dyn NtfyClient>>,
    server_url: String,
    token: Option<String>,
    name: String,
    logger: Logger,
    render_message: MessageRenderer,
    dry_run: bool,
    topics: Vec<String>,

    // defaults copied into every SendConfig
    parse_mode: ParseMode,
    priority: Priority,
    tags: Vec<String>,
    delay: String,
    click_action: String,
}

struct Snapshot {
    client: Arc<dyn NtfyClient>,
    logger: Logger,
    render_message: MessageRenderer,
    topics: Vec<String>,
    defaults: SendConfig,
}

/// # Summary
/// Construction-time option of an `NtfyService`.
///
/// # Invariants
/// * Applied exactly once, inside the service's write lock, together with
///   the other options of the same batch.
pub struct NtfyOption(Box<dyn FnOnce(&mut State) + Send>);

/// Replaces the HTTP client, e.g. with a fake in tests.
pub fn with_client(client: impl NtfyClient + 'static) -> NtfyOption {
    let client: Arc<dyn NtfyClient> = Arc::new(client);
    NtfyOption(Box::new(move |s| s.client = Some(client)))
}

/// Targets a self-hosted server instead of `https://ntfy.sh`.
pub fn with_server_url(server_url: impl Into<String>) -> NtfyOption {
    let server_url = server_url.into();
    NtfyOption(Box::new(move |s| s.server_url = server_url))
}

/// Access token sent as `Authorization: Bearer` on every request.
pub fn with_token(token: impl Into<String>) -> NtfyOption {
    let token = token.into();
    NtfyOption(Box::new(move |s| s.token = Some(token)))
}

pub fn with_name(name: impl Into<String>) -> NtfyOption {
    let name = name.into();
    NtfyOption(Box::new(move |s| s.name = name))
}

pub fn with_logger(logger: Logger) -> NtfyOption {
    NtfyOption(Box::new(move |s| s.logger = logger))
}

pub fn with_message_renderer<F>(renderer: F) -> NtfyOption
where
    F: Fn(&SendConfig) -> String + Send + Sync + 'static,
{
    let renderer: MessageRenderer = Arc::new(renderer);
    NtfyOption(Box::new(move |s| s.render_message = renderer))
}

pub fn with_dry_run(dry_run: bool) -> NtfyOption {
    NtfyOption(Box::new(move |s| s.dry_run = dry_run))
}

pub fn with_parse_mode(parse_mode: ParseMode) -> NtfyOption {
    NtfyOption(Box::new(move |s| s.parse_mode = parse_mode))
}

pub fn with_priority(priority: Priority) -> NtfyOption {
    NtfyOption(Box::new(move |s| s.priority = priority))
}

pub fn with_tags<I, S>(tags: I) -> NtfyOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
    NtfyOption(Box::new(move |s| s.tags = tags))
}

pub fn with_delay(delay: impl Into<String>) -> NtfyOption {
    let delay = delay.into();
    NtfyOption(Box::new(move |s| s.delay = delay))
}

pub fn with_click_action(click_action: impl Into<String>) -> NtfyOption {
    let click_action = click_action.into();
    NtfyOption(Box::new(move |s| s.click_action = click_action))
}

/// # Summary
/// A notification service that publishes to ntfy topics.
///
/// # Invariants
/// * Owns exactly one `NtfyClient`.
/// * The server URL was validated at construction.
/// * All mutable state sits behind one `RwLock`; `send` only holds it while
///   copying a snapshot.
pub struct NtfyService {
    state: RwLock<State>,
}

impl NtfyService {
    /// # Summary
    /// Creates an ntfy service.
    ///
    /// # Logic
    /// 1. Applies `opts` as one batch under the write lock.
    /// 2. Validates the server URL.
    /// 3. Builds the HTTP client unless `with_client` supplied one.
    ///
    /// # Returns
    /// * `Err(NotifyError::Config)` when the server URL is not an http(s) URL.
    pub fn new(opts: Vec<NtfyOption>) -> Result<Self, NotifyError> {
        let service = Self {
            state: RwLock::new(State {
                client: None,
                server_url: DEFAULT_NTFY_SERVER.to_string(),
                token: None,
                name: "ntfy".to_string(),
                logger: Logger::discard(),
                render_message: Arc::new(default_message_renderer),
                dry_run: false,
                topics: Vec::new(),
                parse_mode: ParseMode::default(),
                priority: Priority::default(),
                tags: Vec::new(),
                delay: String::new(),
                click_action: String::new(),
            }),
        };

        service.apply_options(opts);

        {
            let mut state = service.state.write();
            parse_server_url(&state.server_url)?;
            if state.client.is_none() {
                let http: Arc<dyn NtfyClient> =
                    Arc::new(NtfyHttp::new(&state.server_url, state.token.clone())?);
                state.client = Some(http);
            }
        }

        Ok(service)
    }

    fn apply_options(&self, opts: Vec<NtfyOption>) {
        let mut state = self.state.write();
        for opt in opts {
            (opt.0)(&mut state);
        }
    }

    /// # Summary
    /// Appends topics to the recipient list used by `send`.
    ///
    /// # Invariants
    /// * Order is kept and duplicates accumulate.
    pub fn add_recipients<I, S>(&self, topics: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.write();
        let before = state.topics.len();
        state.topics.extend(topics.into_iter().map(Into::into));
        let total = state.topics.len();
        state
            .logger
            .scope(|| info!(count = total - before, total, "Recipients added"));
    }

    pub fn recipients(&self) -> Vec<String> {
        self.state.read().topics.clone()
    }

    pub fn server_url(&self) -> String {
        self.state.read().server_url.clone()
    }

    pub fn is_dry_run(&self) -> bool {
        self.state.read().dry_run
    }

    fn snapshot(&self, subject: &str, message: &str) -> Result<Snapshot, NotifyError> {
        let state = self.state.read();
        let client = state
            .client
            .clone()
            .ok_or_else(|| NotifyError::Config("ntfy client is not initialised".to_string()))?;

        Ok(Snapshot {
            client,
            logger: state.logger.clone(),
            render_message: state.render_message.clone(),
            topics: state.topics.clone(),
            defaults: SendConfig {
                subject: subject.to_string(),
                message: message.to_string(),
                dry_run: state.dry_run,
                parse_mode: state.parse_mode,
                priority: state.priority,
                tags: state.tags.clone(),
                delay: state.delay.clone(),
                click_action: state.click_action.clone(),
                ..SendConfig::default()
            },
        })
    }
}

/// Publishes the message, then each attachment, on one topic.
async fn deliver(client: &dyn NtfyClient, topic: &str, conf: &SendConfig) -> Result<(), NotifyError> {
    client.publish(&Publish::new(topic, conf)).await?;
    for attachment in &conf.attachments {
        client.upload(topic, attachment).await?;
    }
    Ok(())
}

#[async_trait]
impl Service for NtfyService {
    fn name(&self) -> String {
        self.state.read().name.clone()
    }

    /// # Logic
    /// 1. Copies client, renderer, topics and defaults out of the lock.
    /// 2. Applies `opts` in order, then renders into `conf.message`.
    /// 3. On dry run, logs and returns without touching the client.
    /// 4. Publishes to every topic of the snapshot, collecting failures.
    async fn send(
        &self,
        subject: &str,
        message: &str,
        opts: &[SendOption],
    ) -> Result<(), NotifyError> {
        let Snapshot {
            client,
            logger,
            render_message,
            topics,
            defaults: mut conf,
        } = self.snapshot(subject, message)?;

        apply_send_options(&mut conf, opts);
        conf.message = render_message(&conf);

        if conf.dry_run {
            logger.scope(|| {
                info!(
                    recipients = topics.len(),
                    priority = conf.priority.as_u8(),
                    message = %conf.message,
                    "Dry run enabled, message not sent"
                )
            });
            return Ok(());
        }

        let mut failures = Vec::new();
        for topic in &topics {
            match deliver(client.as_ref(), topic, &conf).await {
                Ok(()) => logger.scope(|| info!(recipient = %topic, "Message sent")),
                Err(e) => {
                    logger.scope(|| warn!(recipient = %topic, error = %e, "ntfy delivery failed"));
                    failures.push(DeliveryFailure::new(topic.as_str(), &e));
                }
            }
        }

        NotifyError::from_failures(failures)
    }
}
