//! Slack backend: posts rendered messages into channels via the Web API.

mod client;
mod send_config;

pub use client::{DEFAULT_API_URL, SlackApi, SlackClient};
pub use send_config::{SendConfig, send_with_escape_message};

use async_trait::async_trait;
use courier_core::notify::entity::Attachment;
use courier_core::notify::error::{DeliveryFailure, NotifyError};
use courier_core::notify::log::Logger;
use courier_core::notify::port::Service;
use courier_core::notify::send::{SendOption, apply_send_options};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Renders the final Slack text from a send configuration.
pub type MessageRenderer = Arc<dyn Fn(&SendConfig) -> String + Send + Sync>;

/// Subject, blank line, body.
fn default_message_renderer(conf: &SendConfig) -> String {
    let mut text = String::with_capacity(conf.subject.len() + conf.message.len() + 2);
    text.push_str(&conf.subject);
    text.push_str("\n\n");
    text.push_str(&conf.message);
    text
}

/// Escapes the three characters Slack treats as control sequences.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Mutable state of a `SlackService`, guarded by a single lock.
struct State {
    client: Arc<dyn SlackClient>,
    name: String,
    logger: Logger,
    render_message: MessageRenderer,
    dry_run: bool,
    channel_ids: Vec<String>,
    escape_message: bool,
}

/// Everything `send` needs, copied out of the lock before any I/O.
struct Snapshot {
    client: Arc<dyn SlackClient>,
    logger: Logger,
    render_message: MessageRenderer,
    channel_ids: Vec<String>,
    defaults: SendConfig,
}

/// # Summary
/// Construction-time option of a `SlackService`.
///
/// # Invariants
/// * Applied exactly once, inside the service's write lock, together with
///   the other options of the same batch.
pub struct SlackOption(Box<dyn FnOnce(&mut State) + Send>);

/// Replaces the default Web API client, e.g. with a fake in tests.
pub fn with_client(client: impl SlackClient + 'static) -> SlackOption {
    let client: Arc<dyn SlackClient> = Arc::new(client);
    SlackOption(Box::new(move |s| s.client = client))
}

/// Overrides the name reported by `Service::name`.
pub fn with_name(name: impl Into<String>) -> SlackOption {
    let name = name.into();
    SlackOption(Box::new(move |s| s.name = name))
}

pub fn with_logger(logger: Logger) -> SlackOption {
    SlackOption(Box::new(move |s| s.logger = logger))
}

/// Replaces the subject + body renderer.
pub fn with_message_renderer<F>(renderer: F) -> SlackOption
where
    F: Fn(&SendConfig) -> String + Send + Sync + 'static,
{
    let renderer: MessageRenderer = Arc::new(renderer);
    SlackOption(Box::new(move |s| s.render_message = renderer))
}

/// Default dry-run flag for every send; a send option can still override it.
pub fn with_dry_run(dry_run: bool) -> SlackOption {
    SlackOption(Box::new(move |s| s.dry_run = dry_run))
}

/// Default escape flag for every send; see `send_with_escape_message`.
pub fn with_escape_message(escape_message: bool) -> SlackOption {
    SlackOption(Box::new(move |s| s.escape_message = escape_message))
}

/// # Summary
/// A notification service that posts messages into Slack channels.
///
/// # Invariants
/// * Owns exactly one `SlackClient`.
/// * All mutable state sits behind one `RwLock`; `send` only holds it while
///   copying a snapshot.
/// * Recipients are never deduplicated.
pub struct SlackService {
    state: RwLock<State>,
}

impl SlackService {
    /// # Summary
    /// Creates a Slack service bound to `token`.
    ///
    /// # Logic
    /// 1. Builds the default Web API client for `token`.
    /// 2. Applies the defaults (renderer, discard logger, dry-run off).
    /// 3. Applies `opts` as one batch under the write lock.
    ///
    /// # Arguments
    /// * `token` - The Slack OAuth token. Not validated here.
    /// * `opts` - Construction options.
    ///
    /// # Returns
    /// * Always `Ok`; the `Result` keeps the constructor shape of the other
    ///   backends, some of which validate their input.
    pub fn new(token: &str, opts: Vec<SlackOption>) -> Result<Self, NotifyError> {
        let service = Self {
            state: RwLock::new(State {
                client: Arc::new(SlackApi::new(token)),
                name: "slack".to_string(),
                logger: Logger::discard(),
                render_message: Arc::new(default_message_renderer),
                dry_run: false,
                channel_ids: Vec::new(),
                escape_message: false,
            }),
        };

        service.apply_options(opts);

        Ok(service)
    }

    fn apply_options(&self, opts: Vec<SlackOption>) {
        let mut state = self.state.write();
        for opt in opts {
            (opt.0)(&mut state);
        }
    }

    /// # Summary
    /// Appends channel IDs to the recipient list used by `send`.
    ///
    /// # Invariants
    /// * Order is kept and duplicates accumulate.
    pub fn add_recipients<I, S>(&self, channel_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.write();
        let before = state.channel_ids.len();
        state
            .channel_ids
            .extend(channel_ids.into_iter().map(Into::into));
        let total = state.channel_ids.len();
        state
            .logger
            .scope(|| info!(count = total - before, total, "Recipients added"));
    }

    /// Snapshot of the current recipient list.
    pub fn recipients(&self) -> Vec<String> {
        self.state.read().channel_ids.clone()
    }

    pub fn is_dry_run(&self) -> bool {
        self.state.read().dry_run
    }

    fn snapshot(&self, subject: &str, message: &str) -> Snapshot {
        let state = self.state.read();
        Snapshot {
            client: state.client.clone(),
            logger: state.logger.clone(),
            render_message: state.render_message.clone(),
            channel_ids: state.channel_ids.clone(),
            defaults: SendConfig {
                subject: subject.to_string(),
                message: message.to_string(),
                dry_run: state.dry_run,
                escape_message: state.escape_message,
                ..SendConfig::default()
            },
        }
    }
}

/// Posts the text, then shares each attachment, into one channel.
async fn deliver(
    client: &dyn SlackClient,
    channel_id: &str,
    text: &str,
    attachments: &[Attachment],
) -> Result<(), NotifyError> {
    client.post_message(channel_id, text).await?;
    for attachment in attachments {
        client.upload_file(channel_id, attachment).await?;
    }
    Ok(())
}

#[async_trait]
impl Service for SlackService {
    fn name(&self) -> String {
        self.state.read().name.clone()
    }

    /// # Logic
    /// 1. Copies client, renderer, recipients and defaults out of the lock.
    /// 2. Applies `opts` in order, then renders into `conf.message`.
    /// 3. On dry run, logs and returns without touching the client.
    /// 4. Delivers to every channel of the snapshot, collecting failures.
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
            channel_ids,
            defaults: mut conf,
        } = self.snapshot(subject, message);

        apply_send_options(&mut conf, opts);
        conf.message = render_message(&conf);

        if conf.dry_run {
            logger.scope(|| {
                info!(
                    recipients = channel_ids.len(),
                    message = %conf.message,
                    "Dry run enabled, message not sent"
                )
            });
            return Ok(());
        }

        let text = if conf.escape_message {
            escape_text(&conf.message)
        } else {
            conf.message.clone()
        };

        let mut failures = Vec::new();
        for channel_id in &channel_ids {
            match deliver(client.as_ref(), channel_id, &text, &conf.attachments).await {
                Ok(()) => logger.scope(|| info!(recipient = %channel_id, "Message sent")),
                Err(e) => {
                    logger.scope(|| warn!(recipient = %channel_id, error = %e, "Slack delivery failed"));
                    failures.push(DeliveryFailure::new(channel_id.as_str(), &e));
                }
            }
        }

        NotifyError::from_failures(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_renderer() {
        let conf = SendConfig {
            subject: "Deploy".into(),
            message: "v1.2.3 is live".into(),
            ..SendConfig::default()
        };
        assert_eq!(default_message_renderer(&conf), "Deploy\n\nv1.2.3 is live");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_text("&lt;"), "&amp;lt;");
    }
}
