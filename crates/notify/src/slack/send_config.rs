use courier_core::notify::entity::{Attachment, Metadata};
use courier_core::notify::send::{self as notify_send, SendOption};
use std::any::Any;

/// # Summary
/// Per-call configuration of a Slack send.
///
/// # Invariants
/// - Built fresh for every `send` from the service defaults.
/// - `message` holds the rendered text once the renderer has run.
/// - Fields are public so custom renderers can adjust them; callers own any
///   synchronisation when doing so outside of `send`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendConfig {
    pub subject: String,
    pub message: String,
    pub attachments: Vec<Attachment>,
    pub metadata: Metadata,
    pub dry_run: bool,

    // Slack specific
    pub escape_message: bool,
}

impl notify_send::SendConfig for SendConfig {
    fn set_attachments(&mut self, attachments: Vec<Attachment>) {
        self.attachments = attachments;
    }

    fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Overrides whether `&`, `<` and `>` are escaped for this send only.
pub fn send_with_escape_message(escape_message: bool) -> SendOption {
    SendOption::typed(move |conf: &mut SendConfig| conf.escape_message = escape_message)
}
