use super::entity::{ParseMode, Priority};
use courier_core::notify::entity::{Attachment, Metadata};
use courier_core::notify::send::{self as notify_send, SendOption};
use std::any::Any;

/// # Summary
/// Per-call configuration of an ntfy send.
///
/// # Invariants
/// - Built fresh for every `send` from the service defaults, then mutated by
///   the send options in caller order.
/// - Fields are public so custom renderers can adjust them; callers own any
///   synchronisation when doing so outside of `send`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendConfig {
    pub subject: String,
    pub message: String,
    pub attachments: Vec<Attachment>,
    pub metadata: Metadata,
    pub dry_run: bool,

    // ntfy specific
    pub parse_mode: ParseMode,
    pub priority: Priority,
    pub tags: Vec<String>,
    /// ntfy delay syntax, e.g. `30m`, `tomorrow, 10am`.
    pub delay: String,
    /// URL opened when the notification is tapped.
    pub click_action: String,
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

pub fn send_with_priority(priority: Priority) -> SendOption {
    SendOption::typed(move |conf: &mut SendConfig| conf.priority = priority)
}

pub fn send_with_parse_mode(parse_mode: ParseMode) -> SendOption {
    SendOption::typed(move |conf: &mut SendConfig| conf.parse_mode = parse_mode)
}

/// Replaces the tag list; tags given by earlier options are dropped.
pub fn send_with_tags<I, S>(tags: I) -> SendOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
    SendOption::typed(move |conf: &mut SendConfig| conf.tags = tags.clone())
}

pub fn send_with_delay(delay: impl Into<String>) -> SendOption {
    let delay = delay.into();
    SendOption::typed(move |conf: &mut SendConfig| conf.delay = delay.clone())
}

pub fn send_with_click_action(click_action: impl Into<String>) -> SendOption {
    let click_action = click_action.into();
    SendOption::typed(move |conf: &mut SendConfig| conf.click_action = click_action.clone())
}
