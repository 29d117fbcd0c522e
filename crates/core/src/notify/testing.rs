use crate::notify::entity::{Attachment, Metadata};
use crate::notify::error::NotifyError;
use crate::notify::port::Service;
use crate::notify::send::{SendConfig, SendOption, apply_send_options};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::any::Any;

/// # Summary
/// 测试用发送配置，仅包含通用能力集。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedSend {
    pub subject: String,
    pub message: String,
    pub attachments: Vec<Attachment>,
    pub metadata: Metadata,
    pub dry_run: bool,
}

impl SendConfig for RecordedSend {
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

/// # Summary
/// 记录每次调用的 `Service` 实现，可配置为固定失败。
pub struct RecordingService {
    name: String,
    fail_with: Option<String>,
    sent: Mutex<Vec<RecordedSend>>,
}

impl RecordingService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_with: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// 每次发送都返回 `NotifyError::Platform(reason)`。
    pub fn failing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::new(name)
        }
    }

    pub fn sent(&self) -> Vec<RecordedSend> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Service for RecordingService {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn send(
        &self,
        subject: &str,
        message: &str,
        opts: &[SendOption],
    ) -> Result<(), NotifyError> {
        let mut conf = RecordedSend {
            subject: subject.to_string(),
            message: message.to_string(),
            ..RecordedSend::default()
        };
        apply_send_options(&mut conf, opts);
        self.sent.lock().push(conf);

        match &self.fail_with {
            Some(reason) => Err(NotifyError::Platform(reason.clone())),
            None => Ok(()),
        }
    }
}
