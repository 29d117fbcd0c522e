use std::fmt;
use thiserror::Error;

/// # Summary
/// 通知服务错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - `Delivery` 至少包含一条失败记录。
#[derive(Error, Debug)]
pub enum NotifyError {
    /// 网络连接或传输错误
    #[error("Network error: {0}")]
    Network(String),

    /// 配置错误 (如非法的服务器地址)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 推送平台返回的错误 (如 Slack API `ok: false`)
    #[error("Platform error: {0}")]
    Platform(String),

    /// 部分或全部接收方投递失败，其余接收方已照常尝试
    #[error("Delivery failed for {} target(s): {}", .0.len(), FailureList(.0))]
    Delivery(Vec<DeliveryFailure>),
}

/// # Summary
/// 单个投递目标的失败记录。
///
/// # Invariants
/// - `target` 为接收方标识 (频道 ID、topic) 或服务名称。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub target: String,
    pub reason: String,
}

impl DeliveryFailure {
    pub fn new(target: impl Into<String>, error: &NotifyError) -> Self {
        Self {
            target: target.into(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.reason)
    }
}

struct FailureList<'a>(&'a [DeliveryFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl NotifyError {
    /// # Summary
    /// 将收集到的失败记录折叠为单个结果。
    ///
    /// # Returns
    /// * 无失败时返回 `Ok(())`，否则返回 `NotifyError::Delivery`。
    pub fn from_failures(failures: Vec<DeliveryFailure>) -> Result<(), NotifyError> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Delivery(failures))
        }
    }

    /// # Summary
    /// 返回投递失败的目标列表，非 `Delivery` 错误返回空切片。
    pub fn failures(&self) -> &[DeliveryFailure] {
        match self {
            NotifyError::Delivery(failures) => failures,
            _ => &[],
        }
    }
}
