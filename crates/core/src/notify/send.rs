use crate::notify::entity::{Attachment, Metadata};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// # Summary
/// 单次发送的配置契约，每个后端提供自己的具体实现。
///
/// # Invariants
/// - 所有实现都必须支持附件、元数据与 dry-run 三项通用能力。
/// - 后端扩展字段只能通过 `SendOption::typed` 访问。
/// - `as_any_mut` 必须返回 `self`，供安全向下转型使用。
pub trait SendConfig: Any + Send {
    /// 整体替换附件列表 (非追加)。
    fn set_attachments(&mut self, attachments: Vec<Attachment>);

    /// 整体替换元数据映射。
    fn set_metadata(&mut self, metadata: Metadata);

    /// 设置是否跳过实际传输。
    fn set_dry_run(&mut self, dry_run: bool);

    /// 以 `Any` 形式暴露自身。
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// # Summary
/// 作用于单次发送配置的变更闭包。
///
/// # Invariants
/// - 无状态、可廉价克隆，可在多个服务之间共享同一组选项。
/// - 作用于不匹配的后端配置时静默跳过，不产生错误。
#[derive(Clone)]
pub struct SendOption(Arc<dyn Fn(&mut dyn SendConfig) + Send + Sync>);

impl SendOption {
    /// # Summary
    /// 构造作用于通用能力集的选项。
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn SendConfig) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// # Summary
    /// 构造只作用于具体后端配置类型 `C` 的选项。
    ///
    /// # Logic
    /// 1. 通过 `as_any_mut` 尝试向下转型为 `C`。
    /// 2. 成功则调用 `f`；失败则不做任何修改。
    ///
    /// # Arguments
    /// * `f` - 对具体配置类型的变更函数。
    ///
    /// # Returns
    /// * 可应用于任意 `SendConfig` 的选项。
    pub fn typed<C, F>(f: F) -> Self
    where
        C: SendConfig,
        F: Fn(&mut C) + Send + Sync + 'static,
    {
        Self::new(move |conf| {
            if let Some(typed) = conf.as_any_mut().downcast_mut::<C>() {
                f(typed);
            }
        })
    }

    pub fn apply(&self, conf: &mut dyn SendConfig) {
        (self.0)(conf)
    }
}

impl fmt::Debug for SendOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SendOption(..)")
    }
}

/// # Summary
/// 按调用方给定的顺序依次应用选项，同一字段后写覆盖先写。
pub fn apply_send_options<C: SendConfig>(conf: &mut C, opts: &[SendOption]) {
    for opt in opts {
        opt.apply(conf);
    }
}

/// 替换本次发送的附件。
pub fn send_with_attachments(attachments: Vec<Attachment>) -> SendOption {
    SendOption::new(move |conf| conf.set_attachments(attachments.clone()))
}

/// 替换本次发送的元数据。
pub fn send_with_metadata(metadata: Metadata) -> SendOption {
    SendOption::new(move |conf| conf.set_metadata(metadata.clone()))
}

/// 覆盖本次发送的 dry-run 标志。
pub fn send_with_dry_run(dry_run: bool) -> SendOption {
    SendOption::new(move |conf| conf.set_dry_run(dry_run))
}
