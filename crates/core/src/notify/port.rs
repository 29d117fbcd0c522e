use crate::notify::error::NotifyError;
use crate::notify::send::SendOption;
use async_trait::async_trait;

/// # Summary
/// 通知后端的统一调用接口 (Port)。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持并发调用。
/// - 单个接收方失败不得中断其余接收方的投递。
/// - 取消由调用方丢弃 Future 完成，服务本身不持有取消令牌。
#[async_trait]
pub trait Service: Send + Sync {
    /// # Summary
    /// 返回服务名称，用于多后端扇出时区分来源。
    fn name(&self) -> String;

    /// # Summary
    /// 向当前所有接收方发送一条消息。
    ///
    /// # Logic
    /// 1. 由服务默认值构造本次发送的 `SendConfig`。
    /// 2. 按顺序应用 `opts`。
    /// 3. 渲染消息；若为 dry-run 则只记录日志。
    /// 4. 对接收方快照逐一调用后端客户端。
    ///
    /// # Arguments
    /// * `subject` - 通知标题或主题。
    /// * `message` - 通知的具体内容。
    /// * `opts` - 本次发送的定制选项。
    ///
    /// # Returns
    /// * 成功返回 `Ok(())`。
    /// * 任一接收方失败返回 `NotifyError::Delivery`。
    async fn send(
        &self,
        subject: &str,
        message: &str,
        opts: &[SendOption],
    ) -> Result<(), NotifyError>;
}
