use crate::notify::error::{DeliveryFailure, NotifyError};
use crate::notify::log::Logger;
use crate::notify::port::Service;
use crate::notify::send::SendOption;
use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// # Summary
/// 多后端扇出调度器，将一次发送分发到所有已注册服务。
///
/// # Invariants
/// - 服务列表受读写锁保护，发送前只在锁内复制快照。
/// - 各服务并发执行，任一服务失败不影响其余服务。
/// - 同一组 `SendOption` 作用于每个服务各自的配置，类型不匹配的选项被跳过。
pub struct Dispatcher {
    // 已注册的服务
    services: RwLock<Vec<Arc<dyn Service>>>,
    // 日志出口
    logger: Logger,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            services: RwLock::new(Vec::new()),
            logger: Logger::discard(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// # Summary
    /// 注册一组服务，重复注册会导致重复发送。
    pub fn use_services<I>(&self, services: I)
    where
        I: IntoIterator<Item = Arc<dyn Service>>,
    {
        let mut guard = self.services.write();
        let before = guard.len();
        guard.extend(services);
        let total = guard.len();
        self.logger
            .scope(|| info!(count = total - before, total, "Services registered"));
    }

    /// 当前已注册服务的名称快照。
    pub fn service_names(&self) -> Vec<String> {
        self.services.read().iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// # Summary
    /// 并发地向所有已注册服务发送消息。
    ///
    /// # Logic
    /// 1. 在读锁内复制服务列表后立即释放锁。
    /// 2. 通过 `join_all` 并发调用每个服务的 `send`。
    /// 3. 汇总失败：服务返回的 `Delivery` 错误按 "服务名:接收方" 展开，其余错误以服务名为目标。
    ///
    /// # Returns
    /// * 全部成功 (或没有服务) 返回 `Ok(())`，否则返回 `NotifyError::Delivery`。
    pub async fn send(
        &self,
        subject: &str,
        message: &str,
        opts: &[SendOption],
    ) -> Result<(), NotifyError> {
        let services: Vec<Arc<dyn Service>> = self.services.read().clone();

        let results = join_all(services.iter().map(|service| async move {
            (service.name(), service.send(subject, message, opts).await)
        }))
        .await;

        let mut failures = Vec::new();
        for (name, result) in results {
            match result {
                Ok(()) => {}
                Err(NotifyError::Delivery(inner)) => {
                    failures.extend(inner.into_iter().map(|f| DeliveryFailure {
                        target: format!("{name}:{}", f.target),
                        reason: f.reason,
                    }));
                }
                Err(e) => failures.push(DeliveryFailure::new(name, &e)),
            }
        }

        if !failures.is_empty() {
            self.logger.scope(|| {
                warn!(
                    services = services.len(),
                    failed = failures.len(),
                    "Dispatch finished with failures"
                )
            });
        }

        NotifyError::from_failures(failures)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Service for Dispatcher {
    fn name(&self) -> String {
        "dispatcher".to_string()
    }

    async fn send(
        &self,
        subject: &str,
        message: &str,
        opts: &[SendOption],
    ) -> Result<(), NotifyError> {
        Dispatcher::send(self, subject, message, opts).await
    }
}
