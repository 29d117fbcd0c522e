use tracing::Dispatch;

/// # Summary
/// 注入到服务中的结构化日志出口。
///
/// # Invariants
/// - 默认丢弃所有事件，不依赖全局单例。
/// - 仅在 `scope` 闭包内生效，不会跨越 `.await`。
#[derive(Debug, Clone)]
pub struct Logger(Dispatch);

impl Logger {
    /// 丢弃所有事件的日志出口。
    pub fn discard() -> Self {
        Self(Dispatch::none())
    }

    /// 捕获调用线程当前生效的 subscriber。
    pub fn current() -> Self {
        Self(tracing::dispatcher::get_default(|d| d.clone()))
    }

    pub fn from_dispatch(dispatch: Dispatch) -> Self {
        Self(dispatch)
    }

    /// # Summary
    /// 以本出口为默认 subscriber 执行 `f`，`f` 内的 `tracing` 事件写入本出口。
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.0, f)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::discard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    struct CountingLayer(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for CountingLayer {
        fn on_event(&self, _event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_scope_routes_events_to_injected_dispatch() {
        let counter = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(CountingLayer(counter.clone()));
        let logger = Logger::from_dispatch(Dispatch::new(subscriber));

        logger.scope(|| tracing::info!(count = 1, "Recipients added"));
        Logger::discard().scope(|| tracing::info!("dropped"));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
