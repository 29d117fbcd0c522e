use courier_core::config::AppConfig;
use courier_core::notify::dispatcher::Dispatcher;
use courier_core::notify::error::NotifyError;
use courier_core::notify::log::Logger;
use courier_core::notify::port::Service;
use courier_notify::ntfy::{self, NtfyService, ParseMode, Priority};
use courier_notify::slack::{self, SlackService};
use std::sync::Arc;

/// # Summary
/// 按配置实例化各后端服务并注册到调度器。
///
/// # Logic
/// 1. 为每个存在的配置段构造对应服务，注入同一个日志出口。
/// 2. 追加配置中的接收方。
/// 3. 一次性注册到 `Dispatcher`。
///
/// # Returns
/// * 配置非法 (如 ntfy 服务器地址、优先级越界) 时返回 `NotifyError::Config`。
pub fn build_dispatcher(config: &AppConfig, logger: &Logger) -> Result<Dispatcher, NotifyError> {
    let mut services: Vec<Arc<dyn Service>> = Vec::new();

    if let Some(section) = &config.slack {
        let service = SlackService::new(
            &section.token,
            vec![
                slack::with_logger(logger.clone()),
                slack::with_dry_run(config.dry_run),
                slack::with_escape_message(section.escape_message),
            ],
        )?;
        service.add_recipients(section.channels.iter().cloned());
        services.push(Arc::new(service));
    }

    if let Some(section) = &config.ntfy {
        let parse_mode = if section.markdown {
            ParseMode::Markdown
        } else {
            ParseMode::Text
        };
        let mut opts = vec![
            ntfy::with_server_url(section.server_url.clone()),
            ntfy::with_logger(logger.clone()),
            ntfy::with_dry_run(config.dry_run),
            ntfy::with_parse_mode(parse_mode),
            ntfy::with_tags(section.tags.clone()),
        ];
        if let Some(token) = &section.token {
            opts.push(ntfy::with_token(token.clone()));
        }
        if let Some(priority) = section.priority {
            opts.push(ntfy::with_priority(Priority::try_from(priority)?));
        }

        let service = NtfyService::new(opts)?;
        service.add_recipients(section.topics.iter().cloned());
        services.push(Arc::new(service));
    }

    let dispatcher = Dispatcher::new().with_logger(logger.clone());
    dispatcher.use_services(services);
    Ok(dispatcher)
}
