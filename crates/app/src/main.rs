mod cli;
mod settings;
mod wiring;

use clap::Parser;
use courier_core::notify::entity::Attachment;
use courier_core::notify::log::Logger;
use courier_core::notify::send::{send_with_attachments, send_with_dry_run};
use courier_notify::ntfy;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// # Summary
/// 应用入口：读取配置、装配服务并发送一条通知。
///
/// # Logic
/// 1. 加载 .env 并初始化全局日志。
/// 2. 解析命令行与配置文件。
/// 3. 构造调度器并注入当前日志出口。
/// 4. 将命令行参数转换为发送选项后发送。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 初始化日志
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. 读取配置
    let cli = cli::Cli::parse();
    let config = settings::load(cli.config.as_deref())?;

    // 3. 装配服务
    let dispatcher = wiring::build_dispatcher(&config, &Logger::current())?;
    if dispatcher.is_empty() {
        warn!("No notification service configured, nothing will be sent");
    }

    // 4. 组装发送选项
    let mut opts = Vec::new();
    if cli.dry_run {
        opts.push(send_with_dry_run(true));
    }
    if !cli.tags.is_empty() {
        opts.push(ntfy::send_with_tags(cli.tags.clone()));
    }
    if let Some(priority) = cli.priority {
        opts.push(ntfy::send_with_priority(priority));
    }
    if !cli.attachments.is_empty() {
        let attachments = cli
            .attachments
            .iter()
            .map(Attachment::from_path)
            .collect::<Result<Vec<_>, _>>()?;
        opts.push(send_with_attachments(attachments));
    }

    dispatcher.send(&cli.subject, &cli.message, &opts).await?;
    info!(services = ?dispatcher.service_names(), "Notification dispatched");

    Ok(())
}
