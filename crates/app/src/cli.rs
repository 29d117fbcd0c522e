use clap::Parser;
use courier_notify::ntfy::Priority;
use std::path::PathBuf;

/// 向所有已配置的通知后端发送一条消息
#[derive(Debug, Parser)]
#[command(name = "courier", version, about)]
pub struct Cli {
    /// 配置文件路径 (默认读取当前目录下可选的 courier.toml)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// 通知标题
    #[arg(long, short)]
    pub subject: String,

    /// 通知正文
    #[arg(long, short)]
    pub message: String,

    /// 只渲染并记录日志，不实际发送
    #[arg(long)]
    pub dry_run: bool,

    /// ntfy 标签，可重复
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// ntfy 优先级 (min/low/default/high/max 或 1-5)
    #[arg(long)]
    pub priority: Option<Priority>,

    /// 附件文件，可重复
    #[arg(long = "attach")]
    pub attachments: Vec<PathBuf>,
}
