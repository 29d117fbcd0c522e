use serde::{Deserialize, Serialize};

/// ntfy 官方公共服务器
pub const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 为所有服务开启 dry-run
    #[serde(default)]
    pub dry_run: bool,
    pub slack: Option<SlackSection>,
    pub ntfy: Option<NtfySection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackSection {
    pub token: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub escape_message: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NtfySection {
    #[serde(default = "default_ntfy_server")]
    pub server_url: String,
    pub token: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    // 1 (min) ~ 5 (max)
    pub priority: Option<u8>,
    #[serde(default)]
    pub markdown: bool,
}

fn default_ntfy_server() -> String {
    DEFAULT_NTFY_SERVER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(!config.dry_run);
        assert!(config.slack.is_none());
        assert!(config.ntfy.is_none());
    }

    #[test]
    fn test_ntfy_section_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "ntfy": { "topics": ["alerts"] }
        }))
        .unwrap();
        let ntfy = config.ntfy.unwrap();
        assert_eq!(ntfy.server_url, DEFAULT_NTFY_SERVER);
        assert_eq!(ntfy.topics, vec!["alerts".to_string()]);
        assert!(ntfy.token.is_none());
        assert!(!ntfy.markdown);
    }
}
