use config::{Config, ConfigError, Environment, File};
use courier_core::config::AppConfig;
use std::path::Path;

/// 环境变量前缀，`COURIER__NTFY__SERVER_URL` -> `ntfy.server_url`
const ENV_PREFIX: &str = "COURIER";
const ENV_SEPARATOR: &str = "__";

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 指定了 `path` 时该文件必须存在；否则读取当前目录下可选的 `courier.toml`。
/// 2. 叠加 `COURIER__` 前缀的环境变量，列表以逗号分隔。
/// 3. 反序列化为 `AppConfig`。
///
/// # Arguments
/// * `path` - 命令行指定的配置文件。
///
/// # Returns
/// * 成功返回 `AppConfig`，文件缺失或格式错误返回 `ConfigError`。
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("courier").required(false),
    };

    Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("slack.channels")
                .with_list_parse_key("ntfy.topics")
                .with_list_parse_key("ntfy.tags"),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join("courier-settings-test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("courier.toml");
        std::fs::write(
            &file,
            r#"
dry_run = true

[slack]
token = "xoxb-file"
channels = ["C1", "C2"]

[ntfy]
server_url = "https://ntfy.example.com"
topics = ["alerts"]
priority = 4
markdown = true
"#,
        )
        .unwrap();

        let config = load(Some(&file)).unwrap();
        assert!(config.dry_run);
        let slack = config.slack.unwrap();
        assert_eq!(slack.token, "xoxb-file");
        assert_eq!(slack.channels, vec!["C1", "C2"]);
        assert!(!slack.escape_message);
        let ntfy = config.ntfy.unwrap();
        assert_eq!(ntfy.server_url, "https://ntfy.example.com");
        assert_eq!(ntfy.priority, Some(4));
        assert!(ntfy.markdown);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(load(Some(Path::new("/definitely/not/courier.toml"))).is_err());
    }
}
