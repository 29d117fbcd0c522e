use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// # Summary
/// 消息附带的键值元数据。
///
/// # Invariants
/// - 键唯一；值为任意 JSON 值，后端不做解释。
pub type Metadata = HashMap<String, serde_json::Value>;

/// # Summary
/// 随消息发送的文件型附件。
///
/// # Invariants
/// - 后端仅将其转交给底层传输，不解析内容。
/// - `name` 作为远端显示的文件名。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    // 文件名 (例如: report.pdf)
    pub name: String,
    // MIME 类型 (可选)
    pub content_type: Option<String>,
    // 原始字节内容
    pub data: Vec<u8>,
}

impl Attachment {
    /// # Summary
    /// 由内存字节构造附件。
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    /// # Summary
    /// 设置附件的 MIME 类型。
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// # Summary
    /// 从本地文件读取附件。
    ///
    /// # Logic
    /// 1. 读取文件全部字节。
    /// 2. 取路径最后一段作为文件名，缺失时回退为 "attachment"。
    ///
    /// # Arguments
    /// * `path` - 本地文件路径。
    ///
    /// # Returns
    /// * 成功返回附件，读取失败返回 IO 错误。
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        Ok(Self::new(name, data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_from_path() {
        let dir = std::env::temp_dir().join("courier-attachment-test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("note.txt");
        std::fs::write(&file, b"hello").unwrap();

        let attachment = Attachment::from_path(&file).unwrap();
        assert_eq!(attachment.name, "note.txt");
        assert_eq!(attachment.data, b"hello");
        assert_eq!(attachment.len(), 5);
        assert!(attachment.content_type.is_none());
    }

    #[test]
    fn test_attachment_with_content_type() {
        let attachment = Attachment::new("report.csv", b"a,b".to_vec()).with_content_type("text/csv");
        assert_eq!(attachment.content_type.as_deref(), Some("text/csv"));
        assert_eq!(attachment.name, "report.csv");
        assert_eq!(attachment.len(), 3);
    }

    #[test]
    fn test_attachment_missing_file() {
        assert!(Attachment::from_path("/definitely/not/here.bin").is_err());
    }
}
