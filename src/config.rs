//! 配置模块，负责加载表单标签JSON配置文件

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::ConfigError;
use crate::source_resolver::LabelLookup;

/// 默认配置文件名
pub const DEFAULT_FORM_LABELS_FILE: &str = "form_labels.json";

/// 覆盖配置文件路径的环境变量
pub const FORM_LABELS_ENV: &str = "CRITERIA_FORM_LABELS";

/// 表单标签配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormLabelConfig {
    /// 要素类型名到表单标签的映射
    #[serde(flatten)]
    pub labels: HashMap<String, String>,
}

impl FormLabelConfig {
    /// 从JSON文件加载表单标签配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        // 检查文件是否存在
        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.display().to_string()));
        }

        // 读取文件内容
        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;

        // 解析JSON
        let labels: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path_ref.display().to_string(),
                source,
            })?;

        Ok(FormLabelConfig { labels })
    }

    /// 按环境变量或默认文件名加载, 失败时使用空配置
    pub fn load_or_default() -> Self {
        let path = std::env::var(FORM_LABELS_ENV).unwrap_or_else(|_| DEFAULT_FORM_LABELS_FILE.to_string());
        match Self::from_json_file(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}, 使用空的标签配置", e);
                Self::default()
            }
        }
    }

    /// 获取要素类型对应的标签
    pub fn get_label(&self, feature_type_name: &str) -> Option<&str> {
        self.labels.get(feature_type_name).map(String::as_str)
    }

    /// 获取所有映射
    pub fn get_labels(&self) -> &HashMap<String, String> {
        &self.labels
    }
}

impl LabelLookup for FormLabelConfig {
    fn label(&self, feature_type_name: &str) -> Option<String> {
        self.get_label(feature_type_name).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_load_valid_json_config() {
        // 创建临时配置文件
        let temp_file = temp_path("test_form_labels.json");
        let mut file = fs::File::create(&temp_file).unwrap();
        writeln!(
            file,
            r#"{{
            "inspection": "Inspections",
            "part": "Parts"
        }}"#
        )
        .unwrap();

        // 测试加载
        let config = FormLabelConfig::from_json_file(&temp_file).unwrap();
        assert_eq!(config.get_label("inspection"), Some("Inspections"));
        assert_eq!(config.label("part"), Some("Parts".to_string()));
        assert_eq!(config.get_label("unknown"), None);
        assert_eq!(config.get_labels().len(), 2);

        // 清理
        fs::remove_file(&temp_file).ok();
    }

    #[test]
    fn test_invalid_json_config() {
        let temp_file = temp_path("test_invalid_labels.json");
        let mut file = fs::File::create(&temp_file).unwrap();
        writeln!(file, "invalid json").unwrap();

        let result = FormLabelConfig::from_json_file(&temp_file);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));

        // 清理
        fs::remove_file(&temp_file).ok();
    }

    #[test]
    fn test_missing_file() {
        let result = FormLabelConfig::from_json_file("non_existent_file.json");
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_default_config_is_empty() {
        let config = FormLabelConfig::default();
        assert!(config.get_labels().is_empty());
        assert_eq!(config.label("inspection"), None);
    }
}
