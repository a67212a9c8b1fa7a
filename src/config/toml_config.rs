use crate::core::busyness::DEFAULT_WINDOW_DAYS;
use crate::utils::error::{AdminError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub watch: Option<WatchConfig>,
    #[serde(default)]
    pub analytics: Option<AnalyticsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    pub poll_interval_seconds: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsSource {
    /// 呼叫資料庫端的 `get_station_analytics`
    #[default]
    Rpc,
    /// 在本機由預約資料計算
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub source: Option<AnalyticsSource>,
    pub window_days: Option<u32>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                url: String::new(),
                api_key: String::new(),
                timeout_seconds: Some(30),
                retry_attempts: Some(2),
                retry_delay_seconds: Some(1),
            },
            watch: None,
            analytics: None,
        }
    }
}

impl AdminConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdminError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AdminError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SUPABASE_ANON_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AdminError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 取得輪詢間隔
    pub fn poll_interval(&self) -> Duration {
        let seconds = self
            .watch
            .as_ref()
            .and_then(|w| w.poll_interval_seconds)
            .unwrap_or(5);
        Duration::from_secs(seconds)
    }

    pub fn analytics_source(&self) -> AnalyticsSource {
        self.analytics
            .as_ref()
            .and_then(|a| a.source)
            .unwrap_or_default()
    }

    pub fn window_days(&self) -> u32 {
        self.analytics
            .as_ref()
            .and_then(|a| a.window_days)
            .unwrap_or(DEFAULT_WINDOW_DAYS)
    }
}

impl Validate for AdminConfig {
    fn validate(&self) -> Result<()> {
        validate_url("store.url", &self.store.url)?;
        if self.store.api_key.trim().is_empty() || self.store.api_key.starts_with("${") {
            return Err(AdminError::MissingConfigError {
                field: "store.api_key".to_string(),
            });
        }

        if let Some(timeout) = self.store.timeout_seconds {
            validate_positive_number("store.timeout_seconds", timeout, 1)?;
        }
        validate_positive_number("watch.poll_interval_seconds", self.poll_interval().as_secs(), 1)?;
        validate_range("analytics.window_days", self.window_days(), 1, 366).map_err(|_| {
            AdminError::InvalidConfigValueError {
                field: "analytics.window_days".to_string(),
                value: self.window_days().to_string(),
                reason: "Value must be between 1 and 366".to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[store]
url = "https://project.supabase.co"
api_key = "anon"
timeout_seconds = 10
retry_attempts = 3

[watch]
poll_interval_seconds = 2

[analytics]
source = "local"
window_days = 14
"#;

        let config = AdminConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.store.url, "https://project.supabase.co");
        assert_eq!(config.store.retry_attempts, Some(3));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.analytics_source(), AnalyticsSource::Local);
        assert_eq!(config.window_days(), 14);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_optional_sections() {
        let config = AdminConfig::from_toml_str(
            r#"
[store]
url = "https://project.supabase.co"
api_key = "anon"
"#,
        )
        .unwrap();

        assert_eq!(config.analytics_source(), AnalyticsSource::Rpc);
        assert_eq!(config.window_days(), 30);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CHARGEPARK_TEST_KEY", "secret-key");

        let config = AdminConfig::from_toml_str(
            r#"
[store]
url = "https://project.supabase.co"
api_key = "${CHARGEPARK_TEST_KEY}"
"#,
        )
        .unwrap();
        assert_eq!(config.store.api_key, "secret-key");

        std::env::remove_var("CHARGEPARK_TEST_KEY");
    }

    #[test]
    fn test_unresolved_api_key_is_missing() {
        let config = AdminConfig::from_toml_str(
            r#"
[store]
url = "https://project.supabase.co"
api_key = "${CHARGEPARK_UNSET_VARIABLE}"
"#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(AdminError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let config = AdminConfig::from_toml_str(
            r#"
[store]
url = "invalid-url"
api_key = "anon"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let bad_window = AdminConfig::from_toml_str(
            r#"
[store]
url = "https://project.supabase.co"
api_key = "anon"

[analytics]
window_days = 0
"#,
        )
        .unwrap();
        assert!(bad_window.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[store]\nurl = \"http://localhost:54321\"\napi_key = \"k\"\n")
            .unwrap();

        let config = AdminConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.store.url, "http://localhost:54321");
    }
}
