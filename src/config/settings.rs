use crate::adapters::http::DEFAULT_BASE_URL;
use crate::core::retry::RetryPolicy;
use crate::utils::error::{Result, UploadError};
use crate::utils::validation::{validate_at_least, validate_base_url, validate_range, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 選用的 TOML 設定檔，所有欄位都有預設值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub retry: RetrySettings,
    pub upload: UploadSettings,
    pub drain: DrainSettings,
    pub wait: WaitSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 2_000,
            multiplier: 2.0,
            max_delay_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// 每筆建立之間的間隔，避免觸發限流
    pub pause_ms: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self { pause_ms: 120 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainSettings {
    pub per_page: u32,
    pub max_records: usize,
}

impl Default for DrainSettings {
    fn default() -> Self {
        Self {
            per_page: 100,
            max_records: 50_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    pub tick_ms: u64,
    pub progress_interval_seconds: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            progress_interval_seconds: 30,
        }
    }
}

impl Settings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| UploadError::ConfigError {
            message: format!(
                "Cannot read settings file {}: {}",
                path.as_ref().display(),
                e
            ),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| UploadError::InvalidConfigValueError {
            field: "settings".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${APOLLO_BASE_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| UploadError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            multiplier: self.retry.multiplier,
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    pub fn upload_pause(&self) -> Duration {
        Duration::from_millis(self.upload.pause_ms)
    }

    pub fn wait_tick(&self) -> Duration {
        Duration::from_millis(self.wait.tick_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.wait.progress_interval_seconds)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_base_url("api.base_url", &self.api.base_url)?;
        validate_at_least("api.timeout_seconds", self.api.timeout_seconds, 1)?;
        validate_range("retry.max_attempts", self.retry.max_attempts, 1, 20)?;
        validate_range("retry.multiplier", self.retry.multiplier, 1.0, 10.0)?;
        validate_at_least("retry.max_delay_ms", self.retry.max_delay_ms, self.retry.base_delay_ms)?;
        validate_range("drain.per_page", self.drain.per_page, 1, 100)?;
        validate_at_least("drain.max_records", self.drain.max_records, 1)?;
        validate_at_least("wait.tick_ms", self.wait.tick_ms, 1)?;
        Ok(())
    }
}
