#[cfg(feature = "cli")]
pub mod cli;
pub mod settings;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use settings::Settings;

use crate::utils::error::{Result, UploadError};
use std::time::Duration;

/// 存放 API 金鑰的環境變數
pub const API_KEY_ENV: &str = "APOLLO_API_KEY";

/// 單次執行的完整設定，明確傳給每個元件
#[derive(Clone)]
pub struct RunConfig {
    pub api_key: String,
    pub list_name: String,
    pub input_file: String,
    pub cleanup: bool,
    pub wait: Duration,
    pub export_path: Option<String>,
    pub settings: Settings,
}

impl RunConfig {
    /// 命令列參數優先，其次是環境變數
    pub fn resolve_api_key(flag: Option<&str>, env_value: Option<&str>) -> Result<String> {
        flag.map(str::trim)
            .filter(|k| !k.is_empty())
            .or_else(|| env_value.map(str::trim).filter(|k| !k.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| UploadError::ConfigError {
                message: format!("No API key found. Pass --api-key or set {}", API_KEY_ENV),
            })
    }

    #[cfg(feature = "cli")]
    pub fn from_cli(cli: CliConfig, env_api_key: Option<String>, settings: Settings) -> Result<Self> {
        let api_key = Self::resolve_api_key(cli.api_key.as_deref(), env_api_key.as_deref())?;

        Ok(Self {
            api_key,
            list_name: cli.list_name,
            input_file: cli.input_file,
            cleanup: cli.cleanup,
            wait: Duration::from_secs(cli.wait_minutes.saturating_mul(60)),
            export_path: cli.export,
            settings,
        })
    }

    /// 有清理或匯出時才需要等待與撈取
    pub fn post_processing_requested(&self) -> bool {
        self.cleanup || self.export_path.is_some()
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("api_key", &"***")
            .field("list_name", &self.list_name)
            .field("input_file", &self.input_file)
            .field("cleanup", &self.cleanup)
            .field("wait", &self.wait)
            .field("export_path", &self.export_path)
            .field("settings", &self.settings)
            .finish()
    }
}
