use crate::utils::error::Result;
use crate::utils::validation::{validate_file_path, validate_non_empty, Validate};
use clap::Parser;

#[derive(Clone, Parser)]
#[command(name = "contact-loader")]
#[command(about = "Bulk upload contacts to Apollo, then clean up and export the enriched ones")]
pub struct CliConfig {
    /// Name of the list (label) to upload into; created if it does not exist
    pub list_name: String,

    /// Path to the CSV file with a header row and an email column
    pub input_file: String,

    /// Apollo API key (falls back to the APOLLO_API_KEY environment variable)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Delete contacts that still have no first name, last name or company after the wait
    #[arg(long)]
    pub cleanup: bool,

    /// Minutes to wait for server-side enrichment before cleanup/export
    #[arg(long, default_value = "15")]
    pub wait_minutes: u64,

    /// Write the remaining contacts of the list to this CSV file
    #[arg(long)]
    pub export: Option<String>,

    /// Optional TOML settings file (API endpoint, retry policy, page size)
    #[arg(long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

// api_key 不能出現在日誌中
impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("list_name", &self.list_name)
            .field("input_file", &self.input_file)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("cleanup", &self.cleanup)
            .field("wait_minutes", &self.wait_minutes)
            .field("export", &self.export)
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty("list_name", &self.list_name)?;
        validate_file_path("input_file", &self.input_file)?;
        if let Some(export) = &self.export {
            validate_file_path("export", export)?;
        }
        if let Some(config) = &self.config {
            validate_file_path("config", config)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let config = CliConfig::parse_from(["contact-loader", "Q3 Leads", "leads.csv"]);

        assert_eq!(config.list_name, "Q3 Leads");
        assert_eq!(config.input_file, "leads.csv");
        assert_eq!(config.wait_minutes, 15);
        assert!(!config.cleanup);
        assert!(config.export.is_none());
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_all_flags() {
        let config = CliConfig::parse_from([
            "contact-loader",
            "Q3 Leads",
            "leads.csv",
            "--api-key",
            "secret",
            "--cleanup",
            "--wait-minutes",
            "5",
            "--export",
            "enriched.csv",
        ]);

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert!(config.cleanup);
        assert_eq!(config.wait_minutes, 5);
        assert_eq!(config.export.as_deref(), Some("enriched.csv"));
        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn test_blank_list_name_is_rejected() {
        let config = CliConfig::parse_from(["contact-loader", "  ", "leads.csv"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_must_name_a_file() {
        let config =
            CliConfig::parse_from(["contact-loader", "Q3", "leads.csv", "--export", "reports/"]);
        assert!(config.validate().is_err());
    }
}
