use anyhow::Context;
use clap::Parser;
use contact_loader::utils::error::{ErrorSeverity, UploadError};
use contact_loader::utils::{logger, validation::Validate};
use contact_loader::{
    build_service, install_signal_handler, CliConfig, LocalStorage, RunConfig, Settings,
    UploadEngine, API_KEY_ENV,
};

const EXIT_CANCELLED: i32 = 130;

fn report_and_exit(e: &UploadError) -> ! {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 依錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting contact-loader");
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = cli.validate() {
        report_and_exit(&e);
    }

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings file '{}'", path))?,
        None => Settings::default(),
    };
    settings.validate().context("invalid settings")?;

    let config = match RunConfig::from_cli(cli, std::env::var(API_KEY_ENV).ok(), settings) {
        Ok(config) => config,
        Err(e) => report_and_exit(&e),
    };

    let service = match build_service(&config) {
        Ok(service) => service,
        Err(e) => report_and_exit(&e),
    };
    let shutdown = install_signal_handler();
    let engine = UploadEngine::new(service, LocalStorage::default(), config);

    match engine.run(&shutdown).await {
        Ok(summary) => {
            summary.log();
            println!(
                "✅ {} created, {} failed (list {})",
                summary.upload.created, summary.upload.failed, summary.list_id
            );
            if let Some(drained) = summary.drained {
                println!(
                    "🧹 {} drained, {} deleted, {} kept",
                    drained,
                    summary.deleted,
                    summary.retained.unwrap_or(drained)
                );
            }
            if let (Some(rows), Some(path)) = (summary.exported, &summary.export_path) {
                println!("📁 {} contacts exported to {}", rows, path);
            }
            if summary.cancelled {
                eprintln!(
                    "🛑 Interrupted at stage {:?}; contacts already sent were left as they are",
                    summary.stage
                );
                std::process::exit(EXIT_CANCELLED);
            }
        }
        Err(e) => report_and_exit(&e),
    }

    Ok(())
}
