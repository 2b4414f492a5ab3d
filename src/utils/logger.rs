use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 沒有設定 RUST_LOG 時的過濾規則；verbose 也會顯示每個 HTTP 請求
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "contact_loader=debug,reqwest=debug,warn"
    } else {
        "contact_loader=info,warn"
    }
}

/// 日誌寫到 stderr，stdout 只留給最後的結果摘要
pub fn init_cli_logger(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .compact(),
        )
        .init();
}
