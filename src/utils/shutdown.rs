use tokio_util::sync::CancellationToken;

/// 監聽 Ctrl-C，收到後取消回傳的 token
///
/// 各階段在每筆記錄、每頁、每個等待 tick 之間檢查 token，
/// 因此中斷會在目前的 HTTP 呼叫完成後生效。
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("🛑 Interrupt received, stopping after the current request");
                handle.cancel();
            }
            Err(e) => tracing::warn!("Unable to listen for Ctrl-C: {}", e),
        }
    });

    token
}
