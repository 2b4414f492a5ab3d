use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    Cancelled,
}

/// 以小間隔睡眠的等待計時器，睡眠期間可被取消
#[derive(Debug, Clone)]
pub struct WaitTimer {
    tick: Duration,
    progress_interval: Duration,
}

impl Default for WaitTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

impl WaitTimer {
    pub fn new(tick: Duration, progress_interval: Duration) -> Self {
        Self {
            tick: tick.max(Duration::from_millis(1)),
            progress_interval,
        }
    }

    pub async fn wait(&self, total: Duration, shutdown: &CancellationToken) -> WaitOutcome {
        if total.is_zero() {
            return WaitOutcome::Completed;
        }

        tracing::info!(
            "⏳ Waiting {} for server-side enrichment (Ctrl-C to stop)",
            format_duration(total)
        );

        let start = Instant::now();
        let mut last_progress = start;

        loop {
            let elapsed = start.elapsed();
            if elapsed >= total {
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::warn!(
                        "🛑 Wait interrupted after {}",
                        format_duration(start.elapsed())
                    );
                    return WaitOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.tick.min(total - elapsed)) => {}
            }

            if last_progress.elapsed() >= self.progress_interval {
                let remaining = total.saturating_sub(start.elapsed());
                tracing::info!("⏳ Still waiting... {} remaining", format_duration(remaining));
                last_progress = Instant::now();
            }
        }

        tracing::info!("✅ Wait complete");
        WaitOutcome::Completed
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}m{:02}s", secs / 60, secs % 60)
}
