use crate::domain::model::ContactRecord;
use crate::domain::ports::ContactService;
use crate::utils::error::{Result, UploadError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub created: usize,
    pub failed: usize,
    pub failures: Vec<FailedUpload>,
    /// 收到中斷而未處理完所有記錄
    pub cancelled: bool,
}

/// 逐筆建立聯絡人；單筆失敗不影響其他筆
pub struct Uploader<'a, S: ContactService> {
    service: &'a S,
    pause: Duration,
    shutdown: CancellationToken,
}

impl<'a, S: ContactService> Uploader<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self {
            service,
            pause: Duration::ZERO,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// 上傳所有記錄並以名稱掛到名單上；只有認證失敗會中止整批
    pub async fn upload(&self, records: &[ContactRecord], list_name: &str) -> Result<UploadReport> {
        let total = records.len();
        let mut report = UploadReport::default();

        tracing::info!("🚀 Starting upload of {} contacts to '{}'", total, list_name);

        for (index, record) in records.iter().enumerate() {
            if self.shutdown.is_cancelled() {
                tracing::warn!(
                    "🛑 Upload interrupted: {}/{} records processed, {} not sent",
                    index,
                    total,
                    total - index
                );
                report.cancelled = true;
                return Ok(report);
            }

            match self.service.create_contact(record, list_name).await {
                Ok(id) => {
                    report.created += 1;
                    tracing::debug!(
                        "✅ {}/{}: {} created (id: {})",
                        index + 1,
                        total,
                        record.email,
                        id.as_deref().unwrap_or("n/a")
                    );
                }
                Err(UploadError::Unauthorized { status }) => {
                    return Err(UploadError::Unauthorized { status });
                }
                Err(e) => {
                    tracing::error!("❌ {}/{}: {} failed: {}", index + 1, total, record.email, e);
                    report.failed += 1;
                    report.failures.push(FailedUpload {
                        email: record.email.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            if (index + 1) % 50 == 0 {
                tracing::info!(
                    "📤 Progress: {}/{} processed ({} created, {} failed)",
                    index + 1,
                    total,
                    report.created,
                    report.failed
                );
            }

            if !self.pause.is_zero() && index + 1 < total {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {}
                    _ = tokio::time::sleep(self.pause) => {}
                }
            }
        }

        tracing::info!(
            "📤 Upload finished: {} created, {} failed",
            report.created,
            report.failed
        );
        Ok(report)
    }
}
