use crate::adapters::http::ApolloClient;
use crate::config::RunConfig;
use crate::core::export::export_contacts;
use crate::core::list_resolver::ListResolver;
use crate::core::loader::{parse_contacts, read_input};
use crate::core::post_processor::PostProcessor;
use crate::core::retry::RetryingService;
use crate::core::uploader::{UploadReport, Uploader};
use crate::core::wait::{WaitOutcome, WaitTimer};
use crate::domain::model::RemoteContact;
use crate::domain::ports::{ContactService, Storage};
use crate::utils::error::Result;
use tokio_util::sync::CancellationToken;

/// 執行階段：INIT → LIST_RESOLVED → LOADED → UPLOADED → [WAITING] → [DRAINED → CLEANED] → [EXPORTED] → DONE
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum RunStage {
    #[default]
    Init,
    ListResolved,
    Loaded,
    Uploaded,
    Waiting,
    Drained,
    Cleaned,
    Exported,
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub run_id: String,
    pub stage: RunStage,
    pub list_id: String,
    pub total_rows: usize,
    pub loaded: usize,
    pub skipped_rows: usize,
    pub email_only: usize,
    pub upload: UploadReport,
    pub cancelled: bool,
    pub drained: Option<usize>,
    pub deleted: usize,
    pub delete_failures: usize,
    pub retained: Option<usize>,
    pub exported: Option<usize>,
    pub export_path: Option<String>,
}

impl RunSummary {
    fn advance(&mut self, stage: RunStage) {
        tracing::debug!("Run {}: {:?} → {:?}", self.run_id, self.stage, stage);
        self.stage = stage;
    }

    pub fn log(&self) {
        tracing::info!("📊 Run {} summary (list {})", self.run_id, self.list_id);
        tracing::info!(
            "📊 Rows: {} read, {} loaded ({} email-only), {} skipped",
            self.total_rows,
            self.loaded,
            self.email_only,
            self.skipped_rows
        );
        tracing::info!(
            "📊 Upload: {} created, {} failed",
            self.upload.created,
            self.upload.failed
        );
        for failure in &self.upload.failures {
            tracing::info!("   ✗ {}: {}", failure.email, failure.reason);
        }
        if let Some(drained) = self.drained {
            tracing::info!(
                "📊 Post-processing: {} drained, {} deleted, {} delete failures, {} retained",
                drained,
                self.deleted,
                self.delete_failures,
                self.retained.unwrap_or(drained)
            );
        }
        if let (Some(rows), Some(path)) = (self.exported, &self.export_path) {
            tracing::info!("📊 Export: {} rows written to {}", rows, path);
        }
        if self.cancelled {
            tracing::warn!(
                "📊 Run was interrupted at stage {:?}; later stages were skipped",
                self.stage
            );
        }
    }
}

fn interrupted(summary: &mut RunSummary, shutdown: &CancellationToken) -> bool {
    if shutdown.is_cancelled() {
        tracing::warn!("🛑 Run interrupted at stage {:?}", summary.stage);
        summary.cancelled = true;
    }
    summary.cancelled
}

/// 以 `RunConfig` 建立帶重試的 Apollo 客戶端
pub fn build_service(config: &RunConfig) -> Result<RetryingService<ApolloClient>> {
    let client = ApolloClient::new(
        &config.settings.api.base_url,
        &config.api_key,
        config.settings.request_timeout(),
    )?;
    Ok(RetryingService::new(client, config.settings.retry_policy()))
}

/// 依序執行解析名單、載入、上傳與後處理
pub struct UploadEngine<S: ContactService, St: Storage> {
    service: S,
    storage: St,
    config: RunConfig,
    wait_timer: WaitTimer,
}

impl<S: ContactService, St: Storage> UploadEngine<S, St> {
    pub fn new(service: S, storage: St, config: RunConfig) -> Self {
        let wait_timer = WaitTimer::new(
            config.settings.wait_tick(),
            config.settings.progress_interval(),
        );

        Self {
            service,
            storage,
            config,
            wait_timer,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// UPLOADED 之前的錯誤直接回傳；之後的階段失敗只記錄並跳過。
    /// 中斷時停在目前階段，回傳 `cancelled = true` 的摘要。
    pub async fn run(&self, shutdown: &CancellationToken) -> Result<RunSummary> {
        let mut summary = RunSummary {
            run_id: format!("run_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")),
            ..Default::default()
        };
        tracing::info!("🚀 Starting run {}", summary.run_id);

        // 先確認輸入檔可讀，再進行任何網路呼叫
        let input = read_input(&self.storage, &self.config.input_file).await?;
        if interrupted(&mut summary, shutdown) {
            return Ok(summary);
        }

        summary.list_id = ListResolver::new(&self.service)
            .resolve(&self.config.list_name)
            .await?;
        summary.advance(RunStage::ListResolved);

        let loaded = parse_contacts(&input)?;
        drop(input);
        summary.total_rows = loaded.total_rows;
        summary.loaded = loaded.records.len();
        summary.skipped_rows = loaded.skipped_rows;
        summary.email_only = loaded.email_only;
        tracing::info!(
            "📂 Loaded {} contacts from {} ({} skipped, {} email-only)",
            summary.loaded,
            self.config.input_file,
            summary.skipped_rows,
            summary.email_only
        );
        summary.advance(RunStage::Loaded);

        summary.upload = Uploader::new(&self.service)
            .with_pause(self.config.settings.upload_pause())
            .with_cancellation(shutdown.clone())
            .upload(&loaded.records, &self.config.list_name)
            .await?;
        if summary.upload.cancelled {
            summary.cancelled = true;
            return Ok(summary);
        }
        summary.advance(RunStage::Uploaded);

        if !self.config.post_processing_requested() {
            tracing::info!("No cleanup or export requested, skipping post-processing");
            summary.advance(RunStage::Done);
            return Ok(summary);
        }

        self.post_process(&mut summary, shutdown).await;
        Ok(summary)
    }

    async fn post_process(&self, summary: &mut RunSummary, shutdown: &CancellationToken) {
        summary.advance(RunStage::Waiting);
        if self.wait_timer.wait(self.config.wait, shutdown).await == WaitOutcome::Cancelled {
            summary.cancelled = true;
            return;
        }

        let processor = PostProcessor::new(&self.service)
            .with_cancellation(shutdown.clone())
            .with_page_size(self.config.settings.drain.per_page)
            .with_max_records(self.config.settings.drain.max_records);

        let drained = match processor.drain(&summary.list_id).await {
            Ok(contacts) => contacts,
            Err(e) => {
                tracing::error!("❌ Could not read back list {}: {}", summary.list_id, e);
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                summary.advance(RunStage::Done);
                return;
            }
        };
        if interrupted(summary, shutdown) {
            return;
        }
        summary.drained = Some(drained.len());
        summary.advance(RunStage::Drained);

        let retained: Vec<RemoteContact> = if self.config.cleanup {
            let report = processor.cleanup(drained).await;
            summary.deleted = report.deleted;
            summary.delete_failures = report.delete_failures.len();
            if report.cancelled {
                summary.cancelled = true;
                return;
            }
            summary.advance(RunStage::Cleaned);
            report.retained
        } else {
            drained
        };
        summary.retained = Some(retained.len());

        if let Some(path) = &self.config.export_path {
            summary.export_path = Some(path.clone());
            match export_contacts(&self.storage, path, &retained).await {
                Ok(rows) => {
                    summary.exported = Some(rows);
                    summary.advance(RunStage::Exported);
                }
                Err(e) => {
                    tracing::error!("❌ Export to {} failed: {}", path, e);
                    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                }
            }
        }

        summary.advance(RunStage::Done);
    }
}
