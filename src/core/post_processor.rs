use crate::domain::model::RemoteContact;
use crate::domain::ports::ContactService;
use crate::utils::error::Result;
use tokio_util::sync::CancellationToken;

/// 保留條件：名、姓、公司任一非空
pub fn should_retain(contact: &RemoteContact) -> bool {
    !contact.attribute_str("first_name").is_empty()
        || !contact.attribute_str("last_name").is_empty()
        || !contact.attribute_str("organization_name").is_empty()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelete {
    pub contact_id: String,
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    pub retained: Vec<RemoteContact>,
    pub deleted: usize,
    pub delete_failures: Vec<FailedDelete>,
    pub cancelled: bool,
}

/// 撈取名單內容並清除未補齊的聯絡人
pub struct PostProcessor<'a, S: ContactService> {
    service: &'a S,
    per_page: u32,
    max_records: usize,
    shutdown: CancellationToken,
}

impl<'a, S: ContactService> PostProcessor<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self {
            service,
            per_page: 100,
            max_records: 50_000,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_page_size(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    /// 逐頁查詢直到 total_pages 或數量上限，保留遠端順序
    pub async fn drain(&self, list_id: &str) -> Result<Vec<RemoteContact>> {
        let mut contacts = Vec::new();
        let mut page = 1;

        loop {
            if self.shutdown.is_cancelled() {
                tracing::warn!("🛑 Drain interrupted after {} contacts", contacts.len());
                break;
            }

            let result = self
                .service
                .search_contacts(list_id, page, self.per_page)
                .await?;
            let pagination = result.pagination;

            if page == 1 {
                tracing::info!(
                    "🔎 List {} has {} contacts across {} pages",
                    list_id,
                    pagination.total_entries,
                    pagination.total_pages
                );
            }

            if result.contacts.is_empty() {
                tracing::debug!("Page {} is empty, stopping", page);
                break;
            }
            contacts.extend(result.contacts);
            tracing::debug!("Fetched page {}/{} ({} so far)", page, pagination.total_pages, contacts.len());

            if contacts.len() >= self.max_records {
                if contacts.len() > self.max_records || page < pagination.total_pages {
                    tracing::warn!(
                        "⚠️ Reached the {} record cap, ignoring the rest of the list",
                        self.max_records
                    );
                }
                contacts.truncate(self.max_records);
                break;
            }

            if page >= pagination.total_pages {
                break;
            }
            page += 1;
        }

        tracing::info!("🔎 Drained {} contacts from list {}", contacts.len(), list_id);
        Ok(contacts)
    }

    /// 刪除不符合保留條件的聯絡人；刪除失敗只記錄，不中斷
    pub async fn cleanup(&self, contacts: Vec<RemoteContact>) -> CleanupReport {
        let mut report = CleanupReport::default();
        let candidates = contacts.iter().filter(|c| !should_retain(c)).count();

        tracing::info!(
            "🧹 Cleanup: {} of {} contacts were not enriched and will be deleted",
            candidates,
            contacts.len()
        );

        for contact in contacts {
            if self.shutdown.is_cancelled() {
                if !report.cancelled {
                    tracing::warn!("🛑 Cleanup interrupted, remaining contacts are left in place");
                    report.cancelled = true;
                }
                report.retained.push(contact);
                continue;
            }

            if should_retain(&contact) {
                report.retained.push(contact);
                continue;
            }

            match self.service.delete_contact(&contact.id).await {
                Ok(()) => {
                    report.deleted += 1;
                    tracing::debug!("🗑️ Deleted {} ({})", contact.id, contact.email());
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Failed to delete {} ({}): {}",
                        contact.id,
                        contact.email(),
                        e
                    );
                    report.delete_failures.push(FailedDelete {
                        contact_id: contact.id.clone(),
                        email: contact.email().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "🧹 Cleanup finished: {} kept, {} deleted, {} delete failures",
            report.retained.len(),
            report.deleted,
            report.delete_failures.len()
        );
        report
    }
}
