use crate::domain::model::{ContactList, ContactPage, ContactRecord};
use crate::domain::ports::ContactService;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// 有上限的指數退避重試策略，套用於所有對外呼叫
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(2),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次失敗後（從 1 開始）應等待的時間
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let scaled = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }

    /// 執行 `operation`，遇到可重試錯誤時退避後再試
    pub async fn execute<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!("🔁 {} succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    // Retry-After 比退避時間長時以伺服器為準
                    let delay = match e.retry_after() {
                        Some(requested) => requested.max(self.delay_for(attempt)),
                        None => self.delay_for(attempt),
                    }
                    .min(self.max_delay);

                    tracing::warn!(
                        "⏳ {} failed (attempt {}/{}): {}. Retrying in {:?}",
                        label,
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::error!(
                            "❌ {} gave up after {} attempts: {}",
                            label,
                            attempt,
                            e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// 為 `ContactService` 的每個方法套上同一個重試策略
pub struct RetryingService<S: ContactService> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ContactService> RetryingService<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ContactService> ContactService for RetryingService<S> {
    async fn create_list(&self, name: &str) -> Result<String> {
        self.policy
            .execute("create list", || self.inner.create_list(name))
            .await
    }

    async fn list_lists(&self) -> Result<Vec<ContactList>> {
        self.policy
            .execute("list lists", || self.inner.list_lists())
            .await
    }

    async fn create_contact(
        &self,
        contact: &ContactRecord,
        list_name: &str,
    ) -> Result<Option<String>> {
        let label = format!("create contact {}", contact.email);
        self.policy
            .execute(&label, || self.inner.create_contact(contact, list_name))
            .await
    }

    async fn search_contacts(
        &self,
        list_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<ContactPage> {
        let label = format!("search contacts page {}", page);
        self.policy
            .execute(&label, || self.inner.search_contacts(list_id, page, per_page))
            .await
    }

    async fn delete_contact(&self, contact_id: &str) -> Result<()> {
        let label = format!("delete contact {}", contact_id);
        self.policy
            .execute(&label, || self.inner.delete_contact(contact_id))
            .await
    }
}
