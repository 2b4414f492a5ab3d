use crate::domain::model::{ContactList, ContactPage, ContactRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 遠端 CRM 服務的操作介面，每個方法對應一次 REST 呼叫
#[async_trait]
pub trait ContactService: Send + Sync {
    /// 建立名單並回傳其 id；名稱已存在時回傳 `RemoteConflict`
    async fn create_list(&self, name: &str) -> Result<String>;

    async fn list_lists(&self) -> Result<Vec<ContactList>>;

    /// 建立聯絡人並以名稱掛到名單上，回傳遠端 id（若服務有回傳）
    async fn create_contact(&self, contact: &ContactRecord, list_name: &str)
        -> Result<Option<String>>;

    async fn search_contacts(&self, list_id: &str, page: u32, per_page: u32)
        -> Result<ContactPage>;

    async fn delete_contact(&self, contact_id: &str) -> Result<()>;
}
