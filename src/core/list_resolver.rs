use crate::domain::ports::ContactService;
use crate::utils::error::{Result, UploadError};

/// 確保遠端名單存在並回傳其 id
pub struct ListResolver<'a, S: ContactService> {
    service: &'a S,
}

impl<'a, S: ContactService> ListResolver<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// 先嘗試建立；名稱衝突時改從全部名單中找同名者（區分大小寫）
    pub async fn resolve(&self, name: &str) -> Result<String> {
        tracing::info!("📋 Creating list (label) named: '{}'...", name);

        match self.service.create_list(name).await {
            Ok(id) => {
                tracing::info!("✅ Successfully created list ID: {}", id);
                Ok(id)
            }
            Err(UploadError::RemoteConflict { message }) => {
                tracing::info!(
                    "📋 List '{}' already exists ({}), looking up its ID",
                    name,
                    message
                );
                self.find_existing(name).await
            }
            Err(e) => Err(resolution_failure(name, e)),
        }
    }

    async fn find_existing(&self, name: &str) -> Result<String> {
        let lists = self
            .service
            .list_lists()
            .await
            .map_err(|e| resolution_failure(name, e))?;

        lists
            .into_iter()
            .find(|list| list.name == name)
            .map(|list| {
                tracing::info!("✅ Reusing existing list ID: {}", list.id);
                list.id
            })
            .ok_or_else(|| UploadError::ListResolution {
                name: name.to_string(),
                message: "creation reported a conflict but no list with that name was found"
                    .to_string(),
            })
    }
}

/// 暫時性錯誤保留原樣（退出碼 2，可直接重跑）；其他錯誤包成 `ListResolution`
fn resolution_failure(name: &str, error: UploadError) -> UploadError {
    if error.is_retryable() {
        tracing::error!("❌ List '{}' could not be resolved: {}", name, error);
        return error;
    }

    UploadError::ListResolution {
        name: name.to_string(),
        message: error.to_string(),
    }
}
