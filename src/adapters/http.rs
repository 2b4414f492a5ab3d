use crate::domain::model::{deserialize_id, ContactList, ContactPage, ContactRecord};
use crate::domain::ports::ContactService;
use crate::utils::error::{Result, UploadError};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.apollo.io/v1";

const LIST_MODALITY: &str = "contacts";

#[derive(Serialize)]
struct CreateListRequest<'a> {
    name: &'a str,
    modality: &'a str,
}

#[derive(Serialize)]
struct CreateContactRequest<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    organization_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    linkedin_url: Option<&'a str>,
    #[serde(rename = "website_url", skip_serializing_if = "Option::is_none")]
    website: Option<&'a str>,
    label_names: [&'a str; 1],
    run_dedupe: bool,
    // 明確關閉付費的補齊，上傳既有資料不消耗點數
    reveal_personal_emails: bool,
    reveal_phone_number: bool,
}

impl<'a> CreateContactRequest<'a> {
    fn new(contact: &'a ContactRecord, list_name: &'a str) -> Self {
        Self {
            email: &contact.email,
            first_name: contact.first_name.as_deref(),
            last_name: contact.last_name.as_deref(),
            organization_name: contact.organization_name.as_deref(),
            title: contact.title.as_deref(),
            linkedin_url: contact.linkedin_url.as_deref(),
            website: contact.website.as_deref(),
            label_names: [list_name],
            run_dedupe: true,
            reveal_personal_emails: false,
            reveal_phone_number: false,
        }
    }
}

#[derive(Serialize)]
struct SearchContactsRequest<'a> {
    label_ids: [&'a str; 1],
    page: u32,
    per_page: u32,
}

/// Apollo REST API 的單次呼叫客戶端；重試由 `RetryingService` 負責
pub struct ApolloClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApolloClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Making API request: {} {}", method, url);

        self.client
            .request(method, url)
            .header("Content-Type", "application/json")
            .header("Cache-Control", "no-cache")
            .header("X-Api-Key", &self.api_key)
    }

    /// 送出請求並依 HTTP 狀態碼分類錯誤
    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await?;

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&body)?);
        }

        Err(classify_failure(status, body, retry_after))
    }
}

fn classify_failure(status: StatusCode, body: String, retry_after: Option<Duration>) -> UploadError {
    let message = error_message(&body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            tracing::error!("Authentication failed. Check your APOLLO_API_KEY.");
            UploadError::Unauthorized {
                status: status.as_u16(),
            }
        }
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!("Rate limit hit (429).");
            UploadError::RemoteTransient {
                status: status.as_u16(),
                message,
                retry_after,
            }
        }
        StatusCode::CONFLICT => UploadError::RemoteConflict { message },
        s if s.is_server_error() => UploadError::RemoteTransient {
            status: s.as_u16(),
            message,
            retry_after,
        },
        s => UploadError::RemoteRejected {
            status: s.as_u16(),
            message,
        },
    }
}

/// 取出錯誤回應中的訊息欄位，沒有就回傳原文
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message", "errors"]
                .iter()
                .find_map(|key| v.get(*key).map(value_to_message))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn value_to_message(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Deserialize)]
struct IdOnly {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
}

/// 取出回應中的 id，規則與名單、聯絡人的反序列化相同
fn id_of(value: &Value) -> Option<String> {
    IdOnly::deserialize(value)
        .ok()
        .map(|found| found.id)
        .filter(|id| !id.is_empty())
}

fn mentions_existing_name(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("already") || lower.contains("taken")
}

#[async_trait]
impl ContactService for ApolloClient {
    async fn create_list(&self, name: &str) -> Result<String> {
        let payload = CreateListRequest {
            name,
            modality: LIST_MODALITY,
        };
        let request = self.request(Method::POST, "/labels").json(&payload);

        let data = match self.send(request).await {
            Ok(data) => data,
            Err(UploadError::RemoteRejected { message, .. }) if mentions_existing_name(&message) => {
                return Err(UploadError::RemoteConflict { message });
            }
            Err(e) => return Err(e),
        };

        data.get("label")
            .and_then(id_of)
            .or_else(|| id_of(&data))
            .ok_or_else(|| UploadError::UnexpectedResponse {
                message: "API returned success but no label ID was found".to_string(),
            })
    }

    async fn list_lists(&self) -> Result<Vec<ContactList>> {
        let data = self.send(self.request(Method::GET, "/labels")).await?;

        let items = match data {
            Value::Object(mut obj) => obj
                .remove("labels")
                .unwrap_or_else(|| Value::Array(Vec::new())),
            other => other,
        };

        Ok(serde_json::from_value(items)?)
    }

    async fn create_contact(
        &self,
        contact: &ContactRecord,
        list_name: &str,
    ) -> Result<Option<String>> {
        let payload = CreateContactRequest::new(contact, list_name);
        let request = self.request(Method::POST, "/contacts").json(&payload);
        let data = self.send(request).await?;

        Ok(data.get("contact").and_then(id_of))
    }

    async fn search_contacts(
        &self,
        list_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<ContactPage> {
        let payload = SearchContactsRequest {
            label_ids: [list_id],
            page,
            per_page,
        };
        let request = self
            .request(Method::POST, "/contacts/search")
            .json(&payload);
        let data = self.send(request).await?;

        Ok(serde_json::from_value(data)?)
    }

    async fn delete_contact(&self, contact_id: &str) -> Result<()> {
        let path = format!("/contacts/{}", contact_id);
        let data = self.send(self.request(Method::DELETE, &path)).await?;

        match data.get("success").and_then(Value::as_bool) {
            Some(false) => Err(UploadError::RemoteRejected {
                status: StatusCode::OK.as_u16(),
                message: format!("Delete of contact {} reported success=false", contact_id),
            }),
            _ => Ok(()),
        }
    }
}
