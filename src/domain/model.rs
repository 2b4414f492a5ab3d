use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 本地聯絡人記錄可辨識的標準欄位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContactField {
    Email,
    FirstName,
    LastName,
    OrganizationName,
    Title,
    LinkedinUrl,
    Website,
}

impl ContactField {
    pub const ALL: [ContactField; 7] = [
        ContactField::Email,
        ContactField::FirstName,
        ContactField::LastName,
        ContactField::OrganizationName,
        ContactField::Title,
        ContactField::LinkedinUrl,
        ContactField::Website,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactField::Email => "email",
            ContactField::FirstName => "first_name",
            ContactField::LastName => "last_name",
            ContactField::OrganizationName => "organization_name",
            ContactField::Title => "title",
            ContactField::LinkedinUrl => "linkedin_url",
            ContactField::Website => "website",
        }
    }
}

/// 從輸入檔案讀入的一筆聯絡人，email 必定非空
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization_name: Option<String>,
    pub title: Option<String>,
    pub linkedin_url: Option<String>,
    pub website: Option<String>,
}

impl ContactRecord {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with(mut self, field: ContactField, value: impl Into<String>) -> Self {
        self.set(field, value.into());
        self
    }

    /// 設定欄位；空字串視為未提供
    pub fn set(&mut self, field: ContactField, value: String) {
        let value = if value.is_empty() { None } else { Some(value) };
        match field {
            ContactField::Email => self.email = value.unwrap_or_default(),
            ContactField::FirstName => self.first_name = value,
            ContactField::LastName => self.last_name = value,
            ContactField::OrganizationName => self.organization_name = value,
            ContactField::Title => self.title = value,
            ContactField::LinkedinUrl => self.linkedin_url = value,
            ContactField::Website => self.website = value,
        }
    }

    pub fn get(&self, field: ContactField) -> Option<&str> {
        match field {
            ContactField::Email => Some(self.email.as_str()).filter(|e| !e.is_empty()),
            ContactField::FirstName => self.first_name.as_deref(),
            ContactField::LastName => self.last_name.as_deref(),
            ContactField::OrganizationName => self.organization_name.as_deref(),
            ContactField::Title => self.title.as_deref(),
            ContactField::LinkedinUrl => self.linkedin_url.as_deref(),
            ContactField::Website => self.website.as_deref(),
        }
    }

    /// 只有 email，其餘欄位皆空（需要遠端補齊）
    pub fn is_email_only(&self) -> bool {
        ContactField::ALL
            .iter()
            .filter(|f| **f != ContactField::Email)
            .all(|f| self.get(*f).is_none())
    }
}

/// 遠端 id 可能是字串或數字，一律轉成字串
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// 遠端的名單（Apollo 稱為 label）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactList {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modality: Option<String>,
}

/// 遠端回傳的聯絡人，欄位集合由服務決定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteContact {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl RemoteContact {
    /// 取得字串屬性原值；缺少、null 或非字串一律回傳空字串
    pub fn attribute_str(&self, key: &str) -> &str {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn email(&self) -> &str {
        self.attribute_str("email")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total_entries: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactPage {
    #[serde(default)]
    pub contacts: Vec<RemoteContact>,
    #[serde(default)]
    pub pagination: Pagination,
}
