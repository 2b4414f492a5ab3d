use crate::domain::model::{ContactList, ContactPage, ContactRecord, Pagination, RemoteContact};
use crate::domain::ports::{ContactService, Storage};
use crate::utils::error::{Result, UploadError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct FakeState {
    lists: Vec<ContactList>,
    remote_contacts: Vec<RemoteContact>,
    created: Vec<(ContactRecord, String)>,
    deleted: Vec<String>,
    create_list_calls: u32,
    list_lists_calls: u32,
    create_contact_calls: u32,
    search_calls: u32,
    scripted_create_errors: VecDeque<UploadError>,
    rejected_emails: HashSet<String>,
    failing_deletes: HashSet<String>,
    search_error: Option<u16>,
    create_list_error: Option<UploadError>,
    cancel_after_creates: Option<(usize, CancellationToken)>,
}

/// 記憶體內的 `ContactService`，用於單元測試
#[derive(Default)]
pub(crate) struct FakeContactService {
    state: Mutex<FakeState>,
}

impl FakeContactService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().lists.push(ContactList {
            id: id.to_string(),
            name: name.to_string(),
            modality: Some("contacts".to_string()),
        });
        self
    }

    pub fn with_remote_contacts(self, contacts: Vec<RemoteContact>) -> Self {
        self.state.lock().unwrap().remote_contacts = contacts;
        self
    }

    /// 依序回傳這些錯誤，用完後才成功
    pub fn with_create_errors(self, errors: Vec<UploadError>) -> Self {
        self.state.lock().unwrap().scripted_create_errors = errors.into();
        self
    }

    pub fn rejecting_email(self, email: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .rejected_emails
            .insert(email.to_string());
        self
    }

    pub fn failing_delete(self, contact_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(contact_id.to_string());
        self
    }

    /// 建立名單時回傳此錯誤
    pub fn failing_create_list(self, error: UploadError) -> Self {
        self.state.lock().unwrap().create_list_error = Some(error);
        self
    }

    /// 成功建立 `count` 筆後取消 token，模擬上傳途中按下 Ctrl-C
    pub fn cancelling_after(self, count: usize, token: CancellationToken) -> Self {
        self.state.lock().unwrap().cancel_after_creates = Some((count, token));
        self
    }

    pub fn failing_search(self, status: u16) -> Self {
        self.state.lock().unwrap().search_error = Some(status);
        self
    }

    pub fn created_emails(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.created.iter().map(|(c, _)| c.email.clone()).collect()
    }

    pub fn created_list_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.created.iter().map(|(_, l)| l.clone()).collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn create_list_calls(&self) -> u32 {
        self.state.lock().unwrap().create_list_calls
    }

    pub fn list_lists_calls(&self) -> u32 {
        self.state.lock().unwrap().list_lists_calls
    }

    pub fn create_contact_calls(&self) -> u32 {
        self.state.lock().unwrap().create_contact_calls
    }

    pub fn search_calls(&self) -> u32 {
        self.state.lock().unwrap().search_calls
    }
}

#[async_trait]
impl ContactService for FakeContactService {
    async fn create_list(&self, name: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.create_list_calls += 1;

        if let Some(error) = state.create_list_error.take() {
            return Err(error);
        }

        if state.lists.iter().any(|l| l.name == name) {
            return Err(UploadError::RemoteConflict {
                message: format!("Label '{}' already exists", name),
            });
        }

        let id = format!("list-{}", state.lists.len() + 1);
        state.lists.push(ContactList {
            id: id.clone(),
            name: name.to_string(),
            modality: Some("contacts".to_string()),
        });
        Ok(id)
    }

    async fn list_lists(&self) -> Result<Vec<ContactList>> {
        let mut state = self.state.lock().unwrap();
        state.list_lists_calls += 1;
        Ok(state.lists.clone())
    }

    async fn create_contact(
        &self,
        contact: &ContactRecord,
        list_name: &str,
    ) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state.create_contact_calls += 1;

        if let Some(error) = state.scripted_create_errors.pop_front() {
            return Err(error);
        }
        if state.rejected_emails.contains(&contact.email) {
            return Err(UploadError::RemoteRejected {
                status: 422,
                message: format!("Email {} is invalid", contact.email),
            });
        }

        let id = format!("contact-{}", state.created.len() + 1);
        state.created.push((contact.clone(), list_name.to_string()));
        if let Some((count, token)) = &state.cancel_after_creates {
            if state.created.len() >= *count {
                token.cancel();
            }
        }
        Ok(Some(id))
    }

    async fn search_contacts(
        &self,
        _list_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<ContactPage> {
        let mut state = self.state.lock().unwrap();
        state.search_calls += 1;

        if let Some(status) = state.search_error {
            return Err(UploadError::RemoteRejected {
                status,
                message: "search failed".to_string(),
            });
        }

        let total = state.remote_contacts.len();
        let per_page_usize = per_page.max(1) as usize;
        let start = (page.saturating_sub(1) as usize) * per_page_usize;
        let contacts = state
            .remote_contacts
            .iter()
            .skip(start)
            .take(per_page_usize)
            .cloned()
            .collect();

        Ok(ContactPage {
            contacts,
            pagination: Pagination {
                page,
                per_page,
                total_pages: total.div_ceil(per_page_usize) as u32,
                total_entries: total as u64,
            },
        })
    }

    async fn delete_contact(&self, contact_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_deletes.contains(contact_id) {
            return Err(UploadError::RemoteTransient {
                status: 503,
                message: "Service unavailable".to_string(),
                retry_after: None,
            });
        }
        state.deleted.push(contact_id.to_string());
        Ok(())
    }
}

/// 記憶體內的檔案存儲
#[derive(Clone, Default)]
pub(crate) struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, data: &[u8]) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        self
    }

    pub fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

impl Storage for MemoryStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.get_file(path).ok_or_else(|| {
            UploadError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }
}

pub(crate) fn remote_contact(id: &str, attributes: serde_json::Value) -> RemoteContact {
    let attributes = match attributes {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    RemoteContact {
        id: id.to_string(),
        attributes,
    }
}
