use crate::domain::model::RemoteContact;
use crate::domain::ports::Storage;
use crate::utils::error::{Result, UploadError};
use serde_json::Value;
use std::collections::BTreeSet;

const MULTI_VALUE_SEPARATOR: &str = "; ";

/// 陣列內物件優先顯示的欄位（例如電話號碼）
const DISPLAY_KEYS: &[&str] = &["sanitized_number", "raw_number", "email", "name", "value"];

/// 所有記錄欄位的聯集；`id` 固定在第一欄，其餘依字母排序
pub fn export_header(contacts: &[RemoteContact]) -> Vec<String> {
    let fields: BTreeSet<&str> = contacts
        .iter()
        .flat_map(|c| c.attributes.keys().map(String::as_str))
        .filter(|key| *key != "id")
        .collect();

    std::iter::once("id")
        .chain(fields)
        .map(str::to_string)
        .collect()
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_item)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(MULTI_VALUE_SEPARATOR),
        Value::Object(_) => value.to_string(),
    }
}

fn render_item(value: &Value) -> String {
    match value {
        Value::Object(obj) => DISPLAY_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => render_cell(other),
    }
}

/// 產生 CSV；缺少的欄位輸出空字串
pub fn render_csv(contacts: &[RemoteContact]) -> Result<Vec<u8>> {
    let header = export_header(contacts);
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&header)?;
    for contact in contacts {
        let row = header.iter().map(|field| {
            if field == "id" {
                contact.id.clone()
            } else {
                contact
                    .attributes
                    .get(field)
                    .map(render_cell)
                    .unwrap_or_default()
            }
        });
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| UploadError::IoError(e.into_error()))
}

/// 寫出匯出檔並回傳資料列數
pub async fn export_contacts<St: Storage>(
    storage: &St,
    path: &str,
    contacts: &[RemoteContact],
) -> Result<usize> {
    let data = render_csv(contacts)?;

    tracing::debug!("Writing export ({} bytes) to {}", data.len(), path);
    storage.write_file(path, &data).await?;

    tracing::info!("💾 Exported {} contacts to {}", contacts.len(), path);
    Ok(contacts.len())
}
