use crate::domain::model::{ContactField, ContactRecord};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, UploadError};
use std::collections::HashMap;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 標準欄位 → 可接受的表頭寫法（已正規化：小寫、底線）
const COLUMN_ALIASES: &[(ContactField, &[&str])] = &[
    (
        ContactField::Email,
        &["email", "e_mail", "email_address", "work_email", "emailaddress", "mail"],
    ),
    (
        ContactField::FirstName,
        &["first_name", "firstname", "first", "given_name", "fname"],
    ),
    (
        ContactField::LastName,
        &["last_name", "lastname", "last", "surname", "family_name", "lname"],
    ),
    (
        ContactField::OrganizationName,
        &[
            "organization_name",
            "organization",
            "organisation",
            "company",
            "company_name",
            "account_name",
            "employer",
        ],
    ),
    (
        ContactField::Title,
        &["title", "job_title", "position", "role"],
    ),
    (
        ContactField::LinkedinUrl,
        &[
            "linkedin_url",
            "linkedin",
            "linkedin_profile",
            "person_linkedin_url",
            "linkedin_profile_url",
        ],
    ),
    (
        ContactField::Website,
        &["website", "website_url", "company_website", "url", "web"],
    ),
];

/// 載入結果與逐列統計
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub records: Vec<ContactRecord>,
    pub total_rows: usize,
    pub skipped_rows: usize,
    pub email_only: usize,
}

/// 表頭正規化：去空白、小寫、空白與連字號轉底線
fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn canonical_field(header: &str) -> Option<ContactField> {
    let normalized = normalize_header(header);
    COLUMN_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
        .map(|(field, _)| *field)
}

/// 整欄姓名的表頭寫法；只在沒有名、姓欄時拆開使用
const FULL_NAME_ALIASES: &[&str] = &["name", "full_name", "fullname", "contact_name", "person_name"];

/// 欄位索引 → 標準欄位，另記錄整欄姓名的位置
#[derive(Debug, Default)]
struct ColumnMapping {
    fields: HashMap<usize, ContactField>,
    full_name: Option<usize>,
}

impl ColumnMapping {
    fn has(&self, field: ContactField) -> bool {
        self.fields.values().any(|f| *f == field)
    }
}

/// 同一欄位只取第一個出現的欄
fn build_column_mapping(headers: &csv::StringRecord) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();
    let mut seen = HashMap::new();
    let mut ignored = Vec::new();

    for (index, header) in headers.iter().enumerate() {
        match canonical_field(header) {
            Some(field) => {
                if let Some(first) = seen.get(&field) {
                    tracing::warn!(
                        "⚠️ Column '{}' also maps to {} (already taken by column {}), ignoring",
                        header,
                        field.as_str(),
                        first
                    );
                    continue;
                }
                seen.insert(field, index + 1);
                mapping.fields.insert(index, field);
            }
            None if mapping.full_name.is_none()
                && FULL_NAME_ALIASES.contains(&normalize_header(header).as_str()) =>
            {
                mapping.full_name = Some(index);
            }
            None => ignored.push(header),
        }
    }

    if let Some(index) = mapping.full_name {
        if mapping.has(ContactField::FirstName) || mapping.has(ContactField::LastName) {
            ignored.push(&headers[index]);
            mapping.full_name = None;
        } else {
            tracing::info!("Splitting column '{}' into first and last name", &headers[index]);
        }
    }

    if !ignored.is_empty() {
        tracing::warn!("⚠️ Ignoring unrecognized columns: {}", ignored.join(", "));
    }

    mapping
}

/// 第一個字當名，其餘當姓
fn split_full_name(full_name: &str) -> (Option<String>, Option<String>) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().map(str::to_string);
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, Some(rest).filter(|r| !r.is_empty()))
}

/// 將 CSV 內容解析為聯絡人記錄
pub fn parse_contacts(data: &[u8]) -> Result<LoadReport> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let mapping = build_column_mapping(&headers);

    if !mapping.has(ContactField::Email) {
        return Err(UploadError::FormatError {
            message: format!(
                "No email column found in header: {}",
                headers.iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    let mut report = LoadReport::default();

    for (row_index, row) in reader.records().enumerate() {
        // 第 1 列是表頭
        let line = row_index + 2;
        report.total_rows += 1;

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("⚠️ Row {}: unreadable ({}), skipping", line, e);
                report.skipped_rows += 1;
                continue;
            }
        };

        let mut record = ContactRecord::default();
        for (index, value) in row.iter().enumerate() {
            if let Some(field) = mapping.fields.get(&index) {
                record.set(*field, value.trim().to_string());
            }
        }
        if let Some(full_name) = mapping.full_name.and_then(|index| row.get(index)) {
            let (first, last) = split_full_name(full_name);
            record.first_name = first;
            record.last_name = last;
        }

        if record.email.is_empty() {
            tracing::warn!("⚠️ Row {}: missing email, skipping", line);
            report.skipped_rows += 1;
            continue;
        }

        if record.is_email_only() {
            tracing::debug!("Row {}: {} is email-only", line, record.email);
            report.email_only += 1;
        }

        report.records.push(record);
    }

    if report.records.is_empty() {
        return Err(UploadError::FormatError {
            message: format!(
                "No rows with a usable email ({} rows read, {} skipped)",
                report.total_rows, report.skipped_rows
            ),
        });
    }

    Ok(report)
}

/// 讀取輸入檔；讀不到視為設定錯誤
pub async fn read_input<St: Storage>(storage: &St, path: &str) -> Result<Vec<u8>> {
    storage.read_file(path).await.map_err(|e| match e {
        UploadError::IoError(io) => UploadError::ConfigError {
            message: format!("Cannot read input file {}: {}", path, io),
        },
        other => other,
    })
}
