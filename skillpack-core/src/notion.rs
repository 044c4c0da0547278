//! Lightweight Notion integration: page create/read, database records, and
//! the dated daily-report template.

mod blocks;

use chrono::{Datelike, Local, NaiveDate};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::error::SkillError;
use crate::http;

const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";
const NOTION_API_VERSION: &str = "2022-06-28";

/// A typed database property value. The first property of a record is
/// always written as the database's title property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Checkbox(bool),
}

impl PropertyValue {
    /// Rendering used when the value lands in the title property.
    fn as_title_text(&self) -> String {
        match self {
            PropertyValue::Text(text) => text.clone(),
            PropertyValue::Number(number) => number.to_string(),
            PropertyValue::Checkbox(flag) => flag.to_string(),
        }
    }

    fn to_notion(&self) -> Value {
        match self {
            PropertyValue::Text(text) if is_date_string(text) => {
                json!({"date": {"start": text}})
            }
            PropertyValue::Text(text) => json!({"rich_text": blocks::rich_text(text)}),
            PropertyValue::Number(number) => json!({"number": number}),
            PropertyValue::Checkbox(flag) => json!({"checkbox": flag}),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageReceipt {
    pub page_id: String,
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageSnapshot {
    pub title: String,
    pub content: String,
    /// ISO 8601 timestamps as the API reports them.
    pub last_edited: String,
    pub created_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl PageSnapshot {
    fn unavailable(failure: ApiFailure) -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            last_edited: String::new(),
            created_time: String::new(),
            error: Some(failure.message),
            details: failure.details,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordReceipt {
    pub record_id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyReportReceipt {
    pub record_id: String,
    pub url: String,
    /// Report date, "YYYY-MM-DD".
    pub date: String,
    /// The generated template text, also returned on failure so the caller
    /// can fall back to manual entry.
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

struct ApiFailure {
    message: String,
    details: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct NotionLite {
    api_key: String,
    http: Client,
}

impl NotionLite {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: http::client(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SkillError> {
        let api_key = config.notion_api_key().ok_or(SkillError::MissingCredential {
            what: "Notion APIキー",
            env: "NOTION_API_KEY",
        })?;

        Ok(Self::new(api_key))
    }

    /// Create a child page under `parent_id`. `content` is lightweight
    /// Markdown converted to blocks.
    pub async fn create_page(
        &self,
        parent_id: &str,
        title: &str,
        content: Option<&str>,
    ) -> Result<PageReceipt, SkillError> {
        if parent_id.is_empty() {
            return Err(SkillError::EmptyField("親ページID"));
        }
        if title.is_empty() {
            return Err(SkillError::EmptyField("ページタイトル"));
        }

        let mut payload = json!({
            "parent": {"page_id": parent_id},
            "properties": {
                "title": {"title": blocks::rich_text(title)},
            },
        });
        if let Some(content) = content {
            payload["children"] = Value::Array(blocks::markdown_to_blocks(content));
        }

        let url = format!("{NOTION_API_BASE_URL}/pages");
        match self.request_json(self.http.post(&url).json(&payload)).await {
            Ok(data) => {
                let page_id = str_field(&data, "id");
                tracing::info!("ページを作成しました: id={page_id}, title={title}");
                Ok(PageReceipt {
                    page_id,
                    url: str_field(&data, "url"),
                    title: title.to_string(),
                    error: None,
                    details: None,
                })
            }
            Err(failure) => {
                tracing::error!("ページの作成に失敗しました: {}", failure.message);
                Ok(PageReceipt {
                    page_id: String::new(),
                    url: String::new(),
                    title: title.to_string(),
                    error: Some(failure.message),
                    details: failure.details,
                })
            }
        }
    }

    /// Fetch a page's metadata and render its blocks back to plain text.
    pub async fn read_page(&self, page_id: &str) -> Result<PageSnapshot, SkillError> {
        if page_id.is_empty() {
            return Err(SkillError::EmptyField("ページID"));
        }

        let page_url = format!("{NOTION_API_BASE_URL}/pages/{page_id}");
        let page = match self.request_json(self.http.get(&page_url)).await {
            Ok(page) => page,
            Err(failure) => {
                tracing::error!("ページの読み取りに失敗しました: {}", failure.message);
                return Ok(PageSnapshot::unavailable(failure));
            }
        };

        let blocks_url = format!("{NOTION_API_BASE_URL}/blocks/{page_id}/children");
        let block_data = match self.request_json(self.http.get(&blocks_url)).await {
            Ok(data) => data,
            Err(failure) => {
                tracing::error!("ページの読み取りに失敗しました: {}", failure.message);
                return Ok(PageSnapshot::unavailable(failure));
            }
        };

        let results = block_data
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        tracing::info!("ページを読み取りました: id={page_id}");
        Ok(PageSnapshot {
            title: extract_title(&page),
            content: blocks::blocks_to_text(results),
            last_edited: str_field(&page, "last_edited_time"),
            created_time: str_field(&page, "created_time"),
            error: None,
            details: None,
        })
    }

    /// Insert a record into a database. Property order matters: the first
    /// entry becomes the title property.
    pub async fn add_database_record(
        &self,
        database_id: &str,
        properties: &[(String, PropertyValue)],
    ) -> Result<RecordReceipt, SkillError> {
        if database_id.is_empty() {
            return Err(SkillError::EmptyField("データベースID"));
        }
        if properties.is_empty() {
            return Err(SkillError::EmptyField("プロパティ"));
        }

        let payload = json!({
            "parent": {"database_id": database_id},
            "properties": Value::Object(notion_properties(properties)),
        });

        let url = format!("{NOTION_API_BASE_URL}/pages");
        match self.request_json(self.http.post(&url).json(&payload)).await {
            Ok(data) => {
                let record_id = str_field(&data, "id");
                tracing::info!("レコードを追加しました: id={record_id}");
                Ok(RecordReceipt {
                    record_id,
                    url: str_field(&data, "url"),
                    error: None,
                    details: None,
                })
            }
            Err(failure) => {
                tracing::error!("レコードの追加に失敗しました: {}", failure.message);
                Ok(RecordReceipt {
                    record_id: String::new(),
                    url: String::new(),
                    error: Some(failure.message),
                    details: failure.details,
                })
            }
        }
    }

    /// Create today's daily report in the given database. The record gets
    /// 名前 and 日付 properties plus the template as page content.
    pub async fn generate_daily_report(
        &self,
        database_id: &str,
    ) -> Result<DailyReportReceipt, SkillError> {
        if database_id.is_empty() {
            return Err(SkillError::EmptyField("データベースID"));
        }

        let today = Local::now().date_naive();
        let (title, template) = daily_report_template(today);
        let date_str = today.format("%Y-%m-%d").to_string();

        let payload = json!({
            "parent": {"database_id": database_id},
            "properties": {
                "名前": {"title": blocks::rich_text(&title)},
                "日付": {"date": {"start": &date_str}},
            },
            "children": Value::Array(blocks::markdown_to_blocks(&template)),
        });

        let url = format!("{NOTION_API_BASE_URL}/pages");
        match self.request_json(self.http.post(&url).json(&payload)).await {
            Ok(data) => {
                let record_id = str_field(&data, "id");
                tracing::info!("日報を作成しました: id={record_id}, date={date_str}");
                Ok(DailyReportReceipt {
                    record_id,
                    url: str_field(&data, "url"),
                    date: date_str,
                    template,
                    error: None,
                    details: None,
                })
            }
            Err(failure) => {
                tracing::error!("日報の作成に失敗しました: {}", failure.message);
                Ok(DailyReportReceipt {
                    record_id: String::new(),
                    url: String::new(),
                    date: date_str,
                    template,
                    error: Some(failure.message),
                    details: failure.details,
                })
            }
        }
    }

    async fn request_json(&self, request: reqwest::RequestBuilder) -> Result<Value, ApiFailure> {
        let res = match request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_API_VERSION)
            .send()
            .await
        {
            Ok(res) => res,
            Err(err) => {
                tracing::error!("ネットワークエラー: {err}");
                return Err(ApiFailure {
                    message: err.to_string(),
                    details: None,
                });
            }
        };

        let status = res.status();
        let body = res.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ApiFailure {
                message: format!(
                    "Notion request failed with status {}: {}",
                    status,
                    http::truncate_body(&body),
                ),
                details: serde_json::from_str(&body).ok(),
            });
        }

        serde_json::from_str(&body).map_err(|err| ApiFailure {
            message: format!("Failed to parse Notion JSON: {err}"),
            details: None,
        })
    }
}

/// Convert an ordered property list into the API's property map.
fn notion_properties(properties: &[(String, PropertyValue)]) -> Map<String, Value> {
    let mut map = Map::new();

    for (index, (name, value)) in properties.iter().enumerate() {
        let converted = if index == 0 {
            json!({"title": blocks::rich_text(&value.as_title_text())})
        } else {
            value.to_notion()
        };
        map.insert(name.clone(), converted);
    }

    map
}

fn extract_title(page: &Value) -> String {
    page.get("properties")
        .and_then(Value::as_object)
        .and_then(|props| {
            props
                .values()
                .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))
        })
        .map(|prop| blocks::plain_text(prop.get("title").unwrap_or(&Value::Null)))
        .unwrap_or_default()
}

fn is_date_string(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Build the daily-report title and template for a given date. Pure; the
/// caller supplies "today".
fn daily_report_template(today: NaiveDate) -> (String, String) {
    const WEEKDAYS: [&str; 7] = ["月", "火", "水", "木", "金", "土", "日"];
    let weekday = WEEKDAYS[today.weekday().num_days_from_monday() as usize];
    let date_str = today.format("%Y-%m-%d");

    let title = format!("日報 {date_str}（{weekday}）");
    let template = format!(
        "## 日報 {date_str}（{weekday}）\n\
         \n\
         ### 今日のタスク\n\
         - [ ] \n\
         - [ ] \n\
         - [ ] \n\
         \n\
         ### 完了したタスク\n\
         - \n\
         \n\
         ### 明日の予定\n\
         - \n\
         \n\
         ### メモ・気づき\n"
    );

    (title, template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_property_becomes_the_title() {
        let props = vec![
            (
                "名前".to_string(),
                PropertyValue::Text("タスクA".to_string()),
            ),
            (
                "ステータス".to_string(),
                PropertyValue::Text("進行中".to_string()),
            ),
        ];

        let map = notion_properties(&props);
        assert!(map["名前"].get("title").is_some());
        assert_eq!(
            map["ステータス"].pointer("/rich_text/0/text/content"),
            Some(&Value::String("進行中".to_string()))
        );
    }

    #[test]
    fn date_strings_become_date_properties() {
        let props = vec![
            ("名前".to_string(), PropertyValue::Text("締切".to_string())),
            (
                "期限".to_string(),
                PropertyValue::Text("2025-12-31".to_string()),
            ),
        ];

        let map = notion_properties(&props);
        assert_eq!(
            map["期限"],
            serde_json::json!({"date": {"start": "2025-12-31"}})
        );
    }

    #[test]
    fn numbers_and_booleans_map_to_native_properties() {
        let props = vec![
            ("名前".to_string(), PropertyValue::Text("在庫".to_string())),
            ("数量".to_string(), PropertyValue::Number(12.0)),
            ("完了".to_string(), PropertyValue::Checkbox(true)),
        ];

        let map = notion_properties(&props);
        assert_eq!(map["数量"], serde_json::json!({"number": 12.0}));
        assert_eq!(map["完了"], serde_json::json!({"checkbox": true}));
    }

    #[test]
    fn date_detection_requires_the_exact_format() {
        assert!(is_date_string("2025-08-04"));
        assert!(!is_date_string("2025/08/04"));
        assert!(!is_date_string("2025-13-01"));
        assert!(!is_date_string("明日"));
    }

    #[test]
    fn title_is_found_among_page_properties() {
        let page = serde_json::json!({
            "properties": {
                "タグ": {"type": "multi_select", "multi_select": []},
                "名前": {"type": "title", "title": [{"plain_text": "議事録"}]}
            }
        });

        assert_eq!(extract_title(&page), "議事録");
        assert_eq!(extract_title(&serde_json::json!({})), "");
    }

    #[test]
    fn daily_report_template_carries_date_and_weekday() {
        // 2025-08-04 is a Monday.
        let date = NaiveDate::from_ymd_opt(2025, 8, 4).expect("valid date");
        let (title, template) = daily_report_template(date);

        assert_eq!(title, "日報 2025-08-04（月）");
        assert!(template.starts_with("## 日報 2025-08-04（月）\n"));
        for section in ["### 今日のタスク", "### 完了したタスク", "### 明日の予定", "### メモ・気づき"] {
            assert!(template.contains(section), "missing {section}");
        }

        // The template must survive its own block conversion.
        let blocks = blocks::markdown_to_blocks(&template);
        assert_eq!(
            blocks[0].get("type").and_then(Value::as_str),
            Some("heading_2")
        );
    }

    #[test]
    fn sunday_uses_the_last_weekday_name() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 10).expect("valid date");
        let (title, _) = daily_report_template(date);
        assert_eq!(title, "日報 2025-08-10（日）");
    }
}
