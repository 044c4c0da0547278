//! LINE Messaging API skill: push messages and webhook payload parsing.

use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::Config;
use crate::error::SkillError;
use crate::http;

const LINE_API_BASE_URL: &str = "https://api.line.me/v2/bot";

/// The Messaging API rejects text messages longer than this.
pub const MAX_MESSAGE_CHARS: usize = 5000;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Ok,
    Error,
}

/// Outcome of one push call. Transport and HTTP failures land here, not in
/// `Err`; `details` carries the API's error body when one was returned.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeliveryReport {
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl DeliveryReport {
    fn delivered() -> Self {
        Self {
            status: DeliveryStatus::Ok,
            error: None,
            details: None,
        }
    }

    fn failed(error: String, details: Option<Value>) -> Self {
        Self {
            status: DeliveryStatus::Error,
            error: Some(error),
            details,
        }
    }
}

/// One parsed webhook event. `message` is only present for message events.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WebhookEvent {
    pub event_type: String,
    pub user_id: String,
    pub reply_token: String,
    // A flattened None serializes to nothing, so plain events stay flat.
    #[serde(flatten)]
    pub message: Option<MessageContent>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
    Image { content_id: String },
    Sticker { sticker_id: String, package_id: String },
    Other { raw_type: String },
}

#[derive(Debug, Clone)]
pub struct LineMessenger {
    channel_access_token: String,
    channel_secret: Option<String>,
    http: Client,
}

impl LineMessenger {
    pub fn new(channel_access_token: impl Into<String>) -> Self {
        Self {
            channel_access_token: channel_access_token.into(),
            channel_secret: None,
            http: http::client(),
        }
    }

    pub fn with_channel_secret(mut self, channel_secret: impl Into<String>) -> Self {
        self.channel_secret = Some(channel_secret.into());
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, SkillError> {
        let token =
            config
                .line_channel_access_token()
                .ok_or(SkillError::MissingCredential {
                    what: "LINEチャネルアクセストークン",
                    env: "LINE_CHANNEL_ACCESS_TOKEN",
                })?;

        let mut messenger = Self::new(token);
        if let Some(secret) = config.line_channel_secret() {
            messenger = messenger.with_channel_secret(secret);
        }

        Ok(messenger)
    }

    /// The webhook signing secret, when one was configured.
    pub fn channel_secret(&self) -> Option<&str> {
        self.channel_secret.as_deref()
    }

    /// Push one text message to a user. Up to [`MAX_MESSAGE_CHARS`] characters.
    pub async fn send_text(&self, to: &str, message: &str) -> Result<DeliveryReport, SkillError> {
        if message.is_empty() {
            return Err(SkillError::EmptyField("メッセージ"));
        }

        let length = message.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(SkillError::MessageTooLong(length));
        }

        Ok(self
            .push(to, json!([{"type": "text", "text": message}]))
            .await)
    }

    /// Push one image message. The URL doubles as the preview; HTTPS only.
    pub async fn send_image(
        &self,
        to: &str,
        image_url: &str,
    ) -> Result<DeliveryReport, SkillError> {
        if !image_url.starts_with("https://") {
            return Err(SkillError::InsecureImageUrl);
        }

        Ok(self
            .push(
                to,
                json!([{
                    "type": "image",
                    "originalContentUrl": image_url,
                    "previewImageUrl": image_url,
                }]),
            )
            .await)
    }

    async fn push(&self, to: &str, messages: Value) -> DeliveryReport {
        let url = format!("{LINE_API_BASE_URL}/message/push");
        let payload = json!({"to": to, "messages": messages});

        let res = match self
            .http
            .post(&url)
            .bearer_auth(&self.channel_access_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(res) => res,
            Err(err) => {
                tracing::error!("ネットワークエラー: {err}");
                return DeliveryReport::failed(err.to_string(), None);
            }
        };

        let status = res.status();
        if status.is_success() {
            tracing::info!("メッセージを送信しました: to={to}");
            return DeliveryReport::delivered();
        }

        let body = res.text().await.unwrap_or_default();
        let details = serde_json::from_str::<Value>(&body).ok();
        tracing::error!(
            "メッセージの送信に失敗しました: to={to}, status={status}, body={}",
            http::truncate_body(&body),
        );

        DeliveryReport::failed(
            format!("LINE push request failed with status {status}"),
            details,
        )
    }
}

/// Extract the events from a webhook request body. Tolerant of missing
/// fields; a payload without events yields an empty list.
pub fn parse_webhook(payload: &Value) -> Vec<WebhookEvent> {
    let events = payload
        .get("events")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if events.is_empty() {
        tracing::warn!("Webhookデータにイベントが含まれていません。");
        return Vec::new();
    }

    events.iter().map(parse_event).collect()
}

fn parse_event(event: &Value) -> WebhookEvent {
    let event_type = str_at(event, "type").unwrap_or("unknown").to_string();
    let user_id = event
        .pointer("/source/userId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let reply_token = str_at(event, "replyToken").unwrap_or_default().to_string();

    let message = (event_type == "message")
        .then(|| parse_message(event.get("message").unwrap_or(&Value::Null)));

    tracing::info!("イベントを解析しました: type={event_type}, user_id={user_id}");

    WebhookEvent {
        event_type,
        user_id,
        reply_token,
        message,
    }
}

fn parse_message(message: &Value) -> MessageContent {
    let message_type = str_at(message, "type").unwrap_or("unknown");

    match message_type {
        "text" => MessageContent::Text {
            text: str_at(message, "text").unwrap_or_default().to_string(),
        },
        "image" => MessageContent::Image {
            content_id: str_at(message, "id").unwrap_or_default().to_string(),
        },
        "sticker" => MessageContent::Sticker {
            sticker_id: str_at(message, "stickerId").unwrap_or_default().to_string(),
            package_id: str_at(message, "packageId").unwrap_or_default().to_string(),
        },
        other => MessageContent::Other {
            raw_type: other.to_string(),
        },
    }
}

fn str_at<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}
