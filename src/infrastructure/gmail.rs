use crate::core::error::{AppError, AppResult};
use crate::core::models::{MessageDetail, MessageListPage};
use crate::infrastructure::auth::AccessTokenProvider;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const GMAIL_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Paged mail-provider API the scan pipeline is written against.
#[async_trait]
pub trait MailClient: Send + Sync {
    async fn list_messages(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> AppResult<MessageListPage>;

    async fn get_message(&self, id: &str) -> AppResult<MessageDetail>;

    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> AppResult<Vec<u8>>;
}

/// Decode url-safe base64 as the provider emits it, repairing stripped
/// padding first.
pub fn decode_base64_url(data: &str) -> AppResult<Vec<u8>> {
    let trimmed = data.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| AppError::Decode(format!("Invalid base64 payload: {}", e)))
}

#[derive(Debug, Deserialize)]
struct AttachmentBody {
    data: Option<String>,
}

/// Gmail REST v1 implementation of [`MailClient`].
pub struct GmailClient {
    http: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: String,
}

impl GmailClient {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self::with_base_url(tokens, GMAIL_BASE)
    }

    pub fn with_base_url(tokens: Arc<dyn AccessTokenProvider>, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MailClient for GmailClient {
    async fn list_messages(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> AppResult<MessageListPage> {
        let mut params = vec![
            ("q", query.to_string()),
            ("maxResults", page_size.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.get_json("/messages", &params).await
    }

    async fn get_message(&self, id: &str) -> AppResult<MessageDetail> {
        let params = vec![("format", "full".to_string())];
        self.get_json(&format!("/messages/{}", id), &params).await
    }

    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> AppResult<Vec<u8>> {
        let body: AttachmentBody = self
            .get_json(
                &format!("/messages/{}/attachments/{}", message_id, attachment_id),
                &[],
            )
            .await?;

        match body.data {
            Some(data) => decode_base64_url(&data),
            None => Err(AppError::Decode(format!(
                "No data for attachment {} in message {}",
                attachment_id, message_id
            ))),
        }
    }
}
