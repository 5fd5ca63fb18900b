//! Gmail REST adapter.
//!
//! Lists and fetches messages from the Gmail API using a ready-to-use
//! bearer token supplied by the caller — acquiring and refreshing the
//! token is out of scope here. Only plain-text body parts are consumed;
//! an HTML-only message yields an empty body.

use anyhow::anyhow;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;

use crate::config::GmailConfig;
use crate::error::{Error, Result};
use crate::models::Email;

pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    id: String,
    payload: Payload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payload {
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: Option<PartBody>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    mime_type: String,
    #[serde(default)]
    body: Option<PartBody>,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    #[serde(default)]
    data: Option<String>,
}

impl GmailClient {
    pub fn new(config: &GmailConfig, token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::upstream("gmail", e))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            token,
        })
    }

    /// List up to `max_results` message ids from the user's mailbox.
    pub async fn list_message_ids(&self, max_results: usize) -> Result<Vec<String>> {
        let url = format!(
            "{}/users/me/messages?maxResults={}",
            self.base_url, max_results
        );
        let list: MessageList = self.get_json(&url).await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    /// Fetch one message and flatten it into an [`Email`].
    pub async fn get_message(&self, id: &str) -> Result<Email> {
        let url = format!("{}/users/me/messages/{}", self.base_url, id);
        let message: Message = self.get_json(&url).await?;
        Ok(flatten_message(message))
    }

    /// List + fetch loop: up to `max_results` messages, in list order.
    pub async fn fetch_emails(&self, max_results: usize) -> Result<Vec<Email>> {
        let ids = self.list_message_ids(max_results).await?;
        let mut emails = Vec::with_capacity(ids.len());
        for id in &ids {
            emails.push(self.get_message(id).await?);
        }
        tracing::debug!(count = emails.len(), "fetched messages from gmail");
        Ok(emails)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| Error::upstream("gmail", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(
                "gmail",
                anyhow!("Gmail API error {}: {}", status, body),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::upstream("gmail", e))
    }
}

/// Reduce a raw Gmail message to id, headers of interest, and the
/// plain-text body.
fn flatten_message(message: Message) -> Email {
    let subject = header_value(&message.payload.headers, "Subject");
    let sender = header_value(&message.payload.headers, "From");
    let date = header_value(&message.payload.headers, "Date");
    let body = extract_plain_text_body(&message.payload);

    Email {
        id: message.id,
        sender,
        subject,
        date,
        body,
    }
}

fn header_value(headers: &[Header], name: &str) -> String {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
        .unwrap_or_default()
}

/// Body from `payload.body.data` if present, otherwise the first
/// `text/plain` part. HTML-only messages come out empty.
fn extract_plain_text_body(payload: &Payload) -> String {
    if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_deref()) {
        return decode_body(data);
    }

    for part in &payload.parts {
        if part.mime_type == "text/plain" {
            if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
                return decode_body(data);
            }
        }
    }

    String::new()
}

/// Gmail serves URL-safe base64, sometimes padded and sometimes not.
fn decode_body(data: &str) -> String {
    let bytes = URL_SAFE_NO_PAD
        .decode(data)
        .or_else(|_| URL_SAFE.decode(data))
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}
