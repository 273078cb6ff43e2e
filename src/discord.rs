use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::compose::Notification;
use crate::sink::{DeliveryError, NotificationSink};

/// Multipart field holding the JSON document in file uploads.
pub const PAYLOAD_JSON_FIELD: &str = "payload_json";

/// Multipart field holding the attachment.
pub const ATTACHMENT_FIELD: &str = "files[0]";

/// Discord-compatible webhook implementation of [`NotificationSink`].
///
/// Notifications without an attachment are posted as JSON; the rest go out
/// as `multipart/form-data` with the document in `payload_json` and the
/// attachment in `files[0]`.
#[derive(Clone, Debug)]
pub struct DiscordWebhook {
    client: Client,
    url: String,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Use a preconfigured client, e.g. one with custom timeouts or proxy.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        DiscordWebhook {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhook {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let payload = serde_json::to_vec(&notification.document)?;

        let request = match &notification.attachment {
            Some(attachment) => {
                let file = Part::bytes(attachment.content.to_vec())
                    .file_name(attachment.file_name.clone())
                    .mime_str("application/octet-stream")?;
                let form = Form::new()
                    .part(PAYLOAD_JSON_FIELD, Part::bytes(payload))
                    .part(ATTACHMENT_FIELD, file);
                self.client.post(&self.url).multipart(form)
            }
            None => self
                .client
                .post(&self.url)
                .header(CONTENT_TYPE, "application/json")
                .body(payload),
        };

        let resp = request.send().await?;
        let status = resp.status();
        if status.as_u16() < 300 {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(DeliveryError::Status { status, body })
        }
    }
}
