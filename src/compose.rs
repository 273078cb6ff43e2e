use bytes::Bytes;
use chrono::SecondsFormat;
use serde::Serialize;

use crate::render::{fence, request_fields, RenderedField};
use crate::snapshot::CapturedEvent;

/// Messages longer than this many bytes are sent as a file attachment.
pub const MAX_INLINE_MESSAGE_LEN: usize = 500;

/// File name of the attachment carrying an oversized message.
pub const ATTACHMENT_FILE_NAME: &str = "log.txt";

/// Display name used for the webhook post unless configured otherwise.
pub const DEFAULT_USERNAME: &str = "Rust";

pub const REQUEST_PAYLOAD_TITLE: &str = "REQUEST PAYLOAD";
pub const MESSAGE_TITLE: &str = "MESSAGE";

/// JSON document posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationDocument {
    pub username: String,
    pub embeds: Vec<Embed>,
}

/// One section of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<RenderedField>>,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Raw bytes shipped next to the document as a file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content: Bytes,
}

/// Everything needed for a single delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub document: NotificationDocument,
    pub attachment: Option<Attachment>,
}

impl Notification {
    pub fn is_file_upload(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn embed(&self, title: &str) -> Option<&Embed> {
        self.document.embeds.iter().find(|e| e.title == title)
    }
}

/// Assemble the notification for a captured event.
pub fn compose(event: &CapturedEvent, username: &str) -> Notification {
    let color = event.level.color();
    let fields = event.request.as_ref().map(request_fields).unwrap_or_default();

    let mut embeds = vec![
        info_embed(event, color),
        Embed {
            title: REQUEST_PAYLOAD_TITLE.to_string(),
            description: None,
            fields: Some(fields),
            color,
            timestamp: None,
        },
    ];

    let attachment = if event.message.len() > MAX_INLINE_MESSAGE_LEN {
        Some(Attachment {
            file_name: ATTACHMENT_FILE_NAME.to_string(),
            content: Bytes::from(event.message.clone()),
        })
    } else {
        embeds.push(Embed {
            title: MESSAGE_TITLE.to_string(),
            description: Some(fence(&event.message)),
            fields: None,
            color,
            timestamp: None,
        });
        None
    };

    Notification {
        document: NotificationDocument {
            username: username.to_string(),
            embeds,
        },
        attachment,
    }
}

fn info_embed(event: &CapturedEvent, color: u32) -> Embed {
    Embed {
        title: event.level.as_str().to_uppercase(),
        description: Some(event.error.clone().unwrap_or_default()),
        fields: None,
        color,
        timestamp: Some(event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}
