use bytes::{Buf, Bytes};
use chrono::{DateTime, Utc};
use http::{HeaderMap, Method, Uri};
use std::io::Read;
use tracing::warn;

use crate::level::Level;
use crate::record::{LogEvent, ManualRequest, RequestBody, RequestPayload};

/// Owned copy of a request payload, safe to move into a delivery task.
#[derive(Debug, Clone)]
pub enum RequestSnapshot {
    Live(LiveSnapshot),
    Manual(ManualRequest),
}

/// Metadata and fully buffered body of a live request.
#[derive(Debug, Clone)]
pub struct LiveSnapshot {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl LiveSnapshot {
    /// A fresh reader positioned at the start of the buffered body.
    pub fn body_reader(&self) -> impl Read {
        self.body.clone().reader()
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

/// A log event after its request payload has been snapshotted.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub error: Option<String>,
    pub request: Option<RequestSnapshot>,
}

impl LogEvent<'_> {
    /// Snapshot the request payload and detach the event from the caller.
    ///
    /// For a live request the body is read to completion and replaced with
    /// a fresh stream over the same bytes before this returns.
    pub fn capture(self) -> CapturedEvent {
        CapturedEvent {
            level: self.level,
            timestamp: self.timestamp,
            message: self.message,
            error: self.error,
            request: self.request.map(snapshot),
        }
    }
}

/// Take an independent copy of `payload`.
pub fn snapshot(payload: RequestPayload<'_>) -> RequestSnapshot {
    match payload {
        RequestPayload::Live(request) => RequestSnapshot::Live(snapshot_live(request)),
        RequestPayload::Manual(manual) => RequestSnapshot::Manual(manual),
    }
}

fn snapshot_live(request: &mut http::Request<RequestBody>) -> LiveSnapshot {
    let body = match request.body_mut().take_reader() {
        Some(mut reader) => {
            let mut buf = Vec::new();
            if let Err(e) = reader.read_to_end(&mut buf) {
                warn!(error = %e, "failed to read request body, logging it as empty");
                buf.clear();
            }
            let body = Bytes::from(buf);
            *request.body_mut() = RequestBody::from(body.clone());
            body
        }
        None => Bytes::new(),
    };

    LiveSnapshot {
        method: request.method().clone(),
        uri: request.uri().clone(),
        headers: request.headers().clone(),
        body,
    }
}
