use bytes::{Buf, Bytes};
use chrono::{DateTime, Utc};
use std::fmt;
use std::io::{self, Read};

use crate::level::Level;

/// A single log event handed to [`DiscordHook::fire`](crate::hook::DiscordHook::fire).
///
/// The error text and the request payload are optional, typed slots rather
/// than entries in a dynamic field map.
pub struct LogEvent<'a> {
    pub level: Level,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub error: Option<String>,
    pub request: Option<RequestPayload<'a>>,
}

impl<'a> LogEvent<'a> {
    /// Create an event stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogEvent {
            level,
            timestamp: Utc::now(),
            message: message.into(),
            error: None,
            request: None,
        }
    }

    /// Attach an error; anything `Display` works, plain strings included.
    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_request(mut self, request: RequestPayload<'a>) -> Self {
        self.request = Some(request);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_request(&self) -> bool {
        self.request.is_some()
    }
}

impl fmt::Debug for LogEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEvent")
            .field("level", &self.level)
            .field("timestamp", &self.timestamp)
            .field("message", &self.message)
            .field("error", &self.error)
            .field("has_request", &self.has_request())
            .finish()
    }
}

/// HTTP request context attached to a log event.
pub enum RequestPayload<'a> {
    /// A live request owned by the caller. Its body is drained and restored
    /// during `fire`, so the caller can still read it afterwards.
    Live(&'a mut http::Request<RequestBody>),
    /// Request details supplied by hand.
    Manual(ManualRequest),
}

impl<'a> From<&'a mut http::Request<RequestBody>> for RequestPayload<'a> {
    fn from(request: &'a mut http::Request<RequestBody>) -> Self {
        RequestPayload::Live(request)
    }
}

impl From<ManualRequest> for RequestPayload<'_> {
    fn from(request: ManualRequest) -> Self {
        RequestPayload::Manual(request)
    }
}

/// Request details given as plain strings. Empty strings are not rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualRequest {
    pub method: String,
    pub url: String,
    pub body: String,
    pub headers: String,
}

impl ManualRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        ManualRequest {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn headers(mut self, headers: impl Into<String>) -> Self {
        self.headers = headers.into();
        self
    }
}

/// Single-consumption request body stream.
///
/// A body may be absent altogether, which is different from a present but
/// empty stream only in that there is nothing to restore after a snapshot.
#[derive(Default)]
pub struct RequestBody {
    reader: Option<Box<dyn Read + Send + Sync>>,
}

impl RequestBody {
    pub fn empty() -> Self {
        RequestBody { reader: None }
    }

    pub fn from_reader(reader: impl Read + Send + Sync + 'static) -> Self {
        RequestBody {
            reader: Some(Box::new(reader)),
        }
    }

    pub fn is_present(&self) -> bool {
        self.reader.is_some()
    }

    pub(crate) fn take_reader(&mut self) -> Option<Box<dyn Read + Send + Sync>> {
        self.reader.take()
    }
}

impl Read for RequestBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reader.as_mut() {
            Some(reader) => reader.read(buf),
            None => Ok(0),
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody")
            .field("present", &self.is_present())
            .finish()
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::from_reader(bytes.reader())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        Bytes::from(s).into()
    }
}

impl From<&'static str> for RequestBody {
    fn from(s: &'static str) -> Self {
        Bytes::from_static(s.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_slot_accepts_errors_and_strings() {
        let io_err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let event = LogEvent::new(Level::Error, "failed").with_error(io_err);
        assert_eq!(event.error(), Some("disk on fire"));

        let event = LogEvent::new(Level::Error, "failed").with_error("plain text");
        assert_eq!(event.error(), Some("plain text"));
        assert!(!event.has_request());
    }

    #[test]
    fn absent_body_reads_as_empty() {
        let mut body = RequestBody::empty();
        let mut out = Vec::new();
        body.read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
        assert!(!body.is_present());
    }

    #[test]
    fn manual_request_builder() {
        let req = ManualRequest::new("POST", "https://api.example.com/users")
            .body(r#"{"name":"John"}"#)
            .headers("Authorization: redacted");
        assert_eq!(req.method, "POST");
        assert_eq!(req.body, r#"{"name":"John"}"#);
        assert_eq!(req.headers, "Authorization: redacted");
    }
}
