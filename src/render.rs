//! Human-readable rendering of request payloads.
//!
//! Rendering never fails: malformed bodies fall back to raw text or to the
//! parser's error message, and unknown or oversized bodies are left out.

use bytes::{Buf, Bytes};
use mime::Mime;
use multipart::server::Multipart;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::{self, Read};

use crate::snapshot::{LiveSnapshot, RequestSnapshot};

/// In-memory budget for non-file multipart values.
pub const MULTIPART_MEMORY_LIMIT: u64 = 32 << 20;

/// Bodies of unrecognised content types are rendered only up to this size.
pub const MAX_RAW_BODY_LEN: usize = 1024;

/// One `name`/`value` pair of the request payload section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedField {
    pub name: String,
    pub value: String,
}

impl RenderedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        RenderedField {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Wrap `text` in a code block, keeping a space before the closing fence.
pub fn fence(text: &str) -> String {
    format!("```{text} ```")
}

fn fence_tight(text: &str) -> String {
    format!("```{text}```")
}

/// Build the request payload fields for a snapshotted request.
pub fn request_fields(request: &RequestSnapshot) -> Vec<RenderedField> {
    match request {
        RequestSnapshot::Live(live) => live_fields(live),
        RequestSnapshot::Manual(manual) => {
            let mut fields = Vec::new();
            for (name, value) in [
                ("Method", &manual.method),
                ("URL", &manual.url),
                ("Body", &manual.body),
                ("Headers", &manual.headers),
            ] {
                if !value.is_empty() {
                    fields.push(RenderedField::new(name, fence(value)));
                }
            }
            fields
        }
    }
}

fn live_fields(live: &LiveSnapshot) -> Vec<RenderedField> {
    let mut fields = vec![
        RenderedField::new("Method", fence(live.method.as_str())),
        RenderedField::new("URL", fence(&live.uri.to_string())),
    ];
    if let Some(body) = render_body(live.content_type(), &live.body) {
        fields.push(RenderedField::new("Body", body));
    }
    fields
}

/// Render `body` according to `content_type`, or `None` when there is
/// nothing worth showing.
pub fn render_body(content_type: &str, body: &Bytes) -> Option<String> {
    if content_type.contains("application/json") {
        Some(fence(&String::from_utf8_lossy(body)))
    } else if content_type.contains("multipart/form-data") {
        render_multipart(content_type, body)
    } else if content_type.contains("application/x-www-form-urlencoded") {
        render_urlencoded(body)
    } else if !body.is_empty() && body.len() <= MAX_RAW_BODY_LEN {
        Some(fence(&String::from_utf8_lossy(body)))
    } else {
        None
    }
}

fn render_multipart(content_type: &str, body: &Bytes) -> Option<String> {
    match parse_multipart(content_type, body.clone().reader()) {
        Ok(form) => serde_json::to_string_pretty(&form.to_json())
            .ok()
            .map(|json| fence_tight(&json)),
        Err(MultipartError::NotMultipart) => None,
        Err(e) => Some(fence_tight(&e.to_string())),
    }
}

fn render_urlencoded(body: &Bytes) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let raw = String::from_utf8_lossy(body);
    match parse_urlencoded(&raw) {
        Ok(form) => serde_json::to_string_pretty(&form)
            .ok()
            .map(|json| fence_tight(&json)),
        Err(_) => Some(fence(&raw)),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MultipartError {
    #[error("request Content-Type isn't multipart/form-data")]
    NotMultipart,

    #[error("no multipart boundary param in Content-Type")]
    MissingBoundary,

    #[error("multipart: message too large")]
    TooLarge,

    #[error("multipart: {0}")]
    Read(#[from] io::Error),
}

/// Field and file summary of a multipart form.
#[derive(Debug, Default, PartialEq)]
pub struct MultipartSummary {
    pub values: BTreeMap<String, Vec<String>>,
    pub files: BTreeMap<String, Vec<FileSummary>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub filename: String,
    pub size: u64,
}

impl FileSummary {
    fn size_kb(&self) -> String {
        format!("{:.2} KB", self.size as f64 / 1024.0)
    }
}

impl MultipartSummary {
    /// `form_fields` and `uploaded_files`, each omitted when empty. Keys
    /// with a single entry collapse to a scalar.
    pub fn to_json(&self) -> Value {
        let mut combined = Map::new();

        if !self.values.is_empty() {
            let fields = self
                .values
                .iter()
                .map(|(key, values)| {
                    let value = match values.as_slice() {
                        [single] => Value::from(single.clone()),
                        many => Value::from(many.to_vec()),
                    };
                    (key.clone(), value)
                })
                .collect::<Map<_, _>>();
            combined.insert("form_fields".to_string(), Value::Object(fields));
        }

        if !self.files.is_empty() {
            let files = self
                .files
                .iter()
                .map(|(key, files)| {
                    let mut info = Map::new();
                    match files.as_slice() {
                        [single] => {
                            info.insert("filename".into(), single.filename.clone().into());
                            info.insert("size".into(), single.size_kb().into());
                        }
                        many => {
                            let names: Vec<String> = many.iter().map(|f| f.filename.clone()).collect();
                            let sizes: Vec<String> = many.iter().map(FileSummary::size_kb).collect();
                            info.insert("filename".into(), names.into());
                            info.insert("size".into(), sizes.into());
                        }
                    }
                    (key.clone(), Value::Object(info))
                })
                .collect::<Map<_, _>>();
            combined.insert("uploaded_files".to_string(), Value::Object(files));
        }

        Value::Object(combined)
    }
}

/// Enumerate the fields and files of a `multipart/form-data` body.
///
/// File contents are counted, not kept. Non-file values share a budget of
/// [`MULTIPART_MEMORY_LIMIT`] bytes.
pub fn parse_multipart(content_type: &str, body: impl Read) -> Result<MultipartSummary, MultipartError> {
    let media_type: Mime = content_type.parse().map_err(|_| MultipartError::NotMultipart)?;
    if media_type.type_() != mime::MULTIPART || media_type.subtype() != mime::FORM_DATA {
        return Err(MultipartError::NotMultipart);
    }
    let boundary = media_type
        .get_param("boundary")
        .ok_or(MultipartError::MissingBoundary)?;

    let mut multipart = Multipart::with_body(body, boundary.as_str());
    let mut summary = MultipartSummary::default();
    let mut remaining = MULTIPART_MEMORY_LIMIT;

    while let Some(mut entry) = multipart.read_entry()? {
        let name = entry.headers.name.to_string();
        match entry.headers.filename.clone().filter(|f| !f.is_empty()) {
            Some(filename) => {
                let size = io::copy(&mut entry.data, &mut io::sink())?;
                summary
                    .files
                    .entry(name)
                    .or_default()
                    .push(FileSummary { filename, size });
            }
            None => {
                let mut buf = Vec::new();
                (&mut entry.data).take(remaining + 1).read_to_end(&mut buf)?;
                let len = buf.len() as u64;
                if len > remaining {
                    return Err(MultipartError::TooLarge);
                }
                remaining -= len;
                summary
                    .values
                    .entry(name)
                    .or_default()
                    .push(String::from_utf8_lossy(&buf).into_owned());
            }
        }
    }

    Ok(summary)
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FormDecodeError {
    #[error("invalid semicolon separator in query")]
    Semicolon,

    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),
}

/// Decode an `application/x-www-form-urlencoded` body into key → values.
///
/// Every pair is decoded; the first error, if any, is returned. Semicolon
/// separators and malformed `%` escapes are rejected so the caller can fall
/// back to the raw body, which lenient form decoders would hide.
pub fn parse_urlencoded(body: &str) -> Result<BTreeMap<String, Vec<String>>, FormDecodeError> {
    let mut form: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut first_err = None;

    for pair in body.split('&') {
        if pair.is_empty() {
            continue;
        }
        if pair.contains(';') {
            first_err.get_or_insert(FormDecodeError::Semicolon);
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match (unescape(key), unescape(value)) {
            (Ok(key), Ok(value)) => form.entry(key).or_default().push(value),
            (Err(e), _) | (_, Err(e)) => {
                first_err.get_or_insert(e);
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(form),
    }
}

fn unescape(s: &str) -> Result<String, FormDecodeError> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() >= i + 3
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(FormDecodeError::InvalidEscape(
                    String::from_utf8_lossy(&bytes[i..end]).into_owned(),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    let plus_decoded = s.replace('+', " ");
    let decoded = urlencoding::decode_binary(plus_decoded.as_bytes());
    Ok(String::from_utf8_lossy(&decoded).into_owned())
}
