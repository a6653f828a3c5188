//! Maps failed HTTP round-trips onto typed service errors.
//!
//! The status table is exact; any other 4xx/5xx status falls back to
//! [`ErrorKind::Service`]. Messages are assembled from the JSON error body
//! the API returns (`message`, `error`, `errors`, `documentation_url`).

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::http::{find_header, HttpMethod};

/// Status-derived category of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    Conflict,
    UnsupportedMediaType,
    UnprocessableEntity,
    UnavailableForLegalReasons,
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    /// Any 4xx/5xx status without a dedicated kind.
    Service,
}

impl ErrorKind {
    /// Kind for `status`, or `None` when the status is not an error.
    pub fn from_status(status: u16) -> Option<Self> {
        let kind = match status {
            400 => ErrorKind::BadRequest,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            405 => ErrorKind::MethodNotAllowed,
            406 => ErrorKind::NotAcceptable,
            409 => ErrorKind::Conflict,
            414 => ErrorKind::UnsupportedMediaType,
            422 => ErrorKind::UnprocessableEntity,
            451 => ErrorKind::UnavailableForLegalReasons,
            500 => ErrorKind::InternalServerError,
            501 => ErrorKind::NotImplemented,
            502 => ErrorKind::BadGateway,
            503 => ErrorKind::ServiceUnavailable,
            400..=599 => ErrorKind::Service,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A completed request whose response status was 4xx or 5xx.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ServiceError {
    kind: ErrorKind,
    status: u16,
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
    message: String,
}

impl ServiceError {
    /// Builds the error for a failed response, or `None` if `status` is not
    /// an error status.
    pub fn from_parts(
        method: HttpMethod,
        url: &str,
        status: u16,
        headers: Vec<(String, String)>,
        body: Option<Value>,
        raw_body: &str,
    ) -> Option<Self> {
        let kind = ErrorKind::from_status(status)?;
        let summary = match &body {
            Some(value) => format_body(value),
            None => raw_body.trim().to_string(),
        };
        let message = format!("{method} {url}: {status} - {summary}");
        Some(Self {
            kind,
            status,
            method,
            url: url.to_string(),
            headers,
            body,
            message,
        })
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn format_body(body: &Value) -> String {
    let object = match body {
        Value::Object(object) => object,
        Value::String(text) => return text.clone(),
        Value::Null => return String::new(),
        other => return other.to_string(),
    };

    let mut lines = Vec::new();
    lines.push(
        object
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    );
    if let Some(error) = object.get("error") {
        lines.push(format!("Error: {}", scalar_text(error)));
    }
    if let Some(errors) = object.get("errors").and_then(Value::as_array) {
        lines.push("Errors:".to_string());
        lines.extend(errors.iter().map(format_error_entry));
    }
    if let Some(url) = object.get("documentation_url").and_then(Value::as_str) {
        lines.push(format!("See: {url}"));
    }
    lines.join("\n")
}

fn format_error_entry(entry: &Value) -> String {
    let Value::Object(fields) = entry else {
        return format!("Error: {}", scalar_text(entry));
    };
    let described: Vec<String> = ["resource", "code", "field"]
        .iter()
        .filter_map(|key| fields.get(*key).map(|value| format!("{key}: {}", scalar_text(value))))
        .collect();
    if described.is_empty() {
        let message = fields.get("message").map(scalar_text).unwrap_or_default();
        format!("Error: {message}")
    } else {
        format!("Error: {}", described.join(", "))
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
