//! Wrapped API responses.
//!
//! # Design
//! [`Response`] keeps the decoded JSON body next to the status, headers and the
//! envelope that produced it, so pagination can replay the request. A body
//! that is empty or not valid JSON decodes to `None` rather than failing;
//! callers must tolerate bodiless successes such as `204 No Content`.

use std::ops::Index;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::Api;
use crate::error::{Error, Result};
use crate::http::{find_header, HttpResponse};
use crate::pagination::{PageIterator, PageLinks};
use crate::request::RequestEnvelope;

static NULL: Value = Value::Null;

/// Response headers with accessors for the ones the API documents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new(headers: Vec<(String, String)>) -> Self {
        Self(headers)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        find_header(&self.0, name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn to_vec(&self) -> Vec<(String, String)> {
        self.0.clone()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get("Content-Type")
    }

    pub fn content_length(&self) -> Option<u64> {
        self.number("Content-Length")
    }

    pub fn etag(&self) -> Option<&str> {
        self.get("ETag")
    }

    pub fn ratelimit_limit(&self) -> Option<u64> {
        self.number("X-RateLimit-Limit")
    }

    pub fn ratelimit_remaining(&self) -> Option<u64> {
        self.number("X-RateLimit-Remaining")
    }

    /// Epoch second at which the rate-limit window resets.
    pub fn ratelimit_reset(&self) -> Option<u64> {
        self.number("X-RateLimit-Reset")
    }

    pub fn location(&self) -> Option<&str> {
        self.get("Location")
    }

    pub fn server(&self) -> Option<&str> {
        self.get("Server")
    }

    pub fn date(&self) -> Option<&str> {
        self.get("Date")
    }

    pub fn link(&self) -> Option<&str> {
        self.get("Link")
    }

    fn number(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(|value| value.trim().parse().ok())
    }
}

/// A received response with its decoded body.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    url: String,
    headers: Headers,
    body: Option<Value>,
    raw_body: String,
    request: RequestEnvelope,
}

impl Response {
    pub fn new(response: HttpResponse, url: String, request: RequestEnvelope) -> Self {
        let body = decode(&response.body);
        Self {
            status: response.status,
            url,
            headers: Headers::new(response.headers),
            body,
            raw_body: response.body,
            request,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Final URL the response came from.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn into_body(self) -> Option<Value> {
        self.body
    }

    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    /// Envelope that produced this response.
    pub fn request(&self) -> &RequestEnvelope {
        &self.request
    }

    pub(crate) fn set_request(&mut self, request: RequestEnvelope) {
        self.request = request;
    }

    pub(crate) fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// Maps the body onto a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let body = self.body.clone().unwrap_or(Value::Null);
        serde_json::from_value(body).map_err(|err| Error::Serialization(err.to_string()))
    }

    /// Object field or array element of the body.
    pub fn get<I: serde_json::value::Index>(&self, index: I) -> Option<&Value> {
        self.body.as_ref().and_then(|body| body.get(index))
    }

    /// Elements of an array body; empty for anything else.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items().iter()
    }

    pub fn first(&self) -> Option<&Value> {
        self.items().first()
    }

    pub fn last(&self) -> Option<&Value> {
        self.items().last()
    }

    /// Element count of an array body, or field count of an object body.
    pub fn len(&self) -> usize {
        match &self.body {
            Some(Value::Array(items)) => items.len(),
            Some(Value::Object(fields)) => fields.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn links(&self) -> PageLinks {
        self.headers.link().map(PageLinks::parse).unwrap_or_default()
    }

    pub fn has_next_page(&self) -> bool {
        self.links().next.is_some()
    }

    /// Page number of the `last` relation, when the response is paginated.
    pub fn count_pages(&self) -> Option<u64> {
        self.links().last.as_deref().and_then(|uri| {
            crate::pagination::query_param(uri, "page").and_then(|page| page.parse().ok())
        })
    }

    /// Iterator over the neighbouring pages, issuing requests through `api`.
    pub fn page_iterator<'a>(&self, api: &'a Api) -> PageIterator<'a> {
        PageIterator::new(self.links(), api, self.request.clone())
    }

    fn items(&self) -> &[Value] {
        match &self.body {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }
}

/// Two responses are equal only when both have a body and the bodies match.
impl PartialEq for Response {
    fn eq(&self, other: &Self) -> bool {
        matches!((&self.body, &other.body), (Some(left), Some(right)) if left == right)
    }
}

impl Index<usize> for Response {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.get(index).unwrap_or(&NULL)
    }
}

impl Index<&str> for Response {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl<'a> IntoIterator for &'a Response {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn decode(raw: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok()
}
