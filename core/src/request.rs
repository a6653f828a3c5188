//! One outbound call before it is turned into wire form.
//!
//! # Design
//! Middlewares see and rewrite a [`RequestEnvelope`]: query and body are
//! still structured maps, so authentication can merge `access_token` into the
//! query and the JSON encoder can decide how the body is serialized. The
//! envelope becomes an [`HttpRequest`] only at the bottom of the chain.

use serde_json::{Map, Value};
use url::Url;

use crate::arguments::Arguments;
use crate::error::{Error, Result};
use crate::http::{find_header, HttpMethod, HttpRequest};

/// Request payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Structured parameters, serialized by the JSON encoder.
    Json(Value),
    /// Pre-encoded payload sent as-is.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub method: HttpMethod,
    /// Path relative to the endpoint, or an absolute URL.
    pub path: String,
    pub query: Map<String, Value>,
    pub body: Body,
    pub headers: Vec<(String, String)>,
    /// Error statuses handed back as responses instead of errors.
    pub allowed_statuses: Vec<u16>,
    /// `false` keeps the configured credentials off this request.
    pub authenticated: bool,
}

impl RequestEnvelope {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Map::new(),
            body: Body::Empty,
            headers: Vec::new(),
            allowed_statuses: Vec::new(),
            authenticated: true,
        }
    }

    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn allowing(mut self, status: u16) -> Self {
        self.allowed_statuses.push(status);
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Replaces any existing header of the same name (case-insensitive).
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Absolute URL with the encoded query string.
    pub fn url(&self, endpoint: &Url) -> Result<String> {
        let mut url = if is_absolute(&self.path) {
            Url::parse(&self.path)
        } else {
            endpoint.join(self.path.trim_start_matches('/'))
        }
        .map_err(|err| Error::Serialization(format!("request url for `{}`: {err}", self.path)))?;

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                if let Some(value) = query_value(value) {
                    pairs.append_pair(key, &value);
                }
            }
        }
        Ok(url.into())
    }

    /// Wire form. The body must already be encoded.
    pub fn to_http(&self, endpoint: &Url) -> Result<HttpRequest> {
        let body = match &self.body {
            Body::Empty => None,
            Body::Raw(raw) => Some(raw.clone()),
            Body::Json(_) => {
                return Err(Error::Serialization(format!(
                    "{} {} has an unencoded JSON body",
                    self.method, self.path
                )))
            }
        };
        Ok(HttpRequest {
            method: self.method,
            url: self.url(endpoint)?,
            headers: self.headers.clone(),
            body,
        })
    }
}

/// Substitutes `:name` segments of `template` with escaped argument values.
///
/// Each substituted segment is percent-encoded on its own, so a value
/// containing `/` cannot change the shape of the path.
pub fn build_path(template: &str, args: &Arguments) -> Result<String> {
    let segments = template
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => args
                .str(name)
                .filter(|value| !value.is_empty())
                .map(|value| urlencoding::encode(&value).into_owned())
                .ok_or_else(|| Error::argument(format!("unresolved path placeholder `:{name}` in {template}"))),
            None => Ok(segment.to_string()),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(segments.join("/"))
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::args;

    fn endpoint() -> Url {
        Url::parse("https://api.github.com/").unwrap()
    }

    #[test]
    fn path_placeholders_are_substituted_and_escaped() {
        let args = Arguments::parse(&args!["alice", "my app", {"ref": "feature/x"}], &["user", "repo"]).unwrap();
        assert_eq!(
            build_path("/repos/:user/:repo/git/refs/:ref", &args).unwrap(),
            "/repos/alice/my%20app/git/refs/feature%2Fx"
        );
    }

    #[test]
    fn unresolved_placeholder_is_an_argument_error() {
        let args = Arguments::parse(&args!["alice"], &["user"]).unwrap();
        let err = build_path("/repos/:user/:repo", &args).unwrap_err();
        assert!(matches!(err, Error::Argument(message) if message.contains(":repo")));
    }

    #[test]
    fn url_joins_endpoint_and_encodes_query() {
        let query = json!({"state": "open", "labels": ["bug", "ui"], "page": 2, "skip": null});
        let request = RequestEnvelope::new(HttpMethod::Get, "/repos/alice/app/issues")
            .with_query(query.as_object().cloned().unwrap());
        assert_eq!(
            request.url(&endpoint()).unwrap(),
            "https://api.github.com/repos/alice/app/issues?state=open&labels=bug%2Cui&page=2"
        );
    }

    #[test]
    fn url_keeps_endpoint_path_prefix() {
        let endpoint = Url::parse("https://ghe.example.com/api/v3/").unwrap();
        let request = RequestEnvelope::new(HttpMethod::Get, "/user");
        assert_eq!(request.url(&endpoint).unwrap(), "https://ghe.example.com/api/v3/user");
    }

    #[test]
    fn absolute_paths_bypass_the_endpoint() {
        let request = RequestEnvelope::new(HttpMethod::Get, "https://uploads.github.com/x");
        assert_eq!(request.url(&endpoint()).unwrap(), "https://uploads.github.com/x");
    }

    #[test]
    fn unencoded_json_body_cannot_go_on_the_wire() {
        let request = RequestEnvelope::new(HttpMethod::Post, "/gists").with_body(Body::Json(json!({})));
        assert!(matches!(request.to_http(&endpoint()), Err(Error::Serialization(_))));
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut request = RequestEnvelope::new(HttpMethod::Get, "/").with_header("accept", "a");
        request.set_header("Accept", "b");
        assert_eq!(request.headers, vec![("Accept".to_string(), "b".to_string())]);
    }
}
