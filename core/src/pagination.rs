//! `Link` header parsing and page traversal.
//!
//! # Design
//! The API paginates with a `Link` header of comma-separated
//! `<uri>; rel="name"` entries. Two grammars exist:
//!
//! - numeric: relations carry an integer `page` query parameter;
//! - cursor: relations carry a commit `sha` instead, and pages have no
//!   absolute index. Every page number then reads as [`NO_PAGE_NUMBER`] and
//!   the `sha`/`last_sha`/`top` parameters are replayed instead.
//!
//! The grammar is picked per header: any relation URI with a `sha` query
//! parameter selects the cursor grammar. Each traversal re-issues the original
//! request path, so relations that are absent never produce a request.

use serde_json::{Map, Value};
use url::Url;

use crate::api::Api;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::request::{Body, RequestEnvelope};
use crate::response::Response;

/// Page number reported for every relation under the cursor grammar.
pub const NO_PAGE_NUMBER: i64 = -1;

/// `per_page` sent when neither the request nor the link specifies one.
pub const DEFAULT_PER_PAGE: u64 = 20;

const CURSOR_PARAMS: [&str; 3] = ["sha", "last_sha", "top"];

/// Relations parsed from one `Link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub first: Option<String>,
    pub next: Option<String>,
    pub prev: Option<String>,
    pub last: Option<String>,
}

impl PageLinks {
    /// Parses a `Link` header. Unknown relations and malformed entries are
    /// skipped; absent relations stay `None`.
    pub fn parse(header: &str) -> Self {
        let mut links = Self::default();
        for entry in split_entries(header) {
            let Some((uri, params)) = entry
                .trim()
                .strip_prefix('<')
                .and_then(|rest| rest.split_once('>'))
            else {
                continue;
            };
            for rel in params.split(';').filter_map(relation_names).flatten() {
                let slot = match rel {
                    "first" => &mut links.first,
                    "next" => &mut links.next,
                    "prev" | "previous" => &mut links.prev,
                    "last" => &mut links.last,
                    _ => continue,
                };
                *slot = Some(uri.to_string());
            }
        }
        links
    }

    pub fn is_empty(&self) -> bool {
        self.uris().next().is_none()
    }

    /// Whether the relations use the `sha` cursor grammar.
    pub fn is_cursor(&self) -> bool {
        self.uris().any(|uri| query_param(uri, "sha").is_some())
    }

    fn uris(&self) -> impl Iterator<Item = &str> {
        [&self.first, &self.next, &self.prev, &self.last]
            .into_iter()
            .filter_map(|uri| uri.as_deref())
    }
}

/// Splits on commas that sit outside `<...>`.
fn split_entries(header: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_uri = false;
    let mut start = 0;
    for (index, ch) in header.char_indices() {
        match ch {
            '<' => in_uri = true,
            '>' => in_uri = false,
            ',' if !in_uri => {
                entries.push(&header[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    entries.push(&header[start..]);
    entries
}

/// Space-separated names of a `rel="..."` parameter.
fn relation_names(param: &str) -> Option<std::str::SplitWhitespace<'_>> {
    let (key, value) = param.trim().split_once('=')?;
    if !key.trim().eq_ignore_ascii_case("rel") {
        return None;
    }
    Some(value.trim().trim_matches('"').split_whitespace())
}

/// Decoded value of query parameter `name` in `uri`.
pub fn query_param(uri: &str, name: &str) -> Option<String> {
    query_map(uri).remove(name).and_then(|value| match value {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn query_map(uri: &str) -> Map<String, Value> {
    let query = match Url::parse(uri) {
        Ok(url) => url.query().map(str::to_string),
        Err(_) => uri.split_once('?').map(|(_, query)| query.to_string()),
    };
    url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

/// Relation to traverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rel {
    First,
    Next,
    Prev,
    Last,
}

/// Caller-driven traversal over the pages of one collection.
///
/// Every successful traversal refreshes the links from the new response, so
/// repeated [`PageIterator::next`] calls walk forward one page at a time.
pub struct PageIterator<'a> {
    links: PageLinks,
    api: &'a Api,
    request: RequestEnvelope,
}

#[allow(clippy::should_implement_trait)]
impl<'a> PageIterator<'a> {
    /// `request` is the envelope of the page the links came from.
    pub fn new(links: PageLinks, api: &'a Api, request: RequestEnvelope) -> Self {
        Self { links, api, request }
    }

    pub fn links(&self) -> &PageLinks {
        &self.links
    }

    pub fn first_page_uri(&self) -> Option<&str> {
        self.links.first.as_deref()
    }

    pub fn next_page_uri(&self) -> Option<&str> {
        self.links.next.as_deref()
    }

    pub fn prev_page_uri(&self) -> Option<&str> {
        self.links.prev.as_deref()
    }

    pub fn last_page_uri(&self) -> Option<&str> {
        self.links.last.as_deref()
    }

    pub fn first_page(&self) -> Option<i64> {
        self.page_number(self.first_page_uri())
    }

    pub fn next_page(&self) -> Option<i64> {
        self.page_number(self.next_page_uri())
    }

    pub fn prev_page(&self) -> Option<i64> {
        self.page_number(self.prev_page_uri())
    }

    pub fn last_page(&self) -> Option<i64> {
        self.page_number(self.last_page_uri())
    }

    pub fn has_next(&self) -> bool {
        self.links.next.is_some()
    }

    pub fn first(&mut self) -> Result<Option<Response>> {
        self.follow(Rel::First)
    }

    pub fn next(&mut self) -> Result<Option<Response>> {
        self.follow(Rel::Next)
    }

    pub fn prev(&mut self) -> Result<Option<Response>> {
        self.follow(Rel::Prev)
    }

    pub fn last(&mut self) -> Result<Option<Response>> {
        self.follow(Rel::Last)
    }

    /// Requests page `number` with the numeric grammar. Returns `None`
    /// without a request when neither `first` nor `last` is known.
    pub fn get_page(&mut self, number: u64) -> Result<Option<Response>> {
        let Some(uri) = self.first_page_uri().or(self.last_page_uri()) else {
            return Ok(None);
        };
        let mut params = self.base_params(uri);
        params.retain(|key, _| !CURSOR_PARAMS.contains(&key.as_str()));
        params.insert("page".to_string(), Value::from(number));
        self.fetch(params).map(Some)
    }

    /// Consumes the iterator into a std iterator over every following page.
    pub fn pages(self) -> Pages<'a> {
        Pages { inner: self, done: false }
    }

    fn uri(&self, rel: Rel) -> Option<&str> {
        match rel {
            Rel::First => self.first_page_uri(),
            Rel::Next => self.next_page_uri(),
            Rel::Prev => self.prev_page_uri(),
            Rel::Last => self.last_page_uri(),
        }
    }

    fn page_number(&self, uri: Option<&str>) -> Option<i64> {
        let uri = uri?;
        if self.links.is_cursor() {
            return Some(NO_PAGE_NUMBER);
        }
        query_param(uri, "page").and_then(|page| page.parse().ok())
    }

    fn follow(&mut self, rel: Rel) -> Result<Option<Response>> {
        let Some(uri) = self.uri(rel).map(str::to_string) else {
            return Ok(None);
        };
        let mut params = self.base_params(&uri);
        if self.links.is_cursor() {
            let link = query_map(&uri);
            params.retain(|key, _| key != "page");
            let sha = link.get("sha").cloned().unwrap_or(Value::Null);
            let last_sha = link.get("last_sha").cloned().unwrap_or_else(|| sha.clone());
            let top = link
                .get("top")
                .or_else(|| self.request.query.get("sha"))
                .cloned()
                .unwrap_or_else(|| sha.clone());
            params.insert("sha".to_string(), sha);
            params.insert("last_sha".to_string(), last_sha);
            params.insert("top".to_string(), top);
        } else if let Some(page) = self.page_number(Some(&uri)) {
            params.insert("page".to_string(), Value::from(page));
        }
        self.fetch(params).map(Some)
    }

    /// Original query overlaid with the link's query, `per_page` defaulted.
    fn base_params(&self, uri: &str) -> Map<String, Value> {
        let mut params = self.request.query.clone();
        params.extend(query_map(uri));
        params
            .entry("per_page")
            .or_insert_with(|| Value::from(DEFAULT_PER_PAGE));
        params
    }

    fn fetch(&mut self, params: Map<String, Value>) -> Result<Response> {
        let mut request = self.request.clone().with_query(params);
        request.method = HttpMethod::Get;
        request.body = Body::Empty;
        let response = self.api.execute(request)?;
        self.links = response.links();
        self.request = response.request().clone();
        Ok(response)
    }
}

/// Iterator yielding each page after the current one. It stops after the
/// last page or after the first failed request.
pub struct Pages<'a> {
    inner: PageIterator<'a>,
    done: bool,
}

impl Iterator for Pages<'_> {
    type Item = Result<Response>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let page = self.inner.next().transpose();
        self.done = !matches!(page, Some(Ok(_)));
        page
    }
}
