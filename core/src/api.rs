//! Request dispatch shared by every resource group.
//!
//! # Design
//! `Api` owns the configuration, the transport, the middleware [`Stack`] and
//! the instance-level [`ParameterSet`] of default option values (`user`,
//! `repo`). Resource groups borrow it and call the verb helpers
//! (`get_request`, `post_request`, ...) after resolving their arguments.
//! Nothing here retries; a call either yields a [`Response`] or an error.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;
use url::Url;

use crate::arguments::Arguments;
use crate::config::Configuration;
use crate::error::Result;
use crate::http::{HttpMethod, Transport};
use crate::middleware::Stack;
use crate::params::{ParameterSet, ParameterSpecs};
use crate::request::{Body, RequestEnvelope};
use crate::response::Response;

/// Outcome of a lookup where "not found" is an expected answer.
#[derive(Debug, Clone)]
pub enum Lookup {
    Found(Response),
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Lookup::Found(response) => Some(response),
            Lookup::NotFound => None,
        }
    }
}

pub struct Api {
    config: Configuration,
    endpoint: Url,
    transport: Arc<dyn Transport>,
    stack: Stack,
    params: ParameterSet,
}

impl Api {
    /// Client for `config`, sending through `transport` with the standard
    /// middleware stack.
    pub fn new(config: Configuration, transport: impl Transport + 'static) -> Result<Self> {
        config.validate()?;
        let endpoint = config.endpoint_url()?;
        let mut params = Self::specs()?.instantiate();
        if let Some(user) = &config.user {
            params.set("user", user.as_str())?;
        }
        if let Some(repo) = &config.repo {
            params.set("repo", repo.as_str())?;
        }
        Ok(Self {
            stack: Stack::for_config(&config),
            config,
            endpoint,
            transport: Arc::new(transport),
            params,
        })
    }

    /// Options every resource group understands.
    pub fn specs() -> Result<ParameterSpecs> {
        let mut specs = ParameterSpecs::new();
        for name in ["user", "repo"] {
            specs.define(name, Value::Null, false)?;
        }
        Ok(specs)
    }

    /// Replaces the middleware stack.
    pub fn with_stack(mut self, stack: Stack) -> Self {
        self.stack = stack;
        self
    }

    crate::parameter_accessors!(params; user => set_user, repo => set_repo);

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    /// Resolves a call, falling back to this instance's defaults for
    /// required names the call leaves out.
    pub fn arguments(&self, args: &[Value], required: &[&str]) -> Result<Arguments> {
        Arguments::parse_with_defaults(args, required, Some(&self.params))
    }

    pub fn get_request(&self, path: &str, params: Map<String, Value>) -> Result<Response> {
        self.request(HttpMethod::Get, path, params)
    }

    pub fn post_request(&self, path: &str, params: Map<String, Value>) -> Result<Response> {
        self.request(HttpMethod::Post, path, params)
    }

    pub fn put_request(&self, path: &str, params: Map<String, Value>) -> Result<Response> {
        self.request(HttpMethod::Put, path, params)
    }

    pub fn patch_request(&self, path: &str, params: Map<String, Value>) -> Result<Response> {
        self.request(HttpMethod::Patch, path, params)
    }

    pub fn delete_request(&self, path: &str, params: Map<String, Value>) -> Result<Response> {
        self.request(HttpMethod::Delete, path, params)
    }

    /// Sends `params` as the query of GET/DELETE requests and as the JSON
    /// body of POST/PUT/PATCH requests.
    pub fn request(&self, method: HttpMethod, path: &str, params: Map<String, Value>) -> Result<Response> {
        self.execute(self.envelope(method, path, params))
    }

    /// GET of a list endpoint; with auto-pagination enabled every page is
    /// fetched and the bodies concatenated.
    pub fn get_collection(&self, path: &str, params: Map<String, Value>) -> Result<Response> {
        let response = self.get_request(path, params)?;
        if self.config.auto_pagination {
            return self.collect_pages(response);
        }
        Ok(response)
    }

    /// Follows `next` links from `response`, appending each page's items to
    /// its array body.
    pub fn collect_pages(&self, mut response: Response) -> Result<Response> {
        let mut items = match response.body() {
            Some(Value::Array(items)) => items.clone(),
            _ => return Ok(response),
        };
        let mut pages = response.page_iterator(self);
        let mut visited = HashSet::from([response.url().to_string()]);
        while let Some(uri) = pages.next_page_uri().map(str::to_string) {
            if !visited.insert(uri.clone()) {
                warn!(%uri, "next link repeats an earlier page, stopping");
                break;
            }
            let Some(page) = pages.next()? else {
                break;
            };
            if let Some(Value::Array(more)) = page.into_body() {
                items.extend(more);
            }
        }
        response.set_body(Value::Array(items));
        Ok(response)
    }

    /// Runs `method path` treating 404 as an answer rather than an error.
    pub fn lookup(&self, method: HttpMethod, path: &str, params: Map<String, Value>) -> Result<Lookup> {
        let response = self.execute(self.envelope(method, path, params).allowing(404))?;
        if response.status() == 404 {
            return Ok(Lookup::NotFound);
        }
        Ok(Lookup::Found(response))
    }

    /// `true` for a successful GET of `path`, `false` for 404.
    pub fn probe(&self, path: &str) -> Result<bool> {
        Ok(self.lookup(HttpMethod::Get, path, Map::new())?.is_found())
    }

    /// Sends a prepared envelope through the stack. The returned response
    /// remembers `request` as it was before any middleware touched it.
    pub fn execute(&self, request: RequestEnvelope) -> Result<Response> {
        let mut response = self.stack.run(request.clone(), &self.endpoint, &*self.transport)?;
        response.set_request(request);
        Ok(response)
    }

    fn envelope(&self, method: HttpMethod, path: &str, params: Map<String, Value>) -> RequestEnvelope {
        let request = RequestEnvelope::new(method, path);
        if method.carries_body() {
            return request.with_body(Body::Json(Value::Object(params)));
        }
        let mut query = Map::new();
        if method == HttpMethod::Get {
            if let Some(per_page) = self.config.per_page {
                query.insert("per_page".to_string(), Value::from(per_page));
            }
        }
        query.extend(params);
        request.with_query(query)
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("endpoint", &self.endpoint.as_str())
            .field("parameters", self.params.fetch_all())
            .field("middleware", &self.stack.len())
            .finish_non_exhaustive()
    }
}
