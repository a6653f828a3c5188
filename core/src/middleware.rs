//! Ordered request/response pipeline.
//!
//! # Design
//! Each [`Middleware`] receives the envelope plus a [`Next`] handle to the rest
//! of the chain, so it can rewrite the request, inspect the response, or call
//! further down more than once (redirects). The bottom of the chain encodes
//! the envelope into an [`crate::HttpRequest`], sends it through the
//! [`Transport`] and wraps the result in a [`Response`].
//!
//! Default order, outermost first:
//! `RaiseError`, `FollowRedirects`, `DefaultHeaders`, `Authentication`,
//! `JsonEncoder`, `Logger`.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::Authentication;
use crate::config::Configuration;
use crate::error::{Error, Result, ServiceError};
use crate::http::{HttpMethod, Transport};
use crate::request::{Body, RequestEnvelope};
use crate::response::Response;

/// Hops followed before [`Error::RedirectLimitReached`].
pub const MAX_REDIRECTS: usize = 3;

pub trait Middleware: Send + Sync {
    fn handle(&self, request: RequestEnvelope, next: Next<'_>) -> Result<Response>;
}

/// The remainder of the chain below the current middleware.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Arc<dyn Middleware>],
    endpoint: &'a Url,
    transport: &'a dyn Transport,
}

impl Next<'_> {
    /// Base URL relative paths resolve against.
    pub fn endpoint(&self) -> &Url {
        self.endpoint
    }

    pub fn run(self, request: RequestEnvelope) -> Result<Response> {
        match self.rest.split_first() {
            Some((layer, rest)) => layer.handle(request, Next { rest, ..self }),
            None => {
                let http = request.to_http(self.endpoint)?;
                let response = self.transport.send(&http)?;
                Ok(Response::new(response, http.url, request))
            }
        }
    }
}

/// A middleware chain in front of a transport.
#[derive(Clone, Default)]
pub struct Stack {
    layers: Vec<Arc<dyn Middleware>>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chain for `config`.
    pub fn for_config(config: &Configuration) -> Self {
        let mut stack = Self::new().with(RaiseError);
        if config.follow_redirects {
            stack = stack.with(FollowRedirects::new(MAX_REDIRECTS));
        }
        stack
            .with(DefaultHeaders::new(config))
            .with(Authentication::new(config.credentials()))
            .with(JsonEncoder)
            .with(Logger)
    }

    /// Appends `layer` below every layer added so far.
    pub fn with(mut self, layer: impl Middleware + 'static) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn run(&self, request: RequestEnvelope, endpoint: &Url, transport: &dyn Transport) -> Result<Response> {
        Next {
            rest: &self.layers,
            endpoint,
            transport,
        }
        .run(request)
    }
}

/// Turns 4xx/5xx responses into [`Error::Service`].
#[derive(Debug, Clone, Copy)]
pub struct RaiseError;

impl Middleware for RaiseError {
    fn handle(&self, request: RequestEnvelope, next: Next<'_>) -> Result<Response> {
        let allowed = request.allowed_statuses.clone();
        let response = next.run(request)?;
        if allowed.contains(&response.status()) {
            return Ok(response);
        }
        match ServiceError::from_parts(
            response.request().method,
            response.url(),
            response.status(),
            response.headers().to_vec(),
            response.body().cloned(),
            response.raw_body(),
        ) {
            Some(err) => Err(err.into()),
            None => Ok(response),
        }
    }
}

/// Re-issues a GET to the `Location` of 3xx responses.
#[derive(Debug, Clone, Copy)]
pub struct FollowRedirects {
    limit: usize,
}

impl FollowRedirects {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Middleware for FollowRedirects {
    fn handle(&self, request: RequestEnvelope, next: Next<'_>) -> Result<Response> {
        let mut response = next.run(request)?;
        let mut hops = 0;
        while (300..400).contains(&response.status()) {
            let Some(location) = response.headers().location().map(str::to_string) else {
                break;
            };
            if hops == self.limit {
                return Err(Error::RedirectLimitReached {
                    location,
                    limit: self.limit,
                });
            }
            hops += 1;
            warn!(status = response.status(), %location, hop = hops, "following redirect");
            let mut redirect = RequestEnvelope::new(HttpMethod::Get, location.as_str());
            if !same_origin(next.endpoint(), &location) {
                debug!(%location, "dropping credentials for redirect to another host");
                redirect = redirect.without_credentials();
            }
            response = next.run(redirect)?;
        }
        Ok(response)
    }
}

/// Whether `location` resolves to the scheme, host and port of `endpoint`.
fn same_origin(endpoint: &Url, location: &str) -> bool {
    endpoint
        .join(location)
        .is_ok_and(|target| target.origin() == endpoint.origin())
}

/// Sets `User-Agent` and `Accept` unless the request already has them.
#[derive(Debug, Clone)]
pub struct DefaultHeaders {
    user_agent: String,
    accept: String,
}

impl DefaultHeaders {
    pub fn new(config: &Configuration) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            accept: config.accept.clone(),
        }
    }
}

impl Middleware for DefaultHeaders {
    fn handle(&self, mut request: RequestEnvelope, next: Next<'_>) -> Result<Response> {
        if request.header("User-Agent").is_none() {
            request.set_header("User-Agent", &self.user_agent);
        }
        if request.header("Accept").is_none() {
            request.set_header("Accept", &self.accept);
        }
        next.run(request)
    }
}

/// Serializes structured bodies of POST/PUT/PATCH requests.
///
/// Raw bodies pass through untouched. Structured bodies on other verbs are
/// dropped; their parameters belong in the query.
#[derive(Debug, Clone, Copy)]
pub struct JsonEncoder;

impl Middleware for JsonEncoder {
    fn handle(&self, mut request: RequestEnvelope, next: Next<'_>) -> Result<Response> {
        if let Body::Json(value) = &request.body {
            if request.method.carries_body() {
                let encoded = serde_json::to_string(value).map_err(|err| Error::Serialization(err.to_string()))?;
                request.body = Body::Raw(encoded);
                if request.header("Content-Type").is_none() {
                    request.set_header("Content-Type", "application/json");
                }
            } else {
                request.body = Body::Empty;
            }
        }
        next.run(request)
    }
}

/// Emits `tracing` events for each round-trip.
#[derive(Debug, Clone, Copy)]
pub struct Logger;

impl Middleware for Logger {
    fn handle(&self, request: RequestEnvelope, next: Next<'_>) -> Result<Response> {
        let method = request.method;
        let path = request.path.clone();
        debug!(%method, %path, "sending request");
        let started = Instant::now();
        let response = next.run(request)?;
        debug!(
            %method,
            url = response.url(),
            status = response.status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "received response"
        );
        trace!(body = response.raw_body(), "response body");
        Ok(response)
    }
}
