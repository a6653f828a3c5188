//! Synchronous client core for the GitHub REST API.
//!
//! # Overview
//! Endpoint methods take loose arguments (`args!["alice", "app", {"state":
//! "open"}]`), resolve them against the client's defaults, whitelist and
//! validate the options, and dispatch one request through a middleware
//! stack. Responses keep the decoded JSON body together with headers and the
//! request that produced them, which is what [`PageIterator`] replays to
//! walk `Link`-header pagination.
//!
//! # Design
//! - HTTP requests and responses are plain data ([`HttpRequest`],
//!   [`HttpResponse`]); the network round-trip sits behind the [`Transport`]
//!   trait. The `ureq` feature provides a blocking implementation.
//! - Configuration is an explicit [`Configuration`] value owned by each
//!   client; there is no process-wide state.
//! - Every failure is an [`Error`]. HTTP error statuses become
//!   [`Error::Service`] with a status-specific [`ErrorKind`].

pub mod api;
pub mod arguments;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod middleware;
pub mod pagination;
pub mod params;
pub mod request;
pub mod resources;
pub mod response;
mod service_error;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod validations;

pub use api::{Api, Lookup};
pub use arguments::Arguments;
pub use auth::Credentials;
pub use client::GitHub;
pub use config::Configuration;
pub use error::{Error, ErrorKind, RequiredParamsError, Result, ServiceError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use middleware::{Middleware, Next, Stack};
pub use pagination::{PageIterator, PageLinks, Pages};
pub use params::{ParameterSet, ParameterSpec, ParameterSpecs};
pub use request::{Body, RequestEnvelope};
pub use response::{Headers, Response};
pub use serde_json::{json, Map, Value};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
