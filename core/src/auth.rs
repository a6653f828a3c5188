//! Credential attachment.
//!
//! An OAuth token is sent twice: as `Authorization: token <value>` and as the
//! `access_token` query parameter, which older API versions still read.

use base64::Engine;
use serde_json::Value;
use url::Url;

use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::middleware::{Middleware, Next};
use crate::request::RequestEnvelope;
use crate::response::Response;

/// What the client authenticates with, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    OAuthToken(String),
    /// `login:password`.
    Basic(String),
    /// OAuth application keys, sent as query parameters.
    Application { client_id: String, client_secret: String },
    None,
}

/// Middleware attaching [`Credentials`] to every request.
#[derive(Debug, Clone)]
pub struct Authentication {
    credentials: Credentials,
}

impl Authentication {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    fn apply(&self, request: &mut RequestEnvelope) {
        match &self.credentials {
            Credentials::OAuthToken(token) => {
                request.set_header("Authorization", &format!("token {token}"));
                request.query.insert("access_token".to_string(), Value::from(token.as_str()));
            }
            Credentials::Basic(pair) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(pair.as_bytes());
                request.set_header("Authorization", &format!("Basic {encoded}"));
            }
            Credentials::Application {
                client_id,
                client_secret,
            } => {
                request.query.insert("client_id".to_string(), Value::from(client_id.as_str()));
                request
                    .query
                    .insert("client_secret".to_string(), Value::from(client_secret.as_str()));
            }
            Credentials::None => {}
        }
    }
}

impl Middleware for Authentication {
    fn handle(&self, mut request: RequestEnvelope, next: Next<'_>) -> Result<Response> {
        if request.authenticated {
            self.apply(&mut request);
        }
        next.run(request)
    }
}

/// Web-flow URL a user visits to grant the configured application access.
pub fn authorize_url(config: &Configuration, scopes: &[&str], redirect_uri: Option<&str>) -> Result<String> {
    let client_id = config
        .client_id
        .as_deref()
        .ok_or_else(|| Error::Config("client_id is required to build an authorize url".to_string()))?;
    let site = config.site.trim_end_matches('/');
    let mut url = Url::parse(&format!("{site}/login/oauth/authorize"))
        .map_err(|err| Error::Config(format!("site `{}`: {err}", config.site)))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("client_id", client_id);
        if !scopes.is_empty() {
            query.append_pair("scope", &scopes.join(","));
        }
        if let Some(redirect_uri) = redirect_uri {
            query.append_pair("redirect_uri", redirect_uri);
        }
    }
    Ok(url.into())
}
