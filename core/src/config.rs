//! Client configuration.
//!
//! # Design
//! `Configuration` is a plain value handed to [`crate::Api::new`]; there is no
//! process-wide default instance. It derives `Deserialize` so callers can
//! load it from whatever format they already use, and [`Configuration::from_env`]
//! covers the common environment-variable setup.

use serde::Deserialize;
use url::Url;

use crate::auth::Credentials;
use crate::error::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/";
pub const DEFAULT_SITE: &str = "https://github.com";
pub const DEFAULT_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Base URL every relative request path is joined onto.
    pub endpoint: String,
    /// Web site root, used for OAuth authorize URLs.
    pub site: String,
    pub user_agent: String,
    pub accept: String,
    pub oauth_token: Option<String>,
    /// Prebuilt `login:password` pair.
    pub basic_auth: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Page size sent with GET requests that do not set `per_page`.
    pub per_page: Option<u32>,
    /// Default owner for endpoints that take a `user`.
    pub user: Option<String>,
    /// Default repository for endpoints that take a `repo`.
    pub repo: Option<String>,
    /// Collect every page of list endpoints into one response.
    pub auto_pagination: bool,
    pub follow_redirects: bool,
    /// Whole-request timeout in seconds, honored by the bundled transport.
    pub timeout: Option<u64>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            site: DEFAULT_SITE.to_string(),
            user_agent: concat!("hub-api/", env!("CARGO_PKG_VERSION")).to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            oauth_token: None,
            basic_auth: None,
            login: None,
            password: None,
            client_id: None,
            client_secret: None,
            per_page: None,
            user: None,
            repo: None,
            auto_pagination: false,
            follow_redirects: true,
            timeout: None,
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `GITHUB_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for the `GITHUB_*` keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(endpoint) = lookup("GITHUB_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(user_agent) = lookup("GITHUB_USER_AGENT") {
            config.user_agent = user_agent;
        }
        config.oauth_token = lookup("GITHUB_TOKEN").filter(|token| !token.is_empty());
        config.login = lookup("GITHUB_LOGIN");
        config.password = lookup("GITHUB_PASSWORD");
        config
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_oauth_token(mut self, token: impl Into<String>) -> Self {
        self.oauth_token = Some(token.into());
        self
    }

    pub fn with_basic_auth(mut self, login_password: impl Into<String>) -> Self {
        self.basic_auth = Some(login_password.into());
        self
    }

    pub fn with_login(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_client(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    pub fn with_auto_pagination(mut self, enabled: bool) -> Self {
        self.auto_pagination = enabled;
        self
    }

    pub fn with_follow_redirects(mut self, enabled: bool) -> Self {
        self.follow_redirects = enabled;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Parsed `endpoint`, always ending in `/` so paths join beneath it.
    pub fn endpoint_url(&self) -> Result<Url> {
        let mut endpoint = self.endpoint.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        Url::parse(&endpoint).map_err(|err| Error::Config(format!("endpoint `{}`: {err}", self.endpoint)))
    }

    /// Rejects settings that would otherwise be ignored when credentials are
    /// picked.
    pub fn validate(&self) -> Result<()> {
        if let Some(pair) = self.basic_auth.as_deref().filter(|pair| !pair.is_empty()) {
            if !pair.contains(':') {
                return Err(Error::Config("basic_auth must be in `login:password` form".to_string()));
            }
        }
        Ok(())
    }

    /// Credentials in precedence order: token, basic auth, application keys.
    pub fn credentials(&self) -> Credentials {
        if let Some(token) = self.oauth_token.as_deref().filter(|token| !token.is_empty()) {
            return Credentials::OAuthToken(token.to_string());
        }
        if let Some(pair) = self.basic_auth.as_deref().filter(|pair| pair.contains(':')) {
            return Credentials::Basic(pair.to_string());
        }
        if let (Some(login), Some(password)) = (&self.login, &self.password) {
            return Credentials::Basic(format!("{login}:{password}"));
        }
        if let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) {
            return Credentials::Application {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            };
        }
        Credentials::None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_point_at_public_api() {
        let config = Configuration::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.user_agent.starts_with("hub-api/"));
        assert!(config.follow_redirects);
        assert_eq!(config.credentials(), Credentials::None);
    }

    #[test]
    fn token_wins_over_basic_auth() {
        let config = Configuration::new()
            .with_basic_auth("alice:secret")
            .with_oauth_token("abc123");
        assert_eq!(config.credentials(), Credentials::OAuthToken("abc123".to_string()));
    }

    #[test]
    fn basic_auth_without_separator_is_rejected() {
        let err = Configuration::new().with_basic_auth("alice").validate().unwrap_err();
        assert!(matches!(err, Error::Config(message) if message.contains("login:password")));
        assert!(Configuration::new().with_basic_auth("alice:secret").validate().is_ok());
        assert!(Configuration::new().validate().is_ok());
    }

    #[test]
    fn login_and_password_build_basic_credentials() {
        let config = Configuration::new().with_login("alice", "secret");
        assert_eq!(config.credentials(), Credentials::Basic("alice:secret".to_string()));
    }

    #[test]
    fn application_keys_are_the_last_resort() {
        let config = Configuration::new().with_client("id", "shh");
        assert!(matches!(config.credentials(), Credentials::Application { .. }));
    }

    #[test]
    fn endpoint_gains_trailing_slash() {
        let config = Configuration::new().with_endpoint("https://ghe.example.com/api/v3");
        assert_eq!(config.endpoint_url().unwrap().as_str(), "https://ghe.example.com/api/v3/");
    }

    #[test]
    fn bad_endpoint_is_a_config_error() {
        let err = Configuration::new().with_endpoint("not a url").endpoint_url().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn environment_overrides_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("GITHUB_ENDPOINT", "http://localhost:9000/"),
            ("GITHUB_TOKEN", "tok"),
        ]);
        let config = Configuration::from_lookup(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(config.endpoint, "http://localhost:9000/");
        assert_eq!(config.oauth_token.as_deref(), Some("tok"));
        assert_eq!(config.login, None);
    }

    #[test]
    fn deserializes_with_defaults_for_missing_fields() {
        let config: Configuration =
            serde_json::from_str(r#"{"oauth_token": "tok", "per_page": 50}"#).unwrap();
        assert_eq!(config.per_page, Some(50));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }
}
