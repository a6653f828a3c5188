//! Entry point grouping the resource endpoints.
//!
//! # Design
//! `GitHub` owns one [`Api`] and hands out borrowed resource groups, so all
//! groups share the same configuration, credentials, defaults and transport.
//! Nothing is global: two clients with different configurations can coexist.

use crate::api::Api;
use crate::auth;
use crate::config::Configuration;
use crate::error::Result;
use crate::http::Transport;
use crate::resources::{Gists, Issues, Repos, Users};

#[derive(Debug)]
pub struct GitHub {
    api: Api,
}

impl GitHub {
    pub fn new(config: Configuration, transport: impl Transport + 'static) -> Result<Self> {
        Ok(Self {
            api: Api::new(config, transport)?,
        })
    }

    /// Client sending over a blocking `ureq` agent.
    #[cfg(feature = "ureq")]
    pub fn with_ureq(config: Configuration) -> Result<Self> {
        let transport = crate::transport::UreqTransport::for_config(&config);
        Self::new(config, transport)
    }

    pub fn from_api(api: Api) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Mutable access, e.g. to change the default `user` and `repo`.
    pub fn api_mut(&mut self) -> &mut Api {
        &mut self.api
    }

    pub fn repos(&self) -> Repos<'_> {
        Repos::new(&self.api)
    }

    pub fn issues(&self) -> Issues<'_> {
        Issues::new(&self.api)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(&self.api)
    }

    pub fn gists(&self) -> Gists<'_> {
        Gists::new(&self.api)
    }

    /// OAuth web-flow URL for the configured application.
    pub fn authorize_url(&self, scopes: &[&str], redirect_uri: Option<&str>) -> Result<String> {
        auth::authorize_url(self.api.config(), scopes, redirect_uri)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::args;
    use crate::error::Error;
    use crate::http::{HttpRequest, HttpResponse};

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<HttpRequest>>,
    }

    impl Transport for Recorder {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(HttpResponse::new(200).with_body("[]"))
        }
    }

    fn client(config: Configuration) -> (GitHub, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        (GitHub::new(config, recorder.clone()).unwrap(), recorder)
    }

    fn urls(recorder: &Recorder) -> Vec<String> {
        recorder.sent.lock().unwrap().iter().map(|request| request.url.clone()).collect()
    }

    #[test]
    fn issue_listing_filters_unknown_options() {
        let (github, recorder) = client(Configuration::new());
        github
            .issues()
            .list_repo(&args!["alice", "app", {"state": "open", "bogus": 1, "labels": ["bug", "ui"]}])
            .unwrap();
        assert_eq!(
            urls(&recorder),
            ["https://api.github.com/repos/alice/app/issues?state=open&labels=bug%2Cui"]
        );
    }

    #[test]
    fn issue_listing_rejects_unknown_state() {
        let (github, recorder) = client(Configuration::new());
        let err = github
            .issues()
            .list_repo(&args!["alice", "app", {"state": "resolved"}])
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(urls(&recorder).is_empty());
    }

    #[test]
    fn configured_user_and_repo_fill_in_missing_arguments() {
        let (github, recorder) = client(Configuration::new().with_user("alice").with_repo("app"));
        github.repos().branches(&[]).unwrap();
        github.repos().get(&args![{"user": "bob", "repo": "tool"}]).unwrap();
        assert_eq!(
            urls(&recorder),
            [
                "https://api.github.com/repos/alice/app/branches",
                "https://api.github.com/repos/bob/tool",
            ]
        );
    }

    #[test]
    fn missing_owner_fails_before_any_request() {
        let (github, recorder) = client(Configuration::new());
        assert!(matches!(github.repos().get(&[]), Err(Error::Argument(_))));
        assert!(matches!(github.repos().get(&args!["alice"]), Err(Error::Argument(_))));
        assert!(urls(&recorder).is_empty());
    }

    #[test]
    fn issue_creation_requires_a_title() {
        let (github, recorder) = client(Configuration::new());
        let err = github
            .issues()
            .create(&args!["alice", "app", {"body": "steps"}])
            .unwrap_err();
        assert!(matches!(err, Error::RequiredParams(ref missing) if missing.missing() == ["title"]));
        assert!(urls(&recorder).is_empty());
    }

    #[test]
    fn issue_edit_sends_patch_with_json_body() {
        let (github, recorder) = client(Configuration::new());
        github
            .issues()
            .edit(&args!["alice", "app", 7, {"state": "closed", "ignored": true}])
            .unwrap();
        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent[0].url, "https://api.github.com/repos/alice/app/issues/7");
        assert_eq!(sent[0].body.as_deref(), Some(r#"{"state":"closed"}"#));
    }

    #[test]
    fn gists_list_for_user_or_authenticated() {
        let (github, recorder) = client(Configuration::new());
        github.gists().list(&args![{"user": "alice", "since": "2013-01-01"}]).unwrap();
        github.gists().list(&[]).unwrap();
        assert_eq!(
            urls(&recorder),
            [
                "https://api.github.com/users/alice/gists?since=2013-01-01",
                "https://api.github.com/gists",
            ]
        );
    }

    #[test]
    fn repo_listing_validates_sort() {
        let (github, _) = client(Configuration::new());
        assert!(github.repos().list_for_user(&args!["alice", {"sort": "stars"}]).is_err());
        assert!(github.repos().list_for_user(&args!["alice", {"sort": "pushed"}]).is_ok());
    }

    #[test]
    fn authorize_url_uses_configured_client() {
        let (github, _) = client(Configuration::new().with_client("id", "secret"));
        let url = github.authorize_url(&["repo"], Some("https://example.com/cb")).unwrap();
        assert!(url.starts_with("https://github.com/login/oauth/authorize?client_id=id&scope=repo"));
        assert!(url.ends_with("redirect_uri=https%3A%2F%2Fexample.com%2Fcb"));
    }
}
