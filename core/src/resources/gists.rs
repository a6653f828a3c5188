use serde_json::{Map, Value};

use crate::api::Api;
use crate::error::Result;
use crate::filter::permit_in_place;
use crate::request::build_path;
use crate::resources::with_paging;
use crate::response::Response;

/// Gist endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Gists<'a> {
    api: &'a Api,
}

impl<'a> Gists<'a> {
    pub(crate) fn new(api: &'a Api) -> Self {
        Self { api }
    }

    /// `GET /users/:user/gists` when a `user` option is given, otherwise
    /// `GET /gists` for the authenticated user.
    pub fn list(&self, args: &[Value]) -> Result<Response> {
        let mut arguments = self.api.arguments(args, &[])?;
        let path = match arguments.str("user") {
            Some(user) if !user.is_empty() => format!("/users/{}/gists", urlencoding::encode(&user)),
            _ => "/gists".to_string(),
        };
        permit_in_place(&with_paging(&["since"]), arguments.params_mut());
        self.api.get_collection(&path, arguments.into_params())
    }

    /// `GET /gists/:id`
    pub fn get(&self, args: &[Value]) -> Result<Response> {
        let arguments = self.api.arguments(args, &["id"])?;
        let path = build_path("/gists/:id", &arguments)?;
        self.api.get_request(&path, Map::new())
    }

    /// Whether the authenticated user starred gist `id`. A 404 answers
    /// `false`.
    pub fn is_starred(&self, args: &[Value]) -> Result<bool> {
        let arguments = self.api.arguments(args, &["id"])?;
        let path = build_path("/gists/:id/star", &arguments)?;
        self.api.probe(&path)
    }
}
