use serde_json::{Map, Value};

use crate::api::Api;
use crate::error::Result;
use crate::request::build_path;
use crate::response::Response;

/// User profile and follower endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    api: &'a Api,
}

impl<'a> Users<'a> {
    pub(crate) fn new(api: &'a Api) -> Self {
        Self { api }
    }

    /// `GET /users/:user`
    pub fn get(&self, args: &[Value]) -> Result<Response> {
        let arguments = self.api.arguments(args, &["user"])?;
        let path = build_path("/users/:user", &arguments)?;
        self.api.get_request(&path, Map::new())
    }

    /// `GET /user`, the user the credentials belong to.
    pub fn authenticated(&self) -> Result<Response> {
        self.api.get_request("/user", Map::new())
    }

    /// Whether the authenticated user follows `user`. A 404 answers `false`.
    pub fn is_following(&self, args: &[Value]) -> Result<bool> {
        let arguments = self.api.arguments(args, &["user"])?;
        let path = build_path("/user/following/:user", &arguments)?;
        self.api.probe(&path)
    }
}
