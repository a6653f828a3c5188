use serde_json::Value;

use crate::api::Api;
use crate::error::Result;
use crate::filter::permit_in_place;
use crate::request::build_path;
use crate::resources::{with_paging, DIRECTIONS};
use crate::response::Response;
use crate::validations::assert_valid_values;

/// Repository endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Repos<'a> {
    api: &'a Api,
}

impl<'a> Repos<'a> {
    pub(crate) fn new(api: &'a Api) -> Self {
        Self { api }
    }

    /// `GET /users/:user/repos`
    pub fn list_for_user(&self, args: &[Value]) -> Result<Response> {
        let mut arguments = self.api.arguments(args, &["user"])?;
        let path = build_path("/users/:user/repos", &arguments)?;
        let params = arguments.params_mut();
        permit_in_place(&with_paging(&["type", "sort", "direction"]), params);
        assert_valid_values(
            &[
                ("type", &["all", "owner", "member"]),
                ("sort", &["created", "updated", "pushed", "full_name"]),
                ("direction", DIRECTIONS),
            ],
            params,
        )?;
        self.api.get_collection(&path, arguments.into_params())
    }

    /// `GET /repos/:user/:repo`
    pub fn get(&self, args: &[Value]) -> Result<Response> {
        let arguments = self.api.arguments(args, &["user", "repo"])?;
        let path = build_path("/repos/:user/:repo", &arguments)?;
        self.api.get_request(&path, Default::default())
    }

    /// `GET /repos/:user/:repo/branches`
    pub fn branches(&self, args: &[Value]) -> Result<Response> {
        self.list("/repos/:user/:repo/branches", &["protected"], args)
    }

    /// `GET /repos/:user/:repo/contributors`
    pub fn contributors(&self, args: &[Value]) -> Result<Response> {
        self.list("/repos/:user/:repo/contributors", &["anon"], args)
    }

    /// `GET /repos/:user/:repo/commits`. Paginated by commit SHA rather
    /// than page number.
    pub fn commits(&self, args: &[Value]) -> Result<Response> {
        self.list(
            "/repos/:user/:repo/commits",
            &["sha", "path", "author", "since", "until", "last_sha", "top"],
            args,
        )
    }

    fn list(&self, template: &str, permitted: &[&str], args: &[Value]) -> Result<Response> {
        let mut arguments = self.api.arguments(args, &["user", "repo"])?;
        let path = build_path(template, &arguments)?;
        permit_in_place(&with_paging(permitted), arguments.params_mut());
        self.api.get_collection(&path, arguments.into_params())
    }
}
