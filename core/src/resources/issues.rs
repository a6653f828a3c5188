use serde_json::{Map, Value};

use crate::api::Api;
use crate::error::Result;
use crate::filter::permit_in_place;
use crate::request::build_path;
use crate::resources::{with_paging, DIRECTIONS};
use crate::response::Response;
use crate::validations::{assert_required, assert_valid_values};

const LIST_OPTIONS: &[&str] = &[
    "filter",
    "milestone",
    "state",
    "assignee",
    "creator",
    "mentioned",
    "labels",
    "sort",
    "direction",
    "since",
];

const WRITE_OPTIONS: &[&str] = &["title", "body", "assignee", "assignees", "milestone", "labels", "state"];

const VALID: &[(&str, &[&str])] = &[
    ("filter", &["assigned", "created", "mentioned", "subscribed", "all"]),
    ("state", &["open", "closed", "all"]),
    ("sort", &["created", "updated", "comments"]),
    ("direction", DIRECTIONS),
];

/// Issue endpoints of a single repository.
#[derive(Debug, Clone, Copy)]
pub struct Issues<'a> {
    api: &'a Api,
}

impl<'a> Issues<'a> {
    pub(crate) fn new(api: &'a Api) -> Self {
        Self { api }
    }

    /// `GET /repos/:user/:repo/issues`
    ///
    /// Unknown options are dropped before the request is built; a known
    /// option with an unknown value is a validation error.
    pub fn list_repo(&self, args: &[Value]) -> Result<Response> {
        let mut arguments = self.api.arguments(args, &["user", "repo"])?;
        let path = build_path("/repos/:user/:repo/issues", &arguments)?;
        let params = arguments.params_mut();
        permit_in_place(&with_paging(LIST_OPTIONS), params);
        assert_valid_values(VALID, params)?;
        self.api.get_collection(&path, arguments.into_params())
    }

    /// `GET /repos/:user/:repo/issues/:number`
    pub fn get(&self, args: &[Value]) -> Result<Response> {
        let arguments = self.api.arguments(args, &["user", "repo", "number"])?;
        let path = build_path("/repos/:user/:repo/issues/:number", &arguments)?;
        self.api.get_request(&path, Map::new())
    }

    /// `POST /repos/:user/:repo/issues`; `title` is mandatory.
    pub fn create(&self, args: &[Value]) -> Result<Response> {
        let mut arguments = self.api.arguments(args, &["user", "repo"])?;
        let path = build_path("/repos/:user/:repo/issues", &arguments)?;
        let params = arguments.params_mut();
        permit_in_place(WRITE_OPTIONS, params);
        assert_required(&["title"], params)?;
        self.api.post_request(&path, arguments.into_params())
    }

    /// `PATCH /repos/:user/:repo/issues/:number`
    pub fn edit(&self, args: &[Value]) -> Result<Response> {
        let mut arguments = self.api.arguments(args, &["user", "repo", "number"])?;
        let path = build_path("/repos/:user/:repo/issues/:number", &arguments)?;
        let params = arguments.params_mut();
        permit_in_place(WRITE_OPTIONS, params);
        assert_valid_values(&VALID[1..2], params)?;
        self.api.patch_request(&path, arguments.into_params())
    }
}
