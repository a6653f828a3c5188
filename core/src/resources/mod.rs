//! Endpoint wrappers grouped by API resource.
//!
//! # Design
//! A resource group borrows the shared [`Api`](crate::Api) and turns a call's
//! loose arguments into one request: resolve required names, build the path,
//! whitelist the remaining options, validate their values, dispatch. Groups
//! hold no state of their own and are cheap to create per call.

mod gists;
mod issues;
mod repos;
mod users;

pub use gists::Gists;
pub use issues::Issues;
pub use repos::Repos;
pub use users::Users;

/// Options every list endpoint accepts.
pub(crate) const PAGING: &[&str] = &["page", "per_page"];

pub(crate) const DIRECTIONS: &[&str] = &["asc", "desc"];

/// `PAGING` followed by `extra`.
pub(crate) fn with_paging<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    extra.iter().copied().chain(PAGING.iter().copied()).collect()
}
