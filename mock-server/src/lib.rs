//! In-memory stand-in for the GitHub REST API.
//!
//! Serves a small fixed data set with the wire conventions the client relies
//! on: `Link` pagination (page numbers for issues, SHA cursors for commits),
//! JSON error bodies, rate-limit headers, redirects and 204/404 probes.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

/// Issues seeded into `octocat/Hello-World`; every third one is closed.
pub const ISSUE_COUNT: u64 = 45;

/// History of `master`, newest first.
pub const COMMITS: [&str; 7] = [
    "6dcb09b5b57875f334f61aebed695e2e4193db5e",
    "7638417db6d59f3c431d3e1f261cc637155684cd",
    "1acc419d4d6a9ce985db7be48c6349a0475975b5",
    "3a0f86fb8db8eea7ccbb9a95f325ddbedfb25e15",
    "553c2077f0edc3d5dc5d17262f6aa498e69d6f8e",
    "762941318ee16e59dabbacb1b4049eec22f0d303",
    "9b51d2a3d0e8f0a8c1f2a4e5b6c7d8e9f0a1b2c3",
];

pub const STARRED_GIST: &str = "aa5a315d61ae9438b18d";

const DOCS: &str = "https://developer.github.com/v3";
const DEFAULT_PER_PAGE: usize = 30;
const REPO_ID: u64 = 1296269;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: String,
}

#[derive(Debug)]
pub struct Store {
    issues: Vec<Issue>,
    following: HashSet<String>,
    starred: HashSet<String>,
}

impl Store {
    fn seeded() -> Self {
        let issues = (1..=ISSUE_COUNT)
            .map(|number| Issue {
                number,
                title: format!("Issue #{number}"),
                body: None,
                state: if number % 3 == 0 { "closed" } else { "open" }.to_string(),
            })
            .collect();
        Self {
            issues,
            following: HashSet::from(["defunkt".to_string()]),
            starred: HashSet::from([STARRED_GIST.to_string()]),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Debug, Deserialize)]
pub struct IssueQuery {
    state: Option<String>,
    page: Option<usize>,
    per_page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CommitQuery {
    sha: Option<String>,
    top: Option<String>,
    per_page: Option<usize>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/user", get(authenticated_user))
        .route("/users/{user}", get(get_user))
        .route("/user/following/{user}", get(is_following))
        .route("/gists/{id}/star", get(is_starred))
        .route("/repos/{owner}/{repo}", get(get_repo))
        .route("/repositories/{id}", get(get_repository))
        .route("/repos/{owner}/{repo}/issues", get(list_issues).post(create_issue))
        .route("/repos/{owner}/{repo}/issues/{number}", get(get_issue).patch(edit_issue))
        .route("/repos/{owner}/{repo}/commits", get(list_commits))
        .fallback(|| async { error(StatusCode::NOT_FOUND, "Not Found") })
        .layer(middleware::map_response(rate_limit_headers))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock api listening");
    }
    axum::serve(listener, app()).await
}

async fn rate_limit_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from_static("5000"));
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4999"));
    response
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"message": message, "documentation_url": DOCS}))).into_response()
}

fn base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

fn user_json(login: &str) -> Value {
    json!({"login": login, "type": "User", "url": format!("https://api.github.com/users/{login}")})
}

async fn authenticated_user(headers: HeaderMap) -> Response {
    match headers.get(header::AUTHORIZATION).and_then(|value| value.to_str().ok()) {
        Some(value) if value.starts_with("token ") || value.starts_with("Basic ") => {
            Json(user_json("octocat")).into_response()
        }
        _ => error(StatusCode::UNAUTHORIZED, "Requires authentication"),
    }
}

async fn get_user(Path(user): Path<String>) -> Response {
    match user.as_str() {
        "octocat" | "defunkt" => Json(user_json(&user)).into_response(),
        _ => error(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn is_following(State(db): State<Db>, Path(user): Path<String>) -> Response {
    if db.read().await.following.contains(&user) {
        return StatusCode::NO_CONTENT.into_response();
    }
    error(StatusCode::NOT_FOUND, "Not Found")
}

async fn is_starred(State(db): State<Db>, Path(id): Path<String>) -> Response {
    if db.read().await.starred.contains(&id) {
        return StatusCode::NO_CONTENT.into_response();
    }
    error(StatusCode::NOT_FOUND, "Not Found")
}

/// `loop/*` redirects to itself forever; `moved/*` redirects once.
async fn get_repo(headers: HeaderMap, Path((owner, repo)): Path<(String, String)>) -> Response {
    let base = base_url(&headers);
    match owner.as_str() {
        "loop" => redirect(StatusCode::FOUND, &format!("{base}/repos/{owner}/{repo}")),
        "moved" => redirect(StatusCode::MOVED_PERMANENTLY, &format!("{base}/repositories/{REPO_ID}")),
        _ => Json(json!({
            "id": REPO_ID,
            "name": repo,
            "full_name": format!("{owner}/{repo}"),
            "owner": user_json(&owner),
        }))
        .into_response(),
    }
}

fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(location) => (status, [(header::LOCATION, location)]).into_response(),
        Err(_) => error(StatusCode::INTERNAL_SERVER_ERROR, "bad redirect target"),
    }
}

async fn get_repository(Path(id): Path<u64>) -> Response {
    if id != REPO_ID {
        return error(StatusCode::NOT_FOUND, "Not Found");
    }
    Json(json!({"id": id, "name": "Hello-World", "full_name": "octocat/Hello-World"})).into_response()
}

async fn list_issues(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<IssueQuery>,
) -> Response {
    let state = query.state.unwrap_or_else(|| "open".to_string());
    if !["open", "closed", "all"].contains(&state.as_str()) {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Validation Failed");
    }
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);
    let page = query.page.unwrap_or(1).max(1);

    let store = db.read().await;
    let matching: Vec<&Issue> = store
        .issues
        .iter()
        .rev()
        .filter(|issue| state == "all" || issue.state == state)
        .collect();
    let last = matching.len().div_ceil(per_page).max(1);
    let items: Vec<&Issue> = matching.into_iter().skip((page - 1) * per_page).take(per_page).collect();

    let base = format!("{}/repos/{owner}/{repo}/issues", base_url(&headers));
    let uri = |n: usize| format!("<{base}?state={state}&page={n}&per_page={per_page}>");
    let mut links = Vec::new();
    if page < last {
        links.push(format!("{}; rel=\"next\"", uri(page + 1)));
        links.push(format!("{}; rel=\"last\"", uri(last)));
    }
    if page > 1 {
        links.push(format!("{}; rel=\"first\"", uri(1)));
        links.push(format!("{}; rel=\"prev\"", uri(page - 1)));
    }
    with_links(Json(items).into_response(), &links)
}

fn with_links(mut response: Response, links: &[String]) -> Response {
    if links.is_empty() {
        return response;
    }
    if let Ok(value) = HeaderValue::from_str(&links.join(", ")) {
        response.headers_mut().insert(header::LINK, value);
    }
    response
}

async fn create_issue(State(db): State<Db>, Json(input): Json<Value>) -> Response {
    let title = input.get("title").and_then(Value::as_str).unwrap_or_default();
    if title.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "message": "Validation Failed",
                "errors": [{"resource": "Issue", "code": "missing_field", "field": "title"}],
                "documentation_url": format!("{DOCS}/issues/#create-an-issue"),
            })),
        )
            .into_response();
    }
    let mut store = db.write().await;
    let issue = Issue {
        number: store.issues.len() as u64 + 1,
        title: title.to_string(),
        body: input.get("body").and_then(Value::as_str).map(str::to_string),
        state: "open".to_string(),
    };
    debug!(number = issue.number, "issue created");
    store.issues.push(issue.clone());
    (StatusCode::CREATED, Json(issue)).into_response()
}

async fn get_issue(State(db): State<Db>, Path((_, _, number)): Path<(String, String, u64)>) -> Response {
    let store = db.read().await;
    match store.issues.iter().find(|issue| issue.number == number) {
        Some(issue) => Json(issue.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn edit_issue(
    State(db): State<Db>,
    Path((_, _, number)): Path<(String, String, u64)>,
    Json(input): Json<Value>,
) -> Response {
    let state = input.get("state").and_then(Value::as_str);
    if state.is_some_and(|state| !["open", "closed"].contains(&state)) {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Validation Failed");
    }
    let mut store = db.write().await;
    let Some(issue) = store.issues.iter_mut().find(|issue| issue.number == number) else {
        return error(StatusCode::NOT_FOUND, "Not Found");
    };
    if let Some(title) = input.get("title").and_then(Value::as_str) {
        issue.title = title.to_string();
    }
    if let Some(body) = input.get("body").and_then(Value::as_str) {
        issue.body = Some(body.to_string());
    }
    if let Some(state) = state {
        issue.state = state.to_string();
    }
    debug!(number, "issue edited");
    Json(issue.clone()).into_response()
}

/// Cursor pagination: a page starts at `sha` and the `next` link names the
/// first commit of the following page.
async fn list_commits(
    headers: HeaderMap,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<CommitQuery>,
) -> Response {
    let start = match query.sha.as_deref() {
        None | Some("master") => 0,
        Some(sha) => match COMMITS.iter().position(|commit| *commit == sha) {
            Some(index) => index,
            None => return error(StatusCode::NOT_FOUND, &format!("No commit found for SHA: {sha}")),
        },
    };
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);
    let end = (start + per_page).min(COMMITS.len());
    let items: Vec<Value> = COMMITS[start..end]
        .iter()
        .map(|sha| json!({"sha": sha, "commit": {"message": format!("Commit {}", &sha[..7])}}))
        .collect();

    let top = query.top.or(query.sha).unwrap_or_else(|| "master".to_string());
    let base = format!("{}/repos/{owner}/{repo}/commits", base_url(&headers));
    let mut links = Vec::new();
    if end < COMMITS.len() {
        links.push(format!("<{base}?top={top}&sha={}>; rel=\"next\"", COMMITS[end]));
        links.push(format!("<{base}?sha={top}>; rel=\"first\""));
    }
    with_links(Json(items).into_response(), &links)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_mixes_open_and_closed_issues() {
        let store = Store::seeded();
        assert_eq!(store.issues.len() as u64, ISSUE_COUNT);
        assert_eq!(store.issues.iter().filter(|issue| issue.state == "closed").count(), 15);
        assert!(store.following.contains("defunkt"));
    }

    #[test]
    fn issue_body_is_optional_on_input() {
        let issue: Issue = serde_json::from_str(r#"{"number":1,"title":"t","state":"open"}"#).unwrap();
        assert_eq!(issue.body, None);
    }
}
