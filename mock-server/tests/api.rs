use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Issue, COMMITS, STARRED_GIST};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::HOST, "api.test")
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn link(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(http::header::LINK)
        .map(|value| value.to_str().unwrap().to_string())
        .unwrap_or_default()
}

// --- issues ---

#[tokio::test]
async fn first_issue_page_links_forward_only() {
    let resp = app()
        .oneshot(get("/repos/octocat/Hello-World/issues?per_page=10"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let link = link(&resp);
    assert!(link.contains("<http://api.test/repos/octocat/Hello-World/issues?state=open&page=2&per_page=10>; rel=\"next\""));
    assert!(link.contains("page=3&per_page=10>; rel=\"last\""));
    assert!(!link.contains("rel=\"prev\""));
    let issues: Vec<Issue> = body_json(resp).await;
    assert_eq!(issues.len(), 10);
    assert!(issues.iter().all(|issue| issue.state == "open"));
    assert_eq!(issues[0].number, 44);
}

#[tokio::test]
async fn last_issue_page_links_backward_only() {
    let resp = app()
        .oneshot(get("/repos/octocat/Hello-World/issues?state=all&page=5&per_page=10"))
        .await
        .unwrap();

    let link = link(&resp);
    assert!(link.contains("page=1&per_page=10>; rel=\"first\""));
    assert!(link.contains("page=4&per_page=10>; rel=\"prev\""));
    assert!(!link.contains("rel=\"next\""));
    let issues: Vec<Issue> = body_json(resp).await;
    assert_eq!(issues.len(), 5);
}

#[tokio::test]
async fn unknown_issue_state_is_rejected() {
    let resp = app()
        .oneshot(get("/repos/octocat/Hello-World/issues?state=resolved"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_issue_returns_201() {
    let resp = app()
        .oneshot(json_request("POST", "/repos/octocat/Hello-World/issues", r#"{"title":"Found a bug"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let issue: Issue = body_json(resp).await;
    assert_eq!(issue.title, "Found a bug");
    assert_eq!(issue.state, "open");
}

#[tokio::test]
async fn create_issue_without_title_lists_field_errors() {
    let resp = app()
        .oneshot(json_request("POST", "/repos/octocat/Hello-World/issues", r#"{"body":"steps"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Validation Failed");
    assert_eq!(body["errors"][0]["field"], "title");
}

#[tokio::test]
async fn edit_unknown_issue_returns_404() {
    let resp = app()
        .oneshot(json_request("PATCH", "/repos/octocat/Hello-World/issues/999", r#"{"state":"closed"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- commits ---

#[tokio::test]
async fn commits_paginate_by_sha_cursor() {
    let resp = app()
        .oneshot(get("/repos/octocat/Hello-World/commits?per_page=3"))
        .await
        .unwrap();

    let link = link(&resp);
    assert!(link.contains(&format!("commits?top=master&sha={}>; rel=\"next\"", COMMITS[3])));
    assert!(link.contains("commits?sha=master>; rel=\"first\""));
    let commits: Vec<Value> = body_json(resp).await;
    assert_eq!(commits.len(), 3);
    assert_eq!(commits[0]["sha"], COMMITS[0]);
}

#[tokio::test]
async fn commits_from_unknown_sha_return_404() {
    let resp = app()
        .oneshot(get("/repos/octocat/Hello-World/commits?sha=deadbeef"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- users and probes ---

#[tokio::test]
async fn authenticated_user_requires_credentials() {
    let resp = app().oneshot(get("/user")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/user")
        .header(http::header::AUTHORIZATION, "token abc")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = body_json(resp).await;
    assert_eq!(user["login"], "octocat");
}

#[tokio::test]
async fn probes_answer_204_or_404() {
    let resp = app().oneshot(get("/user/following/defunkt")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app().oneshot(get("/user/following/nobody")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app().oneshot(get(&format!("/gists/{STARRED_GIST}/star"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn responses_carry_rate_limit_headers() {
    let resp = app().oneshot(get("/users/octocat")).await.unwrap();
    assert_eq!(resp.headers()["x-ratelimit-limit"], "5000");
    assert_eq!(resp.headers()["x-ratelimit-remaining"], "4999");
}

#[tokio::test]
async fn unknown_routes_return_json_404() {
    let resp = app().oneshot(get("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Not Found");
}

// --- redirects ---

#[tokio::test]
async fn looping_repo_redirects_to_itself() {
    let resp = app().oneshot(get("/repos/loop/app")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[http::header::LOCATION], "http://api.test/repos/loop/app");
}

#[tokio::test]
async fn moved_repo_redirects_to_repository_id() {
    let resp = app().oneshot(get("/repos/moved/app")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    let location = resp.headers()[http::header::LOCATION].to_str().unwrap().to_string();
    assert!(location.ends_with("/repositories/1296269"));
}
