use mockito::{Matcher, ServerGuard};
use pretty_assertions::assert_eq;
use repo_assessor::analyzer::{AnalysisOutcome, AnalyzeOptions, Analyzer};
use repo_assessor::collector::{Collector, Priority};
use repo_assessor::config::PromptLimits;
use repo_assessor::error::AssessorError;
use repo_assessor::github::{EntryKind, GitHubClient, RepositorySource};
use repo_assessor::metadata::fetch_metadata;
use serde_json::json;
use tempfile::TempDir;

mod common;
use common::test_helpers::*;

const REPO_JSON: &str = r#"{
    "name": "demo",
    "full_name": "octo/demo",
    "description": "Demo service",
    "html_url": "https://github.com/octo/demo",
    "language": "Rust",
    "stargazers_count": 42,
    "forks_count": 3,
    "watchers_count": 42,
    "open_issues_count": 1,
    "default_branch": "trunk",
    "topics": ["cli", "github"],
    "license": {"name": "MIT License", "spdx_id": "MIT"},
    "archived": false,
    "fork": false,
    "created_at": "2021-04-01T10:00:00Z",
    "updated_at": "2024-02-01T10:00:00Z",
    "pushed_at": "2024-02-01T09:00:00Z"
}"#;

async fn mock_listing(server: &mut ServerGuard, path: &str, branch: &str, body: serde_json::Value) -> mockito::Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::UrlEncoded("ref".into(), branch.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

async fn mock_file(server: &mut ServerGuard, path: &str, branch: &str, text: &str) -> mockito::Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::UrlEncoded("ref".into(), branch.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(content_json(text))
        .create_async()
        .await
}

#[tokio::test]
async fn test_get_repository_success() {
    setup_test_logger();
    let mut server = setup_test_server().await;
    let _m = server
        .mock("GET", "/repos/octo/demo")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(REPO_JSON)
        .create_async()
        .await;

    let client = GitHubClient::with_base(&server.url()).unwrap();
    let info = client.get_repository(&demo_repo()).await.unwrap();

    assert_eq!(info.full_name, "octo/demo");
    assert_eq!(info.default_branch, "trunk");
    assert_eq!(info.stargazers_count, 42);
    assert_eq!(info.license.unwrap().spdx_id.as_deref(), Some("MIT"));
}

#[tokio::test]
async fn test_repository_not_found() {
    let mut server = setup_test_server().await;
    let _m = server
        .mock("GET", "/repos/octo/demo")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let client = GitHubClient::with_base(&server.url()).unwrap();
    let err = client.get_repository(&demo_repo()).await.unwrap_err();
    assert!(matches!(err, AssessorError::RepositoryNotFound(ref repo) if repo == "octo/demo"));
}

#[tokio::test]
async fn test_rate_limit_header() {
    let mut server = setup_test_server().await;
    let _m = server
        .mock("GET", "/repos/octo/demo")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_header("x-ratelimit-remaining", "0")
        .with_body(r#"{"message": "Forbidden"}"#)
        .create_async()
        .await;

    let client = GitHubClient::with_base(&server.url()).unwrap();
    let err = client.get_repository(&demo_repo()).await.unwrap_err();
    assert!(matches!(err, AssessorError::RateLimitExceeded(_)));
}

#[tokio::test]
async fn test_rate_limit_message() {
    let mut server = setup_test_server().await;
    let _m = server
        .mock("GET", "/repos/octo/demo")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "API rate limit exceeded for 10.0.0.1."}"#)
        .create_async()
        .await;

    let client = GitHubClient::with_base(&server.url()).unwrap();
    let err = client.get_repository(&demo_repo()).await.unwrap_err();
    assert!(matches!(err, AssessorError::RateLimitExceeded(_)));
}

#[tokio::test]
async fn test_access_denied() {
    let mut server = setup_test_server().await;
    let _m = server
        .mock("GET", "/repos/octo/demo")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_header("x-ratelimit-remaining", "4999")
        .with_body(r#"{"message": "Repository access blocked"}"#)
        .create_async()
        .await;

    let client = GitHubClient::with_base(&server.url()).unwrap();
    let err = client.get_repository(&demo_repo()).await.unwrap_err();
    assert!(matches!(err, AssessorError::AccessDenied(_)));
}

#[tokio::test]
async fn test_list_directory_drops_symlinks_and_submodules() {
    let mut server = setup_test_server().await;
    let _m = mock_listing(
        &mut server,
        "/repos/octo/demo/contents/src",
        "main",
        json!([
            {"type": "file", "name": "main.rs", "path": "src/main.rs", "size": 120},
            {"type": "dir", "name": "net", "path": "src/net", "size": 0},
            {"type": "symlink", "name": "link.rs", "path": "src/link.rs", "size": 7},
            {"type": "submodule", "name": "ext", "path": "src/ext", "size": 0}
        ]),
    )
    .await;

    let client = GitHubClient::with_base(&server.url()).unwrap();
    let entries = client.list_directory(&demo_repo(), "src", "main").await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, "src/main.rs");
    assert_eq!(entries[0].size, 120);
    assert_eq!(entries[1].kind, EntryKind::Directory);
}

#[tokio::test]
async fn test_collect_over_http() {
    setup_test_logger();
    let mut server = setup_test_server().await;
    let _root = mock_listing(
        &mut server,
        "/repos/octo/demo/contents",
        "main",
        json!([
            {"type": "file", "name": "README.md", "path": "README.md", "size": 14},
            {"type": "dir", "name": "node_modules", "path": "node_modules", "size": 0},
            {"type": "file", "name": "logo.png", "path": "logo.png", "size": 2048},
            {"type": "dir", "name": "src", "path": "src", "size": 0},
            {"type": "file", "name": "flaky.rs", "path": "flaky.rs", "size": 10}
        ]),
    )
    .await;
    let _src = mock_listing(
        &mut server,
        "/repos/octo/demo/contents/src",
        "main",
        json!([{"type": "file", "name": "main.rs", "path": "src/main.rs", "size": 13}]),
    )
    .await;
    let _readme = mock_file(&mut server, "/repos/octo/demo/contents/README.md", "main", "# Demo\n\nHello\n").await;
    let _main = mock_file(&mut server, "/repos/octo/demo/contents/src/main.rs", "main", "fn main() {}\n").await;
    let _flaky = server
        .mock("GET", "/repos/octo/demo/contents/flaky.rs")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    let node_modules = server
        .mock("GET", "/repos/octo/demo/contents/node_modules")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let logo = server
        .mock("GET", "/repos/octo/demo/contents/logo.png")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = GitHubClient::with_base(&server.url()).unwrap();
    let collection = Collector::new(&client, no_delay_limits()).collect(&demo_repo(), "main").await;

    let paths: Vec<&str> = collection.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["src/main.rs", "README.md"]);
    assert_eq!(collection.files[0].content, "fn main() {}\n");
    assert_eq!(collection.files[0].priority, Priority::High);
    assert_eq!(collection.files[1].content, "# Demo\n\nHello\n");
    assert_eq!(collection.stats.files_filtered, 1);
    assert_eq!(collection.stats.files_skipped, 1);

    node_modules.assert_async().await;
    logo.assert_async().await;
}

#[tokio::test]
async fn test_fetch_metadata_tolerates_missing_secondary_endpoints() {
    let mut server = setup_test_server().await;
    let _repo = server
        .mock("GET", "/repos/octo/demo")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(REPO_JSON)
        .create_async()
        .await;
    let _languages = server
        .mock("GET", "/repos/octo/demo/languages")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"Shell": 100, "Rust": 900}"#)
        .create_async()
        .await;
    let _commits = server
        .mock("GET", "/repos/octo/demo/commits")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("sha".into(), "trunk".into()),
            Matcher::UrlEncoded("per_page".into(), "10".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "sha": "0123456789abcdef",
                "commit": {
                    "message": "Fix parser\n\nLonger body",
                    "author": {"name": "Ada", "date": "2024-01-31T12:00:00Z"}
                }
            }])
            .to_string(),
        )
        .create_async()
        .await;
    // readme, branches and pulls are unmatched and answered with an error status

    let client = GitHubClient::with_base(&server.url()).unwrap();
    let metadata = fetch_metadata(&client, &demo_repo(), None, &PromptLimits::default()).await.unwrap();

    assert_eq!(metadata.info.default_branch, "trunk");
    assert_eq!(metadata.languages, vec![("Rust".to_string(), 900), ("Shell".to_string(), 100)]);
    assert_eq!(metadata.recent_commits.len(), 1);
    assert_eq!(metadata.recent_commits[0].sha, "0123456");
    assert_eq!(metadata.recent_commits[0].message, "Fix parser");
    assert_eq!(metadata.readme, None);
    assert_eq!(metadata.branch_count, 0);
    assert_eq!(metadata.pull_requests.sampled, 0);
}

#[tokio::test]
async fn test_fetch_metadata_reads_commits_from_requested_branch() {
    let mut server = setup_test_server().await;
    let _repo = server
        .mock("GET", "/repos/octo/demo")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(REPO_JSON)
        .create_async()
        .await;
    let dev_commits = server
        .mock("GET", "/repos/octo/demo/commits")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("sha".into(), "dev".into()),
            Matcher::UrlEncoded("per_page".into(), "10".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "sha": "fedcba9876543210",
                "commit": {
                    "message": "Work in progress",
                    "author": {"name": "Grace", "date": "2024-02-02T08:00:00Z"}
                }
            }])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = GitHubClient::with_base(&server.url()).unwrap();
    let metadata = fetch_metadata(&client, &demo_repo(), Some("dev"), &PromptLimits::default()).await.unwrap();

    assert_eq!(metadata.info.default_branch, "trunk");
    assert_eq!(metadata.recent_commits.len(), 1);
    assert_eq!(metadata.recent_commits[0].sha, "fedcba9");
    assert_eq!(metadata.recent_commits[0].message, "Work in progress");
    dev_commits.assert_async().await;
}

#[tokio::test]
async fn test_fetch_metadata_fails_when_repository_is_missing() {
    let mut server = setup_test_server().await;
    let _repo = server
        .mock("GET", "/repos/octo/demo")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let client = GitHubClient::with_base(&server.url()).unwrap();
    let err = fetch_metadata(&client, &demo_repo(), None, &PromptLimits::default()).await.unwrap_err();
    assert!(matches!(err, AssessorError::RepositoryNotFound(_)));
}

#[tokio::test]
async fn test_collect_only_run_uses_default_branch() {
    let mut server = setup_test_server().await;
    let _repo = server
        .mock("GET", "/repos/octo/demo")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(REPO_JSON)
        .create_async()
        .await;
    let _root = mock_listing(
        &mut server,
        "/repos/octo/demo/contents",
        "trunk",
        json!([{"type": "file", "name": "Cargo.toml", "path": "Cargo.toml", "size": 20}]),
    )
    .await;
    let _cargo = mock_file(&mut server, "/repos/octo/demo/contents/Cargo.toml", "trunk", "[package]\nname = \"demo\"\n").await;

    let dir = TempDir::new().unwrap();
    let analyzer = Analyzer::new(create_test_config(&server.url(), dir.path())).unwrap();
    let options = AnalyzeOptions { collect_only: true, ..Default::default() };
    let outcome = analyzer.run("https://github.com/octo/demo", &options).await.unwrap();

    match outcome {
        AnalysisOutcome::Collected(summary) => {
            assert_eq!(summary.repository, "octo/demo");
            assert_eq!(summary.branch, "trunk");
            assert_eq!(summary.files.len(), 1);
            assert_eq!(summary.files[0].path, "Cargo.toml");
            assert!(summary.files[0].is_config);
        }
        other => panic!("expected a collect-only outcome, got {:?}", other),
    }
}
