//! Integration tests for feed validation and post-scan checks

use crate::{hostname_of, test_fetcher, test_settings, write_yaml};
use outlink_audit::checks::{check_for_output, validate_feeds, Notifier, OutputCheck, RunContext};
use outlink_audit::crawler::build_http_client;
use outlink_audit::output::{ReportWriter, UnexpectedLinks};
use outlink_audit::{AuditError, ConfigError};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GOOD_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0"><channel><title>Blog</title></channel></rss>"#;

const BROKEN_FEED: &str = "<?xml version=\"1.0\"?>\n<rss>\n<channel>\n<title>Blog</titel>\n</channel>\n</rss>";

#[tokio::test]
async fn test_validate_feeds_reports_broken_feed() {
    let server = MockServer::start().await;
    let hostname = hostname_of(&server.uri());

    Mock::given(method("GET"))
        .and(path("/en-US/blog/feed/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(GOOD_FEED))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en-US/news/feed/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BROKEN_FEED))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_yaml(
        dir.path(),
        "feeds.yaml",
        &format!(
            "relevant_hostnames:\n  - {}\nfeed_paths:\n  - en-US/blog/feed/\n  - en-US/news/feed/\n",
            hostname
        ),
    );

    let settings = test_settings(dir.path(), 0);
    let mut fetcher = test_fetcher(&settings);

    let failures = validate_feeds(&mut fetcher, &hostname, &config)
        .await
        .expect("Validation should run");

    assert_eq!(failures.len(), 1);
    assert!(failures[0].url.ends_with("/en-US/news/feed/"));
    assert!(failures[0].reason.ends_with("@ L:4"), "got {}", failures[0].reason);
}

#[tokio::test]
async fn test_validate_feeds_unconfigured_host() {
    let dir = TempDir::new().unwrap();
    let config = write_yaml(
        dir.path(),
        "feeds.yaml",
        "relevant_hostnames:\n  - www.example.com\nfeed_paths:\n  - feed/\n",
    );

    let settings = test_settings(dir.path(), 0);
    let mut fetcher = test_fetcher(&settings);

    let result = validate_feeds(&mut fetcher, "www.other.example", &config).await;
    assert!(matches!(
        result,
        Err(AuditError::Config(ConfigError::Validation(_)))
    ));
}

#[tokio::test]
async fn test_check_output_posts_to_webhook() {
    let server = MockServer::start().await;
    let run = RunContext::new("https://github.com", "example/scanner", "7");

    let dir = TempDir::new().unwrap();
    let mut links = UnexpectedLinks::new();
    links.record("https://evil.example/x", "https://www.example.com/en-US/");
    ReportWriter::new(dir.path())
        .write(&links, "www.example.com", "all")
        .unwrap();

    let client = build_http_client(None).unwrap();
    let expected_text = outlink_audit::checks::summarize(
        &run,
        &outlink_audit::output::Triage::from_urls(&["https://evil.example/x".to_string()]),
    );

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_json(serde_json::json!({ "text": expected_text })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Notifier::new(client, Some(format!("{}/hook", server.uri())));
    let result = check_for_output(dir.path(), &run, &notifier).await.unwrap();

    match result {
        OutputCheck::Found { message, .. } => {
            assert!(message.contains("https://github.com/example/scanner/actions/runs/7/"));
        }
        OutputCheck::NoArtifact => panic!("reports should have been found"),
    }
}

#[tokio::test]
async fn test_check_output_without_reports_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let notifier = Notifier::new(
        build_http_client(None).unwrap(),
        Some(format!("{}/hook", server.uri())),
    );

    let result = check_for_output(dir.path(), &RunContext::default(), &notifier)
        .await
        .unwrap();
    assert_eq!(result, OutputCheck::NoArtifact);
}
