//! End-to-end scan tests against mock sites

use crate::{hostname_of, test_fetcher, test_settings, write_yaml};
use outlink_audit::crawler::{BatchSpec, Coordinator, ScanRequest, SitemapResolver};
use outlink_audit::{AuditError, ConfigError};
use std::collections::BTreeMap;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sitemap_index(children: &[String]) -> String {
    let entries: String = children
        .iter()
        .map(|c| format!("<sitemap><loc>{}</loc></sitemap>", c))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

fn urlset(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|u| format!("<url><loc>{}</loc></url>", u))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn allowlist_for(hostname: &str) -> String {
    format!(
        r#"
relevant_hostnames:
  - {}
allowed_outbound_url_literals:
  - /en-US/about/
  - /media/site.css
allowed_outbound_url_regexes:
  - https://allowed\.example/.*
"#,
        hostname
    )
}

#[tokio::test]
async fn test_full_scan_with_sitemap_index() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let hostname = hostname_of(&base_url);

    mount_page(
        &server,
        "/sitemap.xml",
        sitemap_index(&[format!("{}/sitemap-pages.xml", base_url)]),
    )
    .await;
    mount_page(
        &server,
        "/sitemap-pages.xml",
        urlset(&[
            format!("{}/en-US/", base_url),
            format!("{}/en-US/about/", base_url),
        ]),
    )
    .await;
    mount_page(
        &server,
        "/en-US/",
        r#"<html><head><link rel="stylesheet" href="/media/site.css"></head><body>
            <a href="/en-US/about/">About</a>
            <a href="https://allowed.example/partner">Partner</a>
            <a href="https://evil.example/x">Evil</a>
            <a href="/weird/">Weird</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/en-US/about/",
        r#"<html><body>
            <a href="https://evil.example/x">Evil again</a>
            <script src="https://tracker.example/t.js"></script>
        </body></html>"#
            .to_string(),
    )
    .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let allowlist = write_yaml(dir.path(), "allowlist.yaml", &allowlist_for(&hostname));
    let output_dir = dir.path().join("output");

    let settings = test_settings(&output_dir, 0);
    let fetcher = test_fetcher(&settings);
    let mut coordinator = Coordinator::with_fetcher(settings, fetcher);

    let request = ScanRequest {
        sitemap_url: Some(format!("{}/sitemap.xml", base_url)),
        allowlist_path: allowlist,
        export_cache: true,
        ..ScanRequest::default()
    };

    let outcome = coordinator.run(&request).await.expect("Scan failed");

    assert_eq!(outcome.hostname, hostname);
    assert_eq!(outcome.pages_checked, 2);

    let found: Vec<&str> = outcome.unexpected.urls().collect();
    assert_eq!(
        found,
        vec!["/weird/", "https://evil.example/x", "https://tracker.example/t.js"]
    );
    assert_eq!(
        outcome
            .unexpected
            .referring_pages("https://evil.example/x")
            .unwrap()
            .len(),
        2
    );

    let reports = outcome.reports.expect("Reports should be written");
    let json = std::fs::read_to_string(&reports.json).expect("Missing JSON report");
    let by_page: BTreeMap<String, Vec<String>> = serde_json::from_str(&json).unwrap();
    assert_eq!(
        by_page[&format!("{}/en-US/about/", base_url)],
        vec!["https://evil.example/x", "https://tracker.example/t.js"]
    );
    assert!(reports
        .flat
        .file_name()
        .unwrap()
        .to_string_lossy()
        .contains("_all_"));

    // Both pages live under /en-US/, so both were cached and exported
    let export = outcome.cache_export.expect("Cache should be exported");
    assert_eq!(std::fs::read_dir(export).unwrap().count(), 2);
}

#[tokio::test]
async fn test_clean_scan_writes_no_reports() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let hostname = hostname_of(&base_url);

    mount_page(
        &server,
        "/en-US/about/",
        r#"<html><body><a href="https://allowed.example/ok">ok</a></body></html>"#.to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let allowlist = write_yaml(dir.path(), "allowlist.yaml", &allowlist_for(&hostname));
    let output_dir = dir.path().join("output");

    let settings = test_settings(&output_dir, 0);
    let fetcher = test_fetcher(&settings);
    let mut coordinator = Coordinator::with_fetcher(settings, fetcher);

    let request = ScanRequest {
        specific_urls: vec![format!("{}/en-US/about/", base_url)],
        allowlist_path: allowlist,
        ..ScanRequest::default()
    };

    let outcome = coordinator.run(&request).await.unwrap();
    assert!(outcome.is_clean());
    assert!(outcome.reports.is_none());
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn test_unconfigured_host_flags_everything() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/page/",
        r#"<html><body><a href="/en-US/about/">About</a></body></html>"#.to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let allowlist = write_yaml(
        dir.path(),
        "allowlist.yaml",
        &allowlist_for("www.some-other-site.example"),
    );

    let settings = test_settings(&dir.path().join("output"), 0);
    let fetcher = test_fetcher(&settings);
    let mut coordinator = Coordinator::with_fetcher(settings, fetcher);

    let request = ScanRequest {
        specific_urls: vec![format!("{}/page/", base_url)],
        allowlist_path: allowlist,
        ..ScanRequest::default()
    };

    let outcome = coordinator.run(&request).await.unwrap();
    assert_eq!(outcome.unexpected.urls().collect::<Vec<_>>(), vec!["/en-US/about/"]);
}

#[tokio::test]
async fn test_retry_exhaustion_is_fatal() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let hostname = hostname_of(&base_url);

    Mock::given(method("GET"))
        .and(path("/broken/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let allowlist = write_yaml(dir.path(), "allowlist.yaml", &allowlist_for(&hostname));
    let output_dir = dir.path().join("output");

    let settings = test_settings(&output_dir, 3);
    let fetcher = test_fetcher(&settings);
    let mut coordinator = Coordinator::with_fetcher(settings, fetcher);

    let request = ScanRequest {
        specific_urls: vec![format!("{}/broken/", base_url)],
        allowlist_path: allowlist,
        ..ScanRequest::default()
    };

    let result = coordinator.run(&request).await;
    match result {
        Err(AuditError::Fetch { attempts, url, .. }) => {
            assert_eq!(attempts, 4);
            assert!(url.ends_with("/broken/"));
        }
        other => panic!("expected a fetch error, got {:?}", other.map(|o| o.hostname)),
    }
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn test_transient_failure_recovers() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/flaky/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/flaky/", "<html>ok</html>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let settings = test_settings(dir.path(), 3);
    let mut fetcher = test_fetcher(&settings);

    let body = fetcher
        .fetch(&format!("{}/flaky/", base_url))
        .await
        .expect("Second attempt should succeed");
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn test_cacheable_pages_are_fetched_once() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/en-US/firefox/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>cached</html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/de/firefox/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not cached</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let settings = test_settings(dir.path(), 0);
    let mut fetcher = test_fetcher(&settings);

    let cached = format!("{}/en-US/firefox/", base_url);
    let uncached = format!("{}/de/firefox/", base_url);
    for _ in 0..2 {
        assert_eq!(fetcher.fetch(&cached).await.unwrap(), "<html>cached</html>");
        assert_eq!(fetcher.fetch(&uncached).await.unwrap(), "<html>not cached</html>");
    }

    assert_eq!(fetcher.cache().len(), 1);
    assert!(fetcher.cache().contains(&cached));
}

#[tokio::test]
async fn test_maintain_hostname_rewrites_sitemap_urls() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/sitemap.xml",
        sitemap_index(&["https://cdn.example/sitemap-child.xml".to_string()]),
    )
    .await;
    mount_page(
        &server,
        "/sitemap-child.xml",
        urlset(&[
            "https://cdn.example/en-US/".to_string(),
            "https://cdn.example/en-US/about/".to_string(),
        ]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let settings = test_settings(dir.path(), 0);
    let mut fetcher = test_fetcher(&settings);

    let urls = SitemapResolver::new(true)
        .resolve(&mut fetcher, &format!("{}/sitemap.xml", base_url))
        .await
        .expect("Sitemap should resolve");

    assert_eq!(
        urls,
        vec![
            format!("{}/en-US/", base_url),
            format!("{}/en-US/about/", base_url)
        ]
    );
}

#[tokio::test]
async fn test_sitemap_depth_bound() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    // A sitemap index that lists itself
    mount_page(
        &server,
        "/sitemap.xml",
        sitemap_index(&[format!("{}/sitemap.xml", base_url)]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let settings = test_settings(dir.path(), 0);
    let mut fetcher = test_fetcher(&settings);

    let result = SitemapResolver::new(false)
        .with_max_depth(Some(3))
        .resolve(&mut fetcher, &format!("{}/sitemap.xml", base_url))
        .await;

    assert!(matches!(
        result,
        Err(AuditError::SitemapDepth { max_depth: 3, .. })
    ));
}

#[tokio::test]
async fn test_batches_partition_the_universe() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let hostname = hostname_of(&base_url);

    let pages: Vec<String> = (0..5).map(|i| format!("{}/page-{}/", base_url, i)).collect();
    mount_page(&server, "/sitemap.xml", urlset(&pages)).await;
    for i in 0..5 {
        mount_page(
            &server,
            &format!("/page-{}/", i),
            format!(r#"<html><body><a href="https://evil.example/{}">x</a></body></html>"#, i),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let allowlist = write_yaml(dir.path(), "allowlist.yaml", &allowlist_for(&hostname));

    let mut seen = Vec::new();
    for index in 1..=2 {
        let settings = test_settings(&dir.path().join("output"), 0);
        let fetcher = test_fetcher(&settings);
        let mut coordinator = Coordinator::with_fetcher(settings, fetcher);

        let request = ScanRequest {
            sitemap_url: Some(format!("{}/sitemap.xml", base_url)),
            batch: BatchSpec::new(index, 2).unwrap(),
            allowlist_path: allowlist.clone(),
            ..ScanRequest::default()
        };

        let outcome = coordinator.run(&request).await.unwrap();
        let reports = outcome.reports.expect("each batch finds something");
        assert!(reports
            .flat
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains(&format!("_{}_", index)));

        seen.push(outcome.pages_checked);
    }

    assert_eq!(seen, vec![3, 2]);
}

#[tokio::test]
async fn test_extra_urls_are_appended() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let hostname = hostname_of(&base_url);

    mount_page(&server, "/en-US/about/", "<html></html>".to_string()).await;
    mount_page(
        &server,
        "/en-US/extra/",
        r#"<html><body><a href="https://evil.example/extra">x</a></body></html>"#.to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let allowlist = write_yaml(dir.path(), "allowlist.yaml", &allowlist_for(&hostname));
    let extras = write_yaml(
        dir.path(),
        "extras.yaml",
        "extra_urls_to_check:\n  - en-US/extra/\n",
    );

    let settings = test_settings(&dir.path().join("output"), 0);
    let fetcher = test_fetcher(&settings);
    let mut coordinator = Coordinator::with_fetcher(settings, fetcher);

    let request = ScanRequest {
        specific_urls: vec![format!("{}/en-US/about/", base_url)],
        allowlist_path: allowlist,
        additional_urls_file: Some(extras),
        ..ScanRequest::default()
    };

    let outcome = coordinator.run(&request).await.unwrap();
    assert_eq!(outcome.pages_checked, 2);
    assert_eq!(
        outcome
            .unexpected
            .referring_pages("https://evil.example/extra")
            .unwrap()
            .iter()
            .collect::<Vec<_>>(),
        vec![&format!("{}/en-US/extra/", base_url)]
    );
}

#[tokio::test]
async fn test_bad_allowlist_regex_is_fatal() {
    let dir = TempDir::new().unwrap();
    let allowlist = write_yaml(
        dir.path(),
        "allowlist.yaml",
        "relevant_hostnames:\n  - www.example.com\nallowed_outbound_url_regexes:\n  - \"https://(unclosed\"\n",
    );

    let settings = test_settings(dir.path(), 0);
    let fetcher = test_fetcher(&settings);
    let mut coordinator = Coordinator::with_fetcher(settings, fetcher);

    let request = ScanRequest {
        specific_urls: vec!["https://www.example.com/".to_string()],
        allowlist_path: allowlist,
        ..ScanRequest::default()
    };

    let result = coordinator.run(&request).await;
    assert!(matches!(
        result,
        Err(AuditError::Config(ConfigError::InvalidPattern { .. }))
    ));
}
