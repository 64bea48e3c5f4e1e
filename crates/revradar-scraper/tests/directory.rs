//! Integration tests for `StaticResolver::resolve`.
//!
//! Uses `wiremock` to serve directory search pages, covering the walk's
//! three termination signals (empty marker, cardless page, redirect back
//! to page 1) and the page-1 hard-failure contract.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use revradar_core::AppConfig;
use revradar_scraper::{ScraperError, StaticResolver};

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        city: "ufa".to_owned(),
        search_base_url: server.uri(),
        review_api_url: format!("{}/2.0/branches", server.uri()),
        cookie_path: std::env::temp_dir().join("revradar-test-cookies.json"),
        user_agent: "revradar-test/0.1".to_owned(),
        log_level: "warn".to_owned(),
        request_timeout_secs: 5,
        max_concurrent_scrapes: 3,
        review_page_size: 50,
        credential_wait_secs: 1,
        settle_delay_ms: 0,
        max_retries: 0,
        retry_backoff_base_secs: 0,
        headful: false,
    }
}

fn resolver(server: &MockServer) -> StaticResolver {
    StaticResolver::from_config(&test_config(server)).expect("failed to build StaticResolver")
}

/// One branch card in the upstream markup.
fn card(link: &str, branch_name: &str, company: &str) -> String {
    format!(
        r#"<div class="_1kf6gff">
             <div><span class="_1al0wlf"><span>{company}</span></span></div>
             <div class="_zjunba"><a href="{link}?m=1">go</a></div>
             <div class="_klarpw"><span class="_1w9o2igt">{branch_name}</span></div>
           </div>"#
    )
}

fn results_page(cards: &[String]) -> String {
    format!("<html><body>{}</body></html>", cards.join(""))
}

fn empty_marker_page() -> String {
    r#"<html><body><div class="_1wpb8t2">nothing found</div></body></html>"#.to_owned()
}

#[tokio::test]
async fn walks_pages_until_empty_marker() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ufa/search/Acme"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[
            card("/ufa/firm/111", "Acme Center", "Acme pizza"),
            card("/ufa/firm/222", "Acme North", "Acme pizza"),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ufa/search/Acme/page/2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(results_page(&[card("/ufa/firm/333", "Acme South", "Acme pizza")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ufa/search/Acme/page/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_marker_page()))
        .expect(1)
        .mount(&server)
        .await;

    let resolution = resolver(&server).resolve("Acme").await.unwrap();

    assert_eq!(resolution.company.name, "Acme pizza");
    let ids: Vec<&str> = resolution.branches.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["111", "222", "333"]);
}

#[tokio::test]
async fn redirect_back_to_first_page_ends_the_walk() {
    let server = MockServer::start().await;
    let first_url = format!("{}/ufa/search/Acme", server.uri());

    Mock::given(method("GET"))
        .and(path("/ufa/search/Acme"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(results_page(&[card("/ufa/firm/1", "Only One", "Acme")])),
        )
        .mount(&server)
        .await;
    // Past-the-end pages bounce back to page 1.
    Mock::given(method("GET"))
        .and(path("/ufa/search/Acme/page/2"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", first_url.as_str()))
        .expect(1)
        .mount(&server)
        .await;

    let resolution = resolver(&server).resolve("Acme").await.unwrap();

    assert_eq!(resolution.branches.len(), 1, "page 1 cards counted once");
    assert_eq!(resolution.branches[0].id, "1");
}

#[tokio::test]
async fn cardless_page_ends_the_walk() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ufa/search/Ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let resolution = resolver(&server).resolve("Ghost").await.unwrap();

    assert!(resolution.branches.is_empty());
    assert_eq!(
        resolution.company.name, "Ghost",
        "query name survives an empty resolution"
    );
}

#[tokio::test]
async fn empty_marker_on_first_page_is_not_found_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ufa/search/Nobody"))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_marker_page()))
        .mount(&server)
        .await;

    let resolution = resolver(&server).resolve("Nobody").await.unwrap();
    assert!(resolution.branches.is_empty());
}

#[tokio::test]
async fn first_page_http_error_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ufa/search/Acme"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = resolver(&server).resolve("Acme").await;
    assert!(matches!(
        result,
        Err(ScraperError::UnexpectedStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn second_page_failure_degrades_to_partial() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ufa/search/Acme"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(results_page(&[card("/ufa/firm/77", "Acme", "Acme")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ufa/search/Acme/page/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let resolution = resolver(&server).resolve("Acme").await.unwrap();
    assert_eq!(resolution.branches.len(), 1);
}
