//! Integration tests for the GitHub provider against a mocked REST API

use chrono::NaiveDate;
use repo_tally::facts::hosting::Provider;
use repo_tally::facts::{CodeFrequency, IssueCounts, Referrer, RepoSpec};
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> Provider {
    Provider::new(Some("test-token"), &Url::parse(&server.uri()).unwrap()).unwrap()
}

fn repo() -> RepoSpec {
    "octo/widgets".parse().unwrap()
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_code_frequency_uses_latest_week() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/repos/octo/widgets/stats/code_frequency",
        ResponseTemplate::new(200).set_body_json(json!([[1_704_067_200_i64, 10, -4], [1_704_672_000_i64, 7, -3]])),
    )
    .await;

    let frequency = provider(&server).get_code_frequency(&repo()).await;

    assert_eq!(
        frequency,
        Some(CodeFrequency {
            week: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            additions: 7,
            deletions: 3,
        })
    );
}

#[tokio::test]
async fn test_code_frequency_still_computing() {
    let server = MockServer::start().await;
    mount(&server, "/repos/octo/widgets/stats/code_frequency", ResponseTemplate::new(202)).await;

    assert_eq!(provider(&server).get_code_frequency(&repo()).await, None);
}

#[tokio::test]
async fn test_code_frequency_empty_series() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/repos/octo/widgets/stats/code_frequency",
        ResponseTemplate::new(200).set_body_json(json!([])),
    )
    .await;

    assert_eq!(provider(&server).get_code_frequency(&repo()).await, None);
}

#[tokio::test]
async fn test_contributors_counted_from_last_page_link() {
    let server = MockServer::start().await;
    let link = format!(
        r#"<{base}/repositories/1/contributors?per_page=1&anon=true&page=2>; rel="next", <{base}/repositories/1/contributors?per_page=1&anon=true&page=42>; rel="last""#,
        base = server.uri()
    );

    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/contributors"))
        .and(query_param("per_page", "1"))
        .and(query_param("anon", "true"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "login": "someone", "contributions": 90 }]))
                .insert_header("link", link.as_str()),
        )
        .mount(&server)
        .await;

    assert_eq!(provider(&server).get_contributors_count(&repo()).await, 42);
}

#[tokio::test]
async fn test_contributors_counted_from_body_without_link() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/repos/octo/widgets/contributors",
        ResponseTemplate::new(200).set_body_json(json!([{ "login": "solo", "contributions": 3 }])),
    )
    .await;

    assert_eq!(provider(&server).get_contributors_count(&repo()).await, 1);
}

#[tokio::test]
async fn test_contributors_still_computing() {
    let server = MockServer::start().await;
    mount(&server, "/repos/octo/widgets/contributors", ResponseTemplate::new(202)).await;

    assert_eq!(provider(&server).get_contributors_count(&repo()).await, 0);
}

#[tokio::test]
async fn test_issue_counts_from_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param("q", "repo:octo/widgets type:issue state:open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total_count": 12, "items": [] })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param("q", "repo:octo/widgets type:pr state:open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total_count": 5, "items": [] })))
        .mount(&server)
        .await;

    let counts = provider(&server).get_issue_counts(&repo()).await;

    assert_eq!(
        counts,
        IssueCounts {
            open_issues: 12,
            open_prs: 5,
        }
    );
}

#[tokio::test]
async fn test_issue_counts_degrade_when_search_is_forbidden() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/search/issues",
        ResponseTemplate::new(403)
            .insert_header("x-ratelimit-remaining", "0")
            .insert_header("x-ratelimit-reset", "1700000000"),
    )
    .await;

    assert_eq!(provider(&server).get_issue_counts(&repo()).await, IssueCounts::default());
}

#[tokio::test]
async fn test_traffic_parsed_and_degraded_per_endpoint() {
    let server = MockServer::start().await;

    mount(
        &server,
        "/repos/octo/widgets/traffic/views",
        ResponseTemplate::new(200).set_body_json(json!({
            "count": 14,
            "uniques": 5,
            "views": [
                { "timestamp": "2024-01-13T00:00:00Z", "count": 6, "uniques": 2 },
                { "timestamp": "2024-01-14T00:00:00Z", "count": 8, "uniques": 3 }
            ]
        })),
    )
    .await;
    mount(&server, "/repos/octo/widgets/traffic/clones", ResponseTemplate::new(202)).await;
    mount(
        &server,
        "/repos/octo/widgets/traffic/popular/referrers",
        ResponseTemplate::new(200).set_body_json(json!([{ "referrer": "github.com", "count": 9, "uniques": 4 }])),
    )
    .await;

    let traffic = provider(&server).get_traffic(&repo()).await;

    let views = traffic.views.unwrap();
    assert_eq!(views.count, 14);
    assert_eq!(views.uniques, 5);
    assert_eq!(views.daily.len(), 2);
    assert_eq!(views.daily[1].count, 8);

    assert!(traffic.clones.is_none());
    assert_eq!(
        traffic.referrers,
        vec![Referrer {
            referrer: "github.com".to_string(),
            count: 9,
            uniques: 4,
        }]
    );
    assert!(traffic.popular_paths.is_empty());
}

#[tokio::test]
async fn test_release_paging_stops_at_first_failure() {
    let server = MockServer::start().await;

    let full_page: Vec<_> = (0..100)
        .map(|i| json!({ "tag_name": format!("v0.{i}.0"), "name": null, "published_at": null, "assets": [] }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/releases"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/widgets/releases"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let releases = provider(&server).get_releases(&repo()).await;

    assert_eq!(releases.len(), 100);
    assert_eq!(releases[0].tag, "v0.0.0");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_short_release_page_ends_paging() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/repos/octo/widgets/releases",
        ResponseTemplate::new(200).set_body_json(json!([
            { "tag_name": "v1.0.0", "name": "One", "published_at": "2024-01-01T00:00:00Z",
              "assets": [{ "name": "widgets.tgz", "download_count": 4, "size": 10 }] }
        ])),
    )
    .await;

    let releases = provider(&server).get_releases(&repo()).await;

    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].assets[0].download_count, 4);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
