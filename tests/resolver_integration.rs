//! Integration tests for the link resolver's multi-hop chains.

use bookdl_core::{Entry, LinkResolver, ResolveError, SourceKind, Transport};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entry(kind: SourceKind, mirror: &str) -> Entry {
    Entry {
        id: "123abcdef0123456789abcdef01234567".to_string(),
        authors: "Jane Doe".to_string(),
        title: "My Title".to_string(),
        publisher: String::new(),
        year: String::new(),
        pages: String::new(),
        language: "English".to_string(),
        size: "2 Mb".to_string(),
        extension: "epub".to_string(),
        mirror: mirror.to_string(),
        source_kind: kind,
    }
}

fn resolver() -> LinkResolver {
    LinkResolver::new(Transport::new())
}

async fn mount_html(server: &MockServer, at: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(html.to_string()))
        .mount(server)
        .await;
}

fn final_page(primary: &str, alternates: &[&str]) -> String {
    let list: String = alternates
        .iter()
        .map(|href| format!("<li><a href=\"{href}\">alt</a></li>"))
        .collect();
    format!(
        "<html><body><div id=\"download\">\
         <h2><a href=\"{primary}\">GET</a></h2><ul>{list}</ul></div></body></html>"
    )
}

#[tokio::test]
async fn test_primary_path_goes_straight_to_final_page() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/main/X",
        &final_page("http://dl.example/get/X", &["http://alt.example/X"]),
    )
    .await;

    let entry = entry(SourceKind::PrimaryCatalog, &format!("{}/main/X", server.uri()));
    let links = resolver().resolve(&entry).await.expect("should resolve");

    assert_eq!(links.primary(), Some("http://dl.example/get/X"));
    assert_eq!(
        links.urls(),
        &["http://dl.example/get/X", "http://alt.example/X"]
    );
}

#[tokio::test]
async fn test_fiction_path_walks_detail_then_final() {
    let server = MockServer::start().await;
    let detail = format!(
        "<html><body><ul class=\"record_mirrors\">\
         <li><a href=\"{}/final/X\">Mirror 1</a></li></ul></body></html>",
        server.uri()
    );
    mount_html(&server, "/fiction/X", &detail).await;
    mount_html(
        &server,
        "/final/X",
        &final_page("//cdn.example/get/X", &["http://alt.example/X"]),
    )
    .await;

    let entry = entry(
        SourceKind::FictionCatalog,
        &format!("{}/fiction/X", server.uri()),
    );
    let links = resolver().resolve(&entry).await.expect("should resolve");

    // protocol-relative primary is normalized
    assert_eq!(links.primary(), Some("https://cdn.example/get/X"));
    assert_eq!(links.urls().len(), 2);
}

#[tokio::test]
async fn test_fiction_detail_link_may_be_relative() {
    let server = MockServer::start().await;
    let detail = "<ul class=\"record_mirrors\"><li><a href=\"/final/X\">M</a></li></ul>";
    mount_html(&server, "/fiction/X", detail).await;
    mount_html(&server, "/final/X", &final_page("http://dl.example/X", &[])).await;

    let entry = entry(
        SourceKind::FictionCatalog,
        &format!("{}/fiction/X", server.uri()),
    );
    let links = resolver().resolve(&entry).await.expect("should resolve");
    assert_eq!(links.primary(), Some("http://dl.example/X"));
}

#[tokio::test]
async fn test_fetch_detail_failure_names_the_stage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fiction/X"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let entry = entry(
        SourceKind::FictionCatalog,
        &format!("{}/fiction/X", server.uri()),
    );
    let error = resolver().resolve(&entry).await.expect_err("should fail");
    assert_eq!(error.stage(), "fetch-detail");
    assert!(matches!(error, ResolveError::FetchDetail { .. }));
}

#[tokio::test]
async fn test_detail_without_mirror_list_is_link_not_found() {
    let server = MockServer::start().await;
    mount_html(&server, "/fiction/X", "<html><body><p>record page</p></body></html>").await;

    let entry = entry(
        SourceKind::FictionCatalog,
        &format!("{}/fiction/X", server.uri()),
    );
    let error = resolver().resolve(&entry).await.expect_err("should fail");
    assert_eq!(error.stage(), "link-not-found");
}

#[tokio::test]
async fn test_final_fetch_failure_names_the_stage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/main/X"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let entry = entry(SourceKind::PrimaryCatalog, &format!("{}/main/X", server.uri()));
    let error = resolver().resolve(&entry).await.expect_err("should fail");
    assert_eq!(error.stage(), "fetch-final");
}

#[tokio::test]
async fn test_final_page_without_links_is_parse_final() {
    let server = MockServer::start().await;
    mount_html(&server, "/main/X", "<html><body><p>not a download page</p></body></html>").await;

    let entry = entry(SourceKind::PrimaryCatalog, &format!("{}/main/X", server.uri()));
    let error = resolver().resolve(&entry).await.expect_err("should fail");
    assert_eq!(error.stage(), "parse-final");
    assert!(matches!(error, ResolveError::ParseFinal { .. }));
}

#[tokio::test]
async fn test_loopback_alternates_are_dropped_during_resolution() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/main/X",
        &final_page(
            "http://dl.example/get/X",
            &["http://localhost:8080/ipfs/X", "http://dl.example/get/X"],
        ),
    )
    .await;

    let entry = entry(SourceKind::PrimaryCatalog, &format!("{}/main/X", server.uri()));
    let links = resolver().resolve(&entry).await.expect("should resolve");
    // loopback excluded, duplicate primary collapsed
    assert_eq!(links.urls(), &["http://dl.example/get/X"]);
}
