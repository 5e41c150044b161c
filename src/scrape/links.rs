//! Page-link extraction used by the link resolver.
//!
//! Same tolerant structural style as entry extraction: both routines return
//! `None` when the expected marked block or links are absent, letting the
//! resolver surface the stage that failed.

use url::Url;

use super::dom;

/// Class marker of the mirrors list on a fiction detail page.
const MIRRORS_LIST_CLASS: &str = "record_mirrors";
/// Id marker of the download section on a final download page.
const DOWNLOAD_BLOCK_ID: &str = "download";
/// Hosts that point back at the local machine and never at a download host.
const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// First hyperlink inside the marked mirrors list of a fiction detail page.
#[must_use]
pub fn find_fiction_detail_link(html: &str) -> Option<String> {
    let list = dom::find_block_by_class(html, "ul", MIRRORS_LIST_CLASS)?;
    dom::links(list)
        .into_iter()
        .map(|link| link.href)
        .find(|href| !href.is_empty())
}

/// Candidate binary URLs from a final download page: the primary GET link
/// inside the marked download section first, then every hyperlink of the
/// section's first list element, excluding list links that point at a
/// loopback host (local gateway links, never a download host).
///
/// The primary is chosen from links outside that list, wherever in the
/// section they sit; a section holding nothing but the list yields
/// loopback-filtered list links only. Duplicates are removed by exact string
/// equality and `//host/path` links rewritten to `https://host/path`.
/// Returns `None` when no candidates survive - an empty sequence here is a
/// parse failure, not a success.
#[must_use]
pub fn find_final_download_links(html: &str) -> Option<Vec<String>> {
    let block = dom::find_block_by_id(html, "div", DOWNLOAD_BLOCK_ID)?;
    let list = dom::child_blocks(block, "ul").into_iter().next();
    let list_hrefs: Vec<String> = list
        .map(|fragment| {
            dom::links(fragment)
                .into_iter()
                .map(|link| link.href)
                .collect()
        })
        .unwrap_or_default();

    let mut urls: Vec<String> = Vec::new();
    if let Some(primary) = dom::links(block)
        .into_iter()
        .filter(|link| !list_hrefs.contains(&link.href))
        .find_map(|link| normalize_candidate(&link.href))
    {
        urls.push(primary);
    }
    for href in list_hrefs {
        let Some(url) = normalize_candidate(&href) else {
            continue;
        };
        if is_loopback(&url) || urls.contains(&url) {
            continue;
        }
        urls.push(url);
    }
    (!urls.is_empty()).then_some(urls)
}

/// Absolutizes a candidate href: protocol-relative links get `https:`,
/// anything that is not HTTP(S) afterwards is discarded.
fn normalize_candidate(href: &str) -> Option<String> {
    let href = href.trim();
    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    (href.starts_with("http://") || href.starts_with("https://")).then(|| href.to_string())
}

fn is_loopback(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .host_str()
                .map(|host| LOOPBACK_HOSTS.iter().any(|lo| host.eq_ignore_ascii_case(lo)))
        })
        .unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_link_from_mirrors_list() {
        let html = "<ul class=\"record_mirrors\">\
                    <li><a href=\"http://final.example/main/X\">Mirror 1</a></li>\
                    <li><a href=\"http://other.example/X\">Mirror 2</a></li></ul>";
        assert_eq!(
            find_fiction_detail_link(html).unwrap(),
            "http://final.example/main/X"
        );
    }

    #[test]
    fn test_detail_link_absent_without_marked_list() {
        let html = "<ul><li><a href=\"http://final.example/X\">M</a></li></ul>";
        assert!(find_fiction_detail_link(html).is_none());
    }

    #[test]
    fn test_final_links_primary_first_then_alternates() {
        let html = "<div id=\"download\">\
                    <h2><a href=\"http://dl.example/get/X\">GET</a></h2>\
                    <ul><li><a href=\"http://alt1.example/X\">Alt 1</a></li>\
                        <li><a href=\"http://alt2.example/X\">Alt 2</a></li></ul></div>";
        let urls = find_final_download_links(html).unwrap();
        assert_eq!(
            urls,
            vec![
                "http://dl.example/get/X",
                "http://alt1.example/X",
                "http://alt2.example/X"
            ]
        );
    }

    #[test]
    fn test_final_links_excludes_loopback_hosts() {
        let html = "<div id=\"download\"><h2><a href=\"http://dl.example/X\">GET</a></h2>\
                    <ul><li><a href=\"http://localhost:8080/ipfs/X\">local</a></li>\
                        <li><a href=\"http://127.0.0.1/ipfs/X\">local2</a></li>\
                        <li><a href=\"http://alt.example/X\">alt</a></li></ul></div>";
        let urls = find_final_download_links(html).unwrap();
        assert_eq!(urls, vec!["http://dl.example/X", "http://alt.example/X"]);
    }

    #[test]
    fn test_final_links_deduplicates_exact_strings() {
        let html = "<div id=\"download\"><h2><a href=\"http://dl.example/X\">GET</a></h2>\
                    <ul><li><a href=\"http://dl.example/X\">same</a></li>\
                        <li><a href=\"http://alt.example/X\">alt</a></li></ul></div>";
        let urls = find_final_download_links(html).unwrap();
        assert_eq!(urls, vec!["http://dl.example/X", "http://alt.example/X"]);
    }

    #[test]
    fn test_final_links_rewrites_protocol_relative() {
        let html = "<div id=\"download\">\
                    <h2><a href=\"//cdn.example/get/X\">GET</a></h2><ul></ul></div>";
        let urls = find_final_download_links(html).unwrap();
        assert_eq!(urls, vec!["https://cdn.example/get/X"]);
    }

    #[test]
    fn test_final_links_empty_section_is_none() {
        assert!(find_final_download_links("<div id=\"download\"><ul></ul></div>").is_none());
        assert!(find_final_download_links("<div id=\"other\"></div>").is_none());
        // relative hrefs are not valid binary candidates
        let html = "<div id=\"download\"><h2><a href=\"get.php?id=1\">GET</a></h2></div>";
        assert!(find_final_download_links(html).is_none());
    }

    #[test]
    fn test_final_links_list_only_section_filters_loopback() {
        // no standalone GET link: no list link may be promoted past the
        // loopback exclusion
        let html = "<div id=\"download\">\
                    <ul><li><a href=\"http://localhost:8080/ipfs/X\">local</a></li>\
                        <li><a href=\"http://alt.example/X\">alt</a></li></ul></div>";
        assert_eq!(
            find_final_download_links(html).unwrap(),
            vec!["http://alt.example/X"]
        );
    }

    #[test]
    fn test_final_links_list_only_loopback_section_is_none() {
        let html = "<div id=\"download\">\
                    <ul><li><a href=\"http://127.0.0.1/ipfs/X\">local</a></li></ul></div>";
        assert!(find_final_download_links(html).is_none());
    }

    #[test]
    fn test_final_links_primary_after_list_still_first() {
        let html = "<div id=\"download\">\
                    <ul><li><a href=\"http://alt.example/X\">alt</a></li></ul>\
                    <h2><a href=\"http://dl.example/X\">GET</a></h2></div>";
        assert_eq!(
            find_final_download_links(html).unwrap(),
            vec!["http://dl.example/X", "http://alt.example/X"]
        );
    }

    #[test]
    fn test_final_links_loopback_only_list_keeps_primary() {
        // the loopback exclusion applies to the alternates list
        let html = "<div id=\"download\"><h2><a href=\"http://dl.example/X\">GET</a></h2>\
                    <ul><li><a href=\"http://localhost:8080/ipfs/X\">local</a></li></ul></div>";
        assert_eq!(
            find_final_download_links(html).unwrap(),
            vec!["http://dl.example/X"]
        );
    }
}
