//! HTML parser for extracting link references
//!
//! This module turns a page body into the list of references to verify:
//! - `<a href>` hyperlinks, with their visible text and title
//! - `<link href>` resources (stylesheets, icons, canonical links)
//! - `<img src>` images, with their alt text and title

use scraper::{ElementRef, Html, Selector};
use std::fmt;
use url::Url;

/// Maximum length, in characters, of display text and titles
pub const MAX_TEXT_LEN: usize = 100;

/// Placeholder display text for anchors without visible text
pub const NO_TEXT: &str = "[No text]";

/// The kind of element a reference was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// `<a href>`
    Hyperlink,
    /// `<link href>`
    Stylesheet,
    /// `<img src>`
    Image,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hyperlink => "link",
            Self::Stylesheet => "stylesheet",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reference extracted from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    /// Absolute URL, resolved against the page URL
    pub url: String,

    /// Display text, at most [`MAX_TEXT_LEN`] characters
    pub text: String,

    /// Title attribute, empty if absent
    pub title: String,

    pub kind: LinkKind,
}

/// Extracts every link reference from an HTML document
///
/// # Extraction Rules
///
/// **Include** (in document order, duplicates kept):
/// - `<a href="...">` with the element's visible text, or `[No text]`
/// - `<link href="...">` with text `[<rel> stylesheet]` or `[stylesheet]`
/// - `<img src="...">` with text `[IMG: <alt>]` or `[Image]`
///
/// **Exclude:**
/// - Empty `href`/`src` values
/// - References that do not resolve to an `http` or `https` URL
///   (`javascript:`, `mailto:`, `tel:`, `data:` and unparseable values)
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
///
/// # Example
///
/// ```
/// use link_sentry::crawler::{extract_links, LinkKind};
/// use url::Url;
///
/// let html = r#"<a href="/about" title="About us">About</a><img src="logo.png" alt="Logo">"#;
/// let base = Url::parse("https://example.com/index.html").unwrap();
/// let links = extract_links(html, &base);
///
/// assert_eq!(links[0].url, "https://example.com/about");
/// assert_eq!(links[0].text, "About");
/// assert_eq!(links[1].kind, LinkKind::Image);
/// assert_eq!(links[1].text, "[IMG: Logo]");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<LinkReference> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse("a[href], link[href], img[src]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| reference_from_element(element, base_url))
        .collect()
}

/// Builds a reference from a matched element, or `None` if it is unusable
fn reference_from_element(element: ElementRef<'_>, base_url: &Url) -> Option<LinkReference> {
    let el = element.value();

    match el.name() {
        "a" => {
            let url = resolve_link(el.attr("href")?, base_url)?;
            let text = visible_text(element);
            Some(LinkReference {
                url,
                text: if text.is_empty() {
                    NO_TEXT.to_string()
                } else {
                    truncate(&text)
                },
                title: truncate(el.attr("title").unwrap_or_default()),
                kind: LinkKind::Hyperlink,
            })
        }
        "link" => {
            let url = resolve_link(el.attr("href")?, base_url)?;
            let rel = el
                .attr("rel")
                .and_then(|rel| rel.split_whitespace().next())
                .unwrap_or_default();
            let text = if rel.is_empty() {
                "[stylesheet]".to_string()
            } else {
                format!("[{} stylesheet]", rel)
            };
            Some(LinkReference {
                url,
                text: truncate(&text),
                title: String::new(),
                kind: LinkKind::Stylesheet,
            })
        }
        "img" => {
            let url = resolve_link(el.attr("src")?, base_url)?;
            let alt = el.attr("alt").map(str::trim).unwrap_or_default();
            let text = if alt.is_empty() {
                "[Image]".to_string()
            } else {
                format!("[IMG: {}]", alt)
            };
            Some(LinkReference {
                url,
                text: truncate(&text),
                title: truncate(el.attr("title").unwrap_or_default()),
                kind: LinkKind::Image,
            })
        }
        _ => None,
    }
}

/// Collects an element's text with whitespace runs collapsed
fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncates to [`MAX_TEXT_LEN`] characters, never splitting a character
fn truncate(text: &str) -> String {
    text.trim().chars().take(MAX_TEXT_LEN).collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - empty values
/// - javascript:, mailto:, tel:, data: and other non-HTTP(S) schemes
/// - values that fail to resolve
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/dir/page").unwrap()
    }

    fn urls(links: &[LinkReference]) -> Vec<&str> {
        links.iter().map(|l| l.url.as_str()).collect()
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        let links = extract_links(html, &base_url());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://other.com/page");
        assert_eq!(links[0].kind, LinkKind::Hyperlink);
    }

    #[test]
    fn test_extract_relative_links() {
        let html = r#"<a href="/root">A</a><a href="sibling">B</a><a href="../up">C</a>"#;
        let links = extract_links(html, &base_url());
        assert_eq!(
            urls(&links),
            vec![
                "https://example.com/root",
                "https://example.com/dir/sibling",
                "https://example.com/up",
            ]
        );
    }

    #[test]
    fn test_link_text_and_title() {
        let html = r#"<a href="/a" title="  The title ">  Read <b>more</b>
            here </a>"#;
        let links = extract_links(html, &base_url());
        assert_eq!(links[0].text, "Read more here");
        assert_eq!(links[0].title, "The title");
    }

    #[test]
    fn test_empty_text_placeholder() {
        let html = r#"<a href="/a"><img src="/icon.png"></a><a href="/b">   </a>"#;
        let links = extract_links(html, &base_url());
        let anchors: Vec<_> = links
            .iter()
            .filter(|l| l.kind == LinkKind::Hyperlink)
            .collect();
        assert_eq!(anchors.len(), 2);
        assert!(anchors.iter().all(|l| l.text == NO_TEXT));
        assert!(anchors.iter().all(|l| l.title.is_empty()));
    }

    #[test]
    fn test_text_and_title_truncated() {
        let long = "x".repeat(250);
        let html = format!(r#"<a href="/a" title="{long}">{long}</a>"#, long = long);
        let links = extract_links(&html, &base_url());
        assert_eq!(links[0].text.chars().count(), MAX_TEXT_LEN);
        assert_eq!(links[0].title.chars().count(), MAX_TEXT_LEN);
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "é".repeat(150);
        assert_eq!(truncate(&text).chars().count(), MAX_TEXT_LEN);
    }

    #[test]
    fn test_stylesheet_references() {
        let html = r#"<head>
            <link rel="stylesheet" href="/css/site.css">
            <link rel="icon shortcut" href="/favicon.ico">
            <link href="/no-rel.css">
        </head>"#;
        let links = extract_links(html, &base_url());
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|l| l.kind == LinkKind::Stylesheet));
        assert_eq!(links[0].text, "[stylesheet stylesheet]");
        assert_eq!(links[0].url, "https://example.com/css/site.css");
        assert_eq!(links[1].text, "[icon stylesheet]");
        assert_eq!(links[2].text, "[stylesheet]");
    }

    #[test]
    fn test_image_references() {
        let html = r#"<img src="/a.png" alt="A cat" title="Cat"><img src="b.png">"#;
        let links = extract_links(html, &base_url());
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "[IMG: A cat]");
        assert_eq!(links[0].title, "Cat");
        assert_eq!(links[1].text, "[Image]");
        assert_eq!(links[1].url, "https://example.com/dir/b.png");
    }

    #[test]
    fn test_document_order_and_duplicates() {
        let html = r#"<html><head><link rel="stylesheet" href="/s.css"></head><body>
            <a href="/one">One</a>
            <img src="/pic.png">
            <a href="/one">One again</a>
        </body></html>"#;
        let links = extract_links(html, &base_url());
        assert_eq!(
            urls(&links),
            vec![
                "https://example.com/s.css",
                "https://example.com/one",
                "https://example.com/pic.png",
                "https://example.com/one",
            ]
        );
    }

    #[test]
    fn test_fragment_links_resolve_to_page() {
        let html = r##"<a href="#section">Jump</a>"##;
        let links = extract_links(html, &base_url());
        assert_eq!(links[0].url, "https://example.com/dir/page#section");
    }

    #[test]
    fn test_skip_non_http_schemes() {
        let html = r#"
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:test@example.com">Mail</a>
            <a href="tel:+1234567890">Call</a>
            <img src="data:image/png;base64,AAAA">
            <a href="ftp://example.com/file">FTP</a>
        "#;
        assert!(extract_links(html, &base_url()).is_empty());
    }

    #[test]
    fn test_skip_empty_and_missing_attributes() {
        let html = r#"<a href="">Empty</a><a name="anchor">No href</a><img alt="no src"><link rel="x">"#;
        assert!(extract_links(html, &base_url()).is_empty());
    }

    #[test]
    fn test_garbage_html_does_not_panic() {
        let html = "<<<a href='/x'>>>unclosed <img src=";
        let links = extract_links(html, &base_url());
        assert!(links.len() <= 1);
    }
}
