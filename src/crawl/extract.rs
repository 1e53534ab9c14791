//! Turn a fetched HTML page into text fragments and outbound links.

use reqwest::Url;
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Subtrees that never contribute text or links.
const IGNORED_TAGS: &[&str] = &["script", "style", "footer", "nav", "header", "noscript", "template"];

/// Elements whose text becomes one fragment each.
const BLOCK_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote"];

/// Path fragments that mark navigation, tag listings and infrastructure pages.
const INVALID_PATH_MARKERS: &[&str] = &["wp-login", "cdn-cgi", "tag"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Whitespace-collapsed text blocks in document order.
    pub fragments: Vec<String>,
    /// Absolute article-like links in document order, without duplicates.
    pub links: Vec<ExtractedLink>,
}

/// Extract fragments longer than `min_fragment_chars` characters and the
/// valid outbound links of `html`, resolving relative links against
/// `base_url`.
///
/// Text comes from paragraph, heading, list item and blockquote elements.
/// A page without any such block falls back to the text of its `article`
/// elements, then of its `body`.
pub fn extract_content(html: &str, base_url: &Url, min_fragment_chars: usize) -> ExtractedPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut blocks = Vec::new();
    let mut links = Vec::new();

    for element in root.descendent_elements() {
        if is_ignored(&element) {
            continue;
        }
        let tag = element.value().name();

        if BLOCK_TAGS.contains(&tag) && !has_block_ancestor(&element) {
            let text = element_text(&element);
            if !text.is_empty() {
                blocks.push(text);
            }
        } else if tag == "a" {
            if let Some(link) = resolve_link(&element, base_url) {
                if !links.iter().any(|l: &ExtractedLink| l.url == link.url) {
                    links.push(link);
                }
            }
        }
    }

    if blocks.is_empty() {
        blocks = fallback_blocks(&root);
    }

    ExtractedPage {
        fragments: blocks
            .into_iter()
            .filter(|block| block.chars().count() > min_fragment_chars)
            .collect(),
        links,
    }
}

/// Whether `url` looks like an article link rather than a tag listing,
/// login page or CDN endpoint.
pub fn is_valid_link(url: &Url) -> bool {
    let path = url.path();
    INVALID_PATH_MARKERS
        .iter()
        .all(|marker| !path.contains(marker))
}

fn resolve_link(anchor: &ElementRef<'_>, base_url: &Url) -> Option<ExtractedLink> {
    let href = anchor.value().attr("href")?.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut url = base_url.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") || !is_valid_link(&url) {
        return None;
    }
    url.set_fragment(None);
    Some(ExtractedLink {
        url: url.to_string(),
        text: element_text(anchor),
    })
}

fn fallback_blocks(root: &ElementRef<'_>) -> Vec<String> {
    let articles: Vec<String> = root
        .descendent_elements()
        .filter(|e| e.value().name() == "article" && !is_ignored(e))
        .map(|e| element_text(&e))
        .filter(|text| !text.is_empty())
        .collect();
    if !articles.is_empty() {
        return articles;
    }

    root.descendent_elements()
        .find(|e| e.value().name() == "body")
        .map(|body| element_text(&body))
        .filter(|text| !text.is_empty())
        .into_iter()
        .collect()
}

fn is_ignored(element: &ElementRef<'_>) -> bool {
    IGNORED_TAGS.contains(&element.value().name())
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| IGNORED_TAGS.contains(&ancestor.value().name()))
}

fn has_block_ancestor(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| BLOCK_TAGS.contains(&ancestor.value().name()))
}

fn element_text(element: &ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: &ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !IGNORED_TAGS.contains(&child.value().name()) {
                        collect_text(&child, out);
                    }
                }
            }
            _ => {}
        }
    }
}
