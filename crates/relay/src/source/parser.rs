//! Profile page HTML parser.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::types::Post;

/// Upper bound on status links inspected by the fallback strategy.
const FALLBACK_LINK_LIMIT: usize = 30;

static STATUS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"status/(\d+)").expect("Invalid status id regex"));

static ARTICLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"article[data-testid="tweet"]"#).expect("Invalid article selector")
});
static STATUS_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/status/"]"#).expect("Invalid link selector"));
static LANG_TEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[lang]").expect("Invalid lang text selector"));
static TIME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("time[datetime]").expect("Invalid time selector"));

/// Extracts posts from a rendered profile page.
pub struct PostParser;

impl PostParser {
    /// Parse posts from page HTML, in page order (newest first).
    ///
    /// `origin` (e.g. `https://mobile.twitter.com`) is used to make relative
    /// links absolute. Post articles are preferred; when the page has none,
    /// bare status links are used instead.
    pub fn parse(html: &str, origin: &str) -> Vec<Post> {
        let document = Html::parse_document(html);
        let origin = origin.trim_end_matches('/');

        let articles: Vec<_> = document.select(&ARTICLE).collect();
        tracing::debug!(article_count = articles.len(), "Found post containers");

        let posts = if articles.is_empty() {
            Self::parse_status_links(&document, origin)
        } else {
            articles
                .into_iter()
                .filter_map(|article| Self::parse_article(article, origin))
                .collect()
        };

        let posts = dedup_by_id(posts);
        if posts.is_empty() {
            tracing::warn!(
                "No posts found in HTML (selectors: article[data-testid=tweet], a[href*=/status/]). \
                 The page may require a login or the markup may have changed."
            );
        } else {
            tracing::info!(count = posts.len(), "Parsed posts from HTML");
        }
        posts
    }

    fn parse_article(article: ElementRef<'_>, origin: &str) -> Option<Post> {
        let Some(href) = article
            .select(&STATUS_LINK)
            .find_map(|link| link.value().attr("href"))
        else {
            tracing::debug!("Post container missing status link, skipping");
            return None;
        };

        let url = absolute_url(href, origin);
        let id = Self::extract_status_id(href).unwrap_or_else(|| url.clone());

        let text = article
            .select(&LANG_TEXT)
            .next()
            .map_or_else(|| element_text(article), element_text);

        let timestamp = article
            .select(&TIME)
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .and_then(normalize_timestamp);

        tracing::debug!(id = %id, "Parsed post");
        Some(Post {
            id,
            url,
            text,
            timestamp,
        })
    }

    fn parse_status_links(document: &Html, origin: &str) -> Vec<Post> {
        document
            .select(&STATUS_LINK)
            .take(FALLBACK_LINK_LIMIT)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                let id = Self::extract_status_id(href).unwrap_or_else(|| href.to_string());

                let text = link
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|el| el.value().name() == "div")
                    .map(|container| {
                        container
                            .select(&LANG_TEXT)
                            .next()
                            .map_or_else(|| element_text(container), element_text)
                    })
                    .unwrap_or_default();

                Some(Post {
                    id,
                    url: absolute_url(href, origin),
                    text,
                    timestamp: None,
                })
            })
            .collect()
    }

    /// Extract the numeric status id from a post link (full or relative).
    pub fn extract_status_id(url: &str) -> Option<String> {
        STATUS_ID
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn absolute_url(href: &str, origin: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{origin}{href}")
    } else {
        format!("{origin}/{href}")
    }
}

/// Normalise a `datetime` attribute to RFC 3339, keeping unparseable values as-is.
fn normalize_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
            .unwrap_or_else(|_| raw.to_string()),
    )
}

/// Keep the first post for each id; photo and analytics links repeat it.
fn dedup_by_id(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|post| seen.insert(post.id.clone()))
        .collect()
}
