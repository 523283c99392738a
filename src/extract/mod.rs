//! Generic selector-map-driven page extraction.
//!
//! One extraction function consumes fetched HTML plus the per-page
//! [`SelectorMap`] from configuration and produces a [`Snapshot`].
//! Absence of content is a valid state, not a fault: a selector that
//! matches nothing (or fails to parse) leaves the corresponding field
//! empty.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};

use crate::domain::{BlogPost, Heading, PageType, SelectorMap, Snapshot, TargetId};

/// Currency pattern: `$` + digits + optional decimal + optional
/// `/mo|/month|/year` suffix. `month` is listed before `mo` so the
/// longer suffix wins.
const PRICING_PATTERN: &str =
    r"\$\d+(?:,\d{3})*(?:\.\d{1,2})?(?:\s*/\s*(?:month|mo|year))?";

/// Statistic claim pattern: a number (optionally `+`-suffixed) followed
/// by one of the tracked nouns.
const STATISTICS_PATTERN: &str =
    r"(?i)\d[\d,]*\+?\s+(?:clients|customers|practices|reviews)\b";

const DEFAULT_HEADINGS_SELECTOR: &str = "h1, h2, h3";

// Fixed patterns and selectors compile once; a failed compile degrades
// to "field absent", matching the parse-failure recovery rule.
static PRICING_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(PRICING_PATTERN).ok());
static STATISTICS_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(STATISTICS_PATTERN).ok());
static TITLE_SELECTOR: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("title").ok());
static META_DESCRIPTION_SELECTOR: Lazy<Option<Selector>> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).ok());
static ANCHOR_SELECTOR: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("a").ok());

/// Extracts a snapshot from fetched HTML using the page's selector map.
#[must_use]
pub fn extract_snapshot(
    html: &str,
    target_id: TargetId,
    page_type: PageType,
    selectors: &SelectorMap,
    captured_at: DateTime<Utc>,
) -> Snapshot {
    let document = Html::parse_document(html);
    let mut snapshot = Snapshot::empty(target_id, page_type, captured_at);

    snapshot.title = document_title(&document);
    snapshot.meta_description = meta_description(&document);
    snapshot.headings = headings(&document, selectors.headings.as_deref());

    let text = visible_text(&document, selectors.content.as_deref());
    snapshot.pricing = pricing_strings(&text);
    snapshot.statistics = statistic_strings(&text);
    snapshot.content_hash = content_hash(&text);

    if let Some(post_selector) = selectors.blog_post.as_deref() {
        snapshot.blog_posts = blog_posts(&document, post_selector);
    }

    snapshot
}

/// Document title, empty when absent.
#[must_use]
pub fn document_title(document: &Html) -> String {
    let Some(selector) = TITLE_SELECTOR.as_ref() else {
        return String::new();
    };
    document
        .select(selector)
        .next()
        .map(|el| collapse_whitespace(el.text()))
        .unwrap_or_default()
}

/// Content attribute of the description meta tag, empty when absent.
#[must_use]
pub fn meta_description(document: &Html) -> String {
    let Some(selector) = META_DESCRIPTION_SELECTOR.as_ref() else {
        return String::new();
    };
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Ordered heading texts with levels. The selector defaults to
/// `h1, h2, h3`; non-heading elements matched by a custom selector get
/// level 0.
#[must_use]
pub fn headings(document: &Html, selector: Option<&str>) -> Vec<Heading> {
    let raw = selector.unwrap_or(DEFAULT_HEADINGS_SELECTOR);
    let Ok(selector) = Selector::parse(raw) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|el| {
            let text = collapse_whitespace(el.text());
            if text.is_empty() {
                return None;
            }
            let level = el
                .value()
                .name()
                .strip_prefix('h')
                .and_then(|d| d.parse().ok())
                .unwrap_or(0);
            Some(Heading { level, text })
        })
        .collect()
}

/// Visible text of the page, whitespace-collapsed, with script/style
/// content excluded. When `content` names a selector, only the matched
/// region(s) contribute.
#[must_use]
pub fn visible_text(document: &Html, content: Option<&str>) -> String {
    if let Some(raw) = content
        && let Ok(selector) = Selector::parse(raw)
    {
        let mut regions: Vec<String> = Vec::new();
        for el in document.select(&selector) {
            regions.push(element_visible_text(el));
        }
        if !regions.is_empty() {
            return regions.join(" ");
        }
        // Configured region matched nothing; fall through to the whole
        // document so hashing still has something to work with.
    }
    element_visible_text(document.root_element())
}

fn element_visible_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| {
                matches!(e.name(), "script" | "style" | "noscript" | "template")
            }))
            .unwrap_or(false);
        if hidden {
            continue;
        }
        for word in text.text.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

/// All currency matches in the text, deduplicated, first-appearance
/// order preserved.
#[must_use]
pub fn pricing_strings(text: &str) -> Vec<String> {
    regex_matches(PRICING_RE.as_ref(), text)
}

/// All statistic-claim matches in the text, deduplicated.
#[must_use]
pub fn statistic_strings(text: &str) -> Vec<String> {
    regex_matches(STATISTICS_RE.as_ref(), text)
}

fn regex_matches(re: Option<&Regex>, text: &str) -> Vec<String> {
    let Some(re) = re else {
        return Vec::new();
    };
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for m in re.find_iter(text) {
        if seen.insert(m.as_str()) {
            out.push(m.as_str().to_string());
        }
    }
    out
}

/// Truncated hex SHA-256 digest of the visible text.
///
/// Sixteen hex characters are plenty for "did anything change" while
/// keeping snapshot files short.
#[must_use]
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(16);
    digest
}

/// Blog post title/link pairs for the configured anchor selector.
///
/// When the selector matches a non-anchor container, the first anchor
/// inside it supplies the link.
#[must_use]
pub fn blog_posts(document: &Html, selector: &str) -> Vec<BlogPost> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|el| {
            let anchor = if el.value().name() == "a" {
                Some(el)
            } else {
                ANCHOR_SELECTOR
                    .as_ref()
                    .and_then(|a| el.select(a).next())
            };
            let anchor = anchor?;
            let href = anchor.value().attr("href")?.trim().to_string();
            let title = collapse_whitespace(el.text());
            if title.is_empty() || href.is_empty() {
                return None;
            }
            Some(BlogPost { title, href })
        })
        .collect()
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for part in parts {
        for word in part.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = r#"<!DOCTYPE html>
        <html><head>
            <title>  Pricing —
                Acme Dental </title>
            <meta name="description" content=" Practice software plans ">
            <style>.hidden { display: none; }</style>
        </head><body>
            <h1>Plans</h1>
            <h2>For growing practices</h2>
            <script>var tracking = "$999/mo";</script>
            <main>
                <p>Plans start at $49.99/mo and $199/year. Still $49.99/mo.</p>
                <p>Trusted by 1,200+ practices and 500+ clients.</p>
            </main>
            <ul class="posts">
                <li class="post"><a href="/blog/whitening">Whitening 101</a></li>
                <li class="post"><a href="/blog/retention"> Patient   retention </a></li>
            </ul>
        </body></html>"#;

    #[test]
    fn pricing_strings_dedupe_and_preserve_order() {
        let prices = pricing_strings("Plans start at $49.99/mo and $199/year");
        assert_eq!(prices, vec!["$49.99/mo".to_string(), "$199/year".to_string()]);
    }

    #[test]
    fn pricing_strings_handle_thousands_and_spaced_suffix() {
        let prices = pricing_strings("Enterprise is $1,299.00 / month, annual $12,000");
        assert_eq!(
            prices,
            vec!["$1,299.00 / month".to_string(), "$12,000".to_string()]
        );
    }

    #[test]
    fn statistic_strings_match_tracked_nouns() {
        let stats = statistic_strings("Trusted by 1,200+ practices and 500+ clients, not 3 cats");
        assert_eq!(
            stats,
            vec!["1,200+ practices".to_string(), "500+ clients".to_string()]
        );
    }

    #[test]
    fn content_hash_is_short_and_deterministic() {
        let a = content_hash("same text");
        let b = content_hash("same text");
        let c = content_hash("different text");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn extracts_full_snapshot_from_document() {
        let captured_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap_or_default();
        let selectors = SelectorMap {
            headings: None,
            content: Some("main".to_string()),
            blog_post: Some("li.post".to_string()),
        };
        let snap = extract_snapshot(
            PAGE,
            TargetId::new("acme"),
            PageType::Pricing,
            &selectors,
            captured_at,
        );

        assert_eq!(snap.title, "Pricing — Acme Dental");
        assert_eq!(snap.meta_description, "Practice software plans");
        assert_eq!(
            snap.headings,
            vec![
                Heading { level: 1, text: "Plans".to_string() },
                Heading { level: 2, text: "For growing practices".to_string() },
            ]
        );
        // Scoped to <main>: the script's "$999/mo" must not leak in.
        assert_eq!(
            snap.pricing,
            vec!["$49.99/mo".to_string(), "$199/year".to_string()]
        );
        assert_eq!(
            snap.statistics,
            vec!["1,200+ practices".to_string(), "500+ clients".to_string()]
        );
        assert_eq!(
            snap.blog_posts,
            vec![
                BlogPost { title: "Whitening 101".to_string(), href: "/blog/whitening".to_string() },
                BlogPost { title: "Patient retention".to_string(), href: "/blog/retention".to_string() },
            ]
        );
        assert_eq!(snap.content_hash.len(), 16);
        assert!(!snap.is_errored());
    }

    #[test]
    fn script_and_style_text_is_not_visible() {
        let document = Html::parse_document(PAGE);
        let text = visible_text(&document, None);
        assert!(!text.contains("$999/mo"));
        assert!(!text.contains("display: none"));
        assert!(text.contains("$49.99/mo"));
    }

    #[test]
    fn missing_selectors_leave_fields_empty() {
        let captured_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap_or_default();
        let selectors = SelectorMap {
            headings: Some("h5.nonexistent".to_string()),
            content: None,
            blog_post: Some("div.no-such-post".to_string()),
        };
        let snap = extract_snapshot(
            "<html><body><p>No structure here</p></body></html>",
            TargetId::new("acme"),
            PageType::Home,
            &selectors,
            captured_at,
        );
        assert!(snap.title.is_empty());
        assert!(snap.meta_description.is_empty());
        assert!(snap.headings.is_empty());
        assert!(snap.blog_posts.is_empty());
        assert!(snap.pricing.is_empty());
    }

    #[test]
    fn unparseable_selector_degrades_to_absent() {
        let document = Html::parse_document(PAGE);
        assert!(headings(&document, Some(":::not-a-selector")).is_empty());
        assert!(blog_posts(&document, ":::not-a-selector").is_empty());
    }
}
