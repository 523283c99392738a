//! Monitored target definitions.
//!
//! A [`Target`] is one monitored competitor: a stable identifier, a
//! display name, a domain, and a per-page-type map of URLs and
//! extraction selectors. Targets are defined in static configuration
//! and read-only at runtime.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a monitored target.
///
/// Wraps the slug defined in the targets file (e.g. `"acme-dental"`).
/// Used as the directory key in the snapshot store and as the log/event
/// discriminator, so it must stay filesystem-safe: construction
/// lowercases the value and replaces path-hostile characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Creates a `TargetId` from a raw slug, normalizing it to a
    /// lowercase filesystem-safe form.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let slug: String = raw
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        Self(slug)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TargetId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Kind of page being monitored on a target.
///
/// Serialized as its snake_case name; unrecognized names round-trip
/// through [`PageType::Other`] so new page kinds can be added in
/// configuration without a code change.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageType {
    /// Landing page.
    Home,
    /// Pricing/plans page.
    Pricing,
    /// Blog index page.
    Blog,
    /// Features/product page.
    Features,
    /// Any other configured page kind.
    Other(String),
}

impl PageType {
    /// Returns the page type as a string slice, used in file names and
    /// log fields.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Home => "home",
            Self::Pricing => "pricing",
            Self::Blog => "blog",
            Self::Features => "features",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for PageType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "home" => Self::Home,
            "pricing" => Self::Pricing,
            "blog" => Self::Blog,
            "features" => Self::Features,
            _ => Self::Other(raw.to_lowercase()),
        }
    }
}

impl From<PageType> for String {
    fn from(page: PageType) -> Self {
        page.as_str().to_string()
    }
}

/// Declarative extraction configuration for one page.
///
/// Consumed by the generic extractor; every field is optional and an
/// unset or non-matching selector simply leaves the corresponding
/// snapshot field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorMap {
    /// CSS selector for headings. Defaults to `h1, h2, h3` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headings: Option<String>,

    /// CSS selector scoping the visible-text region used for pricing,
    /// statistics, and the content hash. Whole document when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// CSS selector for blog post link anchors (title + href pairs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog_post: Option<String>,
}

/// URL and selectors for one monitored page of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    /// Absolute URL of the page.
    pub url: String,

    /// Extraction selectors for the page.
    #[serde(default)]
    pub selectors: SelectorMap,
}

/// One monitored competitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Stable identifier (directory key, log discriminator).
    pub id: TargetId,

    /// Human-readable name used in reports and alerts.
    pub name: String,

    /// Apex domain, also used for ranking position lookups.
    pub domain: String,

    /// Monitored pages keyed by page type. `BTreeMap` keeps scan and
    /// report ordering deterministic.
    #[serde(default)]
    pub pages: BTreeMap<PageType, PageSpec>,
}
