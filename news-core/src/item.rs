use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::RawArticle;

/// Substituted when the provider omits the description field.
pub const DESCRIPTION_PLACEHOLDER: &str = "No description available";

/// Articles the provider has withdrawn keep this URL; they carry no
/// readable content and are rejected outright.
pub const REMOVED_URL_SENTINEL: &str = "https://removed.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Science,
    Business,
    Health,
    Sports,
    Entertainment,
    General,
    Search,
}

impl Category {
    /// Fixed category order walked on every headline refresh.
    pub const HEADLINE_ROTATION: [Category; 5] = [
        Category::Technology,
        Category::Science,
        Category::Business,
        Category::Health,
        Category::Sports,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Science => "science",
            Category::Business => "business",
            Category::Health => "health",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
            Category::General => "general",
            Category::Search => "search",
        }
    }

    /// Parses a user-supplied category name. `Search` is synthetic
    /// (keyword results only) and deliberately not accepted here.
    pub fn parse(input: &str) -> Option<Category> {
        match input.trim().to_lowercase().as_str() {
            "technology" => Some(Category::Technology),
            "science" => Some(Category::Science),
            "business" => Some(Category::Business),
            "health" => Some(Category::Health),
            "sports" => Some(Category::Sports),
            "entertainment" => Some(Category::Entertainment),
            "general" => Some(Category::General),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized news entry. Two items are the same story exactly
/// when their titles match, everywhere in the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
    pub category: Category,
    /// Provider-supplied publication timestamp, kept verbatim.
    pub published_at: String,
    pub fetched_at: DateTime<Utc>,
}

impl NewsItem {
    pub fn identity(&self) -> &str {
        &self.title
    }
}

/// Maps a raw provider record into a `NewsItem`, or rejects it.
///
/// A record needs a non-empty title and a non-sentinel, non-empty URL; a
/// missing description is replaced with the placeholder rather than
/// rejected.
pub fn normalize(raw: RawArticle, category: Category, now: DateTime<Utc>) -> Option<NewsItem> {
    let title = raw.title.filter(|t| !t.trim().is_empty())?;
    let url = raw
        .url
        .filter(|u| !u.trim().is_empty() && u != REMOVED_URL_SENTINEL)?;

    let description = raw
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string());

    Some(NewsItem {
        title,
        description,
        url,
        source: raw.source.and_then(|s| s.name).unwrap_or_default(),
        category,
        published_at: raw.published_at.unwrap_or_default(),
        fetched_at: now,
    })
}

/// Collapses duplicate identities within one batch; first occurrence wins
/// and relative order is preserved.
pub fn dedupe(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.identity().to_string()))
        .collect()
}

/// Built-in demonstration batch served when the provider is unreachable
/// and nothing is cached.
pub fn sample_items() -> Vec<NewsItem> {
    let now = Utc::now();
    vec![
        NewsItem {
            title: "AI model learns to solve complex reasoning tasks".to_string(),
            description: "Researchers presented a new machine-learning model able to work through \
                          multi-step reasoning problems."
                .to_string(),
            url: "https://example.com/ai-news".to_string(),
            source: "TechNews".to_string(),
            category: Category::Technology,
            published_at: now.to_rfc3339(),
            fetched_at: now,
        },
        NewsItem {
            title: "Quantum breakthrough promises a new era of cryptography".to_string(),
            description: "Scientists reported a major advance in quantum computing with direct \
                          implications for encryption."
                .to_string(),
            url: "https://example.com/quantum-news".to_string(),
            source: "ScienceDaily".to_string(),
            category: Category::Science,
            published_at: now.to_rfc3339(),
            fetched_at: now,
        },
    ]
}
