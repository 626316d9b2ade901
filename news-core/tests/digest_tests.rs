use chrono::Utc;
use news_core::digest::{compose, compose_with_budget};
use news_core::{Category, NewsItem};

fn item(title: &str, description: &str) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        description: description.to_string(),
        url: format!("http://e/{}", title),
        source: "TestWire".to_string(),
        category: Category::Technology,
        published_at: "2026-08-01T09:00:00Z".to_string(),
        fetched_at: Utc::now(),
    }
}

#[test]
fn digest_is_bounded_by_max_items() {
    let items: Vec<NewsItem> = (1..=8)
        .map(|i| item(&format!("Story {}", i), "short"))
        .collect();

    let text = compose(&items, 5);
    assert!(text.contains("5 fresh stories"));
    assert!(text.contains("5. Story 5"));
    assert!(!text.contains("Story 6"));
}

#[test]
fn long_descriptions_are_truncated_to_the_budget() {
    let long = "x".repeat(300);
    let items = vec![item("Story", &long)];

    let text = compose_with_budget(&items, 5, 100);
    let rendered = format!("{}...", "x".repeat(100));
    assert!(text.contains(&rendered));
    assert!(!text.contains(&"x".repeat(101)));
}

#[test]
fn short_descriptions_are_kept_verbatim() {
    let items = vec![item("Story", "short and sweet")];
    let text = compose(&items, 5);
    assert!(text.contains("short and sweet"));
    assert!(!text.contains("short and sweet..."));
}

#[test]
fn truncation_respects_multibyte_characters() {
    let cyrillic = "и".repeat(150);
    let items = vec![item("Story", &cyrillic)];

    // Must not panic on a non-ASCII boundary.
    let text = compose_with_budget(&items, 5, 100);
    assert!(text.contains(&format!("{}...", "и".repeat(100))));
}

#[test]
fn empty_batch_yields_the_no_news_variant() {
    let text = compose(&[], 5);
    assert!(!text.is_empty());
    assert!(text.contains("No fresh news"));
}

#[test]
fn composition_is_deterministic() {
    let items = vec![item("Alpha", "a"), item("Beta", "b")];
    assert_eq!(compose(&items, 5), compose(&items, 5));
}
