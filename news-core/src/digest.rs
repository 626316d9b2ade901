use std::fmt::Write;

use crate::item::NewsItem;

/// Character budget for each description line in the digest.
pub const DESCRIPTION_BUDGET: usize = 100;

/// Default number of items a digest carries.
pub const DIGEST_MAX_ITEMS: usize = 5;

/// Builds the broadcast digest text from the current batch.
///
/// Deterministic for a given input, and never blank: an empty batch
/// produces the fixed "no fresh news" variant instead.
pub fn compose(items: &[NewsItem], max_items: usize) -> String {
    compose_with_budget(items, max_items, DESCRIPTION_BUDGET)
}

pub fn compose_with_budget(items: &[NewsItem], max_items: usize, budget: usize) -> String {
    if items.is_empty() {
        return "Good morning! No fresh news made it into today's digest. \
                Try /news later in the day."
            .to_string();
    }

    let selected = &items[..items.len().min(max_items)];

    let mut digest = String::new();
    digest.push_str("Good morning! Here is your daily news digest.\n\n");
    let _ = writeln!(digest, "Today we have {} fresh stories:\n", selected.len());

    for (i, item) in selected.iter().enumerate() {
        let _ = writeln!(digest, "{}. {}", i + 1, item.title);
        let _ = writeln!(digest, "   {}", truncate_chars(&item.description, budget));
        let _ = writeln!(digest, "   {} | {}", item.category, item.source);
        let _ = writeln!(digest, "   {}\n", item.url);
    }

    digest.push_str("Use /news for the full list or /favorites for your saved stories.");
    digest
}

/// Cuts a string to `budget` characters on a char boundary, appending an
/// ellipsis only when something was dropped.
fn truncate_chars(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(budget).collect();
    truncated.push_str("...");
    truncated
}
