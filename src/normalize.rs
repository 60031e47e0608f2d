//! Input cleanup applied before text is sent upstream.
//!
//! Markup is reduced to its visible text, image references are dropped and
//! whitespace is collapsed. The function never fails; an input made only of
//! markup or images normalizes to an empty string.

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

/// Markdown image references, `![alt](url)`.
static MARKDOWN_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[.*?\]\(.*?\)").unwrap());

/// Bare image URLs. The extension match is case-sensitive.
static IMAGE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+\.(jpg|jpeg|png|gif|webp|svg)").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn normalize(raw: &str) -> String {
    let text = strip_markup(raw);
    let text = MARKDOWN_IMAGE.replace_all(&text, "");
    let text = IMAGE_URL.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Parses `raw` as an HTML fragment and concatenates every text node.
fn strip_markup(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    fragment.root_element().text().collect()
}
