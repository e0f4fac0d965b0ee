use regex::Regex;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("Invalid slug punctuation regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("Invalid slug separator regex"));
static DASH_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-+").expect("Invalid slug dash regex"));

/// Render a heading title as a path segment.
///
/// Lowercases, drops punctuation, turns whitespace and underscores into
/// single dashes. Non-ASCII letters are kept. Titles with no usable
/// characters become `section`.
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let stripped = NON_WORD.replace_all(&lower, "");
    let dashed = SEPARATORS.replace_all(&stripped, "-");
    let collapsed = DASH_RUNS.replace_all(&dashed, "-");
    let slug = collapsed.trim_matches('-');
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.to_string()
    }
}
