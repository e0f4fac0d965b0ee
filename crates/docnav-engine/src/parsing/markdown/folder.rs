use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[_-](.+)$").expect("Invalid numeric prefix regex"));

/// Reading order for the Markdown files of a folder tree.
///
/// Every path component is ranked in turn, so a directory's files stay
/// together: `index.md` and `README.md` lead their directory, then names with
/// a numeric prefix in numeric order (`2_` before `10_`), then the rest
/// alphabetically.
pub fn sort_markdown_files(mut files: Vec<PathBuf>, root: &Path) -> Vec<PathBuf> {
    files.sort_by_cached_key(|path| sort_key(path.strip_prefix(root).unwrap_or(path)));
    files
}

fn sort_key(relative: &Path) -> Vec<(u8, u64, String)> {
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let last = parts.len().saturating_sub(1);

    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            let lower = part.to_lowercase();
            if i == last && (lower == "index.md" || lower == "readme.md") {
                return (0, 0, String::new());
            }
            match NUMERIC_PREFIX.captures(&part) {
                Some(caps) => match caps[1].parse::<u64>() {
                    Ok(n) => (1, n, caps[2].to_string()),
                    Err(_) => (2, 0, lower),
                },
                None => (2, 0, lower),
            }
        })
        .collect()
}
