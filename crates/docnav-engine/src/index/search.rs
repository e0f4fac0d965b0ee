use serde::Serialize;

use super::StructureIndex;

const SNIPPET_CONTEXT: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub path: String,
    pub line: usize,
    pub context: String,
    pub score: f64,
}

impl StructureIndex {
    /// Substring search over section titles, then cached section bodies.
    ///
    /// Title hits score between 0.7 and 1.0 and body hits between 0.5 and
    /// 0.7, both decreasing with how late in the text the match occurs.
    /// `scope` restricts results to paths starting with it.
    pub fn search(
        &self,
        query: &str,
        scope: Option<&str>,
        case_sensitive: bool,
        max_results: usize,
    ) -> Vec<SearchResult> {
        let fold = |text: &str| {
            if case_sensitive {
                text.to_string()
            } else {
                text.to_lowercase()
            }
        };
        let needle = fold(query);
        let mut results = Vec::new();

        for section in self.sections() {
            if scope.is_some_and(|scope| !section.path.starts_with(scope)) {
                continue;
            }

            let title = fold(&section.title);
            if let Some(pos) = char_find(&title, &needle) {
                let len = title.chars().count().max(1);
                results.push(SearchResult {
                    path: section.path.clone(),
                    line: section.source_location.line,
                    context: section.title.clone(),
                    score: 1.0 - (pos as f64 / len as f64) * 0.3,
                });
                continue;
            }

            let Some(content) = self.content.get(&section.path) else {
                continue;
            };
            if let Some(pos) = char_find(&fold(content), &needle) {
                let chars: Vec<char> = content.chars().collect();
                let pos = pos.min(chars.len());
                let newlines = chars[..pos].iter().filter(|&&c| c == '\n').count();
                results.push(SearchResult {
                    path: section.path.clone(),
                    line: section.source_location.line + newlines,
                    context: snippet(&chars, pos, query.chars().count()),
                    score: 0.7 - (pos as f64 / chars.len().max(1) as f64) * 0.2,
                });
            }
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(max_results);
        results
    }
}

/// Character offset of the first occurrence of `needle`.
fn char_find(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

fn snippet(chars: &[char], pos: usize, query_len: usize) -> String {
    let start = pos.saturating_sub(SNIPPET_CONTEXT);
    let end = (pos + query_len + SNIPPET_CONTEXT).min(chars.len());
    let text: String = chars[start..end].iter().collect();

    let mut snippet = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if start > 0 {
        snippet.insert_str(0, "...");
    }
    if end < chars.len() {
        snippet.push_str("...");
    }
    snippet
}
