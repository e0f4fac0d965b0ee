use std::cmp::Reverse;

use super::StructureIndex;

impl StructureIndex {
    /// Indexed paths that look like `requested`, best first.
    pub fn get_suggestions(&self, requested: &str, limit: usize) -> Vec<String> {
        let requested = requested.trim_start_matches('/');
        if requested.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &str)> = self
            .by_path
            .keys()
            .map(|existing| (similarity(requested, existing), existing.as_str()))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by_key(|&(score, path)| (Reverse(score), path));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, path)| path.to_string())
            .collect()
    }
}

/// Segment-wise likeness of two dotted paths.
fn similarity(requested: &str, existing: &str) -> usize {
    let requested: Vec<&str> = requested.split('.').collect();
    let existing: Vec<&str> = existing.split('.').collect();
    let mut score = 0;

    if requested.len() > 1
        && existing.len() > 1
        && requested[..requested.len() - 1] == existing[..existing.len() - 1]
    {
        score += 10;
    }

    let wanted = requested[requested.len() - 1].to_lowercase();
    let candidate = existing[existing.len() - 1].to_lowercase();
    if wanted == candidate {
        score += 5;
    } else if candidate.contains(&wanted) || wanted.contains(&candidate) {
        score += 3;
    }

    if requested[0] == existing[0] {
        score += 2;
    }
    score
}
