//! Turning a flat run of headings into a nested, path-addressed outline.

use std::collections::HashMap;
use std::path::PathBuf;

use super::slugify;
use crate::models::{Section, SourceLocation};

/// Hands out section paths, numbering repeats with `-2`, `-3`, ...
///
/// The first request for a path gets it unchanged. Generated suffixes are
/// reserved too, so a later heading whose own slug happens to be
/// `intro-2` cannot collide with a disambiguated `intro`.
#[derive(Debug, Default)]
pub struct PathAllocator {
    used: HashMap<String, usize>,
}

impl PathAllocator {
    pub fn allocate(&mut self, base: String) -> String {
        let Some(&count) = self.used.get(&base) else {
            self.used.insert(base.clone(), 1);
            return base;
        };

        let mut n = count;
        let path = loop {
            n += 1;
            let candidate = format!("{base}-{n}");
            if !self.used.contains_key(&candidate) {
                break candidate;
            }
        };
        self.used.insert(base, n);
        self.used.insert(path.clone(), 1);
        path
    }
}

/// Path of a non-title section: `<prefix>:<parent segments>.<slug>`.
///
/// Only parents whose path already carries the `:` separator contribute
/// segments; a document-title parent (path == prefix) does not.
pub fn child_path(prefix: &str, parent_path: Option<&str>, slug: &str) -> String {
    match parent_path.and_then(|p| p.split_once(':')) {
        Some((_, segments)) => format!("{prefix}:{segments}.{slug}"),
        None => format!("{prefix}:{slug}"),
    }
}

/// Builds the section tree with an explicit stack of open ancestors.
///
/// Headings at or above `title_level` are document-title nodes and take the
/// file prefix as their path.
#[derive(Debug)]
pub struct OutlineBuilder {
    prefix: String,
    title_level: usize,
    paths: PathAllocator,
    stack: Vec<Section>,
    roots: Vec<Section>,
}

impl OutlineBuilder {
    pub fn new(prefix: impl Into<String>, title_level: usize) -> Self {
        Self {
            prefix: prefix.into(),
            title_level,
            paths: PathAllocator::default(),
            stack: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Open a section for a heading and return its allocated path.
    pub fn add_heading(
        &mut self,
        title: String,
        level: usize,
        location: SourceLocation,
        anchor: Option<String>,
    ) -> String {
        while self.stack.last().is_some_and(|top| top.level >= level) {
            self.close_top();
        }

        let base = if level <= self.title_level {
            self.prefix.clone()
        } else {
            let parent = self.stack.last().map(|s| s.path.as_str());
            child_path(&self.prefix, parent, &slugify(&title))
        };
        let path = self.paths.allocate(base);

        let mut section = Section::new(title, level, path.clone(), location);
        section.anchor = anchor;
        self.stack.push(section);
        path
    }

    pub fn finish(mut self) -> Vec<Section> {
        while !self.stack.is_empty() {
            self.close_top();
        }
        self.roots
    }

    fn close_top(&mut self) {
        if let Some(section) = self.stack.pop() {
            match self.stack.last_mut() {
                Some(parent) => parent.children.push(section),
                None => self.roots.push(section),
            }
        }
    }
}

/// Fill in `end_line` for every section in the forest.
///
/// Within each physical file a section ends one line before the next section
/// that starts in the same file, or at the file's last line.
pub fn compute_end_lines(roots: &mut [Section], last_lines: &HashMap<PathBuf, usize>) {
    let mut locations: Vec<&mut SourceLocation> = Vec::new();
    let mut worklist: Vec<&mut Section> = roots.iter_mut().collect();
    while let Some(section) = worklist.pop() {
        let Section {
            source_location,
            children,
            ..
        } = section;
        locations.push(source_location);
        worklist.extend(children.iter_mut());
    }

    locations.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));

    let next_starts: Vec<Option<usize>> = (0..locations.len())
        .map(|i| {
            locations
                .get(i + 1)
                .filter(|next| next.file == locations[i].file)
                .map(|next| next.line)
        })
        .collect();

    for (location, next_start) in locations.into_iter().zip(next_starts) {
        let end = match next_start {
            Some(next) => next.saturating_sub(1),
            None => last_lines.get(&location.file).copied().unwrap_or(location.line),
        };
        location.end_line = Some(end.max(location.line));
    }
}
