// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

const WILDCARDS: [char; 4] = ['?', '*', '[', '{'];

/// Which directory entries a glob expansion should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular files only (symlinks are followed).
    Files,
    /// Files and directories alike.
    Any,
}

impl EntryKind {
    fn accepts(self, is_dir: bool) -> bool {
        match self {
            EntryKind::Files => !is_dir,
            EntryKind::Any => true,
        }
    }
}

fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(WILDCARDS)
}

/// Extract the longest directory prefix without wildcards
pub fn longest_path_prefix(pattern: &str) -> &str {
    if let Some((prefix, _)) = pattern.split_once(WILDCARDS) {
        return match prefix.rsplit_once('/') {
            Some(("", _)) => "/",
            Some((dir, _)) => dir,
            None => "",
        };
    }

    pattern
}

/// Number of path components the pattern spans below its prefix, or `None`
/// when a `**` segment makes the depth unbounded.
fn max_depth(pattern: &str, prefix: &str) -> Option<usize> {
    if pattern.contains("**") {
        return None;
    }
    let rest = pattern.strip_prefix(prefix).unwrap_or(pattern);
    Some(rest.split('/').filter(|c| !c.is_empty()).count())
}

/// Check if a path could still lead to a match, so that whole directory trees
/// outside the pattern's prefix are never walked.
fn match_start(pattern: &str, prefix: &str, path: &str) -> bool {
    if glob_match::glob_match(pattern, path) {
        return true;
    }
    if prefix.is_empty() {
        return true;
    }
    path.starts_with(prefix) || prefix.starts_with(path)
}

/// Like a shell glob, a wildcard never matches a leading `.`: a dot entry is
/// only walked when the pattern segment at its depth starts with `.` too.
fn dot_allowed(segments: &[&str], depth: usize, name: &str) -> bool {
    if !name.starts_with('.') {
        return true;
    }
    if segments.contains(&"**") {
        return segments.iter().any(|s| s.starts_with('.'));
    }
    depth
        .checked_sub(1)
        .and_then(|i| segments.get(i))
        .is_some_and(|s| s.starts_with('.'))
}

/// Expand a shell-style glob into the sorted list of existing paths it matches.
///
/// A pattern without wildcards yields itself when the path exists. Patterns
/// that match nothing yield an empty list.
pub fn expand(pattern: &str, kind: EntryKind) -> Vec<PathBuf> {
    if !has_wildcard(pattern) {
        let path = Path::new(pattern);
        return match path.metadata() {
            Ok(meta) if kind.accepts(meta.is_dir()) => vec![path.to_path_buf()],
            _ => Vec::new(),
        };
    }

    let prefix = longest_path_prefix(pattern);
    let start = if prefix.is_empty() { "." } else { prefix };
    let segments: Vec<&str> = pattern
        .strip_prefix(prefix)
        .unwrap_or(pattern)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let mut walker = WalkDir::new(start).follow_links(true).min_depth(1);
    if let Some(depth) = max_depth(pattern, prefix) {
        walker = walker.max_depth(depth);
    }

    let mut found = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| {
            if !dot_allowed(&segments, e.depth(), &e.file_name().to_string_lossy()) {
                return false;
            }
            let Some(path) = match_path(e.path(), prefix) else {
                return false;
            };
            match_start(pattern, prefix, path)
        })
        .filter_map(Result::ok)
    {
        let Some(path) = match_path(entry.path(), prefix) else {
            debug!("skipping non UTF-8 path {}", entry.path().display());
            continue;
        };
        if kind.accepts(entry.file_type().is_dir()) && glob_match::glob_match(pattern, path) {
            found.push(PathBuf::from(path));
        }
    }

    found.sort();
    found
}

/// The string a walked path is matched as. Relative patterns are walked from
/// `.`, whose `./` prefix the pattern never carries.
fn match_path<'a>(path: &'a Path, prefix: &str) -> Option<&'a str> {
    let path = path.to_str()?;
    if prefix.is_empty() {
        return Some(path.strip_prefix("./").unwrap_or(path));
    }
    Some(path)
}
