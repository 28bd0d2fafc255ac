// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::ident::sanitize;

const LINES_SUFFIX: &str = "_lines";

/// Line counts seen for each log file at the end of the previous run.
///
/// Entries are keyed by the sanitized log path, which is also the key written
/// to the state file as `<ident>_lines=<count>`.
#[derive(Debug, Default, Clone)]
pub struct Checkpoint {
    lines: BTreeMap<String, u64>,
    /// Log file that last wrote each key during this run.
    owners: BTreeMap<String, PathBuf>,
}

impl PartialEq for Checkpoint {
    fn eq(&self, other: &Self) -> bool {
        self.lines == other.lines
    }
}

impl Eq for Checkpoint {}

impl Checkpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a checkpoint from a state file. A missing file is an empty
    /// checkpoint; lines that don't parse, including undecodable ones, are
    /// logged and skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no state file at {}, starting fresh", path.display());
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading state file: {}", path.display()));
            }
        };
        Ok(Self::parse(&String::from_utf8_lossy(&contents)))
    }

    pub fn parse(contents: &str) -> Self {
        let mut lines = BTreeMap::new();
        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, raw_val)) = trimmed.split_once('=') else {
                warn!("ignoring malformed state line: {trimmed}");
                continue;
            };
            let Some(ident) = key.trim().strip_suffix(LINES_SUFFIX) else {
                debug!("ignoring unknown state key: {key}");
                continue;
            };
            match raw_val.trim().parse::<u64>() {
                Ok(count) => {
                    lines.insert(ident.to_string(), count);
                }
                Err(e) => warn!("ignoring state entry {key}={raw_val}: {e}"),
            }
        }
        Self {
            lines,
            owners: BTreeMap::new(),
        }
    }

    /// Line count recorded for `log_path`, or 0 (start of file) when unknown.
    pub fn get(&self, log_path: &Path) -> u64 {
        self.lines
            .get(&key_for(log_path))
            .copied()
            .unwrap_or(0)
    }

    /// Record the line count for `log_path`. Returns true when the key was
    /// already held by a different file, which then loses its entry.
    pub fn set(&mut self, log_path: &Path, count: u64) -> bool {
        let key = key_for(log_path);
        let collides = self
            .owners
            .insert(key.clone(), log_path.to_path_buf())
            .is_some_and(|owner| owner != log_path);
        if collides {
            warn!(
                "state key for {} collides with another log file",
                log_path.display()
            );
        }
        self.lines.insert(key, count);
        collides
    }

    /// Keep the previous run's count for a file that was skipped this run.
    pub fn carry_over(&mut self, previous: &Checkpoint, log_path: &Path) {
        let key = key_for(log_path);
        if let Some(&count) = previous.lines.get(&key)
            && !self.lines.contains_key(&key)
        {
            self.lines.insert(key.clone(), count);
            self.owners.insert(key, log_path.to_path_buf());
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (ident, count) in &self.lines {
            out.push_str(ident);
            out.push_str(LINES_SUFFIX);
            out.push('=');
            out.push_str(&count.to_string());
            out.push('\n');
        }
        out
    }

    /// Replace the state file with this checkpoint. The new content is written
    /// next to the target and renamed over it, so an interrupted run leaves
    /// the previous checkpoint in place.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating state directory: {}", parent.display()))?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, self.render())
            .with_context(|| format!("writing state file: {}", Path::new(&tmp).display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("replacing state file: {}", path.display()))?;
        debug!("saved {} checkpoint(s) to {}", self.len(), path.display());
        Ok(())
    }
}

fn key_for(log_path: &Path) -> String {
    sanitize(&log_path.to_string_lossy())
}
