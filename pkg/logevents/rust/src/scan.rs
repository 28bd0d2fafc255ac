// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::debug;
use regex::bytes::Regex;

use crate::errors::ScanError;

/// Result of scanning one log file from its checkpoint to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Complete lines currently in the file; the next checkpoint.
    pub lines: u64,
    /// New lines matching the event pattern.
    pub matches: u64,
    /// The file shrank below its checkpoint and was scanned from line 1.
    pub rotated: bool,
}

pub fn scan_file(path: &Path, previous_lines: u64, pattern: &Regex) -> Result<ScanOutcome, ScanError> {
    let file = File::open(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let lines = count_lines(BufReader::new(file)).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rotated = lines < previous_lines;
    let skip = if rotated { 0 } else { previous_lines };
    if rotated {
        debug!(
            "{} shrank from {previous_lines} to {lines} lines, rescanning from the start",
            path.display()
        );
    }

    let matches = if lines > skip {
        let file = File::open(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        count_matches(BufReader::new(file), skip, lines, pattern).map_err(|source| {
            ScanError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?
    } else {
        0
    };

    Ok(ScanOutcome {
        lines,
        matches,
        rotated,
    })
}

/// Count newline-terminated lines. A trailing line still being written is
/// left for the next run.
pub fn count_lines<R: Read>(mut reader: R) -> std::io::Result<u64> {
    let mut buf = [0u8; 64 * 1024];
    let mut count = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(count);
        }
        count += buf.iter().take(n).filter(|&&b| b == b'\n').count() as u64;
    }
}

/// Count lines `skip + 1 ..= last` that contain a match for `pattern`.
pub fn count_matches<R: BufRead>(
    mut reader: R,
    skip: u64,
    last: u64,
    pattern: &Regex,
) -> std::io::Result<u64> {
    let mut line = Vec::new();
    let mut number = 0u64;
    let mut matches = 0u64;

    while number < last {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 || line.last() != Some(&b'\n') {
            break;
        }
        number += 1;
        if number <= skip {
            continue;
        }
        let content = line.strip_suffix(b"\n").unwrap_or(&line);
        if pattern.is_match(content) {
            matches += 1;
        }
    }

    Ok(matches)
}
