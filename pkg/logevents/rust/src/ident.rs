// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

/// Turn an arbitrary name into an identifier usable as a munin field name or
/// a state-file key.
///
/// Leading non-alphabetic characters are dropped and every run of remaining
/// non-alphanumeric characters becomes a single `_`. Only output labels and
/// persisted keys go through this; in-memory lookups use the raw name.
pub fn sanitize(name: &str) -> String {
    let trimmed = name.trim_start_matches(|c: char| !c.is_ascii_alphabetic());

    let mut out = String::with_capacity(trimmed.len());
    let mut in_separator = false;
    for c in trimmed.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_separator = false;
        } else if !in_separator {
            out.push('_');
            in_separator = true;
        }
    }

    if out.is_empty() {
        out.push('_');
    }
    out
}
