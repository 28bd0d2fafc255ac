// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems. Validation reports every problem at once.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid plugin configuration:\n  {}", .problems.join("\n  "))]
    Invalid { problems: Vec<String> },
}

impl ConfigError {
    pub fn problems(&self) -> &[String] {
        match self {
            ConfigError::Invalid { problems } => problems,
        }
    }
}

/// Per-file failures. These never abort a collection cycle.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("log binding for service {service} is not a valid regex: {source}")]
    InvalidBinding {
        service: String,
        #[source]
        source: regex::Error,
    },
    #[error("match pattern for log type {log_type} is not a valid regex: {source}")]
    InvalidPattern {
        log_type: String,
        #[source]
        source: regex::Error,
    },
}
