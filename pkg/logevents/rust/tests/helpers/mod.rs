// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// A plugin environment rooted in a temporary directory, with its own state
/// file and an otherwise empty environment.
pub struct Plugin {
    pub dir: tempfile::TempDir,
    env: BTreeMap<String, String>,
}

impl Plugin {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let mut env = BTreeMap::new();
        env.insert(
            "MUNIN_STATEFILE".to_string(),
            dir.path().join("plugin-state/logevents.state").display().to_string(),
        );
        Self { dir, env }
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.env.insert(key.to_string(), value.into());
        self
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Glob matching `pattern` inside the plugin's directory.
    pub fn glob(&self, pattern: &str) -> String {
        format!("{}/{pattern}", self.dir.path().display())
    }

    pub fn state_file(&self) -> PathBuf {
        self.path("plugin-state/logevents.state")
    }

    pub fn state(&self) -> String {
        fs::read_to_string(self.state_file()).unwrap_or_default()
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_dd-logevents"))
            .args(args)
            .env_clear()
            .envs(&self.env)
            .output()
            .expect("failed to run dd-logevents")
    }

    /// Run in collect mode and return stdout, asserting success.
    pub fn collect(&self) -> String {
        let output = self.run(&[]);
        assert!(
            output.status.success(),
            "collect failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("stdout is not UTF-8")
    }
}

pub fn write_log(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create log directory");
    }
    fs::write(path, contents).expect("failed to write log");
}

pub fn append_log(path: &Path, contents: &str) {
    let mut body = fs::read_to_string(path).unwrap_or_default();
    body.push_str(contents);
    fs::write(path, body).expect("failed to append to log");
}

/// Value lines of the plugin output, keyed by field.
pub fn values(stdout: &str) -> BTreeMap<String, String> {
    stdout
        .lines()
        .filter_map(|line| line.split_once(' '))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
