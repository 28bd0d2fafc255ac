// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use clap::Parser;

/// Count new event lines in log files per service, for munin-node
#[derive(Parser, Debug, Default)]
#[command(name = "dd-logevents", version)]
pub struct Args {
    /// `config` prints the graph description; anything else collects values
    #[arg(allow_hyphen_values = true)]
    pub mode: Option<String>,

    /// Further arguments are accepted and ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub rest: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Describe,
    Collect,
}

impl Args {
    pub fn mode(&self) -> Mode {
        match self.mode.as_deref() {
            Some("config") => Mode::Describe,
            _ => Mode::Collect,
        }
    }
}
