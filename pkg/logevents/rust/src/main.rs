// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::{debug, error};

use dd_logevents::cli::{Args, Mode};
use dd_logevents::config::{self, PluginConfig};
use dd_logevents::{collect, render};

fn run(args: &Args) -> Result<()> {
    let config = PluginConfig::from_env()?;
    let plugin = config::plugin_name(std::env::args().next().as_deref());
    let state = config::state_file(&plugin);
    debug!("plugin {plugin}, state file {}", state.display());

    // Nothing reaches stdout until every value is known, so a failed run
    // never leaves half a response for munin-node.
    let mut buf = Vec::new();
    match args.mode() {
        Mode::Describe => {
            let services = config.resolve_services()?;
            render::write_config(&mut buf, &config, &services)?;
            if config::dirtyconfig() {
                debug!("munin-node supports dirtyconfig, sending values");
                let reports = collect(&config, &state)?;
                render::write_values(&mut buf, &reports)?;
            }
        }
        Mode::Collect => {
            let reports = collect(&config, &state)?;
            render::write_values(&mut buf, &reports)?;
        }
    }

    let mut out = BufWriter::new(io::stdout().lock());
    out.write_all(&buf)?;
    out.flush()?;
    Ok(())
}

fn main() -> Result<ExitCode> {
    simple_logger::SimpleLogger::new()
        .with_level(config::get_log_level().to_level_filter())
        .init()?;

    let args = Args::parse();
    match run(&args) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{e:#}");
            Ok(ExitCode::FAILURE)
        }
    }
}
