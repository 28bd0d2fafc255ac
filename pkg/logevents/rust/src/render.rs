// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::io::{self, Write};

use crate::aggregator::ServiceReport;
use crate::config::{PluginConfig, ServiceConfig};

/// Write the graph description munin asks for with `config`.
///
/// Service thresholds fall back to the global `warning`/`critical` values and
/// are omitted when neither is set.
pub fn write_config<W: Write>(
    out: &mut W,
    config: &PluginConfig,
    services: &[ServiceConfig],
) -> io::Result<()> {
    writeln!(out, "graph_title {}", config.title)?;
    writeln!(out, "graph_vlabel {}", config.vlabel)?;
    writeln!(out, "graph_category {}", config.category)?;
    writeln!(out, "graph_args --base 1000 -l 0")?;
    if let Some(info) = &config.info {
        writeln!(out, "graph_info {info}")?;
    }

    for service in services {
        let id = service.ident();
        writeln!(out, "{id}.label {}", service.name)?;
        writeln!(
            out,
            "{id}.info New event lines in log files bound to {}",
            service.name
        )?;
        if let Some(warning) = service.warning.as_ref().or(config.warning.as_ref()) {
            writeln!(out, "{id}.warning {warning}")?;
        }
        if let Some(critical) = service.critical.as_ref().or(config.critical.as_ref()) {
            writeln!(out, "{id}.critical {critical}")?;
        }
    }
    Ok(())
}

/// Write one value line and one extinfo line per service.
pub fn write_values<W: Write>(out: &mut W, reports: &[ServiceReport]) -> io::Result<()> {
    for report in reports {
        let id = report.service.ident();
        writeln!(out, "{id}.value {}", report.tally.total)?;
        writeln!(out, "{id}.extinfo {}", report.tally.extinfo())?;
    }
    Ok(())
}
