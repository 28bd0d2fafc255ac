// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::Result;
use log::{debug, info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::checkpoint::Checkpoint;
use crate::config::{PluginConfig, ServiceConfig};
use crate::errors::{ConfigError, ScanError};
use crate::pattern::{self, EntryKind};
use crate::scan::scan_file;

/// A concrete log file and the index of the log type whose glob found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogfileEntry {
    pub path: PathBuf,
    pub log_type: usize,
}

/// Per-service result of one collection cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceTally {
    pub total: u64,
    /// Files that contributed at least one event, in scan order.
    pub affected: Vec<String>,
}

impl ServiceTally {
    pub fn extinfo(&self) -> String {
        self.affected.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    pub service: ServiceConfig,
    pub tally: ServiceTally,
}

/// Everything a cycle produces: the reports to print and the checkpoint to
/// persist for the next run.
#[derive(Debug)]
pub struct Cycle {
    pub reports: Vec<ServiceReport>,
    pub checkpoint: Checkpoint,
}

struct CompiledType {
    name: String,
    pattern: Option<regex::bytes::Regex>,
}

/// Counts new event lines per service across every configured log file.
pub struct Aggregator {
    services: Vec<ServiceConfig>,
    bindings: Vec<Option<Regex>>,
    types: Vec<CompiledType>,
    entries: Vec<LogfileEntry>,
}

impl Aggregator {
    /// Resolve services, compile patterns and expand every log type's glob.
    ///
    /// Invalid patterns are not fatal: a service with a bad binding never
    /// claims a file, and files of a type with a bad match pattern are skipped.
    pub fn new(config: &PluginConfig) -> Result<Self, ConfigError> {
        let services = config.resolve_services()?;

        let bindings = services
            .iter()
            .map(|service| match Regex::new(&service.binding) {
                Ok(re) => Some(re),
                Err(source) => {
                    warn!(
                        "{}",
                        ScanError::InvalidBinding {
                            service: service.name.clone(),
                            source,
                        }
                    );
                    None
                }
            })
            .collect();

        let types = config
            .log_types
            .iter()
            .map(|t| CompiledType {
                name: t.name.clone(),
                pattern: match regex::bytes::Regex::new(&t.regex) {
                    Ok(re) => Some(re),
                    Err(source) => {
                        warn!(
                            "{}",
                            ScanError::InvalidPattern {
                                log_type: t.name.clone(),
                                source,
                            }
                        );
                        None
                    }
                },
            })
            .collect();

        let mut entries = Vec::new();
        for (index, log_type) in config.log_types.iter().enumerate() {
            let paths = pattern::expand(&log_type.logfiles, EntryKind::Files);
            if paths.is_empty() {
                warn!(
                    "{}_logfiles {} matched no files",
                    log_type.name, log_type.logfiles
                );
            }
            entries.extend(paths.into_iter().map(|path| LogfileEntry {
                path,
                log_type: index,
            }));
        }
        debug!(
            "{} service(s), {} log file(s)",
            services.len(),
            entries.len()
        );

        Ok(Self {
            services,
            bindings,
            types,
            entries,
        })
    }

    #[cfg(test)]
    fn services(&self) -> &[ServiceConfig] {
        &self.services
    }

    #[cfg(test)]
    fn entries(&self) -> &[LogfileEntry] {
        &self.entries
    }

    #[cfg(test)]
    fn owner(&self, path: &Path) -> Option<&ServiceConfig> {
        self.owner_index(path).and_then(|i| self.services.get(i))
    }

    /// Index of the first service, in configured order, whose binding
    /// matches `path`.
    fn owner_index(&self, path: &Path) -> Option<usize> {
        let path = path.to_string_lossy();
        self.bindings
            .iter()
            .position(|binding| binding.as_ref().is_some_and(|re| re.is_match(&path)))
    }

    /// Run one collection cycle against the previous checkpoint.
    ///
    /// Files skipped for any reason keep their previous checkpoint value.
    /// Files no longer found by any glob drop out of the new checkpoint.
    pub fn run(&self, previous: &Checkpoint) -> Cycle {
        let mut tallies = vec![ServiceTally::default(); self.services.len()];
        let mut checkpoint = Checkpoint::new();

        for entry in &self.entries {
            let path = &entry.path;
            if !path.exists() {
                warn!("{} no longer exists, skipping", path.display());
                checkpoint.carry_over(previous, path);
                continue;
            }

            let Some(owner) = self.owner_index(path) else {
                warn!("{} is not bound to any service, skipping", path.display());
                checkpoint.carry_over(previous, path);
                continue;
            };

            let Some(log_type) = self.types.get(entry.log_type) else {
                continue;
            };
            let Some(pattern) = &log_type.pattern else {
                warn!(
                    "{} skipped: match pattern for log type {} is invalid",
                    path.display(),
                    log_type.name
                );
                checkpoint.carry_over(previous, path);
                continue;
            };

            let outcome = match scan_file(path, previous.get(path), pattern) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("{e}");
                    checkpoint.carry_over(previous, path);
                    continue;
                }
            };
            if outcome.rotated {
                info!("{} was rotated or truncated", path.display());
            }

            let Some(tally) = tallies.get_mut(owner) else {
                continue;
            };
            debug!(
                "{} -> {}: {} new event(s), {} line(s)",
                path.display(),
                self.services.get(owner).map_or("", |s| s.name.as_str()),
                outcome.matches,
                outcome.lines
            );
            tally.total += outcome.matches;
            if outcome.matches > 0 {
                tally.affected.push(path.display().to_string());
            }
            checkpoint.set(path, outcome.lines);
        }

        let reports = self
            .services
            .iter()
            .cloned()
            .zip(tallies)
            .map(|(service, tally)| ServiceReport { service, tally })
            .collect();

        Cycle {
            reports,
            checkpoint,
        }
    }
}

/// Load the checkpoint, run one cycle, persist the new checkpoint and return
/// the per-service reports.
pub fn collect(config: &PluginConfig, state_path: &Path) -> Result<Vec<ServiceReport>> {
    let aggregator = Aggregator::new(config)?;
    let previous = Checkpoint::load(state_path)?;
    let cycle = aggregator.run(&previous);
    cycle.checkpoint.save(state_path)?;
    Ok(cycle.reports)
}
