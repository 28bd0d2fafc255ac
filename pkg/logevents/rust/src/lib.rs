// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

pub mod aggregator;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod errors;
pub mod ident;
pub mod pattern;
pub mod render;
pub mod scan;

pub use aggregator::{Aggregator, ServiceReport, ServiceTally, collect};
pub use checkpoint::Checkpoint;
pub use config::{PluginConfig, ServiceConfig};
pub use errors::{ConfigError, ScanError};
