// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::env;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::ident::sanitize;
use crate::pattern::{self, EntryKind};

const LOGFILES_SUFFIX: &str = "_logfiles";
const REGEX_SUFFIX: &str = "_regex";
const LOGBINDING_SUFFIX: &str = "_logbinding";

const DEFAULT_TITLE: &str = "Log events";
const DEFAULT_VLABEL: &str = "events";
const DEFAULT_CATEGORY: &str = "logs";
const DEFAULT_STATE_DIR: &str = "/var/lib/munin-node/plugin-state";

/// A family of log files sharing one event pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogType {
    pub name: String,
    /// Glob enumerating the member files.
    pub logfiles: String,
    /// Regex counting event lines in those files.
    pub regex: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceSource {
    /// Names listed verbatim in `services`.
    Explicit(Vec<String>),
    /// Basenames of whatever the `services_autoconf` glob matches.
    Autoconf(String),
}

/// Per-service settings, resolved against the raw service name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub name: String,
    /// Regex tested against full log paths. Defaults to the service name.
    pub binding: String,
    pub warning: Option<String>,
    pub critical: Option<String>,
}

impl ServiceConfig {
    /// Field name used for this service in plugin output.
    pub fn ident(&self) -> String {
        sanitize(&self.name)
    }
}

/// Immutable plugin configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub log_types: Vec<LogType>,
    pub services: ServiceSource,
    pub title: String,
    pub vlabel: String,
    pub category: String,
    pub info: Option<String>,
    pub warning: Option<String>,
    pub critical: Option<String>,
    vars: HashMap<String, String>,
}

impl PluginConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars())
    }

    /// Build and validate the configuration from key/value pairs. Blank values
    /// count as unset. All problems are collected before failing.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();

        let mut problems = Vec::new();

        let log_types = collect_log_types(&vars, &mut problems);

        let services = match (vars.get("services"), vars.get("services_autoconf")) {
            (Some(list), _) => Some(ServiceSource::Explicit(
                list.split_whitespace().map(str::to_string).collect(),
            )),
            (None, Some(glob)) => Some(ServiceSource::Autoconf(glob.trim().to_string())),
            (None, None) => {
                problems.push("neither services nor services_autoconf is set".to_string());
                None
            }
        };

        let has_binding = vars.keys().any(|k| k.ends_with(LOGBINDING_SUFFIX));
        if matches!(services, Some(ServiceSource::Explicit(_)))
            && !vars.contains_key("services_autoconf")
            && !has_binding
        {
            problems.push(
                "services is set but no <service>_logbinding is configured and services_autoconf is not in use"
                    .to_string(),
            );
        }

        if let Some(ServiceSource::Explicit(names)) = &services {
            problems.extend(ident_collisions(names));
        }

        let Some(services) = services else {
            return Err(ConfigError::Invalid { problems });
        };
        if !problems.is_empty() {
            return Err(ConfigError::Invalid { problems });
        }

        let get = |key: &str| vars.get(key).map(|v| v.trim().to_string());
        Ok(Self {
            log_types,
            services,
            title: get("title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            vlabel: get("vlabel").unwrap_or_else(|| DEFAULT_VLABEL.to_string()),
            category: get("category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            info: get("info"),
            warning: get("warning"),
            critical: get("critical"),
            vars,
        })
    }

    /// Resolve the service list, in configured or discovery order, with each
    /// service's binding and thresholds.
    pub fn resolve_services(&self) -> Result<Vec<ServiceConfig>, ConfigError> {
        let names = match &self.services {
            ServiceSource::Explicit(names) => names.clone(),
            ServiceSource::Autoconf(glob) => {
                let names = autoconf_names(glob);
                if names.is_empty() {
                    warn!("services_autoconf {glob} matched nothing");
                }
                let collisions = ident_collisions(&names);
                if !collisions.is_empty() {
                    return Err(ConfigError::Invalid {
                        problems: collisions,
                    });
                }
                names
            }
        };

        Ok(names
            .into_iter()
            .map(|name| self.service_config(name))
            .collect())
    }

    fn service_config(&self, name: String) -> ServiceConfig {
        let binding = self
            .service_var(&name, LOGBINDING_SUFFIX)
            .unwrap_or_else(|| regex::escape(&name));
        ServiceConfig {
            warning: self.service_var(&name, "_warning"),
            critical: self.service_var(&name, "_critical"),
            binding,
            name,
        }
    }

    /// Look up `<name><suffix>`, trying the raw name before the sanitized one.
    fn service_var(&self, name: &str, suffix: &str) -> Option<String> {
        self.vars
            .get(&format!("{name}{suffix}"))
            .or_else(|| self.vars.get(&format!("{}{suffix}", sanitize(name))))
            .map(|v| v.trim().to_string())
    }
}

fn collect_log_types(vars: &HashMap<String, String>, problems: &mut Vec<String>) -> Vec<LogType> {
    let mut names = BTreeSet::new();
    for key in vars.keys() {
        if let Some(name) = key
            .strip_suffix(LOGFILES_SUFFIX)
            .or_else(|| key.strip_suffix(REGEX_SUFFIX))
            && !name.is_empty()
        {
            names.insert(name.to_string());
        }
    }

    if names.is_empty() {
        problems.push("no log types configured (set <type>_logfiles and <type>_regex)".to_string());
        return Vec::new();
    }

    let mut types = Vec::new();
    for name in names {
        let logfiles = vars.get(&format!("{name}{LOGFILES_SUFFIX}"));
        let regex = vars.get(&format!("{name}{REGEX_SUFFIX}"));
        match (logfiles, regex) {
            (Some(logfiles), Some(regex)) => types.push(LogType {
                logfiles: logfiles.trim().to_string(),
                regex: regex.clone(),
                name,
            }),
            (None, _) => problems.push(format!("{name}{LOGFILES_SUFFIX} is missing")),
            (_, None) => problems.push(format!("{name}{REGEX_SUFFIX} is missing")),
        }
    }
    types
}

fn autoconf_names(glob: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for path in pattern::expand(glob, EntryKind::Any) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if seen.insert(name.to_string()) {
            debug!("autoconf discovered service {name}");
            names.push(name.to_string());
        }
    }
    names
}

fn ident_collisions(names: &[String]) -> Vec<String> {
    let mut by_ident: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for name in names {
        by_ident.entry(sanitize(name)).or_default().push(name);
    }
    by_ident
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(ident, names)| {
            format!(
                "services {} all map to the field name {ident}",
                names.join(", ")
            )
        })
        .collect()
}

/// Where the checkpoint lives. Priority: MUNIN_STATEFILE >
/// MUNIN_PLUGSTATE/<plugin>.state > the munin-node default directory.
pub fn state_file(plugin_name: &str) -> PathBuf {
    if let Ok(path) = env::var("MUNIN_STATEFILE")
        && !path.is_empty()
    {
        return PathBuf::from(path);
    }
    let dir = env::var("MUNIN_PLUGSTATE")
        .ok()
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
    dir.join(format!("{plugin_name}.state"))
}

/// Plugin name as invoked, which munin sets through the symlink name.
pub fn plugin_name(argv0: Option<&str>) -> String {
    argv0
        .and_then(|a| Path::new(a).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(env!("CARGO_PKG_NAME"))
        .to_string()
}

/// munin-node advertises dirtyconfig support through the environment.
pub fn dirtyconfig() -> bool {
    env::var("MUNIN_CAP_DIRTYCONFIG").is_ok_and(|v| v == "1")
}

fn parse_log_level(level: &str) -> log::Level {
    match level.to_lowercase().as_str() {
        "trace" => log::Level::Trace,
        "debug" => log::Level::Debug,
        "info" => log::Level::Info,
        "warn" | "warning" => log::Level::Warn,
        "error" | "critical" | "off" => log::Level::Error,
        _ => log::Level::Warn,
    }
}

/// Gets the log level from the environment.
/// Priority: DD_LOG_LEVEL > LOG_LEVEL > default Warn
pub fn get_log_level() -> log::Level {
    env::var("DD_LOG_LEVEL")
        .or_else(|_| env::var("LOG_LEVEL"))
        .map(|level| parse_log_level(&level))
        .unwrap_or(log::Level::Warn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn web_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("web_logfiles", "/var/log/nginx/*.log"),
            ("web_regex", "ERROR"),
            ("services", "svc1 svc2"),
            ("svc1_logbinding", "nginx"),
        ]
    }

    #[test]
    fn test_parse_full_config() {
        let mut vars = web_vars();
        vars.extend([
            ("title", "Web errors"),
            ("vlabel", "errors"),
            ("warning", "10"),
            ("critical", "50"),
            ("svc2_critical", "5"),
        ]);
        let config = PluginConfig::from_vars(vars).unwrap();

        assert_eq!(
            config.log_types,
            vec![LogType {
                name: "web".to_string(),
                logfiles: "/var/log/nginx/*.log".to_string(),
                regex: "ERROR".to_string(),
            }]
        );
        assert_eq!(
            config.services,
            ServiceSource::Explicit(vec!["svc1".to_string(), "svc2".to_string()])
        );
        assert_eq!(config.title, "Web errors");
        assert_eq!(config.vlabel, "errors");
        assert_eq!(config.category, "logs");
        assert_eq!(config.warning.as_deref(), Some("10"));

        let services = config.resolve_services().unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].binding, "nginx");
        assert_eq!(services[1].binding, "svc2", "binding defaults to the name");
        assert_eq!(services[1].critical.as_deref(), Some("5"));
        assert_eq!(services[1].warning, None);
    }

    #[test]
    fn test_defaults() {
        let config = PluginConfig::from_vars(web_vars()).unwrap();
        assert_eq!(config.title, "Log events");
        assert_eq!(config.vlabel, "events");
        assert!(config.info.is_none());
        assert!(config.warning.is_none());
        assert!(config.critical.is_none());
    }

    #[test]
    fn test_default_binding_is_literal() {
        let vars = vec![
            ("app_logfiles", "/tmp/*.log"),
            ("app_regex", "x"),
            ("services", "a.b other"),
            ("other_logbinding", "other"),
        ];
        let config = PluginConfig::from_vars(vars).unwrap();
        let services = config.resolve_services().unwrap();
        assert_eq!(services[0].binding, r"a\.b");
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let vars = vec![
            ("web_logfiles", "/var/log/*.log"),
            ("db_regex", "FATAL"),
        ];
        let err = PluginConfig::from_vars(vars).unwrap_err();
        assert_eq!(
            err.problems(),
            &[
                "db_logfiles is missing".to_string(),
                "web_regex is missing".to_string(),
                "neither services nor services_autoconf is set".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_log_types() {
        let err = PluginConfig::from_vars(vec![("services_autoconf", "/etc/x/*")]).unwrap_err();
        assert_eq!(err.problems().len(), 1);
        assert!(err.problems()[0].starts_with("no log types configured"));
    }

    #[test]
    fn test_explicit_services_need_a_binding() {
        let vars = vec![
            ("web_logfiles", "/var/log/*.log"),
            ("web_regex", "ERROR"),
            ("services", "svc1"),
        ];
        let err = PluginConfig::from_vars(vars).unwrap_err();
        assert!(err.problems()[0].contains("_logbinding"));
    }

    #[test]
    fn test_explicit_services_with_autoconf_need_no_binding() {
        let vars = vec![
            ("web_logfiles", "/var/log/*.log"),
            ("web_regex", "ERROR"),
            ("services", "svc1"),
            ("services_autoconf", "/etc/services.d/*"),
        ];
        let config = PluginConfig::from_vars(vars).unwrap();
        assert_eq!(
            config.services,
            ServiceSource::Explicit(vec!["svc1".to_string()])
        );
    }

    #[test]
    fn test_blank_values_are_unset() {
        let vars = vec![
            ("web_logfiles", "/var/log/*.log"),
            ("web_regex", "   "),
            ("services_autoconf", "/etc/x/*"),
        ];
        let err = PluginConfig::from_vars(vars).unwrap_err();
        assert_eq!(err.problems(), &["web_regex is missing".to_string()]);
    }

    #[test]
    fn test_sanitized_collision_rejected() {
        let vars = vec![
            ("web_logfiles", "/var/log/*.log"),
            ("web_regex", "ERROR"),
            ("services", "foo-bar foo_bar"),
            ("foo_bar_logbinding", "x"),
        ];
        let err = PluginConfig::from_vars(vars).unwrap_err();
        assert_eq!(
            err.problems(),
            &["services foo-bar, foo_bar all map to the field name foo_bar".to_string()]
        );
    }

    #[test]
    fn test_service_vars_fall_back_to_sanitized_name() {
        let vars = vec![
            ("web_logfiles", "/var/log/*.log"),
            ("web_regex", "ERROR"),
            ("services", "my-app"),
            ("my_app_logbinding", "/myapp/"),
            ("my_app_warning", "3"),
        ];
        let config = PluginConfig::from_vars(vars).unwrap();
        let services = config.resolve_services().unwrap();
        assert_eq!(services[0].binding, "/myapp/");
        assert_eq!(services[0].warning.as_deref(), Some("3"));
        assert_eq!(services[0].ident(), "my_app");
    }

    #[test]
    fn test_autoconf_services() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sites/beta")).unwrap();
        fs::create_dir_all(dir.path().join("sites/alpha")).unwrap();
        fs::write(dir.path().join("sites/gamma"), "").unwrap();

        let glob = format!("{}/sites/*", dir.path().display());
        let config = PluginConfig::from_vars(vec![
            ("web_logfiles".to_string(), "/var/log/*.log".to_string()),
            ("web_regex".to_string(), "ERROR".to_string()),
            ("services_autoconf".to_string(), glob),
        ])
        .unwrap();

        let names: Vec<String> = config
            .resolve_services()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_autoconf_collision_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sites/foo-bar")).unwrap();
        fs::create_dir_all(dir.path().join("sites/foo_bar")).unwrap();

        let glob = format!("{}/sites/*", dir.path().display());
        let config = PluginConfig::from_vars(vec![
            ("web_logfiles".to_string(), "/var/log/*.log".to_string()),
            ("web_regex".to_string(), "ERROR".to_string()),
            ("services_autoconf".to_string(), glob),
        ])
        .unwrap();

        let err = config.resolve_services().unwrap_err();
        assert_eq!(
            err.problems(),
            &["services foo-bar, foo_bar all map to the field name foo_bar".to_string()]
        );
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("api_logfiles", Some("/srv/api/*.log")),
                ("api_regex", Some("panic")),
                ("services", Some("api")),
                ("api_logbinding", Some("/srv/api/")),
            ],
            || {
                let config = PluginConfig::from_env().unwrap();
                assert!(config.log_types.iter().any(|t| t.name == "api"));
            },
        );
    }

    #[test]
    fn test_state_file_priority() {
        temp_env::with_vars(
            [
                ("MUNIN_STATEFILE", Some("/tmp/explicit.state")),
                ("MUNIN_PLUGSTATE", Some("/tmp/plugstate")),
            ],
            || {
                assert_eq!(state_file("logevents"), PathBuf::from("/tmp/explicit.state"));
            },
        );
        temp_env::with_vars(
            [
                ("MUNIN_STATEFILE", None),
                ("MUNIN_PLUGSTATE", Some("/tmp/plugstate")),
            ],
            || {
                assert_eq!(
                    state_file("logevents"),
                    PathBuf::from("/tmp/plugstate/logevents.state")
                );
            },
        );
        temp_env::with_vars(
            [("MUNIN_STATEFILE", None::<&str>), ("MUNIN_PLUGSTATE", None)],
            || {
                assert_eq!(
                    state_file("logevents"),
                    PathBuf::from("/var/lib/munin-node/plugin-state/logevents.state")
                );
            },
        );
    }

    #[test]
    fn test_plugin_name() {
        assert_eq!(plugin_name(Some("/etc/munin/plugins/logevents_web")), "logevents_web");
        assert_eq!(plugin_name(None), "dd-logevents");
    }

    #[test]
    fn test_dirtyconfig() {
        temp_env::with_var("MUNIN_CAP_DIRTYCONFIG", Some("1"), || assert!(dirtyconfig()));
        temp_env::with_var("MUNIN_CAP_DIRTYCONFIG", Some("0"), || assert!(!dirtyconfig()));
        temp_env::with_var_unset("MUNIN_CAP_DIRTYCONFIG", || assert!(!dirtyconfig()));
    }

    #[test]
    fn test_log_level() {
        temp_env::with_vars(
            [("DD_LOG_LEVEL", Some("debug")), ("LOG_LEVEL", Some("error"))],
            || assert_eq!(get_log_level(), log::Level::Debug),
        );
        temp_env::with_vars(
            [("DD_LOG_LEVEL", None), ("LOG_LEVEL", Some("error"))],
            || assert_eq!(get_log_level(), log::Level::Error),
        );
        temp_env::with_vars(
            [("DD_LOG_LEVEL", None::<&str>), ("LOG_LEVEL", None)],
            || assert_eq!(get_log_level(), log::Level::Warn),
        );
    }
}
