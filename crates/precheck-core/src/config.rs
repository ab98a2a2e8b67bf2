//! Migration task configuration.
//!
//! Task files are YAML with kebab-case keys. JSON is accepted as well since
//! it is valid YAML. Parsing and validation happen before any check is
//! registered; every problem found here is an input error.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{CheckCategory, CoreError};

/// Default endpoint kind for source instances.
pub const DEFAULT_SOURCE_KIND: &str = "mysql";

/// Default endpoint kind for the target database.
pub const DEFAULT_TARGET_KIND: &str = "tidb";

/// Check-name label of the target endpoint.
pub const TARGET_LABEL: &str = "target";

/// Check-name label of task-wide schema checks.
pub const SCHEMA_LABEL: &str = "schema";

/// Labels a `source-id` may not take, since check names are
/// `<label>/<category>`.
pub const RESERVED_LABELS: [&str; 2] = [TARGET_LABEL, SCHEMA_LABEL];

/// A parsed migration task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskConfig {
    /// Task name.
    pub name: String,

    /// Which phases of the migration the task performs.
    #[serde(default)]
    pub task_mode: TaskMode,

    /// Whether several upstream tables are intentionally merged downstream.
    #[serde(default)]
    pub is_sharding: bool,

    /// Downstream database.
    pub target_database: Endpoint,

    /// Upstream instances, in declaration order.
    #[serde(default)]
    pub mysql_instances: Vec<SourceInstance>,

    /// Named routing rules referenced by instances.
    #[serde(default)]
    pub routes: BTreeMap<String, RouteRule>,

    /// Precheck tuning.
    #[serde(default)]
    pub precheck: PrecheckOptions,
}

/// Migration mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    /// Dump and load only.
    Full,
    /// Replicate from the binlog only.
    Incremental,
    /// Full load followed by incremental replication.
    #[default]
    All,
}

impl TaskMode {
    /// Returns true if the task reads the upstream replication log.
    pub fn reads_binlog(&self) -> bool {
        matches!(self, Self::Incremental | Self::All)
    }
}

/// Connection details for a database endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Endpoint {
    /// Endpoint kind (e.g. "mysql", "mariadb", "tidb").
    #[serde(default)]
    pub kind: Option<String>,

    pub host: String,

    pub port: u16,

    #[serde(default)]
    pub user: String,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Declared server version, e.g. "5.7.22-log".
    #[serde(default)]
    pub version: Option<String>,
}

impl Endpoint {
    /// Create a new Endpoint with minimal required fields.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            kind: None,
            host: host.into(),
            port,
            user: String::new(),
            password: None,
            version: None,
        }
    }

    /// Builder method to set the kind.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Builder method to set credentials.
    pub fn with_credentials(mut self, user: impl Into<String>, password: Option<&str>) -> Self {
        self.user = user.into();
        self.password = password.map(str::to_owned);
        self
    }

    /// Builder method to set the declared version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Normalised kind, falling back to `default` when unset.
    pub fn kind_or(&self, default: &str) -> String {
        self.kind
            .as_deref()
            .map(|k| k.trim().to_ascii_lowercase())
            .unwrap_or_else(|| default.to_string())
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Returns true if the host is a loopback name or address.
    pub fn is_loopback(&self) -> bool {
        matches!(
            self.host.as_str(),
            "localhost" | "127.0.0.1" | "::1" | "[::1]"
        )
    }
}

/// An upstream instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceInstance {
    /// Unique id of the instance within the task.
    pub source_id: String,

    #[serde(flatten)]
    pub endpoint: Endpoint,

    /// Declared `binlog_format` server variable.
    #[serde(default)]
    pub binlog_format: Option<String>,

    /// Names of routes applied to this instance's tables, in priority order.
    #[serde(default)]
    pub route_rules: Vec<String>,

    /// Tables to migrate, as `schema.table`.
    #[serde(default)]
    pub tables: Vec<String>,
}

impl SourceInstance {
    /// Create a new SourceInstance.
    pub fn new(source_id: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            source_id: source_id.into(),
            endpoint,
            binlog_format: None,
            route_rules: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Builder method to set the declared binlog format.
    pub fn with_binlog_format(mut self, format: impl Into<String>) -> Self {
        self.binlog_format = Some(format.into());
        self
    }

    /// Builder method to add a table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.tables.push(table.into());
        self
    }

    /// Builder method to reference a route.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route_rules.push(route.into());
        self
    }

    /// Endpoint kind, defaulting to mysql.
    pub fn kind(&self) -> String {
        self.endpoint.kind_or(DEFAULT_SOURCE_KIND)
    }
}

/// Maps upstream schema/table names to downstream ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouteRule {
    pub schema_pattern: String,

    #[serde(default)]
    pub table_pattern: Option<String>,

    pub target_schema: String,

    #[serde(default)]
    pub target_table: Option<String>,
}

impl RouteRule {
    /// Returns true if the rule applies to `schema.table`.
    pub fn matches(&self, schema: &str, table: &str) -> bool {
        pattern_matches(&self.schema_pattern, schema)
            && self
                .table_pattern
                .as_deref()
                .map_or(true, |p| pattern_matches(p, table))
    }

    /// Downstream name for `schema.table`. Only meaningful when `matches`.
    pub fn apply(&self, table: &str) -> (String, String) {
        let table = self.target_table.as_deref().unwrap_or(table);
        (self.target_schema.clone(), table.to_string())
    }
}

/// Matches a name against a pattern with an optional trailing `*`.
fn pattern_matches(pattern: &str, value: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => pattern == value,
    }
}

/// Precheck tuning carried in the task file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PrecheckOptions {
    /// Overall deadline for this task's precheck, in milliseconds.
    #[serde(default)]
    pub deadline_ms: Option<u64>,

    /// Categories to skip.
    #[serde(default)]
    pub ignore_checks: Vec<CheckCategory>,
}

impl TaskConfig {
    /// Create a new TaskConfig with a target and no sources.
    pub fn new(name: impl Into<String>, target_database: Endpoint) -> Self {
        Self {
            name: name.into(),
            task_mode: TaskMode::default(),
            is_sharding: false,
            target_database,
            mysql_instances: Vec::new(),
            routes: BTreeMap::new(),
            precheck: PrecheckOptions::default(),
        }
    }

    /// Builder method to add a source instance.
    pub fn with_instance(mut self, instance: SourceInstance) -> Self {
        self.mysql_instances.push(instance);
        self
    }

    /// Builder method to add a route.
    pub fn with_route(mut self, name: impl Into<String>, rule: RouteRule) -> Self {
        self.routes.insert(name.into(), rule);
        self
    }

    /// Parse and validate a task file.
    pub fn from_yaml(text: &str) -> Result<Self, CoreError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Target endpoint kind, defaulting to tidb.
    pub fn target_kind(&self) -> String {
        self.target_database.kind_or(DEFAULT_TARGET_KIND)
    }

    /// Returns true if checks in `category` should be registered.
    pub fn is_enabled(&self, category: CheckCategory) -> bool {
        !self.precheck.ignore_checks.contains(&category)
    }

    /// Check structural rules that don't require talking to any endpoint.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidConfig("task name must not be empty".into()));
        }
        validate_endpoint("target-database", &self.target_database)?;

        if self.mysql_instances.is_empty() {
            return Err(CoreError::InvalidConfig(
                "at least one mysql instance is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for instance in &self.mysql_instances {
            let id = instance.source_id.trim();
            if id.is_empty() {
                return Err(CoreError::InvalidConfig("source-id must not be empty".into()));
            }
            if RESERVED_LABELS.contains(&id) {
                return Err(CoreError::InvalidConfig(format!(
                    "source-id '{}' is reserved",
                    id
                )));
            }
            if !seen.insert(id) {
                return Err(CoreError::InvalidConfig(format!(
                    "duplicate source-id '{}'",
                    id
                )));
            }
            validate_endpoint(id, &instance.endpoint)?;

            for route in &instance.route_rules {
                if !self.routes.contains_key(route) {
                    return Err(CoreError::InvalidConfig(format!(
                        "{}: unknown route rule '{}'",
                        id, route
                    )));
                }
            }
            for table in &instance.tables {
                if split_table(table).is_none() {
                    return Err(CoreError::InvalidConfig(format!(
                        "{}: table '{}' is not in schema.table form",
                        id, table
                    )));
                }
            }
        }

        if self.precheck.deadline_ms == Some(0) {
            return Err(CoreError::InvalidConfig(
                "precheck deadline-ms must be positive".into(),
            ));
        }

        Ok(())
    }
}

fn validate_endpoint(label: &str, endpoint: &Endpoint) -> Result<(), CoreError> {
    if endpoint.host.trim().is_empty() {
        return Err(CoreError::InvalidConfig(format!("{}: host must not be empty", label)));
    }
    if endpoint.port == 0 {
        return Err(CoreError::InvalidConfig(format!("{}: port must not be 0", label)));
    }
    Ok(())
}

/// Split `schema.table` into its parts.
pub fn split_table(qualified: &str) -> Option<(&str, &str)> {
    let (schema, table) = qualified.split_once('.')?;
    if schema.is_empty() || table.is_empty() {
        return None;
    }
    Some((schema, table))
}
