//! Check registry - turns a task config into an ordered list of checks.

use std::sync::Arc;

use tracing::debug;

use precheck_core::{CheckCategory, CheckSpec, Endpoint, TaskConfig, TARGET_LABEL};

use crate::checker::SharedChecker;
use crate::checks::{
    BinlogFormatCheck, ConnectivityCheck, EndpointRole, PrivilegeCheck, RouteConflictCheck,
    UnsupportedEndpointCheck, VersionCheck,
};

/// Build the checks that apply to `config`.
///
/// Deterministic: the target comes first, then each source instance in
/// declaration order, then task-wide schema checks. An endpoint of a kind no
/// checker understands gets a single `unsupported` check instead of being
/// dropped.
pub fn build(config: &TaskConfig) -> Vec<SharedChecker> {
    let mut checks: Vec<SharedChecker> = Vec::new();

    register_endpoint(
        &mut checks,
        config,
        TARGET_LABEL,
        &config.target_database,
        &config.target_kind(),
        EndpointRole::Target,
    );

    for instance in &config.mysql_instances {
        let supported = register_endpoint(
            &mut checks,
            config,
            &instance.source_id,
            &instance.endpoint,
            &instance.kind(),
            EndpointRole::Source,
        );
        if supported
            && config.task_mode.reads_binlog()
            && config.is_enabled(CheckCategory::BinlogFormat)
        {
            checks.push(Arc::new(BinlogFormatCheck::new(
                &instance.source_id,
                instance.binlog_format.clone(),
            )));
        }
    }

    if config.is_enabled(CheckCategory::Schema) {
        checks.push(Arc::new(RouteConflictCheck::new()));
    }

    debug!(task = %config.name, checks = checks.len(), "Built check registry");
    checks
}

/// Specs of `checks`, in order.
pub fn specs(checks: &[SharedChecker]) -> Vec<CheckSpec> {
    checks.iter().map(|c| c.spec().clone()).collect()
}

/// Register the per-endpoint checks. Returns false if the kind is unsupported.
fn register_endpoint(
    checks: &mut Vec<SharedChecker>,
    config: &TaskConfig,
    label: &str,
    endpoint: &Endpoint,
    kind: &str,
    role: EndpointRole,
) -> bool {
    if !role.supports(kind) {
        checks.push(Arc::new(UnsupportedEndpointCheck::new(label, kind)));
        return false;
    }

    if config.is_enabled(CheckCategory::Connectivity) {
        checks.push(Arc::new(ConnectivityCheck::new(label, endpoint.clone())));
    }
    if config.is_enabled(CheckCategory::Privilege) {
        checks.push(Arc::new(PrivilegeCheck::new(label, endpoint.clone())));
    }
    if config.is_enabled(CheckCategory::Version) {
        checks.push(Arc::new(VersionCheck::new(label, kind, endpoint)));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use precheck_core::{SourceInstance, TaskMode};

    fn names(config: &TaskConfig) -> Vec<String> {
        specs(&build(config)).into_iter().map(|s| s.name).collect()
    }

    fn config() -> TaskConfig {
        TaskConfig::new("t", Endpoint::new("db", 4000))
            .with_instance(SourceInstance::new("s1", Endpoint::new("a", 3306)))
            .with_instance(SourceInstance::new(
                "pg",
                Endpoint::new("b", 5432).with_kind("postgres"),
            ))
    }

    #[test]
    fn test_registry_order() {
        assert_eq!(
            names(&config()),
            vec![
                "target/connectivity",
                "target/privilege",
                "target/version",
                "s1/connectivity",
                "s1/privilege",
                "s1/version",
                "s1/binlog-format",
                "pg/unsupported",
                "schema/route-conflict",
            ]
        );
    }

    #[test]
    fn test_names_unique_for_valid_configs() {
        let config = config();
        config.validate().unwrap();
        let names = names(&config);
        let unique: std::collections::HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_source_named_like_target_is_rejected() {
        let config = TaskConfig::new("t", Endpoint::new("db", 4000))
            .with_instance(SourceInstance::new(TARGET_LABEL, Endpoint::new("a", 3306)));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_is_deterministic() {
        let config = config();
        assert_eq!(specs(&build(&config)), specs(&build(&config)));
    }

    #[test]
    fn test_full_mode_skips_binlog() {
        let mut config = config();
        config.task_mode = TaskMode::Full;
        assert!(!names(&config).iter().any(|n| n.ends_with("binlog-format")));
    }

    #[test]
    fn test_ignored_categories_are_skipped_but_unsupported_is_not() {
        let mut config = config();
        config.precheck.ignore_checks = vec![
            CheckCategory::Connectivity,
            CheckCategory::Privilege,
            CheckCategory::BinlogFormat,
            CheckCategory::Version,
            CheckCategory::Schema,
            CheckCategory::Unsupported,
        ];
        assert_eq!(names(&config), vec!["pg/unsupported"]);
    }

    #[test]
    fn test_unsupported_target() {
        let config = TaskConfig::new("t", Endpoint::new("db", 9042).with_kind("Cassandra"))
            .with_instance(SourceInstance::new("s1", Endpoint::new("a", 3306)));
        let specs = specs(&build(&config));
        assert_eq!(specs[0].name, "target/unsupported");
        assert_eq!(specs[0].category, CheckCategory::Unsupported);
    }
}
