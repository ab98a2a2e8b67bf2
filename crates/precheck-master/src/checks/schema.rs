//! Downstream table collision check.

use std::collections::BTreeMap;

use async_trait::async_trait;

use precheck_core::config::split_table;
use precheck_core::{CheckCategory, CheckOutcome, CheckSpec, Severity, TaskConfig, SCHEMA_LABEL};

use crate::checker::{CheckContext, Checker};

/// Checks that no two upstream tables land on the same downstream table
/// unless the task is a sharding merge.
pub struct RouteConflictCheck {
    spec: CheckSpec,
}

impl RouteConflictCheck {
    pub fn new() -> Self {
        Self {
            spec: CheckSpec::new(
                format!("{}/route-conflict", SCHEMA_LABEL),
                CheckCategory::Schema,
                Severity::Fatal,
            ),
        }
    }

    fn evaluate(&self, config: &TaskConfig) -> CheckOutcome {
        let spec = &self.spec;
        let targets = route_targets(config);
        let merged: Vec<(&String, &Vec<String>)> =
            targets.iter().filter(|(_, sources)| sources.len() > 1).collect();

        if merged.is_empty() {
            return CheckOutcome::pass(
                spec,
                format!("{} downstream tables, no collisions", targets.len()),
            );
        }

        if config.is_sharding {
            return CheckOutcome::pass(
                spec,
                format!("{} downstream tables merge sharded sources", merged.len()),
            );
        }

        let detail = merged
            .iter()
            .map(|(target, sources)| format!("{} <- {}", target, sources.join(", ")));
        CheckOutcome::fail(
            spec,
            format!(
                "{} downstream tables receive rows from several upstream tables but is-sharding is false",
                merged.len()
            ),
        )
        .with_detail(detail)
    }
}

impl Default for RouteConflictCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// Downstream `schema.table` -> upstream `source:schema.table` list.
///
/// Each instance's routes are tried in order and the first match wins;
/// unrouted tables keep their name.
fn route_targets(config: &TaskConfig) -> BTreeMap<String, Vec<String>> {
    let mut targets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for instance in &config.mysql_instances {
        for qualified in &instance.tables {
            let Some((schema, table)) = split_table(qualified) else {
                continue;
            };
            let (target_schema, target_table) = instance
                .route_rules
                .iter()
                .filter_map(|name| config.routes.get(name))
                .find(|rule| rule.matches(schema, table))
                .map(|rule| rule.apply(table))
                .unwrap_or_else(|| (schema.to_string(), table.to_string()));

            let source = format!("{}:{}", instance.source_id, qualified);
            let entry = targets
                .entry(format!("{}.{}", target_schema, target_table))
                .or_default();
            if !entry.contains(&source) {
                entry.push(source);
            }
        }
    }
    targets
}

#[async_trait]
impl Checker for RouteConflictCheck {
    fn spec(&self) -> &CheckSpec {
        &self.spec
    }

    async fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        if ctx.is_cancelled() {
            return CheckOutcome::cancelled(&self.spec);
        }
        self.evaluate(ctx.config())
    }
}
