//! Replication log format check.

use async_trait::async_trait;

use precheck_core::{CheckCategory, CheckOutcome, CheckSpec, Severity};

use crate::checker::{CheckContext, Checker};

const REQUIRED_FORMAT: &str = "ROW";

/// Checks that an upstream instance writes its binlog in ROW format.
pub struct BinlogFormatCheck {
    spec: CheckSpec,
    declared: Option<String>,
}

impl BinlogFormatCheck {
    pub fn new(label: &str, declared: Option<String>) -> Self {
        Self {
            spec: CheckSpec::for_endpoint(label, CheckCategory::BinlogFormat, Severity::Fatal),
            declared,
        }
    }

    fn evaluate(&self) -> CheckOutcome {
        let spec = &self.spec;
        match self.declared.as_deref().map(str::trim) {
            Some(format) if format.eq_ignore_ascii_case(REQUIRED_FORMAT) => {
                CheckOutcome::pass(spec, "binlog_format is ROW")
            }
            Some(format) => CheckOutcome::fail(
                spec,
                format!("binlog_format is {}, must be {}", format, REQUIRED_FORMAT),
            ),
            None => CheckOutcome::fail(
                spec,
                format!("binlog_format not declared, must be {}", REQUIRED_FORMAT),
            ),
        }
    }
}

#[async_trait]
impl Checker for BinlogFormatCheck {
    fn spec(&self) -> &CheckSpec {
        &self.spec
    }

    async fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        if ctx.is_cancelled() {
            return CheckOutcome::cancelled(&self.spec);
        }
        self.evaluate()
    }
}
