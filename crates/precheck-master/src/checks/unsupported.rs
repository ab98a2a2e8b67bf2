//! Placeholder check for endpoint kinds nothing else understands.

use async_trait::async_trait;

use precheck_core::{CheckCategory, CheckOutcome, CheckSpec, ErrorReason, Severity};

use crate::checker::{CheckContext, Checker};

/// Always reports `unsupported` so the endpoint still shows up in the report.
pub struct UnsupportedEndpointCheck {
    spec: CheckSpec,
    kind: String,
}

impl UnsupportedEndpointCheck {
    pub fn new(label: &str, kind: impl Into<String>) -> Self {
        Self {
            spec: CheckSpec::for_endpoint(label, CheckCategory::Unsupported, Severity::Fatal),
            kind: kind.into(),
        }
    }
}

#[async_trait]
impl Checker for UnsupportedEndpointCheck {
    fn spec(&self) -> &CheckSpec {
        &self.spec
    }

    async fn check(&self, _ctx: &CheckContext) -> CheckOutcome {
        CheckOutcome::error(
            &self.spec,
            ErrorReason::Unsupported,
            format!("endpoint kind '{}' is not supported", self.kind),
        )
    }
}
