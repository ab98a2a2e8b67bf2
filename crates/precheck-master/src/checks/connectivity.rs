//! TCP reachability probe.

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use precheck_core::{CheckCategory, CheckOutcome, CheckSpec, Endpoint, ErrorReason, Severity};

use crate::checker::{CheckContext, Checker};

/// Checks that an endpoint accepts TCP connections.
pub struct ConnectivityCheck {
    spec: CheckSpec,
    endpoint: Endpoint,
}

impl ConnectivityCheck {
    pub fn new(label: &str, endpoint: Endpoint) -> Self {
        Self {
            spec: CheckSpec::for_endpoint(label, CheckCategory::Connectivity, Severity::Fatal),
            endpoint,
        }
    }

    async fn probe(&self, ctx: &CheckContext) -> CheckOutcome {
        let spec = &self.spec;
        let _permit = match ctx.probe_permit(spec).await {
            Ok(permit) => permit,
            Err(outcome) => return outcome,
        };

        let addr = self.endpoint.address();
        debug!(check = %spec.name, addr = %addr, "Probing endpoint");

        match tokio::time::timeout(ctx.probe_timeout(), TcpStream::connect(&addr)).await {
            Ok(Ok(_stream)) => CheckOutcome::pass(spec, format!("connected to {}", addr)),
            Ok(Err(e)) => CheckOutcome::error(
                spec,
                ErrorReason::Network,
                format!("failed to connect to {}: {}", addr, e),
            ),
            Err(_) => CheckOutcome::error(
                spec,
                ErrorReason::Network,
                format!(
                    "connecting to {} timed out after {}ms",
                    addr,
                    ctx.probe_timeout().as_millis()
                ),
            ),
        }
    }
}

#[async_trait]
impl Checker for ConnectivityCheck {
    fn spec(&self) -> &CheckSpec {
        &self.spec
    }

    async fn check(&self, ctx: &CheckContext) -> CheckOutcome {
        ctx.guard(&self.spec, self.probe(ctx)).await
    }
}
