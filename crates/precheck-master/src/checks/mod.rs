//! Built-in checks.
//!
//! These work from what the task file declares plus a TCP probe for
//! reachability:
//! - Connectivity: endpoint accepts TCP connections
//! - Privilege: credentials are declared
//! - Binlog format: upstream replicates in ROW format
//! - Version: declared server version is supported
//! - Schema: routed tables don't collide downstream
//! - Unsupported: placeholder for endpoint kinds nothing else understands

mod binlog;
mod connectivity;
mod privilege;
mod schema;
mod unsupported;
mod version;

pub use binlog::BinlogFormatCheck;
pub use connectivity::ConnectivityCheck;
pub use privilege::PrivilegeCheck;
pub use schema::RouteConflictCheck;
pub use unsupported::UnsupportedEndpointCheck;
pub use version::{parse_version, VersionCheck};

/// Which side of the migration an endpoint is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Source,
    Target,
}

impl EndpointRole {
    /// Endpoint kinds this side knows how to check.
    pub fn supports(&self, kind: &str) -> bool {
        match self {
            Self::Source => matches!(kind, "mysql" | "mariadb"),
            Self::Target => matches!(kind, "tidb" | "mysql"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use precheck_core::TaskConfig;

    use crate::checker::CheckContext;
    use crate::pool::ProbePool;

    pub fn context(config: TaskConfig) -> CheckContext {
        CheckContext::new(
            Arc::new(config),
            CancellationToken::new(),
            ProbePool::new(2),
            Duration::from_millis(500),
        )
    }
}
