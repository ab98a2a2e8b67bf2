//! Server version compatibility check.

use std::fmt;

use async_trait::async_trait;

use precheck_core::{CheckCategory, CheckOutcome, CheckSpec, Endpoint, ErrorReason, Severity};

use crate::checker::{CheckContext, Checker};

/// A `major.minor.patch` server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse `major.minor[.patch]` with an optional `v` prefix and any
/// `-suffix`/`+build` tail, e.g. `5.7.22-log` or `v7.5.0`.
pub fn parse_version(raw: &str) -> Option<ServerVersion> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('v')
        .or_else(|| raw.strip_prefix('V'))
        .unwrap_or(raw);
    let core = raw.split(['-', '+']).next()?;

    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(ServerVersion::new(major, minor, patch))
}

/// Supported `[min, max)` range per endpoint kind.
fn supported_range(kind: &str) -> (Option<ServerVersion>, Option<ServerVersion>) {
    match kind {
        "mysql" => (
            Some(ServerVersion::new(5, 5, 0)),
            Some(ServerVersion::new(8, 1, 0)),
        ),
        "mariadb" => (Some(ServerVersion::new(10, 1, 2)), None),
        "tidb" => (Some(ServerVersion::new(4, 0, 0)), None),
        _ => (None, None),
    }
}

/// Checks that the declared server version falls in the supported range.
pub struct VersionCheck {
    spec: CheckSpec,
    kind: String,
    declared: Option<String>,
}

impl VersionCheck {
    pub fn new(label: &str, kind: impl Into<String>, endpoint: &Endpoint) -> Self {
        Self {
            spec: CheckSpec::for_endpoint(label, CheckCategory::Version, Severity::Warning),
            kind: kind.into(),
            declared: endpoint.version.clone(),
        }
    }

    fn evaluate(&self) -> CheckOutcome {
        let spec = &self.spec;
        let Some(raw) = self.declared.as_deref() else {
            return CheckOutcome::fail(spec, "server version not declared");
        };
        let Some(version) = parse_version(raw) else {
            return CheckOutcome::error(
                spec,
                ErrorReason::Internal,
                format!("cannot parse server version '{}'", raw),
            );
        };

        let (min, max) = supported_range(&self.kind);
        if let Some(min) = min.filter(|min| version < *min) {
            return CheckOutcome::fail(
                spec,
                format!("{} {} is older than the minimum supported {}", self.kind, version, min),
            );
        }
        if let Some(max) = max.filter(|max| version >= *max) {
            return CheckOutcome::fail(
                spec,
                format!("{} {} is not supported (must be below {})", self.kind, version, max),
            );
        }
        CheckOutcome::pass(spec, format!("{} {} is supported", self.kind, version))
    }
}

#[async_trait]
impl Checker for VersionCheck {
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
