//! Credential declaration check.

use async_trait::async_trait;

use precheck_core::{CheckCategory, CheckOutcome, CheckSpec, Endpoint, ErrorReason, Severity};

use crate::checker::{CheckContext, Checker};

/// Checks that an endpoint declares usable credentials.
///
/// A missing password is only tolerated for `root` on a loopback host. A
/// password written as `${NAME}` is read from the environment; if `NAME` is
/// unset the check cannot authenticate and reports an `auth` error.
pub struct PrivilegeCheck {
    spec: CheckSpec,
    endpoint: Endpoint,
}

impl PrivilegeCheck {
    pub fn new(label: &str, endpoint: Endpoint) -> Self {
        Self {
            spec: CheckSpec::for_endpoint(label, CheckCategory::Privilege, Severity::Fatal),
            endpoint,
        }
    }

    fn evaluate(&self) -> CheckOutcome {
        let spec = &self.spec;
        let user = self.endpoint.user.trim();
        if user.is_empty() {
            return CheckOutcome::fail(spec, "no user declared; anonymous access is not allowed");
        }

        if let Some(name) = self.endpoint.password.as_deref().and_then(env_reference) {
            return match std::env::var(name) {
                Ok(value) if !value.is_empty() => CheckOutcome::pass(
                    spec,
                    format!("credentials for user '{}' resolved from ${}", user, name),
                ),
                _ => CheckOutcome::error(
                    spec,
                    ErrorReason::Auth,
                    format!("password for user '{}' references unset variable {}", user, name),
                ),
            };
        }

        match self.endpoint.password.as_deref() {
            Some(password) if !password.is_empty() => {
                CheckOutcome::pass(spec, format!("credentials declared for user '{}'", user))
            }
            _ if user == "root" && self.endpoint.is_loopback() => CheckOutcome::pass(
                spec,
                "passwordless root on a loopback host; acceptable for local testing only",
            ),
            _ => CheckOutcome::fail(spec, format!("no password declared for user '{}'", user)),
        }
    }
}

/// Variable name of a `${NAME}` password.
fn env_reference(password: &str) -> Option<&str> {
    let name = password.strip_prefix("${")?.strip_suffix('}')?;
    (!name.is_empty()).then_some(name)
}

#[async_trait]
impl Checker for PrivilegeCheck {
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

#[cfg(test)]
mod tests {
    use super::*;
    use precheck_core::OutcomeStatus;

    fn status(endpoint: Endpoint) -> OutcomeStatus {
        PrivilegeCheck::new("s1", endpoint).evaluate().status
    }

    #[test]
    fn test_declared_credentials_pass() {
        let endpoint = Endpoint::new("10.0.0.1", 3306).with_credentials("dm", Some("secret"));
        assert_eq!(status(endpoint), OutcomeStatus::Pass);
    }

    #[test]
    fn test_anonymous_fails() {
        assert_eq!(status(Endpoint::new("10.0.0.1", 3306)), OutcomeStatus::Fail);
    }

    #[test]
    fn test_missing_password() {
        let remote = Endpoint::new("10.0.0.1", 3306).with_credentials("root", None);
        assert_eq!(status(remote), OutcomeStatus::Fail);

        let local = Endpoint::new("127.0.0.1", 3306).with_credentials("root", Some(""));
        assert_eq!(status(local), OutcomeStatus::Pass);
    }

    #[test]
    fn test_unset_password_variable_is_auth_error() {
        let endpoint = Endpoint::new("10.0.0.1", 3306)
            .with_credentials("dm", Some("${PRECHECK_TEST_UNSET_PASSWORD_7F3A}"));
        let outcome = PrivilegeCheck::new("s1", endpoint).evaluate();
        assert_eq!(outcome.status, OutcomeStatus::Error);
        assert_eq!(outcome.reason, Some(ErrorReason::Auth));
        assert_eq!(outcome.name, "s1/privilege");
    }

    #[test]
    fn test_password_variable_resolved() {
        std::env::set_var("PRECHECK_TEST_SET_PASSWORD_91C2", "secret");
        let endpoint = Endpoint::new("10.0.0.1", 3306)
            .with_credentials("dm", Some("${PRECHECK_TEST_SET_PASSWORD_91C2}"));
        assert_eq!(status(endpoint), OutcomeStatus::Pass);
    }

    #[test]
    fn test_env_reference_syntax() {
        assert_eq!(env_reference("${DB_PASS}"), Some("DB_PASS"));
        assert_eq!(env_reference("${}"), None);
        assert_eq!(env_reference("$DB_PASS"), None);
        assert_eq!(env_reference("plain"), None);
    }
}
