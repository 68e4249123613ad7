//! Error types for the access-decision engine.
//!
//! # Security Note
//! Evaluating a request never produces an `AuthzError`. Every failed check
//! collapses into a single [`Denial`] whose outward text is fixed, so a caller
//! cannot learn which check rejected it. The specific [`DenialReason`] is kept
//! for server-side logs only.

use std::fmt;
use thiserror::Error;

/// Problem type rendered for every denial.
pub const UNAUTHORIZED_PROBLEM_TYPE: &str = "https://tools.ietf.org/html/rfc9110#section-15.5.2";

/// Problem title rendered for every denial.
pub const UNAUTHORIZED_TITLE: &str = "Unauthorized access to resource";

/// Errors raised while loading configuration or talking to collaborators.
///
/// These never describe a request verdict; see [`Denial`] for that.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The whitelist document could not be parsed.
    #[error("Whitelist parsing failed: {0}")]
    WhitelistParse(String),

    /// The whitelist parsed but is not usable (empty ids, duplicates).
    #[error("Whitelist validation failed: {0}")]
    WhitelistValidation(String),

    /// The whitelist file could not be read.
    #[error("Whitelist I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The ownership collaborator could not answer.
    #[error("Ownership lookup failed: {0}")]
    Lookup(String),
}

/// A specialized Result type for configuration and collaborator operations.
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Why a decision was denied. Logged, never rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// `deny()` was called directly.
    Explicit,
    /// The controller or operation name was empty.
    EmptyEndpoint,
    /// The calling application has no whitelist entry.
    UnregisteredApplication,
    /// The entry has no key for the controller.
    ControllerNotWhitelisted,
    /// The controller's operation set does not contain the operation.
    OperationNotWhitelisted,
    /// The resolved subject name is not in the entry's allowed subjects.
    SubjectNotWhitelisted,
    /// The ownership collaborator failed; evaluation fails closed.
    OwnershipLookupFailed,
    /// The chain finished without any predicate allowing.
    NoPolicyMatched,
}

impl DenialReason {
    /// Stable identifier used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::Explicit => "explicit",
            DenialReason::EmptyEndpoint => "empty_endpoint",
            DenialReason::UnregisteredApplication => "unregistered_application",
            DenialReason::ControllerNotWhitelisted => "controller_not_whitelisted",
            DenialReason::OperationNotWhitelisted => "operation_not_whitelisted",
            DenialReason::SubjectNotWhitelisted => "subject_not_whitelisted",
            DenialReason::OwnershipLookupFailed => "ownership_lookup_failed",
            DenialReason::NoPolicyMatched => "no_policy_matched",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one outward outcome of a failed access check.
///
/// Its `Display` output is identical for every reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unauthorized access to resource")]
pub struct Denial {
    reason: DenialReason,
}

impl Denial {
    pub(crate) fn new(reason: DenialReason) -> Self {
        Self { reason }
    }

    /// The internal reason, for logging only.
    pub fn reason(&self) -> DenialReason {
        self.reason
    }

    /// Machine-readable problem type for the HTTP layer.
    pub fn problem_type(&self) -> &'static str {
        UNAUTHORIZED_PROBLEM_TYPE
    }

    /// Problem title for the HTTP layer.
    pub fn title(&self) -> &'static str {
        UNAUTHORIZED_TITLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthzError::WhitelistParse("bad indentation".to_string());
        assert_eq!(err.to_string(), "Whitelist parsing failed: bad indentation");

        let err = AuthzError::Lookup("pool closed".to_string());
        assert_eq!(err.to_string(), "Ownership lookup failed: pool closed");
    }

    #[test]
    fn test_denial_text_does_not_leak_reason() {
        let reasons = [
            DenialReason::Explicit,
            DenialReason::EmptyEndpoint,
            DenialReason::UnregisteredApplication,
            DenialReason::ControllerNotWhitelisted,
            DenialReason::OperationNotWhitelisted,
            DenialReason::SubjectNotWhitelisted,
            DenialReason::OwnershipLookupFailed,
            DenialReason::NoPolicyMatched,
        ];

        for reason in reasons {
            let denial = Denial::new(reason);
            assert_eq!(denial.to_string(), UNAUTHORIZED_TITLE);
            assert_eq!(denial.title(), UNAUTHORIZED_TITLE);
            assert_eq!(denial.problem_type(), UNAUTHORIZED_PROBLEM_TYPE);
            assert_eq!(denial.reason(), reason);
        }
    }

    #[test]
    fn test_reason_identifiers() {
        assert_eq!(DenialReason::NoPolicyMatched.to_string(), "no_policy_matched");
        assert_eq!(
            DenialReason::UnregisteredApplication.as_str(),
            "unregistered_application"
        );
    }
}
