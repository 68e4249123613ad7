//! The per-request access decision.
//!
//! A decision starts `Undecided`. Combinators (see `policy.rs`) move it to
//! `Allowed` or `Denied`:
//!
//! - `allow()` only moves `Undecided` to `Allowed`
//! - `deny()` always moves to `Denied`, and nothing moves out of `Denied`
//!
//! `is_concluded()` is true only for `Denied`. Together with the separate
//! `succeeded()` guard in each role predicate this gives first-allow-wins
//! across predicates while the whitelist gate still runs after an allow.
//!
//! Identity fields are resolved lazily, at most once per decision. A decision
//! belongs to one request and is never shared, so the memo cells are unsynchronized.

use once_cell::unsync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::account_kind::{AccountKind, AccountKindOracle};
use crate::error::{Denial, DenialReason};
use crate::types::{parse_id, ClaimsSource, Verdict, ACCOUNT_KIND_CLAIM, SUBJECT_ID_CLAIM};
use crate::whitelist::{AppWhitelistEntry, WhitelistConfiguration};

/// Where the subject identity comes from.
#[derive(Debug)]
enum Subject {
    Anonymous,
    Principal(Box<dyn ClaimsSource>),
    AccountKind(Uuid),
}

#[derive(Debug)]
pub struct AccessDecision {
    app_id: String,
    verdict: Verdict,
    denial_reason: Option<DenialReason>,
    subject: Subject,
    whitelist: Arc<WhitelistConfiguration>,
    oracle: Arc<dyn AccountKindOracle>,

    account_kind_id: OnceCell<Uuid>,
    subject_id: OnceCell<Uuid>,
    subject_name: OnceCell<Option<String>>,
    whitelist_entry: OnceCell<Option<Arc<AppWhitelistEntry>>>,
}

impl AccessDecision {
    fn new(
        app_id: String,
        subject: Subject,
        whitelist: Arc<WhitelistConfiguration>,
        oracle: Arc<dyn AccountKindOracle>,
    ) -> Self {
        Self {
            app_id,
            verdict: Verdict::Undecided,
            denial_reason: None,
            subject,
            whitelist,
            oracle,
            account_kind_id: OnceCell::new(),
            subject_id: OnceCell::new(),
            subject_name: OnceCell::new(),
            whitelist_entry: OnceCell::new(),
        }
    }

    pub(crate) fn anonymous(
        app_id: String,
        whitelist: Arc<WhitelistConfiguration>,
        oracle: Arc<dyn AccountKindOracle>,
    ) -> Self {
        Self::new(app_id, Subject::Anonymous, whitelist, oracle)
    }

    pub(crate) fn with_principal(
        app_id: String,
        principal: Box<dyn ClaimsSource>,
        whitelist: Arc<WhitelistConfiguration>,
        oracle: Arc<dyn AccountKindOracle>,
    ) -> Self {
        Self::new(app_id, Subject::Principal(principal), whitelist, oracle)
    }

    pub(crate) fn with_account_kind(
        app_id: String,
        account_kind_id: Uuid,
        whitelist: Arc<WhitelistConfiguration>,
        oracle: Arc<dyn AccountKindOracle>,
    ) -> Self {
        Self::new(app_id, Subject::AccountKind(account_kind_id), whitelist, oracle)
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Reason recorded by the most recent denial.
    pub fn denial_reason(&self) -> Option<DenialReason> {
        self.denial_reason
    }

    /// Moves `Undecided` to `Allowed`. Has no effect on any other state.
    pub fn allow(&mut self) {
        if self.verdict == Verdict::Undecided {
            self.verdict = Verdict::Allowed;
        }
    }

    /// Moves to `Denied` from any state.
    pub fn deny(&mut self) {
        self.deny_because(DenialReason::Explicit);
    }

    pub(crate) fn deny_because(&mut self, reason: DenialReason) {
        debug!(
            app_id = %self.app_id,
            reason = %reason,
            previous = %self.verdict,
            "access denied"
        );
        self.verdict = Verdict::Denied;
        self.denial_reason = Some(reason);
    }

    /// True only once the decision has been denied.
    pub fn is_concluded(&self) -> bool {
        self.verdict == Verdict::Denied
    }

    pub fn succeeded(&self) -> bool {
        self.verdict == Verdict::Allowed
    }

    /// False only with neither a principal nor a non-nil account-kind id.
    pub fn has_subject(&self) -> bool {
        matches!(self.subject, Subject::Principal(_)) || !self.account_kind_id().is_nil()
    }

    pub fn account_kind_id(&self) -> Uuid {
        *self.account_kind_id.get_or_init(|| match &self.subject {
            Subject::Anonymous => Uuid::nil(),
            Subject::Principal(claims) => parse_id(claims.claim(ACCOUNT_KIND_CLAIM)),
            Subject::AccountKind(id) => *id,
        })
    }

    pub fn subject_id(&self) -> Uuid {
        *self.subject_id.get_or_init(|| match &self.subject {
            Subject::Principal(claims) => parse_id(claims.claim(SUBJECT_ID_CLAIM)),
            Subject::Anonymous | Subject::AccountKind(_) => Uuid::nil(),
        })
    }

    /// Account-kind name from the oracle.
    pub fn subject_name(&self) -> Option<&str> {
        self.subject_name
            .get_or_init(|| {
                self.oracle
                    .name_of(self.account_kind_id())
                    .map(str::to_owned)
            })
            .as_deref()
    }

    /// The calling application's whitelist entry, if registered.
    pub fn whitelist_entry(&self) -> Option<&AppWhitelistEntry> {
        self.whitelist_entry
            .get_or_init(|| self.whitelist.shared_entry(&self.app_id))
            .as_deref()
    }

    pub(crate) fn has_kind(&self, kind: AccountKind) -> bool {
        self.subject_name() == Some(kind.name())
    }

    /// Terminal check: `Ok` only when some predicate allowed.
    ///
    /// An `Undecided` decision is a denial.
    pub fn try_verify(&self) -> Result<(), Denial> {
        match self.verdict {
            Verdict::Allowed => {
                info!(app_id = %self.app_id, subject = %self.subject_id(), "access granted");
                Ok(())
            }
            Verdict::Denied => {
                let reason = self.denial_reason.unwrap_or(DenialReason::Explicit);
                warn!(app_id = %self.app_id, reason = %reason, "access refused");
                Err(Denial::new(reason))
            }
            Verdict::Undecided => {
                warn!(
                    app_id = %self.app_id,
                    reason = %DenialReason::NoPolicyMatched,
                    "access refused"
                );
                Err(Denial::new(DenialReason::NoPolicyMatched))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account_kind::StaticAccountKinds;
    use crate::types::Claims;
    use crate::whitelist::AppWhitelistEntry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn whitelist() -> Arc<WhitelistConfiguration> {
        Arc::new(
            WhitelistConfiguration::new([
                AppWhitelistEntry::new("mobile-1").with_operations("Books", ["GetBooksAsync"])
            ])
            .unwrap(),
        )
    }

    fn oracle() -> Arc<dyn AccountKindOracle> {
        Arc::new(StaticAccountKinds::new())
    }

    fn anonymous() -> AccessDecision {
        AccessDecision::anonymous("mobile-1".into(), whitelist(), oracle())
    }

    /// Counts lookups so memoization is observable.
    #[derive(Debug, Default)]
    struct CountingOracle {
        calls: AtomicUsize,
        inner: StaticAccountKinds,
    }

    impl AccountKindOracle for CountingOracle {
        fn name_of(&self, id: Uuid) -> Option<&str> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.name_of(id)
        }
    }

    #[test]
    fn test_starts_undecided() {
        let decision = anonymous();
        assert_eq!(decision.verdict(), Verdict::Undecided);
        assert!(!decision.is_concluded());
        assert!(!decision.succeeded());
        assert_eq!(decision.denial_reason(), None);
    }

    #[test]
    fn test_allow_from_undecided() {
        let mut decision = anonymous();
        decision.allow();
        assert!(decision.succeeded());
        assert!(!decision.is_concluded(), "an allow is not a conclusion");

        decision.allow();
        assert_eq!(decision.verdict(), Verdict::Allowed);
    }

    #[test]
    fn test_deny_is_sticky() {
        let mut decision = anonymous();
        decision.deny();
        decision.allow();
        assert_eq!(decision.verdict(), Verdict::Denied);
        assert!(decision.is_concluded());
        assert_eq!(decision.denial_reason(), Some(DenialReason::Explicit));
    }

    #[test]
    fn test_deny_overwrites_allow() {
        let mut decision = anonymous();
        decision.allow();
        decision.deny();
        assert_eq!(decision.verdict(), Verdict::Denied);
    }

    #[test]
    fn test_try_verify_maps_verdicts() {
        let decision = anonymous();
        let denial = decision.try_verify().unwrap_err();
        assert_eq!(denial.reason(), DenialReason::NoPolicyMatched);

        let mut decision = anonymous();
        decision.allow();
        assert!(decision.try_verify().is_ok());

        let mut decision = anonymous();
        decision.deny_because(DenialReason::ControllerNotWhitelisted);
        let denial = decision.try_verify().unwrap_err();
        assert_eq!(denial.reason(), DenialReason::ControllerNotWhitelisted);
        assert_eq!(denial.to_string(), "Unauthorized access to resource");
    }

    #[test]
    fn test_anonymous_has_no_subject() {
        let decision = anonymous();
        assert!(!decision.has_subject());
        assert_eq!(decision.account_kind_id(), Uuid::nil());
        assert_eq!(decision.subject_id(), Uuid::nil());
        assert_eq!(decision.subject_name(), None);
    }

    #[test]
    fn test_principal_claims_resolve() {
        let subject = Uuid::new_v4();
        let claims = Claims::for_subject(subject, AccountKind::Publisher.id());
        let decision =
            AccessDecision::with_principal("mobile-1".into(), Box::new(claims), whitelist(), oracle());

        assert!(decision.has_subject());
        assert_eq!(decision.subject_id(), subject);
        assert_eq!(decision.account_kind_id(), AccountKind::Publisher.id());
        assert_eq!(decision.subject_name(), Some("Publisher"));
        assert!(decision.has_kind(AccountKind::Publisher));
    }

    #[test]
    fn test_malformed_claims_resolve_to_nil() {
        let claims = Claims::new()
            .with(SUBJECT_ID_CLAIM, "P1")
            .with(ACCOUNT_KIND_CLAIM, "Publisher");
        let decision =
            AccessDecision::with_principal("mobile-1".into(), Box::new(claims), whitelist(), oracle());

        assert!(decision.has_subject(), "a principal counts even with bad claims");
        assert_eq!(decision.subject_id(), Uuid::nil());
        assert_eq!(decision.account_kind_id(), Uuid::nil());
        assert_eq!(decision.subject_name(), None);
    }

    #[test]
    fn test_direct_account_kind() {
        let decision = AccessDecision::with_account_kind(
            "mobile-1".into(),
            AccountKind::Operator.id(),
            whitelist(),
            oracle(),
        );
        assert!(decision.has_subject());
        assert_eq!(decision.subject_id(), Uuid::nil());
        assert_eq!(decision.subject_name(), Some("Operator"));

        let nil = AccessDecision::with_account_kind("mobile-1".into(), Uuid::nil(), whitelist(), oracle());
        assert!(!nil.has_subject());
    }

    #[test]
    fn test_subject_name_resolved_once() {
        let counting = Arc::new(CountingOracle::default());
        let decision = AccessDecision::with_account_kind(
            "mobile-1".into(),
            AccountKind::User.id(),
            whitelist(),
            counting.clone(),
        );

        for _ in 0..3 {
            assert_eq!(decision.subject_name(), Some("User"));
        }
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_whitelist_entry_resolution() {
        let decision = anonymous();
        assert_eq!(decision.whitelist_entry().map(|e| e.app_id.as_str()), Some("mobile-1"));

        let unknown = AccessDecision::anonymous("unknown".into(), whitelist(), oracle());
        assert!(unknown.whitelist_entry().is_none());
    }
}
