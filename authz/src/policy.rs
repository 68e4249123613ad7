//! Policy combinators over an [`AccessDecision`].
//!
//! Every combinator consumes the decision and returns it, so checks chain:
//!
//! ```rust
//! use authz::{AccountKind, AppWhitelistEntry, DecisionFactory, WhitelistConfiguration};
//! use authz::types::endpoints::books;
//! use std::sync::Arc;
//!
//! let whitelist = WhitelistConfiguration::new([
//!     AppWhitelistEntry::new("mobile-1").with_endpoint(books::GET_BOOKS),
//! ])
//! .unwrap();
//! let factory = DecisionFactory::with_static_kinds(Arc::new(whitelist));
//!
//! let decision = factory
//!     .decision_for_account_kind("mobile-1", AccountKind::Operator.id())
//!     .check_whitelist(books::GET_BOOKS)
//!     .allow_publisher()
//!     .allow_operator();
//! assert!(decision.try_verify().is_ok());
//! ```
//!
//! Guards:
//! - the whitelist gates are skipped once the decision is denied; they only
//!   ever deny
//! - role predicates are skipped once the decision is denied or allowed, so
//!   the first matching predicate wins

use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

use crate::account_kind::AccountKind;
use crate::decision::AccessDecision;
use crate::error::{DenialReason, Result};
use crate::types::Endpoint;
use crate::whitelist::match_endpoint;

/// Answers ownership questions from storage.
#[async_trait]
pub trait OwnershipLookup: Send + Sync {
    /// Whether `publisher_id` is the owner of record for `book_id`.
    async fn publisher_owns_book(&self, publisher_id: Uuid, book_id: Uuid) -> Result<bool>;
}

/// One pure combinator, for evaluating an ordered rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    WhitelistEndpoint(Endpoint),
    WhitelistSubject,
    User,
    OwningUser(Uuid),
    Publisher,
    OwningPublisher(Uuid),
    Operator,
}

impl AccessDecision {
    /// Applies one rule with the same guards as the named combinator.
    pub fn apply(self, rule: &Rule) -> Self {
        match *rule {
            Rule::WhitelistEndpoint(endpoint) => {
                self.check_whitelist_endpoint(endpoint.controller, endpoint.operation)
            }
            Rule::WhitelistSubject => self.check_whitelist_subject(),
            Rule::User => self.allow_kind(AccountKind::User, None),
            Rule::OwningUser(owner) => self.allow_kind(AccountKind::User, Some(owner)),
            Rule::Publisher => self.allow_kind(AccountKind::Publisher, None),
            Rule::OwningPublisher(owner) => self.allow_kind(AccountKind::Publisher, Some(owner)),
            Rule::Operator => self.allow_kind(AccountKind::Operator, None),
        }
    }

    /// Applies rules in order.
    pub fn apply_all<'a>(self, rules: impl IntoIterator<Item = &'a Rule>) -> Self {
        rules.into_iter().fold(self, |decision, rule| decision.apply(rule))
    }

    /// Denies unless the calling application may invoke `controller.operation`.
    ///
    /// Never allows.
    pub fn check_whitelist_endpoint(mut self, controller: &str, operation: &str) -> Self {
        if self.is_concluded() {
            return self;
        }
        if let Err(reason) = match_endpoint(self.whitelist_entry(), controller, operation) {
            debug!(
                app_id = %self.app_id(),
                controller,
                operation,
                "whitelist gate rejected endpoint"
            );
            self.deny_because(reason);
        }
        self
    }

    pub fn check_whitelist(self, endpoint: Endpoint) -> Self {
        self.check_whitelist_endpoint(endpoint.controller, endpoint.operation)
    }

    /// Denies unless the subject's account-kind name is in the entry's allowed subjects.
    pub fn check_whitelist_subject(mut self) -> Self {
        if self.is_concluded() {
            return self;
        }
        let reason = match self.whitelist_entry() {
            None => Some(DenialReason::UnregisteredApplication),
            Some(entry) if !entry.permits_subject(self.subject_name()) => {
                Some(DenialReason::SubjectNotWhitelisted)
            }
            Some(_) => None,
        };
        if let Some(reason) = reason {
            self.deny_because(reason);
        }
        self
    }

    pub fn allow_user(self) -> Self {
        self.allow_kind(AccountKind::User, None)
    }

    /// Allows a User whose subject id is `owner_id`.
    pub fn allow_owning_user(self, owner_id: Uuid) -> Self {
        self.allow_kind(AccountKind::User, Some(owner_id))
    }

    pub fn allow_publisher(self) -> Self {
        self.allow_kind(AccountKind::Publisher, None)
    }

    /// Allows a Publisher whose subject id is `owner_id`.
    pub fn allow_owning_publisher(self, owner_id: Uuid) -> Self {
        self.allow_kind(AccountKind::Publisher, Some(owner_id))
    }

    /// Operators have blanket access; there is no ownership variant.
    pub fn allow_operator(self) -> Self {
        self.allow_kind(AccountKind::Operator, None)
    }

    /// Allows a Publisher that storage records as the owner of `book_id`.
    ///
    /// Unlike the other predicates this reads from storage. The read is
    /// skipped when a guard applies or the subject is not a Publisher. A
    /// failed read denies.
    pub async fn allow_publisher_only_if_owns(
        mut self,
        lookup: &dyn OwnershipLookup,
        book_id: Uuid,
    ) -> Self {
        if self.is_concluded() || self.succeeded() || !self.has_kind(AccountKind::Publisher) {
            return self;
        }
        let publisher_id = self.subject_id();
        match lookup.publisher_owns_book(publisher_id, book_id).await {
            Ok(true) => self.allow(),
            Ok(false) => {
                debug!(%publisher_id, %book_id, "publisher is not the owner of record");
            }
            Err(e) => {
                error!(%publisher_id, %book_id, "ownership lookup failed: {}", e);
                self.deny_because(DenialReason::OwnershipLookupFailed);
            }
        }
        self
    }

    fn allow_kind(mut self, kind: AccountKind, owner: Option<Uuid>) -> Self {
        if self.is_concluded() || self.succeeded() {
            return self;
        }
        // A nil subject is a missing or unparsable `sub`; it owns nothing.
        let owns = owner.map_or(true, |owner_id| {
            let subject_id = self.subject_id();
            !subject_id.is_nil() && subject_id == owner_id
        });
        if self.has_kind(kind) && owns {
            self.allow();
        }
        self
    }
}
