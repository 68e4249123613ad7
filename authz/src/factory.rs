use std::sync::Arc;
use uuid::Uuid;

use crate::account_kind::{AccountKindOracle, StaticAccountKinds};
use crate::decision::AccessDecision;
use crate::legacy::LegacyWhitelistGate;
use crate::types::ClaimsSource;
use crate::whitelist::WhitelistConfiguration;

/// Builds fresh decisions bound to a calling application.
///
/// Holds only shared, immutable state; cloning is cheap and building a
/// decision cannot fail.
#[derive(Debug, Clone)]
pub struct DecisionFactory {
    whitelist: Arc<WhitelistConfiguration>,
    oracle: Arc<dyn AccountKindOracle>,
}

impl DecisionFactory {
    pub fn new(whitelist: Arc<WhitelistConfiguration>, oracle: Arc<dyn AccountKindOracle>) -> Self {
        Self { whitelist, oracle }
    }

    /// A factory using the built-in account-kind table.
    pub fn with_static_kinds(whitelist: Arc<WhitelistConfiguration>) -> Self {
        Self::new(whitelist, Arc::new(StaticAccountKinds::new()))
    }

    /// A decision with no subject, for whitelist-only gates.
    pub fn decision_for(&self, app_id: impl Into<String>) -> AccessDecision {
        AccessDecision::anonymous(app_id.into(), self.whitelist.clone(), self.oracle.clone())
    }

    /// A decision whose subject is read lazily from `principal`.
    pub fn decision_for_principal(
        &self,
        app_id: impl Into<String>,
        principal: impl ClaimsSource + 'static,
    ) -> AccessDecision {
        AccessDecision::with_principal(
            app_id.into(),
            Box::new(principal),
            self.whitelist.clone(),
            self.oracle.clone(),
        )
    }

    /// A decision for a caller that has an account kind but no token yet.
    pub fn decision_for_account_kind(
        &self,
        app_id: impl Into<String>,
        account_kind_id: Uuid,
    ) -> AccessDecision {
        AccessDecision::with_account_kind(
            app_id.into(),
            account_kind_id,
            self.whitelist.clone(),
            self.oracle.clone(),
        )
    }

    /// A whitelist-only gate over the same configuration.
    pub fn legacy_gate(&self) -> LegacyWhitelistGate {
        LegacyWhitelistGate::new(self.whitelist.clone())
    }

    pub fn whitelist(&self) -> &WhitelistConfiguration {
        &self.whitelist
    }

    pub fn oracle(&self) -> &dyn AccountKindOracle {
        self.oracle.as_ref()
    }
}
