//! Whitelist-only verification for endpoints with no role policy.
//!
//! Uses the same matching rule as `AccessDecision::check_whitelist_endpoint`,
//! but passing here is enough: there is no role layer to allow afterwards.

use std::sync::Arc;
use tracing::debug;

use crate::error::Denial;
use crate::types::Endpoint;
use crate::whitelist::WhitelistConfiguration;

#[derive(Debug, Clone)]
pub struct LegacyWhitelistGate {
    whitelist: Arc<WhitelistConfiguration>,
}

impl LegacyWhitelistGate {
    pub fn new(whitelist: Arc<WhitelistConfiguration>) -> Self {
        Self { whitelist }
    }

    pub fn verify(&self, app_id: &str, controller: &str, operation: &str) -> Result<(), Denial> {
        self.whitelist
            .match_endpoint(app_id, controller, operation)
            .map_err(|reason| {
                debug!(app_id, controller, operation, reason = %reason, "legacy gate denied");
                Denial::new(reason)
            })
    }

    pub fn verify_endpoint(&self, app_id: &str, endpoint: Endpoint) -> Result<(), Denial> {
        self.verify(app_id, endpoint.controller, endpoint.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DenialReason;
    use crate::factory::DecisionFactory;
    use crate::types::endpoints::health;
    use crate::whitelist::AppWhitelistEntry;

    fn whitelist() -> Arc<WhitelistConfiguration> {
        Arc::new(
            WhitelistConfiguration::new([
                AppWhitelistEntry::new("monitor").with_endpoint(health::GET_HEALTH),
                AppWhitelistEntry::new("mobile-1").with_operations("Books", ["GetBooksAsync"]),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_verify_passes_whitelisted_endpoint() {
        let gate = LegacyWhitelistGate::new(whitelist());
        assert!(gate.verify_endpoint("monitor", health::GET_HEALTH).is_ok());
    }

    #[test]
    fn test_verify_denials() {
        let gate = LegacyWhitelistGate::new(whitelist());
        let cases = [
            ("monitor", "", "GetHealthAsync", DenialReason::EmptyEndpoint),
            ("unknown", "Health", "GetHealthAsync", DenialReason::UnregisteredApplication),
            ("mobile-1", "Health", "GetHealthAsync", DenialReason::ControllerNotWhitelisted),
            ("mobile-1", "Books", "GetBookAsync", DenialReason::OperationNotWhitelisted),
        ];

        for (app, controller, operation, expected) in cases {
            let denial = gate.verify(app, controller, operation).unwrap_err();
            assert_eq!(denial.reason(), expected, "{app} {controller}.{operation}");
        }
    }

    #[test]
    fn test_agrees_with_chained_gate() {
        let whitelist = whitelist();
        let gate = LegacyWhitelistGate::new(whitelist.clone());
        let factory = DecisionFactory::with_static_kinds(whitelist);

        let probes = [
            ("monitor", "Health", "GetHealthAsync"),
            ("monitor", "health", "GetHealthAsync"),
            ("mobile-1", "Books", "GetBooksAsync"),
            ("mobile-1", "Books", "AddBookAsync"),
            ("ghost", "Books", "GetBooksAsync"),
            ("mobile-1", "", ""),
        ];

        for (app, controller, operation) in probes {
            let legacy = gate.verify(app, controller, operation).map_err(|d| d.reason());
            let chained = factory
                .decision_for(app)
                .check_whitelist_endpoint(controller, operation);
            assert_eq!(legacy.is_ok(), !chained.is_concluded());
            assert_eq!(legacy.err(), chained.denial_reason());
        }
    }
}
