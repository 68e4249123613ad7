//! Per-application whitelist of controller operations.
//!
//! Loaded once at startup from YAML and shared read-only afterwards:
//!
//! ```yaml
//! applications:
//!   - app_id: mobile-1
//!     controller_endpoints:
//!       Books: [GetBooksAsync, GetBookAsync]
//!     allowed_subjects: [User]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{AuthzError, DenialReason, Result};
use crate::types::Endpoint;

/// What one calling application may invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppWhitelistEntry {
    pub app_id: String,

    /// Controller name to the operation names permitted on it.
    #[serde(default)]
    pub controller_endpoints: HashMap<String, HashSet<String>>,

    /// Account-kind names accepted by the subject check.
    #[serde(default)]
    pub allowed_subjects: HashSet<String>,
}

impl AppWhitelistEntry {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            controller_endpoints: HashMap::new(),
            allowed_subjects: HashSet::new(),
        }
    }

    /// Permits `operations` on `controller`, merging with anything already permitted.
    pub fn with_operations<I, S>(mut self, controller: impl Into<String>, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.controller_endpoints
            .entry(controller.into())
            .or_default()
            .extend(operations.into_iter().map(Into::into));
        self
    }

    /// Permits a single catalogued endpoint.
    pub fn with_endpoint(self, endpoint: Endpoint) -> Self {
        self.with_operations(endpoint.controller, [endpoint.operation])
    }

    /// Accepts subjects whose account kind has this name.
    pub fn with_subject(mut self, name: impl Into<String>) -> Self {
        self.allowed_subjects.insert(name.into());
        self
    }

    /// Whether `subject_name` is accepted by the subject check.
    pub fn permits_subject(&self, subject_name: Option<&str>) -> bool {
        subject_name.is_some_and(|name| self.allowed_subjects.contains(name))
    }
}

/// The endpoint matching rule shared by the chained gate and the legacy gate.
///
/// Checks run in a fixed order and the first failure is reported.
pub(crate) fn match_endpoint(
    entry: Option<&AppWhitelistEntry>,
    controller: &str,
    operation: &str,
) -> std::result::Result<(), DenialReason> {
    if controller.is_empty() || operation.is_empty() {
        return Err(DenialReason::EmptyEndpoint);
    }
    let entry = entry.ok_or(DenialReason::UnregisteredApplication)?;
    let operations = entry
        .controller_endpoints
        .get(controller)
        .ok_or(DenialReason::ControllerNotWhitelisted)?;
    if operations.contains(operation) {
        Ok(())
    } else {
        Err(DenialReason::OperationNotWhitelisted)
    }
}

/// On-disk shape of the whitelist document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WhitelistDocument {
    #[serde(default)]
    applications: Vec<AppWhitelistEntry>,
}

/// All registered applications, keyed by app id.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct WhitelistConfiguration {
    entries: HashMap<String, Arc<AppWhitelistEntry>>,
}

impl WhitelistConfiguration {
    /// Builds a configuration, rejecting empty or duplicate app ids.
    pub fn new(entries: impl IntoIterator<Item = AppWhitelistEntry>) -> Result<Self> {
        let mut map = HashMap::new();
        for entry in entries {
            if entry.app_id.trim().is_empty() {
                return Err(AuthzError::WhitelistValidation(
                    "Application id cannot be empty".to_string(),
                ));
            }
            if let Some((controller, _)) = entry
                .controller_endpoints
                .iter()
                .find(|(controller, _)| controller.is_empty())
            {
                return Err(AuthzError::WhitelistValidation(format!(
                    "Application {} lists an empty controller name {:?}",
                    entry.app_id, controller
                )));
            }
            let app_id = entry.app_id.clone();
            if map.insert(app_id.clone(), Arc::new(entry)).is_some() {
                return Err(AuthzError::WhitelistValidation(format!(
                    "Duplicate application id: {}",
                    app_id
                )));
            }
        }
        Ok(Self { entries: map })
    }

    /// A configuration with no registered applications. Denies everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a whitelist document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let document: WhitelistDocument = serde_yaml::from_str(content)
            .map_err(|e| AuthzError::WhitelistParse(e.to_string()))?;
        Self::new(document.applications)
    }

    /// Loads a whitelist document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading whitelist from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let configuration = Self::from_yaml(&content)?;
        info!(
            "Loaded whitelist with {} application(s) from {}",
            configuration.len(),
            path.display()
        );
        Ok(configuration)
    }

    /// Serializes back to the document format, applications sorted by id.
    pub fn to_yaml(&self) -> Result<String> {
        let document = WhitelistDocument {
            applications: self.entries().into_iter().cloned().collect(),
        };
        serde_yaml::to_string(&document).map_err(|e| AuthzError::WhitelistParse(e.to_string()))
    }

    pub fn entry(&self, app_id: &str) -> Option<&AppWhitelistEntry> {
        self.entries.get(app_id).map(Arc::as_ref)
    }

    pub(crate) fn shared_entry(&self, app_id: &str) -> Option<Arc<AppWhitelistEntry>> {
        self.entries.get(app_id).cloned()
    }

    /// Entries sorted by app id.
    pub fn entries(&self) -> Vec<&AppWhitelistEntry> {
        let mut entries: Vec<_> = self.entries.values().map(Arc::as_ref).collect();
        entries.sort_by(|a, b| a.app_id.cmp(&b.app_id));
        entries
    }

    /// Sorted `(controller, operation)` pairs permitted for `app_id`.
    pub fn operations_for(&self, app_id: &str) -> Vec<(String, String)> {
        let Some(entry) = self.entry(app_id) else {
            return Vec::new();
        };
        let pairs: BTreeSet<_> = entry
            .controller_endpoints
            .iter()
            .flat_map(|(controller, operations)| {
                operations
                    .iter()
                    .map(move |operation| (controller.clone(), operation.clone()))
            })
            .collect();
        pairs.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies the endpoint matching rule to `app_id`.
    pub fn match_endpoint(
        &self,
        app_id: &str,
        controller: &str,
        operation: &str,
    ) -> std::result::Result<(), DenialReason> {
        match_endpoint(self.entry(app_id), controller, operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::endpoints::books;
    use std::io::Write;

    const SAMPLE: &str = r#"
applications:
  - app_id: mobile-1
    controller_endpoints:
      Books: [GetBooksAsync, GetBookAsync]
    allowed_subjects: [User]
  - app_id: backoffice
    controller_endpoints:
      Books: [GetBooksAsync, AddBookAsync]
      Publishers: [CreatePublisherAsync]
"#;

    #[test]
    fn test_parse_sample() {
        let config = WhitelistConfiguration::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.len(), 2);

        let mobile = config.entry("mobile-1").unwrap();
        assert!(mobile.controller_endpoints["Books"].contains("GetBookAsync"));
        assert!(mobile.allowed_subjects.contains("User"));

        let backoffice = config.entry("backoffice").unwrap();
        assert!(backoffice.allowed_subjects.is_empty());
    }

    #[test]
    fn test_match_endpoint_exact() {
        let config = WhitelistConfiguration::from_yaml(SAMPLE).unwrap();

        assert_eq!(config.match_endpoint("mobile-1", "Books", "GetBooksAsync"), Ok(()));
        assert_eq!(
            config.match_endpoint("mobile-1", "Books", "AddBookAsync"),
            Err(DenialReason::OperationNotWhitelisted)
        );
        assert_eq!(
            config.match_endpoint("mobile-1", "books", "GetBooksAsync"),
            Err(DenialReason::ControllerNotWhitelisted)
        );
        assert_eq!(
            config.match_endpoint("mobile-1", "Books", "getbooksasync"),
            Err(DenialReason::OperationNotWhitelisted)
        );
        assert_eq!(
            config.match_endpoint("mobile-2", "Books", "GetBooksAsync"),
            Err(DenialReason::UnregisteredApplication)
        );
    }

    #[test]
    fn test_empty_names_checked_before_registration() {
        let config = WhitelistConfiguration::empty();
        assert_eq!(
            config.match_endpoint("anything", "", "GetBooksAsync"),
            Err(DenialReason::EmptyEndpoint)
        );
        assert_eq!(
            config.match_endpoint("anything", "Books", ""),
            Err(DenialReason::EmptyEndpoint)
        );
    }

    #[test]
    fn test_duplicate_app_rejected() {
        let result = WhitelistConfiguration::new([
            AppWhitelistEntry::new("mobile-1"),
            AppWhitelistEntry::new("mobile-1"),
        ]);
        assert!(matches!(result, Err(AuthzError::WhitelistValidation(_))));
    }

    #[test]
    fn test_empty_app_id_rejected() {
        let result = WhitelistConfiguration::new([AppWhitelistEntry::new("  ")]);
        assert!(matches!(result, Err(AuthzError::WhitelistValidation(_))));
    }

    #[test]
    fn test_empty_controller_rejected() {
        let entry = AppWhitelistEntry::new("mobile-1").with_operations("", ["GetBooksAsync"]);
        let result = WhitelistConfiguration::new([entry]);
        assert!(matches!(result, Err(AuthzError::WhitelistValidation(_))));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = WhitelistConfiguration::from_yaml("applications: [ { app_id: 3 ");
        assert!(matches!(result, Err(AuthzError::WhitelistParse(_))));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let config = WhitelistConfiguration::from_yaml("applications:\n  - app_id: bare\n").unwrap();
        let entry = config.entry("bare").unwrap();
        assert!(entry.controller_endpoints.is_empty());
        assert_eq!(
            config.match_endpoint("bare", "Books", "GetBooksAsync"),
            Err(DenialReason::ControllerNotWhitelisted)
        );
    }

    #[test]
    fn test_builder_merges_operations() {
        let entry = AppWhitelistEntry::new("mobile-1")
            .with_endpoint(books::GET_BOOKS)
            .with_endpoint(books::GET_BOOK);
        assert_eq!(entry.controller_endpoints["Books"].len(), 2);
    }

    #[test]
    fn test_operations_for_sorted() {
        let config = WhitelistConfiguration::from_yaml(SAMPLE).unwrap();
        let ops = config.operations_for("backoffice");
        assert_eq!(
            ops,
            vec![
                ("Books".to_string(), "AddBookAsync".to_string()),
                ("Books".to_string(), "GetBooksAsync".to_string()),
                ("Publishers".to_string(), "CreatePublisherAsync".to_string()),
            ]
        );
        assert!(config.operations_for("unknown").is_empty());
    }

    #[test]
    fn test_yaml_round_trip_preserves_matching() {
        let config = WhitelistConfiguration::from_yaml(SAMPLE).unwrap();
        let reparsed = WhitelistConfiguration::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(reparsed.entry("mobile-1"), config.entry("mobile-1"));
        assert_eq!(reparsed.entry("backoffice"), config.entry("backoffice"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = WhitelistConfiguration::from_file(file.path()).unwrap();
        assert_eq!(config.len(), 2);

        let missing = WhitelistConfiguration::from_file(Path::new("/nonexistent/whitelist.yaml"));
        assert!(matches!(missing, Err(AuthzError::Io(_))));
    }
}
