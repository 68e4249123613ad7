pub mod logging;

use api::ApiConfig;
use authz::{StaticAccountKinds, WhitelistConfiguration};
use database::{initialize_database, DatabaseConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_API_PORT: u16 = 3030;
const WHITELIST_FILE_NAME: &str = "whitelist.yaml";
const DATABASE_FILE_NAME: &str = "bookshelf.db";

/// Environment paths configuration
#[derive(Debug, Clone)]
pub struct EnvPaths {
    pub data_path: PathBuf,
    pub configuration_path: PathBuf,
    pub whitelist_file: PathBuf,
    pub api_port: u16,
}

impl EnvPaths {
    /// Load paths from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let project_root = Self::find_project_root()?;
        let var = |name: &str| std::env::var(name).ok();

        let api_port = match var("API_PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| format!("Invalid API_PORT '{}': {}", port, e))?,
            None => DEFAULT_API_PORT,
        };

        Ok(Self::resolve(
            &project_root,
            var("DATA_PATH").as_deref(),
            var("CONFIGURATION_PATH").as_deref(),
            var("WHITELIST_FILE").as_deref(),
            api_port,
        ))
    }

    /// Resolves raw settings against the project root, applying defaults.
    pub fn resolve(
        project_root: &Path,
        data_path: Option<&str>,
        configuration_path: Option<&str>,
        whitelist_file: Option<&str>,
        api_port: u16,
    ) -> Self {
        let data_path = resolve_path(project_root, data_path.unwrap_or("./data"));
        let configuration_path =
            resolve_path(project_root, configuration_path.unwrap_or("./config"));
        let whitelist_file = match whitelist_file {
            Some(file) => resolve_path(project_root, file),
            None => configuration_path.join(WHITELIST_FILE_NAME),
        };

        Self {
            data_path,
            configuration_path,
            whitelist_file,
            api_port,
        }
    }

    pub fn database_file(&self) -> PathBuf {
        self.data_path.join(DATABASE_FILE_NAME)
    }

    /// Find the project root directory
    fn find_project_root() -> Result<PathBuf, BoxError> {
        let current_dir = std::env::current_dir()?;

        if current_dir.ends_with("app") {
            if let Some(parent) = current_dir.parent() {
                return Ok(parent.to_path_buf());
            }
        }
        Ok(current_dir)
    }
}

/// Convert relative paths to absolute paths based on project root
fn resolve_path(project_root: &Path, path: &str) -> PathBuf {
    if let Some(relative) = path.strip_prefix("./") {
        project_root.join(relative)
    } else {
        project_root.join(path)
    }
}

/// Loads the application whitelist.
///
/// A missing file yields an empty whitelist, which denies every request.
pub fn load_whitelist(path: &Path) -> Result<WhitelistConfiguration, BoxError> {
    if !path.exists() {
        tracing::warn!(
            "Whitelist file {:?} not found; every request will be denied",
            path
        );
        return Ok(WhitelistConfiguration::empty());
    }
    Ok(WhitelistConfiguration::from_file(path)?)
}

/// Initialize storage and serve the API until the process is stopped.
pub async fn run(env_paths: EnvPaths) -> Result<(), BoxError> {
    tracing::info!("=== Bookshelf server starting up ===");
    tracing::info!("  Data path: {:?}", env_paths.data_path);
    tracing::info!("  Configuration path: {:?}", env_paths.configuration_path);
    tracing::info!("  Whitelist file: {:?}", env_paths.whitelist_file);

    let whitelist = load_whitelist(&env_paths.whitelist_file)?;

    let db = initialize_database(DatabaseConfig::new_with_path(env_paths.database_file())).await?;
    tracing::info!("Database connection established");

    let config = ApiConfig::new()
        .with_port(env_paths.api_port)
        .with_whitelist(Arc::new(whitelist))
        .with_account_kinds(Arc::new(StaticAccountKinds::new()));

    tokio::select! {
        result = api::start_server(db, config) => result,
        _ = tokio::signal::ctrl_c() => {
            logging::log_shutdown();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_defaults() {
        let root = Path::new("/srv/bookshelf");
        let paths = EnvPaths::resolve(root, None, None, None, DEFAULT_API_PORT);

        assert_eq!(paths.data_path, root.join("data"));
        assert_eq!(paths.configuration_path, root.join("config"));
        assert_eq!(paths.whitelist_file, root.join("config/whitelist.yaml"));
        assert_eq!(paths.database_file(), root.join("data/bookshelf.db"));
        assert_eq!(paths.api_port, 3030);
    }

    #[test]
    fn test_resolve_overrides() {
        let root = Path::new("/srv/bookshelf");
        let paths = EnvPaths::resolve(
            root,
            Some("/var/lib/bookshelf"),
            Some("./etc"),
            Some("etc/apps.yaml"),
            8080,
        );

        assert_eq!(paths.data_path, PathBuf::from("/var/lib/bookshelf"));
        assert_eq!(paths.configuration_path, root.join("etc"));
        assert_eq!(paths.whitelist_file, root.join("etc/apps.yaml"));
    }

    #[test]
    fn test_load_missing_whitelist_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let whitelist = load_whitelist(&temp_dir.path().join("missing.yaml")).unwrap();
        assert!(whitelist.is_empty());
    }

    #[test]
    fn test_load_whitelist_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("whitelist.yaml");
        std::fs::write(
            &path,
            "applications:\n  - app_id: mobile-1\n    controller_endpoints:\n      Books: [GetBooksAsync]\n",
        )
        .unwrap();

        let whitelist = load_whitelist(&path).unwrap();
        assert_eq!(whitelist.len(), 1);
        assert!(whitelist.match_endpoint("mobile-1", "Books", "GetBooksAsync").is_ok());
    }

    #[test]
    fn test_load_invalid_whitelist_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("whitelist.yaml");
        std::fs::write(&path, "applications: [{ app_id: '' }]\n").unwrap();

        assert!(load_whitelist(&path).is_err());
    }
}
