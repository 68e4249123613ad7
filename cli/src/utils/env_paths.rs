use std::env;
use std::path::{Path, PathBuf};

const WHITELIST_FILE_NAME: &str = "whitelist.yaml";

/// Environment-based path configuration
#[derive(Debug, Clone)]
pub struct EnvPaths {
    pub configuration_path: PathBuf,
}

impl EnvPaths {
    /// Load paths relative to `base`, honouring a `.env` file there
    pub fn load_with_base(base: &Path) -> Self {
        let env_file = base.join(".env");
        if env_file.exists() {
            dotenv::from_path(&env_file).ok();
        }

        Self {
            configuration_path: Self::get_path_from_env("CONFIGURATION_PATH", "./config", base),
        }
    }

    /// Get a path from environment variable or use default
    fn get_path_from_env(var_name: &str, default: &str, base_dir: &Path) -> PathBuf {
        let path = PathBuf::from(env::var(var_name).unwrap_or_else(|_| default.to_string()));

        // If the path is relative, make it relative to the base directory
        if path.is_relative() {
            base_dir.join(path)
        } else {
            path
        }
    }

    /// Get the default whitelist file path
    pub fn whitelist_path(&self) -> PathBuf {
        self.configuration_path.join(WHITELIST_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests below mutate process environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_whitelist_path() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::remove_var("CONFIGURATION_PATH");

        let temp_dir = TempDir::new().unwrap();
        let paths = EnvPaths::load_with_base(temp_dir.path());

        assert_eq!(paths.configuration_path, temp_dir.path().join("./config"));
        assert!(paths.whitelist_path().ends_with("config/whitelist.yaml"));
    }

    #[test]
    fn test_absolute_configuration_path() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let custom = temp_dir.path().join("custom_config");
        env::set_var("CONFIGURATION_PATH", custom.to_str().unwrap());

        let paths = EnvPaths::load_with_base(Path::new("/nonexistent"));
        assert_eq!(paths.whitelist_path(), custom.join("whitelist.yaml"));

        env::remove_var("CONFIGURATION_PATH");
    }
}
