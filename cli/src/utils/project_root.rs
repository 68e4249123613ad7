use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Find the Bookshelf project root by walking up from the current directory
pub fn find_project_root() -> Result<PathBuf> {
    let current_dir = env::current_dir()?;
    find_project_root_from(&current_dir)
}

pub fn find_project_root_from(start: &Path) -> Result<PathBuf> {
    start
        .ancestors()
        .find(|path| is_project_root(path))
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            anyhow!(
                "Not in a Bookshelf project directory and no --whitelist given.\n\
                 The project root should contain 'Cargo.toml' and a 'config/' directory."
            )
        })
}

/// Check if a directory is the Bookshelf project root
fn is_project_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("config").is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_project_root_valid() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("config")).unwrap();
        fs::write(root.join("Cargo.toml"), "[workspace]").unwrap();

        assert!(is_project_root(root));
    }

    #[test]
    fn test_is_project_root_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("Cargo.toml"), "[workspace]").unwrap();

        assert!(!is_project_root(root));
    }

    #[test]
    fn test_find_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("config")).unwrap();
        fs::write(root.join("Cargo.toml"), "[workspace]").unwrap();
        let subdir = root.join("api").join("src");
        fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_project_root_from(&subdir).unwrap(), root);
    }
}
