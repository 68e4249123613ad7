use crate::{Database, DatabaseError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const CREATE_PUBLISHERS: &str = r#"
    CREATE TABLE IF NOT EXISTS publishers (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const CREATE_BOOKS: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id TEXT PRIMARY KEY,
        publisher_id TEXT NOT NULL REFERENCES publishers(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const CREATE_BOOKS_PUBLISHER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_books_publisher_id ON books (publisher_id)";

/// Database initialization configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Whether to create tables on initialization
    pub create_tables: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        Self {
            database_path: project_root.join("data").join("bookshelf.db"),
            create_tables: true,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration with default paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new database configuration with a specific database path
    pub fn new_with_path(database_path: PathBuf) -> Self {
        Self {
            database_path,
            create_tables: true,
        }
    }

    /// Set whether to create tables on initialization
    pub fn with_create_tables(mut self, create: bool) -> Self {
        self.create_tables = create;
        self
    }
}

/// Initialize the database with the given configuration
pub async fn initialize_database(config: DatabaseConfig) -> Result<Arc<Database>> {
    info!("Initializing database with configuration");

    // Ensure the data directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Create the database file if it doesn't exist
    if !config.database_path.exists() {
        std::fs::File::create(&config.database_path)?;
        info!("Created new database file at: {:?}", config.database_path);
    }

    let db_path_str = config
        .database_path
        .to_str()
        .ok_or_else(|| DatabaseError::Other("Invalid database path".into()))?;

    let db = Arc::new(Database::new(db_path_str).await?);

    if config.create_tables {
        create_tables(&db).await?;
    }

    Ok(db)
}

/// Create the publisher and book tables
pub async fn create_tables(db: &Database) -> Result<()> {
    for statement in [CREATE_PUBLISHERS, CREATE_BOOKS, CREATE_BOOKS_PUBLISHER_INDEX] {
        db.execute_raw(statement)
            .await
            .map_err(|e| DatabaseError::TableCreation(e.to_string()))?;
    }
    info!("Publisher and book tables ready");
    Ok(())
}
