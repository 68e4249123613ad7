use async_trait::async_trait;
use authz::{AuthzError, OwnershipLookup};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Database, DatabaseError, Result};

/// A publisher account's catalogue record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A book and its owner of record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub publisher_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct PublisherRow {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct BookRow {
    id: String,
    publisher_id: String,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_uuid(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| DatabaseError::CorruptRow(format!("{} {:?}: {}", column, value, e)))
}

impl TryFrom<PublisherRow> for Publisher {
    type Error = DatabaseError;

    fn try_from(row: PublisherRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid("publishers.id", &row.id)?,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<BookRow> for Book {
    type Error = DatabaseError;

    fn try_from(row: BookRow) -> Result<Self> {
        Ok(Self {
            id: parse_uuid("books.id", &row.id)?,
            publisher_id: parse_uuid("books.publisher_id", &row.publisher_id)?,
            title: row.title,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DatabaseError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Publisher and book storage operations
#[derive(Debug, Clone)]
pub struct BookStore {
    db: Arc<Database>,
}

impl BookStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn insert_publisher(&self, name: &str) -> Result<Publisher> {
        self.insert_publisher_with_id(Uuid::new_v4(), name).await
    }

    /// Inserts a publisher under a caller-chosen id, matching its account's subject id.
    pub async fn insert_publisher_with_id(&self, id: Uuid, name: &str) -> Result<Publisher> {
        if id.is_nil() {
            return Err(DatabaseError::Validation(
                "Publisher id cannot be nil".to_string(),
            ));
        }
        require_text("Publisher name", name)?;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO publishers (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        info!("Created publisher {}", id);

        Ok(Publisher {
            id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_publisher(&self, id: Uuid) -> Result<Option<Publisher>> {
        let row: Option<PublisherRow> = sqlx::query_as(
            "SELECT id, name, created_at, updated_at FROM publishers WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        row.map(Publisher::try_from).transpose()
    }

    pub async fn list_publishers(&self) -> Result<Vec<Publisher>> {
        let rows: Vec<PublisherRow> = sqlx::query_as(
            "SELECT id, name, created_at, updated_at FROM publishers ORDER BY name, id",
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(Publisher::try_from).collect()
    }

    /// Renames a publisher; `None` when it does not exist.
    pub async fn update_publisher_name(&self, id: Uuid, name: &str) -> Result<Option<Publisher>> {
        require_text("Publisher name", name)?;

        let result = sqlx::query("UPDATE publishers SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_publisher(id).await
    }

    pub async fn insert_book(&self, publisher_id: Uuid, title: &str) -> Result<Book> {
        require_text("Book title", title)?;
        if self.get_publisher(publisher_id).await?.is_none() {
            return Err(DatabaseError::PublisherNotFound(publisher_id.to_string()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO books (id, publisher_id, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(publisher_id.to_string())
        .bind(title)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        info!("Created book {} for publisher {}", id, publisher_id);

        Ok(Book {
            id,
            publisher_id,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_book(&self, id: Uuid) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(
            "SELECT id, publisher_id, title, created_at, updated_at FROM books WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await?;

        row.map(Book::try_from).transpose()
    }

    pub async fn list_books(&self, limit: i64, offset: i64) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(
            "SELECT id, publisher_id, title, created_at, updated_at FROM books \
             ORDER BY created_at, id LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(Book::try_from).collect()
    }

    pub async fn count_books(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Retitles a book; `None` when it does not exist.
    pub async fn update_book_title(&self, id: Uuid, title: &str) -> Result<Option<Book>> {
        require_text("Book title", title)?;

        let result = sqlx::query("UPDATE books SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_book(id).await
    }

    /// Returns whether a row was removed.
    pub async fn delete_book(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id.to_string())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Owner of record for a book.
    pub async fn publisher_of(&self, book_id: Uuid) -> Result<Option<Uuid>> {
        let owner: Option<(String,)> = sqlx::query_as("SELECT publisher_id FROM books WHERE id = ?")
            .bind(book_id.to_string())
            .fetch_optional(self.db.pool())
            .await?;

        owner
            .map(|(publisher_id,)| parse_uuid("books.publisher_id", &publisher_id))
            .transpose()
    }
}

#[async_trait]
impl OwnershipLookup for BookStore {
    async fn publisher_owns_book(
        &self,
        publisher_id: Uuid,
        book_id: Uuid,
    ) -> authz::Result<bool> {
        let owner = self
            .publisher_of(book_id)
            .await
            .map_err(|e| AuthzError::Lookup(e.to_string()))?;
        debug!("Book {} owner of record: {:?}", book_id, owner);
        Ok(owner == Some(publisher_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::{initialize_database, DatabaseConfig};
    use tempfile::TempDir;

    async fn setup_store() -> (TempDir, BookStore) {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig::new_with_path(temp_dir.path().join("books.db"));
        let db = initialize_database(config).await.unwrap();
        (temp_dir, BookStore::new(db))
    }

    #[tokio::test]
    async fn test_publisher_crud() {
        let (_dir, store) = setup_store().await;

        let publisher = store.insert_publisher("Northwind Press").await.unwrap();
        let fetched = store.get_publisher(publisher.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Northwind Press");

        let renamed = store
            .update_publisher_name(publisher.id, "Northwind Books")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "Northwind Books");

        assert!(store
            .update_publisher_name(Uuid::new_v4(), "Nobody")
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.list_publishers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_publisher_with_id() {
        let (_dir, store) = setup_store().await;
        let id = Uuid::new_v4();

        let publisher = store.insert_publisher_with_id(id, "Fixed Id").await.unwrap();
        assert_eq!(publisher.id, id);
        assert!(store.insert_publisher_with_id(id, "Again").await.is_err());

        let err = store
            .insert_publisher_with_id(Uuid::nil(), "Nobody")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert!(store.get_publisher(Uuid::nil()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_book_crud() {
        let (_dir, store) = setup_store().await;
        let publisher = store.insert_publisher("Northwind Press").await.unwrap();

        let book = store.insert_book(publisher.id, "First Edition").await.unwrap();
        assert_eq!(book.publisher_id, publisher.id);

        let fetched = store.get_book(book.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "First Edition");

        let updated = store
            .update_book_title(book.id, "Second Edition")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Second Edition");

        assert_eq!(store.count_books().await.unwrap(), 1);
        assert!(store.delete_book(book.id).await.unwrap());
        assert!(!store.delete_book(book.id).await.unwrap());
        assert!(store.get_book(book.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_books_paginates() {
        let (_dir, store) = setup_store().await;
        let publisher = store.insert_publisher("Northwind Press").await.unwrap();
        for i in 0..5 {
            store
                .insert_book(publisher.id, &format!("Volume {}", i))
                .await
                .unwrap();
        }

        assert_eq!(store.list_books(2, 0).await.unwrap().len(), 2);
        assert_eq!(store.list_books(2, 4).await.unwrap().len(), 1);
        assert_eq!(store.list_books(20, 0).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_insert_book_requires_publisher() {
        let (_dir, store) = setup_store().await;
        let result = store.insert_book(Uuid::new_v4(), "Orphan").await;
        assert!(matches!(result, Err(DatabaseError::PublisherNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let (_dir, store) = setup_store().await;
        assert!(matches!(
            store.insert_publisher("  ").await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_ownership_lookup() {
        let (_dir, store) = setup_store().await;
        let owner = store.insert_publisher("Owner").await.unwrap();
        let other = store.insert_publisher("Other").await.unwrap();
        let book = store.insert_book(owner.id, "Owned").await.unwrap();

        assert!(store.publisher_owns_book(owner.id, book.id).await.unwrap());
        assert!(!store.publisher_owns_book(other.id, book.id).await.unwrap());
        assert!(!store
            .publisher_owns_book(owner.id, Uuid::new_v4())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_ownership_lookup_reports_storage_failure() {
        let (_dir, store) = setup_store().await;
        store.db.execute_raw("DROP TABLE books").await.unwrap();

        let result = store.publisher_owns_book(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthzError::Lookup(_))));
    }
}
