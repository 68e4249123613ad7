use chrono::{DateTime, Utc};
use database::{Book, Publisher};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Response for a single book
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: Uuid,
    pub publisher_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            publisher_id: book.publisher_id,
            title: book.title,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Response for listing books
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookListResponse {
    pub books: Vec<BookResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Request to add a book
///
/// Publishers always add to their own catalogue; operators must name the publisher.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateBookRequest {
    pub title: String,
    #[serde(default)]
    pub publisher_id: Option<Uuid>,
}

/// Request to retitle a book
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateBookRequest {
    pub title: String,
}

/// Response for a single publisher
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublisherResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Publisher> for PublisherResponse {
    fn from(publisher: Publisher) -> Self {
        Self {
            id: publisher.id,
            name: publisher.name,
            created_at: publisher.created_at,
            updated_at: publisher.updated_at,
        }
    }
}

/// Request to create a publisher record
///
/// `id` should be the subject id of the publisher's account so ownership checks line up.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePublisherRequest {
    pub name: String,
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// Request to rename a publisher
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePublisherRequest {
    pub name: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub message: String,
}

/// Delete response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: Uuid,
    pub message: String,
}

/// Pagination parameters
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PaginationParams {
    pub const DEFAULT_PAGE_SIZE: i64 = 20;
    pub const MAX_PAGE_SIZE: i64 = 100;

    /// Page number and size, clamped to sane bounds.
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .clamp(1, Self::MAX_PAGE_SIZE);
        (page, page_size)
    }

    /// Rows to skip for the resolved page; saturates so huge pages read as empty.
    pub fn offset(page: i64, page_size: i64) -> i64 {
        (page - 1).saturating_mul(page_size)
    }
}
