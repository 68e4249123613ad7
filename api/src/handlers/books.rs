use authz::endpoints::books;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    extract::{json_body, path_id, AppId, Principal},
    models::{
        BookListResponse, BookResponse, CreateBookRequest, DeleteResponse, PaginationParams,
        UpdateBookRequest,
    },
    AppState,
};

/// List books
///
/// GET /api/v1/books
#[utoipa::path(
    get,
    path = "/api/v1/books",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based)"),
        ("page_size" = Option<i64>, Query, description = "Books per page")
    ),
    responses(
        (status = 200, description = "Books retrieved", body = BookListResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ProblemDetails)
    ),
    tag = "books"
)]
pub async fn list_books(
    State(state): State<AppState>,
    AppId(app_id): AppId,
    Principal(principal): Principal,
    Query(params): Query<PaginationParams>,
) -> ApiResult<impl IntoResponse> {
    state
        .decision(&app_id, principal)
        .check_whitelist(books::GET_BOOKS)
        .allow_user()
        .allow_publisher()
        .allow_operator()
        .try_verify()?;

    let (page, page_size) = params.resolve();
    let offset = PaginationParams::offset(page, page_size);
    let total = state.books.count_books().await?;
    let books = state.books.list_books(page_size, offset).await?;

    Ok(Json(BookListResponse {
        books: books.into_iter().map(BookResponse::from).collect(),
        total,
        page,
        page_size,
    }))
}

/// Get a single book
///
/// GET /api/v1/books/:id
#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book found", body = BookResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ProblemDetails),
        (status = 404, description = "Book not found", body = crate::error::ApiErrorResponse)
    ),
    tag = "books"
)]
pub async fn get_book(
    State(state): State<AppState>,
    AppId(app_id): AppId,
    Principal(principal): Principal,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state
        .decision(&app_id, principal)
        .check_whitelist(books::GET_BOOK)
        .allow_user()
        .allow_publisher()
        .allow_operator()
        .try_verify()?;

    let book_id = path_id(&id);
    let book = state
        .books
        .get_book(book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Book {} not found", id)))?;

    Ok(Json(BookResponse::from(book)))
}

/// Add a book
///
/// POST /api/v1/books
///
/// A publisher always becomes the owner of the new book; an operator must
/// name the owning publisher in the request.
#[utoipa::path(
    post,
    path = "/api/v1/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book added", body = BookResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ProblemDetails),
        (status = 404, description = "Publisher not found", body = crate::error::ApiErrorResponse)
    ),
    tag = "books"
)]
pub async fn add_book(
    State(state): State<AppState>,
    AppId(app_id): AppId,
    Principal(principal): Principal,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let (publisher_id, request) = {
        let decision = state
            .decision(&app_id, principal)
            .check_whitelist(books::ADD_BOOK)
            .allow_publisher()
            .allow_operator();
        decision.try_verify()?;

        let request: CreateBookRequest = json_body(&body)?;

        let publisher_id = if state.authz.oracle().is_publisher(decision.account_kind_id()) {
            decision.subject_id()
        } else {
            request
                .publisher_id
                .ok_or_else(|| ApiError::ValidationError("publisher_id is required".to_string()))?
        };
        (publisher_id, request)
    };

    let book = state.books.insert_book(publisher_id, &request.title).await?;
    info!(book_id = %book.id, %publisher_id, "book added");

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// Retitle a book
///
/// POST /api/v1/books/:id
#[utoipa::path(
    post,
    path = "/api/v1/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    request_body = UpdateBookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ProblemDetails),
        (status = 404, description = "Book not found", body = crate::error::ApiErrorResponse)
    ),
    tag = "books"
)]
pub async fn update_book(
    State(state): State<AppState>,
    AppId(app_id): AppId,
    Principal(principal): Principal,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let book_id = path_id(&id);
    state
        .decision(&app_id, principal)
        .check_whitelist(books::UPDATE_BOOK)
        .allow_publisher_only_if_owns(&state.books, book_id)
        .await
        .allow_operator()
        .try_verify()?;
    let request: UpdateBookRequest = json_body(&body)?;

    let book = state
        .books
        .update_book_title(book_id, &request.title)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Book {} not found", id)))?;

    Ok(Json(BookResponse::from(book)))
}

/// Delete a book
///
/// DELETE /api/v1/books/:id
#[utoipa::path(
    delete,
    path = "/api/v1/books/{id}",
    params(("id" = String, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted", body = DeleteResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ProblemDetails),
        (status = 404, description = "Book not found", body = crate::error::ApiErrorResponse)
    ),
    tag = "books"
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AppId(app_id): AppId,
    Principal(principal): Principal,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let book_id = path_id(&id);
    state
        .decision(&app_id, principal)
        .check_whitelist(books::DELETE_BOOK)
        .allow_publisher_only_if_owns(&state.books, book_id)
        .await
        .allow_operator()
        .try_verify()?;

    if !state.books.delete_book(book_id).await? {
        return Err(ApiError::NotFound(format!("Book {} not found", id)));
    }
    info!(%book_id, "book deleted");

    Ok(Json(DeleteResponse {
        success: true,
        id: book_id,
        message: "Book deleted".to_string(),
    }))
}
