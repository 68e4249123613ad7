use authz::endpoints::publishers;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::{json_body, path_id, AccountKindHeader, AppId, Principal},
    models::{CreatePublisherRequest, PublisherResponse, UpdatePublisherRequest},
    AppState,
};

/// List publishers (operators only)
///
/// GET /api/v1/publishers
#[utoipa::path(
    get,
    path = "/api/v1/publishers",
    responses(
        (status = 200, description = "Publishers retrieved", body = [PublisherResponse]),
        (status = 401, description = "Unauthorized", body = crate::error::ProblemDetails)
    ),
    tag = "publishers"
)]
pub async fn list_publishers(
    State(state): State<AppState>,
    AppId(app_id): AppId,
    Principal(principal): Principal,
) -> ApiResult<impl IntoResponse> {
    state
        .decision(&app_id, principal)
        .check_whitelist(publishers::GET_PUBLISHERS)
        .allow_operator()
        .try_verify()?;

    let publishers = state.books.list_publishers().await?;
    Ok(Json(
        publishers
            .into_iter()
            .map(PublisherResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// Get a publisher
///
/// GET /api/v1/publishers/:id
#[utoipa::path(
    get,
    path = "/api/v1/publishers/{id}",
    params(("id" = String, Path, description = "Publisher id")),
    responses(
        (status = 200, description = "Publisher found", body = PublisherResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ProblemDetails),
        (status = 404, description = "Publisher not found", body = crate::error::ApiErrorResponse)
    ),
    tag = "publishers"
)]
pub async fn get_publisher(
    State(state): State<AppState>,
    AppId(app_id): AppId,
    Principal(principal): Principal,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let publisher_id = path_id(&id);
    state
        .decision(&app_id, principal)
        .check_whitelist(publishers::GET_PUBLISHER)
        .allow_owning_publisher(publisher_id)
        .allow_operator()
        .try_verify()?;

    let publisher = state
        .books
        .get_publisher(publisher_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Publisher {} not found", id)))?;

    Ok(Json(PublisherResponse::from(publisher)))
}

/// Create a publisher record
///
/// POST /api/v1/publishers
///
/// Called by the identity service while onboarding a publisher account, so
/// there is no token yet: the caller's account kind comes from the
/// `X-Account-Type-Id` header.
#[utoipa::path(
    post,
    path = "/api/v1/publishers",
    request_body = CreatePublisherRequest,
    params(("X-Account-Type-Id" = Option<String>, Header, description = "Caller's account-kind id")),
    responses(
        (status = 201, description = "Publisher created", body = PublisherResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ProblemDetails)
    ),
    tag = "publishers"
)]
pub async fn create_publisher(
    State(state): State<AppState>,
    AppId(app_id): AppId,
    AccountKindHeader(account_kind_id): AccountKindHeader,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    state
        .authz
        .decision_for_account_kind(app_id, account_kind_id)
        .check_whitelist(publishers::CREATE_PUBLISHER)
        .allow_operator()
        .try_verify()?;
    let request: CreatePublisherRequest = json_body(&body)?;

    let id = request.id.unwrap_or_else(Uuid::new_v4);
    let publisher = state.books.insert_publisher_with_id(id, &request.name).await?;
    info!(publisher_id = %publisher.id, "publisher created");

    Ok((StatusCode::CREATED, Json(PublisherResponse::from(publisher))))
}

/// Rename a publisher
///
/// POST /api/v1/publishers/:id
#[utoipa::path(
    post,
    path = "/api/v1/publishers/{id}",
    params(("id" = String, Path, description = "Publisher id")),
    request_body = UpdatePublisherRequest,
    responses(
        (status = 200, description = "Publisher updated", body = PublisherResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ProblemDetails),
        (status = 404, description = "Publisher not found", body = crate::error::ApiErrorResponse)
    ),
    tag = "publishers"
)]
pub async fn update_publisher(
    State(state): State<AppState>,
    AppId(app_id): AppId,
    Principal(principal): Principal,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let publisher_id = path_id(&id);
    state
        .decision(&app_id, principal)
        .check_whitelist(publishers::UPDATE_PUBLISHER)
        .allow_owning_publisher(publisher_id)
        .allow_operator()
        .try_verify()?;
    let request: UpdatePublisherRequest = json_body(&body)?;

    let publisher = state
        .books
        .update_publisher_name(publisher_id, &request.name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Publisher {} not found", id)))?;

    Ok(Json(PublisherResponse::from(publisher)))
}
