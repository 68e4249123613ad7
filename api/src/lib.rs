use authz::{AccessDecision, Claims, DecisionFactory, LegacyWhitelistGate};
use axum::{
    middleware,
    routing::get,
    Router,
};
use database::{BookStore, Database};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;


// Re-export server functions for convenience
pub use server::{start_server, ApiConfig};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub books: BookStore,
    pub authz: DecisionFactory,
    pub legacy: LegacyWhitelistGate,
}

impl AppState {
    pub fn new(db: Arc<Database>, authz: DecisionFactory) -> Self {
        Self {
            books: BookStore::new(db.clone()),
            legacy: authz.legacy_gate(),
            db,
            authz,
        }
    }

    /// Fresh decision for one request: anonymous when no claims were attached.
    pub fn decision(&self, app_id: &str, principal: Option<Claims>) -> AccessDecision {
        match principal {
            Some(claims) => self.authz.decision_for_principal(app_id, claims),
            None => self.authz.decision_for(app_id),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::books::list_books,
        handlers::books::get_book,
        handlers::books::add_book,
        handlers::books::update_book,
        handlers::books::delete_book,
        handlers::publishers::list_publishers,
        handlers::publishers::get_publisher,
        handlers::publishers::create_publisher,
        handlers::publishers::update_publisher,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::BookResponse,
            models::BookListResponse,
            models::CreateBookRequest,
            models::UpdateBookRequest,
            models::PublisherResponse,
            models::CreatePublisherRequest,
            models::UpdatePublisherRequest,
            models::HealthResponse,
            models::DatabaseHealth,
            models::DeleteResponse,
            error::ApiErrorResponse,
            error::ErrorDetail,
            error::ProblemDetails,
        )
    ),
    tags(
        (name = "books", description = "Book catalogue operations"),
        (name = "publishers", description = "Publisher account operations"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Bookshelf API",
        version = "1.0.0",
        description = "Book distribution API with per-application access control",
    ),
)]
pub struct ApiDoc;

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        .route(
            "/books",
            get(handlers::books::list_books).post(handlers::books::add_book),
        )
        .route(
            "/books/:id",
            get(handlers::books::get_book)
                .post(handlers::books::update_book)
                .delete(handlers::books::delete_book),
        )
        .route(
            "/publishers",
            get(handlers::publishers::list_publishers)
                .post(handlers::publishers::create_publisher),
        )
        .route(
            "/publishers/:id",
            get(handlers::publishers::get_publisher).post(handlers::publishers::update_publisher),
        )
        .route("/health", get(handlers::health::health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::request_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::response_middleware,
        ));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(SwaggerUi::new("/api/v1/swagger").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
