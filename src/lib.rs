use axum::{Router, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// --- Module Structure ---

// Core gateway services and components.
pub mod auth;
pub mod compose;
pub mod config;
pub mod error;
pub mod exports;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rbac;
pub mod storage;

// Declarative module descriptors (dumps, projects, pages, exports, auth).
pub mod routes;

// --- Public Re-exports ---

pub use compose::{ComposeError, Composition, RegisteredRoute, compose};
pub use config::AppConfig;
pub use error::ApiError;
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for the handlers with real bodies, served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::export_detail, handlers::whoami, handlers::health),
    components(schemas(models::WhoAmI)),
    tags(
        (name = "export-gateway", description = "Module gateway for dataset exports")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single immutable container shared by every request: the object store
/// and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    /// Storage Layer: S3/MinIO in deployments, in-memory in tests.
    pub storage: StorageState,
    pub config: AppConfig,
}

/// create_router
///
/// Builds the gateway: health probe and API docs, then every module composed in
/// registration order behind the global middleware. Fails on a misconfigured
/// module table; callers must not start serving in that case.
pub fn create_router(state: AppState) -> Result<Router, ComposeError> {
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health));

    let modules = routes::modules(&state.config);
    let composition = compose(base_router, &modules)?;

    Ok(composition.router.with_state(state))
}
