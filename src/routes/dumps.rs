use super::{Module, Route, jwt};
use crate::{
    config::{AppConfig, UNLIMITED_GROUP},
    handlers, middleware,
    rbac::GroupGuard,
};

/// Dumps Module
///
/// Dataset dump listings and downloads. Downloading a full dump is reserved for
/// the `unlimited` group, enforced by a route-level guard on top of the module's
/// JWT check.
pub fn module(config: &AppConfig) -> Module {
    Module::new("/dumps")
        .middleware(jwt(config))
        // GET /dumps
        .route(Route::get("", handlers::not_implemented))
        // GET /dumps/{namespace}/{project}
        .route(Route::get("/:namespace/:project", handlers::not_implemented))
        // GET /dumps/{namespace}/{project}/download
        .route(
            Route::get("/:namespace/:project/download", handlers::not_implemented)
                .middleware(middleware::factory(|| GroupGuard::new([UNLIMITED_GROUP]))),
        )
}
