use super::{Module, Route, jwt};
use crate::{
    config::{AppConfig, UNLIMITED_GROUP},
    handlers, middleware,
    rbac::GroupGuard,
};

/// Exports Module
///
/// Serves export artifacts from object storage. Admission requires a valid
/// token and membership in either `unlimited` or the configured restricted
/// group; which artifact variant is served is decided by the handler.
pub fn module(config: &AppConfig) -> Module {
    let groups = [UNLIMITED_GROUP.to_string(), config.exports_group.clone()];

    Module::new("/exports")
        .middleware(jwt(config))
        .middleware(middleware::factory(move || GroupGuard::new(groups.clone())))
        // GET /exports/{namespace}/{dataset}
        .route(Route::get("/:namespace/:dataset", handlers::export_detail))
}
