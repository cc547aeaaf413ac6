use super::{Module, Route, jwt};
use crate::{config::AppConfig, handlers};

/// Pages Module
pub fn module(config: &AppConfig) -> Module {
    Module::new("/pages")
        .middleware(jwt(config))
        // GET /pages/{namespace}/{project}/{name}
        .route(Route::get("/:namespace/:project/:name", handlers::not_implemented))
        .route(Route::get(
            "/:namespace/:project/:name/download",
            handlers::not_implemented,
        ))
}
