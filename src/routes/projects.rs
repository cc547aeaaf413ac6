use super::{Module, Route, jwt};
use crate::{config::AppConfig, handlers};

/// Projects Module
///
/// CRUD over project metadata plus download/bundle actions. Every route sits
/// behind JWT authentication.
pub fn module(config: &AppConfig) -> Module {
    Module::new("/projects")
        .middleware(jwt(config))
        .route(Route::post("", handlers::not_implemented))
        .route(Route::get("", handlers::not_implemented))
        .route(Route::get("/:id", handlers::not_implemented))
        .route(Route::delete("/:id", handlers::not_implemented))
        .route(Route::put("/:id", handlers::not_implemented))
        .route(Route::get("/:id/download", handlers::not_implemented))
        .route(Route::post("/:id/bundle", handlers::not_implemented))
}
