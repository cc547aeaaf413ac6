use super::{Module, Route, jwt};
use crate::{config::AppConfig, handlers};

/// Auth Module
///
/// Lets a client check which identity and groups its token resolves to.
pub fn module(config: &AppConfig) -> Module {
    Module::new("/auth")
        .middleware(jwt(config))
        // GET /auth/whoami
        .route(Route::get("/whoami", handlers::whoami))
}
