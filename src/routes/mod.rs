//! Route Module Index
//!
//! Each gateway module is a declarative descriptor: a base path, the middleware
//! every route of the module runs behind, and the routes themselves. The
//! descriptors are assembled into one router by `compose::compose`.

use axum::{
    handler::Handler,
    http::Method,
    routing::{self, MethodRouter},
};

use crate::{
    AppState,
    auth::JwtInterceptor,
    config::{AppConfig, Env},
    middleware::{self, MiddlewareFactory},
};

/// Dump files of whole datasets.
pub mod dumps;

/// Project metadata.
pub mod projects;

/// Single page documents.
pub mod pages;

/// Group-scoped export artifacts served from object storage.
pub mod exports;

/// Token introspection.
pub mod auth;

/// Module
///
/// A group of routes sharing a base path and a middleware set.
#[derive(Clone)]
pub struct Module {
    pub path: String,
    pub middleware: Vec<MiddlewareFactory>,
    pub routes: Vec<Route>,
}

impl Module {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            middleware: Vec::new(),
            routes: Vec::new(),
        }
    }

    pub fn middleware(mut self, factory: MiddlewareFactory) -> Self {
        self.middleware.push(factory);
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }
}

/// Route
///
/// One `(method, sub-path)` pair bound to a handler. `path` is relative to the
/// module base and uses `:name` for parameters; it may be empty.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub middleware: Vec<MiddlewareFactory>,
    pub handler: MethodRouter<AppState>,
}

impl Route {
    fn new(method: Method, path: impl Into<String>, handler: MethodRouter<AppState>) -> Self {
        Self {
            method,
            path: path.into(),
            middleware: Vec::new(),
            handler,
        }
    }

    pub fn get<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::GET, path, routing::get(handler))
    }

    pub fn post<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::POST, path, routing::post(handler))
    }

    pub fn put<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::PUT, path, routing::put(handler))
    }

    pub fn patch<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::PATCH, path, routing::patch(handler))
    }

    pub fn delete<H, T>(path: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        Self::new(Method::DELETE, path, routing::delete(handler))
    }

    /// Route-level middleware, run after the module's own.
    pub fn middleware(mut self, factory: MiddlewareFactory) -> Self {
        self.middleware.push(factory);
        self
    }
}

/// The gateway's modules in registration order.
pub fn modules(config: &AppConfig) -> Vec<Module> {
    vec![
        dumps::module(config),
        projects::module(config),
        pages::module(config),
        exports::module(config),
        auth::module(config),
    ]
}

/// JWT authentication for a module. The header bypass is only honoured locally.
pub(crate) fn jwt(config: &AppConfig) -> MiddlewareFactory {
    let secret = config.jwt_secret.clone();
    let bypass = config.env == Env::Local;
    middleware::factory(move || JwtInterceptor::new(&secret).with_header_bypass(bypass))
}
