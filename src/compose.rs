//! Module composition.
//!
//! Turns the ordered module descriptors into a single router. Everything is
//! validated up front: a bad pattern or a colliding route aborts composition
//! before any route is registered.

use std::collections::{HashMap, HashSet};

use axum::{Router, http::Method};

use crate::{
    AppState,
    middleware::{intercept_with, with_global_middleware},
    routes::Module,
};

/// Startup-time misconfiguration of the module table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("invalid path pattern {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("base path {0:?} is claimed by more than one module")]
    DuplicateModule(String),
    #[error("route {method} {path} is registered more than once")]
    DuplicateRoute { method: Method, path: String },
    #[error("parameter :{found} in {path} conflicts with :{existing} registered at the same position")]
    ConflictingParameter {
        path: String,
        existing: String,
        found: String,
    },
}

/// One entry of the composed route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRoute {
    pub method: Method,
    /// Full path as declared, `:name` parameters included.
    pub path: String,
    /// Module middleware + route middleware + the handler itself.
    pub chain_len: usize,
}

/// Result of a successful composition.
pub struct Composition {
    pub router: Router<AppState>,
    pub routes: Vec<RegisteredRoute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
}

/// compose
///
/// Registers every module's routes on `router`, in module order then route
/// order. Each route runs behind `[module middleware...][route middleware...]`,
/// outermost first. Module factories are invoked once per module and their
/// interceptor is shared by all of the module's routes. Global middleware
/// (request logging, CORS) wraps the whole router.
pub fn compose(router: Router<AppState>, modules: &[Module]) -> Result<Composition, ComposeError> {
    validate(modules)?;

    let mut router = router;
    let mut table = Vec::new();

    for module in modules {
        let module_interceptors: Vec<_> = module.middleware.iter().map(|make| make()).collect();

        for route in &module.routes {
            let route_interceptors: Vec<_> = route.middleware.iter().map(|make| make()).collect();
            let path = full_path(&module.path, &route.path);

            // The last layer applied runs first, so apply innermost to outermost.
            let mut method_router = route.handler.clone();
            for interceptor in route_interceptors.iter().rev().chain(module_interceptors.iter().rev()) {
                method_router = intercept_with(method_router, interceptor.clone());
            }

            router = router.route(&router_path(&path), method_router);

            let entry = RegisteredRoute {
                method: route.method.clone(),
                path,
                chain_len: module_interceptors.len() + route_interceptors.len() + 1,
            };
            tracing::debug!(
                method = %entry.method,
                path = %entry.path,
                chain_len = entry.chain_len,
                "registered route"
            );
            table.push(entry);
        }
    }

    Ok(Composition {
        router: with_global_middleware(router),
        routes: table,
    })
}

fn validate(modules: &[Module]) -> Result<(), ComposeError> {
    let mut bases = HashSet::new();
    let mut shapes: HashSet<(Method, String)> = HashSet::new();
    // Parameter name bound at a given normalized prefix.
    let mut params: HashMap<String, String> = HashMap::new();

    for module in modules {
        validate_base(&module.path)?;
        if !bases.insert(module.path.as_str()) {
            return Err(ComposeError::DuplicateModule(module.path.clone()));
        }

        for route in &module.routes {
            if !route.path.is_empty() && !route.path.starts_with('/') {
                return Err(invalid(&route.path, "sub-path must be empty or start with '/'"));
            }

            let path = full_path(&module.path, &route.path);
            let segments = parse(&path)?;

            if !shapes.insert((route.method.clone(), shape(&segments))) {
                return Err(ComposeError::DuplicateRoute {
                    method: route.method.clone(),
                    path: path.clone(),
                });
            }

            for (index, segment) in segments.iter().enumerate() {
                if let Segment::Param(name) = segment {
                    let prefix = shape(&segments[..index]);
                    match params.get(&prefix) {
                        Some(existing) if existing.as_str() != *name => {
                            return Err(ComposeError::ConflictingParameter {
                                path: path.clone(),
                                existing: existing.clone(),
                                found: name.to_string(),
                            });
                        }
                        Some(_) => {}
                        None => {
                            params.insert(prefix, name.to_string());
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn validate_base(path: &str) -> Result<(), ComposeError> {
    if !path.starts_with('/') {
        return Err(invalid(path, "base path must start with '/'"));
    }
    if path.len() > 1 && path.ends_with('/') {
        return Err(invalid(path, "base path must not end with '/'"));
    }
    parse(path).map(|_| ())
}

fn parse(path: &str) -> Result<Vec<Segment<'_>>, ComposeError> {
    let Some(rest) = path.strip_prefix('/') else {
        return Err(invalid(path, "path must start with '/'"));
    };
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    rest.split('/')
        .map(|segment| {
            if segment.is_empty() {
                return Err(invalid(path, "empty path segment"));
            }
            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid(path, "parameter names must be [A-Za-z0-9_]+"));
                }
                return Ok(Segment::Param(name));
            }
            if segment.contains([':', '{', '}', '*']) {
                return Err(invalid(path, "literal segments must not contain ':', '{', '}' or '*'"));
            }
            Ok(Segment::Literal(segment))
        })
        .collect()
}

/// Path with parameter names erased: `/a/:id` and `/a/:name` share a shape.
fn shape(segments: &[Segment<'_>]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        match segment {
            Segment::Literal(literal) => out.push_str(literal),
            Segment::Param(_) => out.push(':'),
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

fn full_path(base: &str, sub: &str) -> String {
    let base = if base == "/" { "" } else { base };
    let path = format!("{base}{sub}");
    if path.is_empty() { "/".to_string() } else { path }
}

/// `:name` to the router's `{name}` capture syntax.
fn router_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn invalid(path: &str, reason: &'static str) -> ComposeError {
    ComposeError::InvalidPath {
        path: path.to_string(),
        reason,
    }
}
