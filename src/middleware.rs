use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

/// Interceptor
///
/// A request-processing stage that may inspect, reject or annotate a request
/// before handing it to `next`. One instance serves every request of the routes
/// it was attached to, so implementations must be safe to call concurrently.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, request: Request, next: Next) -> Response;
}

/// Zero-argument constructor of an interceptor. Invoked once per router build.
pub type MiddlewareFactory = Arc<dyn Fn() -> Arc<dyn Interceptor> + Send + Sync>;

/// Wraps a constructor closure into a `MiddlewareFactory`.
pub fn factory<F, I>(make: F) -> MiddlewareFactory
where
    F: Fn() -> I + Send + Sync + 'static,
    I: Interceptor + 'static,
{
    Arc::new(move || Arc::new(make()) as Arc<dyn Interceptor>)
}

/// Attaches one interceptor instance to a method router. Only matched requests
/// reach it; the method router's 405 fallback stays untouched.
pub(crate) fn intercept_with<S>(
    method_router: MethodRouter<S>,
    interceptor: Arc<dyn Interceptor>,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    method_router.route_layer(middleware::from_fn(move |request: Request, next: Next| {
        let interceptor = interceptor.clone();
        async move { interceptor.intercept(request, next).await }
    }))
}

/// Installs the gateway-wide middleware: request id + trace logging, then CORS
/// as the outermost layer.
pub(crate) fn with_global_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Span for every request, correlated by the generated `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
