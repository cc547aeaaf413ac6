use crate::{
    AppState,
    auth::Identity,
    error::ApiError,
    exports::ExportPolicy,
    models::WhoAmI,
};
use axum::{
    Json,
    extract::{OriginalUri, Path, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};

// --- Handlers ---

/// export_detail
///
/// [exports module] Streams the export artifact of one dataset/namespace pair.
/// The storage key depends on the caller's group: `unlimited` members read the
/// unscoped artifact, members of the restricted group read their own variant.
///
/// Any storage failure, missing key included, is reported as 404 carrying the
/// storage error text.
#[utoipa::path(
    get,
    path = "/exports/{namespace}/{dataset}",
    params(
        ("namespace" = String, Path, description = "Namespace id (0, 6 or 14)"),
        ("dataset" = String, Path, description = "Dataset code, e.g. enwiki")
    ),
    responses(
        (status = 200, description = "Export artifact, byte for byte"),
        (status = 400, description = "Unrecognized namespace or dataset"),
        (status = 403, description = "Caller outside the export groups"),
        (status = 404, description = "Storage lookup failed")
    )
)]
pub async fn export_detail(
    identity: Identity,
    State(state): State<AppState>,
    Path((namespace, dataset)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let policy = ExportPolicy::from_config(&state.config);

    let key = policy
        .resolve(&namespace, &dataset, &identity)
        .inspect_err(|err| tracing::debug!(error = %err, "export request rejected"))?;

    let object = state.storage.get_object(&key).await.map_err(|err| {
        tracing::warn!(key = %key, error = %err, "export fetch failed");
        ApiError::NotFound(err.to_string())
    })?;

    let content_type = object
        .content_type
        .unwrap_or_else(|| "application/json".to_string());

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        object.body,
    )
        .into_response();

    if let Some(length) = object.content_length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, header::HeaderValue::from(length));
    }

    Ok(response)
}

/// whoami
///
/// [auth module] Echoes the identity resolved from the caller's token.
#[utoipa::path(
    get,
    path = "/auth/whoami",
    responses(
        (status = 200, description = "Resolved identity", body = WhoAmI),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn whoami(identity: Identity) -> Json<WhoAmI> {
    Json(WhoAmI::from(identity))
}

/// health
///
/// Liveness probe for load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// not_implemented
///
/// Registered for the project, page and dump routes, whose bodies live in
/// upstream services this gateway does not reach.
pub async fn not_implemented(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotImplemented(format!("{method} {} is not served by this gateway", uri.path()))
}
