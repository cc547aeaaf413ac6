use std::collections::BTreeSet;

use async_trait::async_trait;
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{auth::Identity, error::ApiError, middleware::Interceptor};

/// GroupGuard
///
/// Admits a request only when its identity belongs to at least one of the
/// configured groups. Must run after `JwtInterceptor`.
#[derive(Debug, Clone)]
pub struct GroupGuard {
    allowed: BTreeSet<String>,
}

impl GroupGuard {
    pub fn new<I, G>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        Self {
            allowed: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn check(&self, identity: Option<&Identity>) -> Result<(), ApiError> {
        let identity = identity
            .ok_or_else(|| ApiError::Unauthorized("request is not authenticated".to_string()))?;

        if identity.groups.iter().any(|group| self.allowed.contains(group)) {
            return Ok(());
        }

        Err(ApiError::Forbidden(format!(
            "user '{}' is not a member of any permitted group",
            identity.username
        )))
    }
}

#[async_trait]
impl Interceptor for GroupGuard {
    async fn intercept(&self, request: Request, next: Next) -> Response {
        if let Err(err) = self.check(request.extensions().get::<Identity>()) {
            tracing::debug!(error = %err, allowed = ?self.allowed, "group check rejected request");
            return err.into_response();
        }
        next.run(request).await
    }
}
