use std::collections::BTreeSet;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, middleware::Interceptor};

/// Claims
///
/// JWT payload accepted by the gateway. Group membership follows the Cognito
/// claim name, with plain `groups` accepted as well.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: stable user identifier, used as username when none is given.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "cognito:groups", alias = "groups", default)]
    pub groups: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Identity
///
/// The authenticated caller. Inserted into the request extensions by
/// `JwtInterceptor`; handlers and later interceptors only read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub groups: BTreeSet<String>,
}

impl Identity {
    pub fn new<I, G>(username: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<String>,
    {
        Self {
            username: username.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username.unwrap_or(claims.sub),
            groups: claims.groups.into_iter().collect(),
        }
    }
}

/// Identity Extractor
///
/// Reads the identity left behind by the auth interceptor. A handler reached
/// without one is mounted without authentication in front of it, which is a
/// wiring bug rather than a client error.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            tracing::error!(uri = %parts.uri, "handler reached without an authenticated identity");
            ApiError::Internal("request is missing an authenticated identity".to_string())
        })
    }
}

/// JwtInterceptor
///
/// Validates `Authorization: Bearer <token>` (HS256, expiry enforced) and attaches
/// the resulting `Identity`. When the header bypass is enabled (local env only),
/// `x-user-name` / `x-user-groups` stand in for a token.
#[derive(Clone)]
pub struct JwtInterceptor {
    decoding_key: DecodingKey,
    validation: Validation,
    header_bypass: bool,
}

impl JwtInterceptor {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            header_bypass: false,
        }
    }

    pub fn with_header_bypass(mut self, enabled: bool) -> Self {
        self.header_bypass = enabled;
        self
    }

    /// Resolves the caller from the request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, ApiError> {
        if self.header_bypass {
            if let Some(identity) = bypass_identity(headers) {
                return Ok(identity);
            }
        }

        let token = bearer_token(headers)?;

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::Unauthorized("token has expired".to_string()),
                _ => ApiError::Unauthorized("invalid token".to_string()),
            })?;

        Ok(Identity::from(token_data.claims))
    }
}

#[async_trait]
impl Interceptor for JwtInterceptor {
    async fn intercept(&self, mut request: Request, next: Next) -> Response {
        match self.authenticate(request.headers()) {
            Ok(identity) => {
                tracing::debug!(user = %identity.username, groups = ?identity.groups, "authenticated request");
                request.extensions_mut().insert(identity);
                next.run(request).await
            }
            Err(err) => {
                tracing::debug!(error = %err, "authentication rejected");
                err.into_response()
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("malformed authorization header".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| ApiError::Unauthorized("authorization header must use the Bearer scheme".to_string()))?;

    if token.is_empty() {
        return Err(ApiError::Unauthorized("empty bearer token".to_string()));
    }

    Ok(token)
}

fn bypass_identity(headers: &HeaderMap) -> Option<Identity> {
    let username = headers.get("x-user-name")?.to_str().ok()?.trim();
    if username.is_empty() {
        return None;
    }

    let groups = headers
        .get("x-user-groups")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|group| !group.is_empty());

    Some(Identity::new(username, groups))
}
