use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use bottomline_import::ScheduleReconciler;
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// API key auth settings used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `BOTTOMLINE_API_KEYS` (comma-separated bearer
    /// tokens).
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("BOTTOMLINE_API_KEYS").unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    /// In development, an empty key list disables auth for local iteration.
    /// Anywhere else it fails startup.
    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let mut keys: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        keys.sort();
        keys.dedup();

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "BOTTOMLINE_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(Vec::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "BOTTOMLINE_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self {
            api_keys: Arc::new(keys),
            enabled: true,
        })
    }

    fn allows(&self, token: &str) -> bool {
        // Check every key so timing does not reveal which one matched.
        self.api_keys
            .iter()
            .fold(false, |found, key| {
                found | bool::from(key.as_bytes().ct_eq(token.as_bytes()))
            })
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing Bearer token auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let token = extract_bearer_token(req.headers().get(AUTHORIZATION));

    match token {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "unauthorized",
                    message: "missing or invalid bearer token",
                },
            }),
        )
            .into_response(),
    }
}

/// Middleware reconciling the recurring import before every admin request.
///
/// A failed reconcile is logged and the request proceeds; the periodic tick
/// retries it.
pub async fn reconcile_schedule(
    State(reconciler): State<Arc<ScheduleReconciler>>,
    req: Request,
    next: Next,
) -> Response {
    if let Err(e) = reconciler.reconcile().await {
        tracing::error!(error = %e, "schedule reconcile failed");
    }
    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
