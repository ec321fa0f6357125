use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const MAX_REQUEST_ID_LEN: usize = 128;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Who is calling, as far as rate limiting is concerned.
///
/// Set by [`require_bearer_auth`]: `key-<n>` for the n-th configured key,
/// `anonymous` while auth is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerKey(pub String);

impl CallerKey {
    fn anonymous() -> Self {
        Self("anonymous".to_string())
    }
}

/// Bearer key settings for the protected routes.
///
/// Keys are held only as salted SHA-256 digests.
#[derive(Debug, Clone)]
pub struct AuthState {
    key_digests: Arc<Vec<[u8; 32]>>,
    salt: Arc<str>,
    pub enabled: bool,
}

impl AuthState {
    /// Reads `GROCER_API_KEYS` (comma-separated bearer tokens).
    ///
    /// In development, missing keys disable auth. Elsewhere they fail startup.
    pub fn from_env(is_development: bool, salt: &str) -> anyhow::Result<Self> {
        let raw = std::env::var("GROCER_API_KEYS").unwrap_or_default();
        Self::from_raw(&raw, is_development, salt)
    }

    pub fn from_raw(raw: &str, is_development: bool, salt: &str) -> anyhow::Result<Self> {
        let key_digests: Vec<[u8; 32]> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|key| digest_key(salt, key))
            .collect();

        if key_digests.is_empty() && !is_development {
            anyhow::bail!(
                "GROCER_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }
        if key_digests.is_empty() {
            tracing::warn!("GROCER_API_KEYS not set; bearer auth disabled in development");
        }

        Ok(Self {
            enabled: !key_digests.is_empty(),
            key_digests: Arc::new(key_digests),
            salt: Arc::from(salt),
        })
    }

    /// Position of the configured key matching `token`.
    ///
    /// Every digest is compared so the time taken does not depend on which
    /// key matched.
    fn identify(&self, token: &str) -> Option<usize> {
        let candidate = digest_key(&self.salt, token);
        self.key_digests
            .iter()
            .enumerate()
            .fold(None, |found, (index, known)| {
                let hit = bool::from(known.ct_eq(&candidate));
                found.or(hit.then_some(index))
            })
    }
}

fn digest_key(salt: &str, key: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(key.as_bytes());
    hasher.finalize().into()
}

#[derive(Debug, Clone, Copy)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window request limit tracked separately for each caller.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    callers: Arc<Mutex<HashMap<CallerKey, RateLimitWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            callers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count one request for `caller`; `false` once its window is used up.
    async fn admit(&self, caller: &CallerKey, now: Instant) -> bool {
        let mut callers = self.callers.lock().await;
        callers.retain(|_, w| now.duration_since(w.started_at) < self.window);

        let window = callers.entry(caller.clone()).or_insert(RateLimitWindow {
            started_at: now,
            count: 0,
        });
        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

/// Incoming request ids are echoed only when short printable ASCII.
fn accepted_request_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic())
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map_or_else(|| Uuid::new_v4().to_string(), |id| id.0.clone())
}

/// Axum middleware that extracts or generates a request ID.
///
/// A well-formed incoming `x-request-id` is kept; anything else is replaced
/// by a fresh `UUIDv4`. The ID goes into request extensions as [`RequestId`]
/// and back out on the response header.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| accepted_request_id(v))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing bearer auth when enabled. Tags the request with the
/// caller's [`CallerKey`].
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        req.extensions_mut().insert(CallerKey::anonymous());
        return next.run(req).await;
    }

    let caller = extract_bearer_token(req.headers().get(AUTHORIZATION))
        .and_then(|token| auth.identify(token));

    match caller {
        Some(index) => {
            req.extensions_mut().insert(CallerKey(format!("key-{index}")));
            next.run(req).await
        }
        None => {
            tracing::debug!("rejected request without a valid bearer token");
            ApiError::new(
                request_id_of(&req),
                "unauthorized",
                "missing or invalid bearer token",
            )
            .into_response()
        }
    }
}

/// Middleware enforcing the per-caller request limit. Runs inside
/// [`require_bearer_auth`].
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let caller = req
        .extensions()
        .get::<CallerKey>()
        .cloned()
        .unwrap_or_else(CallerKey::anonymous);

    if rate_limit.admit(&caller, Instant::now()).await {
        return next.run(req).await;
    }

    tracing::warn!(caller = %caller.0, "rate limit exceeded");
    ApiError::new(request_id_of(&req), "rate_limited", "rate limit exceeded").into_response()
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        let state = AuthState::from_raw("", true, "salt").expect("dev should allow missing keys");
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_requires_keys_outside_dev() {
        assert!(AuthState::from_raw(" , ", false, "salt").is_err());
    }

    #[test]
    fn identify_names_the_matching_key_only() {
        let state = AuthState::from_raw("alpha, beta", false, "salt").expect("auth");
        assert!(state.enabled);
        assert_eq!(state.identify("alpha"), Some(0));
        assert_eq!(state.identify("beta"), Some(1));
        assert_eq!(state.identify("gamma"), None);
        assert_eq!(state.identify("alph"), None);
    }

    #[test]
    fn digest_depends_on_salt() {
        assert_ne!(digest_key("a", "key"), digest_key("b", "key"));
    }

    #[test]
    fn request_id_must_be_short_visible_ascii() {
        assert!(accepted_request_id("req-42"));
        assert!(accepted_request_id(&"a".repeat(MAX_REQUEST_ID_LEN)));
        assert!(!accepted_request_id(""));
        assert!(!accepted_request_id(&"a".repeat(MAX_REQUEST_ID_LEN + 1)));
        assert!(!accepted_request_id("has space"));
        assert!(!accepted_request_id("caf\u{e9}"));
    }

    #[tokio::test]
    async fn rate_limit_windows_are_kept_per_caller() {
        let limit = RateLimitState::new(2, Duration::from_secs(60));
        let alpha = CallerKey("key-0".to_string());
        let beta = CallerKey("key-1".to_string());
        let now = Instant::now();

        assert!(limit.admit(&alpha, now).await);
        assert!(limit.admit(&alpha, now).await);
        assert!(!limit.admit(&alpha, now).await);
        assert!(limit.admit(&beta, now).await);
    }

    #[tokio::test]
    async fn rate_limit_window_resets_after_it_elapses() {
        let limit = RateLimitState::new(1, Duration::from_secs(60));
        let caller = CallerKey::anonymous();
        let start = Instant::now();

        assert!(limit.admit(&caller, start).await);
        assert!(!limit.admit(&caller, start + Duration::from_secs(59)).await);
        assert!(limit.admit(&caller, start + Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn expired_caller_windows_are_dropped() {
        let limit = RateLimitState::new(5, Duration::from_secs(1));
        let start = Instant::now();

        limit.admit(&CallerKey("key-0".to_string()), start).await;
        limit
            .admit(&CallerKey("key-1".to_string()), start + Duration::from_secs(2))
            .await;

        assert_eq!(limit.callers.lock().await.len(), 1);
    }
}
