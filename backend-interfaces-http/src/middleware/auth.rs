use axum::http::HeaderMap;

use backend_domain::RuntimeConfig;

use crate::error::HttpError;

pub const OPERATOR_HEADER: &str = "X-Operator-Id";

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    authorize_token(config, extract_bearer(headers).as_deref())
}

/// Browsers cannot set headers on a websocket handshake, so the live feed
/// also accepts `?access_token=`.
pub fn authorize_with_query(
    config: &RuntimeConfig,
    headers: &HeaderMap,
    access_token: Option<&str>,
) -> bool {
    let token = extract_bearer(headers).or_else(|| {
        access_token
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    });
    authorize_token(config, token.as_deref())
}

fn authorize_token(config: &RuntimeConfig, token: Option<&str>) -> bool {
    if let Some(api_token) = &config.api_token {
        return token.map(|v| v == api_token).unwrap_or(false);
    }
    true
}

/// The operator performing a scan, taken from `X-Operator-Id`.
pub fn require_operator(headers: &HeaderMap) -> Result<String, HttpError> {
    optional_operator(headers).ok_or(HttpError::Unauthorized)
}

pub fn optional_operator(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(OPERATOR_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
