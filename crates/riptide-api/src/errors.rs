//! Maps internal failures onto the public `{code, message}` HTTP contract
//! (spec.md §7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use riptide_types::{PublicError, ScrapeError};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Scrape(#[from] ScrapeError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Scrape(err) => scrape_error_status(err),
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Scrape(err) => err.code(),
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Converts to the wire-level `{code, message}` pair used by both the
    /// scrape and crawl responses (spec.md §3 `PublicError`).
    pub fn to_public_error(&self) -> PublicError {
        PublicError {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Maps an internal [`ScrapeError`] onto an HTTP status (spec.md §7):
/// validation failures are 400, a denied crawl is 403, cancellation is
/// 504, and every engine/transport/domain failure collapses to a generic
/// 502 since the client cannot act on the distinction.
fn scrape_error_status(err: &ScrapeError) -> StatusCode {
    match err {
        ScrapeError::Validation(_) => StatusCode::BAD_REQUEST,
        ScrapeError::CrawlDenied(_) => StatusCode::FORBIDDEN,
        ScrapeError::Cancelled(_) => StatusCode::GATEWAY_TIMEOUT,
        ScrapeError::Transport(_) | ScrapeError::Domain(_) | ScrapeError::NoEnginesLeft => {
            StatusCode::BAD_GATEWAY
        }
        ScrapeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, code = self.code(), "request failed");
        } else {
            warn!(error = %self, code = self.code(), "request rejected");
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_public_error(),
        }));
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::Validation(format!("invalid URL: {err}"))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Validation(format!("invalid request body: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riptide_types::TransportError;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::validation("bad url");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn transport_error_collapses_to_bad_gateway() {
        let err = ApiError::Scrape(ScrapeError::Transport(TransportError::Dns("boom".into())));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "DNS_ERROR");
    }

    #[test]
    fn crawl_denied_maps_to_forbidden() {
        let err = ApiError::Scrape(ScrapeError::CrawlDenied("robots".into()));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
