//! Error classification for the resource server.
//!
//! Two top-level kinds cover every failure:
//! - [`ClientError`] - caller-fixable 4xx errors (missing/invalid/expired
//!   token, unknown route)
//! - [`ServerError`] - operational 5xx errors (JWKS download failure,
//!   unexpected exceptions)
//!
//! Server errors carry a correlation id and UTC timestamp generated once at
//! classification time; the full cause is logged and only the id, timestamp
//! and code cross the trust boundary. Classification is idempotent: an error
//! that is already classified passes through unchanged.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Error Types
// =============================================================================

/// A caller-fixable error, returned with a 4xx status.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    status: StatusCode,
    code: &'static str,
    message: String,
    /// Extra detail for logs only; never serialized to the caller.
    log_context: Option<String>,
}

impl ClientError {
    /// No bearer token was supplied in the Authorization header.
    #[must_use]
    pub fn missing_token() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: common::codes::INVALID_TOKEN,
            message: "Missing, invalid or expired access token".to_string(),
            log_context: Some(
                "No bearer token was supplied in the Authorization header".to_string(),
            ),
        }
    }

    /// A token was supplied but failed validation.
    ///
    /// The context describes the actual failure (bad signature, wrong
    /// issuer, unknown kid, ...) and is logged, never returned: the wire
    /// message stays generic so callers learn nothing about why.
    #[must_use]
    pub fn invalid_token(context: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: common::codes::INVALID_TOKEN,
            message: "Missing, invalid or expired access token".to_string(),
            log_context: Some(context.into()),
        }
    }

    /// A required claim was empty after successful signature verification.
    ///
    /// Treated as an invalid token (401) rather than a server fault so that
    /// the policy is uniform across token problems.
    #[must_use]
    pub fn missing_claim(claim_name: &str) -> Self {
        Self::invalid_token(format!(
            "An empty value was found for the expected claim {claim_name}"
        ))
    }

    /// The token was valid but lacks a scope the endpoint requires.
    #[must_use]
    pub fn forbidden(required_scope: &str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code: common::codes::INSUFFICIENT_SCOPE,
            message: format!("The token does not carry the required scope {required_scope}"),
            log_context: None,
        }
    }

    /// The request was malformed in a caller-fixable way.
    ///
    /// Host endpoints supply their own stable code (bad route parameter,
    /// unparseable body, ...).
    #[must_use]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
            log_context: None,
        }
    }

    /// A request was sent to a route that does not exist.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: common::codes::REQUEST_NOT_FOUND,
            message: "An API request was sent to a route that does not exist".to_string(),
            log_context: None,
        }
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The stable error code returned to the caller.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }
}

/// An operational error, returned with a 5xx status.
///
/// The correlation id and timestamp are generated exactly once, when the
/// error is first created; re-classification never regenerates them.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ServerError {
    code: &'static str,
    message: String,
    correlation_id: Uuid,
    utc_time: DateTime<Utc>,
    /// Full cause for logs only; never serialized to the caller.
    details: String,
}

impl ServerError {
    /// The JWKS document could not be downloaded or parsed.
    #[must_use]
    pub fn jwks_download_error(details: impl Into<String>) -> Self {
        Self::stamped(
            common::codes::JWKS_DOWNLOAD_ERROR,
            "Problem downloading token signing keys",
            details,
        )
    }

    /// An unexpected exception with no more specific translation.
    #[must_use]
    pub fn unexpected(details: impl Into<String>) -> Self {
        Self::stamped(
            common::codes::SERVER_ERROR,
            "An unexpected exception occurred in the API",
            details,
        )
    }

    fn stamped(code: &'static str, message: &str, details: impl Into<String>) -> Self {
        Self {
            code,
            message: message.to_string(),
            correlation_id: Uuid::new_v4(),
            utc_time: Utc::now(),
            details: details.into(),
        }
    }

    /// The correlation id logged alongside the full cause.
    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// The stable error code returned to the caller.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }
}

/// Any classified API failure.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Caller-fixable 4xx error.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Operational 5xx error.
    #[error(transparent)]
    Server(#[from] ServerError),
}

impl ApiError {
    /// Normalize any failure into a classified error.
    ///
    /// Errors that are already an [`ApiError`] pass through unchanged, which
    /// keeps correlation ids stable across rethrows. Anything else is
    /// wrapped as an unexpected [`ServerError`].
    #[must_use]
    pub fn classify(error: anyhow::Error) -> Self {
        match error.downcast::<ApiError>() {
            Ok(already_classified) => already_classified,
            Err(other) => ApiError::Server(ServerError::unexpected(format!("{other:#}"))),
        }
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Client(e) => e.status,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// =============================================================================
// HTTP Responses
// =============================================================================

#[derive(Serialize)]
struct ClientErrorBody {
    code: String,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerErrorBody {
    code: String,
    message: String,
    correlation_id: String,
    utc_time: String,
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        tracing::debug!(
            target: "rs.errors",
            code = self.code,
            status = self.status.as_u16(),
            context = self.log_context.as_deref().unwrap_or(""),
            "Returning client error"
        );

        let body = ClientErrorBody {
            code: self.code.to_string(),
            message: self.message.clone(),
        };

        let mut response = (self.status, Json(body)).into_response();

        // 401 responses carry the standard bearer challenge
        if self.status == StatusCode::UNAUTHORIZED {
            let challenge = format!(
                r#"Bearer error="{}", error_description="{}""#,
                self.code, self.message
            );
            if let Ok(value) = header::HeaderValue::from_str(&challenge) {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, value);
            }
        }

        response
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // The full cause stays in the logs; the caller only sees the
        // correlation id it can quote back to support
        tracing::error!(
            target: "rs.errors",
            code = self.code,
            correlation_id = %self.correlation_id,
            utc_time = %self.utc_time.to_rfc3339(),
            details = %self.details,
            "Returning server error"
        );

        let body = ServerErrorBody {
            code: self.code.to_string(),
            message: self.message.clone(),
            correlation_id: self.correlation_id.to_string(),
            utc_time: self.utc_time.to_rfc3339(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Client(e) => e.into_response(),
            ApiError::Server(e) => e.into_response(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
