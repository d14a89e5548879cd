//! UI error model for the client application.
//!
//! Every failure the client surfaces is a [`UiError`] carrying a stable
//! code, an area for display grouping, and a UTC timestamp. API 500
//! responses contribute their correlation id and timestamp so support can
//! match a user's screenshot to the server logs.
//!
//! One error is special: the login-required sentinel. It signals that a
//! redirect is required or already in progress and must never be rendered
//! as a failure.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// An error shaped for rendering in an error view.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UiError {
    area: String,
    code: String,
    message: String,
    status: Option<u16>,
    utc_time: DateTime<Utc>,
    /// Correlation id adopted from an API 500 body, when present.
    correlation_id: Option<String>,
    /// Extra detail for logs only; views render code/message/id.
    details: String,
}

impl UiError {
    fn new(area: &str, code: &str, message: &str, details: impl Into<String>) -> Self {
        Self {
            area: area.to_string(),
            code: code.to_string(),
            message: message.to_string(),
            status: None,
            utc_time: Utc::now(),
            correlation_id: None,
            details: details.into(),
        }
    }

    /// The control-flow sentinel: a login redirect is required or pending.
    ///
    /// UIs must treat this as "stop rendering", not as a failure.
    #[must_use]
    pub fn login_required() -> Self {
        Self::new(
            "login",
            common::codes::LOGIN_REQUIRED,
            "A login redirect is in progress",
            "",
        )
    }

    /// The login redirect could not be started.
    #[must_use]
    pub fn login_request_failed(details: impl Into<String>) -> Self {
        Self::new(
            "login",
            common::codes::LOGIN_REQUEST_FAILED,
            "A technical problem occurred during login processing",
            details,
        )
    }

    /// The authorization server's callback could not be completed.
    #[must_use]
    pub fn login_response_failed(details: impl Into<String>) -> Self {
        Self::new(
            "login",
            common::codes::LOGIN_RESPONSE_FAILED,
            "A technical problem occurred during login processing",
            details,
        )
    }

    /// A client-side failure with no more specific translation.
    #[must_use]
    pub fn unexpected(area: &str, details: impl Into<String>) -> Self {
        Self::new(
            area,
            common::codes::UI_ERROR,
            "A technical problem was encountered in the UI",
            details,
        )
    }

    /// An API call failed before any response was received.
    #[must_use]
    pub fn from_network_error(url: &str, details: impl Into<String>) -> Self {
        let mut error = Self::new(
            "web api",
            common::codes::API_NETWORK_ERROR,
            "A network problem occurred when the UI called the server",
            details,
        );
        error.details = format!("{} [url: {url}]", error.details);
        error
    }

    /// An API call returned an error response.
    ///
    /// 4xx bodies contribute `{code, message}`; 5xx bodies additionally
    /// carry `correlationId` and `utcTime`, which are adopted verbatim so
    /// the id is never regenerated client-side.
    #[must_use]
    pub fn from_api_response(status: u16, body: &Value, url: &str) -> Self {
        let code = body
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or(common::codes::API_RESPONSE_ERROR);
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("A technical problem occurred when the UI called the server");

        let mut error = Self::new("web api", code, message, format!("[url: {url}]"));
        error.status = Some(status);
        error.correlation_id = body
            .get("correlationId")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        if let Some(utc_time) = body
            .get("utcTime")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        {
            error.utc_time = utc_time.with_timezone(&Utc);
        }
        error
    }

    /// Whether this is the login-required sentinel.
    #[must_use]
    pub fn is_login_required(&self) -> bool {
        self.code == common::codes::LOGIN_REQUIRED
    }

    /// The display area this error belongs to.
    #[must_use]
    pub fn area(&self) -> &str {
        &self.area
    }

    /// The stable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The HTTP status of the failed call, when one completed.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// When the error occurred (or, for API 500s, when the server said it
    /// occurred).
    #[must_use]
    pub fn utc_time(&self) -> DateTime<Utc> {
        self.utc_time
    }

    /// The server-side correlation id, for API 500s.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Log-only detail; not part of the rendered error.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }
}
