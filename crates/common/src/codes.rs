//! Stable error codes returned across the trust boundary.
//!
//! These strings are part of the wire contract: clients branch on them, so
//! they must never change once published. Human-readable messages may vary;
//! codes may not.

/// An API request did not carry a valid access token.
pub const INVALID_TOKEN: &str = "invalid_token";

/// Token signing keys could not be downloaded from the JWKS endpoint.
pub const JWKS_DOWNLOAD_ERROR: &str = "jwks_download_error";

/// A generic server error with no more specific translation.
pub const SERVER_ERROR: &str = "server_error";

/// The token was valid but does not carry a required scope.
pub const INSUFFICIENT_SCOPE: &str = "insufficient_scope";

/// An API request was sent to a route that does not exist.
pub const REQUEST_NOT_FOUND: &str = "request_not_found";

/// Client-side sentinel: a login redirect is required or already pending.
/// This is a control-flow signal and must never be rendered as a failure.
pub const LOGIN_REQUIRED: &str = "login_required";

/// The login redirect could not be started.
pub const LOGIN_REQUEST_FAILED: &str = "login_request_failed";

/// The authorization server's callback could not be processed.
pub const LOGIN_RESPONSE_FAILED: &str = "login_response_failed";

/// A client-side API call failed before a response was received.
pub const API_NETWORK_ERROR: &str = "api_network_error";

/// A client-side API call returned an error response.
pub const API_RESPONSE_ERROR: &str = "api_response_error";

/// A client-side failure with no more specific translation.
pub const UI_ERROR: &str = "ui_error";
