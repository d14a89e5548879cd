//! Resource Server (RS) Service Library
//!
//! This library provides OAuth 2.0 bearer-token protection for an API. It
//! validates incoming access tokens against a remote JWKS endpoint and hands
//! downstream handlers a verified claims principal; the API's own endpoints
//! are the host application's concern.
//!
//! # Modules
//!
//! - `auth` - JWKS key provider, token validation, claims principal
//! - `config` - Service configuration
//! - `errors` - Error classification and HTTP error responses
//! - `middleware` - Axum authentication middleware
//! - `observability` - Tracing initialization
//! - `routes` - Route composition for host applications

pub mod auth;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod observability;
pub mod routes;
