//! SPA Client Library
//!
//! The browser-side half of the system: session lifecycle management for an
//! OAuth 2.0 authorization-code login (with PKCE) and an API request
//! executor that attaches access tokens and reacts to 401s.
//!
//! Browser effects (navigation, history replacement) and storage are
//! injected behind narrow traits so the lifecycle logic is testable in
//! isolation and the pending-login state survives a full page reload.
//!
//! # Modules
//!
//! - `api` - API request executor
//! - `config` - Client configuration
//! - `errors` - UI error model and the login-required sentinel
//! - `session` - Session manager, redirect state store, PKCE helpers
//! - `storage` - Session store abstraction (in-memory and file-backed)

pub mod api;
pub mod config;
pub mod errors;
pub mod session;
pub mod storage;
