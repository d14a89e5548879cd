//! Session lifecycle for the authorization-code login flow.
//!
//! # Components
//!
//! - `manager` - Login redirects, callback completion, token storage
//! - `redirect_state` - Pending-login state surviving the page reload
//! - `pkce` - Code verifier/challenge helpers (RFC 7636, S256)

pub mod manager;
pub mod pkce;
pub mod redirect_state;

pub use manager::{Navigator, SessionManager, StoredSession, UserDisplayClaims};
pub use redirect_state::{PendingLoginState, RedirectStateStore};
