//! Cross-crate test suite.
//!
//! The suites under `tests/` wire the client crate and the resource server
//! together: tokens minted through the client login flow are validated by
//! the server-side validator, including the forced-expiry corruption round
//! trip. This crate intentionally exports nothing.
