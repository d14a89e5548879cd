//! API calls from the client application.

pub mod executor;

pub use executor::ApiRequestExecutor;
