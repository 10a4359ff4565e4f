//! Credentials module
//!
//! Supports: Basic (email + API token), Bearer, Custom Headers
//!
//! Credentials are rendered to request headers once and applied by the
//! transport. The fetcher never looks inside them.

mod types;

pub use types::Credentials;

#[cfg(test)]
mod tests;
