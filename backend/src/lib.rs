//! Report storage HTTP service

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

/// Route handlers
pub mod routes;

/// Server bootstrap
pub mod server;

/// Shared types: environment, errors, extractors
pub mod types;
