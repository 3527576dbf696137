//! # API Module
//!
//! HTTP endpoints served while `ampsassist watch` is running.
//!
//! ## Endpoints
//!
//! - [`health`] - liveness plus the summary of the last finished sync cycle,
//!   so a container healthcheck or a dashboard can tell whether the mirror
//!   is still making progress.
//!
//! Built on [Axum](https://docs.rs/axum); the server itself lives in
//! [`crate::server`].

mod health;

pub use health::health;
