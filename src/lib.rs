//! Chime Meeting Service
//!
//! This library exposes REST endpoints for meetings and attendees backed by
//! the Amazon Chime meetings API. Requests are forwarded to the provider,
//! responses are reshaped into a stable JSON envelope, and the embedding
//! application can attach its own metadata and tags through hooks.
//!
//! # Modules
//!
//! - `config`: tenant-wide settings loaded from the environment
//! - `auth`: Signature Version 4 request signing
//! - `client`: `ChimeApi` trait and the HTTP `ChimeClient`
//! - `coordinator`: `MeetingCoordinator`, the facade in front of the provider
//! - `hooks`: extension points for the embedding application
//! - `services`: request logic shared by the handlers
//! - `handlers` / `routes`: the axum HTTP surface
//!
//! # Identifiers
//!
//! Every external meeting id, client request token and external user id the
//! service creates is the configured prefix followed by a request id, so that
//! several applications can share one provider account.

pub mod auth;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod handlers;
pub mod hooks;
pub mod models;
pub mod routes;
pub mod services;

#[cfg(test)]
mod client_mock;

// Re-export the main API types for ease of use
pub use client::{ChimeApi, ChimeClient, ChimeError};
pub use config::{Config, ConfigError, ProviderSettings};
pub use coordinator::MeetingCoordinator;
pub use handlers::api::AppState;
pub use hooks::{ApplicationHooks, DefaultHooks, RequestContext};
pub use routes::create_router;
