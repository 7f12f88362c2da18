//! # Agora API
//!
//! HTTP gateway for the Agora debate platform.
//!
//! Features:
//! - Axum-based JSON API under `/api/v1`
//! - Tower middleware (request id, tracing, security headers, CORS, timeouts)
//! - Bearer-token guard for administrative routes
//! - Input sanitization for topics, reasoning and identifiers
//! - OpenAPI document at `/api-docs/openapi.json`
//! - Graceful shutdown

pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod sanitize;
pub mod server;
pub mod state;

pub use auth::{Admin, AdminAuth};
pub use error::{ApiError, ApiResult};
pub use server::{init_tracing, AgoraServer, ServerConfig};
pub use state::AppState;
