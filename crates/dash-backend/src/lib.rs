//! Backend gateway for the dashboard engine
//!
//! The engine never talks to an analytical backend directly. Everything it needs (query
//! execution, insight resolution, attribute metadata, dashboard persistence) goes through the
//! [`BackendGateway`] trait. [`InMemoryBackend`] is a complete reference implementation backed by
//! an in-process catalog, with per-operation latency for exercising cancellation and ordering.

pub mod gateway;
pub mod memory;

use thiserror::Error;

// Re-exports
pub use gateway::{BackendCapabilities, BackendGateway, DisplayForm, ExecutionDefinition, ResultHandle};
pub use memory::{Catalog, Connection, InMemoryBackend, Operation};

/// Errors that can occur in backend calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("operation not supported by backend: {0}")]
    NotSupported(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend call was cancelled")]
    Cancelled,

    #[error("backend error: {0}")]
    Other(String),
}

pub type BackendResult<T> = Result<T, BackendError>;
