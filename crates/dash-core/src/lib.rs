//! Dashboard command engine
//!
//! Editing a dashboard is a stream of [`Command`]s. The [`DashboardRuntime`] runs them strictly
//! one after another against immutable [`DashboardState`] snapshots: a handler validates the
//! command, consults the backend when it needs to, and hands back a batch of store actions that is
//! committed atomically. Every command ends in exactly one [`DashboardEvent`] on the [`EventBus`].

pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod runtime;
pub mod store;
pub mod undo;
pub mod validation;

// Re-export commonly used types
pub use commands::{Command, CommandPayload};
pub use config::{ConfigError, EngineSettings};
pub use error::{CommandError, FailureReason, RuntimeError, StoreError};
pub use events::{DashboardEvent, EventBus, EventPayload};
pub use runtime::{CommandTicket, DashboardRuntime};
pub use store::{Action, DashboardState, Store};
pub use undo::{LayoutSnapshot, UndoRecord, UndoStack};
