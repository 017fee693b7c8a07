//! What a handler sees and what it returns

use std::sync::Arc;

use ahash::AHashMap;
use dash_backend::BackendGateway;
use dash_model::{LayoutItemPath, ObjRef};
use tokio_util::sync::CancellationToken;

use crate::config::EngineSettings;
use crate::error::CommandError;
use crate::events::EventPayload;
use crate::store::{Action, DashboardState, Selectors};
use crate::undo::UndoStack;

/// Read-only view handed to a command handler
pub struct HandlerContext<'a> {
    /// Snapshot the command runs against
    pub state: Arc<DashboardState>,
    /// Store revision of `state`
    pub revision: u64,
    pub selectors: &'a Selectors,
    pub backend: &'a dyn BackendGateway,
    pub settings: &'a EngineSettings,
    pub correlation_id: Option<&'a str>,
    /// Fires when the command is cancelled or superseded
    pub abort: CancellationToken,
    pub history: &'a UndoStack,
}

impl HandlerContext<'_> {
    /// Path of the item holding a widget
    pub fn widget_path(&self, widget_ref: &ObjRef) -> Result<LayoutItemPath, CommandError> {
        self.selectors
            .widget_paths
            .get(self.revision, &self.state)
            .get(widget_ref)
            .cloned()
            .ok_or_else(|| CommandError::user(format!("widget {} does not exist", widget_ref)))
    }
}

/// Effect of a command on the undo history
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HistoryEffect {
    #[default]
    None,
    /// Record the state before this command
    Record,
    Undo {
        count: usize,
        redoable: bool,
    },
    Redo,
    /// Forget all history
    Clear,
    /// Widgets got new identities; keys are the old ones
    RemapWidgetRefs(AHashMap<ObjRef, ObjRef>),
}

/// Successful handler result, committed by the runtime
#[derive(Debug, Clone)]
pub struct HandlerOutcome {
    pub actions: Vec<Action>,
    pub history: HistoryEffect,
    pub event: EventPayload,
}

impl HandlerOutcome {
    pub fn new(actions: Vec<Action>, event: EventPayload) -> Self {
        Self {
            actions,
            history: HistoryEffect::None,
            event,
        }
    }

    pub fn with_history(mut self, history: HistoryEffect) -> Self {
        self.history = history;
        self
    }
}
