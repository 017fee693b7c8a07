//! Handle to one dispatched command

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::events::DashboardEvent;

/// Returned by [`DashboardRuntime::dispatch`](super::DashboardRuntime::dispatch)
///
/// Dropping the ticket does not cancel the command; its event still reaches the bus.
#[derive(Debug)]
pub struct CommandTicket {
    command_type: &'static str,
    correlation_id: Option<String>,
    token: CancellationToken,
    receiver: oneshot::Receiver<DashboardEvent>,
}

impl CommandTicket {
    pub(crate) fn new(
        command_type: &'static str,
        correlation_id: Option<String>,
        token: CancellationToken,
        receiver: oneshot::Receiver<DashboardEvent>,
    ) -> Self {
        Self {
            command_type,
            correlation_id,
            token,
            receiver,
        }
    }

    pub fn command_type(&self) -> &'static str {
        self.command_type
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Request cancellation
    ///
    /// A queued command never runs; a running one stops at its next backend await. A command
    /// that already committed is not affected.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the terminal event of the command
    pub async fn wait(self) -> Result<DashboardEvent, RuntimeError> {
        self.receiver.await.map_err(|_| RuntimeError::Closed)
    }
}
