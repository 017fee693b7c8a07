//! Undo and redo of layout changes

use crate::commands::{RedoLayoutChanges, UndoLayoutChanges};
use crate::error::CommandError;
use crate::events::EventPayload;
use crate::handlers::{HandlerContext, HandlerOutcome, HistoryEffect};
use crate::store::Action;
use crate::undo::LayoutSnapshot;

fn restore(snapshot: &LayoutSnapshot) -> Vec<Action> {
    vec![
        Action::ReplaceLayout {
            layout: snapshot.layout.clone(),
        },
        Action::ReplaceStash {
            stash: snapshot.stash.clone(),
        },
    ]
}

pub async fn undo_layout_changes(ctx: &HandlerContext<'_>, cmd: &UndoLayoutChanges) -> Result<HandlerOutcome, CommandError> {
    let count = ctx.history.count_for(&cmd.undo_point);
    let snapshot = ctx
        .history
        .peek_undo(count)
        .ok_or_else(|| CommandError::user("nothing to undo"))?;
    tracing::debug!("Undoing {} layout commands", count);

    Ok(HandlerOutcome::new(restore(snapshot), EventPayload::LayoutChanged {
        layout: snapshot.layout.clone(),
        commands: count,
    })
    .with_history(HistoryEffect::Undo {
        count,
        redoable: cmd.redoable,
    }))
}

pub async fn redo_layout_changes(ctx: &HandlerContext<'_>, _cmd: &RedoLayoutChanges) -> Result<HandlerOutcome, CommandError> {
    let snapshot = ctx
        .history
        .peek_redo()
        .ok_or_else(|| CommandError::user("nothing to redo"))?;

    Ok(HandlerOutcome::new(restore(snapshot), EventPayload::LayoutChanged {
        layout: snapshot.layout.clone(),
        commands: 1,
    })
    .with_history(HistoryEffect::Redo))
}
