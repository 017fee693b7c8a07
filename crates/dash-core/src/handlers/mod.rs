//! Command handlers
//!
//! A handler validates its command against the snapshot in [`HandlerContext`], talks to the
//! backend if it has to, and returns the actions to commit plus the success event. Handlers never
//! write to the store; the runtime commits their outcome only when it arrives uncancelled.

pub mod context;
pub mod dashboard;
pub mod filters;
pub mod history;
pub mod items;
pub mod layout;
pub mod widgets;

pub use context::{HandlerContext, HandlerOutcome, HistoryEffect};

use crate::commands::CommandPayload;
use crate::error::CommandError;

/// Run the handler of `payload`
pub async fn handle(ctx: &HandlerContext<'_>, payload: &CommandPayload) -> Result<HandlerOutcome, CommandError> {
    use CommandPayload::*;

    let outcome = match payload {
        AddLayoutSection(cmd) => layout::add_layout_section(ctx, cmd).await,
        MoveLayoutSection(cmd) => layout::move_layout_section(ctx, cmd).await,
        RemoveLayoutSection(cmd) => layout::remove_layout_section(ctx, cmd).await,
        ChangeLayoutSectionHeader(cmd) => layout::change_layout_section_header(ctx, cmd).await,
        AddSectionItems(cmd) => layout::add_section_items(ctx, cmd).await,
        MoveSectionItem(cmd) => layout::move_section_item(ctx, cmd).await,
        MoveSectionItemToNewSection(cmd) => layout::move_section_item_to_new_section(ctx, cmd).await,
        MoveSectionItemToNewSectionAndRemoveEmpty(cmd) => {
            layout::move_section_item_to_new_section_and_remove_empty(ctx, cmd).await
        }
        RemoveSectionItem(cmd) => layout::remove_section_item(ctx, cmd).await,
        RemoveSectionItemByWidgetRef(cmd) => layout::remove_section_item_by_widget_ref(ctx, cmd).await,
        ReplaceSectionItem(cmd) => layout::replace_section_item(ctx, cmd).await,
        ResizeHeight(cmd) => layout::resize_height(ctx, cmd).await,
        ResizeWidth(cmd) => layout::resize_width(ctx, cmd).await,
        ToggleLayoutSectionHeaders(cmd) => layout::toggle_layout_section_headers(ctx, cmd).await,
        ChangeLayoutDirection(cmd) => layout::change_layout_direction(ctx, cmd).await,
        UndoLayoutChanges(cmd) => history::undo_layout_changes(ctx, cmd).await,
        RedoLayoutChanges(cmd) => history::redo_layout_changes(ctx, cmd).await,

        ChangeWidgetHeader(cmd) => widgets::change_widget_header(ctx, cmd).await,
        ChangeWidgetDescription(cmd) => widgets::change_widget_description(ctx, cmd).await,
        ChangeRichTextContent(cmd) => widgets::change_rich_text_content(ctx, cmd).await,
        ModifyDrillsForInsightWidget(cmd) => widgets::modify_drills_for_insight_widget(ctx, cmd).await,
        RemoveDrillsForInsightWidget(cmd) => widgets::remove_drills_for_insight_widget(ctx, cmd).await,
        RefreshInsightWidget(cmd) => widgets::refresh_insight_widget(ctx, cmd).await,
        ChangeInsightWidgetFilterSettings(cmd) => widgets::change_insight_widget_filter_settings(ctx, cmd).await,
        ChangeKpiWidgetFilterSettings(cmd) => widgets::change_kpi_widget_filter_settings(ctx, cmd).await,

        ChangeDateFilterSelection(cmd) => filters::change_date_filter_selection(ctx, cmd).await,
        AddAttributeFilter(cmd) => filters::add_attribute_filter(ctx, cmd).await,
        RemoveAttributeFilters(cmd) => filters::remove_attribute_filters(ctx, cmd).await,
        MoveAttributeFilter(cmd) => filters::move_attribute_filter(ctx, cmd).await,
        ChangeAttributeFilterSelection(cmd) => filters::change_attribute_filter_selection(ctx, cmd).await,
        SetAttributeFilterParents(cmd) => filters::set_attribute_filter_parents(ctx, cmd).await,
        ChangeFilterContextSelection(cmd) => filters::change_filter_context_selection(ctx, cmd).await,

        LoadDashboard(cmd) => dashboard::load_dashboard(ctx, cmd).await,
        SaveDashboard(cmd) => dashboard::save_dashboard(ctx, cmd).await,
        RenameDashboard(cmd) => dashboard::rename_dashboard(ctx, cmd).await,
        ResetDashboard(cmd) => dashboard::reset_dashboard(ctx, cmd).await,
    }?;

    if payload.is_undoable() && !outcome.actions.is_empty() && outcome.history == HistoryEffect::None {
        return Ok(outcome.with_history(HistoryEffect::Record));
    }
    Ok(outcome)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use dash_backend::InMemoryBackend;
    use dash_model::{Dashboard, Item, RichTextWidget, Widget};
    use tokio_util::sync::CancellationToken;

    use crate::config::EngineSettings;
    use crate::handlers::HandlerContext;
    use crate::store::{DashboardState, Selectors};
    use crate::undo::UndoStack;

    pub fn text_item(content: &str) -> Item {
        Item::new(Widget::RichText(RichTextWidget::new(content)), 4)
    }

    /// Everything a [`HandlerContext`] borrows
    pub struct ContextParts {
        pub state: Arc<DashboardState>,
        pub selectors: Selectors,
        pub backend: InMemoryBackend,
        pub settings: EngineSettings,
        pub history: UndoStack,
    }

    impl ContextParts {
        pub fn context(&self) -> HandlerContext<'_> {
            HandlerContext {
                state: self.state.clone(),
                revision: 0,
                selectors: &self.selectors,
                backend: &self.backend,
                settings: &self.settings,
                correlation_id: None,
                abort: CancellationToken::new(),
                history: &self.history,
            }
        }
    }

    pub fn context_parts(dashboard: Dashboard) -> ContextParts {
        context_parts_with(dashboard, InMemoryBackend::new())
    }

    pub fn context_parts_with(dashboard: Dashboard, backend: InMemoryBackend) -> ContextParts {
        let settings = EngineSettings::default();
        ContextParts {
            state: Arc::new(DashboardState::new(dashboard)),
            selectors: Selectors::new(),
            backend,
            history: UndoStack::new(settings.undo_limit),
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{context_parts, text_item};
    use super::*;
    use crate::commands::{ChangeRichTextContent, RenameDashboard};
    use dash_model::{Dashboard, Layout, ObjRef, Section};

    #[tokio::test]
    async fn test_undoable_commands_record_history() {
        let mut dashboard = Dashboard::new("Test");
        let mut item = text_item("hello");
        item.widget.set_widget_ref(ObjRef::identifier("w1"));
        dashboard.layout = Layout::new(vec![Section::new(vec![item])]);
        let parts = context_parts(dashboard);
        let ctx = parts.context();

        let change = CommandPayload::from(ChangeRichTextContent {
            widget_ref: ObjRef::identifier("w1"),
            content: "bye".to_string(),
        });
        let outcome = handle(&ctx, &change).await.unwrap();
        assert_eq!(outcome.history, HistoryEffect::Record);

        let rename = CommandPayload::from(RenameDashboard {
            title: "Other".to_string(),
        });
        let outcome = handle(&ctx, &rename).await.unwrap();
        assert_eq!(outcome.history, HistoryEffect::None);
    }
}
