//! Reducer actions
//!
//! Actions are low-level state edits. Handlers express each command as a batch of them; the
//! store applies a batch all at once or not at all.

use dash_backend::ResultHandle;
use dash_model::{
    Dashboard, DashboardAttributeFilter, DashboardDateFilter, FilterContext, Insight, Item, Layout, LayoutItemPath,
    LayoutSectionPath, ObjRef, Section, SectionHeader, Stash, StashId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // layout
    AddSection {
        parent: Option<LayoutItemPath>,
        index: usize,
        section: Section,
    },
    RemoveSection {
        parent: Option<LayoutItemPath>,
        index: usize,
    },
    MoveSection {
        index: usize,
        to_index: usize,
    },
    ChangeSectionHeader {
        section: LayoutSectionPath,
        header: Option<SectionHeader>,
    },
    AddItems {
        section: LayoutSectionPath,
        index: usize,
        items: Vec<Item>,
    },
    RemoveItem {
        path: LayoutItemPath,
    },
    ReplaceItem {
        path: LayoutItemPath,
        item: Item,
    },
    ReplaceLayout {
        layout: Layout,
    },

    // stash
    AddToStash {
        stash_identifier: StashId,
        items: Vec<Item>,
    },
    ConsumeStash {
        stash_identifier: StashId,
    },
    ReplaceStash {
        stash: Stash,
    },

    // insights and executions
    AddInsights {
        insights: Vec<Insight>,
    },
    SetExecution {
        widget_ref: ObjRef,
        result: ResultHandle,
    },

    // filters
    SetDateFilter {
        filter: Option<DashboardDateFilter>,
    },
    AddAttributeFilter {
        index: usize,
        filter: DashboardAttributeFilter,
    },
    RemoveAttributeFilter {
        local_id: String,
    },
    MoveAttributeFilter {
        local_id: String,
        index: usize,
    },
    UpdateAttributeFilter {
        filter: DashboardAttributeFilter,
    },
    ReplaceFilterContext {
        filter_context: FilterContext,
    },

    // dashboard
    SetTitle {
        title: String,
    },
    /// Replace the whole dashboard and drop stash and executions
    ReplaceDashboard {
        dashboard: Dashboard,
    },
    SetPersisted {
        dashboard: Dashboard,
    },
    /// Adopt the version returned by the backend after a save
    ApplySaved {
        dashboard: Dashboard,
    },
}

impl Action {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddSection { .. } => "addSection",
            Action::RemoveSection { .. } => "removeSection",
            Action::MoveSection { .. } => "moveSection",
            Action::ChangeSectionHeader { .. } => "changeSectionHeader",
            Action::AddItems { .. } => "addItems",
            Action::RemoveItem { .. } => "removeItem",
            Action::ReplaceItem { .. } => "replaceItem",
            Action::ReplaceLayout { .. } => "replaceLayout",
            Action::AddToStash { .. } => "addToStash",
            Action::ConsumeStash { .. } => "consumeStash",
            Action::ReplaceStash { .. } => "replaceStash",
            Action::AddInsights { .. } => "addInsights",
            Action::SetExecution { .. } => "setExecution",
            Action::SetDateFilter { .. } => "setDateFilter",
            Action::AddAttributeFilter { .. } => "addAttributeFilter",
            Action::RemoveAttributeFilter { .. } => "removeAttributeFilter",
            Action::MoveAttributeFilter { .. } => "moveAttributeFilter",
            Action::UpdateAttributeFilter { .. } => "updateAttributeFilter",
            Action::ReplaceFilterContext { .. } => "replaceFilterContext",
            Action::SetTitle { .. } => "setTitle",
            Action::ReplaceDashboard { .. } => "replaceDashboard",
            Action::SetPersisted { .. } => "setPersisted",
            Action::ApplySaved { .. } => "applySaved",
        }
    }
}
