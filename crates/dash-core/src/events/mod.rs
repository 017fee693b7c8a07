//! Events emitted by the dashboard runtime
//!
//! Every command terminates in exactly one event: a type-specific success event, a
//! `COMMAND.FAILED` event carrying a [`FailureReason`], or `COMMAND.CANCELLED`.

pub mod bus;

use dash_backend::ResultHandle;
use dash_model::{
    ContainerDirection, Dashboard, DashboardAttributeFilter, DashboardDateFilter, DrillDefinition, FilterContext, Item,
    Layout, LayoutItemPath, ObjRef, Section, SectionHeader, StashId,
};
use serde::{Deserialize, Serialize};

use crate::error::{CommandError, FailureReason};

pub use bus::{handler_from_fn, ClosureEventHandler, EventBus, EventHandler, SubscriptionId};

macro_rules! event_payloads {
    ($(
        $(#[$meta:meta])*
        $variant:ident { $($field:ident : $ty:ty),* $(,)? } => $tag:tt
    ),* $(,)?) => {
        /// Closed set of events, tagged by type string
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "payload")]
        pub enum EventPayload {
            $(
                $(#[$meta])*
                #[serde(rename = $tag, rename_all = "camelCase")]
                $variant { $($field: $ty),* },
            )*
        }

        impl EventPayload {
            /// Wire type string of the event
            pub fn event_type(&self) -> &'static str {
                match self {
                    $( EventPayload::$variant { .. } => $tag, )*
                }
            }
        }
    };
}

event_payloads! {
    LayoutSectionAdded { section: Section, index: usize } => "DASH/EVT.FLUID_LAYOUT.SECTION_ADDED",
    LayoutSectionMoved { section: Section, from_index: usize, to_index: usize } => "DASH/EVT.FLUID_LAYOUT.SECTION_MOVED",
    LayoutSectionRemoved {
        section: Section,
        index: usize,
        stash_identifier: Option<StashId>,
    } => "DASH/EVT.FLUID_LAYOUT.SECTION_REMOVED",
    LayoutSectionHeaderChanged { index: usize, header: SectionHeader } => "DASH/EVT.FLUID_LAYOUT.SECTION_HEADER_CHANGED",
    LayoutSectionItemsAdded {
        section_index: usize,
        start_index: usize,
        items_added: Vec<Item>,
        stashes_used: Vec<StashId>,
    } => "DASH/EVT.FLUID_LAYOUT.ITEMS_ADDED",
    LayoutSectionItemMoved {
        item: Item,
        from_section_index: usize,
        to_section_index: usize,
        from_index: usize,
        to_index: usize,
    } => "DASH/EVT.FLUID_LAYOUT.ITEM_MOVED",
    /// The source section survives even when it became empty unless `section_removed` is set
    LayoutSectionItemMovedToNewSection {
        item: Item,
        from_section_index: usize,
        from_index: usize,
        to_section_index: usize,
        section_removed: bool,
    } => "DASH/EVT.FLUID_LAYOUT.ITEM_MOVED_TO_NEW_SECTION",
    LayoutSectionItemRemoved {
        item: Item,
        section_index: usize,
        item_index: usize,
        section_removed: bool,
        stash_identifier: Option<StashId>,
    } => "DASH/EVT.FLUID_LAYOUT.ITEM_REMOVED",
    LayoutSectionItemReplaced {
        path: LayoutItemPath,
        items: Vec<Item>,
        previous_item: Item,
        stash_identifier: Option<StashId>,
        stashes_used: Vec<StashId>,
        resized_containers: Vec<LayoutItemPath>,
    } => "DASH/EVT.FLUID_LAYOUT.ITEM_REPLACED",
    LayoutSectionItemsHeightResized {
        section_index: usize,
        item_indexes: Vec<usize>,
        new_height: u32,
    } => "DASH/EVT.FLUID_LAYOUT.ITEMS_HEIGHT_RESIZED",
    LayoutSectionItemWidthResized { path: LayoutItemPath, new_width: u32 } => "DASH/EVT.FLUID_LAYOUT.ITEM_WIDTH_RESIZED",
    LayoutSectionHeadersToggled { path: LayoutItemPath, enabled: bool } => "DASH/EVT.FLUID_LAYOUT.SECTION_HEADERS_TOGGLED",
    LayoutDirectionChanged { path: LayoutItemPath, direction: ContainerDirection } => "DASH/EVT.FLUID_LAYOUT.DIRECTION_CHANGED",
    /// Full layout after undo or redo
    LayoutChanged { layout: Layout, commands: usize } => "DASH/EVT.FLUID_LAYOUT.LAYOUT_CHANGED",

    WidgetHeaderChanged { widget_ref: ObjRef, title: String } => "DASH/EVT.WIDGET.HEADER_CHANGED",
    WidgetDescriptionChanged { widget_ref: ObjRef, description: String } => "DASH/EVT.WIDGET.DESCRIPTION_CHANGED",
    RichTextContentChanged { widget_ref: ObjRef, content: String } => "DASH/EVT.RICH_TEXT_WIDGET.CONTENT_CHANGED",
    InsightWidgetDrillsModified {
        widget_ref: ObjRef,
        added: Vec<DrillDefinition>,
        updated: Vec<DrillDefinition>,
    } => "DASH/EVT.INSIGHT_WIDGET.DRILLS_MODIFIED",
    InsightWidgetDrillsRemoved { widget_ref: ObjRef, removed: Vec<DrillDefinition> } => "DASH/EVT.INSIGHT_WIDGET.DRILLS_REMOVED",
    InsightWidgetRefreshed { widget_ref: ObjRef, result: ResultHandle } => "DASH/EVT.INSIGHT_WIDGET.REFRESHED",
    /// Filter settings after the change; ignored filters are the ones currently in the filter context
    InsightWidgetFilterSettingsChanged {
        widget_ref: ObjRef,
        ignored_attribute_filters: Vec<DashboardAttributeFilter>,
        date_data_set: Option<ObjRef>,
    } => "DASH/EVT.INSIGHT_WIDGET.FILTER_SETTINGS_CHANGED",
    KpiWidgetFilterSettingsChanged {
        widget_ref: ObjRef,
        ignored_attribute_filters: Vec<DashboardAttributeFilter>,
        date_data_set: Option<ObjRef>,
    } => "DASH/EVT.KPI_WIDGET.FILTER_SETTINGS_CHANGED",

    DateFilterSelectionChanged { filter: DashboardDateFilter } => "DASH/EVT.FILTER_CONTEXT.DATE_FILTER.SELECTION_CHANGED",
    AttributeFilterAdded { filter: DashboardAttributeFilter, index: usize } => "DASH/EVT.FILTER_CONTEXT.ATTRIBUTE_FILTER.ADDED",
    AttributeFilterRemoved {
        removed: Vec<DashboardAttributeFilter>,
        children_updated: Vec<String>,
    } => "DASH/EVT.FILTER_CONTEXT.ATTRIBUTE_FILTER.REMOVED",
    AttributeFilterMoved {
        filter_local_id: String,
        from_index: usize,
        to_index: usize,
    } => "DASH/EVT.FILTER_CONTEXT.ATTRIBUTE_FILTER.MOVED",
    AttributeFilterSelectionChanged { filter: DashboardAttributeFilter } => "DASH/EVT.FILTER_CONTEXT.ATTRIBUTE_FILTER.SELECTION_CHANGED",
    AttributeFilterParentChanged { filter: DashboardAttributeFilter } => "DASH/EVT.FILTER_CONTEXT.ATTRIBUTE_FILTER.PARENT_CHANGED",
    FilterContextChanged { filter_context: FilterContext } => "DASH/EVT.FILTER_CONTEXT.CHANGED",

    DashboardLoaded { dashboard: Dashboard } => "DASH/EVT.LOADED",
    DashboardSaved { dashboard_ref: ObjRef, new_dashboard: bool } => "DASH/EVT.SAVED",
    DashboardRenamed { title: String } => "DASH/EVT.RENAMED",
    DashboardWasReset { dashboard: Dashboard } => "DASH/EVT.RESET",

    CommandFailed {
        reason: FailureReason,
        message: String,
        command_type: String,
    } => "DASH/EVT.COMMAND.FAILED",
    CommandCancelled { command_type: String } => "DASH/EVT.COMMAND.CANCELLED",
}

impl EventPayload {
    /// Terminal event for a command that did not succeed
    pub fn from_error(error: &CommandError, command_type: &str) -> Self {
        match error.reason() {
            Some(reason) => EventPayload::CommandFailed {
                reason,
                message: error.to_string(),
                command_type: command_type.to_string(),
            },
            None => EventPayload::CommandCancelled {
                command_type: command_type.to_string(),
            },
        }
    }
}

/// Event value object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEvent {
    #[serde(default)]
    pub correlation_id: Option<String>,

    #[serde(flatten)]
    pub payload: EventPayload,
}

impl DashboardEvent {
    pub fn new(correlation_id: Option<String>, payload: EventPayload) -> Self {
        Self {
            correlation_id,
            payload,
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    /// Failure reason for `COMMAND.FAILED` events
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match &self.payload {
            EventPayload::CommandFailed { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.payload, EventPayload::CommandCancelled { .. })
    }

    /// Neither failed nor cancelled
    pub fn is_success(&self) -> bool {
        self.failure_reason().is_none() && !self.is_cancelled()
    }
}
