//! Commands accepted by the dashboard runtime
//!
//! A command is an immutable value: a [`CommandPayload`] discriminated by its type string plus an
//! optional caller correlation id. On the wire it is a JSON object
//! `{ "type": "DASH/CMD...", "payload": { ... }, "correlationId": "..." }`.

pub mod dashboard;
pub mod filters;
pub mod layout;
pub mod widgets;

use serde::{Deserialize, Serialize};

pub use dashboard::{LoadDashboard, RenameDashboard, ResetDashboard, SaveDashboard};
pub use filters::{
    AddAttributeFilter, ChangeAttributeFilterSelection, ChangeDateFilterSelection, ChangeFilterContextSelection,
    FilterSelection, MoveAttributeFilter, RemoveAttributeFilters, SelectionType, SetAttributeFilterParents,
};
pub use layout::{
    AddLayoutSection, AddSectionItems, ChangeLayoutDirection, ChangeLayoutSectionHeader, ItemTarget,
    MoveLayoutSection, MoveSectionItem, MoveSectionItemToNewSection, MoveSectionItemToNewSectionAndRemoveEmpty,
    RedoLayoutChanges, RemoveLayoutSection, RemoveSectionItem, RemoveSectionItemByWidgetRef, ReplaceSectionItem,
    ResizeHeight, ResizeWidth, StashableItem, ToggleLayoutSectionHeaders, UndoLayoutChanges, UndoPoint,
};
pub use widgets::{
    ChangeInsightWidgetFilterSettings, ChangeKpiWidgetFilterSettings, ChangeRichTextContent, ChangeWidgetDescription,
    ChangeWidgetHeader, DrillSelector, FilterSettingsOperation, ModifyDrillsForInsightWidget, RefreshInsightWidget,
    RemoveDrillsForInsightWidget,
};

/// Index value meaning "at the end"
pub const APPEND: i64 = -1;

pub(crate) fn append_index() -> i64 {
    APPEND
}

macro_rules! command_payloads {
    ($($variant:ident => $tag:tt),* $(,)?) => {
        /// Closed set of commands, tagged by type string
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "payload")]
        pub enum CommandPayload {
            $(
                #[serde(rename = $tag)]
                $variant($variant),
            )*
        }

        impl CommandPayload {
            /// Wire type string of the command
            pub fn command_type(&self) -> &'static str {
                match self {
                    $( CommandPayload::$variant(_) => $tag, )*
                }
            }
        }

        $(
            impl From<$variant> for CommandPayload {
                fn from(payload: $variant) -> Self {
                    CommandPayload::$variant(payload)
                }
            }
        )*
    };
}

command_payloads! {
    AddLayoutSection => "DASH/CMD.FLUID_LAYOUT.ADD_SECTION",
    MoveLayoutSection => "DASH/CMD.FLUID_LAYOUT.MOVE_SECTION",
    RemoveLayoutSection => "DASH/CMD.FLUID_LAYOUT.REMOVE_SECTION",
    ChangeLayoutSectionHeader => "DASH/CMD.FLUID_LAYOUT.CHANGE_SECTION_HEADER",
    AddSectionItems => "DASH/CMD.FLUID_LAYOUT.ADD_ITEMS",
    MoveSectionItem => "DASH/CMD.FLUID_LAYOUT.MOVE_ITEM",
    MoveSectionItemToNewSection => "DASH/CMD.FLUID_LAYOUT.MOVE_ITEM_TO_NEW_SECTION",
    MoveSectionItemToNewSectionAndRemoveEmpty => "DASH/CMD.FLUID_LAYOUT.MOVE_ITEM_TO_NEW_SECTION_AND_REMOVE_EMPTY",
    RemoveSectionItem => "DASH/CMD.FLUID_LAYOUT.REMOVE_ITEM",
    RemoveSectionItemByWidgetRef => "DASH/CMD.FLUID_LAYOUT.REMOVE_ITEM_BY_WIDGET_REF",
    ReplaceSectionItem => "DASH/CMD.FLUID_LAYOUT.REPLACE_ITEM",
    ResizeHeight => "DASH/CMD.FLUID_LAYOUT.RESIZE_HEIGHT",
    ResizeWidth => "DASH/CMD.FLUID_LAYOUT.RESIZE_WIDTH",
    ToggleLayoutSectionHeaders => "DASH/CMD.FLUID_LAYOUT.TOGGLE_SECTION_HEADERS",
    ChangeLayoutDirection => "DASH/CMD.FLUID_LAYOUT.CHANGE_DIRECTION",
    UndoLayoutChanges => "DASH/CMD.FLUID_LAYOUT.UNDO",
    RedoLayoutChanges => "DASH/CMD.FLUID_LAYOUT.REDO",
    ChangeWidgetHeader => "DASH/CMD.WIDGET.CHANGE_HEADER",
    ChangeWidgetDescription => "DASH/CMD.WIDGET.CHANGE_DESCRIPTION",
    ChangeRichTextContent => "DASH/CMD.RICH_TEXT_WIDGET.CHANGE_CONTENT",
    ModifyDrillsForInsightWidget => "DASH/CMD.INSIGHT_WIDGET.MODIFY_DRILLS",
    RemoveDrillsForInsightWidget => "DASH/CMD.INSIGHT_WIDGET.REMOVE_DRILLS",
    RefreshInsightWidget => "DASH/CMD.INSIGHT_WIDGET.REFRESH",
    ChangeInsightWidgetFilterSettings => "DASH/CMD.INSIGHT_WIDGET.CHANGE_FILTER_SETTINGS",
    ChangeKpiWidgetFilterSettings => "DASH/CMD.KPI_WIDGET.CHANGE_FILTER_SETTINGS",
    ChangeDateFilterSelection => "DASH/CMD.FILTER_CONTEXT.DATE_FILTER.CHANGE_SELECTION",
    AddAttributeFilter => "DASH/CMD.FILTER_CONTEXT.ATTRIBUTE_FILTER.ADD",
    RemoveAttributeFilters => "DASH/CMD.FILTER_CONTEXT.ATTRIBUTE_FILTER.REMOVE",
    MoveAttributeFilter => "DASH/CMD.FILTER_CONTEXT.ATTRIBUTE_FILTER.MOVE",
    ChangeAttributeFilterSelection => "DASH/CMD.FILTER_CONTEXT.ATTRIBUTE_FILTER.CHANGE_SELECTION",
    SetAttributeFilterParents => "DASH/CMD.FILTER_CONTEXT.ATTRIBUTE_FILTER.SET_PARENTS",
    ChangeFilterContextSelection => "DASH/CMD.FILTER_CONTEXT.CHANGE_SELECTION",
    LoadDashboard => "DASH/CMD.LOAD",
    SaveDashboard => "DASH/CMD.SAVE",
    RenameDashboard => "DASH/CMD.RENAME",
    ResetDashboard => "DASH/CMD.RESET",
}

impl CommandPayload {
    /// Whether a successful run records an undo point
    pub fn is_undoable(&self) -> bool {
        use CommandPayload::*;
        matches!(
            self,
            AddLayoutSection(_)
                | MoveLayoutSection(_)
                | RemoveLayoutSection(_)
                | ChangeLayoutSectionHeader(_)
                | AddSectionItems(_)
                | MoveSectionItem(_)
                | MoveSectionItemToNewSection(_)
                | MoveSectionItemToNewSectionAndRemoveEmpty(_)
                | RemoveSectionItem(_)
                | RemoveSectionItemByWidgetRef(_)
                | ReplaceSectionItem(_)
                | ResizeHeight(_)
                | ResizeWidth(_)
                | ToggleLayoutSectionHeaders(_)
                | ChangeLayoutDirection(_)
                | ChangeWidgetHeader(_)
                | ChangeWidgetDescription(_)
                | ChangeRichTextContent(_)
                | ModifyDrillsForInsightWidget(_)
                | RemoveDrillsForInsightWidget(_)
                | ChangeInsightWidgetFilterSettings(_)
                | ChangeKpiWidgetFilterSettings(_)
        )
    }

    /// Key shared by commands where a newer one makes older ones pointless
    pub fn supersede_key(&self) -> Option<String> {
        match self {
            CommandPayload::ChangeAttributeFilterSelection(c) => {
                Some(format!("attributeFilterSelection:{}", c.filter_local_id))
            }
            CommandPayload::ChangeDateFilterSelection(_) => Some("dateFilterSelection".to_string()),
            CommandPayload::RefreshInsightWidget(c) => Some(format!("refreshInsightWidget:{}", c.widget_ref)),
            _ => None,
        }
    }
}

/// Command value object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    #[serde(flatten)]
    pub payload: CommandPayload,
}

impl Command {
    pub fn new(payload: impl Into<CommandPayload>) -> Self {
        Self {
            correlation_id: None,
            payload: payload.into(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn command_type(&self) -> &'static str {
        self.payload.command_type()
    }
}
