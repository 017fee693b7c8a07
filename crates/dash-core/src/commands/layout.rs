//! Layout commands
//!
//! Indices typed `i64` accept [`super::APPEND`] (`-1`) to mean "at the end"; every other index
//! must address an existing position.

use dash_model::{ContainerDirection, Item, LayoutItemPath, ObjRef, SectionHeader, StashId};
use serde::{Deserialize, Serialize};

use crate::commands::append_index;

/// Item definition, or the identifier of a stash whose items should be used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StashableItem {
    Stash(StashId),
    Item(Box<Item>),
}

impl From<Item> for StashableItem {
    fn from(item: Item) -> Self {
        StashableItem::Item(Box::new(item))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLayoutSection {
    #[serde(default = "append_index")]
    pub index: i64,
    #[serde(default)]
    pub initial_header: Option<SectionHeader>,
    #[serde(default)]
    pub initial_items: Vec<StashableItem>,
    #[serde(default)]
    pub auto_resolve_date_filter_dataset: bool,
}

impl Default for AddLayoutSection {
    fn default() -> Self {
        Self {
            index: append_index(),
            initial_header: None,
            initial_items: Vec::new(),
            auto_resolve_date_filter_dataset: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveLayoutSection {
    pub section_index: usize,
    pub to_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLayoutSection {
    pub index: usize,
    #[serde(default)]
    pub stash_identifier: Option<StashId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLayoutSectionHeader {
    pub index: usize,
    pub header: SectionHeader,
    /// Keep fields of the current header that the new one leaves unset
    #[serde(default)]
    pub merge: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSectionItems {
    pub section_index: usize,
    #[serde(default = "append_index")]
    pub item_index: i64,
    pub items: Vec<StashableItem>,
    #[serde(default)]
    pub auto_resolve_date_filter_dataset: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSectionItem {
    pub section_index: usize,
    pub item_index: usize,
    pub to_section_index: usize,
    #[serde(default = "append_index")]
    pub to_item_index: i64,
}

/// Move an item into a new section created at `to_section_index`; the source section stays even
/// when it becomes empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSectionItemToNewSection {
    pub section_index: usize,
    pub item_index: usize,
    #[serde(default = "append_index")]
    pub to_section_index: i64,
}

/// Like [`MoveSectionItemToNewSection`], but the source section is removed when it becomes empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSectionItemToNewSectionAndRemoveEmpty {
    pub section_index: usize,
    pub item_index: usize,
    #[serde(default = "append_index")]
    pub to_section_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveSectionItem {
    pub section_index: usize,
    pub item_index: usize,
    #[serde(default)]
    pub stash_identifier: Option<StashId>,
    /// Remove the section as well when this was its last item
    #[serde(default)]
    pub eager: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveSectionItemByWidgetRef {
    pub widget_ref: ObjRef,
    #[serde(default)]
    pub stash_identifier: Option<StashId>,
}

/// Location of an item to replace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemTarget {
    #[serde(rename_all = "camelCase")]
    Legacy { section_index: usize, item_index: usize },
    Path(LayoutItemPath),
}

impl ItemTarget {
    pub fn to_path(&self) -> LayoutItemPath {
        match self {
            ItemTarget::Legacy {
                section_index,
                item_index,
            } => LayoutItemPath::top_level(*section_index, *item_index),
            ItemTarget::Path(path) => path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSectionItem {
    pub target: ItemTarget,
    pub item: StashableItem,
    /// Stash receiving the displaced item; without it the displaced item is dropped
    #[serde(default)]
    pub stash_identifier: Option<StashId>,
    #[serde(default)]
    pub auto_resolve_date_filter_dataset: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeHeight {
    pub section_index: usize,
    pub item_indexes: Vec<usize>,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeWidth {
    pub path: LayoutItemPath,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLayoutSectionHeaders {
    /// Path of the container item
    pub path: LayoutItemPath,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLayoutDirection {
    pub path: LayoutItemPath,
    pub direction: ContainerDirection,
}

/// How far back an undo goes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UndoPoint {
    /// The most recent undoable command
    #[default]
    Last,
    /// The `n` most recent undoable commands
    Count(usize),
    /// The run of most recent commands whose correlation id starts with the prefix
    CorrelationPrefix(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoLayoutChanges {
    #[serde(default)]
    pub undo_point: UndoPoint,
    #[serde(default = "redoable_by_default")]
    pub redoable: bool,
}

fn redoable_by_default() -> bool {
    true
}

impl Default for UndoLayoutChanges {
    fn default() -> Self {
        Self {
            undo_point: UndoPoint::Last,
            redoable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RedoLayoutChanges {}
