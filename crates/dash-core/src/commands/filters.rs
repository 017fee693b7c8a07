//! Filter context commands

use dash_model::{AttributeElements, AttributeFilterParent, DashboardDateFilter, ObjRef, SelectionMode};
use serde::{Deserialize, Serialize};

use crate::commands::append_index;

/// Replace the date filter selection; an unbounded relative filter means "all time"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDateFilterSelection {
    pub selection: DashboardDateFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAttributeFilter {
    pub display_form: ObjRef,
    /// Position among attribute filters
    #[serde(default = "append_index")]
    pub index: i64,
    #[serde(default)]
    pub parent_filters: Vec<AttributeFilterParent>,
    #[serde(default)]
    pub initial_selection: Option<AttributeElements>,
    #[serde(default)]
    pub initial_is_negative_selection: bool,
    #[serde(default)]
    pub selection_mode: SelectionMode,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAttributeFilters {
    pub filter_local_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveAttributeFilter {
    pub filter_local_id: String,
    #[serde(default = "append_index")]
    pub index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionType {
    In,
    NotIn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAttributeFilterSelection {
    pub filter_local_id: String,
    pub elements: AttributeElements,
    pub selection_type: SelectionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAttributeFilterParents {
    pub filter_local_id: String,
    pub parent_filters: Vec<AttributeFilterParent>,
}

/// New selection for one filter of the context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterSelection {
    DateFilter(DashboardDateFilter),
    #[serde(rename_all = "camelCase")]
    AttributeFilter {
        display_form: ObjRef,
        attribute_elements: AttributeElements,
        #[serde(default)]
        negative_selection: bool,
    },
}

/// Apply several selections at once, matching attribute filters by display form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFilterContextSelection {
    pub filters: Vec<FilterSelection>,
    /// Reset filters not mentioned in `filters` to "all"
    #[serde(default)]
    pub reset_others: bool,
}
