//! Widget commands

use dash_model::{DrillDefinition, ObjRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeWidgetHeader {
    pub widget_ref: ObjRef,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeWidgetDescription {
    pub widget_ref: ObjRef,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRichTextContent {
    pub widget_ref: ObjRef,
    pub content: String,
}

/// Add drills, or replace existing drills with the same origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyDrillsForInsightWidget {
    pub widget_ref: ObjRef,
    pub drills: Vec<DrillDefinition>,
}

/// Which drills to remove
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrillSelector {
    All,
    Origins(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveDrillsForInsightWidget {
    pub widget_ref: ObjRef,
    pub origins: DrillSelector,
}

/// Execute the widget's insight under the current filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshInsightWidget {
    pub widget_ref: ObjRef,
}

/// How a widget's filter settings change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum FilterSettingsOperation {
    /// Set both the date data set and the ignored attribute filters; unlisted ignores are dropped
    #[serde(rename_all = "camelCase")]
    Replace {
        date_data_set: Option<ObjRef>,
        ignore_attribute_filters: Vec<ObjRef>,
    },
    #[serde(rename_all = "camelCase")]
    EnableDateFilter { date_data_set: ObjRef },
    DisableDateFilter,
    #[serde(rename_all = "camelCase")]
    ReplaceAttributeIgnores { display_forms: Vec<ObjRef> },
    #[serde(rename_all = "camelCase")]
    IgnoreAttributeFilter { display_forms: Vec<ObjRef> },
    #[serde(rename_all = "camelCase")]
    UnignoreAttributeFilter { display_forms: Vec<ObjRef> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeInsightWidgetFilterSettings {
    pub widget_ref: ObjRef,
    pub operation: FilterSettingsOperation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeKpiWidgetFilterSettings {
    pub widget_ref: ObjRef,
    pub operation: FilterSettingsOperation,
}
