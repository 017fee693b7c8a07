//! Saved insights

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::refs::ObjRef;

/// Insights keyed by their reference
pub type InsightMap = AHashMap<ObjRef, Insight>;

/// Saved visualization definition, independent of any dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(rename = "ref")]
    pub insight_ref: ObjRef,

    pub title: String,

    /// Visualization type such as `table`, `bar` or `headline`
    pub visualization_type: String,

    /// Local identifiers of the measures in the insight buckets
    #[serde(default)]
    pub measures: Vec<String>,

    /// Display forms of the attributes in the insight buckets
    #[serde(default)]
    pub attributes: Vec<ObjRef>,

    /// Date data sets the insight can be filtered by, most relevant first
    #[serde(default)]
    pub date_data_sets: Vec<ObjRef>,
}

impl Insight {
    pub fn new(insight_ref: ObjRef, title: impl Into<String>, visualization_type: impl Into<String>) -> Self {
        Self {
            insight_ref,
            title: title.into(),
            visualization_type: visualization_type.into(),
            measures: Vec::new(),
            attributes: Vec::new(),
            date_data_sets: Vec::new(),
        }
    }

    /// Date data set to use when none was picked explicitly
    pub fn preferred_date_data_set(&self) -> Option<&ObjRef> {
        self.date_data_sets.first()
    }
}
