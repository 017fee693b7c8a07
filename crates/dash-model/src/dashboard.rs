//! Dashboard aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filters::FilterContext;
use crate::layout::Layout;
use crate::refs::ObjRef;
use crate::widget::Widget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShareStatus {
    #[default]
    Private,
    Shared,
    Public,
}

/// Root aggregate persisted by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Absent until the dashboard is saved for the first time
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub dashboard_ref: Option<ObjRef>,

    #[serde(default)]
    pub identifier: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub layout: Layout,

    #[serde(default)]
    pub filter_context: FilterContext,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,

    #[serde(default)]
    pub is_locked: bool,

    #[serde(default)]
    pub share_status: ShareStatus,
}

impl Dashboard {
    /// Empty, never saved dashboard
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            dashboard_ref: None,
            identifier: String::new(),
            title: title.into(),
            description: String::new(),
            layout: Layout::default(),
            filter_context: FilterContext::default(),
            created: now,
            updated: now,
            is_locked: false,
            share_status: ShareStatus::Private,
        }
    }

    /// Widgets whose identity was assigned locally and not yet persisted
    pub fn temporary_widgets(&self) -> Vec<&Widget> {
        self.layout
            .widgets()
            .into_iter()
            .filter(|w| w.widget_ref().map_or(true, ObjRef::is_temporary))
            .collect()
    }
}
