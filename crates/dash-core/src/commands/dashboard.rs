//! Dashboard lifecycle commands

use dash_model::ObjRef;
use serde::{Deserialize, Serialize};

/// Load a dashboard from the backend, replacing the current state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadDashboard {
    pub dashboard_ref: ObjRef,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SaveDashboard {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameDashboard {
    pub title: String,
}

/// Discard unsaved changes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResetDashboard {}
