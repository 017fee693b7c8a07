//! Gateway contract

use async_trait::async_trait;
use dash_model::{Dashboard, FilterContextItem, Insight, ObjRef};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::BackendResult;

/// Feature switches advertised by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendCapabilities {
    /// Backend can tell which attributes connect two display forms
    pub supports_connecting_attributes: bool,
    /// Backend can execute insight queries
    pub supports_execution: bool,
    /// Backend can store dashboards
    pub supports_persistence: bool,
}

impl Default for BackendCapabilities {
    fn default() -> Self {
        Self {
            supports_connecting_attributes: true,
            supports_execution: true,
            supports_persistence: true,
        }
    }
}

/// Attribute display form metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayForm {
    #[serde(rename = "ref")]
    pub display_form_ref: ObjRef,
    /// Attribute the display form belongs to
    pub attribute: ObjRef,
    pub title: String,
}

/// Opaque query definition handed to the execution layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDefinition {
    pub insight: ObjRef,
    pub measures: Vec<String>,
    pub attributes: Vec<ObjRef>,
    pub filters: Vec<FilterContextItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_data_set: Option<ObjRef>,
}

impl ExecutionDefinition {
    /// Definition executing `insight` under the given dashboard filters
    pub fn for_insight(insight: &Insight, filters: Vec<FilterContextItem>, date_data_set: Option<ObjRef>) -> Self {
        Self {
            insight: insight.insight_ref.clone(),
            measures: insight.measures.clone(),
            attributes: insight.attributes.clone(),
            filters,
            date_data_set,
        }
    }
}

/// Handle to a finished execution; the data itself stays with the execution layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultHandle {
    pub execution_id: String,
    pub insight: ObjRef,
}

/// Asynchronous backend contract consumed by command handlers
///
/// Every call takes the cancellation token of the command it runs for. Implementations must
/// return [`crate::BackendError::Cancelled`] once the token fires.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    fn capabilities(&self) -> BackendCapabilities;

    async fn execute_query(
        &self,
        definition: &ExecutionDefinition,
        abort: &CancellationToken,
    ) -> BackendResult<ResultHandle>;

    /// Attributes common to all of the given display forms
    async fn query_common_attributes(
        &self,
        display_forms: &[ObjRef],
        abort: &CancellationToken,
    ) -> BackendResult<Vec<ObjRef>>;

    async fn resolve_insight(&self, insight: &ObjRef, abort: &CancellationToken) -> BackendResult<Insight>;

    /// Resolve display forms; unknown refs are left out of the result
    async fn resolve_display_forms(
        &self,
        display_forms: &[ObjRef],
        abort: &CancellationToken,
    ) -> BackendResult<Vec<DisplayForm>>;

    /// Date data sets usable with the insight, most relevant first
    async fn date_datasets_for_insight(
        &self,
        insight: &Insight,
        abort: &CancellationToken,
    ) -> BackendResult<Vec<ObjRef>>;

    /// Every date data set in the workspace catalog
    async fn catalog_date_datasets(&self, abort: &CancellationToken) -> BackendResult<Vec<ObjRef>>;

    async fn load_dashboard(&self, dashboard: &ObjRef, abort: &CancellationToken) -> BackendResult<Dashboard>;

    /// Persist a dashboard and return the stored version with permanent identities
    async fn save_dashboard(&self, dashboard: &Dashboard, abort: &CancellationToken) -> BackendResult<Dashboard>;
}
