//! In-memory backend
//!
//! Serves insights, display forms and dashboards from a [`Catalog`]. Latency and failures can be
//! injected per [`Operation`], and every call is recorded so tests can assert on traffic.

use std::time::Duration;

use ahash::AHashMap;
use async_trait::async_trait;
use chrono::Utc;
use dash_model::{Dashboard, Insight, ObjRef};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::gateway::{BackendCapabilities, BackendGateway, DisplayForm, ExecutionDefinition, ResultHandle};
use crate::{BackendError, BackendResult};

/// Gateway operations, used to key latency, failures and the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    ExecuteQuery,
    QueryCommonAttributes,
    ResolveInsight,
    ResolveDisplayForms,
    DateDataSets,
    LoadDashboard,
    SaveDashboard,
}

/// Metadata served by the in-memory backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Catalog {
    pub insights: Vec<Insight>,
    pub display_forms: Vec<DisplayForm>,
    /// Attributes reachable from a display form, beyond its own attribute
    pub connections: Vec<Connection>,
    /// Date data sets besides those referenced by insights
    pub date_data_sets: Vec<ObjRef>,
    pub dashboards: Vec<Dashboard>,
    pub capabilities: BackendCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub display_form: ObjRef,
    pub attributes: Vec<ObjRef>,
}

#[derive(Default)]
struct Store {
    insights: AHashMap<ObjRef, Insight>,
    display_forms: AHashMap<ObjRef, DisplayForm>,
    connections: AHashMap<ObjRef, Vec<ObjRef>>,
    date_data_sets: Vec<ObjRef>,
    dashboards: AHashMap<ObjRef, Dashboard>,
}

/// Reference backend keeping everything in process
pub struct InMemoryBackend {
    store: RwLock<Store>,
    capabilities: RwLock<BackendCapabilities>,
    latency: RwLock<AHashMap<Operation, Duration>>,
    failures: Mutex<AHashMap<Operation, BackendError>>,
    calls: Mutex<Vec<Operation>>,
    executions: Mutex<u64>,
}

impl InMemoryBackend {
    /// Create an empty backend with every capability enabled
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
            capabilities: RwLock::new(BackendCapabilities::default()),
            latency: RwLock::new(AHashMap::new()),
            failures: Mutex::new(AHashMap::new()),
            calls: Mutex::new(Vec::new()),
            executions: Mutex::new(0),
        }
    }

    /// Create a backend serving the given catalog
    pub fn from_catalog(catalog: Catalog) -> Self {
        let backend = Self::new();
        *backend.capabilities.write() = catalog.capabilities;
        {
            let mut store = backend.store.write();
            for insight in catalog.insights {
                store.insights.insert(insight.insight_ref.clone(), insight);
            }
            for df in catalog.display_forms {
                store.display_forms.insert(df.display_form_ref.clone(), df);
            }
            for connection in catalog.connections {
                store.connections.insert(connection.display_form, connection.attributes);
            }
            store.date_data_sets = catalog.date_data_sets;
            for dashboard in catalog.dashboards {
                if let Some(r) = dashboard.dashboard_ref.clone() {
                    store.dashboards.insert(r, dashboard);
                }
            }
        }
        backend
    }

    pub fn with_insight(self, insight: Insight) -> Self {
        self.store.write().insights.insert(insight.insight_ref.clone(), insight);
        self
    }

    pub fn with_display_form(self, display_form: ObjRef, attribute: ObjRef, title: impl Into<String>) -> Self {
        self.store.write().display_forms.insert(
            display_form.clone(),
            DisplayForm {
                display_form_ref: display_form,
                attribute,
                title: title.into(),
            },
        );
        self
    }

    /// Declare extra attributes reachable from a display form
    pub fn with_connection(self, display_form: ObjRef, attributes: Vec<ObjRef>) -> Self {
        self.store.write().connections.insert(display_form, attributes);
        self
    }

    pub fn with_date_data_set(self, data_set: ObjRef) -> Self {
        self.store.write().date_data_sets.push(data_set);
        self
    }

    pub fn with_dashboard(self, dashboard: Dashboard) -> Self {
        if let Some(r) = dashboard.dashboard_ref.clone() {
            self.store.write().dashboards.insert(r, dashboard);
        }
        self
    }

    pub fn with_capabilities(self, capabilities: BackendCapabilities) -> Self {
        *self.capabilities.write() = capabilities;
        self
    }

    pub fn with_latency(self, operation: Operation, latency: Duration) -> Self {
        self.set_latency(operation, latency);
        self
    }

    pub fn set_latency(&self, operation: Operation, latency: Duration) {
        self.latency.write().insert(operation, latency);
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: Operation, error: BackendError) {
        self.failures.lock().insert(operation, error);
    }

    /// Operations called so far, in call order
    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls.lock().iter().filter(|op| **op == operation).count()
    }

    /// Stored version of a dashboard
    pub fn stored_dashboard(&self, dashboard: &ObjRef) -> Option<Dashboard> {
        self.store.read().dashboards.get(dashboard).cloned()
    }

    /// Record the call, apply latency and injected failures
    async fn simulate(&self, operation: Operation, abort: &CancellationToken) -> BackendResult<()> {
        self.calls.lock().push(operation);
        tracing::debug!("In-memory backend call: {:?}", operation);

        if abort.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let latency = self.latency.read().get(&operation).copied();
        if let Some(latency) = latency {
            tokio::select! {
                _ = abort.cancelled() => return Err(BackendError::Cancelled),
                _ = tokio::time::sleep(latency) => {}
            }
        }

        match self.failures.lock().remove(&operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn attributes_reachable_from(&self, display_form: &ObjRef) -> Vec<ObjRef> {
        let store = self.store.read();
        let mut attributes = Vec::new();
        if let Some(df) = store.display_forms.get(display_form) {
            attributes.push(df.attribute.clone());
        }
        if let Some(extra) = store.connections.get(display_form) {
            for attribute in extra {
                if !attributes.contains(attribute) {
                    attributes.push(attribute.clone());
                }
            }
        }
        attributes
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendGateway for InMemoryBackend {
    fn capabilities(&self) -> BackendCapabilities {
        *self.capabilities.read()
    }

    async fn execute_query(
        &self,
        definition: &ExecutionDefinition,
        abort: &CancellationToken,
    ) -> BackendResult<ResultHandle> {
        if !self.capabilities().supports_execution {
            return Err(BackendError::NotSupported("execute_query".to_string()));
        }
        self.simulate(Operation::ExecuteQuery, abort).await?;

        let execution = {
            let mut executions = self.executions.lock();
            *executions += 1;
            *executions
        };
        Ok(ResultHandle {
            execution_id: format!("exec-{}", execution),
            insight: definition.insight.clone(),
        })
    }

    async fn query_common_attributes(
        &self,
        display_forms: &[ObjRef],
        abort: &CancellationToken,
    ) -> BackendResult<Vec<ObjRef>> {
        if !self.capabilities().supports_connecting_attributes {
            return Err(BackendError::NotSupported("query_common_attributes".to_string()));
        }
        self.simulate(Operation::QueryCommonAttributes, abort).await?;

        let mut reachable = display_forms.iter().map(|df| self.attributes_reachable_from(df));
        let Some(mut common) = reachable.next() else {
            return Ok(Vec::new());
        };
        for attributes in reachable {
            common.retain(|a| attributes.contains(a));
        }
        Ok(common)
    }

    async fn resolve_insight(&self, insight: &ObjRef, abort: &CancellationToken) -> BackendResult<Insight> {
        self.simulate(Operation::ResolveInsight, abort).await?;
        self.store
            .read()
            .insights
            .get(insight)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(insight.to_string()))
    }

    async fn resolve_display_forms(
        &self,
        display_forms: &[ObjRef],
        abort: &CancellationToken,
    ) -> BackendResult<Vec<DisplayForm>> {
        self.simulate(Operation::ResolveDisplayForms, abort).await?;
        let store = self.store.read();
        Ok(display_forms
            .iter()
            .filter_map(|r| store.display_forms.get(r).cloned())
            .collect())
    }

    async fn date_datasets_for_insight(
        &self,
        insight: &Insight,
        abort: &CancellationToken,
    ) -> BackendResult<Vec<ObjRef>> {
        self.simulate(Operation::DateDataSets, abort).await?;
        Ok(insight.date_data_sets.clone())
    }

    async fn catalog_date_datasets(&self, abort: &CancellationToken) -> BackendResult<Vec<ObjRef>> {
        self.simulate(Operation::DateDataSets, abort).await?;
        let store = self.store.read();
        let mut data_sets = store.date_data_sets.clone();
        for data_set in store.insights.values().flat_map(|i| i.date_data_sets.iter()) {
            if !data_sets.contains(data_set) {
                data_sets.push(data_set.clone());
            }
        }
        Ok(data_sets)
    }

    async fn load_dashboard(&self, dashboard: &ObjRef, abort: &CancellationToken) -> BackendResult<Dashboard> {
        self.simulate(Operation::LoadDashboard, abort).await?;
        self.stored_dashboard(dashboard)
            .ok_or_else(|| BackendError::NotFound(dashboard.to_string()))
    }

    async fn save_dashboard(&self, dashboard: &Dashboard, abort: &CancellationToken) -> BackendResult<Dashboard> {
        if !self.capabilities().supports_persistence {
            return Err(BackendError::NotSupported("save_dashboard".to_string()));
        }
        self.simulate(Operation::SaveDashboard, abort).await?;

        let mut saved = dashboard.clone();
        let dashboard_ref = saved
            .dashboard_ref
            .clone()
            .unwrap_or_else(|| ObjRef::identifier(format!("dashboard-{}", uuid::Uuid::new_v4().simple())));
        saved.dashboard_ref = Some(dashboard_ref.clone());
        if saved.identifier.is_empty() {
            saved.identifier = dashboard_ref.value().to_string();
        }
        saved.updated = Utc::now();
        saved.layout.for_each_widget_mut(|widget| {
            if widget.widget_ref().map_or(true, ObjRef::is_temporary) {
                widget.set_widget_ref(ObjRef::identifier(format!("widget-{}", uuid::Uuid::new_v4().simple())));
            }
        });

        tracing::info!("Saved dashboard {}", dashboard_ref);
        self.store.write().dashboards.insert(dashboard_ref, saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_model::{InsightWidget, Item, Layout, Section, Widget};

    fn region() -> ObjRef {
        ObjRef::identifier("label.region")
    }

    fn city() -> ObjRef {
        ObjRef::identifier("label.city")
    }

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new()
            .with_display_form(region(), ObjRef::identifier("attr.region"), "Region")
            .with_display_form(city(), ObjRef::identifier("attr.city"), "City")
            .with_connection(city(), vec![ObjRef::identifier("attr.region")])
            .with_insight(Insight::new(ObjRef::identifier("revenue"), "Revenue", "bar"))
    }

    #[tokio::test]
    async fn test_common_attributes_intersection() {
        let backend = backend();
        let abort = CancellationToken::new();

        let common = backend
            .query_common_attributes(&[region(), city()], &abort)
            .await
            .unwrap();
        assert_eq!(common, vec![ObjRef::identifier("attr.region")]);

        let none = backend
            .query_common_attributes(&[region(), ObjRef::identifier("label.unknown")], &abort)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_missing_capability_is_not_supported() {
        let backend = backend().with_capabilities(BackendCapabilities {
            supports_connecting_attributes: false,
            ..Default::default()
        });

        let result = backend
            .query_common_attributes(&[region()], &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(BackendError::NotSupported(_))));
        assert_eq!(backend.call_count(Operation::QueryCommonAttributes), 0);
    }

    #[tokio::test]
    async fn test_latency_respects_cancellation() {
        let backend = backend().with_latency(Operation::ResolveInsight, Duration::from_secs(30));
        let abort = CancellationToken::new();
        let trigger = abort.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = backend.resolve_insight(&ObjRef::identifier("revenue"), &abort).await;
        assert_eq!(result, Err(BackendError::Cancelled));
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let backend = backend();
        backend.fail_next(Operation::ResolveInsight, BackendError::Unavailable("maintenance".to_string()));
        let abort = CancellationToken::new();

        assert!(backend.resolve_insight(&ObjRef::identifier("revenue"), &abort).await.is_err());
        assert!(backend.resolve_insight(&ObjRef::identifier("revenue"), &abort).await.is_ok());
        assert_eq!(backend.calls(), vec![Operation::ResolveInsight, Operation::ResolveInsight]);
    }

    #[tokio::test]
    async fn test_catalog_date_datasets_include_insight_ones() {
        let mut insight = Insight::new(ObjRef::identifier("orders"), "Orders", "line");
        insight.date_data_sets = vec![ObjRef::identifier("dt.order"), ObjRef::identifier("dt.ship")];
        let backend = backend()
            .with_insight(insight)
            .with_date_data_set(ObjRef::identifier("dt.order"))
            .with_date_data_set(ObjRef::identifier("dt.invoice"));

        let data_sets = backend
            .catalog_date_datasets(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(data_sets.len(), 3);
        for id in ["dt.order", "dt.ship", "dt.invoice"] {
            assert!(data_sets.contains(&ObjRef::identifier(id)));
        }
        assert_eq!(backend.calls(), vec![Operation::DateDataSets]);
    }

    #[tokio::test]
    async fn test_save_assigns_permanent_identities() {
        let backend = backend();
        let mut dashboard = Dashboard::new("Sales");
        let mut widget = Widget::Insight(InsightWidget::new("Revenue", ObjRef::identifier("revenue")));
        widget.set_widget_ref(ObjRef::temporary());
        dashboard.layout = Layout::new(vec![Section::new(vec![Item::new(widget, 6)])]);

        let saved = backend
            .save_dashboard(&dashboard, &CancellationToken::new())
            .await
            .unwrap();

        assert!(saved.temporary_widgets().is_empty());
        let stored = backend.stored_dashboard(saved.dashboard_ref.as_ref().unwrap()).unwrap();
        assert_eq!(stored, saved);
    }
}
