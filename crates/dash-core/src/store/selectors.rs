//! Selectors over state snapshots
//!
//! Plain selectors are functions of a [`DashboardState`]. Expensive ones are wrapped in
//! [`Memoized`], which caches the derived value per store revision.

use std::sync::Arc;

use ahash::AHashMap;
use dash_model::coordinates::find_item;
use dash_model::{DashboardAttributeFilter, Insight, InsightWidget, Item, LayoutItemPath, ObjRef, Widget};
use parking_lot::RwLock;

use crate::store::DashboardState;

/// Derived value cached for one revision
pub struct Memoized<T> {
    select: fn(&DashboardState) -> T,
    cached: RwLock<Option<(u64, Arc<T>)>>,
}

impl<T> Memoized<T> {
    pub fn new(select: fn(&DashboardState) -> T) -> Self {
        Self {
            select,
            cached: RwLock::new(None),
        }
    }

    /// Value for `state`, which must be the snapshot of `revision`
    pub fn get(&self, revision: u64, state: &DashboardState) -> Arc<T> {
        if let Some((cached_revision, value)) = &*self.cached.read() {
            if *cached_revision == revision {
                return value.clone();
            }
        }

        let value = Arc::new((self.select)(state));
        *self.cached.write() = Some((revision, value.clone()));
        value
    }

    pub fn clear(&self) {
        *self.cached.write() = None;
    }
}

/// Memoized selectors shared by handlers
pub struct Selectors {
    pub widget_paths: Memoized<AHashMap<ObjRef, LayoutItemPath>>,
}

impl Selectors {
    pub fn new() -> Self {
        Self {
            widget_paths: Memoized::new(select_widget_paths),
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Paths of all widgets with an identity
pub fn select_widget_paths(state: &DashboardState) -> AHashMap<ObjRef, LayoutItemPath> {
    let mut paths = AHashMap::new();
    state.layout().walk_items(|path, item| {
        if let Some(widget_ref) = item.widget.widget_ref() {
            paths.insert(widget_ref.clone(), path.clone());
        }
    });
    paths
}

pub fn select_item<'a>(state: &'a DashboardState, path: &LayoutItemPath) -> Option<&'a Item> {
    find_item(state.layout(), path).ok()
}

pub fn select_insight<'a>(state: &'a DashboardState, insight: &ObjRef) -> Option<&'a Insight> {
    state.insights.get(insight)
}

/// Insight widget definition, also looking into visualization switchers
pub fn select_insight_widget<'a>(state: &'a DashboardState, path: &LayoutItemPath) -> Option<&'a InsightWidget> {
    match &select_item(state, path)?.widget {
        Widget::Insight(w) => Some(w),
        Widget::VisualizationSwitcher(w) => w.visualizations.first(),
        _ => None,
    }
}

pub fn select_attribute_filter<'a>(state: &'a DashboardState, local_id: &str) -> Option<&'a DashboardAttributeFilter> {
    state.filter_context().attribute_filter(local_id)
}

/// Attribute filters that list `local_id` as a parent
pub fn select_children_of<'a>(state: &'a DashboardState, local_id: &str) -> Vec<&'a DashboardAttributeFilter> {
    state
        .filter_context()
        .attribute_filters()
        .filter(|f| f.parent_ids().any(|p| p == local_id))
        .collect()
}

/// Whether the dashboard differs from its last loaded or saved version
pub fn select_is_dirty(state: &DashboardState) -> bool {
    match &state.persisted {
        Some(persisted) => {
            persisted.layout != state.dashboard.layout
                || persisted.filter_context != state.dashboard.filter_context
                || persisted.title != state.dashboard.title
        }
        None => true,
    }
}
