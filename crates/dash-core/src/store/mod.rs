//! Dashboard state store
//!
//! The state is an immutable [`DashboardState`] snapshot behind an `Arc`. Readers clone the
//! `Arc`; the runtime replaces it by committing a batch of [`Action`]s. A batch applies to a
//! private copy and is swapped in only when every action succeeded, so nobody ever observes a
//! partially applied batch.

pub mod actions;
pub mod reducers;
pub mod selectors;

use std::sync::Arc;

use ahash::AHashMap;
use dash_backend::ResultHandle;
use dash_model::{Dashboard, FilterContext, InsightMap, Layout, ObjRef, Stash};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use crate::error::StoreError;

pub use actions::Action;
pub use selectors::{Memoized, Selectors};

/// Snapshot of everything the engine knows about the edited dashboard
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub dashboard: Dashboard,
    /// Items removed from the layout and kept for a later insert
    pub stash: Stash,
    /// Insights resolved so far
    pub insights: InsightMap,
    /// Last loaded or saved version, restored by a reset
    pub persisted: Option<Dashboard>,
    /// Latest execution result per insight widget
    pub executions: AHashMap<ObjRef, ResultHandle>,
}

impl DashboardState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard,
            stash: Stash::new(),
            insights: InsightMap::new(),
            persisted: None,
            executions: AHashMap::new(),
        }
    }

    /// State for a dashboard as it was loaded from storage
    pub fn loaded(dashboard: Dashboard) -> Self {
        Self {
            persisted: Some(dashboard.clone()),
            ..Self::new(dashboard)
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.dashboard.layout
    }

    pub fn filter_context(&self) -> &FilterContext {
        &self.dashboard.filter_context
    }
}

struct Versioned {
    revision: u64,
    state: Arc<DashboardState>,
}

/// Holder of the current state snapshot
pub struct Store {
    current: RwLock<Versioned>,
}

impl Store {
    pub fn new(state: DashboardState) -> Self {
        Self {
            current: RwLock::new(Versioned {
                revision: 0,
                state: Arc::new(state),
            }),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<DashboardState> {
        self.current.read().state.clone()
    }

    /// Current snapshot together with its revision
    pub fn versioned_snapshot(&self) -> (u64, Arc<DashboardState>) {
        let current = self.current.read();
        (current.revision, current.state.clone())
    }

    /// Revision number, incremented by every successful commit
    pub fn revision(&self) -> u64 {
        self.current.read().revision
    }

    /// Apply a batch atomically; returns the new revision
    ///
    /// On error nothing changes. An empty batch is a no-op and keeps the revision.
    pub fn commit(&self, actions: Vec<Action>) -> Result<u64, StoreError> {
        let guard = self.current.upgradable_read();
        if actions.is_empty() {
            return Ok(guard.revision);
        }

        let mut next = (*guard.state).clone();
        let count = actions.len();
        for action in actions {
            reducers::reduce(&mut next, action)?;
        }

        let mut current = RwLockUpgradableReadGuard::upgrade(guard);
        current.revision += 1;
        current.state = Arc::new(next);
        tracing::debug!("Committed {} actions, revision {}", count, current.revision);
        Ok(current.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_model::{Item, RichTextWidget, Section, Widget};

    fn store() -> Store {
        let mut dashboard = Dashboard::new("Test");
        dashboard.layout = Layout::new(vec![Section::new(vec![Item::new(
            Widget::RichText(RichTextWidget::new("a")),
            6,
        )])]);
        Store::new(DashboardState::new(dashboard))
    }

    #[test]
    fn test_commit_bumps_revision() {
        let store = store();
        let before = store.snapshot();

        let revision = store
            .commit(vec![Action::SetTitle {
                title: "Renamed".to_string(),
            }])
            .unwrap();

        assert_eq!(revision, 1);
        assert_eq!(store.snapshot().dashboard.title, "Renamed");
        assert_eq!(before.dashboard.title, "Test");
    }

    #[test]
    fn test_failed_batch_leaves_state_untouched() {
        let store = store();

        let result = store.commit(vec![
            Action::SetTitle {
                title: "Renamed".to_string(),
            },
            Action::RemoveSection { parent: None, index: 9 },
        ]);

        assert!(result.is_err());
        assert_eq!(store.revision(), 0);
        assert_eq!(store.snapshot().dashboard.title, "Test");
    }
}
