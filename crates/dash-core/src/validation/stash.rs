//! Stash resolution

use dash_model::{Item, Stash, StashId};

use crate::commands::StashableItem;

/// Outcome of resolving item definitions that may reference stashes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StashValidationResult {
    /// Referenced stashes that exist, in first-use order
    pub existing: Vec<StashId>,
    /// Referenced stashes that do not exist
    pub missing: Vec<StashId>,
    /// Concrete items in definition order
    pub resolved: Vec<Item>,
}

impl StashValidationResult {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Partition referenced stashes into existing and missing and expand them into items
///
/// Item definitions pass through unchanged. A stash referenced twice is expanded once.
pub fn validate_and_resolve_stashed_items(stash: &Stash, definitions: &[StashableItem]) -> StashValidationResult {
    let mut result = StashValidationResult::default();
    for definition in definitions {
        match definition {
            StashableItem::Item(item) => result.resolved.push(item.as_ref().clone()),
            StashableItem::Stash(id) => {
                if result.existing.contains(id) || result.missing.contains(id) {
                    continue;
                }
                match stash.get(id) {
                    Some(items) => {
                        result.existing.push(id.clone());
                        result.resolved.extend(items.iter().cloned());
                    }
                    None => result.missing.push(id.clone()),
                }
            }
        }
    }
    result
}
