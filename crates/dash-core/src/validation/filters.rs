//! Attribute filter parent validation

use ahash::AHashSet;
use dash_backend::BackendGateway;
use dash_model::{AttributeFilterParent, DashboardAttributeFilter, FilterContext};
use tokio_util::sync::CancellationToken;

use crate::error::CommandError;

/// Result of checking the parents of an attribute filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentValidation {
    Valid,
    /// A parent filter is not in the filter context
    ExtraneousParent(String),
    /// A declared connecting attribute does not connect parent and child
    InvalidConnection(String),
    /// The filter would depend on itself
    CircularDependency(String),
}

impl ParentValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, ParentValidation::Valid)
    }

    /// User facing description of a failed validation
    pub fn message(&self) -> Option<String> {
        match self {
            ParentValidation::Valid => None,
            ParentValidation::ExtraneousParent(id) => Some(format!("parent filter '{}' does not exist", id)),
            ParentValidation::InvalidConnection(id) => Some(format!(
                "filter '{}' is not connected to its child over the given attributes",
                id
            )),
            ParentValidation::CircularDependency(id) => {
                Some(format!("parent filter '{}' would create a circular dependency", id))
            }
        }
    }
}

/// Check `parents` as the new parents of `filter`
///
/// Unknown parents and cycles are detected locally. Connecting attributes are checked through the
/// backend; a backend that cannot answer that question accepts any connection.
pub async fn validate_attribute_filter_parents(
    backend: &dyn BackendGateway,
    abort: &CancellationToken,
    filter_context: &FilterContext,
    filter: &DashboardAttributeFilter,
    parents: &[AttributeFilterParent],
) -> Result<ParentValidation, CommandError> {
    for parent in parents {
        let id = &parent.filter_local_identifier;
        if id == &filter.local_identifier {
            return Ok(ParentValidation::CircularDependency(id.clone()));
        }
        if filter_context.attribute_filter(id).is_none() {
            return Ok(ParentValidation::ExtraneousParent(id.clone()));
        }
    }

    for parent in parents {
        if depends_on(filter_context, &parent.filter_local_identifier, &filter.local_identifier) {
            return Ok(ParentValidation::CircularDependency(parent.filter_local_identifier.clone()));
        }
    }

    if !backend.capabilities().supports_connecting_attributes {
        return Ok(ParentValidation::Valid);
    }

    for parent in parents {
        let Some(parent_filter) = filter_context.attribute_filter(&parent.filter_local_identifier) else {
            continue;
        };
        let common = backend
            .query_common_attributes(&[parent_filter.display_form.clone(), filter.display_form.clone()], abort)
            .await?;
        if parent.over.iter().any(|attribute| !common.contains(attribute)) {
            return Ok(ParentValidation::InvalidConnection(parent.filter_local_identifier.clone()));
        }
    }

    Ok(ParentValidation::Valid)
}

/// Whether `from` transitively depends on `target` through current parent links
fn depends_on(filter_context: &FilterContext, from: &str, target: &str) -> bool {
    let mut visited = AHashSet::new();
    let mut pending = vec![from.to_string()];
    while let Some(id) = pending.pop() {
        if id == target {
            return true;
        }
        if !visited.insert(id.clone()) {
            continue;
        }
        if let Some(filter) = filter_context.attribute_filter(&id) {
            pending.extend(filter.parent_ids().map(str::to_string));
        }
    }
    false
}
