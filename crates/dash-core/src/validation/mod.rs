//! Command validation
//!
//! Validators check a command against a state snapshot before any action is produced. Layout
//! and stash validators are pure; filter and drill validation may consult the backend.

pub mod drills;
pub mod filters;
pub mod layout;
pub mod stash;

pub use drills::validate_drill_custom_url;
pub use filters::{validate_attribute_filter_parents, ParentValidation};
pub use layout::{
    resolve_insert_index, validate_item_exists, validate_item_path, validate_item_placement,
    validate_section_exists, validate_section_path, validate_section_placement,
};
pub use stash::{validate_and_resolve_stashed_items, StashValidationResult};
