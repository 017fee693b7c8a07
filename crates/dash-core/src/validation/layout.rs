//! Index and path checks
//!
//! Insert positions accept `0..=len` plus `-1` for "append"; positions of existing elements
//! accept `0..len`. Nothing is ever clamped.

use dash_model::coordinates::{find_item, find_section};
use dash_model::{Item, Layout, LayoutItemPath, LayoutSectionPath, Section};

use crate::commands::APPEND;
use crate::error::CommandError;

/// Concrete insert position for `index` in a sequence of `len` elements
pub fn resolve_insert_index(index: i64, len: usize, what: &str) -> Result<usize, CommandError> {
    if index == APPEND {
        return Ok(len);
    }
    match usize::try_from(index) {
        Ok(index) if index <= len => Ok(index),
        _ => Err(CommandError::user(format!(
            "{} index {} is out of range, expected 0..={} or -1",
            what, index, len
        ))),
    }
}

pub fn validate_section_exists(layout: &Layout, index: usize) -> Result<&Section, CommandError> {
    layout.sections.get(index).ok_or_else(|| {
        CommandError::user(format!(
            "section {} does not exist, layout has {} sections",
            index,
            layout.sections.len()
        ))
    })
}

/// Insert position for a new section
pub fn validate_section_placement(layout: &Layout, index: i64) -> Result<usize, CommandError> {
    resolve_insert_index(index, layout.sections.len(), "section")
}

pub fn validate_item_exists(section: &Section, section_index: usize, item_index: usize) -> Result<&Item, CommandError> {
    section.items.get(item_index).ok_or_else(|| {
        CommandError::user(format!(
            "item {} does not exist in section {} of {} items",
            item_index,
            section_index,
            section.items.len()
        ))
    })
}

/// Insert position for new items in a section
pub fn validate_item_placement(section: &Section, index: i64) -> Result<usize, CommandError> {
    resolve_insert_index(index, section.items.len(), "item")
}

pub fn validate_section_path<'a>(layout: &'a Layout, path: &LayoutSectionPath) -> Result<&'a Section, CommandError> {
    find_section(layout, path).map_err(|e| CommandError::user(format!("invalid section path {}: {}", path, e)))
}

pub fn validate_item_path<'a>(layout: &'a Layout, path: &LayoutItemPath) -> Result<&'a Item, CommandError> {
    find_item(layout, path).map_err(|e| CommandError::user(format!("invalid item path '{}': {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_model::{RichTextWidget, Widget};

    fn layout() -> Layout {
        let item = Item::new(Widget::RichText(RichTextWidget::new("a")), 12);
        Layout::new(vec![Section::new(vec![item.clone(), item]), Section::new(vec![])])
    }

    #[test]
    fn test_insert_index_policy() {
        assert_eq!(resolve_insert_index(-1, 3, "item").unwrap(), 3);
        assert_eq!(resolve_insert_index(3, 3, "item").unwrap(), 3);
        assert_eq!(resolve_insert_index(0, 0, "item").unwrap(), 0);
        assert!(resolve_insert_index(4, 3, "item").is_err());
        assert!(resolve_insert_index(-2, 3, "item").is_err());
    }

    #[test]
    fn test_existing_positions_never_clamp() {
        let layout = layout();

        assert!(validate_section_exists(&layout, 1).is_ok());
        assert!(validate_section_exists(&layout, 2).is_err());

        let section = validate_section_exists(&layout, 0).unwrap();
        assert!(validate_item_exists(section, 0, 1).is_ok());
        let error = validate_item_exists(section, 0, 2).unwrap_err();
        assert_eq!(error.reason(), Some(crate::FailureReason::UserError));
    }

    #[test]
    fn test_nested_paths() {
        let layout = layout();

        assert!(validate_item_path(&layout, &LayoutItemPath::top_level(0, 1)).is_ok());
        assert!(validate_item_path(&layout, &LayoutItemPath::root()).is_err());
        assert!(validate_section_path(&layout, &LayoutSectionPath::nested(LayoutItemPath::top_level(0, 0), 0)).is_err());
    }
}
