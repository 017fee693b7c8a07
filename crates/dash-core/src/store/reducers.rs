//! Reducers applying [`Action`]s to a state copy
//!
//! Reducers re-check every index they touch. Handlers validate first, so a failure here is an
//! invariant break and aborts the whole batch.

use dash_model::coordinates::{as_section_path, find_item_mut, find_section_mut, find_sections_mut, get_item_index};
use dash_model::{LayoutItemPath, LayoutSectionPath, PathError};

use crate::error::StoreError;
use crate::store::{Action, DashboardState};

fn check_index(what: &'static str, index: usize, len: usize) -> Result<(), StoreError> {
    if index < len {
        Ok(())
    } else {
        Err(StoreError::Index { what, index, len })
    }
}

fn check_insert_index(what: &'static str, index: usize, len: usize) -> Result<(), StoreError> {
    if index <= len {
        Ok(())
    } else {
        Err(StoreError::Index { what, index, len })
    }
}

/// Apply one action
pub fn reduce(state: &mut DashboardState, action: Action) -> Result<(), StoreError> {
    match action {
        Action::AddSection { parent, index, section } => {
            let sections = find_sections_mut(&mut state.dashboard.layout, parent.as_ref())?;
            check_insert_index("sections", index, sections.len())?;
            sections.insert(index, section);
        }
        Action::RemoveSection { parent, index } => {
            let sections = find_sections_mut(&mut state.dashboard.layout, parent.as_ref())?;
            check_index("sections", index, sections.len())?;
            sections.remove(index);
        }
        Action::MoveSection { index, to_index } => {
            let sections = &mut state.dashboard.layout.sections;
            check_index("sections", index, sections.len())?;
            let section = sections.remove(index);
            check_insert_index("sections", to_index, sections.len())?;
            sections.insert(to_index, section);
        }
        Action::ChangeSectionHeader { section, header } => {
            find_section_mut(&mut state.dashboard.layout, &section)?.header = header;
        }
        Action::AddItems { section, index, items } => {
            let target = find_section_mut(&mut state.dashboard.layout, &section)?;
            check_insert_index("items", index, target.items.len())?;
            target.items.splice(index..index, items);
        }
        Action::RemoveItem { path } => {
            let (section_path, item_index) = split(&path)?;
            let section = find_section_mut(&mut state.dashboard.layout, &section_path)?;
            check_index("items", item_index, section.items.len())?;
            section.items.remove(item_index);
        }
        Action::ReplaceItem { path, item } => {
            *find_item_mut(&mut state.dashboard.layout, &path)? = item;
        }
        Action::ReplaceLayout { layout } => {
            state.dashboard.layout = layout;
        }

        Action::AddToStash { stash_identifier, items } => {
            state.stash.insert(stash_identifier, items);
        }
        Action::ConsumeStash { stash_identifier } => {
            state
                .stash
                .shift_remove(&stash_identifier)
                .ok_or(StoreError::MissingStash(stash_identifier))?;
        }
        Action::ReplaceStash { stash } => {
            state.stash = stash;
        }

        Action::AddInsights { insights } => {
            for insight in insights {
                state.insights.insert(insight.insight_ref.clone(), insight);
            }
        }
        Action::SetExecution { widget_ref, result } => {
            state.executions.insert(widget_ref, result);
        }

        Action::SetDateFilter { filter } => {
            state.dashboard.filter_context.set_date_filter(filter);
        }
        Action::AddAttributeFilter { index, filter } => {
            state.dashboard.filter_context.insert_attribute_filter(index, filter);
        }
        Action::RemoveAttributeFilter { local_id } => {
            state
                .dashboard
                .filter_context
                .remove_attribute_filter(&local_id)
                .ok_or(StoreError::MissingFilter(local_id))?;
        }
        Action::MoveAttributeFilter { local_id, index } => {
            if !state.dashboard.filter_context.move_attribute_filter(&local_id, index) {
                return Err(StoreError::MissingFilter(local_id));
            }
        }
        Action::UpdateAttributeFilter { filter } => {
            let current = state
                .dashboard
                .filter_context
                .attribute_filter_mut(&filter.local_identifier)
                .ok_or_else(|| StoreError::MissingFilter(filter.local_identifier.clone()))?;
            *current = filter;
        }
        Action::ReplaceFilterContext { filter_context } => {
            state.dashboard.filter_context = filter_context;
        }

        Action::SetTitle { title } => {
            state.dashboard.title = title;
        }
        Action::ReplaceDashboard { dashboard } => {
            state.dashboard = dashboard;
            state.stash.clear();
            state.executions.clear();
        }
        Action::SetPersisted { dashboard } => {
            state.persisted = Some(dashboard);
        }
        Action::ApplySaved { dashboard } => {
            state.executions.retain(|widget_ref, _| !widget_ref.is_temporary());
            state.dashboard = dashboard.clone();
            state.persisted = Some(dashboard);
        }
    }
    Ok(())
}

fn split(path: &LayoutItemPath) -> Result<(LayoutSectionPath, usize), StoreError> {
    match (as_section_path(path), get_item_index(path)) {
        (Some(section), Some(item_index)) => Ok((section, item_index)),
        _ => Err(StoreError::Path(PathError::Empty)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_model::{Dashboard, Item, Layout, RichTextWidget, Section, Widget};

    fn text(content: &str) -> Item {
        Item::new(Widget::RichText(RichTextWidget::new(content)), 4)
    }

    fn state() -> DashboardState {
        let mut dashboard = Dashboard::new("Test");
        dashboard.layout = Layout::new(vec![
            Section::new(vec![text("a"), text("b")]),
            Section::new(vec![text("c")]),
        ]);
        DashboardState::new(dashboard)
    }

    #[test]
    fn test_add_and_remove_items() {
        let mut state = state();
        reduce(
            &mut state,
            Action::AddItems {
                section: LayoutSectionPath::top_level(1),
                index: 1,
                items: vec![text("d"), text("e")],
            },
        )
        .unwrap();
        assert_eq!(state.layout().section_sizes(), vec![2, 3]);

        reduce(
            &mut state,
            Action::RemoveItem {
                path: LayoutItemPath::top_level(0, 0),
            },
        )
        .unwrap();
        assert_eq!(state.layout().section_sizes(), vec![1, 3]);
    }

    #[test]
    fn test_move_section() {
        let mut state = state();
        reduce(&mut state, Action::MoveSection { index: 0, to_index: 1 }).unwrap();

        assert_eq!(state.layout().section_sizes(), vec![1, 2]);
    }

    #[test]
    fn test_out_of_range_is_invariant_break() {
        let mut state = state();

        assert!(matches!(
            reduce(
                &mut state,
                Action::AddItems {
                    section: LayoutSectionPath::top_level(0),
                    index: 5,
                    items: vec![text("x")],
                }
            ),
            Err(StoreError::Index { .. })
        ));
        assert!(matches!(
            reduce(
                &mut state,
                Action::ConsumeStash {
                    stash_identifier: "nope".to_string()
                }
            ),
            Err(StoreError::MissingStash(_))
        ));
    }
}
