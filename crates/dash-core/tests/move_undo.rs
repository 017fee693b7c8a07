use std::sync::Arc;

use dash_backend::InMemoryBackend;
use dash_core::commands::{
    MoveLayoutSection, MoveSectionItem, MoveSectionItemToNewSection, MoveSectionItemToNewSectionAndRemoveEmpty,
    UndoLayoutChanges,
};
use dash_core::{Command, CommandPayload, DashboardRuntime, DashboardState, EngineSettings};
use dash_model::{Dashboard, Item, Layout, ObjRef, RichTextWidget, Section, Widget};

/// Up to four sections; item counts come from `sizes`, with empty sections only when `allow_empty`
fn layout(sizes: &[u8], allow_empty: bool) -> Layout {
    Layout::new(
        sizes
            .iter()
            .take(4)
            .enumerate()
            .map(|(s, n)| {
                let count = if allow_empty { *n % 4 } else { (*n % 3) + 1 };
                Section::new(
                    (0..count)
                        .map(|i| {
                            let mut widget = Widget::RichText(RichTextWidget::new(format!("{}-{}", s, i)));
                            widget.set_widget_ref(ObjRef::identifier(format!("w{}-{}", s, i)));
                            Item::new(widget, 4)
                        })
                        .collect(),
                )
            })
            .collect(),
    )
}

/// Apply the command built from the layout; when it succeeds, undo it and require the original
/// layout back. A builder returning `None` has nothing to try on that layout.
fn apply_then_undo(original: Layout, command: impl FnOnce(&Layout) -> Option<CommandPayload>) -> bool {
    if original.sections.is_empty() {
        return true;
    }
    let Some(payload) = command(&original) else {
        return true;
    };
    let mut dashboard = Dashboard::new("Property");
    dashboard.layout = original.clone();

    let Ok(rt) = tokio::runtime::Builder::new_current_thread().enable_all().build() else {
        return false;
    };
    rt.block_on(async move {
        let runtime = DashboardRuntime::new(
            DashboardState::new(dashboard),
            Arc::new(InMemoryBackend::new()),
            EngineSettings::default(),
        );
        let Ok(event) = runtime.execute(Command::new(payload)).await else {
            return false;
        };
        if !event.is_success() {
            // rejected moves must leave the layout alone
            return *runtime.state().layout() == original;
        }
        let Ok(undo) = runtime.execute(Command::new(UndoLayoutChanges::default())).await else {
            return false;
        };
        undo.is_success() && *runtime.state().layout() == original
    })
}

/// Index of a non-empty section picked by `pick`
fn non_empty_section(layout: &Layout, pick: u8) -> Option<usize> {
    let candidates: Vec<usize> = (0..layout.sections.len())
        .filter(|s| !layout.sections[*s].items.is_empty())
        .collect();
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[pick as usize % candidates.len()])
    }
}

fn move_item(layout: &Layout, from: (u8, u8), to: (u8, u8)) -> Option<CommandPayload> {
    let section_index = non_empty_section(layout, from.0)?;
    let to_section_index = to.0 as usize % layout.sections.len();
    Some(CommandPayload::from(MoveSectionItem {
        section_index,
        item_index: from.1 as usize % layout.sections[section_index].items.len(),
        to_section_index,
        to_item_index: (to.1 as usize % (layout.sections[to_section_index].items.len() + 1)) as i64,
    }))
}

fn move_to_new_section(layout: &Layout, from: (u8, u8), to: u8) -> Option<CommandPayload> {
    let section_index = non_empty_section(layout, from.0)?;
    Some(CommandPayload::from(MoveSectionItemToNewSection {
        section_index,
        item_index: from.1 as usize % layout.sections[section_index].items.len(),
        to_section_index: (to as usize % (layout.sections.len() + 1)) as i64,
    }))
}

#[test]
fn test_move_item_then_undo_restores_layout() {
    fn prop(sizes: Vec<u8>, from: (u8, u8), to: (u8, u8)) -> bool {
        apply_then_undo(layout(&sizes, false), |layout| move_item(layout, from, to))
    }
    quickcheck::quickcheck(prop as fn(Vec<u8>, (u8, u8), (u8, u8)) -> bool);
}

#[test]
fn test_move_to_new_section_keeping_source_then_undo_restores_layout() {
    fn prop(sizes: Vec<u8>, from: (u8, u8), to: u8) -> bool {
        apply_then_undo(layout(&sizes, false), |layout| move_to_new_section(layout, from, to))
    }
    quickcheck::quickcheck(prop as fn(Vec<u8>, (u8, u8), u8) -> bool);
}

#[test]
fn test_move_to_new_section_then_undo_restores_layout() {
    fn prop(sizes: Vec<u8>, from: (u8, u8), to: u8) -> bool {
        apply_then_undo(layout(&sizes, false), |layout| {
            let sections = layout.sections.len();
            let section_index = from.0 as usize % sections;
            Some(CommandPayload::from(MoveSectionItemToNewSectionAndRemoveEmpty {
                section_index,
                item_index: from.1 as usize % layout.sections[section_index].items.len(),
                to_section_index: (to as usize % (sections + 1)) as i64,
            }))
        })
    }
    quickcheck::quickcheck(prop as fn(Vec<u8>, (u8, u8), u8) -> bool);
}

#[test]
fn test_move_section_then_undo_restores_layout() {
    fn prop(sizes: Vec<u8>, from: u8, to: u8) -> bool {
        apply_then_undo(layout(&sizes, true), |layout| {
            let sections = layout.sections.len();
            Some(CommandPayload::from(MoveLayoutSection {
                section_index: from as usize % sections,
                to_index: (to as usize % sections) as i64,
            }))
        })
    }
    quickcheck::quickcheck(prop as fn(Vec<u8>, u8, u8) -> bool);
}

#[test]
fn test_moves_between_empty_sections_then_undo_restore_layout() {
    fn prop(sizes: Vec<u8>, from: (u8, u8), to: (u8, u8), to_new_section: bool) -> bool {
        apply_then_undo(layout(&sizes, true), |layout| {
            if to_new_section {
                move_to_new_section(layout, from, to.0)
            } else {
                move_item(layout, from, to)
            }
        })
    }
    quickcheck::quickcheck(prop as fn(Vec<u8>, (u8, u8), (u8, u8), bool) -> bool);
}
