//! Layout command handlers

use dash_model::coordinates::{as_section_path, get_item_index, get_parent_path};
use dash_model::sizing::{resize_parent_containers, size_info};
use dash_model::{Item, ItemSize, LayoutItemPath, LayoutSectionPath, Section, SectionHeader, Widget};

use crate::commands::{
    AddLayoutSection, AddSectionItems, ChangeLayoutDirection, ChangeLayoutSectionHeader, MoveLayoutSection,
    MoveSectionItem, MoveSectionItemToNewSection, MoveSectionItemToNewSectionAndRemoveEmpty, RemoveLayoutSection,
    RemoveSectionItem, RemoveSectionItemByWidgetRef, ReplaceSectionItem, ResizeHeight, ResizeWidth,
    ToggleLayoutSectionHeaders,
};
use crate::error::CommandError;
use crate::events::EventPayload;
use crate::handlers::items::{merged_insights, prepare_items};
use crate::handlers::{HandlerContext, HandlerOutcome};
use crate::store::Action;
use crate::validation::{
    resolve_insert_index, validate_and_resolve_stashed_items, validate_item_exists, validate_item_path,
    validate_item_placement, validate_section_exists, validate_section_placement, StashValidationResult,
};

fn require_stashes(result: StashValidationResult) -> Result<StashValidationResult, CommandError> {
    if result.is_valid() {
        Ok(result)
    } else {
        Err(CommandError::user(format!(
            "stash identifiers {:?} do not exist",
            result.missing
        )))
    }
}

fn consume_stashes<'a>(stashes: &'a [String], keep: Option<&String>) -> impl Iterator<Item = Action> + 'a {
    let keep = keep.cloned();
    stashes
        .iter()
        .filter(move |id| Some(*id) != keep.as_ref())
        .map(|id| Action::ConsumeStash {
            stash_identifier: id.clone(),
        })
}

pub async fn add_layout_section(ctx: &HandlerContext<'_>, cmd: &AddLayoutSection) -> Result<HandlerOutcome, CommandError> {
    let layout = ctx.state.layout();
    let index = validate_section_placement(layout, cmd.index)?;
    let stashed = require_stashes(validate_and_resolve_stashed_items(&ctx.state.stash, &cmd.initial_items))?;

    let prepared = prepare_items(
        ctx,
        stashed.resolved,
        layout,
        &LayoutItemPath::top_level(index, 0),
        cmd.auto_resolve_date_filter_dataset,
    )
    .await?;

    let section = Section {
        header: cmd.initial_header.clone(),
        items: prepared.items,
    };

    let mut actions = Vec::new();
    if !prepared.insights.is_empty() {
        actions.push(Action::AddInsights {
            insights: prepared.insights,
        });
    }
    actions.push(Action::AddSection {
        parent: None,
        index,
        section: section.clone(),
    });
    actions.extend(consume_stashes(&stashed.existing, None));

    Ok(HandlerOutcome::new(actions, EventPayload::LayoutSectionAdded { section, index }))
}

pub async fn move_layout_section(
    ctx: &HandlerContext<'_>,
    cmd: &MoveLayoutSection,
) -> Result<HandlerOutcome, CommandError> {
    let layout = ctx.state.layout();
    let section = validate_section_exists(layout, cmd.section_index)?;

    // the section is taken out first, so the target range is that of the remaining sections
    let to_index = resolve_insert_index(cmd.to_index, layout.sections.len() - 1, "section")?;
    if to_index == cmd.section_index {
        return Err(CommandError::user(format!(
            "moving section {} to {} would not change the layout",
            cmd.section_index, to_index
        )));
    }

    Ok(HandlerOutcome::new(
        vec![Action::MoveSection {
            index: cmd.section_index,
            to_index,
        }],
        EventPayload::LayoutSectionMoved {
            section: section.clone(),
            from_index: cmd.section_index,
            to_index,
        },
    ))
}

pub async fn remove_layout_section(
    ctx: &HandlerContext<'_>,
    cmd: &RemoveLayoutSection,
) -> Result<HandlerOutcome, CommandError> {
    let section = validate_section_exists(ctx.state.layout(), cmd.index)?;

    let mut actions = vec![Action::RemoveSection {
        parent: None,
        index: cmd.index,
    }];
    if let Some(stash_identifier) = &cmd.stash_identifier {
        actions.push(Action::AddToStash {
            stash_identifier: stash_identifier.clone(),
            items: section.items.clone(),
        });
    }

    Ok(HandlerOutcome::new(
        actions,
        EventPayload::LayoutSectionRemoved {
            section: section.clone(),
            index: cmd.index,
            stash_identifier: cmd.stash_identifier.clone(),
        },
    ))
}

pub async fn change_layout_section_header(
    ctx: &HandlerContext<'_>,
    cmd: &ChangeLayoutSectionHeader,
) -> Result<HandlerOutcome, CommandError> {
    let section = validate_section_exists(ctx.state.layout(), cmd.index)?;

    let header = match (&section.header, cmd.merge) {
        (Some(current), true) => SectionHeader {
            title: cmd.header.title.clone().or_else(|| current.title.clone()),
            description: cmd.header.description.clone().or_else(|| current.description.clone()),
        },
        _ => cmd.header.clone(),
    };

    Ok(HandlerOutcome::new(
        vec![Action::ChangeSectionHeader {
            section: LayoutSectionPath::top_level(cmd.index),
            header: Some(header.clone()),
        }],
        EventPayload::LayoutSectionHeaderChanged {
            index: cmd.index,
            header,
        },
    ))
}

pub async fn add_section_items(ctx: &HandlerContext<'_>, cmd: &AddSectionItems) -> Result<HandlerOutcome, CommandError> {
    let layout = ctx.state.layout();
    let section = validate_section_exists(layout, cmd.section_index)?;
    let start_index = validate_item_placement(section, cmd.item_index)?;
    let stashed = require_stashes(validate_and_resolve_stashed_items(&ctx.state.stash, &cmd.items))?;
    if stashed.resolved.is_empty() {
        return Err(CommandError::user("there are no items to add"));
    }

    let prepared = prepare_items(
        ctx,
        stashed.resolved,
        layout,
        &LayoutItemPath::top_level(cmd.section_index, start_index),
        cmd.auto_resolve_date_filter_dataset,
    )
    .await?;

    let mut actions = Vec::new();
    if !prepared.insights.is_empty() {
        actions.push(Action::AddInsights {
            insights: prepared.insights,
        });
    }
    actions.push(Action::AddItems {
        section: LayoutSectionPath::top_level(cmd.section_index),
        index: start_index,
        items: prepared.items.clone(),
    });
    actions.extend(consume_stashes(&stashed.existing, None));

    Ok(HandlerOutcome::new(
        actions,
        EventPayload::LayoutSectionItemsAdded {
            section_index: cmd.section_index,
            start_index,
            items_added: prepared.items,
            stashes_used: stashed.existing,
        },
    ))
}

pub async fn move_section_item(ctx: &HandlerContext<'_>, cmd: &MoveSectionItem) -> Result<HandlerOutcome, CommandError> {
    let layout = ctx.state.layout();
    let source = validate_section_exists(layout, cmd.section_index)?;
    let item = validate_item_exists(source, cmd.section_index, cmd.item_index)?;
    let target = validate_section_exists(layout, cmd.to_section_index)?;

    let same_section = cmd.section_index == cmd.to_section_index;
    let available = if same_section {
        target.items.len() - 1
    } else {
        target.items.len()
    };
    let to_index = resolve_insert_index(cmd.to_item_index, available, "item")?;
    if same_section && to_index == cmd.item_index {
        return Err(CommandError::user(format!(
            "moving item {} of section {} to the same place would not change the layout",
            cmd.item_index, cmd.section_index
        )));
    }

    Ok(HandlerOutcome::new(
        vec![
            Action::RemoveItem {
                path: LayoutItemPath::top_level(cmd.section_index, cmd.item_index),
            },
            Action::AddItems {
                section: LayoutSectionPath::top_level(cmd.to_section_index),
                index: to_index,
                items: vec![item.clone()],
            },
        ],
        EventPayload::LayoutSectionItemMoved {
            item: item.clone(),
            from_section_index: cmd.section_index,
            to_section_index: cmd.to_section_index,
            from_index: cmd.item_index,
            to_index,
        },
    ))
}

/// Move an item into a new section, optionally pruning the emptied source section
fn move_to_new_section(
    ctx: &HandlerContext<'_>,
    section_index: usize,
    item_index: usize,
    to_section_index: i64,
    remove_empty: bool,
) -> Result<HandlerOutcome, CommandError> {
    let layout = ctx.state.layout();
    let source = validate_section_exists(layout, section_index)?;
    let item = validate_item_exists(source, section_index, item_index)?;
    let requested = resolve_insert_index(to_section_index, layout.sections.len(), "section")?;

    let section_removed = remove_empty && source.items.len() == 1;
    let mut actions = Vec::new();
    let to_index = if section_removed {
        // the target index was given before the source section disappears
        let shifted = if requested > section_index { requested - 1 } else { requested };
        if shifted == section_index {
            return Err(CommandError::user(format!(
                "moving the only item of section {} into a new section at the same place would not change the layout",
                section_index
            )));
        }
        actions.push(Action::RemoveSection {
            parent: None,
            index: section_index,
        });
        shifted
    } else {
        actions.push(Action::RemoveItem {
            path: LayoutItemPath::top_level(section_index, item_index),
        });
        requested
    };
    actions.push(Action::AddSection {
        parent: None,
        index: to_index,
        section: Section::new(vec![item.clone()]),
    });

    Ok(HandlerOutcome::new(
        actions,
        EventPayload::LayoutSectionItemMovedToNewSection {
            item: item.clone(),
            from_section_index: section_index,
            from_index: item_index,
            to_section_index: to_index,
            section_removed,
        },
    ))
}

pub async fn move_section_item_to_new_section(
    ctx: &HandlerContext<'_>,
    cmd: &MoveSectionItemToNewSection,
) -> Result<HandlerOutcome, CommandError> {
    move_to_new_section(ctx, cmd.section_index, cmd.item_index, cmd.to_section_index, false)
}

pub async fn move_section_item_to_new_section_and_remove_empty(
    ctx: &HandlerContext<'_>,
    cmd: &MoveSectionItemToNewSectionAndRemoveEmpty,
) -> Result<HandlerOutcome, CommandError> {
    move_to_new_section(ctx, cmd.section_index, cmd.item_index, cmd.to_section_index, true)
}

pub async fn remove_section_item(ctx: &HandlerContext<'_>, cmd: &RemoveSectionItem) -> Result<HandlerOutcome, CommandError> {
    let section = validate_section_exists(ctx.state.layout(), cmd.section_index)?;
    let item = validate_item_exists(section, cmd.section_index, cmd.item_index)?;

    let section_removed = cmd.eager && section.items.len() == 1;
    let mut actions = vec![if section_removed {
        Action::RemoveSection {
            parent: None,
            index: cmd.section_index,
        }
    } else {
        Action::RemoveItem {
            path: LayoutItemPath::top_level(cmd.section_index, cmd.item_index),
        }
    }];
    if let Some(stash_identifier) = &cmd.stash_identifier {
        actions.push(Action::AddToStash {
            stash_identifier: stash_identifier.clone(),
            items: vec![item.clone()],
        });
    }

    Ok(HandlerOutcome::new(
        actions,
        EventPayload::LayoutSectionItemRemoved {
            item: item.clone(),
            section_index: cmd.section_index,
            item_index: cmd.item_index,
            section_removed,
            stash_identifier: cmd.stash_identifier.clone(),
        },
    ))
}

pub async fn remove_section_item_by_widget_ref(
    ctx: &HandlerContext<'_>,
    cmd: &RemoveSectionItemByWidgetRef,
) -> Result<HandlerOutcome, CommandError> {
    let path = ctx.widget_path(&cmd.widget_ref)?;
    let item = validate_item_path(ctx.state.layout(), &path)?;
    let (Some(section), Some(item_index)) = (as_section_path(&path), get_item_index(&path)) else {
        return Err(CommandError::internal(format!("widget {} has an empty path", cmd.widget_ref)));
    };

    let mut actions = vec![Action::RemoveItem { path: path.clone() }];
    if let Some(stash_identifier) = &cmd.stash_identifier {
        actions.push(Action::AddToStash {
            stash_identifier: stash_identifier.clone(),
            items: vec![item.clone()],
        });
    }

    Ok(HandlerOutcome::new(
        actions,
        EventPayload::LayoutSectionItemRemoved {
            item: item.clone(),
            section_index: section.section_index,
            item_index,
            section_removed: false,
            stash_identifier: cmd.stash_identifier.clone(),
        },
    ))
}

pub async fn replace_section_item(
    ctx: &HandlerContext<'_>,
    cmd: &ReplaceSectionItem,
) -> Result<HandlerOutcome, CommandError> {
    let layout = ctx.state.layout();
    let path = cmd.target.to_path();
    let previous_item = validate_item_path(layout, &path)?.clone();
    let (Some(section), Some(item_index)) = (as_section_path(&path), get_item_index(&path)) else {
        return Err(CommandError::user("replacement target path is empty"));
    };

    let stashed = require_stashes(validate_and_resolve_stashed_items(
        &ctx.state.stash,
        std::slice::from_ref(&cmd.item),
    ))?;
    if stashed.resolved.is_empty() {
        return Err(CommandError::user("there are no items to replace with"));
    }

    let prepared = prepare_items(ctx, stashed.resolved, layout, &path, cmd.auto_resolve_date_filter_dataset).await?;

    // apply the placement to a scratch copy to learn which containers must grow
    let insights = merged_insights(&ctx.state.insights, &prepared.insights);
    let mut scratch = layout.clone();
    let target_section = dash_model::coordinates::find_section_mut(&mut scratch, &section)?;
    target_section.items.remove(item_index);
    target_section
        .items
        .splice(item_index..item_index, prepared.items.iter().cloned());
    let resized_containers = resize_parent_containers(&mut scratch, &path, &ctx.settings.sizing, &insights)?;

    let mut actions = Vec::new();
    if !prepared.insights.is_empty() {
        actions.push(Action::AddInsights {
            insights: prepared.insights,
        });
    }
    actions.push(Action::RemoveItem { path: path.clone() });
    actions.push(Action::AddItems {
        section,
        index: item_index,
        items: prepared.items.clone(),
    });
    actions.extend(consume_stashes(&stashed.existing, cmd.stash_identifier.as_ref()));
    if let Some(stash_identifier) = &cmd.stash_identifier {
        actions.push(Action::AddToStash {
            stash_identifier: stash_identifier.clone(),
            items: vec![previous_item.clone()],
        });
    }
    for container_path in &resized_containers {
        let container = dash_model::coordinates::find_item(&scratch, container_path)?;
        actions.push(Action::ReplaceItem {
            path: container_path.clone(),
            item: container.clone(),
        });
    }

    tracing::debug!(
        "Replacing item {} with {} item(s), {} container(s) resized",
        path,
        prepared.items.len(),
        resized_containers.len()
    );

    Ok(HandlerOutcome::new(
        actions,
        EventPayload::LayoutSectionItemReplaced {
            path,
            items: prepared.items,
            previous_item,
            stash_identifier: cmd.stash_identifier.clone(),
            stashes_used: stashed.existing,
            resized_containers,
        },
    ))
}

pub async fn resize_height(ctx: &HandlerContext<'_>, cmd: &ResizeHeight) -> Result<HandlerOutcome, CommandError> {
    let section = validate_section_exists(ctx.state.layout(), cmd.section_index)?;
    if cmd.item_indexes.is_empty() {
        return Err(CommandError::user("no items to resize"));
    }

    let mut actions = Vec::new();
    for &item_index in &cmd.item_indexes {
        let item = validate_item_exists(section, cmd.section_index, item_index)?;
        if item.widget.is_custom() {
            continue;
        }
        let info = size_info(&item.widget, &ctx.state.insights, &ctx.settings.sizing);
        let mut resized = item.clone();
        resized.size.xl.grid_height = Some(info.clamp_height(cmd.height));
        actions.push(Action::ReplaceItem {
            path: LayoutItemPath::top_level(cmd.section_index, item_index),
            item: resized,
        });
    }

    Ok(HandlerOutcome::new(
        actions,
        EventPayload::LayoutSectionItemsHeightResized {
            section_index: cmd.section_index,
            item_indexes: cmd.item_indexes.clone(),
            new_height: cmd.height,
        },
    ))
}

pub async fn resize_width(ctx: &HandlerContext<'_>, cmd: &ResizeWidth) -> Result<HandlerOutcome, CommandError> {
    let layout = ctx.state.layout();
    let item = validate_item_path(layout, &cmd.path)?;
    if item.widget.is_custom() {
        return Ok(HandlerOutcome::new(
            Vec::new(),
            EventPayload::LayoutSectionItemWidthResized {
                path: cmd.path.clone(),
                new_width: item.size.xl.grid_width,
            },
        ));
    }

    let parent_width = match get_parent_path(&cmd.path) {
        Some(parent) => validate_item_path(layout, &parent)?.size.xl.grid_width,
        None => ctx.settings.sizing.grid_columns,
    };
    let info = size_info(&item.widget, &ctx.state.insights, &ctx.settings.sizing);
    let new_width = cmd.width.clamp(info.min_width.min(parent_width), parent_width);

    let mut resized = item.clone();
    resized.size.xl = ItemSize {
        grid_width: new_width,
        ..resized.size.xl
    };

    Ok(HandlerOutcome::new(
        vec![Action::ReplaceItem {
            path: cmd.path.clone(),
            item: resized,
        }],
        EventPayload::LayoutSectionItemWidthResized {
            path: cmd.path.clone(),
            new_width,
        },
    ))
}

fn container_item(ctx: &HandlerContext<'_>, path: &LayoutItemPath) -> Result<Item, CommandError> {
    let item = validate_item_path(ctx.state.layout(), path)?;
    match &item.widget {
        Widget::Container(_) => Ok(item.clone()),
        other => Err(CommandError::user(format!(
            "item '{}' holds a {} widget, not a container",
            path,
            other.kind()
        ))),
    }
}

pub async fn toggle_layout_section_headers(
    ctx: &HandlerContext<'_>,
    cmd: &ToggleLayoutSectionHeaders,
) -> Result<HandlerOutcome, CommandError> {
    let mut item = container_item(ctx, &cmd.path)?;
    if let Some(container) = item.widget.as_container_mut() {
        container.section_headers_enabled = cmd.enabled;
    }

    Ok(HandlerOutcome::new(
        vec![Action::ReplaceItem {
            path: cmd.path.clone(),
            item,
        }],
        EventPayload::LayoutSectionHeadersToggled {
            path: cmd.path.clone(),
            enabled: cmd.enabled,
        },
    ))
}

pub async fn change_layout_direction(
    ctx: &HandlerContext<'_>,
    cmd: &ChangeLayoutDirection,
) -> Result<HandlerOutcome, CommandError> {
    let mut item = container_item(ctx, &cmd.path)?;
    if let Some(container) = item.widget.as_container_mut() {
        container.direction = cmd.direction;
    }

    Ok(HandlerOutcome::new(
        vec![Action::ReplaceItem {
            path: cmd.path.clone(),
            item,
        }],
        EventPayload::LayoutDirectionChanged {
            path: cmd.path.clone(),
            direction: cmd.direction,
        },
    ))
}
