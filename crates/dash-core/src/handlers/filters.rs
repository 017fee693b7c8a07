//! Filter context command handlers

use dash_model::{
    AttributeElements, AttributeFilterParent, DashboardAttributeFilter, DashboardDateFilter, SelectionMode,
};

use crate::commands::{
    AddAttributeFilter, ChangeAttributeFilterSelection, ChangeDateFilterSelection, ChangeFilterContextSelection,
    FilterSelection, MoveAttributeFilter, RemoveAttributeFilters, SelectionType, SetAttributeFilterParents,
};
use crate::error::CommandError;
use crate::events::EventPayload;
use crate::handlers::{HandlerContext, HandlerOutcome};
use crate::store::selectors::{select_attribute_filter, select_children_of};
use crate::store::Action;
use crate::validation::{resolve_insert_index, validate_attribute_filter_parents};

fn check_date_filter(filter: &DashboardDateFilter) -> Result<(), CommandError> {
    match filter.bounds_error() {
        Some(problem) => Err(CommandError::user(problem)),
        None => Ok(()),
    }
}

fn check_selection(mode: SelectionMode, elements: &AttributeElements, negative: bool) -> Result<(), CommandError> {
    let valid = match mode {
        SelectionMode::Multi => true,
        SelectionMode::Single => (!negative && elements.len() == 1) || (negative && elements.is_empty()),
    };
    if valid {
        Ok(())
    } else {
        Err(CommandError::user("single selection filters accept exactly one element"))
    }
}

fn find_filter<'a>(ctx: &'a HandlerContext<'_>, local_id: &str) -> Result<&'a DashboardAttributeFilter, CommandError> {
    select_attribute_filter(&ctx.state, local_id)
        .ok_or_else(|| CommandError::user(format!("attribute filter '{}' does not exist", local_id)))
}

async fn check_parents(
    ctx: &HandlerContext<'_>,
    filter: &DashboardAttributeFilter,
    parents: &[AttributeFilterParent],
) -> Result<(), CommandError> {
    let validation =
        validate_attribute_filter_parents(ctx.backend, &ctx.abort, ctx.state.filter_context(), filter, parents).await?;
    match validation.message() {
        Some(message) => Err(CommandError::user(message)),
        None => Ok(()),
    }
}

pub async fn change_date_filter_selection(
    _ctx: &HandlerContext<'_>,
    cmd: &ChangeDateFilterSelection,
) -> Result<HandlerOutcome, CommandError> {
    check_date_filter(&cmd.selection)?;

    Ok(HandlerOutcome::new(
        vec![Action::SetDateFilter {
            filter: Some(cmd.selection.clone()),
        }],
        EventPayload::DateFilterSelectionChanged {
            filter: cmd.selection.clone(),
        },
    ))
}

pub async fn add_attribute_filter(ctx: &HandlerContext<'_>, cmd: &AddAttributeFilter) -> Result<HandlerOutcome, CommandError> {
    let filter_context = ctx.state.filter_context();
    if filter_context.attribute_filter_by_display_form(&cmd.display_form).is_some() {
        return Err(CommandError::user(format!(
            "an attribute filter for display form {} already exists",
            cmd.display_form
        )));
    }
    let index = resolve_insert_index(cmd.index, filter_context.attribute_filter_count(), "attribute filter")?;

    let display_forms = ctx
        .backend
        .resolve_display_forms(std::slice::from_ref(&cmd.display_form), &ctx.abort)
        .await?;
    let Some(display_form) = display_forms.into_iter().next() else {
        return Err(CommandError::user(format!("display form {} does not exist", cmd.display_form)));
    };

    let mut filter = DashboardAttributeFilter::new(cmd.display_form.clone());
    filter.selection_mode = cmd.selection_mode;
    filter.title = cmd.title.clone().or(Some(display_form.title));
    if let Some(selection) = &cmd.initial_selection {
        filter.attribute_elements = selection.clone();
        filter.negative_selection = cmd.initial_is_negative_selection;
    }
    check_selection(filter.selection_mode, &filter.attribute_elements, filter.negative_selection)?;

    check_parents(ctx, &filter, &cmd.parent_filters).await?;
    filter.filter_elements_by = cmd.parent_filters.clone();

    tracing::debug!("Adding attribute filter {} at {}", filter.local_identifier, index);
    Ok(HandlerOutcome::new(
        vec![Action::AddAttributeFilter {
            index,
            filter: filter.clone(),
        }],
        EventPayload::AttributeFilterAdded { filter, index },
    ))
}

pub async fn remove_attribute_filters(
    ctx: &HandlerContext<'_>,
    cmd: &RemoveAttributeFilters,
) -> Result<HandlerOutcome, CommandError> {
    if cmd.filter_local_ids.is_empty() {
        return Err(CommandError::user("no attribute filters to remove"));
    }

    let mut removed = Vec::new();
    for local_id in &cmd.filter_local_ids {
        let filter = find_filter(ctx, local_id)?;
        if !removed.iter().any(|f: &DashboardAttributeFilter| &f.local_identifier == local_id) {
            removed.push(filter.clone());
        }
    }

    let mut actions: Vec<Action> = removed
        .iter()
        .map(|f| Action::RemoveAttributeFilter {
            local_id: f.local_identifier.clone(),
        })
        .collect();

    // children keep working, just without the removed parents
    let mut children: Vec<DashboardAttributeFilter> = Vec::new();
    for local_id in &cmd.filter_local_ids {
        for child in select_children_of(&ctx.state, local_id) {
            let known = children.iter().any(|c| c.local_identifier == child.local_identifier);
            if !known && !cmd.filter_local_ids.contains(&child.local_identifier) {
                children.push(child.clone());
            }
        }
    }
    let mut children_updated = Vec::new();
    for mut child in children {
        child
            .filter_elements_by
            .retain(|p| !cmd.filter_local_ids.contains(&p.filter_local_identifier));
        children_updated.push(child.local_identifier.clone());
        actions.push(Action::UpdateAttributeFilter { filter: child });
    }

    Ok(HandlerOutcome::new(
        actions,
        EventPayload::AttributeFilterRemoved {
            removed,
            children_updated,
        },
    ))
}

pub async fn move_attribute_filter(
    ctx: &HandlerContext<'_>,
    cmd: &MoveAttributeFilter,
) -> Result<HandlerOutcome, CommandError> {
    find_filter(ctx, &cmd.filter_local_id)?;
    let filter_context = ctx.state.filter_context();
    let from_index = filter_context
        .attribute_filter_index(&cmd.filter_local_id)
        .ok_or_else(|| CommandError::internal("attribute filter without position"))?;

    // the filter is taken out first, so the target range is that of the remaining filters
    let to_index = resolve_insert_index(cmd.index, filter_context.attribute_filter_count() - 1, "attribute filter")?;

    Ok(HandlerOutcome::new(
        vec![Action::MoveAttributeFilter {
            local_id: cmd.filter_local_id.clone(),
            index: to_index,
        }],
        EventPayload::AttributeFilterMoved {
            filter_local_id: cmd.filter_local_id.clone(),
            from_index,
            to_index,
        },
    ))
}

pub async fn change_attribute_filter_selection(
    ctx: &HandlerContext<'_>,
    cmd: &ChangeAttributeFilterSelection,
) -> Result<HandlerOutcome, CommandError> {
    let mut filter = find_filter(ctx, &cmd.filter_local_id)?.clone();
    filter.attribute_elements = cmd.elements.clone();
    filter.negative_selection = cmd.selection_type == SelectionType::NotIn;
    check_selection(filter.selection_mode, &filter.attribute_elements, filter.negative_selection)?;

    Ok(HandlerOutcome::new(
        vec![Action::UpdateAttributeFilter { filter: filter.clone() }],
        EventPayload::AttributeFilterSelectionChanged { filter },
    ))
}

pub async fn set_attribute_filter_parents(
    ctx: &HandlerContext<'_>,
    cmd: &SetAttributeFilterParents,
) -> Result<HandlerOutcome, CommandError> {
    let mut filter = find_filter(ctx, &cmd.filter_local_id)?.clone();
    check_parents(ctx, &filter, &cmd.parent_filters).await?;
    filter.filter_elements_by = cmd.parent_filters.clone();

    Ok(HandlerOutcome::new(
        vec![Action::UpdateAttributeFilter { filter: filter.clone() }],
        EventPayload::AttributeFilterParentChanged { filter },
    ))
}

pub async fn change_filter_context_selection(
    ctx: &HandlerContext<'_>,
    cmd: &ChangeFilterContextSelection,
) -> Result<HandlerOutcome, CommandError> {
    let mut filter_context = ctx.state.filter_context().clone();
    let mut touched_date = false;
    let mut touched = Vec::new();

    for selection in &cmd.filters {
        match selection {
            FilterSelection::DateFilter(date) => {
                check_date_filter(date)?;
                filter_context.set_date_filter(Some(date.clone()));
                touched_date = true;
            }
            FilterSelection::AttributeFilter {
                display_form,
                attribute_elements,
                negative_selection,
            } => {
                let Some(local_id) = filter_context
                    .attribute_filter_by_display_form(display_form)
                    .map(|f| f.local_identifier.clone())
                else {
                    tracing::debug!("No attribute filter for display form {}, selection ignored", display_form);
                    continue;
                };
                if let Some(filter) = filter_context.attribute_filter_mut(&local_id) {
                    filter.attribute_elements = attribute_elements.clone();
                    filter.negative_selection = *negative_selection;
                    check_selection(filter.selection_mode, &filter.attribute_elements, filter.negative_selection)?;
                }
                touched.push(local_id);
            }
        }
    }

    if cmd.reset_others {
        if !touched_date && filter_context.date_filter().is_some() {
            filter_context.set_date_filter(Some(DashboardDateFilter::all_time()));
        }
        for filter in filter_context.attribute_filters_mut() {
            if !touched.contains(&filter.local_identifier) {
                filter.reset_selection();
            }
        }
    }

    Ok(HandlerOutcome::new(
        vec![Action::ReplaceFilterContext {
            filter_context: filter_context.clone(),
        }],
        EventPayload::FilterContextChanged { filter_context },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::APPEND;
    use crate::handlers::test_support::{context_parts, context_parts_with};
    use dash_backend::InMemoryBackend;
    use dash_model::{Dashboard, ObjRef};

    fn filter(id: &str) -> DashboardAttributeFilter {
        DashboardAttributeFilter {
            local_identifier: id.to_string(),
            ..DashboardAttributeFilter::new(ObjRef::identifier(format!("label.{}", id)))
        }
    }

    fn dashboard() -> Dashboard {
        let mut dashboard = Dashboard::new("Test");
        let mut city = filter("city");
        city.filter_elements_by = vec![AttributeFilterParent {
            filter_local_identifier: "region".to_string(),
            over: vec![],
        }];
        dashboard.filter_context.insert_attribute_filter(0, filter("region"));
        dashboard.filter_context.insert_attribute_filter(1, city);
        dashboard
    }

    #[tokio::test]
    async fn test_selection_of_unknown_filter() {
        let parts = context_parts(dashboard());
        let ctx = parts.context();

        let error = change_attribute_filter_selection(&ctx, &ChangeAttributeFilterSelection {
            filter_local_id: "nonexistent-id".to_string(),
            elements: AttributeElements::Uris(vec!["x".to_string()]),
            selection_type: SelectionType::In,
        })
        .await
        .unwrap_err();

        assert!(matches!(error, CommandError::User(_)));
    }

    #[tokio::test]
    async fn test_remove_updates_children() {
        let parts = context_parts(dashboard());
        let ctx = parts.context();

        let outcome = remove_attribute_filters(&ctx, &RemoveAttributeFilters {
            filter_local_ids: vec!["region".to_string()],
        })
        .await
        .unwrap();

        match outcome.event {
            EventPayload::AttributeFilterRemoved { children_updated, .. } => {
                assert_eq!(children_updated, vec!["city".to_string()])
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(outcome.actions.len(), 2);
    }

    #[tokio::test]
    async fn test_add_duplicate_display_form_rejected() {
        let backend = InMemoryBackend::new().with_display_form(
            ObjRef::identifier("label.region"),
            ObjRef::identifier("attr.region"),
            "Region",
        );
        let parts = context_parts_with(dashboard(), backend);
        let ctx = parts.context();

        let error = add_attribute_filter(&ctx, &AddAttributeFilter {
            display_form: ObjRef::identifier("label.region"),
            index: APPEND,
            parent_filters: vec![],
            initial_selection: None,
            initial_is_negative_selection: false,
            selection_mode: SelectionMode::Multi,
            title: None,
        })
        .await
        .unwrap_err();

        assert!(matches!(error, CommandError::User(_)));
    }

    #[tokio::test]
    async fn test_reset_others() {
        let mut dashboard = dashboard();
        dashboard
            .filter_context
            .attribute_filter_mut("city")
            .unwrap()
            .attribute_elements = AttributeElements::Uris(vec!["c1".to_string()]);
        dashboard.filter_context.attribute_filter_mut("city").unwrap().negative_selection = false;
        let parts = context_parts(dashboard);
        let ctx = parts.context();

        let outcome = change_filter_context_selection(&ctx, &ChangeFilterContextSelection {
            filters: vec![FilterSelection::AttributeFilter {
                display_form: ObjRef::identifier("label.region"),
                attribute_elements: AttributeElements::Uris(vec!["r1".to_string()]),
                negative_selection: false,
            }],
            reset_others: true,
        })
        .await
        .unwrap();

        match outcome.event {
            EventPayload::FilterContextChanged { filter_context } => {
                assert!(filter_context.attribute_filter("city").unwrap().is_all_selected());
                assert!(!filter_context.attribute_filter("region").unwrap().is_all_selected());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
