//! Widget command handlers

use dash_backend::ExecutionDefinition;
use dash_model::{
    DashboardAttributeFilter, DrillDefinition, FilterContextItem, Insight, InsightWidget, Item, LayoutItemPath, ObjRef,
    Widget,
};

use crate::commands::{
    ChangeInsightWidgetFilterSettings, ChangeKpiWidgetFilterSettings, ChangeRichTextContent, ChangeWidgetDescription,
    ChangeWidgetHeader, DrillSelector, FilterSettingsOperation, ModifyDrillsForInsightWidget, RefreshInsightWidget,
    RemoveDrillsForInsightWidget,
};
use crate::error::CommandError;
use crate::events::EventPayload;
use crate::handlers::items::resolve_missing_insights;
use crate::handlers::{HandlerContext, HandlerOutcome};
use crate::store::selectors::{select_insight, select_insight_widget, select_item};
use crate::store::Action;
use crate::validation::validate_drill_custom_url;

fn widget_item(ctx: &HandlerContext<'_>, widget_ref: &ObjRef) -> Result<(LayoutItemPath, Item), CommandError> {
    let path = ctx.widget_path(widget_ref)?;
    let item = select_item(&ctx.state, &path)
        .cloned()
        .ok_or_else(|| CommandError::internal(format!("widget path '{}' is stale", path)))?;
    Ok((path, item))
}

fn unsupported(widget: &Widget, what: &str) -> CommandError {
    CommandError::user(format!("{} widgets have no {}", widget.kind(), what))
}

pub async fn change_widget_header(ctx: &HandlerContext<'_>, cmd: &ChangeWidgetHeader) -> Result<HandlerOutcome, CommandError> {
    let (path, mut item) = widget_item(ctx, &cmd.widget_ref)?;
    match &mut item.widget {
        Widget::Insight(w) => w.title = cmd.title.clone(),
        Widget::Kpi(w) => w.title = cmd.title.clone(),
        Widget::VisualizationSwitcher(w) => w.title = cmd.title.clone(),
        other => return Err(unsupported(other, "header")),
    }

    Ok(HandlerOutcome::new(
        vec![Action::ReplaceItem { path, item }],
        EventPayload::WidgetHeaderChanged {
            widget_ref: cmd.widget_ref.clone(),
            title: cmd.title.clone(),
        },
    ))
}

pub async fn change_widget_description(
    ctx: &HandlerContext<'_>,
    cmd: &ChangeWidgetDescription,
) -> Result<HandlerOutcome, CommandError> {
    let (path, mut item) = widget_item(ctx, &cmd.widget_ref)?;
    match &mut item.widget {
        Widget::Insight(w) => w.description = cmd.description.clone(),
        Widget::Kpi(w) => w.description = cmd.description.clone(),
        other => return Err(unsupported(other, "description")),
    }

    Ok(HandlerOutcome::new(
        vec![Action::ReplaceItem { path, item }],
        EventPayload::WidgetDescriptionChanged {
            widget_ref: cmd.widget_ref.clone(),
            description: cmd.description.clone(),
        },
    ))
}

pub async fn change_rich_text_content(
    ctx: &HandlerContext<'_>,
    cmd: &ChangeRichTextContent,
) -> Result<HandlerOutcome, CommandError> {
    let (path, mut item) = widget_item(ctx, &cmd.widget_ref)?;
    match &mut item.widget {
        Widget::RichText(w) => w.content = cmd.content.clone(),
        other => return Err(unsupported(other, "rich text content")),
    }

    Ok(HandlerOutcome::new(
        vec![Action::ReplaceItem { path, item }],
        EventPayload::RichTextContentChanged {
            widget_ref: cmd.widget_ref.clone(),
            content: cmd.content.clone(),
        },
    ))
}

fn drills_mut<'a>(widget: &'a mut Widget) -> Result<&'a mut Vec<DrillDefinition>, CommandError> {
    match widget {
        Widget::Insight(w) => Ok(&mut w.drills),
        Widget::Kpi(w) => Ok(&mut w.drills),
        other => Err(unsupported(other, "drills")),
    }
}

/// Check drill targets that live in the backend
async fn validate_drill(ctx: &HandlerContext<'_>, drill: &DrillDefinition) -> Result<(), CommandError> {
    match drill {
        DrillDefinition::DrillToCustomUrl { url, .. } => {
            let requested: Vec<ObjRef> = validate_drill_custom_url(url)?
                .into_iter()
                .map(ObjRef::identifier)
                .collect();
            if requested.is_empty() {
                return Ok(());
            }
            let found = ctx.backend.resolve_display_forms(&requested, &ctx.abort).await?;
            if let Some(missing) = requested
                .iter()
                .find(|r| !found.iter().any(|df| &df.display_form_ref == *r))
            {
                return Err(CommandError::user(format!(
                    "custom drill URL references unknown display form {}",
                    missing
                )));
            }
            Ok(())
        }
        DrillDefinition::DrillToInsight { target, .. } => {
            ctx.backend.resolve_insight(target, &ctx.abort).await?;
            Ok(())
        }
        DrillDefinition::DrillToAttributeUrl {
            display_form,
            hyperlink_display_form,
            ..
        } => {
            let requested = [display_form.clone(), hyperlink_display_form.clone()];
            let found = ctx.backend.resolve_display_forms(&requested, &ctx.abort).await?;
            if found.len() < requested.iter().collect::<ahash::AHashSet<_>>().len() {
                return Err(CommandError::user("attribute URL drill references unknown display forms"));
            }
            Ok(())
        }
        DrillDefinition::DrillToDashboard { .. } => Ok(()),
    }
}

pub async fn modify_drills_for_insight_widget(
    ctx: &HandlerContext<'_>,
    cmd: &ModifyDrillsForInsightWidget,
) -> Result<HandlerOutcome, CommandError> {
    let (path, mut item) = widget_item(ctx, &cmd.widget_ref)?;
    if cmd.drills.is_empty() {
        return Err(CommandError::user("no drills to modify"));
    }
    for drill in &cmd.drills {
        validate_drill(ctx, drill).await?;
    }

    let drills = drills_mut(&mut item.widget)?;
    let mut added = Vec::new();
    let mut updated = Vec::new();
    for drill in &cmd.drills {
        match drills.iter_mut().find(|d| d.origin() == drill.origin()) {
            Some(existing) => {
                *existing = drill.clone();
                updated.push(drill.clone());
            }
            None => {
                drills.push(drill.clone());
                added.push(drill.clone());
            }
        }
    }

    Ok(HandlerOutcome::new(
        vec![Action::ReplaceItem { path, item }],
        EventPayload::InsightWidgetDrillsModified {
            widget_ref: cmd.widget_ref.clone(),
            added,
            updated,
        },
    ))
}

pub async fn remove_drills_for_insight_widget(
    ctx: &HandlerContext<'_>,
    cmd: &RemoveDrillsForInsightWidget,
) -> Result<HandlerOutcome, CommandError> {
    let (path, mut item) = widget_item(ctx, &cmd.widget_ref)?;
    let drills = drills_mut(&mut item.widget)?;

    let removed: Vec<DrillDefinition> = match &cmd.origins {
        DrillSelector::All => std::mem::take(drills),
        DrillSelector::Origins(origins) => {
            if let Some(unknown) = origins.iter().find(|o| !drills.iter().any(|d| d.origin() == o.as_str())) {
                return Err(CommandError::user(format!(
                    "widget {} has no drill for origin '{}'",
                    cmd.widget_ref, unknown
                )));
            }
            let (removed, kept) = std::mem::take(drills)
                .into_iter()
                .partition(|d| origins.iter().any(|o| o == d.origin()));
            *drills = kept;
            removed
        }
    };

    Ok(HandlerOutcome::new(
        vec![Action::ReplaceItem { path, item }],
        EventPayload::InsightWidgetDrillsRemoved {
            widget_ref: cmd.widget_ref.clone(),
            removed,
        },
    ))
}

/// Dashboard filters that apply to a widget ignoring `ignored` display forms and data sets
fn applicable_filters(ctx: &HandlerContext<'_>, ignored: &[ObjRef], date_data_set: Option<&ObjRef>) -> Vec<FilterContextItem> {
    ctx.state
        .filter_context()
        .filters
        .iter()
        .filter(|f| match f {
            FilterContextItem::AttributeFilter(a) => !ignored.contains(&a.display_form) && !a.is_all_selected(),
            FilterContextItem::DateFilter(d) => {
                !d.is_all_time() && date_data_set.map_or(false, |data_set| !ignored.contains(data_set))
            }
        })
        .cloned()
        .collect()
}

pub async fn refresh_insight_widget(
    ctx: &HandlerContext<'_>,
    cmd: &RefreshInsightWidget,
) -> Result<HandlerOutcome, CommandError> {
    let (path, item) = widget_item(ctx, &cmd.widget_ref)?;
    let widget = select_insight_widget(&ctx.state, &path)
        .cloned()
        .ok_or_else(|| unsupported(&item.widget, "insight to refresh"))?;
    if !ctx.backend.capabilities().supports_execution {
        return Err(CommandError::NotSupported("backend cannot execute insights".to_string()));
    }

    let resolved = resolve_missing_insights(ctx, std::slice::from_ref(&item)).await?;
    let insight = select_insight(&ctx.state, &widget.insight)
        .or_else(|| resolved.iter().find(|i| i.insight_ref == widget.insight))
        .ok_or_else(|| CommandError::internal(format!("insight {} was not resolved", widget.insight)))?;

    let date_data_set = widget
        .date_data_set
        .clone()
        .or_else(|| insight.preferred_date_data_set().cloned());
    let definition = ExecutionDefinition::for_insight(
        insight,
        applicable_filters(ctx, &widget.ignore_dashboard_filters, date_data_set.as_ref()),
        date_data_set,
    );

    tracing::debug!("Executing insight {} for widget {}", widget.insight, cmd.widget_ref);
    let result = ctx.backend.execute_query(&definition, &ctx.abort).await?;

    let mut actions = Vec::new();
    if !resolved.is_empty() {
        actions.push(Action::AddInsights { insights: resolved });
    }
    actions.push(Action::SetExecution {
        widget_ref: cmd.widget_ref.clone(),
        result: result.clone(),
    });

    Ok(HandlerOutcome::new(
        actions,
        EventPayload::InsightWidgetRefreshed {
            widget_ref: cmd.widget_ref.clone(),
            result,
        },
    ))
}

fn requested_date_data_set(operation: &FilterSettingsOperation) -> Option<&ObjRef> {
    match operation {
        FilterSettingsOperation::Replace { date_data_set, .. } => date_data_set.as_ref(),
        FilterSettingsOperation::EnableDateFilter { date_data_set } => Some(date_data_set),
        _ => None,
    }
}

/// Display forms the operation starts ignoring
fn requested_ignores(operation: &FilterSettingsOperation) -> &[ObjRef] {
    match operation {
        FilterSettingsOperation::Replace {
            ignore_attribute_filters, ..
        } => ignore_attribute_filters,
        FilterSettingsOperation::ReplaceAttributeIgnores { display_forms }
        | FilterSettingsOperation::IgnoreAttributeFilter { display_forms } => display_forms,
        _ => &[],
    }
}

/// Only existing display forms used by a dashboard attribute filter can be ignored
async fn validate_ignores(ctx: &HandlerContext<'_>, requested: &[ObjRef]) -> Result<(), CommandError> {
    if requested.is_empty() {
        return Ok(());
    }
    let found = ctx.backend.resolve_display_forms(requested, &ctx.abort).await?;
    if let Some(missing) = requested
        .iter()
        .find(|r| !found.iter().any(|df| &df.display_form_ref == *r))
    {
        return Err(CommandError::user(format!("unknown display form {}", missing)));
    }
    let filter_context = ctx.state.filter_context();
    if let Some(unused) = requested
        .iter()
        .find(|r| filter_context.attribute_filter_by_display_form(r).is_none())
    {
        return Err(CommandError::user(format!(
            "no dashboard attribute filter uses display form {}",
            unused
        )));
    }
    Ok(())
}

fn apply_filter_settings(operation: &FilterSettingsOperation, ignored: &mut Vec<ObjRef>, date_data_set: &mut Option<ObjRef>) {
    fn extend_distinct(ignored: &mut Vec<ObjRef>, refs: &[ObjRef]) {
        for r in refs {
            if !ignored.contains(r) {
                ignored.push(r.clone());
            }
        }
    }

    match operation {
        FilterSettingsOperation::Replace {
            date_data_set: data_set,
            ignore_attribute_filters,
        } => {
            *date_data_set = data_set.clone();
            ignored.clear();
            extend_distinct(ignored, ignore_attribute_filters);
        }
        FilterSettingsOperation::EnableDateFilter { date_data_set: data_set } => *date_data_set = Some(data_set.clone()),
        FilterSettingsOperation::DisableDateFilter => *date_data_set = None,
        FilterSettingsOperation::ReplaceAttributeIgnores { display_forms } => {
            ignored.clear();
            extend_distinct(ignored, display_forms);
        }
        FilterSettingsOperation::IgnoreAttributeFilter { display_forms } => extend_distinct(ignored, display_forms),
        FilterSettingsOperation::UnignoreAttributeFilter { display_forms } => ignored.retain(|r| !display_forms.contains(r)),
    }
}

fn ignored_attribute_filters(ctx: &HandlerContext<'_>, ignored: &[ObjRef]) -> Vec<DashboardAttributeFilter> {
    ctx.state
        .filter_context()
        .attribute_filters()
        .filter(|f| ignored.contains(&f.display_form))
        .cloned()
        .collect()
}

/// The data set must be one the widget's insight can be filtered by
async fn validate_insight_date_data_set(
    ctx: &HandlerContext<'_>,
    item: &Item,
    widget: &InsightWidget,
    data_set: &ObjRef,
) -> Result<Vec<Insight>, CommandError> {
    let resolved = resolve_missing_insights(ctx, std::slice::from_ref(item)).await?;
    let insight = select_insight(&ctx.state, &widget.insight)
        .or_else(|| resolved.iter().find(|i| i.insight_ref == widget.insight))
        .ok_or_else(|| CommandError::internal(format!("insight {} was not resolved", widget.insight)))?;

    let available = ctx.backend.date_datasets_for_insight(insight, &ctx.abort).await?;
    if !available.contains(data_set) {
        return Err(CommandError::user(format!(
            "date data set {} cannot filter insight {}",
            data_set, widget.insight
        )));
    }
    Ok(resolved)
}

pub async fn change_insight_widget_filter_settings(
    ctx: &HandlerContext<'_>,
    cmd: &ChangeInsightWidgetFilterSettings,
) -> Result<HandlerOutcome, CommandError> {
    let (path, mut item) = widget_item(ctx, &cmd.widget_ref)?;
    let mut widget = match &item.widget {
        Widget::Insight(w) => w.clone(),
        other => return Err(unsupported(other, "insight filter settings")),
    };

    validate_ignores(ctx, requested_ignores(&cmd.operation)).await?;
    let resolved = match requested_date_data_set(&cmd.operation) {
        Some(data_set) => validate_insight_date_data_set(ctx, &item, &widget, data_set).await?,
        None => Vec::new(),
    };

    apply_filter_settings(&cmd.operation, &mut widget.ignore_dashboard_filters, &mut widget.date_data_set);
    let event = EventPayload::InsightWidgetFilterSettingsChanged {
        widget_ref: cmd.widget_ref.clone(),
        ignored_attribute_filters: ignored_attribute_filters(ctx, &widget.ignore_dashboard_filters),
        date_data_set: widget.date_data_set.clone(),
    };
    item.widget = Widget::Insight(widget);

    let mut actions = Vec::new();
    if !resolved.is_empty() {
        actions.push(Action::AddInsights { insights: resolved });
    }
    actions.push(Action::ReplaceItem { path, item });
    Ok(HandlerOutcome::new(actions, event))
}

pub async fn change_kpi_widget_filter_settings(
    ctx: &HandlerContext<'_>,
    cmd: &ChangeKpiWidgetFilterSettings,
) -> Result<HandlerOutcome, CommandError> {
    let (path, mut item) = widget_item(ctx, &cmd.widget_ref)?;
    let mut widget = match &item.widget {
        Widget::Kpi(w) => w.clone(),
        other => return Err(unsupported(other, "KPI filter settings")),
    };

    validate_ignores(ctx, requested_ignores(&cmd.operation)).await?;
    if let Some(data_set) = requested_date_data_set(&cmd.operation) {
        let available = ctx.backend.catalog_date_datasets(&ctx.abort).await?;
        if !available.contains(data_set) {
            return Err(CommandError::user(format!("unknown date data set {}", data_set)));
        }
    }

    apply_filter_settings(&cmd.operation, &mut widget.ignore_dashboard_filters, &mut widget.date_data_set);
    let event = EventPayload::KpiWidgetFilterSettingsChanged {
        widget_ref: cmd.widget_ref.clone(),
        ignored_attribute_filters: ignored_attribute_filters(ctx, &widget.ignore_dashboard_filters),
        date_data_set: widget.date_data_set.clone(),
    };
    item.widget = Widget::Kpi(widget);

    Ok(HandlerOutcome::new(vec![Action::ReplaceItem { path, item }], event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{context_parts, context_parts_with};
    use dash_backend::InMemoryBackend;
    use dash_model::{Dashboard, KpiWidget, Layout, RichTextWidget, Section};

    fn dashboard() -> Dashboard {
        let mut insight = Widget::Insight(InsightWidget::new("Revenue", ObjRef::identifier("revenue")));
        insight.set_widget_ref(ObjRef::identifier("w1"));
        let mut text = Widget::RichText(RichTextWidget::new("notes"));
        text.set_widget_ref(ObjRef::identifier("w2"));

        let mut dashboard = Dashboard::new("Test");
        dashboard.layout = Layout::new(vec![Section::new(vec![Item::new(insight, 6), Item::new(text, 6)])]);
        dashboard
    }

    #[tokio::test]
    async fn test_header_only_for_titled_widgets() {
        let parts = context_parts(dashboard());
        let ctx = parts.context();

        let outcome = change_widget_header(&ctx, &ChangeWidgetHeader {
            widget_ref: ObjRef::identifier("w1"),
            title: "Income".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(outcome.actions.len(), 1);

        let error = change_widget_header(&ctx, &ChangeWidgetHeader {
            widget_ref: ObjRef::identifier("w2"),
            title: "Notes".to_string(),
        })
        .await
        .unwrap_err();
        assert!(matches!(error, CommandError::User(_)));
    }

    #[tokio::test]
    async fn test_modify_drills_replaces_by_origin() {
        let backend = InMemoryBackend::new()
            .with_display_form(ObjRef::identifier("label.region"), ObjRef::identifier("attr.region"), "Region");
        let parts = context_parts_with(dashboard(), backend);
        let ctx = parts.context();

        let outcome = modify_drills_for_insight_widget(&ctx, &ModifyDrillsForInsightWidget {
            widget_ref: ObjRef::identifier("w1"),
            drills: vec![DrillDefinition::DrillToCustomUrl {
                origin: "m1".to_string(),
                url: "https://x/?r={attribute_title(label.region)}".to_string(),
            }],
        })
        .await
        .unwrap();

        match outcome.event {
            EventPayload::InsightWidgetDrillsModified { added, updated, .. } => {
                assert_eq!(added.len(), 1);
                assert!(updated.is_empty());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_custom_url_with_unknown_display_form() {
        let parts = context_parts(dashboard());
        let ctx = parts.context();

        let error = modify_drills_for_insight_widget(&ctx, &ModifyDrillsForInsightWidget {
            widget_ref: ObjRef::identifier("w1"),
            drills: vec![DrillDefinition::DrillToCustomUrl {
                origin: "m1".to_string(),
                url: "https://x/?r={attribute_title(label.nope)}".to_string(),
            }],
        })
        .await
        .unwrap_err();

        assert!(matches!(error, CommandError::User(_)));
    }

    #[tokio::test]
    async fn test_remove_unknown_drill_origin() {
        let parts = context_parts(dashboard());
        let ctx = parts.context();

        let error = remove_drills_for_insight_widget(&ctx, &RemoveDrillsForInsightWidget {
            widget_ref: ObjRef::identifier("w1"),
            origins: DrillSelector::Origins(vec!["m9".to_string()]),
        })
        .await
        .unwrap_err();

        assert!(matches!(error, CommandError::User(_)));
    }

    fn filtered_dashboard() -> Dashboard {
        let kpi = Widget::Kpi(KpiWidget {
            widget_ref: Some(ObjRef::identifier("k1")),
            title: "Orders".to_string(),
            description: String::new(),
            measure: ObjRef::identifier("m.orders"),
            comparison: None,
            drills: Vec::new(),
            ignore_dashboard_filters: Vec::new(),
            date_data_set: None,
        });
        let mut dashboard = dashboard();
        dashboard.layout.sections[0].items.push(Item::new(kpi, 4));
        dashboard
            .filter_context
            .insert_attribute_filter(0, DashboardAttributeFilter::new(ObjRef::identifier("label.region")));
        dashboard
    }

    fn filtered_backend() -> InMemoryBackend {
        let mut revenue = Insight::new(ObjRef::identifier("revenue"), "Revenue", "bar");
        revenue.date_data_sets = vec![ObjRef::identifier("dt.order")];
        InMemoryBackend::new()
            .with_insight(revenue)
            .with_display_form(ObjRef::identifier("label.region"), ObjRef::identifier("attr.region"), "Region")
            .with_display_form(ObjRef::identifier("label.city"), ObjRef::identifier("attr.city"), "City")
            .with_date_data_set(ObjRef::identifier("dt.invoice"))
    }

    fn replaced_widget(outcome: &HandlerOutcome) -> &Widget {
        outcome
            .actions
            .iter()
            .find_map(|a| match a {
                Action::ReplaceItem { item, .. } => Some(&item.widget),
                _ => None,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_insight_filter_settings_replace() {
        let parts = context_parts_with(filtered_dashboard(), filtered_backend());
        let ctx = parts.context();

        let outcome = change_insight_widget_filter_settings(&ctx, &ChangeInsightWidgetFilterSettings {
            widget_ref: ObjRef::identifier("w1"),
            operation: FilterSettingsOperation::Replace {
                date_data_set: Some(ObjRef::identifier("dt.order")),
                ignore_attribute_filters: vec![ObjRef::identifier("label.region")],
            },
        })
        .await
        .unwrap();

        assert!(matches!(outcome.actions[0], Action::AddInsights { .. }));
        match replaced_widget(&outcome) {
            Widget::Insight(w) => {
                assert_eq!(w.ignore_dashboard_filters, vec![ObjRef::identifier("label.region")]);
                assert_eq!(w.date_data_set, Some(ObjRef::identifier("dt.order")));
            }
            other => panic!("unexpected widget {:?}", other),
        }
        match outcome.event {
            EventPayload::InsightWidgetFilterSettingsChanged {
                ignored_attribute_filters,
                date_data_set,
                ..
            } => {
                assert_eq!(ignored_attribute_filters.len(), 1);
                assert_eq!(ignored_attribute_filters[0].display_form, ObjRef::identifier("label.region"));
                assert_eq!(date_data_set, Some(ObjRef::identifier("dt.order")));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_insight_filter_settings_reject_foreign_date_data_set() {
        let parts = context_parts_with(filtered_dashboard(), filtered_backend());
        let ctx = parts.context();

        let error = change_insight_widget_filter_settings(&ctx, &ChangeInsightWidgetFilterSettings {
            widget_ref: ObjRef::identifier("w1"),
            operation: FilterSettingsOperation::EnableDateFilter {
                date_data_set: ObjRef::identifier("dt.invoice"),
            },
        })
        .await
        .unwrap_err();

        assert!(matches!(error, CommandError::User(_)));
    }

    #[tokio::test]
    async fn test_ignore_requires_known_and_filtered_display_form() {
        let parts = context_parts_with(filtered_dashboard(), filtered_backend());
        let ctx = parts.context();

        for display_form in ["label.city", "label.nope"] {
            let error = change_kpi_widget_filter_settings(&ctx, &ChangeKpiWidgetFilterSettings {
                widget_ref: ObjRef::identifier("k1"),
                operation: FilterSettingsOperation::IgnoreAttributeFilter {
                    display_forms: vec![ObjRef::identifier(display_form)],
                },
            })
            .await
            .unwrap_err();
            assert!(matches!(error, CommandError::User(_)), "{}", display_form);
        }
    }

    #[tokio::test]
    async fn test_kpi_filter_settings_use_catalog_date_data_sets() {
        let parts = context_parts_with(filtered_dashboard(), filtered_backend());
        let ctx = parts.context();
        let enable = |id: &str| ChangeKpiWidgetFilterSettings {
            widget_ref: ObjRef::identifier("k1"),
            operation: FilterSettingsOperation::EnableDateFilter {
                date_data_set: ObjRef::identifier(id),
            },
        };

        let outcome = change_kpi_widget_filter_settings(&ctx, &enable("dt.invoice")).await.unwrap();
        match replaced_widget(&outcome) {
            Widget::Kpi(w) => assert_eq!(w.date_data_set, Some(ObjRef::identifier("dt.invoice"))),
            other => panic!("unexpected widget {:?}", other),
        }

        let error = change_kpi_widget_filter_settings(&ctx, &enable("dt.nope")).await.unwrap_err();
        assert!(matches!(error, CommandError::User(_)));
    }

    #[tokio::test]
    async fn test_filter_settings_command_must_match_widget_kind() {
        let parts = context_parts_with(filtered_dashboard(), filtered_backend());
        let ctx = parts.context();

        let error = change_insight_widget_filter_settings(&ctx, &ChangeInsightWidgetFilterSettings {
            widget_ref: ObjRef::identifier("k1"),
            operation: FilterSettingsOperation::DisableDateFilter,
        })
        .await
        .unwrap_err();
        assert!(matches!(error, CommandError::User(_)));

        let error = change_kpi_widget_filter_settings(&ctx, &ChangeKpiWidgetFilterSettings {
            widget_ref: ObjRef::identifier("w1"),
            operation: FilterSettingsOperation::DisableDateFilter,
        })
        .await
        .unwrap_err();
        assert!(matches!(error, CommandError::User(_)));
    }

    #[test]
    fn test_apply_filter_settings_operations() {
        let region = ObjRef::identifier("label.region");
        let city = ObjRef::identifier("label.city");
        let order = ObjRef::identifier("dt.order");
        let mut ignored = Vec::new();
        let mut date_data_set = Some(order.clone());

        let ignore = FilterSettingsOperation::IgnoreAttributeFilter {
            display_forms: vec![region.clone()],
        };
        apply_filter_settings(&ignore, &mut ignored, &mut date_data_set);
        apply_filter_settings(&ignore, &mut ignored, &mut date_data_set);
        assert_eq!(ignored, vec![region.clone()]);

        apply_filter_settings(
            &FilterSettingsOperation::UnignoreAttributeFilter {
                display_forms: vec![city.clone()],
            },
            &mut ignored,
            &mut date_data_set,
        );
        assert_eq!(ignored, vec![region.clone()]);

        apply_filter_settings(&FilterSettingsOperation::DisableDateFilter, &mut ignored, &mut date_data_set);
        assert_eq!(date_data_set, None);
        assert_eq!(ignored, vec![region.clone()]);

        apply_filter_settings(
            &FilterSettingsOperation::Replace {
                date_data_set: Some(order.clone()),
                ignore_attribute_filters: vec![city.clone()],
            },
            &mut ignored,
            &mut date_data_set,
        );
        assert_eq!(ignored, vec![city]);
        assert_eq!(date_data_set, Some(order));
    }
}
