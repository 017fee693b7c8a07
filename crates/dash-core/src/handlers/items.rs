//! Preparation of items entering the layout
//!
//! New items get temporary widget identities, their insights are resolved into the cache and
//! their sizes are normalized against the place they land in.

use dash_model::sizing::normalize_item_size_to_parent;
use dash_model::{Insight, InsightMap, Item, Layout, LayoutItemPath, ObjRef, Widget};

use crate::error::CommandError;
use crate::handlers::HandlerContext;

/// Items ready to be placed, with the insights they need
#[derive(Debug, Clone, Default)]
pub struct PreparedItems {
    pub items: Vec<Item>,
    /// Insights missing from the cache, resolved for these items
    pub insights: Vec<Insight>,
}

/// Give every widget without identity a temporary one, including widgets of nested layouts
pub fn assign_identities(item: &mut Item) {
    if item.widget.widget_ref().is_none() {
        item.widget.set_widget_ref(ObjRef::temporary());
    }
    if let Some(nested) = item.nested_layout_mut() {
        nested.for_each_widget_mut(|widget| {
            if widget.widget_ref().is_none() {
                widget.set_widget_ref(ObjRef::temporary());
            }
        });
    }
}

fn insight_refs(item: &Item) -> Vec<ObjRef> {
    let mut refs: Vec<ObjRef> = item.widget.insight_refs().into_iter().cloned().collect();
    if let Some(nested) = item.nested_layout() {
        for widget in nested.widgets() {
            refs.extend(widget.insight_refs().into_iter().cloned());
        }
    }
    refs
}

/// Resolve insights referenced by `items` that the cache does not hold yet
pub async fn resolve_missing_insights(ctx: &HandlerContext<'_>, items: &[Item]) -> Result<Vec<Insight>, CommandError> {
    let mut resolved: Vec<Insight> = Vec::new();
    for insight_ref in items.iter().flat_map(insight_refs) {
        if ctx.state.insights.contains_key(&insight_ref) || resolved.iter().any(|i| i.insight_ref == insight_ref) {
            continue;
        }
        tracing::debug!("Resolving insight {}", insight_ref);
        resolved.push(ctx.backend.resolve_insight(&insight_ref, &ctx.abort).await?);
    }
    Ok(resolved)
}

/// Cached insights plus freshly resolved ones
pub fn merged_insights(cached: &InsightMap, resolved: &[Insight]) -> InsightMap {
    let mut insights = cached.clone();
    for insight in resolved {
        insights.insert(insight.insight_ref.clone(), insight.clone());
    }
    insights
}

/// Fill in the date data set of insight widgets that have none
async fn resolve_date_data_sets(
    ctx: &HandlerContext<'_>,
    item: &mut Item,
    insights: &InsightMap,
) -> Result<(), CommandError> {
    let Widget::Insight(widget) = &mut item.widget else {
        return Ok(());
    };
    if widget.date_data_set.is_some() {
        return Ok(());
    }
    if let Some(insight) = insights.get(&widget.insight) {
        let data_sets = ctx.backend.date_datasets_for_insight(insight, &ctx.abort).await?;
        widget.date_data_set = data_sets.into_iter().next();
    }
    Ok(())
}

/// Prepare `items` to be placed at consecutive positions starting at `first_path`
///
/// `layout` is the layout the items are placed into, used for the parent width.
pub async fn prepare_items(
    ctx: &HandlerContext<'_>,
    items: Vec<Item>,
    layout: &Layout,
    first_path: &LayoutItemPath,
    auto_resolve_date_data_set: bool,
) -> Result<PreparedItems, CommandError> {
    let resolved = resolve_missing_insights(ctx, &items).await?;
    let insights = merged_insights(&ctx.state.insights, &resolved);
    let auto_resolve = auto_resolve_date_data_set || ctx.settings.auto_resolve_date_data_sets;
    let Some(first) = first_path.last().copied() else {
        return Err(CommandError::internal("items placed at an empty path"));
    };

    let mut prepared = Vec::with_capacity(items.len());
    for (offset, mut item) in items.into_iter().enumerate() {
        assign_identities(&mut item);
        if auto_resolve {
            resolve_date_data_sets(ctx, &mut item, &insights).await?;
        }
        let path = dash_model::coordinates::update_item_index(first_path, first.item_index + offset);
        prepared.push(normalize_item_size_to_parent(
            &item,
            &path,
            layout,
            &ctx.settings.sizing,
            &insights,
            ctx.settings.screen,
        ));
    }

    Ok(PreparedItems {
        items: prepared,
        insights: resolved,
    })
}
