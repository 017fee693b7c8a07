//! Dashboard lifecycle handlers

use ahash::AHashMap;
use dash_backend::BackendError;
use dash_model::{Dashboard, Insight, ObjRef};

use crate::commands::{LoadDashboard, RenameDashboard, ResetDashboard, SaveDashboard};
use crate::error::CommandError;
use crate::events::EventPayload;
use crate::handlers::{HandlerContext, HandlerOutcome, HistoryEffect};
use crate::store::Action;

/// Identities the backend gave to widgets that only had temporary ones
///
/// The saved layout has the same shape as the one sent, so widgets pair up in walk order.
fn saved_identities(sent: &Dashboard, saved: &Dashboard) -> AHashMap<ObjRef, ObjRef> {
    sent.layout
        .widgets()
        .into_iter()
        .zip(saved.layout.widgets())
        .filter_map(|(before, after)| match (before.widget_ref(), after.widget_ref()) {
            (Some(old), Some(new)) if old.is_temporary() && old != new => Some((old.clone(), new.clone())),
            _ => None,
        })
        .collect()
}

/// Resolve the insights of a freshly loaded dashboard
///
/// Insights that no longer exist are skipped; their widgets render as broken.
async fn resolve_dashboard_insights(ctx: &HandlerContext<'_>, dashboard: &Dashboard) -> Result<Vec<Insight>, CommandError> {
    let mut refs: Vec<ObjRef> = Vec::new();
    for widget in dashboard.layout.widgets() {
        for insight_ref in widget.insight_refs() {
            if !refs.contains(insight_ref) {
                refs.push(insight_ref.clone());
            }
        }
    }

    let mut insights = Vec::with_capacity(refs.len());
    for insight_ref in refs {
        match ctx.backend.resolve_insight(&insight_ref, &ctx.abort).await {
            Ok(insight) => insights.push(insight),
            Err(BackendError::NotFound(_)) => tracing::warn!("Dashboard references missing insight {}", insight_ref),
            Err(error) => return Err(error.into()),
        }
    }
    Ok(insights)
}

pub async fn load_dashboard(ctx: &HandlerContext<'_>, cmd: &LoadDashboard) -> Result<HandlerOutcome, CommandError> {
    let dashboard = ctx.backend.load_dashboard(&cmd.dashboard_ref, &ctx.abort).await?;
    let insights = resolve_dashboard_insights(ctx, &dashboard).await?;
    tracing::info!(
        "Loaded dashboard '{}' with {} sections and {} insights",
        dashboard.title,
        dashboard.layout.sections.len(),
        insights.len()
    );

    Ok(HandlerOutcome::new(
        vec![
            Action::ReplaceDashboard {
                dashboard: dashboard.clone(),
            },
            Action::AddInsights { insights },
            Action::SetPersisted {
                dashboard: dashboard.clone(),
            },
        ],
        EventPayload::DashboardLoaded { dashboard },
    )
    .with_history(HistoryEffect::Clear))
}

pub async fn save_dashboard(ctx: &HandlerContext<'_>, _cmd: &SaveDashboard) -> Result<HandlerOutcome, CommandError> {
    if ctx.state.dashboard.is_locked {
        return Err(CommandError::user("dashboard is locked"));
    }
    let new_dashboard = ctx.state.dashboard.dashboard_ref.is_none();
    let saved = ctx.backend.save_dashboard(&ctx.state.dashboard, &ctx.abort).await?;
    let dashboard_ref = saved
        .dashboard_ref
        .clone()
        .ok_or_else(|| CommandError::internal("backend saved the dashboard without a reference"))?;
    if !saved.temporary_widgets().is_empty() {
        return Err(CommandError::internal("backend left temporary widget identities in place"));
    }
    let identities = saved_identities(&ctx.state.dashboard, &saved);

    Ok(HandlerOutcome::new(
        vec![Action::ApplySaved { dashboard: saved }],
        EventPayload::DashboardSaved {
            dashboard_ref,
            new_dashboard,
        },
    )
    .with_history(HistoryEffect::RemapWidgetRefs(identities)))
}

pub async fn rename_dashboard(ctx: &HandlerContext<'_>, cmd: &RenameDashboard) -> Result<HandlerOutcome, CommandError> {
    let title = cmd.title.trim();
    if title.is_empty() {
        return Err(CommandError::user("dashboard title must not be empty"));
    }
    if ctx.state.dashboard.is_locked {
        return Err(CommandError::user("dashboard is locked"));
    }

    Ok(HandlerOutcome::new(
        vec![Action::SetTitle {
            title: title.to_string(),
        }],
        EventPayload::DashboardRenamed {
            title: title.to_string(),
        },
    ))
}

pub async fn reset_dashboard(ctx: &HandlerContext<'_>, _cmd: &ResetDashboard) -> Result<HandlerOutcome, CommandError> {
    let persisted = ctx
        .state
        .persisted
        .clone()
        .ok_or_else(|| CommandError::user("dashboard was never loaded or saved, nothing to reset to"))?;

    Ok(HandlerOutcome::new(
        vec![Action::ReplaceDashboard {
            dashboard: persisted.clone(),
        }],
        EventPayload::DashboardWasReset { dashboard: persisted },
    )
    .with_history(HistoryEffect::Clear))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{context_parts, text_item};
    use dash_model::{Layout, Section};

    #[tokio::test]
    async fn test_reset_needs_persisted_version() {
        let parts = context_parts(Dashboard::new("Draft"));
        let ctx = parts.context();

        let error = reset_dashboard(&ctx, &ResetDashboard {}).await.unwrap_err();
        assert!(matches!(error, CommandError::User(_)));
    }

    #[tokio::test]
    async fn test_rename_trims_title() {
        let parts = context_parts(Dashboard::new("Draft"));
        let ctx = parts.context();

        let outcome = rename_dashboard(&ctx, &RenameDashboard {
            title: "  Sales  ".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(outcome.event, EventPayload::DashboardRenamed {
            title: "Sales".to_string()
        });

        assert!(rename_dashboard(&ctx, &RenameDashboard { title: " ".to_string() })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_save_reports_new_widget_identities() {
        let mut dashboard = Dashboard::new("Draft");
        dashboard.layout = Layout::new(vec![Section::new(vec![text_item("kept"), text_item("fresh")])]);
        dashboard.layout.sections[0].items[0]
            .widget
            .set_widget_ref(ObjRef::identifier("kept"));
        dashboard.layout.sections[0].items[1]
            .widget
            .set_widget_ref(ObjRef::temporary());
        let temporary = dashboard.layout.sections[0].items[1].widget.widget_ref().cloned().unwrap();
        let parts = context_parts(dashboard);
        let ctx = parts.context();

        let outcome = save_dashboard(&ctx, &SaveDashboard {}).await.unwrap();

        let HistoryEffect::RemapWidgetRefs(identities) = &outcome.history else {
            panic!("unexpected history effect {:?}", outcome.history);
        };
        assert_eq!(identities.len(), 1);
        assert!(!identities.get(&temporary).unwrap().is_temporary());
    }

    #[tokio::test]
    async fn test_missing_dashboard_is_user_error() {
        let parts = context_parts(Dashboard::new("Draft"));
        let ctx = parts.context();

        let error = load_dashboard(&ctx, &LoadDashboard {
            dashboard_ref: ObjRef::identifier("nope"),
        })
        .await
        .unwrap_err();
        assert!(matches!(error, CommandError::User(_)));
    }
}
