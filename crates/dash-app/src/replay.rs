//! Replaying a command script through the runtime

use std::sync::Arc;

use anyhow::Result;
use dash_backend::InMemoryBackend;
use dash_core::{Command, DashboardEvent, DashboardRuntime, DashboardState, EngineSettings};
use dash_model::Dashboard;
use tracing::{info, warn};

/// Outcome of a replay
#[derive(Debug)]
pub struct ReplayReport {
    /// Terminal events in dispatch order
    pub events: Vec<DashboardEvent>,
    /// Dashboard as it stands after the last command
    pub dashboard: Dashboard,
    pub failed: usize,
    pub cancelled: usize,
}

/// Run `commands` against `dashboard`
///
/// All commands are queued up front, so supersedable commands behave as they would under a
/// burst of user input.
pub async fn replay(
    dashboard: Dashboard,
    commands: Vec<Command>,
    backend: InMemoryBackend,
    settings: EngineSettings,
) -> Result<ReplayReport> {
    let state = if dashboard.dashboard_ref.is_some() {
        DashboardState::loaded(dashboard.clone())
    } else {
        DashboardState::new(dashboard.clone())
    };
    let backend = Arc::new(backend.with_dashboard(dashboard));
    let runtime = DashboardRuntime::new(state, backend, settings);

    info!("Replaying {} commands", commands.len());
    let tickets: Vec<_> = commands.into_iter().map(|command| runtime.dispatch(command)).collect();

    let mut events = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        let event = ticket.wait().await?;
        if let Some(reason) = event.failure_reason() {
            warn!("{:?} failed with {:?}", event.correlation_id, reason);
        }
        events.push(event);
    }

    let dashboard = runtime.state().dashboard.clone();
    runtime.shutdown().await;

    let failed = events.iter().filter(|e| e.failure_reason().is_some()).count();
    let cancelled = events.iter().filter(|e| e.is_cancelled()).count();
    Ok(ReplayReport {
        events,
        dashboard,
        failed,
        cancelled,
    })
}

/// Human readable outline of a dashboard
pub fn outline(dashboard: &Dashboard) -> String {
    let mut lines = vec![format!(
        "{} ({})",
        dashboard.title,
        dashboard
            .dashboard_ref
            .as_ref()
            .map_or_else(|| "unsaved".to_string(), |r| r.to_string())
    )];

    for (index, section) in dashboard.layout.sections.iter().enumerate() {
        let title = section.header.as_ref().and_then(|h| h.title.as_deref()).unwrap_or("untitled");
        lines.push(format!("  section {} \"{}\": {} items", index, title, section.items.len()));
        for item in &section.items {
            let widget_ref = item
                .widget
                .widget_ref()
                .map_or_else(|| "-".to_string(), |r| r.to_string());
            lines.push(format!("    {} {} width {}", item.widget.kind(), widget_ref, item.size.xl.grid_width));
        }
    }

    if let Some(date) = dashboard.filter_context.date_filter() {
        let range = if date.is_all_time() { "all time" } else { "bounded" };
        lines.push(format!("  date filter: {}", range));
    }
    for filter in dashboard.filter_context.attribute_filters() {
        let selection = if filter.is_all_selected() {
            "all".to_string()
        } else {
            format!("{} elements", filter.attribute_elements.len())
        };
        lines.push(format!("  attribute filter {} on {}: {}", filter.local_identifier, filter.display_form, selection));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::commands::{AddLayoutSection, MoveLayoutSection, RenameDashboard};
    use dash_model::{Item, Layout, RichTextWidget, Section, Widget};

    fn dashboard() -> Dashboard {
        let mut dashboard = Dashboard::new("Sales");
        dashboard.layout = Layout::new(vec![Section::new(vec![Item::new(
            Widget::RichText(RichTextWidget::new("intro")),
            12,
        )])]);
        dashboard
    }

    #[tokio::test]
    async fn test_replay_reports_failures() {
        let commands = vec![
            Command::new(AddLayoutSection::default()).with_correlation_id("add"),
            Command::new(MoveLayoutSection {
                section_index: 7,
                to_index: 0,
            })
            .with_correlation_id("bad-move"),
            Command::new(RenameDashboard {
                title: "Sales 2024".to_string(),
            }),
        ];

        let report = replay(dashboard(), commands, InMemoryBackend::new(), EngineSettings::default())
            .await
            .unwrap();

        assert_eq!(report.events.len(), 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.cancelled, 0);
        assert_eq!(report.dashboard.title, "Sales 2024");
        assert_eq!(report.dashboard.layout.sections.len(), 2);
    }

    #[test]
    fn test_outline_lists_sections() {
        let text = outline(&dashboard());

        assert!(text.starts_with("Sales (unsaved)"));
        assert!(text.contains("section 0 \"untitled\": 1 items"));
        assert!(text.contains("richText - width 12"));
    }
}
