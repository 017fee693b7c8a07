//! Dashboard widgets
//!
//! A widget is anything that can be placed into a layout item. Container widgets
//! carry a nested [`Layout`], which is what makes layout paths multi-level.

use serde::{Deserialize, Serialize};

use crate::layout::Layout;
use crate::refs::ObjRef;

/// Widget placed in a layout item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Widget {
    Insight(InsightWidget),
    Kpi(KpiWidget),
    RichText(RichTextWidget),
    VisualizationSwitcher(VisualizationSwitcherWidget),
    Container(ContainerWidget),
    Custom(CustomWidget),
}

/// Widget rendering a saved insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightWidget {
    /// Widget identity; absent for definitions that were never placed
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub widget_ref: Option<ObjRef>,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// The insight rendered by this widget
    pub insight: ObjRef,

    #[serde(default)]
    pub drills: Vec<DrillDefinition>,

    /// Dashboard filters (by display form or data set) this widget ignores
    #[serde(default)]
    pub ignore_dashboard_filters: Vec<ObjRef>,

    /// Date data set used when applying the dashboard date filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_data_set: Option<ObjRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
}

/// Key performance indicator widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiWidget {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub widget_ref: Option<ObjRef>,

    pub title: String,

    #[serde(default)]
    pub description: String,

    pub measure: ObjRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<String>,

    #[serde(default)]
    pub drills: Vec<DrillDefinition>,

    #[serde(default)]
    pub ignore_dashboard_filters: Vec<ObjRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_data_set: Option<ObjRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextWidget {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub widget_ref: Option<ObjRef>,

    pub content: String,
}

/// Widget switching between several insight visualizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationSwitcherWidget {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub widget_ref: Option<ObjRef>,

    #[serde(default)]
    pub title: String,

    pub visualizations: Vec<InsightWidget>,
}

/// Direction in which a container lays out its sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContainerDirection {
    #[default]
    Row,
    Column,
}

/// Widget holding a nested layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerWidget {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub widget_ref: Option<ObjRef>,

    pub layout: Layout,

    #[serde(default)]
    pub direction: ContainerDirection,

    #[serde(default)]
    pub section_headers_enabled: bool,
}

/// Widget defined by an embedding application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomWidget {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub widget_ref: Option<ObjRef>,

    pub custom_type: String,

    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Drill interaction configured on an insight or KPI widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DrillDefinition {
    #[serde(rename_all = "camelCase")]
    DrillToInsight { origin: String, target: ObjRef },
    #[serde(rename_all = "camelCase")]
    DrillToDashboard { origin: String, target: Option<ObjRef> },
    #[serde(rename_all = "camelCase")]
    DrillToCustomUrl { origin: String, url: String },
    #[serde(rename_all = "camelCase")]
    DrillToAttributeUrl { origin: String, display_form: ObjRef, hyperlink_display_form: ObjRef },
}

impl DrillDefinition {
    /// Local identifier of the measure or attribute the drill originates from
    pub fn origin(&self) -> &str {
        match self {
            DrillDefinition::DrillToInsight { origin, .. }
            | DrillDefinition::DrillToDashboard { origin, .. }
            | DrillDefinition::DrillToCustomUrl { origin, .. }
            | DrillDefinition::DrillToAttributeUrl { origin, .. } => origin,
        }
    }
}

impl Widget {
    /// Widget identity, if it has one
    pub fn widget_ref(&self) -> Option<&ObjRef> {
        match self {
            Widget::Insight(w) => w.widget_ref.as_ref(),
            Widget::Kpi(w) => w.widget_ref.as_ref(),
            Widget::RichText(w) => w.widget_ref.as_ref(),
            Widget::VisualizationSwitcher(w) => w.widget_ref.as_ref(),
            Widget::Container(w) => w.widget_ref.as_ref(),
            Widget::Custom(w) => w.widget_ref.as_ref(),
        }
    }

    pub fn set_widget_ref(&mut self, r: ObjRef) {
        let slot = match self {
            Widget::Insight(w) => &mut w.widget_ref,
            Widget::Kpi(w) => &mut w.widget_ref,
            Widget::RichText(w) => &mut w.widget_ref,
            Widget::VisualizationSwitcher(w) => &mut w.widget_ref,
            Widget::Container(w) => &mut w.widget_ref,
            Widget::Custom(w) => &mut w.widget_ref,
        };
        *slot = Some(r);
    }

    /// Short name of the widget kind, used in logs and size tables
    pub fn kind(&self) -> &'static str {
        match self {
            Widget::Insight(_) => "insight",
            Widget::Kpi(_) => "kpi",
            Widget::RichText(_) => "richText",
            Widget::VisualizationSwitcher(_) => "visualizationSwitcher",
            Widget::Container(_) => "container",
            Widget::Custom(_) => "custom",
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Widget::Custom(_))
    }

    pub fn as_container(&self) -> Option<&ContainerWidget> {
        match self {
            Widget::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut ContainerWidget> {
        match self {
            Widget::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Insights referenced by this widget, including switcher visualizations
    pub fn insight_refs(&self) -> Vec<&ObjRef> {
        match self {
            Widget::Insight(w) => vec![&w.insight],
            Widget::VisualizationSwitcher(w) => w.visualizations.iter().map(|v| &v.insight).collect(),
            _ => Vec::new(),
        }
    }

    /// Title for widgets that carry one
    pub fn title(&self) -> Option<&str> {
        match self {
            Widget::Insight(w) => Some(&w.title),
            Widget::Kpi(w) => Some(&w.title),
            Widget::VisualizationSwitcher(w) => Some(&w.title),
            _ => None,
        }
    }
}

impl InsightWidget {
    /// New insight widget definition without identity
    pub fn new(title: impl Into<String>, insight: ObjRef) -> Self {
        Self {
            widget_ref: None,
            title: title.into(),
            description: String::new(),
            insight,
            drills: Vec::new(),
            ignore_dashboard_filters: Vec::new(),
            date_data_set: None,
            properties: None,
        }
    }
}

impl RichTextWidget {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            widget_ref: None,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_json_is_tagged_by_type() {
        let widget = Widget::RichText(RichTextWidget::new("hello"));
        let json = serde_json::to_value(&widget).unwrap();

        assert_eq!(json["type"], "richText");
        assert_eq!(json["content"], "hello");
        assert!(json.get("ref").is_none());
    }

    #[test]
    fn test_switcher_lists_all_insights() {
        let widget = Widget::VisualizationSwitcher(VisualizationSwitcherWidget {
            widget_ref: None,
            title: String::new(),
            visualizations: vec![
                InsightWidget::new("a", ObjRef::identifier("insight-a")),
                InsightWidget::new("b", ObjRef::identifier("insight-b")),
            ],
        });

        assert_eq!(widget.insight_refs().len(), 2);
    }
}
