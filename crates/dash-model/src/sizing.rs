//! Breakpoint sizing rules
//!
//! The `xl` size stored on an item is authoritative. Widths for smaller screen classes are
//! derived from it through a fixed responsive table unless the item carries an explicit override.
//! Every width is then clamped against the widget's [`SizeInfo`] and the width of the enclosing
//! container.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::coordinates::{find_item, find_item_mut, get_parent_path, LayoutItemPath, PathError};
use crate::insight::InsightMap;
use crate::layout::{Item, ItemSize, Layout};
use crate::widget::Widget;

/// Number of columns in the layout grid
pub const GRID_COLUMNS: u32 = 12;

/// Responsive screen classes, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenSize {
    Xs,
    Sm,
    Md,
    Lg,
    #[default]
    Xl,
}

/// Size constraints of a widget kind, in grid units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeInfo {
    pub default_width: u32,
    pub min_width: u32,
    pub default_height: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl SizeInfo {
    const fn new(default_width: u32, min_width: u32, default_height: u32, min_height: u32, max_height: u32) -> Self {
        Self {
            default_width,
            min_width,
            default_height,
            min_height,
            max_height,
        }
    }

    /// Clamp into `[min_height, max_height]`; the maximum wins over an inconsistent minimum
    pub fn clamp_height(&self, height: u32) -> u32 {
        height.max(self.min_height).min(self.max_height)
    }
}

const INSIGHT_SIZE: SizeInfo = SizeInfo::new(6, 2, 22, 12, 40);
const HEADLINE_SIZE: SizeInfo = SizeInfo::new(2, 2, 11, 6, 40);
const TABLE_SIZE: SizeInfo = SizeInfo::new(12, 3, 22, 12, 40);
const KPI_SIZE: SizeInfo = SizeInfo::new(2, 2, 11, 10, 40);
const RICH_TEXT_SIZE: SizeInfo = SizeInfo::new(12, 1, 4, 1, 40);
const CONTAINER_SIZE: SizeInfo = SizeInfo::new(12, 1, 22, 1, 40);
const CUSTOM_SIZE: SizeInfo = SizeInfo::new(6, 1, 12, 1, 40);

/// Sizing overrides, keyed by widget kind or insight visualization type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SizingSettings {
    pub grid_columns: u32,
    pub overrides: IndexMap<String, SizeInfo>,
}

impl SizingSettings {
    /// First setting no item size could satisfy
    pub fn inconsistency(&self) -> Option<String> {
        if self.grid_columns == 0 {
            return Some("grid must have at least one column".to_string());
        }
        self.overrides.iter().find_map(|(kind, info)| {
            if info.min_width > info.default_width {
                Some(format!(
                    "{}: minimum width {} exceeds default width {}",
                    kind, info.min_width, info.default_width
                ))
            } else if info.min_height > info.max_height {
                Some(format!(
                    "{}: minimum height {} exceeds maximum height {}",
                    kind, info.min_height, info.max_height
                ))
            } else {
                None
            }
        })
    }
}

impl Default for SizingSettings {
    fn default() -> Self {
        Self {
            grid_columns: GRID_COLUMNS,
            overrides: IndexMap::new(),
        }
    }
}

/// Size constraints for a widget
///
/// Insight widgets are sized by the visualization type of their insight when it is known;
/// unknown insights fall back to the generic insight size.
pub fn size_info(widget: &Widget, insights: &InsightMap, settings: &SizingSettings) -> SizeInfo {
    let visualization_type = match widget {
        Widget::Insight(w) => insights.get(&w.insight).map(|i| i.visualization_type.as_str()),
        Widget::VisualizationSwitcher(w) => w
            .visualizations
            .first()
            .and_then(|v| insights.get(&v.insight))
            .map(|i| i.visualization_type.as_str()),
        _ => None,
    };

    if let Some(info) = visualization_type.and_then(|t| settings.overrides.get(t)) {
        return *info;
    }
    if let Some(info) = settings.overrides.get(widget.kind()) {
        return *info;
    }

    match widget {
        Widget::Insight(_) | Widget::VisualizationSwitcher(_) => match visualization_type {
            Some("headline") => HEADLINE_SIZE,
            Some("table") | Some("pivotTable") | Some("repeater") => TABLE_SIZE,
            _ => INSIGHT_SIZE,
        },
        Widget::Kpi(_) => KPI_SIZE,
        Widget::RichText(_) => RICH_TEXT_SIZE,
        Widget::Container(_) => CONTAINER_SIZE,
        Widget::Custom(_) => CUSTOM_SIZE,
    }
}

/// Width on `screen` implied by an xl width
pub fn implicit_width(xl_width: u32, screen: ScreenSize) -> u32 {
    let (lg, md, sm, xs) = match xl_width {
        0 => (0, 0, 0, 0),
        1 => (1, 2, 6, 12),
        2 => (2, 4, 6, 12),
        w @ 3..=9 => (w, 6, 12, 12),
        w => {
            let w = w.min(GRID_COLUMNS);
            (w, 12, 12, 12)
        }
    };
    match screen {
        ScreenSize::Xl => xl_width.min(GRID_COLUMNS),
        ScreenSize::Lg => lg,
        ScreenSize::Md => md,
        ScreenSize::Sm => sm,
        ScreenSize::Xs => xs,
    }
}

/// Width of an item on `screen`: the explicit override or the implicit width
pub fn width_for_screen(item: &Item, screen: ScreenSize) -> u32 {
    match item.size.explicit(screen) {
        Some(size) if screen != ScreenSize::Xl => size.grid_width,
        _ => implicit_width(item.size.xl.grid_width, screen),
    }
}

/// Width available to the children of the container at `container_path`
fn parent_width(layout: &Layout, path: &LayoutItemPath, screen: ScreenSize, settings: &SizingSettings) -> u32 {
    get_parent_path(path)
        .and_then(|parent| find_item(layout, &parent).ok())
        .map(|container| width_for_screen(container, screen))
        .filter(|width| *width > 0)
        .unwrap_or(settings.grid_columns)
}

/// Adjust an item about to be placed at `path` to the active screen class
///
/// A missing width is filled with the widget's default width. The width is clamped to
/// `[min_width, parent_width]`, an explicit grid height to `[min_height, max_height]`.
pub fn normalize_item_size_to_parent(
    item: &Item,
    path: &LayoutItemPath,
    layout: &Layout,
    settings: &SizingSettings,
    insights: &InsightMap,
    screen: ScreenSize,
) -> Item {
    let info = size_info(&item.widget, insights, settings);
    let parent = parent_width(layout, path, screen, settings);

    let mut normalized = item.clone();
    if normalized.size.xl.grid_width == 0 {
        normalized.size.xl.grid_width = info.default_width.min(settings.grid_columns);
    }

    let width = width_for_screen(&normalized, screen);
    let width = width.clamp(info.min_width.min(parent), parent);

    let current = normalized.size.explicit(screen).copied().unwrap_or(normalized.size.xl);
    let grid_height = current.grid_height.map(|h| info.clamp_height(h));
    normalized.size.set(
        screen,
        ItemSize {
            grid_width: width,
            grid_height,
            height_as_ratio: current.height_as_ratio,
        },
    );
    normalized
}

/// Minimum xl width a container needs to hold all of its children
fn required_container_width(item: &Item, insights: &InsightMap, settings: &SizingSettings) -> u32 {
    let Some(nested) = item.nested_layout() else {
        return 0;
    };
    nested
        .sections
        .iter()
        .flat_map(|s| s.items.iter())
        .map(|child| match &child.widget {
            Widget::Container(_) => child.size.xl.grid_width,
            widget => size_info(widget, insights, settings).min_width,
        })
        .max()
        .unwrap_or(0)
}

/// Widen ancestor containers of `path` that became narrower than their widest child minimum
///
/// Walks outwards from the nearest container; returns the paths of resized containers.
pub fn resize_parent_containers(
    layout: &mut Layout,
    path: &LayoutItemPath,
    settings: &SizingSettings,
    insights: &InsightMap,
) -> Result<Vec<LayoutItemPath>, PathError> {
    let mut resized = Vec::new();
    for ancestor in path.ancestors() {
        let required = required_container_width(find_item(layout, &ancestor)?, insights, settings)
            .min(settings.grid_columns);
        let container = find_item_mut(layout, &ancestor)?;
        if container.size.xl.grid_width < required {
            container.size.xl.grid_width = required;
            resized.push(ancestor);
        }
    }
    Ok(resized)
}
