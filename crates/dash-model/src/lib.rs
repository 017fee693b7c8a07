//! Dashboard data model
//!
//! This crate holds the pure data types of an editable dashboard: the layout tree,
//! widgets, insights, filters, and the coordinate model used to address items
//! inside (possibly nested) layouts. Nothing in here performs I/O.

pub mod coordinates;
pub mod dashboard;
pub mod filters;
pub mod insight;
pub mod layout;
pub mod refs;
pub mod sizing;
pub mod widget;

// Re-export commonly used types
pub use coordinates::{ItemCoordinate, LayoutItemPath, LayoutSectionPath, PathError};
pub use dashboard::{Dashboard, ShareStatus};
pub use filters::{
    AttributeElements, AttributeFilterParent, DashboardAttributeFilter, DashboardDateFilter,
    DateFilterGranularity, DateFilterType, FilterContext, FilterContextItem, SelectionMode,
};
pub use insight::{Insight, InsightMap};
pub use layout::{Item, ItemSize, ItemSizeByScreen, Layout, Section, SectionHeader, Stash, StashId};
pub use refs::ObjRef;
pub use sizing::{ScreenSize, SizeInfo, SizingSettings, GRID_COLUMNS};
pub use widget::{
    ContainerDirection, ContainerWidget, CustomWidget, DrillDefinition, InsightWidget, KpiWidget,
    RichTextWidget, VisualizationSwitcherWidget, Widget,
};
