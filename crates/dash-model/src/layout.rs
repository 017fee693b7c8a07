//! Layout tree: sections of items, each item wrapping one widget

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::coordinates::{ItemCoordinate, LayoutItemPath};
use crate::refs::ObjRef;
use crate::sizing::ScreenSize;
use crate::widget::Widget;

/// Identifier of a group of stashed items
pub type StashId = String;

/// Items temporarily removed from the layout, keyed by the caller's stash identifier
pub type Stash = IndexMap<StashId, Vec<Item>>;

/// Ordered sequence of sections
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub sections: Vec<Section>,
}

/// Optional section header
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Ordered sequence of items
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<SectionHeader>,
    pub items: Vec<Item>,
}

/// Size of an item on one screen class
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSize {
    /// Width in grid columns
    pub grid_width: u32,
    /// Height in grid rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_height: Option<u32>,
    /// Height as a percentage of the width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_as_ratio: Option<f64>,
}

/// Item size per screen class; `xl` is authoritative, the rest are overrides
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSizeByScreen {
    pub xl: ItemSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lg: Option<ItemSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md: Option<ItemSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sm: Option<ItemSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xs: Option<ItemSize>,
}

impl ItemSizeByScreen {
    /// Explicit override for a screen class, `xl` always present
    pub fn explicit(&self, screen: ScreenSize) -> Option<&ItemSize> {
        match screen {
            ScreenSize::Xl => Some(&self.xl),
            ScreenSize::Lg => self.lg.as_ref(),
            ScreenSize::Md => self.md.as_ref(),
            ScreenSize::Sm => self.sm.as_ref(),
            ScreenSize::Xs => self.xs.as_ref(),
        }
    }

    pub fn set(&mut self, screen: ScreenSize, size: ItemSize) {
        match screen {
            ScreenSize::Xl => self.xl = size,
            ScreenSize::Lg => self.lg = Some(size),
            ScreenSize::Md => self.md = Some(size),
            ScreenSize::Sm => self.sm = Some(size),
            ScreenSize::Xs => self.xs = Some(size),
        }
    }
}

/// Layout item wrapping exactly one widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub size: ItemSizeByScreen,
    pub widget: Widget,
}

impl Item {
    /// New item with the given xl width and no explicit height
    pub fn new(widget: Widget, grid_width: u32) -> Self {
        Self {
            size: ItemSizeByScreen {
                xl: ItemSize {
                    grid_width,
                    grid_height: None,
                    height_as_ratio: None,
                },
                ..Default::default()
            },
            widget,
        }
    }

    pub fn with_height(mut self, grid_height: u32) -> Self {
        self.size.xl.grid_height = Some(grid_height);
        self
    }

    /// Nested layout for container items
    pub fn nested_layout(&self) -> Option<&Layout> {
        self.widget.as_container().map(|c| &c.layout)
    }

    pub fn nested_layout_mut(&mut self) -> Option<&mut Layout> {
        self.widget.as_container_mut().map(|c| &mut c.layout)
    }
}

impl Section {
    pub fn new(items: Vec<Item>) -> Self {
        Self { header: None, items }
    }
}

impl Layout {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Visit every item in depth-first order together with its path
    pub fn walk_items<F>(&self, mut visit: F)
    where
        F: FnMut(&LayoutItemPath, &Item),
    {
        fn walk<F: FnMut(&LayoutItemPath, &Item)>(layout: &Layout, prefix: &LayoutItemPath, visit: &mut F) {
            for (section_index, section) in layout.sections.iter().enumerate() {
                for (item_index, item) in section.items.iter().enumerate() {
                    let path = prefix.child(ItemCoordinate::new(section_index, item_index));
                    visit(&path, item);
                    if let Some(nested) = item.nested_layout() {
                        walk(nested, &path, visit);
                    }
                }
            }
        }

        walk(self, &LayoutItemPath::root(), &mut visit);
    }

    /// Mutable depth-first visit over every widget
    pub fn for_each_widget_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut Widget),
    {
        fn walk<F: FnMut(&mut Widget)>(layout: &mut Layout, visit: &mut F) {
            for section in layout.sections.iter_mut() {
                for item in section.items.iter_mut() {
                    visit(&mut item.widget);
                    if let Some(nested) = item.nested_layout_mut() {
                        walk(nested, visit);
                    }
                }
            }
        }

        walk(self, &mut visit);
    }

    /// Path of the item holding the widget with the given identity
    pub fn find_widget_path(&self, widget_ref: &ObjRef) -> Option<LayoutItemPath> {
        let mut found = None;
        self.walk_items(|path, item| {
            if found.is_none() && item.widget.widget_ref() == Some(widget_ref) {
                found = Some(path.clone());
            }
        });
        found
    }

    /// All widgets in depth-first order
    pub fn widgets(&self) -> Vec<&Widget> {
        fn collect<'a>(layout: &'a Layout, out: &mut Vec<&'a Widget>) {
            for section in &layout.sections {
                for item in &section.items {
                    out.push(&item.widget);
                    if let Some(nested) = item.nested_layout() {
                        collect(nested, out);
                    }
                }
            }
        }

        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }

    /// Number of items in each top-level section
    pub fn section_sizes(&self) -> Vec<usize> {
        self.sections.iter().map(|s| s.items.len()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{ContainerDirection, ContainerWidget, RichTextWidget};

    fn text(r: &str) -> Item {
        let mut widget = Widget::RichText(RichTextWidget::new(r));
        widget.set_widget_ref(ObjRef::identifier(r));
        Item::new(widget, 6)
    }

    #[test]
    fn test_find_widget_path_descends_into_containers() {
        let nested = Layout::new(vec![Section::new(vec![text("inner-a"), text("inner-b")])]);
        let container = Item::new(
            Widget::Container(ContainerWidget {
                widget_ref: Some(ObjRef::identifier("container")),
                layout: nested,
                direction: ContainerDirection::Row,
                section_headers_enabled: false,
            }),
            12,
        );
        let layout = Layout::new(vec![
            Section::new(vec![text("a")]),
            Section::new(vec![text("b"), container]),
        ]);

        let path = layout.find_widget_path(&ObjRef::identifier("inner-b")).unwrap();
        assert_eq!(path.to_string(), "1_1-0_1");
        assert_eq!(layout.widgets().len(), 5);
        assert_eq!(layout.section_sizes(), vec![1, 2]);
    }
}
