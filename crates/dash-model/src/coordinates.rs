//! Layout coordinate model
//!
//! Items inside a (possibly nested) layout are addressed by a [`LayoutItemPath`]: one
//! [`ItemCoordinate`] per nesting level, outermost first. Sections are addressed by a
//! [`LayoutSectionPath`], which is the path of the container item holding them (or none for the
//! root layout) plus the section index.
//!
//! Paths are never stored in the layout; they are recomputed from positions after every
//! structural change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::layout::{Item, Layout, Section};

/// Errors raised when resolving or parsing layout paths
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("layout path is empty")]
    Empty,

    #[error("no layout element at path '{0}'")]
    NotFound(String),

    #[error("item at path '{0}' is not a container")]
    NotAContainer(String),

    #[error("malformed layout path '{input}': {reason}")]
    Malformed { input: String, reason: String },
}

/// Position of an item inside one layout level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCoordinate {
    pub section_index: usize,
    pub item_index: usize,
}

impl ItemCoordinate {
    pub fn new(section_index: usize, item_index: usize) -> Self {
        Self {
            section_index,
            item_index,
        }
    }
}

/// Path to an item, one coordinate per nesting depth
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutItemPath(Vec<ItemCoordinate>);

impl LayoutItemPath {
    /// The empty path; addresses no item
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(coordinates: Vec<ItemCoordinate>) -> Self {
        Self(coordinates)
    }

    /// Single-level path into the root layout
    pub fn top_level(section_index: usize, item_index: usize) -> Self {
        Self(vec![ItemCoordinate::new(section_index, item_index)])
    }

    /// This path extended by one nesting level
    pub fn child(&self, coordinate: ItemCoordinate) -> Self {
        let mut coordinates = self.0.clone();
        coordinates.push(coordinate);
        Self(coordinates)
    }

    pub fn coordinates(&self) -> &[ItemCoordinate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&ItemCoordinate> {
        self.0.last()
    }

    /// Ancestor paths, nearest container first
    pub fn ancestors(&self) -> impl Iterator<Item = LayoutItemPath> + '_ {
        (1..self.0.len()).rev().map(move |depth| Self(self.0[..depth].to_vec()))
    }
}

impl From<Vec<ItemCoordinate>> for LayoutItemPath {
    fn from(coordinates: Vec<ItemCoordinate>) -> Self {
        Self(coordinates)
    }
}

/// Path to a section: the container item holding it (none at the root) and its index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSectionPath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<LayoutItemPath>,
    pub section_index: usize,
}

impl LayoutSectionPath {
    pub fn top_level(section_index: usize) -> Self {
        Self {
            parent: None,
            section_index,
        }
    }

    pub fn nested(parent: LayoutItemPath, section_index: usize) -> Self {
        Self {
            parent: if parent.is_empty() { None } else { Some(parent) },
            section_index,
        }
    }
}

// Resolution

fn locate<'a>(layout: &'a Layout, coordinate: &ItemCoordinate) -> Option<&'a Item> {
    layout
        .sections
        .get(coordinate.section_index)
        .and_then(|section| section.items.get(coordinate.item_index))
}

fn locate_mut<'a>(layout: &'a mut Layout, coordinate: &ItemCoordinate) -> Option<&'a mut Item> {
    layout
        .sections
        .get_mut(coordinate.section_index)
        .and_then(|section| section.items.get_mut(coordinate.item_index))
}

/// Resolve an item path
pub fn find_item<'a>(layout: &'a Layout, path: &LayoutItemPath) -> Result<&'a Item, PathError> {
    let (last, prefix) = path.0.split_last().ok_or(PathError::Empty)?;
    let mut current = layout;
    for coordinate in prefix {
        let item = locate(current, coordinate).ok_or_else(|| PathError::NotFound(path.to_string()))?;
        current = item
            .nested_layout()
            .ok_or_else(|| PathError::NotAContainer(path.to_string()))?;
    }
    locate(current, last).ok_or_else(|| PathError::NotFound(path.to_string()))
}

pub fn find_item_mut<'a>(layout: &'a mut Layout, path: &LayoutItemPath) -> Result<&'a mut Item, PathError> {
    let (last, prefix) = path.0.split_last().ok_or(PathError::Empty)?;
    let mut current = layout;
    for coordinate in prefix {
        current = locate_mut(current, coordinate)
            .ok_or_else(|| PathError::NotFound(path.to_string()))?
            .nested_layout_mut()
            .ok_or_else(|| PathError::NotAContainer(path.to_string()))?;
    }
    locate_mut(current, last).ok_or_else(|| PathError::NotFound(path.to_string()))
}

/// Resolve the layout owned by the container at `parent`, or the root layout
pub fn find_layout<'a>(layout: &'a Layout, parent: Option<&LayoutItemPath>) -> Result<&'a Layout, PathError> {
    match parent {
        None => Ok(layout),
        Some(path) if path.is_empty() => Ok(layout),
        Some(path) => find_item(layout, path)?
            .nested_layout()
            .ok_or_else(|| PathError::NotAContainer(path.to_string())),
    }
}

pub fn find_layout_mut<'a>(
    layout: &'a mut Layout,
    parent: Option<&LayoutItemPath>,
) -> Result<&'a mut Layout, PathError> {
    match parent {
        None => Ok(layout),
        Some(path) if path.is_empty() => Ok(layout),
        Some(path) => find_item_mut(layout, path)?
            .nested_layout_mut()
            .ok_or_else(|| PathError::NotAContainer(path.to_string())),
    }
}

/// Sections of the layout at `parent`
pub fn find_sections<'a>(layout: &'a Layout, parent: Option<&LayoutItemPath>) -> Result<&'a [Section], PathError> {
    find_layout(layout, parent).map(|l| l.sections.as_slice())
}

pub fn find_sections_mut<'a>(
    layout: &'a mut Layout,
    parent: Option<&LayoutItemPath>,
) -> Result<&'a mut Vec<Section>, PathError> {
    find_layout_mut(layout, parent).map(|l| &mut l.sections)
}

/// Resolve a section path
pub fn find_section<'a>(layout: &'a Layout, path: &LayoutSectionPath) -> Result<&'a Section, PathError> {
    find_sections(layout, path.parent.as_ref())?
        .get(path.section_index)
        .ok_or_else(|| PathError::NotFound(path.to_string()))
}

pub fn find_section_mut<'a>(layout: &'a mut Layout, path: &LayoutSectionPath) -> Result<&'a mut Section, PathError> {
    let display = path.to_string();
    find_sections_mut(layout, path.parent.as_ref())?
        .get_mut(path.section_index)
        .ok_or(PathError::NotFound(display))
}

// Projections

/// Section index of the innermost coordinate
pub fn get_section_index(path: &LayoutItemPath) -> Option<usize> {
    path.last().map(|c| c.section_index)
}

/// Item index of the innermost coordinate
pub fn get_item_index(path: &LayoutItemPath) -> Option<usize> {
    path.last().map(|c| c.item_index)
}

/// Path of the container holding the addressed item; `None` for top-level items
pub fn get_parent_path(path: &LayoutItemPath) -> Option<LayoutItemPath> {
    match path.len() {
        0 | 1 => None,
        n => Some(LayoutItemPath(path.0[..n - 1].to_vec())),
    }
}

/// Path of the section holding the addressed item
pub fn as_section_path(path: &LayoutItemPath) -> Option<LayoutSectionPath> {
    let last = path.last()?;
    Some(LayoutSectionPath {
        parent: get_parent_path(path),
        section_index: last.section_index,
    })
}

/// Path of the item at `item_index` within a section
pub fn as_layout_item_path(section: &LayoutSectionPath, item_index: usize) -> LayoutItemPath {
    let coordinate = ItemCoordinate::new(section.section_index, item_index);
    match &section.parent {
        Some(parent) => parent.child(coordinate),
        None => LayoutItemPath(vec![coordinate]),
    }
}

/// Same path with the innermost section and item replaced
pub fn update_item(path: &LayoutItemPath, section_index: usize, item_index: usize) -> LayoutItemPath {
    let mut coordinates = path.0.clone();
    match coordinates.last_mut() {
        Some(last) => *last = ItemCoordinate::new(section_index, item_index),
        None => coordinates.push(ItemCoordinate::new(section_index, item_index)),
    }
    LayoutItemPath(coordinates)
}

pub fn update_item_index(path: &LayoutItemPath, item_index: usize) -> LayoutItemPath {
    let section_index = get_section_index(path).unwrap_or_default();
    update_item(path, section_index, item_index)
}

pub fn update_section_index(path: &LayoutItemPath, section_index: usize) -> LayoutItemPath {
    let item_index = get_item_index(path).unwrap_or_default();
    update_item(path, section_index, item_index)
}

/// Longest shared prefix of two paths
pub fn get_common_path(a: &LayoutItemPath, b: &LayoutItemPath) -> LayoutItemPath {
    LayoutItemPath(
        a.0.iter()
            .zip(b.0.iter())
            .take_while(|(x, y)| x == y)
            .map(|(x, _)| *x)
            .collect(),
    )
}

pub fn are_items_in_same_section(a: &LayoutItemPath, b: &LayoutItemPath) -> bool {
    match (as_section_path(a), as_section_path(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

pub fn is_item_in_section(item: &LayoutItemPath, section: &LayoutSectionPath) -> bool {
    as_section_path(item).as_ref() == Some(section)
}

pub fn are_layout_paths_equal(a: &LayoutItemPath, b: &LayoutItemPath) -> bool {
    a == b
}

// Serialization

const LEVEL_SEPARATOR: char = '-';
const COORDINATE_SEPARATOR: char = '_';

pub fn serialize_layout_item_path(path: &LayoutItemPath) -> String {
    path.to_string()
}

pub fn parse_layout_item_path(input: &str) -> Result<LayoutItemPath, PathError> {
    input.parse()
}

/// Parse a canonical decimal index: digits only, no leading zeros
fn parse_index(input: &str, whole: &str) -> Result<usize, PathError> {
    let malformed = |reason: &str| PathError::Malformed {
        input: whole.to_string(),
        reason: reason.to_string(),
    };
    if input.is_empty() {
        return Err(malformed("missing index"));
    }
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("index is not a number"));
    }
    if input.len() > 1 && input.starts_with('0') {
        return Err(malformed("index has leading zeros"));
    }
    input.parse().map_err(|_| malformed("index out of range"))
}

fn parse_coordinate(segment: &str, whole: &str) -> Result<ItemCoordinate, PathError> {
    let (section, item) = segment
        .split_once(COORDINATE_SEPARATOR)
        .ok_or_else(|| PathError::Malformed {
            input: whole.to_string(),
            reason: format!("segment '{}' is not <section>_<item>", segment),
        })?;
    Ok(ItemCoordinate::new(parse_index(section, whole)?, parse_index(item, whole)?))
}

impl fmt::Display for LayoutItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, c) in self.0.iter().enumerate() {
            if depth > 0 {
                write!(f, "{}", LEVEL_SEPARATOR)?;
            }
            write!(f, "{}{}{}", c.section_index, COORDINATE_SEPARATOR, c.item_index)?;
        }
        Ok(())
    }
}

impl FromStr for LayoutItemPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        s.split(LEVEL_SEPARATOR)
            .map(|segment| parse_coordinate(segment, s))
            .collect::<Result<Vec<_>, _>>()
            .map(LayoutItemPath)
    }
}

impl fmt::Display for LayoutSectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) if !parent.is_empty() => write!(f, "{}{}{}", parent, LEVEL_SEPARATOR, self.section_index),
            _ => write!(f, "{}", self.section_index),
        }
    }
}

impl FromStr for LayoutSectionPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once(LEVEL_SEPARATOR) {
            None => Ok(Self::top_level(parse_index(s, s)?)),
            Some((parent, section)) => {
                let parent = parent.parse::<LayoutItemPath>().map_err(|_| PathError::Malformed {
                    input: s.to_string(),
                    reason: "invalid container path".to_string(),
                })?;
                Ok(Self::nested(parent, parse_index(section, s)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Item;
    use crate::refs::ObjRef;
    use crate::widget::{ContainerDirection, ContainerWidget, RichTextWidget, Widget};

    fn text(content: &str) -> Item {
        Item::new(Widget::RichText(RichTextWidget::new(content)), 4)
    }

    fn container(sections: Vec<Section>) -> Item {
        Item::new(
            Widget::Container(ContainerWidget {
                widget_ref: Some(ObjRef::identifier("c")),
                layout: Layout::new(sections),
                direction: ContainerDirection::Row,
                section_headers_enabled: true,
            }),
            12,
        )
    }

    fn content(item: &Item) -> &str {
        match &item.widget {
            Widget::RichText(w) => &w.content,
            _ => "",
        }
    }

    fn sample() -> Layout {
        Layout::new(vec![
            Section::new(vec![text("a"), text("b")]),
            Section::new(vec![container(vec![
                Section::new(vec![text("n0")]),
                Section::new(vec![text("n1"), text("n2")]),
            ])]),
        ])
    }

    #[test]
    fn test_serialize_nested_path() {
        let path = LayoutItemPath::new(vec![
            ItemCoordinate::new(3, 2),
            ItemCoordinate::new(1, 6),
            ItemCoordinate::new(4, 0),
        ]);

        assert_eq!(serialize_layout_item_path(&path), "3_2-1_6-4_0");
        assert_eq!(parse_layout_item_path("3_2-1_6-4_0").unwrap(), path);
        assert_eq!(serialize_layout_item_path(&LayoutItemPath::root()), "");
    }

    #[test]
    fn test_section_path_serialization() {
        let nested = LayoutSectionPath::nested(LayoutItemPath::top_level(3, 2), 4);
        assert_eq!(nested.to_string(), "3_2-4");
        assert_eq!("3_2-4".parse::<LayoutSectionPath>().unwrap(), nested);
        assert_eq!(LayoutSectionPath::top_level(1).to_string(), "1");
        assert_eq!("1".parse::<LayoutSectionPath>().unwrap(), LayoutSectionPath::top_level(1));
    }

    #[test]
    fn test_parse_rejects_non_canonical_input() {
        for input in ["1", "1_", "_2", "a_1", "01_2", "1_2-", "+1_2", "1_2_3"] {
            assert!(
                matches!(parse_layout_item_path(input), Err(PathError::Malformed { .. })),
                "expected '{}' to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_find_item_descends_containers() {
        let layout = sample();
        let path: LayoutItemPath = "1_0-1_1".parse().unwrap();

        assert_eq!(content(find_item(&layout, &path).unwrap()), "n2");
        assert_eq!(
            find_section(&layout, &as_section_path(&path).unwrap()).unwrap().items.len(),
            2
        );
    }

    #[test]
    fn test_find_item_failures() {
        let layout = sample();

        assert_eq!(find_item(&layout, &LayoutItemPath::root()), Err(PathError::Empty));
        assert!(matches!(
            find_item(&layout, &"5_0".parse().unwrap()),
            Err(PathError::NotFound(_))
        ));
        assert!(matches!(
            find_item(&layout, &"0_0-0_0".parse().unwrap()),
            Err(PathError::NotAContainer(_))
        ));
        assert!(matches!(
            find_section(&layout, &LayoutSectionPath::top_level(2)),
            Err(PathError::NotFound(_))
        ));
    }

    #[test]
    fn test_find_item_mut_edits_in_place() {
        let mut layout = sample();
        let path: LayoutItemPath = "1_0-0_0".parse().unwrap();
        find_item_mut(&mut layout, &path).unwrap().size.xl.grid_width = 2;

        assert_eq!(find_item(&layout, &path).unwrap().size.xl.grid_width, 2);
    }

    #[test]
    fn test_projections() {
        let path: LayoutItemPath = "3_2-1_6".parse().unwrap();

        assert_eq!(get_section_index(&path), Some(1));
        assert_eq!(get_item_index(&path), Some(6));
        assert_eq!(get_parent_path(&path), Some(LayoutItemPath::top_level(3, 2)));
        assert_eq!(get_parent_path(&LayoutItemPath::top_level(0, 0)), None);
        assert_eq!(update_item_index(&path, 0).to_string(), "3_2-1_0");
        assert_eq!(update_section_index(&path, 9).to_string(), "3_2-9_6");
        assert_eq!(
            as_layout_item_path(&as_section_path(&path).unwrap(), 6),
            path
        );
    }

    #[test]
    fn test_common_path_and_same_section() {
        let a: LayoutItemPath = "1_0-0_1".parse().unwrap();
        let b: LayoutItemPath = "1_0-0_3".parse().unwrap();
        let c: LayoutItemPath = "1_0-1_1".parse().unwrap();

        assert_eq!(get_common_path(&a, &c), LayoutItemPath::top_level(1, 0));
        assert!(are_items_in_same_section(&a, &b));
        assert!(!are_items_in_same_section(&a, &c));
        assert!(is_item_in_section(&c, &"1_0-1".parse().unwrap()));
        assert!(!are_layout_paths_equal(&a, &b));
        assert!(are_layout_paths_equal(&a, &a.clone()));
    }

    #[test]
    fn test_path_bijection_property() {
        fn prop(raw: Vec<(u16, u16)>) -> bool {
            let path = LayoutItemPath::new(
                raw.into_iter()
                    .map(|(s, i)| ItemCoordinate::new(s as usize, i as usize))
                    .collect(),
            );
            let serialized = serialize_layout_item_path(&path);
            parse_layout_item_path(&serialized).as_ref() == Ok(&path)
                && serialize_layout_item_path(&parse_layout_item_path(&serialized).unwrap()) == serialized
        }

        quickcheck::quickcheck(prop as fn(Vec<(u16, u16)>) -> bool);
    }
}
