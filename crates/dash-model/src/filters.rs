//! Dashboard filter context

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::refs::ObjRef;

/// Selected attribute elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeElements {
    Uris(Vec<String>),
    Values(Vec<Option<String>>),
}

impl AttributeElements {
    pub fn len(&self) -> usize {
        match self {
            AttributeElements::Uris(v) => v.len(),
            AttributeElements::Values(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AttributeElements {
    fn default() -> Self {
        AttributeElements::Uris(Vec::new())
    }
}

/// Whether a filter accepts one element or many
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionMode {
    Single,
    #[default]
    Multi,
}

/// Parent dependency of an attribute filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeFilterParent {
    /// Local identifier of the parent filter
    pub filter_local_identifier: String,
    /// Attributes connecting the parent and the child
    #[serde(default)]
    pub over: Vec<ObjRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAttributeFilter {
    pub local_identifier: String,
    pub display_form: ObjRef,
    #[serde(default)]
    pub attribute_elements: AttributeElements,
    #[serde(default)]
    pub negative_selection: bool,
    #[serde(default)]
    pub selection_mode: SelectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_elements_by: Vec<AttributeFilterParent>,
}

impl DashboardAttributeFilter {
    /// New filter with an "all elements" selection and a generated local identifier
    pub fn new(display_form: ObjRef) -> Self {
        Self {
            local_identifier: generate_local_identifier(),
            display_form,
            attribute_elements: AttributeElements::default(),
            negative_selection: true,
            selection_mode: SelectionMode::Multi,
            title: None,
            filter_elements_by: Vec::new(),
        }
    }

    /// Whether the filter lets every element through
    pub fn is_all_selected(&self) -> bool {
        self.negative_selection && self.attribute_elements.is_empty()
    }

    pub fn reset_selection(&mut self) {
        self.attribute_elements = AttributeElements::Uris(Vec::new());
        self.negative_selection = true;
    }

    pub fn parent_ids(&self) -> impl Iterator<Item = &str> {
        self.filter_elements_by
            .iter()
            .map(|p| p.filter_local_identifier.as_str())
    }
}

/// Random local identifier for a new filter
pub fn generate_local_identifier() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateFilterType {
    #[default]
    Relative,
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateFilterGranularity {
    Day,
    Week,
    Month,
    Quarter,
    #[default]
    Year,
}

/// Dashboard-wide date filter
///
/// Relative filters carry signed offsets from today in `granularity` units; absolute filters
/// carry ISO dates. A relative filter without bounds means "all time".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDateFilter {
    #[serde(default)]
    pub filter_type: DateFilterType,
    #[serde(default)]
    pub granularity: DateFilterGranularity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_set: Option<ObjRef>,
}

impl DashboardDateFilter {
    pub fn all_time() -> Self {
        Self::default()
    }

    pub fn is_all_time(&self) -> bool {
        self.filter_type == DateFilterType::Relative && self.from.is_none() && self.to.is_none()
    }

    /// Check that the bounds fit the filter type; returns a description of the problem
    pub fn bounds_error(&self) -> Option<String> {
        match self.filter_type {
            DateFilterType::Relative => {
                if self.from.is_some() != self.to.is_some() {
                    return Some("relative date filter needs both bounds or none".to_string());
                }
                for bound in [&self.from, &self.to].into_iter().flatten() {
                    if bound.parse::<i32>().is_err() {
                        return Some(format!("relative bound '{}' is not an offset", bound));
                    }
                }
                None
            }
            DateFilterType::Absolute => {
                let (Some(from), Some(to)) = (&self.from, &self.to) else {
                    return Some("absolute date filter needs both bounds".to_string());
                };
                match (
                    NaiveDate::parse_from_str(from, "%Y-%m-%d"),
                    NaiveDate::parse_from_str(to, "%Y-%m-%d"),
                ) {
                    (Ok(f), Ok(t)) if f <= t => None,
                    (Ok(_), Ok(_)) => Some(format!("date range {}..{} is reversed", from, to)),
                    _ => Some(format!("date range {}..{} is not made of ISO dates", from, to)),
                }
            }
        }
    }
}

/// One entry of the filter context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterContextItem {
    DateFilter(DashboardDateFilter),
    AttributeFilter(DashboardAttributeFilter),
}

/// Ordered filters of a dashboard: at most one date filter, kept first, then attribute filters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterContext {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub context_ref: Option<ObjRef>,
    #[serde(default)]
    pub filters: Vec<FilterContextItem>,
}

impl FilterContext {
    pub fn date_filter(&self) -> Option<&DashboardDateFilter> {
        self.filters.iter().find_map(|f| match f {
            FilterContextItem::DateFilter(d) => Some(d),
            _ => None,
        })
    }

    /// Replace the date filter; `None` removes it
    pub fn set_date_filter(&mut self, filter: Option<DashboardDateFilter>) {
        self.filters.retain(|f| !matches!(f, FilterContextItem::DateFilter(_)));
        if let Some(filter) = filter {
            self.filters.insert(0, FilterContextItem::DateFilter(filter));
        }
    }

    pub fn attribute_filters(&self) -> impl Iterator<Item = &DashboardAttributeFilter> {
        self.filters.iter().filter_map(|f| match f {
            FilterContextItem::AttributeFilter(a) => Some(a),
            _ => None,
        })
    }

    pub fn attribute_filters_mut(&mut self) -> impl Iterator<Item = &mut DashboardAttributeFilter> {
        self.filters.iter_mut().filter_map(|f| match f {
            FilterContextItem::AttributeFilter(a) => Some(a),
            _ => None,
        })
    }

    pub fn attribute_filter_count(&self) -> usize {
        self.attribute_filters().count()
    }

    pub fn attribute_filter(&self, local_id: &str) -> Option<&DashboardAttributeFilter> {
        self.attribute_filters().find(|a| a.local_identifier == local_id)
    }

    pub fn attribute_filter_mut(&mut self, local_id: &str) -> Option<&mut DashboardAttributeFilter> {
        self.attribute_filters_mut().find(|a| a.local_identifier == local_id)
    }

    pub fn attribute_filter_by_display_form(&self, display_form: &ObjRef) -> Option<&DashboardAttributeFilter> {
        self.attribute_filters().find(|a| &a.display_form == display_form)
    }

    /// Position of a filter among the attribute filters
    pub fn attribute_filter_index(&self, local_id: &str) -> Option<usize> {
        self.attribute_filters().position(|a| a.local_identifier == local_id)
    }

    /// Insert at a position among attribute filters; out of range appends
    pub fn insert_attribute_filter(&mut self, index: usize, filter: DashboardAttributeFilter) {
        let position = self
            .filters
            .iter()
            .enumerate()
            .filter(|(_, f)| matches!(f, FilterContextItem::AttributeFilter(_)))
            .nth(index)
            .map(|(position, _)| position)
            .unwrap_or(self.filters.len());
        self.filters.insert(position, FilterContextItem::AttributeFilter(filter));
    }

    pub fn remove_attribute_filter(&mut self, local_id: &str) -> Option<DashboardAttributeFilter> {
        let position = self.filters.iter().position(
            |f| matches!(f, FilterContextItem::AttributeFilter(a) if a.local_identifier == local_id),
        )?;
        match self.filters.remove(position) {
            FilterContextItem::AttributeFilter(a) => Some(a),
            FilterContextItem::DateFilter(_) => None,
        }
    }

    /// Move a filter to a new position among attribute filters
    pub fn move_attribute_filter(&mut self, local_id: &str, index: usize) -> bool {
        match self.remove_attribute_filter(local_id) {
            Some(filter) => {
                self.insert_attribute_filter(index, filter);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(id: &str) -> DashboardAttributeFilter {
        DashboardAttributeFilter {
            local_identifier: id.to_string(),
            ..DashboardAttributeFilter::new(ObjRef::identifier(format!("label.{}", id)))
        }
    }

    #[test]
    fn test_attribute_positions_skip_date_filter() {
        let mut ctx = FilterContext::default();
        ctx.insert_attribute_filter(0, filter("a"));
        ctx.insert_attribute_filter(1, filter("b"));
        ctx.set_date_filter(Some(DashboardDateFilter::all_time()));
        ctx.insert_attribute_filter(0, filter("c"));

        let order: Vec<_> = ctx.attribute_filters().map(|f| f.local_identifier.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert!(matches!(ctx.filters[0], FilterContextItem::DateFilter(_)));

        assert!(ctx.move_attribute_filter("c", 2));
        assert_eq!(ctx.attribute_filter_index("c"), Some(2));
        assert!(!ctx.move_attribute_filter("missing", 0));
    }

    #[test]
    fn test_reset_selection_selects_all() {
        let mut f = filter("a");
        f.attribute_elements = AttributeElements::Uris(vec!["x".to_string()]);
        f.negative_selection = false;
        assert!(!f.is_all_selected());

        f.reset_selection();
        assert!(f.is_all_selected());
    }

    #[test]
    fn test_date_filter_bounds() {
        let relative = DashboardDateFilter {
            from: Some("-3".to_string()),
            to: Some("0".to_string()),
            granularity: DateFilterGranularity::Month,
            ..Default::default()
        };
        assert_eq!(relative.bounds_error(), None);

        let reversed = DashboardDateFilter {
            filter_type: DateFilterType::Absolute,
            from: Some("2024-02-01".to_string()),
            to: Some("2024-01-01".to_string()),
            ..Default::default()
        };
        assert!(reversed.bounds_error().is_some());
        assert!(DashboardDateFilter::all_time().is_all_time());
    }

    #[test]
    fn test_filter_context_json_shape() {
        let mut ctx = FilterContext::default();
        ctx.insert_attribute_filter(0, filter("a"));
        let json = serde_json::to_value(&ctx).unwrap();

        assert_eq!(json["filters"][0]["type"], "attributeFilter");
        assert_eq!(json["filters"][0]["attributeElements"]["uris"], serde_json::json!([]));
    }
}
