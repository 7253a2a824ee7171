//! Property filter model shared by cohorts, journeys, and targeting.

use serde::{Deserialize, Serialize};

/// Logical combinator for filter groups. Serialized uppercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

/// Value side of a property filter — a scalar or a selection list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyFilterValue {
    Bool(bool),
    Number(i64),
    Text(String),
    List(Vec<String>),
}

impl PropertyFilterValue {
    /// Whether the value is empty for validation purposes. Only selection
    /// lists can be empty; scalars always count as present.
    pub fn is_empty(&self) -> bool {
        matches!(self, PropertyFilterValue::List(list) if list.is_empty())
    }
}

impl From<&str> for PropertyFilterValue {
    fn from(value: &str) -> Self {
        PropertyFilterValue::Text(value.to_string())
    }
}

impl From<i64> for PropertyFilterValue {
    fn from(value: i64) -> Self {
        PropertyFilterValue::Number(value)
    }
}

/// Comparison operators available on property filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyOperator {
    Exact,
    IsNot,
    Icontains,
    NotIcontains,
    Regex,
    NotRegex,
    Gt,
    Gte,
    Lt,
    Lte,
    IsSet,
    IsNotSet,
    IsDateBefore,
    IsDateAfter,
    Between,
}

/// Which entity a property filter reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyFilterKind {
    Person,
    Event,
    Element,
    Cohort,
}

/// A single property constraint on a person or event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PropertyFilterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<PropertyOperator>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyFilterKind>,
}

/// Logical combination of property filters, possibly nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyGroup {
    #[serde(rename = "type")]
    pub operator: LogicalOperator,
    pub values: Vec<PropertyGroupChild>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyGroupChild {
    Group(PropertyGroup),
    Filter(PropertyFilter),
}

/// Flattens a nested property group into the flat filter list used by the
/// legacy cohort representation. Group operators are discarded.
pub fn flatten_property_group(group: &PropertyGroup) -> Vec<PropertyFilter> {
    let mut filters = Vec::new();
    for child in &group.values {
        match child {
            PropertyGroupChild::Group(inner) => filters.extend(flatten_property_group(inner)),
            PropertyGroupChild::Filter(filter) => filters.push(filter.clone()),
        }
    }
    filters
}
