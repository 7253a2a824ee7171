//! Criteria-tree data model: cohorts, criteria groups, and the behavioral
//! rules they contain.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use audience_core::properties::{LogicalOperator, PropertyFilterValue, PropertyOperator};

use crate::groups::LegacyGroup;

/// Unit of the time windows carried by behavioral criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

/// Where a matched event comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSourceKind {
    Events,
    Actions,
}

/// Which sub-language a criterion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    Behavioral,
    Cohort,
    Person,
}

/// The closed enumeration of behavioral filter types, canonical positive
/// forms plus their explicit negative variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehavioralFilter {
    #[serde(rename = "performed_event")]
    PerformEvent,
    #[serde(rename = "performed_event_multiple")]
    PerformEventMultiple,
    #[serde(rename = "performed_event_first_time")]
    PerformEventFirstTime,
    #[serde(rename = "performed_event_regularly")]
    PerformEventRegularly,
    #[serde(rename = "stopped_performing_event")]
    StopPerformEvent,
    #[serde(rename = "restarted_performing_event")]
    RestartPerformEvent,
    #[serde(rename = "performed_event_sequence")]
    PerformSequenceEvents,
    #[serde(rename = "not_performed_event_sequence")]
    NotPerformSequenceEvents,
    #[serde(rename = "not_performed_event")]
    NotPerformedEvent,
    #[serde(rename = "in_cohort")]
    InCohort,
    #[serde(rename = "not_in_cohort")]
    NotInCohort,
    #[serde(rename = "have_property")]
    HaveProperty,
    #[serde(rename = "not_have_property")]
    NotHaveProperty,
}

impl BehavioralFilter {
    /// The criterion kind implied by this filter value, used to repair a
    /// criterion whose `type` went stale after a filter switch.
    /// `not_performed_event` keeps the criterion's existing kind.
    pub fn implied_kind(&self) -> Option<CriterionKind> {
        match self {
            BehavioralFilter::PerformEvent
            | BehavioralFilter::PerformEventMultiple
            | BehavioralFilter::PerformSequenceEvents
            | BehavioralFilter::NotPerformSequenceEvents
            | BehavioralFilter::PerformEventFirstTime
            | BehavioralFilter::PerformEventRegularly
            | BehavioralFilter::StopPerformEvent
            | BehavioralFilter::RestartPerformEvent => Some(CriterionKind::Behavioral),
            BehavioralFilter::InCohort | BehavioralFilter::NotInCohort => {
                Some(CriterionKind::Cohort)
            }
            BehavioralFilter::HaveProperty | BehavioralFilter::NotHaveProperty => {
                Some(CriterionKind::Person)
            }
            BehavioralFilter::NotPerformedEvent => None,
        }
    }

    /// Filter types that carry the paired `seq_time_value` / `time_value`
    /// windows checked by the sequential range rule.
    pub fn has_sequential_window(&self) -> bool {
        matches!(
            self,
            BehavioralFilter::PerformSequenceEvents
                | BehavioralFilter::NotPerformSequenceEvents
                | BehavioralFilter::StopPerformEvent
                | BehavioralFilter::RestartPerformEvent
        )
    }
}

/// Addressable fields of a [`Criterion`]. `Value` resolves the behavioral
/// filter selector itself; the rest map one-to-one onto typed fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Value,
    Key,
    EventType,
    TimeValue,
    TimeInterval,
    Operator,
    OperatorValue,
    MinPeriods,
    TotalPeriods,
    SeqEvent,
    SeqEventType,
    SeqTimeValue,
    SeqTimeInterval,
    ValueProperty,
}

/// Typed value exchanged by the generic schema walk over criterion fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(i64),
    Text(String),
    TimeUnit(TimeUnit),
    EventSource(EventSourceKind),
    Operator(PropertyOperator),
    Property(PropertyFilterValue),
    Filter(BehavioralFilter),
}

impl FieldValue {
    /// Whether the value counts as empty for required-field validation.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Property(value) if value.is_empty())
    }
}

/// A single behavioral matching rule. All fields are optional on input;
/// [`crate::clean::clean_criteria`] fills defaults and prunes extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CriterionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<BehavioralFilter>,
    #[serde(default)]
    pub negation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventSourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_interval: Option<TimeUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<PropertyOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_value: Option<PropertyFilterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_periods: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_periods: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_event_type: Option<EventSourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_time_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_time_interval: Option<TimeUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_property: Option<PropertyFilterValue>,
}

impl Criterion {
    /// Typed getter over the addressable fields.
    pub fn field(&self, key: FieldKey) -> Option<FieldValue> {
        match key {
            FieldKey::Value => self.value.map(FieldValue::Filter),
            FieldKey::Key => self.key.clone().map(FieldValue::Text),
            FieldKey::EventType => self.event_type.map(FieldValue::EventSource),
            FieldKey::TimeValue => self.time_value.map(FieldValue::Number),
            FieldKey::TimeInterval => self.time_interval.map(FieldValue::TimeUnit),
            FieldKey::Operator => self.operator.map(FieldValue::Operator),
            FieldKey::OperatorValue => self.operator_value.clone().map(FieldValue::Property),
            FieldKey::MinPeriods => self.min_periods.map(FieldValue::Number),
            FieldKey::TotalPeriods => self.total_periods.map(FieldValue::Number),
            FieldKey::SeqEvent => self.seq_event.clone().map(FieldValue::Text),
            FieldKey::SeqEventType => self.seq_event_type.map(FieldValue::EventSource),
            FieldKey::SeqTimeValue => self.seq_time_value.map(FieldValue::Number),
            FieldKey::SeqTimeInterval => self.seq_time_interval.map(FieldValue::TimeUnit),
            FieldKey::ValueProperty => self.value_property.clone().map(FieldValue::Property),
        }
    }

    /// Typed setter over the addressable fields. A value whose variant does
    /// not match the field's type is a programming error: it aborts in debug
    /// builds and is dropped with an error log in release builds.
    pub fn set_field(&mut self, key: FieldKey, value: Option<FieldValue>) {
        let Some(value) = value else {
            self.clear_field(key);
            return;
        };
        match (key, value) {
            (FieldKey::Value, FieldValue::Filter(v)) => self.value = Some(v),
            (FieldKey::Key, FieldValue::Text(v)) => self.key = Some(v),
            (FieldKey::EventType, FieldValue::EventSource(v)) => self.event_type = Some(v),
            (FieldKey::TimeValue, FieldValue::Number(v)) => self.time_value = Some(v),
            (FieldKey::TimeInterval, FieldValue::TimeUnit(v)) => self.time_interval = Some(v),
            (FieldKey::Operator, FieldValue::Operator(v)) => self.operator = Some(v),
            (FieldKey::OperatorValue, FieldValue::Property(v)) => self.operator_value = Some(v),
            (FieldKey::MinPeriods, FieldValue::Number(v)) => self.min_periods = Some(v),
            (FieldKey::TotalPeriods, FieldValue::Number(v)) => self.total_periods = Some(v),
            (FieldKey::SeqEvent, FieldValue::Text(v)) => self.seq_event = Some(v),
            (FieldKey::SeqEventType, FieldValue::EventSource(v)) => {
                self.seq_event_type = Some(v)
            }
            (FieldKey::SeqTimeValue, FieldValue::Number(v)) => self.seq_time_value = Some(v),
            (FieldKey::SeqTimeInterval, FieldValue::TimeUnit(v)) => {
                self.seq_time_interval = Some(v)
            }
            (FieldKey::ValueProperty, FieldValue::Property(v)) => self.value_property = Some(v),
            (key, value) => {
                tracing::error!(?key, ?value, "field value does not match the field's type");
                debug_assert!(false, "field value does not match the type of {key:?}");
            }
        }
    }

    fn clear_field(&mut self, key: FieldKey) {
        match key {
            FieldKey::Value => self.value = None,
            FieldKey::Key => self.key = None,
            FieldKey::EventType => self.event_type = None,
            FieldKey::TimeValue => self.time_value = None,
            FieldKey::TimeInterval => self.time_interval = None,
            FieldKey::Operator => self.operator = None,
            FieldKey::OperatorValue => self.operator_value = None,
            FieldKey::MinPeriods => self.min_periods = None,
            FieldKey::TotalPeriods => self.total_periods = None,
            FieldKey::SeqEvent => self.seq_event = None,
            FieldKey::SeqEventType => self.seq_event_type = None,
            FieldKey::SeqTimeValue => self.seq_time_value = None,
            FieldKey::SeqTimeInterval => self.seq_time_interval = None,
            FieldKey::ValueProperty => self.value_property = None,
        }
    }

    /// Shallow-merge: fields present on the patch win, everything else is
    /// kept from `self`.
    pub fn merged(&self, patch: &CriterionPatch) -> Criterion {
        Criterion {
            kind: patch.kind.or(self.kind),
            value: patch.value.or(self.value),
            negation: patch.negation.unwrap_or(self.negation),
            key: patch.key.clone().or_else(|| self.key.clone()),
            event_type: patch.event_type.or(self.event_type),
            time_value: patch.time_value.or(self.time_value),
            time_interval: patch.time_interval.or(self.time_interval),
            operator: patch.operator.or(self.operator),
            operator_value: patch
                .operator_value
                .clone()
                .or_else(|| self.operator_value.clone()),
            min_periods: patch.min_periods.or(self.min_periods),
            total_periods: patch.total_periods.or(self.total_periods),
            seq_event: patch.seq_event.clone().or_else(|| self.seq_event.clone()),
            seq_event_type: patch.seq_event_type.or(self.seq_event_type),
            seq_time_value: patch.seq_time_value.or(self.seq_time_value),
            seq_time_interval: patch.seq_time_interval.or(self.seq_time_interval),
            value_property: patch
                .value_property
                .clone()
                .or_else(|| self.value_property.clone()),
        }
    }
}

/// Partial criterion used by the tree mutator's shallow-merge updates.
/// Unlike [`Criterion`], `negation` is optional so a patch can leave it
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CriterionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<BehavioralFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventSourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_interval: Option<TimeUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<PropertyOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_value: Option<PropertyFilterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_periods: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_periods: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_event_type: Option<EventSourceKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_time_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq_time_interval: Option<TimeUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_property: Option<PropertyFilterValue>,
}

/// A node of the criteria tree: either a nested group or a leaf criterion.
/// On the wire the group variant is the one carrying `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CriteriaNode {
    Group(CriteriaGroup),
    Criterion(Criterion),
}

impl CriteriaNode {
    pub fn is_group(&self) -> bool {
        matches!(self, CriteriaNode::Group(_))
    }

    pub fn as_group(&self) -> Option<&CriteriaGroup> {
        match self {
            CriteriaNode::Group(group) => Some(group),
            CriteriaNode::Criterion(_) => None,
        }
    }

    pub fn as_criterion(&self) -> Option<&Criterion> {
        match self {
            CriteriaNode::Group(_) => None,
            CriteriaNode::Criterion(criterion) => Some(criterion),
        }
    }
}

/// A logical container of criteria and/or nested groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaGroup {
    pub id: String,
    #[serde(rename = "type")]
    pub operator: LogicalOperator,
    pub values: Vec<CriteriaNode>,
}

/// The criteria-tree side of a cohort definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortFilters {
    pub properties: CriteriaGroup,
}

/// Identity of a cohort: saved cohorts carry a numeric id, unsaved ones the
/// literal `"new"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortIdent {
    New,
    Stored(u64),
}

impl Serialize for CohortIdent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CohortIdent::New => serializer.serialize_str("new"),
            CohortIdent::Stored(id) => serializer.serialize_u64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for CohortIdent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdentVisitor;

        impl<'de> Visitor<'de> for IdentVisitor {
            type Value = CohortIdent;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a numeric cohort id or the string \"new\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<CohortIdent, E> {
                Ok(CohortIdent::Stored(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<CohortIdent, E> {
                u64::try_from(v)
                    .map(CohortIdent::Stored)
                    .map_err(|_| E::custom("cohort id cannot be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<CohortIdent, E> {
                if v == "new" {
                    Ok(CohortIdent::New)
                } else {
                    Err(E::custom(format!("unexpected cohort id {v:?}")))
                }
            }
        }

        deserializer.deserialize_any(IdentVisitor)
    }
}

/// The root cohort entity. The legacy flat `groups` representation and the
/// criteria tree in `filters` are both kept populated during migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    #[serde(rename = "id")]
    pub ident: CohortIdent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub groups: Vec<LegacyGroup>,
    pub filters: CohortFilters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_accessors_round_trip() {
        let mut criterion = Criterion::default();
        criterion.set_field(FieldKey::Key, Some(FieldValue::Text("pageview".to_string())));
        criterion.set_field(FieldKey::TimeValue, Some(FieldValue::Number(30)));
        criterion.set_field(FieldKey::TimeInterval, Some(FieldValue::TimeUnit(TimeUnit::Day)));

        assert_eq!(criterion.key.as_deref(), Some("pageview"));
        assert_eq!(
            criterion.field(FieldKey::TimeValue),
            Some(FieldValue::Number(30))
        );

        criterion.set_field(FieldKey::TimeValue, None);
        assert_eq!(criterion.field(FieldKey::TimeValue), None);
    }

    #[test]
    fn test_merged_prefers_patch_fields() {
        let base = Criterion {
            value: Some(BehavioralFilter::PerformEvent),
            key: Some("pageview".to_string()),
            time_value: Some(30),
            ..Default::default()
        };
        let patch = CriterionPatch {
            key: Some("signup".to_string()),
            negation: Some(true),
            ..Default::default()
        };

        let merged = base.merged(&patch);
        assert_eq!(merged.key.as_deref(), Some("signup"));
        assert_eq!(merged.time_value, Some(30));
        assert!(merged.negation);
        assert_eq!(merged.value, Some(BehavioralFilter::PerformEvent));
    }

    #[test]
    fn test_criteria_node_discriminates_groups_from_criteria() {
        let json = r#"{
            "id": "g1",
            "type": "AND",
            "values": [
                {"type": "behavioral", "value": "performed_event", "key": "pageview"}
            ]
        }"#;

        let node: CriteriaNode = serde_json::from_str(json).unwrap();
        let group = node.as_group().expect("group node");
        assert_eq!(group.values.len(), 1);
        let child = group.values[0].as_criterion().expect("criterion leaf");
        assert_eq!(child.kind, Some(CriterionKind::Behavioral));
        assert_eq!(child.value, Some(BehavioralFilter::PerformEvent));
        assert!(!child.negation);
    }

    #[test]
    fn test_cohort_ident_serde() {
        assert_eq!(serde_json::to_string(&CohortIdent::New).unwrap(), "\"new\"");
        assert_eq!(serde_json::to_string(&CohortIdent::Stored(42)).unwrap(), "42");

        let new: CohortIdent = serde_json::from_str("\"new\"").unwrap();
        assert_eq!(new, CohortIdent::New);
        let stored: CohortIdent = serde_json::from_str("7").unwrap();
        assert_eq!(stored, CohortIdent::Stored(7));
        assert!(serde_json::from_str::<CohortIdent>("\"cohort\"").is_err());
    }

    #[test]
    fn test_cleaned_criterion_serializes_without_absent_fields() {
        let criterion = Criterion {
            kind: Some(CriterionKind::Behavioral),
            value: Some(BehavioralFilter::PerformEvent),
            key: Some("pageview".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&criterion).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 4); // type, value, negation, key
        assert!(object.get("min_periods").is_none());
    }
}
