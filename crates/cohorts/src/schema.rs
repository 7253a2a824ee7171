//! Field schema registry: the static table mapping each behavioral filter
//! type to its API-prop defaults and ordered field layout.

use serde::{Deserialize, Serialize};

use audience_core::properties::{PropertyFilterValue, PropertyOperator};

use crate::types::{
    BehavioralFilter, CriterionKind, EventSourceKind, FieldKey, FieldValue, TimeUnit,
};

/// Kinds of field the editor renders. Empty-field validation messages are
/// catalogued per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Behavioral,
    Aggregation,
    Actors,
    TimeUnit,
    DateOperator,
    MathOperator,
    Value,
    Text,
    EventsAndActions,
    EventProperties,
    PersonPropertyValues,
    EventType,
    Number,
    NumberTicker,
    CohortValues,
    CohortId,
}

/// One field in a filter row. Keyless fields are display-only separators
/// and are skipped by the normalizer and validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: Option<FieldKey>,
    pub field_type: FieldType,
    pub default_value: Option<FieldValue>,
    /// Hidden fields are carried in the payload but never rendered.
    pub hide: bool,
}

impl Field {
    fn keyed(key: FieldKey, field_type: FieldType) -> Self {
        Self {
            key: Some(key),
            field_type,
            default_value: None,
            hide: false,
        }
    }

    fn with_default(key: FieldKey, field_type: FieldType, default_value: FieldValue) -> Self {
        Self {
            key: Some(key),
            field_type,
            default_value: Some(default_value),
            hide: false,
        }
    }

    fn hidden(key: FieldKey, field_type: FieldType, default_value: FieldValue) -> Self {
        Self {
            key: Some(key),
            field_type,
            default_value: Some(default_value),
            hide: true,
        }
    }

    fn text(label: &str) -> Self {
        Self {
            key: None,
            field_type: FieldType::Text,
            default_value: Some(FieldValue::Text(label.to_string())),
            hide: false,
        }
    }
}

/// Schema row for one behavioral filter type. `kind`, `value`, and
/// `negation` are the required API-prop defaults; negative variants carry
/// the canonical positive `value` with `negation` set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: CriterionKind,
    pub value: BehavioralFilter,
    pub negation: bool,
    pub fields: Vec<Field>,
}

/// Schema lookup, total over the closed filter enumeration. Unknown filter
/// types are unrepresentable; the compiler enforces totality.
pub fn row_for(filter: BehavioralFilter) -> Row {
    match filter {
        BehavioralFilter::PerformEvent => Row {
            kind: CriterionKind::Behavioral,
            value: BehavioralFilter::PerformEvent,
            negation: false,
            fields: vec![
                Field::keyed(FieldKey::Key, FieldType::EventsAndActions),
                Field::hidden(
                    FieldKey::EventType,
                    FieldType::EventType,
                    FieldValue::EventSource(EventSourceKind::Events),
                ),
                Field::text("in the last"),
                Field::with_default(FieldKey::TimeValue, FieldType::Number, FieldValue::Number(30)),
                Field::with_default(
                    FieldKey::TimeInterval,
                    FieldType::TimeUnit,
                    FieldValue::TimeUnit(TimeUnit::Day),
                ),
            ],
        },
        BehavioralFilter::NotPerformedEvent => Row {
            negation: true,
            ..row_for(BehavioralFilter::PerformEvent)
        },
        BehavioralFilter::PerformEventMultiple => Row {
            kind: CriterionKind::Behavioral,
            value: BehavioralFilter::PerformEventMultiple,
            negation: false,
            fields: vec![
                Field::keyed(FieldKey::Key, FieldType::EventsAndActions),
                Field::hidden(
                    FieldKey::EventType,
                    FieldType::EventType,
                    FieldValue::EventSource(EventSourceKind::Events),
                ),
                Field::with_default(
                    FieldKey::Operator,
                    FieldType::MathOperator,
                    FieldValue::Operator(PropertyOperator::Gte),
                ),
                Field::keyed(FieldKey::OperatorValue, FieldType::NumberTicker),
                Field::text("times in the last"),
                Field::with_default(FieldKey::TimeValue, FieldType::Number, FieldValue::Number(30)),
                Field::with_default(
                    FieldKey::TimeInterval,
                    FieldType::TimeUnit,
                    FieldValue::TimeUnit(TimeUnit::Day),
                ),
            ],
        },
        BehavioralFilter::PerformEventFirstTime => Row {
            kind: CriterionKind::Behavioral,
            value: BehavioralFilter::PerformEventFirstTime,
            negation: false,
            fields: vec![
                Field::keyed(FieldKey::Key, FieldType::EventsAndActions),
                Field::hidden(
                    FieldKey::EventType,
                    FieldType::EventType,
                    FieldValue::EventSource(EventSourceKind::Events),
                ),
                Field::text("in the last"),
                Field::with_default(FieldKey::TimeValue, FieldType::Number, FieldValue::Number(30)),
                Field::with_default(
                    FieldKey::TimeInterval,
                    FieldType::TimeUnit,
                    FieldValue::TimeUnit(TimeUnit::Day),
                ),
            ],
        },
        BehavioralFilter::PerformEventRegularly => Row {
            kind: CriterionKind::Behavioral,
            value: BehavioralFilter::PerformEventRegularly,
            negation: false,
            fields: vec![
                Field::keyed(FieldKey::Key, FieldType::EventsAndActions),
                Field::hidden(
                    FieldKey::EventType,
                    FieldType::EventType,
                    FieldValue::EventSource(EventSourceKind::Events),
                ),
                Field::with_default(
                    FieldKey::Operator,
                    FieldType::MathOperator,
                    FieldValue::Operator(PropertyOperator::Gte),
                ),
                Field::with_default(
                    FieldKey::OperatorValue,
                    FieldType::NumberTicker,
                    FieldValue::Property(PropertyFilterValue::Number(1)),
                ),
                Field::text("times per"),
                Field::with_default(FieldKey::TimeValue, FieldType::Number, FieldValue::Number(1)),
                Field::with_default(
                    FieldKey::TimeInterval,
                    FieldType::TimeUnit,
                    FieldValue::TimeUnit(TimeUnit::Day),
                ),
                Field::text("period for at least"),
                Field::with_default(FieldKey::MinPeriods, FieldType::Number, FieldValue::Number(3)),
                Field::text("of the last"),
                Field::with_default(
                    FieldKey::TotalPeriods,
                    FieldType::Number,
                    FieldValue::Number(5),
                ),
            ],
        },
        BehavioralFilter::StopPerformEvent => Row {
            kind: CriterionKind::Behavioral,
            value: BehavioralFilter::StopPerformEvent,
            negation: false,
            fields: vec![
                Field::keyed(FieldKey::Key, FieldType::EventsAndActions),
                Field::hidden(
                    FieldKey::EventType,
                    FieldType::EventType,
                    FieldValue::EventSource(EventSourceKind::Events),
                ),
                Field::text("in the last"),
                Field::with_default(
                    FieldKey::SeqTimeValue,
                    FieldType::Number,
                    FieldValue::Number(30),
                ),
                Field::with_default(
                    FieldKey::SeqTimeInterval,
                    FieldType::TimeUnit,
                    FieldValue::TimeUnit(TimeUnit::Day),
                ),
                Field::text("but had performed it in the"),
                Field::with_default(FieldKey::TimeValue, FieldType::Number, FieldValue::Number(30)),
                Field::with_default(
                    FieldKey::TimeInterval,
                    FieldType::TimeUnit,
                    FieldValue::TimeUnit(TimeUnit::Day),
                ),
                Field::text("before that"),
            ],
        },
        BehavioralFilter::RestartPerformEvent => Row {
            value: BehavioralFilter::RestartPerformEvent,
            ..row_for(BehavioralFilter::StopPerformEvent)
        },
        BehavioralFilter::PerformSequenceEvents => Row {
            kind: CriterionKind::Behavioral,
            value: BehavioralFilter::PerformSequenceEvents,
            negation: false,
            fields: vec![
                Field::keyed(FieldKey::Key, FieldType::EventsAndActions),
                Field::hidden(
                    FieldKey::EventType,
                    FieldType::EventType,
                    FieldValue::EventSource(EventSourceKind::Events),
                ),
                Field::text("in the last"),
                Field::with_default(FieldKey::TimeValue, FieldType::Number, FieldValue::Number(30)),
                Field::with_default(
                    FieldKey::TimeInterval,
                    FieldType::TimeUnit,
                    FieldValue::TimeUnit(TimeUnit::Day),
                ),
                Field::text("followed by"),
                Field::keyed(FieldKey::SeqEvent, FieldType::EventsAndActions),
                Field::hidden(
                    FieldKey::SeqEventType,
                    FieldType::EventType,
                    FieldValue::EventSource(EventSourceKind::Events),
                ),
                Field::text("within"),
                Field::with_default(
                    FieldKey::SeqTimeValue,
                    FieldType::Number,
                    FieldValue::Number(15),
                ),
                Field::with_default(
                    FieldKey::SeqTimeInterval,
                    FieldType::TimeUnit,
                    FieldValue::TimeUnit(TimeUnit::Day),
                ),
                Field::text("of the initial event"),
            ],
        },
        BehavioralFilter::NotPerformSequenceEvents => Row {
            negation: true,
            ..row_for(BehavioralFilter::PerformSequenceEvents)
        },
        BehavioralFilter::InCohort => Row {
            kind: CriterionKind::Cohort,
            value: BehavioralFilter::InCohort,
            negation: false,
            fields: vec![Field::keyed(FieldKey::ValueProperty, FieldType::CohortValues)],
        },
        BehavioralFilter::NotInCohort => Row {
            negation: true,
            ..row_for(BehavioralFilter::InCohort)
        },
        BehavioralFilter::HaveProperty => Row {
            kind: CriterionKind::Person,
            value: BehavioralFilter::HaveProperty,
            negation: false,
            fields: vec![
                Field::keyed(FieldKey::Key, FieldType::EventProperties),
                Field::with_default(
                    FieldKey::Operator,
                    FieldType::MathOperator,
                    FieldValue::Operator(PropertyOperator::Exact),
                ),
                Field::keyed(FieldKey::ValueProperty, FieldType::PersonPropertyValues),
            ],
        },
        BehavioralFilter::NotHaveProperty => Row {
            negation: true,
            ..row_for(BehavioralFilter::HaveProperty)
        },
    }
}
