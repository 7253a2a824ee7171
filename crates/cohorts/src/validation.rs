//! Group validation: negation policy, cancellation, numeric range checks,
//! and required-field reporting.
//!
//! The validator never fails — it always returns a report the editor can
//! render next to the offending fields. Rules are evaluated in a fixed
//! precedence order and only one rule class reports per pass; downstream
//! rendering depends on that ordering.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use audience_core::properties::LogicalOperator;

use crate::clean::clean_criteria;
use crate::resolve::behavioral_filter_type;
use crate::schema::{row_for, FieldType};
use crate::types::{BehavioralFilter, CriteriaNode, Criterion, FieldKey};

/// Stable, user-facing validation messages. Collaborators display these as
/// opaque strings and must not branch on their text.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortClientError {
    #[error("Negation criteria are only supported after you have specified at least one positive matching criteria. Negation criteria can only be used when matching all criteria (AND).")]
    NegationCriteriaMissingOther,
    #[error("These criteria cancel each other out, and would result in no matching persons.")]
    NegationCriteriaCancel,
    #[error("The lowerbound period value must not be greater than the upperbound value.")]
    RegularEventMismatch,
    #[error("The lowerbound time value must not be greater than the upperbound value.")]
    SequentialTimeMismatch,
    #[error("Event or action cannot be empty.")]
    EmptyEventsAndActions,
    #[error("Event property cannot be empty.")]
    EmptyEventProperties,
    #[error("Person property value cannot be empty")]
    EmptyPersonPropertyValues,
    #[error("Event type cannot be empty.")]
    EmptyEventType,
    #[error("Period values must be at least 1 day and cannot be empty.")]
    EmptyNumber,
    #[error("Number cannot be empty.")]
    EmptyNumberTicker,
    #[error("Time interval cannot be empty.")]
    EmptyTimeUnit,
    #[error("Math operator cannot be empty.")]
    EmptyMathOperator,
    #[error("Cohort id cannot be empty.")]
    EmptyCohortId,
    #[error("Cohort value cannot be empty.")]
    EmptyCohortValues,
    #[error("Event property value selector cannot be empty.")]
    EmptyValue,
    #[error("Date cannot be empty or invalid.")]
    EmptyDateOperator,
    #[error("Actors selector cannot be empty.")]
    EmptyActors,
    #[error("Aggregation selector cannot be empty.")]
    EmptyAggregation,
    #[error("Behavioral selector cannot be empty.")]
    EmptyBehavioral,
}

impl Serialize for CohortClientError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The catalogued empty-field message for a field kind. Display-only text
/// has none.
pub fn empty_field_error(field_type: FieldType) -> Option<CohortClientError> {
    match field_type {
        FieldType::EventsAndActions => Some(CohortClientError::EmptyEventsAndActions),
        FieldType::EventProperties => Some(CohortClientError::EmptyEventProperties),
        FieldType::PersonPropertyValues => Some(CohortClientError::EmptyPersonPropertyValues),
        FieldType::EventType => Some(CohortClientError::EmptyEventType),
        FieldType::Number => Some(CohortClientError::EmptyNumber),
        FieldType::NumberTicker => Some(CohortClientError::EmptyNumberTicker),
        FieldType::TimeUnit => Some(CohortClientError::EmptyTimeUnit),
        FieldType::MathOperator => Some(CohortClientError::EmptyMathOperator),
        FieldType::CohortId => Some(CohortClientError::EmptyCohortId),
        FieldType::CohortValues => Some(CohortClientError::EmptyCohortValues),
        FieldType::Value => Some(CohortClientError::EmptyValue),
        FieldType::DateOperator => Some(CohortClientError::EmptyDateOperator),
        FieldType::Actors => Some(CohortClientError::EmptyActors),
        FieldType::Aggregation => Some(CohortClientError::EmptyAggregation),
        FieldType::Behavioral => Some(CohortClientError::EmptyBehavioral),
        FieldType::Text => None,
    }
}

/// Per-criterion validation result: an optional consolidated message plus
/// per-field messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CriterionValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<FieldKey, CohortClientError>,
}

impl CriterionValidation {
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.fields.is_empty()
    }

    fn flagged(key: FieldKey, error: CohortClientError) -> Self {
        Self {
            message: None,
            fields: BTreeMap::from([(key, error)]),
        }
    }
}

/// Validation report for one criteria group, mirroring the group's shape.
/// Entries in `criteria` align with the group's direct criterion children;
/// nested sub-groups are skipped, not recursed into.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupValidation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<CohortClientError>,
    pub criteria: Vec<CriterionValidation>,
}

impl GroupValidation {
    /// True when nothing at any level was flagged.
    pub fn is_clean(&self) -> bool {
        self.message.is_none() && self.criteria.iter().all(CriterionValidation::is_empty)
    }
}

/// Validates one criteria group. A bare criterion yields an empty report.
pub fn validate_group(node: &CriteriaNode) -> GroupValidation {
    let CriteriaNode::Group(group) = node else {
        return GroupValidation::default();
    };

    let criteria: Vec<&Criterion> = group
        .values
        .iter()
        .filter_map(CriteriaNode::as_criterion)
        .collect();
    let negated: Vec<usize> = criteria
        .iter()
        .enumerate()
        .filter(|(_, c)| c.negation)
        .map(|(index, _)| index)
        .collect();

    // Negation is only meaningful when matching all criteria, and needs at
    // least one positive criterion to anchor it.
    if (group.operator != LogicalOperator::And && !negated.is_empty())
        || (group.operator == LogicalOperator::And && negated.len() == criteria.len())
    {
        return GroupValidation {
            message: Some(CohortClientError::NegationCriteriaMissingOther),
            criteria: criteria
                .iter()
                .map(|c| {
                    if c.negation {
                        CriterionValidation::flagged(
                            FieldKey::Value,
                            CohortClientError::NegationCriteriaMissingOther,
                        )
                    } else {
                        CriterionValidation::default()
                    }
                })
                .collect(),
        };
    }

    // A negated criterion whose cleaned form matches another child with the
    // opposite sign makes the group unsatisfiable.
    let mut cancelling: BTreeSet<usize> = BTreeSet::new();
    for (a_index, a) in criteria.iter().enumerate() {
        if !a.negation {
            continue;
        }
        let cleaned_a = clean_criteria(a);
        for (b_index, b) in criteria.iter().enumerate() {
            if a_index == b_index {
                continue;
            }
            let mut flipped = clean_criteria(b);
            flipped.negation = !b.negation;
            if cleaned_a == flipped {
                cancelling.insert(a_index);
                cancelling.insert(b_index);
            }
        }
    }

    debug!(
        group_id = %group.id,
        negated = negated.len(),
        cancelling = cancelling.len(),
        "negation cancellation scan"
    );

    if group.operator == LogicalOperator::And && !negated.is_empty() && !cancelling.is_empty() {
        return GroupValidation {
            message: Some(CohortClientError::NegationCriteriaCancel),
            criteria: (0..criteria.len())
                .map(|index| {
                    if cancelling.contains(&index) {
                        CriterionValidation::flagged(
                            FieldKey::Value,
                            CohortClientError::NegationCriteriaCancel,
                        )
                    } else {
                        CriterionValidation::default()
                    }
                })
                .collect(),
        };
    }

    // Periodic-event bounds: once every regular-event criterion carries
    // both period values, this rule owns the report.
    let regular: Vec<&&Criterion> = criteria
        .iter()
        .filter(|c| c.value == Some(BehavioralFilter::PerformEventRegularly))
        .collect();
    if !regular.is_empty()
        && regular
            .iter()
            .all(|c| c.min_periods.is_some() && c.total_periods.is_some())
    {
        let mismatched = regular
            .iter()
            .any(|c| c.min_periods.unwrap_or(0) > c.total_periods.unwrap_or(0));
        return GroupValidation {
            message: mismatched.then_some(CohortClientError::RegularEventMismatch),
            criteria: criteria
                .iter()
                .map(|c| {
                    if c.value == Some(BehavioralFilter::PerformEventRegularly)
                        && c.min_periods.unwrap_or(0) > c.total_periods.unwrap_or(0)
                    {
                        CriterionValidation {
                            message: Some(CohortClientError::RegularEventMismatch.to_string()),
                            fields: BTreeMap::from([
                                (FieldKey::MinPeriods, CohortClientError::RegularEventMismatch),
                                (FieldKey::TotalPeriods, CohortClientError::RegularEventMismatch),
                            ]),
                        }
                    } else {
                        CriterionValidation::default()
                    }
                })
                .collect(),
        };
    }

    // Sequential windows: the follow-up window cannot exceed the overall one.
    let sequential: Vec<&&Criterion> = criteria
        .iter()
        .filter(|c| c.value.is_some_and(|v| v.has_sequential_window()))
        .collect();
    if !sequential.is_empty()
        && sequential
            .iter()
            .all(|c| c.seq_time_value.is_some() && c.time_value.is_some())
    {
        let mismatched = sequential
            .iter()
            .any(|c| c.seq_time_value.unwrap_or(0) > c.time_value.unwrap_or(0));
        return GroupValidation {
            message: mismatched.then_some(CohortClientError::SequentialTimeMismatch),
            criteria: criteria
                .iter()
                .map(|c| {
                    if c.value.is_some_and(|v| v.has_sequential_window())
                        && c.seq_time_value.unwrap_or(0) > c.time_value.unwrap_or(0)
                    {
                        CriterionValidation {
                            message: Some(CohortClientError::SequentialTimeMismatch.to_string()),
                            fields: BTreeMap::from([
                                (FieldKey::SeqTimeValue, CohortClientError::SequentialTimeMismatch),
                                (FieldKey::TimeValue, CohortClientError::SequentialTimeMismatch),
                            ]),
                        }
                    } else {
                        CriterionValidation::default()
                    }
                })
                .collect(),
        };
    }

    // Generic pass: every schema-declared field must be populated.
    GroupValidation {
        message: None,
        criteria: criteria
            .iter()
            .map(|c| validate_criterion_fields(c))
            .collect(),
    }
}

/// Required-field check for one criterion: each keyed schema field must be
/// present and non-empty; missing ones get the catalogued message for the
/// field's kind, joined in schema order into the consolidated message.
fn validate_criterion_fields(criterion: &Criterion) -> CriterionValidation {
    let row = row_for(behavioral_filter_type(criterion));

    let mut missing: Vec<(FieldKey, CohortClientError)> = Vec::new();
    for field in &row.fields {
        let Some(key) = field.key else { continue };
        let present = criterion
            .field(key)
            .is_some_and(|value| !value.is_empty());
        if present {
            continue;
        }
        if let Some(error) = empty_field_error(field.field_type) {
            missing.push((key, error));
        }
    }

    if missing.is_empty() {
        return CriterionValidation::default();
    }

    let message = missing
        .iter()
        .map(|(_, error)| error.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    CriterionValidation {
        message: Some(message),
        fields: missing.into_iter().collect(),
    }
}
