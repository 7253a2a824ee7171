//! Canonical type resolution: the mapping between a criterion's raw
//! `(type, value, negation)` fields and its behavioral filter type.

use crate::types::{BehavioralFilter, Criterion, CriterionKind, FieldKey, FieldValue};

/// Canonical filter type of a criterion, folding the negation flag into the
/// named negative variants. Criteria without a value resolve to the
/// perform-event default.
pub fn behavioral_filter_type(criterion: &Criterion) -> BehavioralFilter {
    if criterion.negation {
        if criterion.value == Some(BehavioralFilter::PerformSequenceEvents) {
            return BehavioralFilter::NotPerformSequenceEvents;
        }
        if criterion.value == Some(BehavioralFilter::PerformEvent) {
            return BehavioralFilter::NotPerformedEvent;
        }
        if criterion.kind == Some(CriterionKind::Person) {
            return BehavioralFilter::NotHaveProperty;
        }
        if criterion.kind == Some(CriterionKind::Cohort) {
            return BehavioralFilter::NotInCohort;
        }
    }
    criterion.value.unwrap_or(BehavioralFilter::PerformEvent)
}

/// The canonical `(type, value, negation)` triple for a filter selection:
/// the positive value is stored and `negation` carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFilter {
    pub kind: Option<CriterionKind>,
    pub value: Option<BehavioralFilter>,
    pub negation: bool,
}

/// Inverse of [`behavioral_filter_type`]: collapses an already-negative
/// value, or a positive value paired with a negation flag, into the single
/// canonical representation. Combinations not covered by the explicit
/// negative-variant rules fall through with `negation: false` — callers
/// must not route a negated value through the fallthrough.
pub fn determine_filter_type(
    kind: Option<CriterionKind>,
    value: Option<BehavioralFilter>,
    negation: bool,
) -> ResolvedFilter {
    if value == Some(BehavioralFilter::NotPerformSequenceEvents)
        || (value == Some(BehavioralFilter::PerformSequenceEvents) && negation)
    {
        return ResolvedFilter {
            kind: Some(CriterionKind::Behavioral),
            value: Some(BehavioralFilter::PerformSequenceEvents),
            negation: true,
        };
    }
    if value == Some(BehavioralFilter::NotPerformedEvent)
        || (value == Some(BehavioralFilter::PerformEvent) && negation)
    {
        return ResolvedFilter {
            kind: Some(CriterionKind::Behavioral),
            value: Some(BehavioralFilter::PerformEvent),
            negation: true,
        };
    }
    if value == Some(BehavioralFilter::NotInCohort)
        || (value == Some(BehavioralFilter::InCohort) && negation)
    {
        return ResolvedFilter {
            kind: Some(CriterionKind::Cohort),
            value: Some(BehavioralFilter::InCohort),
            negation: true,
        };
    }
    if value == Some(BehavioralFilter::NotHaveProperty)
        || (value == Some(BehavioralFilter::HaveProperty) && negation)
    {
        return ResolvedFilter {
            kind: Some(CriterionKind::Person),
            value: Some(BehavioralFilter::HaveProperty),
            negation: true,
        };
    }

    ResolvedFilter {
        kind,
        value,
        negation: false,
    }
}

/// Repairs a criterion whose `type` went stale after a filter-value switch:
/// the value's implied kind wins when one exists.
pub fn clean_behavioral_kind(criterion: &Criterion) -> Criterion {
    let mut cleaned = criterion.clone();
    if let Some(kind) = criterion.value.and_then(|value| value.implied_kind()) {
        cleaned.kind = Some(kind);
    }
    cleaned
}

/// Field accessor for UI bindings: `value` resolves through the canonical
/// filter type, every other key reads the typed field directly.
pub fn resolve_field_value(criterion: &Criterion, key: FieldKey) -> Option<FieldValue> {
    match key {
        FieldKey::Value => Some(FieldValue::Filter(behavioral_filter_type(criterion))),
        key => criterion.field(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(
        kind: Option<CriterionKind>,
        value: Option<BehavioralFilter>,
        negation: bool,
    ) -> Criterion {
        Criterion {
            kind,
            value,
            negation,
            ..Default::default()
        }
    }

    #[test]
    fn test_negated_variants_resolve_to_named_negatives() {
        let cases = [
            (
                criterion(
                    Some(CriterionKind::Behavioral),
                    Some(BehavioralFilter::PerformEvent),
                    true,
                ),
                BehavioralFilter::NotPerformedEvent,
            ),
            (
                criterion(
                    Some(CriterionKind::Behavioral),
                    Some(BehavioralFilter::PerformSequenceEvents),
                    true,
                ),
                BehavioralFilter::NotPerformSequenceEvents,
            ),
            (
                criterion(Some(CriterionKind::Person), Some(BehavioralFilter::HaveProperty), true),
                BehavioralFilter::NotHaveProperty,
            ),
            (
                criterion(Some(CriterionKind::Cohort), Some(BehavioralFilter::InCohort), true),
                BehavioralFilter::NotInCohort,
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(behavioral_filter_type(&input), expected);
        }
    }

    #[test]
    fn test_non_negated_criteria_keep_their_value() {
        let input = criterion(
            Some(CriterionKind::Behavioral),
            Some(BehavioralFilter::PerformEventRegularly),
            false,
        );
        assert_eq!(
            behavioral_filter_type(&input),
            BehavioralFilter::PerformEventRegularly
        );
    }

    #[test]
    fn test_missing_value_defaults_to_perform_event() {
        let input = criterion(Some(CriterionKind::Behavioral), None, false);
        assert_eq!(behavioral_filter_type(&input), BehavioralFilter::PerformEvent);
    }

    #[test]
    fn test_unsupported_negation_falls_through_unchanged() {
        // Negated multiple-event criteria have no named negative variant.
        let input = criterion(
            Some(CriterionKind::Behavioral),
            Some(BehavioralFilter::PerformEventMultiple),
            true,
        );
        assert_eq!(
            behavioral_filter_type(&input),
            BehavioralFilter::PerformEventMultiple
        );

        let resolved = determine_filter_type(
            Some(CriterionKind::Behavioral),
            Some(BehavioralFilter::PerformEventMultiple),
            true,
        );
        assert_eq!(resolved.value, Some(BehavioralFilter::PerformEventMultiple));
        assert!(!resolved.negation);
    }

    #[test]
    fn test_determine_collapses_negative_values() {
        let resolved = determine_filter_type(None, Some(BehavioralFilter::NotInCohort), false);
        assert_eq!(
            resolved,
            ResolvedFilter {
                kind: Some(CriterionKind::Cohort),
                value: Some(BehavioralFilter::InCohort),
                negation: true,
            }
        );

        let resolved =
            determine_filter_type(None, Some(BehavioralFilter::NotPerformedEvent), false);
        assert_eq!(resolved.value, Some(BehavioralFilter::PerformEvent));
        assert!(resolved.negation);
    }

    #[test]
    fn test_clean_behavioral_kind_repairs_stale_kind() {
        let stale = Criterion {
            kind: Some(CriterionKind::Behavioral),
            value: Some(BehavioralFilter::InCohort),
            ..Default::default()
        };
        assert_eq!(
            clean_behavioral_kind(&stale).kind,
            Some(CriterionKind::Cohort)
        );

        // not_performed_event keeps whatever kind the criterion already has.
        let unchanged = Criterion {
            kind: Some(CriterionKind::Person),
            value: Some(BehavioralFilter::NotPerformedEvent),
            ..Default::default()
        };
        assert_eq!(
            clean_behavioral_kind(&unchanged).kind,
            Some(CriterionKind::Person)
        );
    }

    #[test]
    fn test_resolve_field_value_special_cases_the_filter_selector() {
        let input = criterion(Some(CriterionKind::Cohort), Some(BehavioralFilter::InCohort), true);
        assert_eq!(
            resolve_field_value(&input, FieldKey::Value),
            Some(FieldValue::Filter(BehavioralFilter::NotInCohort))
        );
        assert_eq!(resolve_field_value(&input, FieldKey::Key), None);
    }
}
