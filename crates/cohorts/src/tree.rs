//! Structure-preserving tree updates. Every operation returns a new cohort
//! and leaves the input untouched, so the caller can keep the previous
//! snapshot for undo and change detection.

use audience_core::ids::IdSource;
use audience_core::properties::LogicalOperator;

use crate::groups::{GroupProperties, LegacyGroup, MatchType};
use crate::types::{
    BehavioralFilter, Cohort, CohortFilters, CohortIdent, CriteriaGroup, CriteriaNode, Criterion,
    CriterionKind, CriterionPatch, EventSourceKind, TimeUnit,
};

/// Starting criterion for a newly added row: performed any event in the
/// last 30 days.
pub fn new_criterion() -> Criterion {
    Criterion {
        kind: Some(CriterionKind::Behavioral),
        value: Some(BehavioralFilter::PerformEvent),
        event_type: Some(EventSourceKind::Events),
        time_value: Some(30),
        time_interval: Some(TimeUnit::Day),
        ..Default::default()
    }
}

/// Starting sub-group for a newly added card: one fresh criterion under OR.
pub fn new_criteria_group(ids: &mut impl IdSource) -> CriteriaGroup {
    CriteriaGroup {
        id: ids.next_id(),
        operator: LogicalOperator::Or,
        values: vec![CriteriaNode::Criterion(new_criterion())],
    }
}

/// A fresh unsaved cohort carrying both representations: one empty legacy
/// property group and a criteria tree with a single starting sub-group.
pub fn new_cohort(ids: &mut impl IdSource) -> Cohort {
    Cohort {
        ident: CohortIdent::New,
        name: None,
        description: None,
        is_static: false,
        created_at: None,
        updated_at: None,
        groups: vec![LegacyGroup {
            id: Some(ids.next_id()),
            match_type: Some(MatchType::Properties),
            properties: Some(GroupProperties::Flat(Vec::new())),
            ..Default::default()
        }],
        filters: CohortFilters {
            properties: CriteriaGroup {
                id: ids.next_id(),
                operator: LogicalOperator::Or,
                values: vec![CriteriaNode::Group(new_criteria_group(ids))],
            },
        },
    }
}

/// Returns a new cohort with the criterion at `(group_index,
/// criterion_index)` shallow-merged with `patch`. Out-of-range indices, or
/// an addressed child that is not a criterion, leave the tree unchanged —
/// edits may race structural changes and must not panic.
pub fn set_criteria_at(
    cohort: &Cohort,
    group_index: usize,
    criterion_index: usize,
    patch: &CriterionPatch,
) -> Cohort {
    let mut next = cohort.clone();
    next.filters.properties.values = cohort
        .filters
        .properties
        .values
        .iter()
        .enumerate()
        .map(|(gi, node)| match node {
            CriteriaNode::Group(group) if gi == group_index => {
                let mut group = group.clone();
                group.values = group
                    .values
                    .iter()
                    .enumerate()
                    .map(|(ci, child)| match child {
                        CriteriaNode::Criterion(criterion) if ci == criterion_index => {
                            CriteriaNode::Criterion(criterion.merged(patch))
                        }
                        other => other.clone(),
                    })
                    .collect();
                CriteriaNode::Group(group)
            }
            other => other.clone(),
        })
        .collect();
    next
}

/// Returns a new cohort with `f` applied to the full child list of every
/// top-level group, or only the group at `scope` when given. `f` may
/// reshape, add, or remove entries.
pub fn map_criteria(
    cohort: &Cohort,
    f: impl Fn(&[CriteriaNode]) -> Vec<CriteriaNode>,
    scope: Option<usize>,
) -> Cohort {
    let mut next = cohort.clone();
    next.filters.properties.values = cohort
        .filters
        .properties
        .values
        .iter()
        .enumerate()
        .map(|(gi, node)| match node {
            CriteriaNode::Group(group) if scope.is_none_or(|s| s == gi) => {
                let mut group = group.clone();
                group.values = f(&group.values);
                CriteriaNode::Group(group)
            }
            other => other.clone(),
        })
        .collect();
    next
}

/// Returns a new cohort with `f` applied to the top-level list of groups
/// and criteria.
pub fn map_groups(cohort: &Cohort, f: impl FnOnce(&[CriteriaNode]) -> Vec<CriteriaNode>) -> Cohort {
    let mut next = cohort.clone();
    next.filters.properties.values = f(&cohort.filters.properties.values);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use audience_core::ids::SequentialIds;

    fn cohort() -> Cohort {
        new_cohort(&mut SequentialIds::new())
    }

    fn first_criterion(cohort: &Cohort) -> &Criterion {
        cohort.filters.properties.values[0]
            .as_group()
            .unwrap()
            .values[0]
            .as_criterion()
            .unwrap()
    }

    #[test]
    fn test_new_cohort_ids_come_from_the_injected_source() {
        let cohort = cohort();
        assert_eq!(cohort.ident, CohortIdent::New);
        assert_eq!(cohort.groups[0].id.as_deref(), Some("id-1"));
        assert_eq!(cohort.filters.properties.id, "id-2");
        assert_eq!(
            cohort.filters.properties.values[0].as_group().unwrap().id,
            "id-3"
        );
    }

    #[test]
    fn test_set_criteria_at_merges_patch() {
        let before = cohort();
        let patch = CriterionPatch {
            key: Some("pageview".to_string()),
            negation: Some(true),
            ..Default::default()
        };

        let after = set_criteria_at(&before, 0, 0, &patch);
        let criterion = first_criterion(&after);
        assert_eq!(criterion.key.as_deref(), Some("pageview"));
        assert!(criterion.negation);
        // Untouched fields survive the merge.
        assert_eq!(criterion.time_value, Some(30));

        // The previous snapshot is still intact.
        assert_eq!(first_criterion(&before).key, None);
        assert!(!first_criterion(&before).negation);
    }

    #[test]
    fn test_set_criteria_at_out_of_range_is_a_no_op() {
        let before = cohort();
        let patch = CriterionPatch {
            key: Some("pageview".to_string()),
            ..Default::default()
        };

        assert_eq!(set_criteria_at(&before, 5, 0, &patch), before);
        assert_eq!(set_criteria_at(&before, 0, 9, &patch), before);
    }

    #[test]
    fn test_map_criteria_can_append_rows() {
        let before = cohort();
        let after = map_criteria(
            &before,
            |values| {
                let mut next = values.to_vec();
                next.push(CriteriaNode::Criterion(new_criterion()));
                next
            },
            None,
        );

        assert_eq!(
            after.filters.properties.values[0].as_group().unwrap().values.len(),
            2
        );
        assert_eq!(
            before.filters.properties.values[0].as_group().unwrap().values.len(),
            1
        );
    }

    #[test]
    fn test_map_criteria_respects_scope() {
        let mut ids = SequentialIds::new();
        let mut base = new_cohort(&mut ids);
        base.filters.properties.values.push(CriteriaNode::Group(new_criteria_group(&mut ids)));

        let after = map_criteria(&base, |_| Vec::new(), Some(1));
        assert_eq!(
            after.filters.properties.values[0].as_group().unwrap().values.len(),
            1
        );
        assert!(after.filters.properties.values[1]
            .as_group()
            .unwrap()
            .values
            .is_empty());
    }

    #[test]
    fn test_map_groups_rewrites_the_top_level_list() {
        let before = cohort();
        let after = map_groups(&before, |values| {
            let mut next = values.to_vec();
            next.push(CriteriaNode::Group(CriteriaGroup {
                id: "extra".to_string(),
                operator: LogicalOperator::And,
                values: Vec::new(),
            }));
            next
        });

        assert_eq!(after.filters.properties.values.len(), 2);
        assert_eq!(before.filters.properties.values.len(), 1);
    }
}
