//! Legacy flat "match-type groups" cohort representation, kept alongside
//! the criteria tree while saved cohorts migrate.

use serde::{Deserialize, Serialize};

use audience_core::ids::IdSource;
use audience_core::properties::{
    flatten_property_group, PropertyFilter, PropertyGroup, PropertyOperator,
};

use crate::types::{Cohort, CohortFilters};

/// How a legacy group matches: on performed entities or person properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Entities,
    Properties,
}

/// Properties of a legacy group arrive either as a flat filter list or as a
/// nested property group on older saved cohorts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupProperties {
    Flat(Vec<PropertyFilter>),
    Grouped(PropertyGroup),
}

impl GroupProperties {
    pub fn is_empty(&self) -> bool {
        match self {
            GroupProperties::Flat(filters) => filters.is_empty(),
            GroupProperties::Grouped(group) => group.values.is_empty(),
        }
    }
}

/// One legacy match group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        rename = "matchType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub match_type: Option<MatchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_operator: Option<PropertyOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<GroupProperties>,
}

/// A property-match group needs at least one property; an entity-match
/// group needs an action or event reference.
pub fn is_valid_group(group: &LegacyGroup) -> bool {
    !((group.match_type == Some(MatchType::Properties)
        && group
            .properties
            .as_ref()
            .is_none_or(GroupProperties::is_empty))
        || (group.match_type == Some(MatchType::Entities)
            && group.action_id.is_none()
            && group.event_id.is_none()))
}

/// Stamps the local bookkeeping fields on a group: a match type derived
/// from the entity refs and a locally-unique id. Existing values win.
pub fn with_local_group_id(group: &LegacyGroup, ids: &mut impl IdSource) -> LegacyGroup {
    let derived = if group.action_id.is_some() || group.event_id.is_some() {
        MatchType::Entities
    } else {
        MatchType::Properties
    };

    let mut next = group.clone();
    next.match_type = group.match_type.or(Some(derived));
    next.id = group.id.clone().or_else(|| Some(ids.next_id()));
    next
}

/// Normalizes a cohort as it lands in the editor. In criteria mode only the
/// criteria tree is kept; in legacy mode every group gets its local
/// bookkeeping fields and nested property groups are flattened.
pub fn process_cohort_on_set(
    cohort: &Cohort,
    use_criteria_filters: bool,
    ids: &mut impl IdSource,
) -> Cohort {
    let mut next = cohort.clone();
    if use_criteria_filters {
        next.filters = CohortFilters {
            properties: cohort.filters.properties.clone(),
        };
    } else {
        next.groups = cohort
            .groups
            .iter()
            .map(|group| {
                let mut stamped = with_local_group_id(group, ids);
                if let Some(GroupProperties::Grouped(nested)) = &group.properties {
                    stamped.properties =
                        Some(GroupProperties::Flat(flatten_property_group(nested)));
                }
                stamped
            })
            .collect();
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::new_cohort;
    use audience_core::ids::SequentialIds;
    use audience_core::properties::{
        LogicalOperator, PropertyFilterValue, PropertyGroupChild,
    };

    fn property(key: &str) -> PropertyFilter {
        PropertyFilter {
            key: key.to_string(),
            value: Some(PropertyFilterValue::from("yes")),
            operator: Some(PropertyOperator::Exact),
            kind: None,
        }
    }

    #[test]
    fn test_property_group_needs_properties() {
        let empty = LegacyGroup {
            match_type: Some(MatchType::Properties),
            properties: Some(GroupProperties::Flat(Vec::new())),
            ..Default::default()
        };
        assert!(!is_valid_group(&empty));

        let populated = LegacyGroup {
            match_type: Some(MatchType::Properties),
            properties: Some(GroupProperties::Flat(vec![property("plan")])),
            ..Default::default()
        };
        assert!(is_valid_group(&populated));
    }

    #[test]
    fn test_entity_group_needs_action_or_event() {
        let bare = LegacyGroup {
            match_type: Some(MatchType::Entities),
            ..Default::default()
        };
        assert!(!is_valid_group(&bare));

        let with_event = LegacyGroup {
            match_type: Some(MatchType::Entities),
            event_id: Some("pageview".to_string()),
            ..Default::default()
        };
        assert!(is_valid_group(&with_event));
    }

    #[test]
    fn test_with_local_group_id_derives_match_type() {
        let mut ids = SequentialIds::new();

        let entity = with_local_group_id(
            &LegacyGroup {
                action_id: Some(12),
                ..Default::default()
            },
            &mut ids,
        );
        assert_eq!(entity.match_type, Some(MatchType::Entities));
        assert_eq!(entity.id.as_deref(), Some("id-1"));

        let property_group = with_local_group_id(&LegacyGroup::default(), &mut ids);
        assert_eq!(property_group.match_type, Some(MatchType::Properties));
    }

    #[test]
    fn test_with_local_group_id_keeps_existing_values() {
        let mut ids = SequentialIds::new();
        let group = LegacyGroup {
            id: Some("kept".to_string()),
            match_type: Some(MatchType::Properties),
            event_id: Some("pageview".to_string()),
            ..Default::default()
        };

        let stamped = with_local_group_id(&group, &mut ids);
        assert_eq!(stamped.id.as_deref(), Some("kept"));
        // Entity refs would derive Entities, but the stored value wins.
        assert_eq!(stamped.match_type, Some(MatchType::Properties));
    }

    #[test]
    fn test_process_cohort_flattens_nested_properties_in_legacy_mode() {
        let mut ids = SequentialIds::new();
        let mut cohort = new_cohort(&mut ids);
        cohort.groups = vec![LegacyGroup {
            properties: Some(GroupProperties::Grouped(PropertyGroup {
                operator: LogicalOperator::And,
                values: vec![
                    PropertyGroupChild::Filter(property("plan")),
                    PropertyGroupChild::Group(PropertyGroup {
                        operator: LogicalOperator::Or,
                        values: vec![PropertyGroupChild::Filter(property("country"))],
                    }),
                ],
            })),
            ..Default::default()
        }];

        let processed = process_cohort_on_set(&cohort, false, &mut ids);
        let group = &processed.groups[0];
        assert!(group.id.is_some());
        assert_eq!(group.match_type, Some(MatchType::Properties));
        match &group.properties {
            Some(GroupProperties::Flat(filters)) => {
                let keys: Vec<&str> = filters.iter().map(|f| f.key.as_str()).collect();
                assert_eq!(keys, vec!["plan", "country"]);
            }
            other => panic!("expected flat properties, got {other:?}"),
        }
    }

    #[test]
    fn test_process_cohort_keeps_only_the_tree_in_criteria_mode() {
        let mut ids = SequentialIds::new();
        let cohort = new_cohort(&mut ids);
        let processed = process_cohort_on_set(&cohort, true, &mut ids);
        assert_eq!(processed.filters, cohort.filters);
        assert_eq!(processed.groups, cohort.groups);
    }
}
