//! Serialization contract: the request payload the transport layer sends
//! when a cohort is saved.

use serde::Serialize;

use audience_core::AudienceResult;

use crate::groups::LegacyGroup;
use crate::types::Cohort;

/// Wire payload for cohort create/update. Exactly one of the two criteria
/// encodings is populated, selected by the criteria-filters feature toggle;
/// both are carried as JSON strings because the transport encodes the
/// request as form data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CohortPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    pub groups: String,
}

/// Builds the save payload for a validated cohort. Static cohorts carry an
/// empty criteria encoding; legacy groups are stripped of their local
/// `id`/`matchType` bookkeeping before they leave the editor.
pub fn cohort_payload(cohort: &Cohort, criteria_filters: bool) -> AudienceResult<CohortPayload> {
    let mut payload = CohortPayload {
        name: cohort.name.clone().filter(|name| !name.is_empty()),
        description: cohort
            .description
            .clone()
            .filter(|description| !description.is_empty()),
        is_static: cohort.is_static.then_some(true),
        filters: None,
        groups: String::new(),
    };

    if criteria_filters {
        payload.filters = Some(if cohort.is_static {
            "{}".to_string()
        } else {
            serde_json::to_string(&cohort.filters)?
        });
        payload.groups = "[]".to_string();
    } else {
        let groups: Vec<LegacyGroup> = if cohort.is_static {
            Vec::new()
        } else {
            cohort
                .groups
                .iter()
                .map(|group| LegacyGroup {
                    id: None,
                    match_type: None,
                    ..group.clone()
                })
                .collect()
        };
        payload.groups = serde_json::to_string(&groups)?;
    }

    Ok(payload)
}
