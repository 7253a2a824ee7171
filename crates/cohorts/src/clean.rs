//! Criterion normalization: schema defaults in, stale fields out.

use crate::resolve::{behavioral_filter_type, determine_filter_type};
use crate::schema::row_for;
use crate::types::Criterion;

/// Normalizes a criterion against its resolved type's schema: existing
/// values are kept, missing ones take the schema default, and fields the
/// schema does not declare are dropped. The canonical `(type, value,
/// negation)` triple is re-derived last so the output always stores the
/// positive value with the sign on `negation`.
///
/// Pure and idempotent: normalizing an already-normalized criterion is a
/// no-op.
pub fn clean_criteria(criterion: &Criterion) -> Criterion {
    let row = row_for(behavioral_filter_type(criterion));

    let mut populated = Criterion {
        kind: criterion.kind.or(Some(row.kind)),
        value: criterion.value.or(Some(row.value)),
        negation: criterion.negation,
        ..Default::default()
    };

    for field in &row.fields {
        let Some(key) = field.key else { continue };
        let next = criterion.field(key).or_else(|| field.default_value.clone());
        populated.set_field(key, next);
    }

    let resolved = determine_filter_type(populated.kind, populated.value, populated.negation);
    populated.kind = resolved.kind;
    populated.value = resolved.value;
    populated.negation = resolved.negation;
    populated
}
