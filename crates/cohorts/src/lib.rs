//! Cohort criteria engine — the data model, type resolution, normalization,
//! and validation behind interactively edited audience definitions.
//!
//! Every operation is a pure function over an immutable snapshot: edits go
//! through [`tree`], each edit re-runs [`validation::validate_group`] on the
//! changed group, and [`clean::clean_criteria`] normalizes criteria before
//! they are handed to the transport layer via [`payload`].

pub mod clean;
pub mod groups;
pub mod payload;
pub mod resolve;
pub mod schema;
pub mod tree;
pub mod types;
pub mod validation;

pub use clean::clean_criteria;
pub use types::{Cohort, CriteriaGroup, CriteriaNode, Criterion};
pub use validation::{validate_group, GroupValidation};
