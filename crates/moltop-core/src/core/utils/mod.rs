//! Small pure helpers shared across the core: wildcard matching for type
//! selection and 1-based range expressions for molecule selections.

pub mod ranges;
pub mod wildcards;
