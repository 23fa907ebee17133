//! Attribute-based aggregation policies. A policy labels an action and
//! subjects it to a transformation triple; a composable policy resolves
//! an incoming action to the most specific rule that governs it.

mod action;
pub use action::{Action, ActionSignature};

mod transformation;
pub use transformation::{Transformation, TransformationError, Transformations};

mod rule;
pub use rule::{Aggregation, AggregationRule};

mod composable;
pub use composable::Composable;
