use super::{Action, Transformations};
use tuple::Label;

/// AggregationRule pairs the action it governs (the object) with the
/// transformations that action is subject to.
#[derive(Debug, Clone)]
pub struct AggregationRule {
    object: Action,
    subject: Transformations,
}

impl AggregationRule {
    pub fn new(object: Action, subject: Transformations) -> Self {
        Self { object, subject }
    }

    pub fn action(&self) -> &Action {
        &self.object
    }

    pub fn transformations(&self) -> &Transformations {
        &self.subject
    }
}

/// Aggregation is one aggregation policy: a label attached to a rule.
/// The label is how the policy is retrieved, and how tuples it matched
/// are marked.
#[derive(Debug, Clone)]
pub struct Aggregation {
    label: Label,
    rule: AggregationRule,
}

impl Aggregation {
    pub fn new(label: Label, rule: AggregationRule) -> Self {
        Self { label, rule }
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn rule(&self) -> &AggregationRule {
        &self.rule
    }

    pub fn action(&self) -> &Action {
        self.rule.action()
    }
}
