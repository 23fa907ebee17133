use super::{Action, ActionSignature, Aggregation};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tuple::{Label, Template};

/// Composable is a collection of aggregation policies with deterministic
/// lookup: by label, or by finding the policy whose template most
/// exactly matches an action's parameters.
///
/// Invariants: a label identifier appears at most once; every
/// (template, label) pair held under an action signature has its label
/// present in the label map.
#[derive(Clone, Default)]
pub struct Composable {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    // Action signature => (template, label) pairs, in insertion order.
    action_map: HashMap<ActionSignature, Vec<(Template, Label)>>,
    // Label identifier => aggregation policy.
    label_map: HashMap<String, Aggregation>,
}

impl Composable {
    pub fn new(policies: impl IntoIterator<Item = Aggregation>) -> Self {
        let cp = Self::default();
        for ap in policies {
            cp.add(ap);
        }
        cp
    }

    /// Adds an aggregation policy. Returns false if its label is already
    /// bound, or if an equal (template, label) pair is already held for
    /// the action.
    pub fn add(&self, ap: Aggregation) -> bool {
        let template = ap.action().template();
        let label = ap.label().clone();
        let sign = ap.action().signature().clone();

        let mut inner = self.inner.write().unwrap();
        if inner.label_map.contains_key(label.id()) {
            return false;
        }

        let pairs = inner.action_map.entry(sign).or_default();
        let duplicate = pairs
            .iter()
            .any(|(t, l)| template.exact_match(t).is_some() && *l == label);
        if duplicate {
            return false;
        }

        pairs.push((template, label.clone()));
        inner.label_map.insert(label.id().to_string(), ap);
        true
    }

    /// Finds the label of the policy whose template most exactly matches
    /// the action's parameters: higher qno wins, then higher pno, then
    /// the first inserted. Returns None if no template matches.
    pub fn find(&self, action: &Action) -> Option<Label> {
        let template = action.template();
        let inner = self.inner.read().unwrap();
        let pairs = inner.action_map.get(action.signature())?;

        let mut best: Option<(&Label, (u32, u32))> = None;
        for (t, l) in pairs {
            let Some((pno, qno)) = template.exact_match(t) else {
                continue;
            };
            // Strict comparisons keep the first inserted on ties.
            let better = match best {
                None => true,
                Some((_, (bp, bq))) => qno > bq || (qno == bq && pno > bp),
            };
            if better {
                best = Some((l, (pno, qno)));
            }
        }
        best.map(|(l, _)| l.clone())
    }

    /// The policy bound to a label, if any.
    pub fn retrieve(&self, label: &Label) -> Option<Aggregation> {
        self.inner
            .read()
            .unwrap()
            .label_map
            .get(label.id())
            .cloned()
    }

    /// Removes the policy bound to a label, together with its
    /// (template, label) pair. Returns false if the label is unbound.
    pub fn delete(&self, label: &Label) -> bool {
        let mut inner = self.inner.write().unwrap();
        let Some(ap) = inner.label_map.remove(label.id()) else {
            return false;
        };

        let sign = ap.action().signature().clone();
        if let Some(pairs) = inner.action_map.get_mut(&sign) {
            pairs.retain(|(_, l)| l != label);
            if pairs.is_empty() {
                inner.action_map.remove(&sign);
            }
        }
        true
    }
}
