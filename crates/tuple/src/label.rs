use std::collections::BTreeMap;

/// Label is a string identifier attached to tuples and policies.
/// Two labels are equal iff their identifiers are equal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Label {
    id: String,
}

impl Label {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "|{}|", self.id)
    }
}

/// Labels is a set of labels keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Labels {
    set: BTreeMap<String, Label>,
}

impl Labels {
    pub fn new(labels: impl IntoIterator<Item = Label>) -> Self {
        let mut ls = Self::default();
        for l in labels {
            ls.add(l);
        }
        ls
    }

    /// Adds a label. Returns false if a label with its identifier is
    /// already present.
    pub fn add(&mut self, label: Label) -> bool {
        match self.set.entry(label.id().to_string()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(label);
                true
            }
        }
    }

    /// Removes the label with the given identifier. Returns false if it
    /// was not present.
    pub fn delete(&mut self, id: &str) -> bool {
        self.set.remove(id).is_some()
    }

    pub fn retrieve(&self, id: &str) -> Option<&Label> {
        self.set.get(id)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// The identifiers present in this set, in sorted order.
    pub fn labelling(&self) -> Vec<&str> {
        self.set.keys().map(String::as_str).collect()
    }

    /// A view of all labels in the set.
    pub fn set(&self) -> impl Iterator<Item = &Label> {
        self.set.values()
    }

    /// The set of equal labels present in both sets, or None if the two
    /// sets do not intersect.
    pub fn intersect(&self, other: &Labels) -> Option<Labels> {
        let common: Vec<Label> = self
            .set
            .values()
            .filter(|l| other.retrieve(l.id()) == Some(*l))
            .cloned()
            .collect();

        if common.is_empty() {
            None
        } else {
            Some(Labels::new(common))
        }
    }
}

impl std::fmt::Display for Labels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, l) in self.set.values().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{l}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_is_deduplicating() {
        let mut ls = Labels::default();
        assert!(ls.add(Label::new("a")));
        assert!(!ls.add(Label::new("a")));
        assert_eq!(ls.len(), 1);
    }

    #[test]
    fn delete_and_retrieve() {
        let mut ls = Labels::new([Label::new("a"), Label::new("b")]);
        assert_eq!(ls.retrieve("a"), Some(&Label::new("a")));
        assert!(ls.delete("a"));
        assert!(!ls.delete("a"));
        assert_eq!(ls.retrieve("a"), None);
    }

    #[test]
    fn intersect() {
        let a = Labels::new([Label::new("x"), Label::new("y")]);
        let b = Labels::new([Label::new("y"), Label::new("z")]);

        let common = a.intersect(&b).unwrap();
        assert_eq!(common.labelling(), vec!["y"]);

        let disjoint = Labels::new([Label::new("q")]);
        assert!(a.intersect(&disjoint).is_none());
    }

    #[test]
    fn display_is_sorted() {
        let ls = Labels::new([Label::new("b"), Label::new("a")]);
        insta::assert_snapshot!(ls.to_string(), @"{|a|, |b|}");
    }
}
