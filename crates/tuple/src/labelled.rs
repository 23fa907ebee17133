use super::{Labels, Template, Tuple, Value};

/// LabelledTuple is a tuple whose first field is a label set and whose
/// remaining fields form the payload. The payload is matched as an
/// ordinary tuple; the label set participates only in policy checks.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LabelledTuple(Tuple);

impl LabelledTuple {
    pub fn new(labels: Labels, payload: Vec<Value>) -> Self {
        let mut fields = Vec::with_capacity(payload.len() + 1);
        fields.push(Value::Labels(labels));
        fields.extend(payload);
        Self(Tuple::new(fields))
    }

    /// Reinterprets a tuple whose first field is a label set.
    /// Returns None otherwise.
    pub fn from_tuple(t: Tuple) -> Option<Self> {
        if t.is_labelled() {
            Some(Self(t))
        } else {
            None
        }
    }

    pub fn labels(&self) -> &Labels {
        match self.0.get(0) {
            Some(Value::Labels(ls)) => ls,
            _ => unreachable!("first field is a label set by construction"),
        }
    }

    /// The number of payload fields.
    pub fn len(&self) -> usize {
        self.0.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The payload fields, without the label set.
    pub fn fields(&self) -> &[Value] {
        &self.0.fields()[1..]
    }

    pub fn get(&self, i: usize) -> Option<&Value> {
        self.0.get(i + 1)
    }

    pub fn set(&mut self, i: usize, value: Value) -> bool {
        self.0.set(i + 1, value)
    }

    /// The payload as a standalone tuple.
    pub fn tuple(&self) -> Tuple {
        Tuple::new(self.fields().to_vec())
    }

    /// Applies `f` to every payload field in place, leaving the label set
    /// untouched. Aborts on the first None.
    pub fn apply<F>(&mut self, mut f: F) -> bool
    where
        F: FnMut(Value) -> Option<Value>,
    {
        let mut skipped_labels = false;
        self.0.apply(|v| {
            if !skipped_labels {
                skipped_labels = true;
                Some(v)
            } else {
                f(v)
            }
        })
    }

    /// Intersects this tuple's labels against `other`, returning the
    /// common labels if any.
    pub fn match_labels(&self, other: &Labels) -> Option<Labels> {
        self.labels().intersect(other)
    }

    /// Pattern-matches the payload against a template.
    pub fn match_template(&self, template: &Template) -> bool {
        self.tuple().matches(template)
    }
}

impl From<LabelledTuple> for Tuple {
    fn from(lt: LabelledTuple) -> Tuple {
        lt.0
    }
}

impl std::fmt::Display for LabelledTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} : ", self.labels())?;
        for (i, field) in self.fields().iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{template, Label, TypeTag};

    fn fixture() -> LabelledTuple {
        LabelledTuple::new(
            Labels::new([Label::new("L")]),
            vec![Value::from("a"), Value::from(3_i64)],
        )
    }

    #[test]
    fn payload_accessors_skip_the_label_set() {
        let mut lt = fixture();
        assert_eq!(lt.len(), 2);
        assert_eq!(lt.get(0), Some(&Value::from("a")));
        assert!(lt.set(1, Value::from(4_i64)));
        assert_eq!(lt.get(1), Some(&Value::from(4_i64)));
        assert_eq!(lt.labels().labelling(), vec!["L"]);
    }

    #[test]
    fn payload_matches_as_ordinary_tuple() {
        let lt = fixture();
        assert!(lt.match_template(&template![formal TypeTag::Str, formal TypeTag::Int]));
        assert!(!lt.match_template(&template![formal TypeTag::Str]));
    }

    #[test]
    fn match_labels_intersects() {
        let lt = fixture();
        assert!(lt.match_labels(&Labels::new([Label::new("L")])).is_some());
        assert!(lt.match_labels(&Labels::new([Label::new("M")])).is_none());
    }

    #[test]
    fn from_tuple_requires_a_label_set() {
        let plain = crate::tuple!["a", 1_i64];
        assert!(LabelledTuple::from_tuple(plain).is_none());

        let t: Tuple = fixture().into();
        assert!(LabelledTuple::from_tuple(t).is_some());
    }
}
