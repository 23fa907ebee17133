use super::{Tuple, TypeField, Value};

/// A single template position: either a concrete value which must match
/// deeply, or a formal type field which matches any value of its type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateField {
    Actual(Value),
    Formal(TypeField),
}

impl From<Value> for TemplateField {
    fn from(v: Value) -> Self {
        TemplateField::Actual(v)
    }
}

impl From<TypeField> for TemplateField {
    fn from(tf: TypeField) -> Self {
        TemplateField::Formal(tf)
    }
}

/// Template is a tuple with type information, used for pattern matching
/// against tuples and other templates.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Template {
    fields: Vec<TemplateField>,
}

impl Template {
    pub fn new(fields: Vec<TemplateField>) -> Self {
        Self { fields }
    }

    /// Builds a template whose every position is a concrete value.
    pub fn of_values(values: Vec<Value>) -> Self {
        Self {
            fields: values.into_iter().map(TemplateField::Actual).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<TemplateField> {
        self.fields
    }

    pub fn get(&self, i: usize) -> Option<&TemplateField> {
        self.fields.get(i)
    }

    /// Applies `f` to every field in place, aborting on the first field
    /// for which `f` returns None. Returns true if all fields were mapped.
    pub fn apply<F>(&mut self, mut f: F) -> bool
    where
        F: FnMut(TemplateField) -> Option<TemplateField>,
    {
        for slot in self.fields.iter_mut() {
            let taken = std::mem::replace(slot, TemplateField::Actual(Value::Unit));
            match f(taken) {
                Some(mapped) => *slot = mapped,
                None => return false,
            }
        }
        true
    }

    /// Matches this template against another, and counts how specifically
    /// the two agree. Returns None if they do not match, else the pair
    /// (pno, qno): qno counts every matched position, while pno excludes
    /// positions where only one side is a formal type field. The counts
    /// order candidate templates from most to least specific.
    pub fn exact_match(&self, other: &Template) -> Option<(u32, u32)> {
        if self.len() != other.len() {
            return None;
        }
        let (mut pno, mut qno) = (0, 0);

        for (a, b) in self.fields.iter().zip(other.fields.iter()) {
            match (a, b) {
                (TemplateField::Formal(fa), TemplateField::Formal(fb)) => {
                    if fa != fb {
                        return None;
                    }
                    pno += 1;
                    qno += 1;
                }
                (TemplateField::Formal(fa), TemplateField::Actual(vb)) => {
                    if !fa.matches(vb) {
                        return None;
                    }
                    qno += 1;
                }
                (TemplateField::Actual(va), TemplateField::Formal(fb)) => {
                    if !fb.matches(va) {
                        return None;
                    }
                    qno += 1;
                }
                (TemplateField::Actual(va), TemplateField::Actual(vb)) => {
                    if va != vb {
                        return None;
                    }
                    pno += 1;
                    qno += 1;
                }
            }
        }
        Some((pno, qno))
    }

    /// Renders the template as a plain value list, carrying formal
    /// positions as type-field values. This is the shape in which
    /// template fields pass through registered functions.
    pub fn to_values(&self) -> Vec<Value> {
        self.fields
            .iter()
            .map(|field| match field {
                TemplateField::Actual(v) => v.clone(),
                TemplateField::Formal(tf) => Value::Type(tf.clone()),
            })
            .collect()
    }

    /// The inverse of [`Template::to_values`]: type-field values become
    /// formal positions, everything else is concrete.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            fields: values
                .into_iter()
                .map(|v| match v {
                    Value::Type(tf) => TemplateField::Formal(tf),
                    other => TemplateField::Actual(other),
                })
                .collect(),
        }
    }

    /// Builds the zero-valued tuple of this template: each position holds
    /// the zero value of its specified type.
    pub fn new_tuple(&self) -> Tuple {
        self.fields
            .iter()
            .map(|field| match field {
                TemplateField::Actual(v) => v.tag().zero(),
                TemplateField::Formal(tf) => tf.zero(),
            })
            .collect()
    }

    /// Builds the intrinsic tuple of this template: concrete positions
    /// keep their values, formal positions take their zero value.
    pub fn intrinsic_tuple(&self) -> Tuple {
        self.fields
            .iter()
            .map(|field| match field {
                TemplateField::Actual(v) => v.clone(),
                TemplateField::Formal(tf) => tf.zero(),
            })
            .collect()
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            match field {
                TemplateField::Actual(v) => write!(f, "{v}")?,
                TemplateField::Formal(tf) => write!(f, "*{tf}")?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{template, TypeTag};

    #[test]
    fn exact_match_counts() {
        let concrete = template![actual "a", actual 1_i64];
        let formal = template![formal TypeTag::Str, formal TypeTag::Int];
        let mixed = template![actual "a", formal TypeTag::Int];

        // Identical concrete templates: every position counts twice.
        assert_eq!(concrete.exact_match(&concrete), Some((2, 2)));
        // Formal-on-both-sides positions count twice as well.
        assert_eq!(formal.exact_match(&formal), Some((2, 2)));
        // One-sided formal positions count toward qno only.
        assert_eq!(concrete.exact_match(&formal), Some((0, 2)));
        assert_eq!(concrete.exact_match(&mixed), Some((1, 2)));

        // Mismatched values or types do not match at all.
        assert_eq!(concrete.exact_match(&template![actual "b", actual 1_i64]), None);
        assert_eq!(
            concrete.exact_match(&template![formal TypeTag::Int, formal TypeTag::Int]),
            None
        );
        assert_eq!(concrete.exact_match(&template![actual "a"]), None);
    }

    #[test]
    fn exact_match_is_monotone() {
        // Replacing a one-sided formal position by a matching concrete
        // value raises qno only together with pno.
        let base = template![formal TypeTag::Str, actual 1_i64];
        let narrowed = template![actual "a", actual 1_i64];
        let probe = template![actual "a", actual 1_i64];

        let (bp, bq) = base.exact_match(&probe).unwrap();
        let (np, nq) = narrowed.exact_match(&probe).unwrap();
        assert!(nq >= bq && np > bp);
    }

    #[test]
    fn new_tuple_zeroes_every_position() {
        let tp = template![formal TypeTag::Str, actual 7_i64, formal TypeTag::Float];
        assert_eq!(
            tp.new_tuple(),
            crate::tuple![String::new(), 0_i64, 0.0_f64],
        );
    }

    #[test]
    fn intrinsic_tuple_reads_concrete_values() {
        let tp = template![actual "a", formal TypeTag::Int];
        assert_eq!(tp.intrinsic_tuple(), crate::tuple!["a", 0_i64]);
    }

    #[test]
    fn template_matches_itself_via_tuple() {
        let t = crate::tuple!["a", 1_i64];
        let tp = Template::of_values(t.fields().to_vec());
        assert!(t.matches(&tp));
    }
}
