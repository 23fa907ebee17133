use super::{Template, TemplateField, Value};

/// Tuple is an ordered, finite sequence of heterogeneous fields.
/// Its length and the type and value of each field are its identity.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tuple {
    fields: Vec<Value>,
}

impl Tuple {
    pub fn new(fields: Vec<Value>) -> Self {
        Self { fields }
    }

    /// The empty tuple, used as the result of operations which are
    /// denied or produce nothing.
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }

    pub fn get(&self, i: usize) -> Option<&Value> {
        self.fields.get(i)
    }

    /// Sets the i'th field. Returns false if the index is out of range.
    pub fn set(&mut self, i: usize, value: Value) -> bool {
        match self.fields.get_mut(i) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Applies `f` to every field in place, aborting on the first field
    /// for which `f` returns None. Returns true if all fields were mapped.
    pub fn apply<F>(&mut self, mut f: F) -> bool
    where
        F: FnMut(Value) -> Option<Value>,
    {
        for slot in self.fields.iter_mut() {
            match f(std::mem::replace(slot, Value::Unit)) {
                Some(mapped) => *slot = mapped,
                None => return false,
            }
        }
        true
    }

    /// True if the tuple's first field is a label set.
    pub fn is_labelled(&self) -> bool {
        matches!(self.fields.first(), Some(Value::Labels(_)))
    }

    /// Pattern-matches this tuple against a template. The match holds iff
    /// lengths are equal and, at every position, the template field is a
    /// type field whose type equals the field's runtime type, or both
    /// fields are functions with equal name and printed signature, or the
    /// values are deeply equal.
    pub fn matches(&self, template: &Template) -> bool {
        if self.len() != template.len() {
            return false;
        }
        self.fields
            .iter()
            .zip(template.fields())
            .all(|(field, tf)| match tf {
                TemplateField::Formal(formal) => formal.matches(field),
                TemplateField::Actual(actual) => field == actual,
            })
    }
}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, ")")
    }
}

impl FromIterator<Value> for Tuple {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
