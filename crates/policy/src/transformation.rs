use tuple::{FuncRef, SpaceFn, Value};

/// TransformationError reports a transformation whose function could not
/// be applied.
#[derive(Debug, thiserror::Error)]
#[error("transformation {name:?} could not be applied")]
pub struct TransformationError {
    name: String,
}

/// Transformation is a function together with bound parameters, applied
/// at one position of the aggregation pipeline. The empty transformation
/// passes its free parameters through unchanged.
#[derive(Debug, Clone, Default)]
pub struct Transformation {
    func: Option<(FuncRef, SpaceFn)>,
    params: Vec<Value>,
}

impl Transformation {
    pub fn new(name: &str, f: SpaceFn, params: Vec<Value>) -> Self {
        Self {
            func: Some((FuncRef::new(name, f), f)),
            params,
        }
    }

    /// The pass-through transformation.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.func.is_none()
    }

    pub fn func(&self) -> Option<&FuncRef> {
        self.func.as_ref().map(|(fr, _)| fr)
    }

    pub fn parameters(&self) -> &[Value] {
        &self.params
    }

    /// Partially applies the bound parameters, then invokes the function
    /// over them followed by `free`. The empty transformation returns the
    /// free parameters as a list, unchanged.
    pub fn apply(&self, free: &[Value]) -> Result<Value, TransformationError> {
        let Some((fr, f)) = &self.func else {
            return Ok(Value::List(free.to_vec()));
        };

        let mut args = Vec::with_capacity(self.params.len() + free.len());
        args.extend_from_slice(&self.params);
        args.extend_from_slice(free);

        match f(&args) {
            Value::Unit => Err(TransformationError {
                name: fr.name.clone(),
            }),
            result => Ok(result),
        }
    }
}

/// Transformations is the triple applied at the template, match and
/// result stages of the aggregation pipeline. Exactly three positions
/// exist; a missing position is the empty transformation.
#[derive(Debug, Clone, Default)]
pub struct Transformations {
    template: Transformation,
    matched: Transformation,
    result: Transformation,
}

impl Transformations {
    pub fn new(
        template: Option<Transformation>,
        matched: Option<Transformation>,
        result: Option<Transformation>,
    ) -> Self {
        Self {
            template: template.unwrap_or_default(),
            matched: matched.unwrap_or_default(),
            result: result.unwrap_or_default(),
        }
    }

    /// The transformation applied to template entities.
    pub fn template(&self) -> &Transformation {
        &self.template
    }

    /// The transformation applied to matched entities.
    pub fn matched(&self) -> &Transformation {
        &self.matched
    }

    /// The transformation applied to result entities.
    pub fn result(&self) -> &Transformation {
        &self.result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn append_marker(args: &[Value]) -> Value {
        let mut out = args.to_vec();
        out.push(Value::from("seen"));
        Value::List(out)
    }

    #[test]
    fn apply_prepends_bound_parameters() {
        let tr = Transformation::new("append_marker", append_marker, vec![Value::Int(1)]);
        let out = tr.apply(&[Value::Int(2)]).unwrap();
        assert_eq!(
            out,
            Value::List(vec![Value::Int(1), Value::Int(2), Value::from("seen")])
        );
    }

    #[test]
    fn empty_transformation_passes_through() {
        let tr = Transformation::empty();
        assert!(tr.is_empty());
        assert_eq!(
            tr.apply(&[Value::Int(7)]).unwrap(),
            Value::List(vec![Value::Int(7)])
        );
    }

    #[test]
    fn nil_result_is_an_error() {
        fn nil(_: &[Value]) -> Value {
            Value::Unit
        }
        let tr = Transformation::new("nil", nil, vec![]);
        assert!(tr.apply(&[]).is_err());
    }

    #[test]
    fn missing_slots_default_to_empty() {
        let trs = Transformations::new(
            Some(Transformation::new("append_marker", append_marker, vec![])),
            None,
            None,
        );
        assert!(!trs.template().is_empty());
        assert!(trs.matched().is_empty());
        assert!(trs.result().is_empty());
    }
}
