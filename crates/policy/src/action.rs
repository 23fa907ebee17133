use tuple::{
    signature, template_type_signature, FuncRef, Signature, Template, TemplateField, Value,
    DEPTH_BOUND,
};

/// ActionSignature caches the digests by which actions are indexed and
/// compared: the operator name, the operator's function, and the *types*
/// of the parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionSignature {
    pub oper: Signature,
    pub func: Signature,
    pub params: Signature,
}

/// Action names an operation over the space: an operator name, the
/// function it applies, and the parameter list the operation was called
/// with. Actions key aggregation policies.
#[derive(Debug, Clone)]
pub struct Action {
    oper: String,
    func: FuncRef,
    params: Vec<TemplateField>,
    sign: ActionSignature,
}

impl Action {
    pub fn new(oper: &str, func: FuncRef, params: Vec<TemplateField>) -> Self {
        let sign = ActionSignature {
            oper: signature(1, &Value::Str(oper.to_string())),
            func: signature(1, &Value::Func(func.clone())),
            params: template_type_signature(DEPTH_BOUND, &Template::new(params.clone())),
        };
        Self {
            oper: oper.to_string(),
            func,
            params,
            sign,
        }
    }

    pub fn operator(&self) -> &str {
        &self.oper
    }

    pub fn func(&self) -> &FuncRef {
        &self.func
    }

    pub fn parameters(&self) -> &[TemplateField] {
        &self.params
    }

    /// The parameter list rendered as a template, which is how actions
    /// are compared for specificity.
    pub fn template(&self) -> Template {
        Template::new(self.params.clone())
    }

    pub fn signature(&self) -> &ActionSignature {
        &self.sign
    }
}

impl PartialEq for Action {
    /// Actions are equal when their operator names, operator and function
    /// signatures, and function code pointers agree, and their parameter
    /// lists match under template equality.
    fn eq(&self, other: &Self) -> bool {
        if self.oper != other.oper
            || self.sign.oper != other.sign.oper
            || self.sign.func != other.sign.func
            || self.func.addr != other.func.addr
            || self.params.len() != other.params.len()
        {
            return false;
        }
        self.sign.params == other.sign.params || self.template() == other.template()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.oper, self.template())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tuple::{template, TypeTag};

    fn sum(_: &[Value]) -> Value {
        Value::Int(0)
    }
    fn min(_: &[Value]) -> Value {
        Value::Int(0)
    }

    fn params() -> Vec<TemplateField> {
        template![formal TypeTag::Str, formal TypeTag::Int].into_fields()
    }

    #[test]
    fn equal_actions() {
        let a = Action::new("get_agg", FuncRef::new("sum", sum), params());
        let b = Action::new("get_agg", FuncRef::new("sum", sum), params());
        assert_eq!(a, b);
    }

    #[test]
    fn unequal_operators_functions_and_parameters() {
        let a = Action::new("get_agg", FuncRef::new("sum", sum), params());

        assert_ne!(
            a,
            Action::new("query_agg", FuncRef::new("sum", sum), params())
        );
        assert_ne!(a, Action::new("get_agg", FuncRef::new("min", min), params()));
        assert_ne!(
            a,
            Action::new(
                "get_agg",
                FuncRef::new("sum", sum),
                template![formal TypeTag::Str].into_fields()
            )
        );
    }

    #[test]
    fn parameter_types_share_a_signature_across_renderings() {
        let formal = Action::new("get_agg", FuncRef::new("sum", sum), params());
        let concrete = Action::new(
            "get_agg",
            FuncRef::new("sum", sum),
            template![actual "a", actual 1_i64].into_fields(),
        );
        assert_eq!(formal.signature().params, concrete.signature().params);
    }
}
