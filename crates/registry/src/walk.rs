use super::{Namespace, Registry};
use tuple::{Template, TemplateField, Tuple, Value};

/// Replaces every function-typed field reachable from `value` with its
/// external namespace string, so the value can cross the wire.
pub fn encode_value(reg: &Registry, value: &mut Value) {
    match value {
        Value::Func(fr) => {
            if let Some(external) = reg.encode(fr) {
                *value = Value::Str(external.as_str().to_string());
            } else {
                // An unregistered function cannot be made portable.
                tracing::debug!(name = %fr.name, "function is not registered; leaving field in place");
            }
        }
        Value::Tuple(t) => encode_tuple(reg, t),
        Value::Template(tp) => encode_template(reg, tp),
        Value::List(items) => {
            for item in items {
                encode_value(reg, item);
            }
        }
        Value::Map(entries) => {
            for item in entries.values_mut() {
                encode_value(reg, item);
            }
        }
        _ => (),
    }
}

/// Replaces every string field reachable from `value` which parses as a
/// registered external namespace with the bound local function. Strings
/// that merely look like namespaces are left untouched.
pub fn decode_value(reg: &Registry, value: &mut Value) {
    match value {
        Value::Str(s) => {
            let ns = Namespace::new(s.as_str());
            if ns.is_external() {
                if let Some((fr, _)) = reg.decode(&ns) {
                    *value = Value::Func(fr);
                }
            }
        }
        Value::Tuple(t) => decode_tuple(reg, t),
        Value::Template(tp) => decode_template(reg, tp),
        Value::List(items) => {
            for item in items {
                decode_value(reg, item);
            }
        }
        Value::Map(entries) => {
            for item in entries.values_mut() {
                decode_value(reg, item);
            }
        }
        _ => (),
    }
}

pub fn encode_tuple(reg: &Registry, t: &mut Tuple) {
    t.apply(|mut v| {
        encode_value(reg, &mut v);
        Some(v)
    });
}

pub fn decode_tuple(reg: &Registry, t: &mut Tuple) {
    t.apply(|mut v| {
        decode_value(reg, &mut v);
        Some(v)
    });
}

pub fn encode_template(reg: &Registry, tp: &mut Template) {
    tp.apply(|field| match field {
        TemplateField::Actual(mut v) => {
            encode_value(reg, &mut v);
            Some(TemplateField::Actual(v))
        }
        formal => Some(formal),
    });
}

pub fn decode_template(reg: &Registry, tp: &mut Template) {
    tp.apply(|field| match field {
        TemplateField::Actual(mut v) => {
            decode_value(reg, &mut v);
            Some(TemplateField::Actual(v))
        }
        formal => Some(formal),
    });
}

#[cfg(test)]
mod test {
    use super::*;

    fn first(args: &[Value]) -> Value {
        args.first().cloned().unwrap_or(Value::Unit)
    }

    #[test]
    fn functions_round_trip_through_namespace_strings() {
        let reg = Registry::new();
        let fr = reg.func_ref("first", first);

        let mut t = Tuple::new(vec![Value::Func(fr.clone()), Value::Int(1)]);
        encode_tuple(&reg, &mut t);

        let Some(Value::Str(ns)) = t.get(0).cloned() else {
            panic!("function field was not encoded: {t}");
        };
        assert!(ns.starts_with("func://"));

        decode_tuple(&reg, &mut t);
        assert_eq!(t.get(0), Some(&Value::Func(fr)));
        assert_eq!(t.get(1), Some(&Value::Int(1)));
    }

    #[test]
    fn lookalike_strings_pass_through() {
        let reg = Registry::new();
        let mut t = Tuple::new(vec![Value::from("func://rust:0.0.0/unknown:(x)->(y)")]);
        decode_tuple(&reg, &mut t);
        assert_eq!(
            t.get(0),
            Some(&Value::from("func://rust:0.0.0/unknown:(x)->(y)"))
        );
    }

    #[test]
    fn nested_containers_are_walked() {
        let reg = Registry::new();
        let fr = reg.func_ref("first", first);

        let mut v = Value::List(vec![Value::Tuple(Tuple::new(vec![Value::Func(
            fr.clone(),
        )]))]);
        encode_value(&reg, &mut v);

        let Value::List(items) = &v else { unreachable!() };
        let Value::Tuple(inner) = &items[0] else {
            panic!("inner tuple lost: {v}")
        };
        assert!(matches!(inner.get(0), Some(Value::Str(_))));

        decode_value(&reg, &mut v);
        let Value::List(items) = &v else { unreachable!() };
        let Value::Tuple(inner) = &items[0] else { unreachable!() };
        assert_eq!(inner.get(0), Some(&Value::Func(fr)));
    }
}
