use super::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// TypeTag is the runtime type descriptor of a Value variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Unit,
    Bool,
    Int,
    Uint,
    Float,
    Str,
    Tuple,
    Template,
    Type,
    Label,
    Labels,
    Func,
    List,
    Map,
}

impl TypeTag {
    /// The stable name under which this descriptor is registered.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Unit => "unit",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Uint => "uint",
            TypeTag::Float => "float",
            TypeTag::Str => "str",
            TypeTag::Tuple => "tuple",
            TypeTag::Template => "template",
            TypeTag::Type => "type",
            TypeTag::Label => "label",
            TypeTag::Labels => "labels",
            TypeTag::Func => "func",
            TypeTag::List => "list",
            TypeTag::Map => "map",
        }
    }

    /// The zero value of this type.
    pub fn zero(&self) -> Value {
        match self {
            TypeTag::Unit => Value::Unit,
            TypeTag::Bool => Value::Bool(false),
            TypeTag::Int => Value::Int(0),
            TypeTag::Uint => Value::Uint(0),
            TypeTag::Float => Value::Float(0.0),
            TypeTag::Str => Value::Str(String::new()),
            TypeTag::Tuple => Value::Tuple(super::Tuple::new(Vec::new())),
            TypeTag::Template => Value::Template(super::Template::new(Vec::new())),
            TypeTag::Type => Value::Type(TypeField::of_tag(TypeTag::Unit)),
            TypeTag::Label => Value::Label(super::Label::new("")),
            TypeTag::Labels => Value::Labels(super::Labels::default()),
            TypeTag::Func => Value::Unit,
            TypeTag::List => Value::List(Vec::new()),
            TypeTag::Map => Value::Map(Default::default()),
        }
    }
}

lazy_static::lazy_static! {
    // Process-wide registry of stable type name => runtime descriptor,
    // populated write-through on first sighting during type field
    // construction.
    static ref TYPE_REGISTRY: RwLock<HashMap<String, TypeTag>> = RwLock::new(HashMap::new());
}

/// Looks up the registered descriptor for a stable type name.
pub fn lookup_type(name: &str) -> Option<TypeTag> {
    TYPE_REGISTRY.read().unwrap().get(name).copied()
}

fn register_type(name: &str, tag: TypeTag) {
    let mut reg = TYPE_REGISTRY.write().unwrap();
    reg.entry(name.to_string()).or_insert(tag);
}

// Registers the type of `value` and, descending containers, the types of
// its constituents. The depth counter strictly decrements and recursion
// stops when it reaches zero.
fn recursive_type_register(depth: u32, value: &Value) {
    register_type(value.tag().name(), value.tag());

    if depth == 0 {
        return;
    }
    match value {
        Value::List(items) => {
            for item in items {
                recursive_type_register(depth - 1, item);
            }
        }
        Value::Map(entries) => {
            for item in entries.values() {
                recursive_type_register(depth - 1, item);
            }
        }
        Value::Tuple(t) => {
            for field in t.fields() {
                recursive_type_register(depth - 1, field);
            }
        }
        Value::Template(tp) => {
            for field in tp.fields() {
                match field {
                    super::TemplateField::Actual(v) => recursive_type_register(depth - 1, v),
                    super::TemplateField::Formal(tf) => {
                        if let Some(tag) = tf.registered() {
                            register_type(tf.name(), tag);
                        }
                    }
                }
            }
        }
        _ => (),
    }
}

/// TypeField encapsulates a type: an opaque token which matches any value
/// of the named type. Equality is determined by the registered type
/// identity, never by the token text itself.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TypeField {
    #[serde(rename = "type")]
    name: String,
}

impl TypeField {
    /// Builds a type field from a witness value, registering the value's
    /// type (and the types of its constituents) on first sighting.
    pub fn of(witness: &Value) -> Self {
        recursive_type_register(super::DEPTH_BOUND, witness);
        Self {
            name: witness.tag().name().to_string(),
        }
    }

    /// Builds a type field directly from a descriptor.
    pub fn of_tag(tag: TypeTag) -> Self {
        register_type(tag.name(), tag);
        Self {
            name: tag.name().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered descriptor for this field, or None if the name was
    /// never registered (a foreign token decoded off the wire).
    pub fn registered(&self) -> Option<TypeTag> {
        lookup_type(&self.name)
    }

    /// True if `value` has the type this field encapsulates.
    pub fn matches(&self, value: &Value) -> bool {
        self.registered() == Some(value.tag())
    }

    /// The zero value of the encapsulated type, or Unit for an
    /// unregistered name.
    pub fn zero(&self) -> Value {
        self.registered().map_or(Value::Unit, |tag| tag.zero())
    }
}

impl PartialEq for TypeField {
    fn eq(&self, other: &Self) -> bool {
        match (self.registered(), other.registered()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for TypeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tuple;

    #[test]
    fn type_field_equality_is_type_identity() {
        let a = TypeField::of(&Value::Int(7));
        let b = TypeField::of_tag(TypeTag::Int);
        let c = TypeField::of_tag(TypeTag::Str);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn type_field_matches_values_of_its_type() {
        let tf = TypeField::of_tag(TypeTag::Str);
        assert!(tf.matches(&Value::Str("book".to_string())));
        assert!(!tf.matches(&Value::Int(1)));
    }

    #[test]
    fn constituent_types_register_recursively() {
        let witness = Value::List(vec![
            Value::Tuple(tuple![1.5_f64]),
            Value::Map([("k".to_string(), Value::Bool(true))].into()),
        ]);
        let _ = TypeField::of(&witness);

        for name in ["list", "tuple", "float", "map", "bool"] {
            assert!(lookup_type(name).is_some(), "{name} is registered");
        }
    }

    #[test]
    fn zero_values() {
        assert_eq!(TypeField::of_tag(TypeTag::Int).zero(), Value::Int(0));
        assert_eq!(
            TypeField::of_tag(TypeTag::Str).zero(),
            Value::Str(String::new())
        );
        let unknown = TypeField {
            name: "no-such-type".to_string(),
        };
        assert_eq!(unknown.zero(), Value::Unit);
    }
}
