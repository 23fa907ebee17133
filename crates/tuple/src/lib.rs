//! The value model of the tuple space: tuples, templates, type fields,
//! labels, and the structural signature digests built over them.

use std::collections::BTreeMap;

/// Value is the universal field type of the tuple space.
/// Every field of a tuple or template is one of these variants, and all
/// higher-level polymorphism reduces to this sum. The serde representation
/// is externally tagged, which makes the wire encoding self-describing:
/// each encoded value carries its own type tag.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// The nil value. Nil fields match nil template fields.
    Unit,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Tuple(Tuple),
    Template(Template),
    Type(TypeField),
    Label(Label),
    Labels(Labels),
    Func(FuncRef),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the runtime type tag of this value.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Unit => TypeTag::Unit,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Uint(_) => TypeTag::Uint,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
            Value::Tuple(_) => TypeTag::Tuple,
            Value::Template(_) => TypeTag::Template,
            Value::Type(_) => TypeTag::Type,
            Value::Label(_) => TypeTag::Label,
            Value::Labels(_) => TypeTag::Labels,
            Value::Func(_) => TypeTag::Func,
            Value::List(_) => TypeTag::List,
            Value::Map(_) => TypeTag::Map,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&FuncRef> {
        match self {
            Value::Func(f) => Some(f),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Unit => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Tuple(t) => write!(f, "{t}"),
            Value::Template(tp) => write!(f, "{tp}"),
            Value::Type(tf) => write!(f, "{tf}"),
            Value::Label(l) => write!(f, "{l}"),
            Value::Labels(ls) => write!(f, "{ls}"),
            Value::Func(fr) => write!(f, "{} {}", fr.name, fr.signature),
            Value::List(vs) => {
                write!(f, "[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}
impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
impl From<Tuple> for Value {
    fn from(t: Tuple) -> Self {
        Value::Tuple(t)
    }
}
impl From<Template> for Value {
    fn from(tp: Template) -> Self {
        Value::Template(tp)
    }
}
impl From<TypeField> for Value {
    fn from(tf: TypeField) -> Self {
        Value::Type(tf)
    }
}
impl From<Label> for Value {
    fn from(l: Label) -> Self {
        Value::Label(l)
    }
}
impl From<Labels> for Value {
    fn from(ls: Labels) -> Self {
        Value::Labels(ls)
    }
}
impl From<FuncRef> for Value {
    fn from(fr: FuncRef) -> Self {
        Value::Func(fr)
    }
}

/// The Rust type of every function which may appear as a tuple or
/// template field. Arguments and result range over the universal Value
/// sum; a Unit result is the nil result.
pub type SpaceFn = fn(&[Value]) -> Value;

/// FuncRef is the in-process representation of a function-valued field:
/// the function's name, its printed signature, and its code address.
///
/// Two FuncRefs are equal when their names and printed signatures are
/// equal. The code address does not participate in field matching; it
/// distinguishes functions within signature digests and action equality.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FuncRef {
    pub name: String,
    pub signature: String,
    pub addr: u64,
}

/// The printed signature shared by all registrable functions.
pub const FN_SIGNATURE: &str = "(...Value) -> (Value)";

impl FuncRef {
    pub fn new(name: &str, f: SpaceFn) -> Self {
        Self {
            name: name.to_string(),
            signature: FN_SIGNATURE.to_string(),
            addr: f as usize as u64,
        }
    }
}

impl PartialEq for FuncRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.signature == other.signature
    }
}

mod tuple;
pub use crate::tuple::Tuple;

mod template;
pub use template::{Template, TemplateField};

mod typefield;
pub use typefield::{lookup_type, TypeField, TypeTag};

mod label;
pub use label::{Label, Labels};

mod labelled;
pub use labelled::LabelledTuple;

mod signature;
pub use signature::{signature, template_type_signature, type_signature, Signature, DEPTH_BOUND};

/// Builds a Tuple from a field list: `tuple![1, "a", 2.0]`.
#[macro_export]
macro_rules! tuple {
    ($($field:expr),* $(,)?) => {
        $crate::Tuple::new(vec![$($crate::Value::from($field)),*])
    };
}

/// Builds a Template from a field list, where each field is either a
/// concrete value or a formal type field:
/// `template![actual 1, formal TypeTag::Str]`.
#[macro_export]
macro_rules! template {
    (@field actual $v:expr) => {
        $crate::TemplateField::Actual($crate::Value::from($v))
    };
    (@field formal $t:expr) => {
        $crate::TemplateField::Formal($crate::TypeField::of_tag($t))
    };
    ($($kind:ident $field:expr),* $(,)?) => {
        $crate::Template::new(vec![$($crate::template!(@field $kind $field)),*])
    };
}
