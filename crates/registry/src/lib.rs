//! Code mobility for function-valued fields. Tuples move between
//! processes but functions cannot be serialized, so each registered
//! function is addressed by a portable namespace string, and values are
//! rewritten between the two representations at the wire boundary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tuple::{FuncRef, SpaceFn};

mod walk;

/// The runtime identity advertised in external namespaces.
pub const RUNTIME_ID: &str = "rust";
/// The runtime version advertised in external namespaces.
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Namespace is the portable name of a function: either the internal
/// `<name>:<signature>` form, or the external
/// `func://<runtime>:<version>/<name>:<signature>` form which crosses
/// the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The internal namespace of a function reference.
    pub fn internal(fr: &FuncRef) -> Self {
        Self(format!(
            "{}:{}",
            fr.name.replace(' ', ""),
            fr.signature.replace(' ', "")
        ))
    }

    /// The external namespace of a function reference.
    pub fn external(fr: &FuncRef) -> Self {
        Self(format!(
            "func://{}:{}/{}:{}",
            RUNTIME_ID,
            RUNTIME_VERSION,
            fr.name.replace(' ', ""),
            fr.signature.replace(' ', "")
        ))
    }

    /// True if this namespace is in the external form.
    pub fn is_external(&self) -> bool {
        self.0.starts_with("func://")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// A stable reference to an interned namespace. References never move or
// expire, which keeps the dictionaries consistent across deletes.
type NsRef = u64;

/// NamespaceDictionary interns namespaces: identifier => stable reference
/// and stable reference => identifier.
#[derive(Default)]
struct NamespaceDictionary {
    name_lookup: RwLock<HashMap<Namespace, NsRef>>,
    ref_lookup: RwLock<HashMap<NsRef, Namespace>>,
    next_ref: AtomicU64,
}

impl NamespaceDictionary {
    // Interns `ns`, returning (reference, newly-added).
    fn add(&self, ns: &Namespace) -> (NsRef, bool) {
        if let Some(&r) = self.name_lookup.read().unwrap().get(ns) {
            return (r, false);
        }
        let mut names = self.name_lookup.write().unwrap();
        // Double-checked: another writer may have interned it meanwhile.
        if let Some(&r) = names.get(ns) {
            return (r, false);
        }
        let r = self.next_ref.fetch_add(1, Ordering::Relaxed);
        names.insert(ns.clone(), r);
        self.ref_lookup.write().unwrap().insert(r, ns.clone());
        (r, true)
    }

    fn remove(&self, ns: &Namespace) -> bool {
        let removed = self.name_lookup.write().unwrap().remove(ns);
        if let Some(r) = removed {
            self.ref_lookup.write().unwrap().remove(&r);
        }
        removed.is_some()
    }

    fn reference(&self, ns: &Namespace) -> Option<NsRef> {
        self.name_lookup.read().unwrap().get(ns).copied()
    }
}

/// FunctionBinding binds a namespace reference to a callable function.
#[derive(Default)]
struct FunctionBinding {
    binding: RwLock<HashMap<NsRef, (FuncRef, SpaceFn)>>,
}

impl FunctionBinding {
    fn add(&self, r: NsRef, fr: FuncRef, f: SpaceFn) -> bool {
        let mut binding = self.binding.write().unwrap();
        match binding.entry(r) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert((fr, f));
                true
            }
        }
    }

    fn remove(&self, r: NsRef) -> bool {
        self.binding.write().unwrap().remove(&r).is_some()
    }

    fn function(&self, r: NsRef) -> Option<(FuncRef, SpaceFn)> {
        self.binding.read().unwrap().get(&r).cloned()
    }
}

/// LanguageBinding maintains the mapping between a function's internal
/// and external namespaces.
#[derive(Default)]
struct LanguageBinding {
    internal_to_external: RwLock<HashMap<NsRef, NsRef>>,
    external_to_internal: RwLock<HashMap<NsRef, NsRef>>,
}

impl LanguageBinding {
    fn add(&self, internal: NsRef, external: NsRef) -> bool {
        let mut ite = self.internal_to_external.write().unwrap();
        let mut eti = self.external_to_internal.write().unwrap();
        if ite.contains_key(&internal) || eti.contains_key(&external) {
            return false;
        }
        ite.insert(internal, external);
        eti.insert(external, internal);
        true
    }

    fn remove_internal(&self, internal: NsRef) -> bool {
        let removed = self.internal_to_external.write().unwrap().remove(&internal);
        if let Some(external) = removed {
            self.external_to_internal.write().unwrap().remove(&external);
        }
        removed.is_some()
    }

    fn external(&self, internal: NsRef) -> Option<NsRef> {
        self.internal_to_external.read().unwrap().get(&internal).copied()
    }

    fn internal(&self, external: NsRef) -> Option<NsRef> {
        self.external_to_internal.read().unwrap().get(&external).copied()
    }
}

/// Registry converts between opaque local function references and the
/// portable namespace strings which cross process boundaries. All maps
/// are safe for concurrent readers and writers, and every writer is
/// idempotent.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    name_dict: NamespaceDictionary,
    func_bind: FunctionBinding,
    lang_bind: LanguageBinding,
}

lazy_static::lazy_static! {
    static ref GLOBAL: Registry = Registry::default();
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry shared by spaces which are not given
    /// their own.
    pub fn global() -> Registry {
        GLOBAL.clone()
    }

    /// Registers `f` under `name`. Registration is idempotent: true is
    /// returned only the first time.
    pub fn register(&self, name: &str, f: SpaceFn) -> bool {
        let fr = FuncRef::new(name, f);
        let internal = Namespace::internal(&fr);
        let external = Namespace::external(&fr);

        let (internal_ref, added_internal) = self.inner.name_dict.add(&internal);
        let (external_ref, added_external) = self.inner.name_dict.add(&external);

        if !(added_internal && added_external) {
            return false;
        }
        self.inner.func_bind.add(internal_ref, fr, f)
            && self.inner.lang_bind.add(internal_ref, external_ref)
    }

    /// Removes the registration of `name`. Returns false if it was not
    /// registered.
    pub fn unregister(&self, name: &str, f: SpaceFn) -> bool {
        let fr = FuncRef::new(name, f);
        let internal = Namespace::internal(&fr);
        let external = Namespace::external(&fr);

        let Some(internal_ref) = self.inner.name_dict.reference(&internal) else {
            return false;
        };
        self.inner.name_dict.remove(&internal);
        self.inner.name_dict.remove(&external);
        self.inner.func_bind.remove(internal_ref);
        self.inner.lang_bind.remove_internal(internal_ref);
        true
    }

    /// True if `name` is registered.
    pub fn check(&self, name: &str, f: SpaceFn) -> bool {
        let fr = FuncRef::new(name, f);
        self.inner.name_dict.reference(&Namespace::internal(&fr)).is_some()
            && self.inner.name_dict.reference(&Namespace::external(&fr)).is_some()
    }

    /// A field-embeddable reference to the function registered as `name`,
    /// registering it first. The reference matches and digests by the
    /// function's name and printed signature.
    pub fn func_ref(&self, name: &str, f: SpaceFn) -> FuncRef {
        self.register(name, f);
        FuncRef::new(name, f)
    }

    /// The external namespace of `fr`'s function. Returns None for a
    /// reference that was never registered through this registry; use
    /// [`Registry::func_ref`] to mint references which are always
    /// registered first.
    pub fn encode(&self, fr: &FuncRef) -> Option<Namespace> {
        let internal_ref = self.inner.name_dict.reference(&Namespace::internal(fr))?;
        let external_ref = self.inner.lang_bind.external(internal_ref)?;
        self.inner
            .ref_value(external_ref)
    }

    /// The local function bound to an external namespace, or None.
    pub fn decode(&self, external: &Namespace) -> Option<(FuncRef, SpaceFn)> {
        let external_ref = self.inner.name_dict.reference(external)?;
        let internal_ref = self.inner.lang_bind.internal(external_ref)?;
        self.inner.func_bind.function(internal_ref)
    }

    /// The callable function behind a field-embedded reference, or None
    /// if it is not registered locally.
    pub fn resolve(&self, fr: &FuncRef) -> Option<SpaceFn> {
        let internal_ref = self.inner.name_dict.reference(&Namespace::internal(fr))?;
        self.inner.func_bind.function(internal_ref).map(|(_, f)| f)
    }
}

impl Inner {
    fn ref_value(&self, r: NsRef) -> Option<Namespace> {
        self.name_dict.ref_lookup.read().unwrap().get(&r).cloned()
    }
}

pub use walk::{decode_template, decode_tuple, decode_value, encode_template, encode_tuple, encode_value};

#[cfg(test)]
mod test {
    use super::*;
    use tuple::Value;

    fn sum(args: &[Value]) -> Value {
        let mut acc = 0;
        for a in args {
            if let Value::Int(i) = a {
                acc += i;
            }
        }
        Value::Int(acc)
    }

    #[test]
    fn register_is_idempotent() {
        let reg = Registry::new();
        assert!(reg.register("sum", sum));
        assert!(!reg.register("sum", sum));
        assert!(reg.check("sum", sum));
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let reg = Registry::new();
        let fr = reg.func_ref("sum", sum);

        let external = reg.encode(&fr).unwrap();
        assert!(external.is_external());
        assert!(external.as_str().contains("/sum:"));

        let (decoded, f) = reg.decode(&external).unwrap();
        assert_eq!(decoded, fr);
        assert_eq!(f(&[Value::Int(2), Value::Int(3)]), Value::Int(5));
    }

    #[test]
    fn decode_of_unknown_namespace_is_none() {
        let reg = Registry::new();
        assert!(reg
            .decode(&Namespace::new("func://rust:0.0.0/nope:(...Value)->(Value)"))
            .is_none());
    }

    #[test]
    fn unregister_forgets_the_binding() {
        let reg = Registry::new();
        let fr = reg.func_ref("sum", sum);
        assert!(reg.unregister("sum", sum));
        assert!(!reg.unregister("sum", sum));
        assert!(reg.encode(&fr).is_none());
        assert!(reg.resolve(&fr).is_none());
    }

    #[test]
    fn resolve_finds_the_callable() {
        let reg = Registry::new();
        let fr = reg.func_ref("sum", sum);
        let f = reg.resolve(&fr).unwrap();
        assert_eq!(f(&[Value::Int(1), Value::Int(1)]), Value::Int(2));
    }
}
