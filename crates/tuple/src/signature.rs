use super::{TemplateField, Value};
use sha2::{Digest, Sha256};

/// A stable structural digest, rendered as lowercase hex.
pub type Signature = String;

/// Recursion bound passed into signature and type-registration walks.
/// Generous, but finite: cyclic or pathologically deep values truncate to
/// a structural fingerprint once the bound is exhausted.
pub const DEPTH_BOUND: u32 = 65_536;

/// Digests a value's shape and content. The digest is deterministic under
/// unordered iteration: map entries and tuple fields are sorted by their
/// derived sub-digest before being mixed. Function values are
/// distinguished by code address and printed signature.
pub fn signature(depth: u32, value: &Value) -> Signature {
    let mut halg = Sha256::new();
    mix_value(&mut halg, depth, value, false);
    hex::encode(halg.finalize())
}

/// Digests a value's type shape only: two values of identical shape but
/// different content share a type signature. Formal type fields digest as
/// their encapsulated type.
pub fn type_signature(depth: u32, value: &Value) -> Signature {
    let mut halg = Sha256::new();
    mix_value(&mut halg, depth, value, true);
    hex::encode(halg.finalize())
}

/// Digests a template's parameter types. A formal type field digests
/// exactly as a concrete value of its type would, so the concrete and
/// formal renderings of the same parameter list share one signature.
/// An aggregate call can therefore locate policies registered over
/// either rendering.
pub fn template_type_signature(depth: u32, template: &super::Template) -> Signature {
    let mut halg = Sha256::new();
    halg.update(b"template");

    for field in template.fields() {
        let sub = match field {
            TemplateField::Actual(v) => type_signature(depth.saturating_sub(1), v),
            TemplateField::Formal(tf) => type_signature(depth.saturating_sub(1), &tf.zero()),
        };
        halg.update(sub.as_bytes());
    }
    hex::encode(halg.finalize())
}

fn mix_value(halg: &mut Sha256, depth: u32, value: &Value, types_only: bool) {
    halg.update(value.tag().name().as_bytes());

    // The bound is exhausted: truncate to a structural fingerprint.
    if depth == 0 {
        halg.update(value.to_string().as_bytes());
        return;
    }

    match value {
        Value::Func(fr) => {
            halg.update(fr.addr.to_le_bytes());
            halg.update(fr.name.as_bytes());
            halg.update(fr.signature.as_bytes());
        }
        Value::Type(tf) => {
            halg.update(tf.name().as_bytes());
        }
        Value::List(items) => {
            for item in items {
                halg.update(item.tag().name().as_bytes());
                let sub = sub_digest(depth - 1, item, types_only);
                halg.update(sub.as_bytes());
            }
        }
        Value::Map(entries) => {
            let mut subs: Vec<String> = entries
                .iter()
                .map(|(key, val)| {
                    let ks = sub_digest(depth - 1, &Value::Str(key.clone()), types_only);
                    let vs = sub_digest(depth - 1, val, types_only);
                    format!("{ks} {vs}")
                })
                .collect();
            subs.sort();
            for sub in subs {
                halg.update(sub.as_bytes());
            }
        }
        Value::Tuple(t) => {
            let mut subs: Vec<String> = t
                .fields()
                .iter()
                .map(|field| {
                    let vs = sub_digest(depth - 1, field, types_only);
                    format!("{vs} {}", field.tag().name())
                })
                .collect();
            subs.sort();
            for sub in subs {
                halg.update(sub.as_bytes());
            }
        }
        Value::Template(tp) => {
            halg.update(template_type_signature(depth - 1, tp).as_bytes());
            if !types_only {
                for field in tp.fields() {
                    if let TemplateField::Actual(v) = field {
                        halg.update(sub_digest(depth - 1, v, false).as_bytes());
                    }
                }
            }
        }
        Value::Labels(ls) if !types_only => {
            // Identifiers iterate in sorted order already.
            for id in ls.labelling() {
                halg.update(id.as_bytes());
            }
        }
        other => {
            if !types_only {
                halg.update(other.to_string().as_bytes());
            }
        }
    }
}

fn sub_digest(depth: u32, value: &Value, types_only: bool) -> Signature {
    if types_only {
        type_signature(depth, value)
    } else {
        signature(depth, value)
    }
}
