use crate::{Error, TupleSpace};
use policy::{Action, Aggregation, Composable, Transformation};
use proto::Operation;
use tuple::{FuncRef, LabelledTuple, Labels, SpaceFn, Template, TemplateField, Tuple, Value};

/// Runs an aggregate operation (put-agg, get-agg or query-agg) whose
/// template carries the fold function in its first field:
/// locate a policy, transform the template, match, transform the
/// matches, fold, transform the result, and emit or re-insert.
pub(crate) async fn aggregate_op(
    space: &TupleSpace,
    op: Operation,
    template: Template,
) -> Result<Tuple, Error> {
    let mut fields = template.into_fields();
    if fields.is_empty() {
        return Err(Error::FoldMissing);
    }
    let TemplateField::Actual(Value::Func(fold_ref)) = fields.remove(0) else {
        return Err(Error::FoldMissing);
    };
    let fold = space
        .registry()
        .resolve(&fold_ref)
        .ok_or_else(|| Error::FoldUnresolved(fold_ref.name.clone()))?;

    // Locate the policy governing this action, if the space carries a
    // composable policy at all.
    let cp = space.policy();
    let ap = cp.and_then(|cp| {
        let action = Action::new(op.as_str(), fold_ref.clone(), fields.clone());
        cp.find(&action).and_then(|label| cp.retrieve(&label))
    });

    // A policy is attached but no rule permits this action: the
    // operation is denied before anything is matched or consumed.
    if cp.is_some() && ap.is_none() {
        return Ok(Tuple::empty());
    }

    // Template transform.
    let matched_template = match ap.as_ref().map(|ap| ap.rule().transformations().template()) {
        Some(tr) if !tr.is_empty() => {
            let params = Template::new(fields).to_values();
            into_template(tr.apply(&params)?)
        }
        _ => Template::new(fields),
    };

    // Match: query-agg observes, the consuming aggregates remove.
    let found = if op == Operation::QueryAggRequest {
        space.query_all(&matched_template).await
    } else {
        space.get_all(&matched_template).await
    };

    // Match transform: partition into transformed payloads to fold, and
    // unmatched tuples which do not belong to this aggregation.
    let (payloads, unmatched) = match (cp, &ap) {
        (Some(cp), Some(ap)) => match_transform(cp, ap, found),
        _ => (found, Vec::new()),
    };

    // Unmatched tuples are returned to the space, labels intact. A plain
    // query-agg never removed them in the first place.
    if op != Operation::QueryAggRequest {
        for t in unmatched {
            space.put_p(t).await;
        }
    }

    let result = fold_payloads(fold, &fold_ref, &payloads)?;

    // Result transform, wrapping the output with the policy's label.
    let result = match &ap {
        Some(ap) => {
            let tr = ap.rule().transformations().result();
            let payload = if tr.is_empty() {
                result
            } else {
                into_tuple(tr.apply(result.fields())?)
            };
            let labels = Labels::new([ap.label().clone()]);
            LabelledTuple::new(labels, payload.into_fields()).into()
        }
        None => result,
    };

    if op == Operation::PutAggRequest {
        space.put_p(result.clone()).await;
    }
    Ok(result)
}

// Partitions matched tuples. Unlabelled tuples are transformed and
// folded under this policy. Labelled tuples participate only when they
// carry a label whose own policy governs an equal action; otherwise
// they are unmatched and go back to the space.
fn match_transform(
    cp: &Composable,
    ap: &Aggregation,
    found: Vec<Tuple>,
) -> (Vec<Tuple>, Vec<Tuple>) {
    let tr = ap.rule().transformations().matched();
    let mut payloads = Vec::new();
    let mut unmatched = Vec::new();

    for t in found {
        let Some(lt) = LabelledTuple::from_tuple(t.clone()) else {
            // Unlabelled: transform the whole tuple as payload.
            match apply_match(tr, t.fields()) {
                Ok(payload) => payloads.push(payload),
                Err(_) => unmatched.push(t),
            }
            continue;
        };

        let governed = lt.labels().set().any(|label| {
            cp.retrieve(label)
                .map_or(false, |other| other.action() == ap.action())
        });

        if governed {
            match apply_match(tr, lt.fields()) {
                Ok(payload) => payloads.push(payload),
                Err(_) => unmatched.push(t),
            }
        } else {
            unmatched.push(t);
        }
    }
    (payloads, unmatched)
}

fn apply_match(tr: &Transformation, fields: &[Value]) -> Result<Tuple, Error> {
    if tr.is_empty() {
        return Ok(Tuple::new(fields.to_vec()));
    }
    Ok(into_tuple(tr.apply(fields)?))
}

// Reduces the payload sequence with the fold function: empty input is
// f(), a singleton is f(x), and longer input is a left fold f(acc, x).
// A nil result on non-empty input is an aggregation failure.
fn fold_payloads(fold: SpaceFn, fold_ref: &FuncRef, payloads: &[Tuple]) -> Result<Tuple, Error> {
    let result = match payloads {
        [] => fold(&[]),
        [one] => fold(&[Value::Tuple(one.clone())]),
        [first, rest @ ..] => {
            let mut acc = Value::Tuple(first.clone());
            for t in rest {
                acc = fold(&[acc, Value::Tuple(t.clone())]);
                if acc.is_unit() {
                    return Err(Error::AggregationFailure(fold_ref.name.clone()));
                }
            }
            acc
        }
    };

    match result {
        Value::Tuple(t) => Ok(t),
        Value::Unit if payloads.is_empty() => Ok(Tuple::empty()),
        Value::Unit => Err(Error::AggregationFailure(fold_ref.name.clone())),
        other => Ok(Tuple::new(vec![other])),
    }
}

// Transformation results arrive as whatever shape the function chose to
// return; templates and tuples are accepted directly, lists are
// reinterpreted field-wise.
fn into_template(value: Value) -> Template {
    match value {
        Value::Template(tp) => tp,
        Value::List(vs) => Template::from_values(vs),
        other => Template::from_values(vec![other]),
    }
}

fn into_tuple(value: Value) -> Tuple {
    match value {
        Value::Tuple(t) => t,
        Value::List(vs) => Tuple::new(vs),
        other => Tuple::new(vec![other]),
    }
}
