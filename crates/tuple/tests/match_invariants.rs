use tuple::{template, tuple, Label, Labels, Template, TemplateField, Tuple, TypeField, TypeTag, Value};

fn fixtures() -> Vec<Tuple> {
    vec![
        Tuple::empty(),
        tuple![1_i64],
        tuple!["a", 2_i64],
        tuple![true, 2.5_f64, "mixed"],
        Tuple::new(vec![Value::Unit, Value::Uint(7)]),
        Tuple::new(vec![
            Value::Labels(Labels::new([Label::new("L")])),
            Value::from("payload"),
        ]),
        Tuple::new(vec![Value::List(vec![Value::Int(1), Value::Int(2)])]),
    ]
}

// Every tuple matches the template made of its own concrete fields, and
// the template made of its own field types.
#[test]
fn match_is_reflexive_over_derived_templates() {
    for t in fixtures() {
        let concrete = Template::of_values(t.fields().to_vec());
        assert!(t.matches(&concrete), "{t} matches its value template");

        let formal = Template::new(
            t.fields()
                .iter()
                .map(|f| TemplateField::Formal(TypeField::of(f)))
                .collect(),
        );
        assert!(t.matches(&formal), "{t} matches its type template");
    }
}

// A match implies equal lengths and positionwise agreement.
#[test]
fn match_implies_shape_agreement() {
    for t in fixtures() {
        for other in fixtures() {
            let tp = Template::of_values(other.fields().to_vec());
            if t.matches(&tp) {
                assert_eq!(t.len(), tp.len());
                assert_eq!(t, other);
            }
        }
    }
}

// Templates of the wrong arity never match, even when every shared
// position agrees.
#[test]
fn arity_is_part_of_identity() {
    let t = tuple!["a", 1_i64];
    assert!(!t.matches(&template![actual "a"]));
    assert!(!t.matches(&template![actual "a", actual 1_i64, formal TypeTag::Int]));
}

// exact_match agrees with matches: a template exactly matching a
// tuple's value template also matches the tuple itself.
#[test]
fn exact_match_agrees_with_match() {
    let t = tuple!["a", 1_i64];
    let derived = Template::of_values(t.fields().to_vec());

    for candidate in [
        template![formal TypeTag::Str, formal TypeTag::Int],
        template![actual "a", formal TypeTag::Int],
        template![actual "a", actual 1_i64],
    ] {
        assert!(derived.exact_match(&candidate).is_some());
        assert!(t.matches(&candidate));
    }

    for candidate in [
        template![formal TypeTag::Int, formal TypeTag::Int],
        template![actual "b", formal TypeTag::Int],
    ] {
        assert!(derived.exact_match(&candidate).is_none());
        assert!(!t.matches(&candidate));
    }
}

// The zero tuple of a template matches the template's type shape.
#[test]
fn zero_tuples_match_their_template_types() {
    let tp = template![formal TypeTag::Str, formal TypeTag::Int, formal TypeTag::Float];
    assert!(tp.new_tuple().matches(&tp));

    let mixed = template![actual "a", formal TypeTag::Int];
    // The zero tuple zeroes concrete positions too, so it matches the
    // type shape but not the concrete template.
    let zero = mixed.new_tuple();
    assert_eq!(zero, tuple![String::new(), 0_i64]);
    assert!(!zero.matches(&mixed));
}
