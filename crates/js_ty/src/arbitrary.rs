use proptest::prelude::{prop, prop_oneof, Just, Strategy};

fn arb_simple_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("string".to_string()),
        Just("Number".to_string()),
        Just("bool".to_string()),
        Just("*".to_string()),
        Just("void".to_string()),
        "[A-Z][a-zA-Z]{0,6}",
    ]
}

/// Type names the way they show up in doc comments: aliases, `T[]`
/// shorthands, stray whitespace and nested generic encodings.
pub fn arb_raw_type_name() -> impl Strategy<Value = String> {
    arb_simple_name().prop_recursive(3, 16, 3, |inner| {
        let list = prop::collection::vec(inner.clone(), 0..3);
        prop_oneof![
            inner.clone().prop_map(|ty| format!("{ty}[]")),
            prop::collection::vec(inner.clone(), 1..3)
                .prop_map(|args| format!("Array< {} >", args.join(", "))),
            list.clone()
                .prop_map(|returns| format!("Function<{}>", returns.join(" | "))),
            (list.clone(), list).prop_map(|(params, returns)| {
                if returns.is_empty() {
                    format!("Function({})", params.join(", "))
                } else {
                    format!("Function({}) : {}", params.join(","), returns.join("|"))
                }
            }),
            inner.clone().prop_map(|ty| format!("Class<{ty}>")),
            inner.prop_map(|ty| format!("( {ty} )")),
        ]
    })
}
