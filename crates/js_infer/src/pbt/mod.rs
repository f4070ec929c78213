// ==============================================================================
// Property-Based Tests for Type Inference
// ==============================================================================
//
// Generates fully parenthesized JS expressions over literals together with the
// types the operator rules predict, then checks the inferrer agrees.
//
// Operands of the recursive expressions are wrapped in groups. Additions are
// also generated as ungrouped left-nested chains (`a + b + c`), which go
// through the chain folding: one string operand anywhere makes the result a
// string.

use js_ast::{ArithOp, BoolOp, PreUnaryOp};
use js_ty::TypeList;
use proptest::prelude::{
    any, prop, prop_assert, prop_assert_eq, prop_oneof, proptest, Strategy,
};
use smol_str::SmolStr;

use crate::tests::{fixture_index, infer_last, Inference};

type JsText = String;

fn expected_vec(types: &TypeList) -> Vec<SmolStr> {
    types.iter().cloned().collect()
}

fn arb_leaf() -> impl Strategy<Value = (JsText, TypeList)> {
    prop_oneof![
        any::<u16>().prop_map(|n| (n.to_string(), TypeList::from_iter(["Number"]))),
        "[a-z]{0,5}".prop_map(|s| (format!("'{s}'"), TypeList::from_iter(["String"]))),
        any::<bool>().prop_map(|b| (b.to_string(), TypeList::from_iter(["Boolean"]))),
    ]
}

fn arith_types(op: ArithOp, lhs: &TypeList, rhs: &TypeList) -> TypeList {
    let concatenates = op == ArithOp::Add && (lhs.contains("String") || rhs.contains("String"));
    TypeList::from_iter([if concatenates { "String" } else { "Number" }])
}

fn bool_types(op: BoolOp, lhs: &TypeList, rhs: &TypeList) -> TypeList {
    match op {
        BoolOp::And | BoolOp::Or => {
            let mut out = lhs.clone();
            out.extend(rhs.iter());
            out
        }
        _ => TypeList::from_iter(["Boolean"]),
    }
}

fn unary_types(op: PreUnaryOp) -> TypeList {
    match op {
        PreUnaryOp::Delete | PreUnaryOp::Not => TypeList::from_iter(["Boolean"]),
        PreUnaryOp::TypeOf => TypeList::from_iter(["String"]),
        PreUnaryOp::Void => TypeList::new(),
        _ => TypeList::from_iter(["Number"]),
    }
}

fn arb_expr() -> impl Strategy<Value = (JsText, TypeList)> {
    arb_leaf().prop_recursive(4, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone(), any::<ArithOp>()).prop_map(
                |((l, lt), (r, rt), op)| (format!("({l}) {op} ({r})"), arith_types(op, &lt, &rt))
            ),
            (inner.clone(), inner.clone(), any::<BoolOp>()).prop_map(
                |((l, lt), (r, rt), op)| (format!("({l}) {op} ({r})"), bool_types(op, &lt, &rt))
            ),
            (inner.clone(), inner.clone(), inner.clone()).prop_map(
                |((c, _), (t, tt), (e, et))| {
                    let mut types = tt;
                    types.extend(et.iter());
                    (format!("({c}) ? ({t}) : ({e})"), types)
                }
            ),
            // `++`/`--` need an assignable operand, and `delete` of a literal
            // is fine in sloppy mode
            (inner, any::<PreUnaryOp>())
                .prop_filter("needs an assignable operand", |(_, op)| {
                    !matches!(op, PreUnaryOp::Increment | PreUnaryOp::Decrement)
                })
                .prop_map(|((e, _), op)| (format!("{op}({e})"), unary_types(op))),
        ]
    })
}

/// `a + b + ...` without grouping; operands are literals or grouped
/// expressions.
fn arb_add_chain() -> impl Strategy<Value = (JsText, TypeList)> {
    let operand = prop_oneof![
        3 => arb_leaf(),
        1 => arb_expr().prop_map(|(e, types)| (format!("({e})"), types)),
    ];
    prop::collection::vec(operand, 2..6).prop_map(|operands| {
        let concatenates = operands.iter().any(|(_, types)| types.contains("String"));
        let src: Vec<JsText> = operands.into_iter().map(|(e, _)| e).collect();
        let types = TypeList::from_iter([if concatenates { "String" } else { "Number" }]);
        (src.join(" + "), types)
    })
}

proptest! {
    #[test]
    fn addition_chains((src, expected) in arb_add_chain()) {
        let src = format!("x = {src};");
        prop_assert_eq!(infer_last(&src), expected_vec(&expected));
    }

    #[test]
    fn literal_expressions((src, expected) in arb_expr()) {
        let src = format!("x = {src};");
        prop_assert_eq!(infer_last(&src), expected_vec(&expected));
    }

    #[test]
    fn no_duplicates((src, _) in arb_expr()) {
        let src = format!("x = {src};");
        let types = infer_last(&src);
        let mut deduped = types.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), types.len());
    }

    #[test]
    fn symbols_carry_expression_types((src, expected) in arb_expr()) {
        let src = format!("var v = {src};\nv;");
        prop_assert_eq!(infer_last(&src), expected_vec(&expected));
    }

    #[test]
    fn repeated_inference_agrees((src, _) in arb_expr()) {
        let src = format!("var v = {{a: {src}}};\nv.a;");
        let index = fixture_index();
        let (first, second) = Inference::new(&index).with_ctx(&src, |ctx| {
            let root = ctx.scopes().root();
            let first = ctx.symbol_types(root, "v");
            let second = ctx.symbol_types(root, "v");
            (first, second)
        });
        prop_assert!(!first.is_empty());
        prop_assert_eq!(first, second);
    }
}
