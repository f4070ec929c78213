use proptest::prelude::{prop_oneof, Arbitrary, BoxedStrategy, Just, Strategy};

use crate::{ArithOp, BoolOp, PreUnaryOp};

impl Arbitrary for ArithOp {
    type Parameters = ();
    type Strategy = BoxedStrategy<ArithOp>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            Just(ArithOp::Add),
            Just(ArithOp::Sub),
            Just(ArithOp::Mul),
            Just(ArithOp::Div),
            Just(ArithOp::Mod),
            Just(ArithOp::Shl),
            Just(ArithOp::Shr),
            Just(ArithOp::UShr),
            Just(ArithOp::BitAnd),
            Just(ArithOp::BitOr),
            Just(ArithOp::BitXor),
        ]
        .boxed()
    }
}

impl Arbitrary for BoolOp {
    type Parameters = ();
    type Strategy = BoxedStrategy<BoolOp>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            Just(BoolOp::And),
            Just(BoolOp::Or),
            Just(BoolOp::Eq),
            Just(BoolOp::NotEq),
            Just(BoolOp::StrictEq),
            Just(BoolOp::StrictNotEq),
            Just(BoolOp::Less),
            Just(BoolOp::LessEq),
            Just(BoolOp::Greater),
            Just(BoolOp::GreaterEq),
            Just(BoolOp::In),
            Just(BoolOp::InstanceOf),
        ]
        .boxed()
    }
}

impl Arbitrary for PreUnaryOp {
    type Parameters = ();
    type Strategy = BoxedStrategy<PreUnaryOp>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            Just(PreUnaryOp::Delete),
            Just(PreUnaryOp::Void),
            Just(PreUnaryOp::TypeOf),
            Just(PreUnaryOp::Increment),
            Just(PreUnaryOp::Decrement),
            Just(PreUnaryOp::Plus),
            Just(PreUnaryOp::Minus),
            Just(PreUnaryOp::BitNot),
            Just(PreUnaryOp::Not),
        ]
        .boxed()
    }
}
