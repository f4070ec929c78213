//! Result types of the JS operators.

use js_ast::{ArithOp, AssignOp, BinOp, BoolOp, Literal, Module, Node, NodeId, PreUnaryOp, ScopeId};
use js_ty::{TypeList, BOOLEAN_TYPE, DEFAULT_ASSIGNMENT_TYPE, NUMBER_TYPE, STRING_TYPE};

use crate::InferCtx;

impl InferCtx<'_> {
    pub(crate) fn infer_bin_op(
        &mut self,
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
        scope: ScopeId,
        out: &mut TypeList,
    ) {
        match op {
            BinOp::Arith(ArithOp::Add) => {
                let ty = self.addition_type(lhs, rhs, scope);
                out.add(ty);
            }
            BinOp::Arith(_) => {
                out.add(NUMBER_TYPE);
            }
            // `a || b` evaluates to one of its operands
            BinOp::Bool(BoolOp::And | BoolOp::Or) => {
                self.infer_node(lhs, scope, out);
                self.infer_node(rhs, scope, out);
            }
            BinOp::Bool(_) => {
                out.add(BOOLEAN_TYPE);
            }
        }
    }

    pub(crate) fn infer_assign(
        &mut self,
        op: AssignOp,
        lhs: NodeId,
        rhs: NodeId,
        scope: ScopeId,
        out: &mut TypeList,
    ) {
        match op {
            AssignOp::Assign => self.infer_node(rhs, scope, out),
            AssignOp::Add => {
                let concatenates = self.infer_types(lhs, scope).contains(STRING_TYPE)
                    || self.infer_types(rhs, scope).contains(STRING_TYPE);
                out.add(if concatenates { STRING_TYPE } else { NUMBER_TYPE });
            }
            _ => {
                out.add(DEFAULT_ASSIGNMENT_TYPE);
            }
        }
    }

    /// `+` is a string concatenation as soon as any operand along the chain of
    /// left-nested additions is a string.
    fn addition_type(&mut self, lhs: NodeId, rhs: NodeId, scope: ScopeId) -> &'static str {
        let module = self.module;

        let mut operands = vec![rhs];
        let mut lhs = lhs;
        while let Node::BinOp {
            op: BinOp::Arith(ArithOp::Add),
            lhs: inner_lhs,
            rhs: inner_rhs,
        } = &module[lhs]
        {
            operands.push(*inner_rhs);
            lhs = *inner_lhs;
            if is_string_literal(module, *inner_rhs) {
                break;
            }
        }
        operands.push(lhs);

        if operands.iter().any(|&operand| is_string_literal(module, operand)) {
            return STRING_TYPE;
        }
        for operand in operands {
            if self.infer_types(operand, scope).contains(STRING_TYPE) {
                return STRING_TYPE;
            }
        }
        NUMBER_TYPE
    }
}

pub(crate) fn pre_unary_type(op: PreUnaryOp) -> Option<&'static str> {
    match op {
        PreUnaryOp::Delete | PreUnaryOp::Not => Some(BOOLEAN_TYPE),
        PreUnaryOp::TypeOf => Some(STRING_TYPE),
        PreUnaryOp::Void => None,
        PreUnaryOp::Increment
        | PreUnaryOp::Decrement
        | PreUnaryOp::Plus
        | PreUnaryOp::Minus
        | PreUnaryOp::BitNot => Some(NUMBER_TYPE),
    }
}

fn is_string_literal(module: &Module, node: NodeId) -> bool {
    matches!(module[node], Node::Literal(Literal::String(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unary_results() {
        assert_eq!(pre_unary_type(PreUnaryOp::Not), Some("Boolean"));
        assert_eq!(pre_unary_type(PreUnaryOp::Delete), Some("Boolean"));
        assert_eq!(pre_unary_type(PreUnaryOp::TypeOf), Some("String"));
        assert_eq!(pre_unary_type(PreUnaryOp::Void), None);
        assert_eq!(pre_unary_type(PreUnaryOp::Minus), Some("Number"));
        assert_eq!(pre_unary_type(PreUnaryOp::BitNot), Some("Number"));
    }
}
