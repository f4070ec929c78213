use std::collections::HashMap;

use comment_parser::DocumentationBlock;
use la_arena::Arena;
use ordered_float::OrderedFloat;
use pest::{
    error::InputLocation,
    iterators::{Pair, Pairs},
    Parser,
};
use pest_derive::Parser;
use smol_str::SmolStr;

use crate::{
    comment::{gather_doc_comments, DocCommentCtx},
    ArithOp, AssignOp, BinOp, BoolOp, Literal, Module, Node, NodeId, ParseError, PostUnaryOp,
    PreUnaryOp, TextRange,
};

#[derive(Parser)]
#[grammar = "js.pest"]
pub(crate) struct JsParser;

impl ParseError {
    fn from_pest(err: pest::error::Error<Rule>) -> Self {
        let (start, end) = match err.location {
            InputLocation::Pos(pos) => (pos, pos),
            InputLocation::Span(span) => span,
        };
        ParseError {
            message: err.variant.message().into_owned(),
            span: (start, end - start).into(),
        }
    }
}

pub fn lower(src: &str) -> Result<Module, ParseError> {
    let mut pairs = JsParser::parse(Rule::program, src).map_err(ParseError::from_pest)?;

    let mut ctx = LowerCtx {
        nodes: Arena::new(),
        spans: HashMap::new(),
        docs: HashMap::new(),
        pending_docs: gather_doc_comments(src).into(),
    };

    let entry = match pairs.next() {
        Some(program) => {
            let range = TextRange::new(0, src.len());
            let statements = ctx.lower_statements(program.into_inner());
            ctx.alloc(Node::Program(statements), range)
        }
        None => ctx.alloc(Node::Program(Box::new([])), TextRange::new(0, src.len())),
    };

    Ok(ctx.finish(entry))
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::k_var
            | Rule::k_function
            | Rule::k_return
            | Rule::k_if
            | Rule::k_else
            | Rule::k_for
            | Rule::k_while
            | Rule::k_do
            | Rule::k_throw
            | Rule::k_try
            | Rule::k_catch
            | Rule::k_finally
            | Rule::k_break
            | Rule::k_continue
            | Rule::k_new
            | Rule::EOI
    )
}

/// Children of a pair without keyword tokens.
fn significant(pairs: Pairs<'_, Rule>) -> impl Iterator<Item = Pair<'_, Rule>> {
    pairs.filter(|pair| !is_keyword(pair.as_rule()))
}

struct LowerCtx {
    nodes: Arena<Node>,
    spans: HashMap<NodeId, TextRange>,
    docs: HashMap<NodeId, DocumentationBlock>,
    pending_docs: DocCommentCtx,
}

impl LowerCtx {
    fn alloc(&mut self, node: Node, range: impl Into<TextRange>) -> NodeId {
        let id = self.nodes.alloc(node);
        self.spans.insert(id, range.into());
        id
    }

    fn missing(&mut self, at: usize) -> NodeId {
        self.alloc(Node::Missing, TextRange::empty(at))
    }

    fn finish(self, entry: NodeId) -> Module {
        let mut parents = HashMap::with_capacity(self.nodes.len());
        for (id, node) in self.nodes.iter() {
            node.walk_child_nodes(|child| {
                parents.insert(child, id);
            });
        }

        Module {
            nodes: self.nodes,
            spans: self.spans,
            parents,
            docs: self.docs,
            entry,
        }
    }

    /// Give a statement level doc comment to the function it defines, unless
    /// the function has its own.
    fn attach_to_function(&mut self, node: NodeId, doc: &DocumentationBlock) {
        if matches!(self.nodes[node], Node::Function { .. }) && !self.docs.contains_key(&node) {
            self.docs.insert(node, doc.clone());
        }
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn lower_statements(&mut self, pairs: Pairs<'_, Rule>) -> Box<[NodeId]> {
        significant(pairs)
            .map(|pair| self.lower_statement(pair))
            .collect()
    }

    fn lower_opt_statement(&mut self, pair: Option<Pair<'_, Rule>>, at: usize) -> NodeId {
        match pair {
            Some(pair) => self.lower_statement(pair),
            None => self.missing(at),
        }
    }

    fn lower_statement(&mut self, pair: Pair<'_, Rule>) -> NodeId {
        let span = pair.as_span();
        let start = span.start();

        match pair.as_rule() {
            Rule::block | Rule::function_body => {
                let statements = self.lower_statements(pair.into_inner());
                self.alloc(Node::Block(statements), span)
            }
            Rule::var_statement => {
                let doc = self.pending_docs.take(start);
                match pair.into_inner().next() {
                    Some(list) => self.lower_var_list(list, doc),
                    None => self.missing(start),
                }
            }
            Rule::function_declaration => self.lower_function(pair),
            Rule::return_statement => {
                let value = significant(pair.into_inner())
                    .next()
                    .map(|expr| self.lower_expr(expr));
                self.alloc(Node::Return(value), span)
            }
            Rule::if_statement => {
                let mut inner = significant(pair.into_inner());
                let cond = self.lower_opt_expr(inner.next(), start);
                let then_branch = self.lower_opt_statement(inner.next(), start);
                let else_branch = inner.next().map(|stmt| self.lower_statement(stmt));
                self.alloc(
                    Node::If {
                        cond,
                        then_branch,
                        else_branch,
                    },
                    span,
                )
            }
            Rule::for_statement => self.lower_for(pair),
            Rule::while_statement => {
                let mut inner = significant(pair.into_inner());
                let cond = self.lower_opt_expr(inner.next(), start);
                let body = self.lower_opt_statement(inner.next(), start);
                self.alloc(Node::While { cond, body }, span)
            }
            Rule::do_while_statement => {
                let mut inner = significant(pair.into_inner());
                let body = self.lower_opt_statement(inner.next(), start);
                let cond = self.lower_opt_expr(inner.next(), start);
                self.alloc(Node::DoWhile { body, cond }, span)
            }
            Rule::throw_statement => {
                let value = significant(pair.into_inner()).next();
                let value = self.lower_opt_expr(value, start);
                self.alloc(Node::Throw(value), span)
            }
            Rule::try_statement => {
                let mut block = None;
                let mut catch = None;
                let mut finally = None;
                for part in significant(pair.into_inner()) {
                    let part_span = part.as_span();
                    match part.as_rule() {
                        Rule::block => block = Some(self.lower_statement(part)),
                        Rule::catch_clause => {
                            let mut inner = significant(part.into_inner());
                            let param = inner
                                .next()
                                .map(|ident| SmolStr::from(ident.as_str()))
                                .unwrap_or_default();
                            let body = self.lower_opt_statement(inner.next(), part_span.start());
                            catch = Some(self.alloc(Node::Catch { param, body }, part_span));
                        }
                        Rule::finally_clause => {
                            let body = significant(part.into_inner()).next();
                            finally = Some(self.lower_opt_statement(body, part_span.start()));
                        }
                        _ => {}
                    }
                }
                let block = match block {
                    Some(block) => block,
                    None => self.missing(start),
                };
                self.alloc(
                    Node::Try {
                        block,
                        catch,
                        finally,
                    },
                    span,
                )
            }
            Rule::break_statement => self.alloc(Node::Break, span),
            Rule::continue_statement => self.alloc(Node::Continue, span),
            Rule::empty_statement => self.alloc(Node::Empty, span),
            Rule::expression_statement => {
                let doc = self.pending_docs.take(start);
                let expr = pair.into_inner().next();
                let expr = self.lower_opt_expr(expr, start);
                // `/** doc */ ns.fn = function() {}`
                let assigned = match &self.nodes[expr] {
                    Node::Assign { rhs, .. } => Some(*rhs),
                    _ => None,
                };
                if let (Some(doc), Some(rhs)) = (&doc, assigned) {
                    self.attach_to_function(rhs, doc);
                }
                self.alloc(Node::ExprStatement(expr), span)
            }
            _ => self.lower_expr(pair),
        }
    }

    fn lower_var_list(&mut self, pair: Pair<'_, Rule>, doc: Option<DocumentationBlock>) -> NodeId {
        let span = pair.as_span();
        let mut doc = doc;
        let mut declarations = Vec::new();

        for declarator in significant(pair.into_inner()) {
            let decl_span = declarator.as_span();
            let decl_doc = doc
                .take()
                .or_else(|| self.pending_docs.take(decl_span.start()));

            let mut inner = declarator.into_inner();
            let name = inner
                .next()
                .map(|ident| SmolStr::from(ident.as_str()))
                .unwrap_or_default();
            let value = inner.next().map(|expr| self.lower_expr(expr));
            let decl = self.alloc(Node::Declaration { name, value }, decl_span);

            if let Some(decl_doc) = decl_doc {
                if let Some(value) = value {
                    self.attach_to_function(value, &decl_doc);
                }
                self.docs.insert(decl, decl_doc);
            }
            declarations.push(decl);
        }

        self.alloc(Node::Var(declarations.into()), span)
    }

    fn lower_for(&mut self, pair: Pair<'_, Rule>) -> NodeId {
        let span = pair.as_span();
        let start = span.start();
        let mut inner = significant(pair.into_inner());
        let head = inner.next();
        let body = self.lower_opt_statement(inner.next(), start);

        let Some(head) = head else {
            let binding = self.missing(start);
            let object = self.missing(start);
            return self.alloc(
                Node::ForIn {
                    binding,
                    object,
                    body,
                },
                span,
            );
        };

        if head.as_rule() == Rule::for_in_head {
            let mut parts = head.into_inner().filter(|p| p.as_rule() != Rule::op_in);
            let binding = match parts.next() {
                Some(binding) if binding.as_rule() == Rule::var_binding => {
                    let binding_span = binding.as_span();
                    let name = significant(binding.into_inner())
                        .next()
                        .map(|ident| SmolStr::from(ident.as_str()))
                        .unwrap_or_default();
                    let decl = self.alloc(Node::Declaration { name, value: None }, binding_span);
                    self.alloc(Node::Var(Box::new([decl])), binding_span)
                }
                other => self.lower_opt_expr(other, start),
            };
            let object = self.lower_opt_expr(parts.next(), start);
            return self.alloc(
                Node::ForIn {
                    binding,
                    object,
                    body,
                },
                span,
            );
        }

        let (mut init, mut test, mut update) = (None, None, None);
        for part in head.into_inner() {
            let rule = part.as_rule();
            let Some(child) = part.into_inner().next() else {
                continue;
            };
            let lowered = match child.as_rule() {
                Rule::var_list => self.lower_var_list(child, None),
                _ => self.lower_expr(child),
            };
            match rule {
                Rule::for_init => init = Some(lowered),
                Rule::for_test => test = Some(lowered),
                _ => update = Some(lowered),
            }
        }

        self.alloc(
            Node::For {
                init,
                test,
                update,
                body,
            },
            span,
        )
    }

    fn lower_function(&mut self, pair: Pair<'_, Rule>) -> NodeId {
        let span = pair.as_span();
        let start = span.start();
        let doc = self.pending_docs.take(start);

        let mut name = None;
        let mut params = None;
        let mut body = None;
        for part in significant(pair.into_inner()) {
            let part_span = part.as_span();
            match part.as_rule() {
                Rule::identifier => name = Some(SmolStr::from(part.as_str())),
                Rule::parameters => {
                    let idents: Box<[NodeId]> = part
                        .into_inner()
                        .map(|ident| {
                            let ident_span = ident.as_span();
                            self.alloc(Node::Identifier(ident.as_str().into()), ident_span)
                        })
                        .collect();
                    params = Some(self.alloc(Node::Parameters(idents), part_span));
                }
                Rule::function_body => body = Some(self.lower_statement(part)),
                _ => {}
            }
        }

        let params = match params {
            Some(params) => params,
            None => self.alloc(Node::Parameters(Box::new([])), TextRange::empty(start)),
        };
        let body = match body {
            Some(body) => body,
            None => self.missing(start),
        };

        let function = self.alloc(Node::Function { name, params, body }, span);
        if let Some(doc) = doc {
            self.docs.insert(function, doc);
        }
        function
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn lower_opt_expr(&mut self, pair: Option<Pair<'_, Rule>>, at: usize) -> NodeId {
        match pair {
            Some(pair) => self.lower_expr(pair),
            None => self.missing(at),
        }
    }

    fn lower_expr(&mut self, pair: Pair<'_, Rule>) -> NodeId {
        let span = pair.as_span();
        let start = span.start();

        match pair.as_rule() {
            Rule::expression => {
                let mut items: Vec<NodeId> = pair.into_inner().map(|p| self.lower_expr(p)).collect();
                match items.len() {
                    0 => self.missing(start),
                    1 => items.remove(0),
                    _ => self.alloc(Node::Comma(items.into()), span),
                }
            }
            Rule::assignment => {
                let mut inner = pair.into_inner();
                let lhs = self.lower_opt_expr(inner.next(), start);
                let Some(op) = inner.next() else {
                    return lhs;
                };
                let op = assign_op(op.as_rule());
                let rhs = self.lower_opt_expr(inner.next(), start);
                self.alloc(Node::Assign { op, lhs, rhs }, span)
            }
            Rule::conditional => {
                let mut inner = pair.into_inner();
                let cond = self.lower_opt_expr(inner.next(), start);
                let Some(then_expr) = inner.next() else {
                    return cond;
                };
                let then_expr = self.lower_expr(then_expr);
                let else_expr = self.lower_opt_expr(inner.next(), start);
                self.alloc(
                    Node::Conditional {
                        cond,
                        then_expr,
                        else_expr,
                    },
                    span,
                )
            }
            Rule::binary => self.lower_binary(pair),
            Rule::unary => {
                let mut ops = Vec::new();
                let mut operand = None;
                for part in pair.into_inner() {
                    match pre_unary_op(part.as_rule()) {
                        Some(op) => ops.push((op, part.as_span().start())),
                        None => operand = Some(part),
                    }
                }
                let mut expr = self.lower_opt_expr(operand, start);
                let end = self.spans.get(&expr).map_or(start, |range| range.end as usize);
                for (op, op_start) in ops.into_iter().rev() {
                    expr = self.alloc(Node::PreUnary { op, expr }, TextRange::new(op_start, end));
                }
                expr
            }
            Rule::postfix => {
                let mut inner = pair.into_inner();
                let expr = self.lower_opt_expr(inner.next(), start);
                match inner.next().map(|op| op.as_rule()) {
                    Some(Rule::op_incr) => self.alloc(
                        Node::PostUnary {
                            op: PostUnaryOp::Increment,
                            expr,
                        },
                        span,
                    ),
                    Some(Rule::op_decr) => self.alloc(
                        Node::PostUnary {
                            op: PostUnaryOp::Decrement,
                            expr,
                        },
                        span,
                    ),
                    _ => expr,
                }
            }
            Rule::left_hand_side | Rule::new_callee => self.lower_accessors(pair),
            Rule::new_expression => {
                let mut inner = significant(pair.into_inner());
                let callee = self.lower_opt_expr(inner.next(), start);
                let args = match inner.next() {
                    Some(args) => self.lower_arguments(args),
                    None => Box::new([]),
                };
                self.alloc(Node::Construct { callee, args }, span)
            }
            Rule::function_expression => self.lower_function(pair),
            Rule::group => {
                let inner = pair.into_inner().next();
                let inner = self.lower_opt_expr(inner, start);
                self.alloc(Node::Group(inner), span)
            }
            Rule::identifier => self.alloc(Node::Identifier(pair.as_str().into()), span),
            Rule::this_lit => self.alloc(Node::This, span),
            Rule::null_lit => self.alloc(Node::Null, span),
            Rule::boolean_lit => {
                let value = pair.as_str() == "true";
                self.alloc(Node::Literal(Literal::Boolean(value)), span)
            }
            Rule::number_lit => {
                let value = parse_number(pair.as_str());
                self.alloc(Node::Literal(Literal::Number(OrderedFloat(value))), span)
            }
            Rule::string_lit | Rule::template_lit => {
                let text = pair
                    .into_inner()
                    .next()
                    .map(|chars| unescape(chars.as_str()))
                    .unwrap_or_default();
                self.alloc(Node::Literal(Literal::String(text)), span)
            }
            Rule::regex_lit => self.alloc(Node::Literal(Literal::Regex(pair.as_str().into())), span),
            Rule::array_lit => {
                let elements: Box<[NodeId]> = pair.into_inner().map(|p| self.lower_expr(p)).collect();
                self.alloc(Node::Array(elements), span)
            }
            Rule::object_lit => {
                let properties: Box<[NodeId]> =
                    pair.into_inner().map(|p| self.lower_property(p)).collect();
                self.alloc(Node::Object(properties), span)
            }
            _ => self.missing(start),
        }
    }

    fn lower_property(&mut self, pair: Pair<'_, Rule>) -> NodeId {
        let span = pair.as_span();
        let start = span.start();
        let doc = self.pending_docs.take(start);

        let mut inner = pair.into_inner();
        let key = match inner.next() {
            Some(key) if key.as_rule() == Rule::string_lit => key
                .into_inner()
                .next()
                .map(|chars| unescape(chars.as_str()))
                .unwrap_or_default(),
            Some(key) => key.as_str().into(),
            None => SmolStr::default(),
        };
        let value = self.lower_opt_expr(inner.next(), start);
        if let Some(doc) = &doc {
            self.attach_to_function(value, doc);
        }
        self.alloc(Node::NameValuePair { key, value }, span)
    }

    fn lower_arguments(&mut self, pair: Pair<'_, Rule>) -> Box<[NodeId]> {
        pair.into_inner().map(|arg| self.lower_expr(arg)).collect()
    }

    /// Fold `.name`, `[index]` and `(args)` suffixes onto the leading operand.
    fn lower_accessors(&mut self, pair: Pair<'_, Rule>) -> NodeId {
        let start = pair.as_span().start();
        let mut inner = pair.into_inner();
        let mut node = self.lower_opt_expr(inner.next(), start);

        for accessor in inner {
            let range = TextRange::new(start, accessor.as_span().end());
            node = match accessor.as_rule() {
                Rule::member_access => {
                    let property = accessor
                        .into_inner()
                        .next()
                        .map(|name| SmolStr::from(name.as_str()))
                        .unwrap_or_default();
                    self.alloc(
                        Node::GetProperty {
                            object: node,
                            property,
                        },
                        range,
                    )
                }
                Rule::element_access => {
                    let index = accessor.into_inner().next();
                    let index = self.lower_opt_expr(index, range.end as usize);
                    self.alloc(Node::GetElement { object: node, index }, range)
                }
                Rule::arguments => {
                    let args = self.lower_arguments(accessor);
                    self.alloc(Node::Invoke { callee: node, args }, range)
                }
                _ => node,
            };
        }

        node
    }

    /// Operators come back flat from the grammar, precedence is resolved here.
    fn lower_binary(&mut self, pair: Pair<'_, Rule>) -> NodeId {
        let start = pair.as_span().start();
        let mut operands: Vec<NodeId> = Vec::new();
        let mut pending: Vec<BinOp> = Vec::new();

        for part in pair.into_inner() {
            match bin_op(part.as_rule()) {
                Some(op) => {
                    while let Some(&top) = pending.last() {
                        if top.precedence() < op.precedence() {
                            break;
                        }
                        pending.pop();
                        self.reduce_binary(&mut operands, top);
                    }
                    pending.push(op);
                }
                None => {
                    let operand = self.lower_expr(part);
                    operands.push(operand);
                }
            }
        }
        while let Some(op) = pending.pop() {
            self.reduce_binary(&mut operands, op);
        }

        match operands.pop() {
            Some(node) => node,
            None => self.missing(start),
        }
    }

    fn reduce_binary(&mut self, operands: &mut Vec<NodeId>, op: BinOp) {
        let (Some(rhs), Some(lhs)) = (operands.pop(), operands.pop()) else {
            return;
        };
        let range = TextRange {
            start: self.spans.get(&lhs).map_or(0, |r| r.start),
            end: self.spans.get(&rhs).map_or(0, |r| r.end),
        };
        let node = self.alloc(Node::BinOp { op, lhs, rhs }, range);
        operands.push(node);
    }
}

fn bin_op(rule: Rule) -> Option<BinOp> {
    let op = match rule {
        Rule::op_add => BinOp::Arith(ArithOp::Add),
        Rule::op_sub => BinOp::Arith(ArithOp::Sub),
        Rule::op_mul => BinOp::Arith(ArithOp::Mul),
        Rule::op_div => BinOp::Arith(ArithOp::Div),
        Rule::op_mod => BinOp::Arith(ArithOp::Mod),
        Rule::op_shl => BinOp::Arith(ArithOp::Shl),
        Rule::op_shr => BinOp::Arith(ArithOp::Shr),
        Rule::op_ushr => BinOp::Arith(ArithOp::UShr),
        Rule::op_bit_and => BinOp::Arith(ArithOp::BitAnd),
        Rule::op_bit_or => BinOp::Arith(ArithOp::BitOr),
        Rule::op_bit_xor => BinOp::Arith(ArithOp::BitXor),
        Rule::op_and => BinOp::Bool(BoolOp::And),
        Rule::op_or => BinOp::Bool(BoolOp::Or),
        Rule::op_eq => BinOp::Bool(BoolOp::Eq),
        Rule::op_ne => BinOp::Bool(BoolOp::NotEq),
        Rule::op_strict_eq => BinOp::Bool(BoolOp::StrictEq),
        Rule::op_strict_ne => BinOp::Bool(BoolOp::StrictNotEq),
        Rule::op_lt => BinOp::Bool(BoolOp::Less),
        Rule::op_le => BinOp::Bool(BoolOp::LessEq),
        Rule::op_gt => BinOp::Bool(BoolOp::Greater),
        Rule::op_ge => BinOp::Bool(BoolOp::GreaterEq),
        Rule::op_in => BinOp::Bool(BoolOp::In),
        Rule::op_instanceof => BinOp::Bool(BoolOp::InstanceOf),
        _ => return None,
    };
    Some(op)
}

fn pre_unary_op(rule: Rule) -> Option<PreUnaryOp> {
    let op = match rule {
        Rule::op_delete => PreUnaryOp::Delete,
        Rule::op_void => PreUnaryOp::Void,
        Rule::op_typeof => PreUnaryOp::TypeOf,
        Rule::op_incr => PreUnaryOp::Increment,
        Rule::op_decr => PreUnaryOp::Decrement,
        Rule::op_pos => PreUnaryOp::Plus,
        Rule::op_neg => PreUnaryOp::Minus,
        Rule::op_bit_not => PreUnaryOp::BitNot,
        Rule::op_not => PreUnaryOp::Not,
        _ => return None,
    };
    Some(op)
}

fn assign_op(rule: Rule) -> AssignOp {
    match rule {
        Rule::assign_add => AssignOp::Add,
        Rule::assign_sub => AssignOp::Sub,
        Rule::assign_mul => AssignOp::Mul,
        Rule::assign_div => AssignOp::Div,
        Rule::assign_mod => AssignOp::Mod,
        Rule::assign_shl => AssignOp::Shl,
        Rule::assign_shr => AssignOp::Shr,
        Rule::assign_ushr => AssignOp::UShr,
        Rule::assign_bit_and => AssignOp::BitAnd,
        Rule::assign_bit_or => AssignOp::BitOr,
        Rule::assign_bit_xor => AssignOp::BitXor,
        _ => AssignOp::Assign,
    }
}

fn parse_number(text: &str) -> f64 {
    let hex = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"));
    match hex {
        Some(digits) => i64::from_str_radix(digits, 16).map_or(f64::NAN, |n| n as f64),
        None => text.parse().unwrap_or(f64::NAN),
    }
}

fn unescape(raw: &str) -> SmolStr {
    if !raw.contains('\\') {
        return raw.into();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            // line continuation
            Some('\n') | Some('\r') | None => {}
            Some(other) => out.push(other),
        }
    }
    out.into()
}
