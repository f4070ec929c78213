mod comment;
mod db;
mod lower;
mod properties;
mod scope;

#[cfg(any(test, feature = "proptest_support"))]
pub mod arbitrary;


pub use comment::gather_doc_comments;
pub use comment_parser::{DocumentationBlock, ParamTag, Tag};
pub use db::{AstDb, JsFile, RootDatabase};
pub use lower::lower;
pub use properties::{collect_object_literal, PropertyCollection};
pub use scope::{ModuleScopes, ScopeData, ScopeId};

use std::{collections::HashMap, fmt, ops};

use la_arena::{Arena, Idx};
use miette::{Diagnostic, SourceSpan};
use ordered_float::OrderedFloat;
use smol_str::SmolStr;
use thiserror::Error;

#[salsa::tracked]
pub fn parse_module(db: &dyn AstDb, file: JsFile) -> Result<Module, ParseError> {
    lower(file.contents(db))
}

#[salsa::tracked]
pub fn module_scopes(db: &dyn AstDb, file: JsFile) -> Result<ModuleScopes, ParseError> {
    parse_module(db, file).map(|module| ModuleScopes::new(&module))
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(js_ast::parse))]
pub struct ParseError {
    pub message: String,
    #[label("here")]
    pub span: SourceSpan,
}

impl ParseError {
    pub fn offset(&self) -> usize {
        self.span.offset()
    }
}

// ==========================================================================
// Source ranges
// ==========================================================================

/// Byte range `[start, end)` in the source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    pub fn empty(at: usize) -> Self {
        Self::new(at, at)
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<pest::Span<'_>> for TextRange {
    fn from(span: pest::Span<'_>) -> Self {
        Self::new(span.start(), span.end())
    }
}

// ==========================================================================
// Module
// ==========================================================================

pub type NodeId = Idx<Node>;

/// A lowered file. Nodes live in one arena; parents and spans are side tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    nodes: Arena<Node>,
    spans: HashMap<NodeId, TextRange>,
    parents: HashMap<NodeId, NodeId>,
    docs: HashMap<NodeId, DocumentationBlock>,
    pub entry: NodeId,
}

impl ops::Index<NodeId> for Module {
    type Output = Node;
    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

impl Module {
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter()
    }

    pub fn span(&self, node: NodeId) -> TextRange {
        self.spans.get(&node).copied().unwrap_or_default()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parents.get(&node).copied()
    }

    /// Documentation attached to a function or declaration node.
    pub fn docs(&self, node: NodeId) -> Option<&DocumentationBlock> {
        self.docs.get(&node)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let mut children = Vec::new();
        self[node].walk_child_nodes(|child| children.push(child));
        children
    }

    /// Position of `node` among its parent's children.
    pub fn child_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&child| child == node)
    }

    /// The function's own `return` statements in source order, skipping those
    /// of nested functions.
    pub fn return_nodes(&self, function: NodeId) -> Vec<NodeId> {
        let Node::Function { body, .. } = &self[function] else {
            return Vec::new();
        };

        let mut returns = Vec::new();
        let mut stack = vec![*body];
        while let Some(node) = stack.pop() {
            match &self[node] {
                Node::Return(_) => returns.push(node),
                Node::Function { .. } => {}
                other => other.walk_child_nodes(|child| stack.push(child)),
            }
        }
        returns.sort_by_key(|&node| self.span(node).start);
        returns
    }

    /// The innermost node whose span covers `offset`.
    pub fn node_at_offset(&self, offset: u32) -> Option<NodeId> {
        // children are allocated before their parents, so on equal spans the
        // lower index is the deeper node
        self.nodes
            .iter()
            .map(|(id, _)| id)
            .filter(|&id| self.span(id).contains(offset))
            .min_by_key(|&id| (self.span(id).len(), u32::from(id.into_raw())))
    }
}

// ==========================================================================
// Nodes
// ==========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A required child the parser did not produce.
    Missing,
    Program(Box<[NodeId]>),
    Block(Box<[NodeId]>),

    /// `var a = 1, b` holding `Declaration` nodes.
    Var(Box<[NodeId]>),
    Declaration {
        name: SmolStr,
        value: Option<NodeId>,
    },
    Function {
        name: Option<SmolStr>,
        params: NodeId,
        body: NodeId,
    },
    /// `Identifier` nodes of a function's parameter list.
    Parameters(Box<[NodeId]>),
    Return(Option<NodeId>),
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    For {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForIn {
        binding: NodeId,
        object: NodeId,
        body: NodeId,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        cond: NodeId,
    },
    Throw(NodeId),
    Try {
        block: NodeId,
        catch: Option<NodeId>,
        finally: Option<NodeId>,
    },
    Catch {
        param: SmolStr,
        body: NodeId,
    },
    Break,
    Continue,
    Empty,
    ExprStatement(NodeId),

    Comma(Box<[NodeId]>),
    Identifier(SmolStr),
    This,
    Null,
    Literal(Literal),
    Array(Box<[NodeId]>),
    /// Object literal holding `NameValuePair` nodes.
    Object(Box<[NodeId]>),
    NameValuePair {
        key: SmolStr,
        value: NodeId,
    },
    BinOp {
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Assign {
        op: AssignOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Conditional {
        cond: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    Construct {
        callee: NodeId,
        args: Box<[NodeId]>,
    },
    Invoke {
        callee: NodeId,
        args: Box<[NodeId]>,
    },
    GetProperty {
        object: NodeId,
        property: SmolStr,
    },
    GetElement {
        object: NodeId,
        index: NodeId,
    },
    Group(NodeId),
    PreUnary {
        op: PreUnaryOp,
        expr: NodeId,
    },
    PostUnary {
        op: PostUnaryOp,
        expr: NodeId,
    },
}

impl Node {
    pub fn walk_child_nodes(&self, mut f: impl FnMut(NodeId)) {
        match self {
            Self::Missing
            | Self::Break
            | Self::Continue
            | Self::Empty
            | Self::Identifier(_)
            | Self::This
            | Self::Null
            | Self::Literal(_) => {}
            Self::Program(xs)
            | Self::Block(xs)
            | Self::Var(xs)
            | Self::Parameters(xs)
            | Self::Comma(xs)
            | Self::Array(xs)
            | Self::Object(xs) => xs.iter().copied().for_each(f),
            Self::Declaration { value, name: _ } | Self::Return(value) => {
                if let &Some(value) = value {
                    f(value);
                }
            }
            Self::Function {
                params,
                body,
                name: _,
            } => {
                f(*params);
                f(*body);
            }
            Self::If {
                cond,
                then_branch,
                else_branch,
            } => {
                f(*cond);
                f(*then_branch);
                if let &Some(e) = else_branch {
                    f(e);
                }
            }
            Self::For {
                init,
                test,
                update,
                body,
            } => {
                [*init, *test, *update].into_iter().flatten().for_each(&mut f);
                f(*body);
            }
            Self::ForIn {
                binding,
                object,
                body,
            } => {
                f(*binding);
                f(*object);
                f(*body);
            }
            Self::While { cond: a, body: b } | Self::DoWhile { body: a, cond: b } => {
                f(*a);
                f(*b);
            }
            Self::Try {
                block,
                catch,
                finally,
            } => {
                f(*block);
                [*catch, *finally].into_iter().flatten().for_each(f);
            }
            Self::Catch { body, param: _ } => f(*body),
            Self::Throw(e)
            | Self::ExprStatement(e)
            | Self::Group(e)
            | Self::NameValuePair { value: e, key: _ }
            | Self::GetProperty {
                object: e,
                property: _,
            }
            | Self::PreUnary { expr: e, op: _ }
            | Self::PostUnary { expr: e, op: _ } => f(*e),
            Self::BinOp { lhs, rhs, op: _ } | Self::Assign { lhs, rhs, op: _ } => {
                f(*lhs);
                f(*rhs);
            }
            Self::GetElement { object, index } => {
                f(*object);
                f(*index);
            }
            Self::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                f(*cond);
                f(*then_expr);
                f(*else_expr);
            }
            Self::Construct { callee, args } | Self::Invoke { callee, args } => {
                f(*callee);
                args.iter().copied().for_each(f);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    String(SmolStr),
    Number(OrderedFloat<f64>),
    Boolean(bool),
    /// Source text including delimiters and flags.
    Regex(SmolStr),
}

// ==========================================================================
// Operators
// ==========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Arith(ArithOp),
    Bool(BoolOp),
}

/// Operators producing numbers (or strings, for `+`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
}

/// Comparisons and the logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    In,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreUnaryOp {
    Delete,
    Void,
    TypeOf,
    Increment,
    Decrement,
    Plus,
    Minus,
    BitNot,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostUnaryOp {
    Increment,
    Decrement,
}

impl BinOp {
    /// Binding power, higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Bool(BoolOp::Or) => 1,
            BinOp::Bool(BoolOp::And) => 2,
            BinOp::Arith(ArithOp::BitOr) => 3,
            BinOp::Arith(ArithOp::BitXor) => 4,
            BinOp::Arith(ArithOp::BitAnd) => 5,
            BinOp::Bool(BoolOp::Eq | BoolOp::NotEq | BoolOp::StrictEq | BoolOp::StrictNotEq) => 6,
            BinOp::Bool(
                BoolOp::Less
                | BoolOp::LessEq
                | BoolOp::Greater
                | BoolOp::GreaterEq
                | BoolOp::In
                | BoolOp::InstanceOf,
            ) => 7,
            BinOp::Arith(ArithOp::Shl | ArithOp::Shr | ArithOp::UShr) => 8,
            BinOp::Arith(ArithOp::Add | ArithOp::Sub) => 9,
            BinOp::Arith(ArithOp::Mul | ArithOp::Div | ArithOp::Mod) => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Arith(op) => op.as_str(),
            BinOp::Bool(op) => op.as_str(),
        }
    }
}

impl ArithOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
            ArithOp::Shl => "<<",
            ArithOp::Shr => ">>",
            ArithOp::UShr => ">>>",
            ArithOp::BitAnd => "&",
            ArithOp::BitOr => "|",
            ArithOp::BitXor => "^",
        }
    }
}

impl BoolOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BoolOp::And => "&&",
            BoolOp::Or => "||",
            BoolOp::Eq => "==",
            BoolOp::NotEq => "!=",
            BoolOp::StrictEq => "===",
            BoolOp::StrictNotEq => "!==",
            BoolOp::Less => "<",
            BoolOp::LessEq => "<=",
            BoolOp::Greater => ">",
            BoolOp::GreaterEq => ">=",
            BoolOp::In => "in",
            BoolOp::InstanceOf => "instanceof",
        }
    }
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::UShr => ">>>=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
        }
    }
}

impl PreUnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PreUnaryOp::Delete => "delete ",
            PreUnaryOp::Void => "void ",
            PreUnaryOp::TypeOf => "typeof ",
            PreUnaryOp::Increment => "++",
            PreUnaryOp::Decrement => "--",
            PreUnaryOp::Plus => "+",
            PreUnaryOp::Minus => "-",
            PreUnaryOp::BitNot => "~",
            PreUnaryOp::Not => "!",
        }
    }
}

impl PostUnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PostUnaryOp::Increment => "++",
            PostUnaryOp::Decrement => "--",
        }
    }
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_via_as_str!(BinOp, ArithOp, BoolOp, AssignOp, PreUnaryOp, PostUnaryOp);
