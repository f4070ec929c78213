use std::{
    collections::{BTreeMap, HashMap},
    iter, ops,
};

use la_arena::{Arena, Idx};
use smol_str::SmolStr;

use crate::{AssignOp, Module, Node, NodeId, PropertyCollection, TextRange};

pub type ScopeId = Idx<ScopeData>;

/// One lexical region: the program or a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeData {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    range: TextRange,
    /// The function owning this scope, `None` for the program scope.
    function: Option<NodeId>,
    symbols: BTreeMap<SmolStr, PropertyCollection>,
}

impl ScopeData {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Nested function scopes in source order.
    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn function(&self) -> Option<NodeId> {
        self.function
    }

    pub fn symbols(&self) -> &BTreeMap<SmolStr, PropertyCollection> {
        &self.symbols
    }

    pub fn local_symbol(&self, name: &str) -> Option<&PropertyCollection> {
        self.symbols.get(name)
    }

    fn declare(&mut self, name: &SmolStr) -> &mut PropertyCollection {
        self.symbols
            .entry(name.clone())
            .or_insert_with(|| PropertyCollection::named(name.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleScopes {
    scopes: Arena<ScopeData>,
    root: ScopeId,
    scope_by_function: HashMap<NodeId, ScopeId>,
}

impl ops::Index<ScopeId> for ModuleScopes {
    type Output = ScopeData;
    fn index(&self, index: ScopeId) -> &Self::Output {
        &self.scopes[index]
    }
}

impl ModuleScopes {
    pub fn new(module: &Module) -> Self {
        let mut scopes = Arena::new();
        let root = scopes.alloc(ScopeData {
            parent: None,
            children: Vec::new(),
            range: module.span(module.entry),
            function: None,
            symbols: BTreeMap::new(),
        });

        let mut this = Self {
            scopes,
            root,
            scope_by_function: HashMap::new(),
        };

        // declarations are hoisted, so assignments are only resolved once
        // every scope has all of its names
        let mut assignments = Vec::new();
        this.collect(module, module.entry, root, &mut assignments);
        for (scope, lhs, rhs) in assignments {
            this.record_assignment(module, scope, lhs, rhs);
        }

        this
    }

    fn collect(
        &mut self,
        module: &Module,
        node: NodeId,
        scope: ScopeId,
        assignments: &mut Vec<(ScopeId, NodeId, NodeId)>,
    ) {
        match &module[node] {
            Node::Function { name, params, body } => {
                if let Some(name) = name {
                    self.scopes[scope].declare(name).add_value(node);
                }

                let child = self.scopes.alloc(ScopeData {
                    parent: Some(scope),
                    children: Vec::new(),
                    range: module.span(*body),
                    function: Some(node),
                    symbols: BTreeMap::new(),
                });
                self.scopes[scope].children.push(child);
                self.scope_by_function.insert(node, child);

                if let Node::Parameters(idents) = &module[*params] {
                    for &ident in idents.iter() {
                        if let Node::Identifier(param) = &module[ident] {
                            self.scopes[child].declare(param).add_value(ident);
                        }
                    }
                }
                self.collect(module, *body, child, assignments);
                return;
            }
            Node::Declaration { name, value } => {
                let symbol = self.scopes[scope].declare(name);
                if let Some(value) = value {
                    symbol.add_value(*value);
                }
            }
            Node::Catch { param, .. } => {
                self.scopes[scope].declare(param);
            }
            Node::Assign {
                op: AssignOp::Assign,
                lhs,
                rhs,
            } => assignments.push((scope, *lhs, *rhs)),
            _ => {}
        }

        for child in module.children(node) {
            self.collect(module, child, scope, assignments);
        }
    }

    fn record_assignment(&mut self, module: &Module, scope: ScopeId, lhs: NodeId, rhs: NodeId) {
        let Some(path) = assignment_path(module, lhs) else {
            return;
        };
        let Some((first, rest)) = path.split_first() else {
            return;
        };

        let owner = self
            .ancestors(scope)
            .find(|&id| self.scopes[id].symbols.contains_key(first))
            .unwrap_or(self.root);

        let mut collection = self.scopes[owner].declare(first);
        for segment in rest {
            collection = collection.property_mut(segment);
        }
        collection.add_value(rhs);
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &ScopeData)> + '_ {
        self.scopes.iter()
    }

    /// `scope` followed by each enclosing scope up to the root.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        iter::successors(Some(scope), |&id| self.scopes[id].parent)
    }

    pub fn has_symbol(&self, scope: ScopeId, name: &str) -> bool {
        self.symbol(scope, name).is_some()
    }

    /// The closest declaration of `name`, with the scope declaring it.
    pub fn symbol(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, &PropertyCollection)> {
        self.ancestors(scope)
            .find_map(|id| self.scopes[id].local_symbol(name).map(|symbol| (id, symbol)))
    }

    pub fn local_symbol_names(&self, scope: ScopeId) -> impl Iterator<Item = &SmolStr> + '_ {
        self.scopes[scope].symbols.keys()
    }

    /// The deepest scope whose range covers `offset`.
    pub fn scope_at_offset(&self, offset: u32) -> ScopeId {
        let mut current = self.root;
        while let Some(&child) = self.scopes[current]
            .children
            .iter()
            .find(|&&child| self.scopes[child].range.contains(offset))
        {
            current = child;
        }
        current
    }

    pub fn scope_for_function(&self, function: NodeId) -> Option<ScopeId> {
        self.scope_by_function.get(&function).copied()
    }
}

/// `a`, `a.b.c` or `(a).b` as a list of names. Other targets like `this.x` or
/// `a[0]` are not tracked.
fn assignment_path(module: &Module, node: NodeId) -> Option<Vec<SmolStr>> {
    match &module[node] {
        Node::Identifier(name) => Some(vec![name.clone()]),
        Node::GetProperty { object, property } => {
            let mut path = assignment_path(module, *object)?;
            path.push(property.clone());
            Some(path)
        }
        Node::Group(inner) => assignment_path(module, *inner),
        _ => None,
    }
}
