mod index;
mod infer_expr;
mod operators;
mod query;
mod require;
mod symbol;

#[cfg(test)]
mod tests;

#[cfg(test)]
mod pbt;

pub use index::{
    file_uri, Category, Element, FunctionElement, MatchMode, MemoryIndex, ParameterElement,
    PropertyElement, QueryResult, SymbolIndex, WINDOW_TYPE,
};
pub use query::IndexQueryHelper;
pub use require::{ModuleResolver, NodeModuleResolver, ResolveError, NODE_RESOLVER};
pub use symbol::GeneratedType;

use std::path::{Path, PathBuf};

use js_ast::{AstDb, JsFile, Module, ModuleScopes, Node, NodeId, ParseError, ScopeId};
use js_ty::{TypeList, TypeMapper};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

/// Types of the innermost node at `offset` in `file`.
pub fn infer_file_offset(
    db: &dyn AstDb,
    file: JsFile,
    index: &dyn SymbolIndex,
    type_map: &TypeMapper,
    offset: u32,
) -> Result<Vec<SmolStr>, ParseError> {
    let module = js_ast::parse_module(db, file)?;
    let scopes = js_ast::module_scopes(db, file)?;
    let path = file.path(db);
    let mut ctx = InferCtx::new(&module, &scopes, index, &path).with_type_map(type_map.clone());
    Ok(ctx.infer_at_offset(offset))
}

/// Inference over one parsed file.
///
/// Every `infer` call builds its result from scratch; the only state kept
/// between calls is the registry of generated object types, which is keyed
/// deterministically and so never changes an answer.
pub struct InferCtx<'a> {
    module: &'a Module,
    scopes: &'a ModuleScopes,
    helper: IndexQueryHelper<'a>,
    resolver: &'a dyn ModuleResolver,
    type_map: TypeMapper,

    location: PathBuf,
    file_name: SmolStr,
    file_stem: SmolStr,

    /// Object types synthesized from literals and symbol property assignments.
    generated: FxHashMap<SmolStr, GeneratedType>,

    /// (declaring scope, qualified name) of symbols currently being inferred.
    in_progress: FxHashSet<(ScopeId, SmolStr)>,
}

impl<'a> InferCtx<'a> {
    pub fn new(
        module: &'a Module,
        scopes: &'a ModuleScopes,
        index: &'a dyn SymbolIndex,
        location: &Path,
    ) -> Self {
        let file_name = location
            .file_name()
            .map(|name| SmolStr::new(name.to_string_lossy()))
            .unwrap_or_default();
        let file_stem = location
            .file_stem()
            .map(|stem| SmolStr::new(stem.to_string_lossy()))
            .unwrap_or_default();

        Self {
            module,
            scopes,
            helper: IndexQueryHelper::new(index),
            resolver: &NODE_RESOLVER,
            type_map: TypeMapper::default(),
            location: location.to_path_buf(),
            file_name,
            file_stem,
            generated: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: &'a dyn ModuleResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_type_map(mut self, type_map: TypeMapper) -> Self {
        self.type_map = type_map;
        self
    }

    pub fn module(&self) -> &'a Module {
        self.module
    }

    pub fn scopes(&self) -> &'a ModuleScopes {
        self.scopes
    }

    /// Possible types of `node` evaluated in `scope`, in discovery order.
    pub fn infer(&mut self, node: NodeId, scope: ScopeId) -> Vec<SmolStr> {
        self.infer_types(node, scope).into_vec()
    }

    /// Types of the innermost node covering `offset`. A declaration reports
    /// the types of the symbol it declares.
    pub fn infer_at_offset(&mut self, offset: u32) -> Vec<SmolStr> {
        let Some(node) = self.module.node_at_offset(offset) else {
            return Vec::new();
        };
        let scope = self.scope_for_node(node);
        let module = self.module;
        match &module[node] {
            Node::Declaration { name, .. } => self.symbol_types(scope, name),
            _ => self.infer(node, scope),
        }
    }

    /// Types of the symbol `name` as seen from `scope`, falling back to the
    /// index's globals.
    pub fn symbol_types(&mut self, scope: ScopeId, name: &str) -> Vec<SmolStr> {
        let mut out = TypeList::new();
        match self.symbol_property_element(scope, name) {
            Some(element) => out.extend(element.signature_types()),
            None => {
                for element in self.helper.globals(&self.file_name, name) {
                    out.extend(element.signature_types());
                }
            }
        }
        out.into_vec()
    }

    pub fn generated_type(&self, name: &str) -> Option<&GeneratedType> {
        self.generated.get(name)
    }

    /// All generated types, sorted by name.
    pub fn generated_types(&self) -> Vec<&GeneratedType> {
        let mut types: Vec<&GeneratedType> = self.generated.values().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        types
    }

    /// The scope a node's names resolve in. Parameter identifiers belong to
    /// their function's scope even though they sit before its body.
    pub(crate) fn scope_for_node(&self, node: NodeId) -> ScopeId {
        let module = self.module;
        if let Some(params) = module.parent(node) {
            if matches!(module[params], Node::Parameters(_)) {
                if let Some(scope) = module
                    .parent(params)
                    .and_then(|function| self.scopes.scope_for_function(function))
                {
                    return scope;
                }
            }
        }
        self.scopes.scope_at_offset(module.span(node).start)
    }

    fn current_dir(&self) -> &Path {
        self.location.parent().unwrap_or(Path::new("/"))
    }
}
