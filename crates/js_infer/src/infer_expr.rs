use js_ast::{Literal, Node, NodeId, ScopeId};
use js_ty::{
    array_element_type, array_type, class_base_type, function_return_types, function_type,
    is_function_type, PrimitiveTy, TypeList, ARRAY_TYPE, CLASS_JQUERY, DEFAULT_PARAMETER_TYPE,
    DOLLAR, FUNCTION_JQUERY, JQUERY, NUMBER_TYPE, OBJECT_TYPE, PROTOTYPE_PROPERTY,
};
use smol_str::SmolStr;

use crate::{operators::pre_unary_type, InferCtx};

const REQUIRE: &str = "require";

impl InferCtx<'_> {
    pub(crate) fn infer_types(&mut self, node: NodeId, scope: ScopeId) -> TypeList {
        let mut out = TypeList::new();
        self.infer_node(node, scope, &mut out);
        out
    }

    /// Add the types of `node` to `out`.
    pub(crate) fn infer_node(&mut self, node: NodeId, scope: ScopeId, out: &mut TypeList) {
        let module = self.module;
        log::trace!("infer {:?} at {:?}", module[node], module.span(node));

        match &module[node] {
            Node::Identifier(name) => self.infer_identifier(node, name, scope, out),
            Node::Literal(lit) => {
                out.add(literal_type(lit));
            }
            Node::Array(elements) => match elements.first() {
                None => {
                    out.add(ARRAY_TYPE);
                }
                // only the first element decides
                Some(&first) => {
                    for ty in self.infer_types(first, scope) {
                        out.add(array_type(&ty));
                    }
                }
            },
            Node::Object(pairs) => {
                if pairs.is_empty() {
                    out.add(OBJECT_TYPE);
                } else {
                    out.extend(self.object_literal_types(node));
                }
            }
            Node::Function { .. } => self.infer_function(node, out),
            Node::BinOp { op, lhs, rhs } => self.infer_bin_op(*op, *lhs, *rhs, scope, out),
            Node::Assign { op, lhs, rhs } => self.infer_assign(*op, *lhs, *rhs, scope, out),
            Node::Conditional {
                then_expr,
                else_expr,
                cond: _,
            } => {
                self.infer_node(*then_expr, scope, out);
                self.infer_node(*else_expr, scope, out);
            }
            Node::Construct { callee, args: _ } => self.infer_construct(*callee, scope, out),
            Node::Invoke { callee, args } => self.infer_invoke(node, *callee, args, scope, out),
            Node::GetProperty { object, property } => {
                self.infer_get_property(*object, property, scope, out)
            }
            Node::GetElement { object, index: _ } => {
                for ty in self.infer_types(*object, scope) {
                    match array_element_type(&ty) {
                        Some(element) => out.add(element),
                        None => out.add(OBJECT_TYPE),
                    };
                }
            }
            Node::Group(inner) => self.infer_node(*inner, scope, out),
            Node::PreUnary { op, expr: _ } => {
                if let Some(ty) = pre_unary_type(*op) {
                    out.add(ty);
                }
            }
            Node::PostUnary { .. } => {
                out.add(NUMBER_TYPE);
            }

            Node::Missing
            | Node::Program(_)
            | Node::Block(_)
            | Node::Var(_)
            | Node::Declaration { .. }
            | Node::Parameters(_)
            | Node::Return(_)
            | Node::If { .. }
            | Node::For { .. }
            | Node::ForIn { .. }
            | Node::While { .. }
            | Node::DoWhile { .. }
            | Node::Throw(_)
            | Node::Try { .. }
            | Node::Catch { .. }
            | Node::Break
            | Node::Continue
            | Node::Empty
            | Node::ExprStatement(_)
            | Node::Comma(_)
            | Node::This
            | Node::Null
            | Node::NameValuePair { .. } => {}
        }
    }

    fn infer_identifier(&mut self, node: NodeId, name: &str, scope: ScopeId, out: &mut TypeList) {
        let module = self.module;

        let elements = if self.scopes.has_symbol(scope, name) {
            let in_params = module
                .parent(node)
                .is_some_and(|parent| matches!(module[parent], Node::Parameters(_)));
            if in_params {
                self.add_parameter_types(node, name, out);
                return;
            }
            match self.symbol_property_element(scope, name) {
                Some(element) => vec![element],
                None => self.helper.globals(&self.file_name, name),
            }
        } else {
            self.helper.globals(&self.file_name, name)
        };

        for element in elements {
            out.extend(element.signature_types());
        }
    }

    /// A parameter's documented types, or the default parameter type.
    fn add_parameter_types(&mut self, node: NodeId, name: &str, out: &mut TypeList) {
        let module = self.module;
        let docs = module
            .parent(node)
            .and_then(|params| module.parent(params))
            .and_then(|function| module.docs(function));
        let index = module.child_index(node).unwrap_or_default();

        let types = self.documented_param_types(docs, index, name);
        if types.is_empty() {
            out.add(DEFAULT_PARAMETER_TYPE);
        } else {
            out.extend(types);
        }
    }

    fn infer_function(&mut self, node: NodeId, out: &mut TypeList) {
        let module = self.module;
        let Node::Function { body, .. } = &module[node] else {
            return;
        };
        let scope = self.scopes.scope_at_offset(module.span(*body).start);

        let mut returns = TypeList::new();
        let mut returns_value = false;
        for ret in module.return_nodes(node) {
            if let Node::Return(Some(expr)) = &module[ret] {
                returns_value = true;
                self.infer_node(*expr, scope, &mut returns);
            }
        }
        if returns_value && returns.is_empty() {
            returns.add(OBJECT_TYPE);
        }

        out.add(function_type(&returns.into_vec()));
    }

    /// Instances of `new C()` take the types of `C.prototype`.
    fn infer_construct(&mut self, callee: NodeId, scope: ScopeId, out: &mut TypeList) {
        for ty in self.infer_types(callee, scope) {
            let target = class_base_type(&ty).unwrap_or(ty);
            for element in self.lookup_members(&target, PROTOTYPE_PROPERTY) {
                out.extend(element.type_names());
            }
        }
    }

    fn infer_get_property(
        &mut self,
        object: NodeId,
        property: &str,
        scope: ScopeId,
        out: &mut TypeList,
    ) {
        let module = self.module;
        let receiver = match &module[object] {
            Node::Identifier(name) => Some(name.as_str()),
            _ => None,
        };

        for ty in self.infer_types(object, scope) {
            let mut ty = self.type_map.map(&ty);
            // `$.ajax` means the static side of jQuery
            if ty == FUNCTION_JQUERY && matches!(receiver, Some(DOLLAR | JQUERY)) {
                ty = SmolStr::new_static(CLASS_JQUERY);
            }
            for element in self.lookup_members(&ty, property) {
                out.extend(element.signature_types());
            }
        }
    }

    fn infer_invoke(
        &mut self,
        node: NodeId,
        callee: NodeId,
        args: &[NodeId],
        scope: ScopeId,
        out: &mut TypeList,
    ) {
        let module = self.module;

        if matches!(&module[callee], Node::Identifier(name) if name == REQUIRE) {
            for &arg in args {
                if let Node::Literal(Literal::String(id)) = &module[arg] {
                    if let Some(ty) = self.required_module_type(id) {
                        out.add(ty);
                    }
                }
            }
        }

        let types = self.infer_types(callee, scope);
        if types.is_empty() {
            // `x = f()` and `f().y` still need something to work with
            let needs_object = module.parent(node).is_some_and(|parent| match &module[parent] {
                Node::Assign { .. } => module.child_index(node) == Some(1),
                Node::GetProperty { .. } => true,
                _ => false,
            });
            if needs_object {
                out.add(OBJECT_TYPE);
            }
        }

        for ty in types.iter() {
            if is_function_type(ty) {
                out.extend(function_return_types(ty));
            } else {
                for ancestor in self.generated_ancestors(ty) {
                    if is_function_type(&ancestor) {
                        out.extend(function_return_types(&ancestor));
                    }
                }
            }
        }
    }

    /// The `module.exports` type of the file `require(id)` loads.
    fn required_module_type(&self, id: &str) -> Option<SmolStr> {
        let root = self.helper.index().root();
        let Some(path) = self.resolver.resolve(id, self.current_dir(), root) else {
            log::debug!("could not resolve require('{id}')");
            return None;
        };
        self.helper.module_type(&path)
    }
}

fn literal_type(lit: &Literal) -> PrimitiveTy {
    match lit {
        Literal::String(_) => PrimitiveTy::String,
        Literal::Number(_) => PrimitiveTy::Number,
        Literal::Boolean(_) => PrimitiveTy::Boolean,
        Literal::Regex(_) => PrimitiveTy::RegExp,
    }
}
