//! Symbol types and generated object types.
//!
//! A symbol's type comes from every value assigned to it. When a symbol (or an
//! object literal) also has properties its inferred types don't already
//! provide, a new object type is generated to hold them. Generated names only
//! depend on where the collection lives, so inferring the same symbol or
//! literal twice yields the same name.

use indexmap::IndexMap;
use js_ast::{collect_object_literal, DocumentationBlock, Node, NodeId, PropertyCollection, ScopeId};
use js_ty::{
    canonical_type_name, function_return_types, function_type, is_function_type, TypeList,
    DEFAULT_PARAMETER_TYPE, OBJECT_TYPE,
};
use rustc_hash::FxHashSet;
use smol_str::{format_smolstr, SmolStr};

use crate::{
    index::{Element, FunctionElement, ParameterElement, PropertyElement},
    InferCtx,
};

/// An object type synthesized during inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedType {
    pub name: SmolStr,
    pub parents: Vec<SmolStr>,
    pub members: IndexMap<SmolStr, Element>,
}

/// Where a property collection was found, which fixes its generated name.
#[derive(Debug, Clone, Copy)]
enum TypeOrigin {
    /// An object literal starting at this offset.
    Literal(u32),
    /// A symbol declared in the scope starting at this offset.
    Scope(u32),
}

impl InferCtx<'_> {
    /// The element describing symbol `name` as seen from `scope`, or `None`
    /// when no enclosing scope declares it.
    pub fn symbol_property_element(&mut self, scope: ScopeId, name: &str) -> Option<Element> {
        let scopes = self.scopes;
        let (owner, collection) = scopes.symbol(scope, name)?;

        let key = (owner, collection.qualified_name().clone());
        if !self.in_progress.insert(key.clone()) {
            log::trace!("`{name}` refers to itself");
            return Some(PropertyElement::new(name, "").into());
        }

        let mut element = self.collection_element(collection, name, "");
        let origin = TypeOrigin::Scope(scopes[owner].range().start);
        self.process_properties(origin, collection, &mut element);

        self.in_progress.remove(&key);
        Some(element)
    }

    /// The generated type of a non-empty object literal.
    pub(crate) fn object_literal_types(&mut self, node: NodeId) -> Vec<SmolStr> {
        let collection = collect_object_literal(self.module, node);
        let mut element = Element::from(PropertyElement::new("", ""));
        let origin = TypeOrigin::Literal(self.module.span(node).start);
        self.process_properties(origin, &collection, &mut element);
        element.type_names().to_vec()
    }

    /// Element built from the values of one collection, ignoring its
    /// properties.
    fn collection_element(
        &mut self,
        collection: &PropertyCollection,
        name: &str,
        owning_type: &str,
    ) -> Element {
        let module = self.module;
        let mut types = TypeList::new();

        for &value in collection.values() {
            // `/** @type {T} */ var x = ...`
            if let Some(decl) = module
                .parent(value)
                .filter(|&parent| matches!(module[parent], Node::Declaration { .. }))
            {
                if let Some(docs) = module.docs(decl) {
                    types.extend(docs.declared_types());
                }
            }

            let documented_returns = match (&module[value], module.docs(value)) {
                (Node::Function { .. }, Some(docs)) if docs.has_return() => {
                    Some(docs.return_types())
                }
                _ => None,
            };
            match documented_returns {
                Some(returns) => {
                    types.add(function_type(&returns));
                }
                None => {
                    let scope = self.scope_for_node(value);
                    types.extend(self.infer_types(value, scope));
                }
            }
        }

        let property = PropertyElement::new(name, owning_type).with_types(types.iter());

        let Some(&first) = collection.values().first() else {
            return property.into();
        };
        let Node::Function { params, .. } = &module[first] else {
            return property.into();
        };

        let docs = module.docs(first);
        let parameters = match &module[*params] {
            Node::Parameters(idents) => idents
                .iter()
                .enumerate()
                .filter_map(|(index, &ident)| match &module[ident] {
                    Node::Identifier(param) => Some(self.parameter_element(docs, index, param)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        let mut return_types = TypeList::new();
        for ty in types.iter().filter(|ty| is_function_type(ty)) {
            return_types.extend(function_return_types(ty));
        }

        FunctionElement {
            property,
            parameters,
            return_types: return_types.into_vec(),
        }
        .into()
    }

    fn parameter_element(
        &self,
        docs: Option<&DocumentationBlock>,
        index: usize,
        name: &SmolStr,
    ) -> ParameterElement {
        let mut types = self.documented_param_types(docs, index, name);
        if types.is_empty() {
            types.push(DEFAULT_PARAMETER_TYPE.into());
        }
        ParameterElement {
            name: name.clone(),
            types,
        }
    }

    /// Types of the `@param` tag at `index`, if it documents `name`. Renames
    /// from the type map are applied.
    pub(crate) fn documented_param_types(
        &self,
        docs: Option<&DocumentationBlock>,
        index: usize,
        name: &str,
    ) -> Vec<SmolStr> {
        docs.and_then(|docs| docs.param_at(index))
            .filter(|param| param.name == name)
            .map(|param| param.types.iter().map(|ty| self.type_map.map(ty)).collect())
            .unwrap_or_default()
    }

    /// Move properties the element's types don't provide into a generated
    /// subtype and make that subtype the element's type.
    fn process_properties(
        &mut self,
        origin: TypeOrigin,
        collection: &PropertyCollection,
        element: &mut Element,
    ) {
        let additional: Vec<(&SmolStr, &PropertyCollection)> = collection
            .properties()
            .iter()
            .filter(|(name, property)| {
                property.has_properties() || !self.has_member(element.type_names(), name)
            })
            .collect();
        if additional.is_empty() {
            return;
        }

        let type_name = self.generated_name(origin, collection.qualified_name());
        if !self.generated.contains_key(&type_name) {
            let parents = match element.type_names() {
                [] => vec![SmolStr::new_static(OBJECT_TYPE)],
                types => types.to_vec(),
            };
            log::debug!("generating type {type_name} extending {parents:?}");

            // registered before the members so self references terminate
            self.generated.insert(
                type_name.clone(),
                GeneratedType {
                    name: type_name.clone(),
                    parents,
                    members: IndexMap::new(),
                },
            );

            for (name, property) in additional {
                let mut member = self.collection_element(property, name, &type_name);
                self.process_properties(origin, property, &mut member);
                if let Some(generated) = self.generated.get_mut(&type_name) {
                    generated.members.insert(name.clone(), member);
                }
            }
        }

        element.property_mut().type_names = vec![type_name];
    }

    /// Canonical, so the registry key is the same string a `TypeList` stores.
    fn generated_name(&self, origin: TypeOrigin, qualified_name: &str) -> SmolStr {
        let stem = &self.file_stem;
        let raw = match origin {
            TypeOrigin::Literal(offset) if qualified_name.is_empty() => {
                format_smolstr!("{stem}${offset}")
            }
            TypeOrigin::Literal(offset) | TypeOrigin::Scope(offset) => {
                format_smolstr!("{stem}${offset}.{qualified_name}")
            }
        };
        canonical_type_name(&raw).unwrap_or(raw)
    }

    fn has_member(&self, types: &[SmolStr], member: &str) -> bool {
        types
            .iter()
            .any(|ty| !self.lookup_members(ty, member).is_empty())
    }

    /// Members named `member` on `type_name`: generated types first (own
    /// members, then their parents), then the index.
    pub(crate) fn lookup_members(&self, type_name: &str, member: &str) -> Vec<Element> {
        let mut seen = FxHashSet::default();
        self.lookup_members_from(type_name, member, &mut seen)
    }

    fn lookup_members_from(
        &self,
        type_name: &str,
        member: &str,
        seen: &mut FxHashSet<SmolStr>,
    ) -> Vec<Element> {
        if !seen.insert(type_name.into()) {
            return Vec::new();
        }

        let Some(generated) = self.generated.get(type_name) else {
            return self.helper.type_members(type_name, member);
        };
        if let Some(element) = generated.members.get(member) {
            return vec![element.clone()];
        }
        for parent in &generated.parents {
            let found = self.lookup_members_from(parent, member, seen);
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// Parents of a generated type, transitively, nearest first.
    pub(crate) fn generated_ancestors(&self, type_name: &str) -> Vec<SmolStr> {
        let mut ancestors: Vec<SmolStr> = Vec::new();
        let mut pending: Vec<&SmolStr> = match self.generated.get(type_name) {
            Some(generated) => generated.parents.iter().rev().collect(),
            None => return ancestors,
        };
        while let Some(parent) = pending.pop() {
            if parent == type_name || ancestors.contains(parent) {
                continue;
            }
            ancestors.push(parent.clone());
            if let Some(generated) = self.generated.get(parent) {
                pending.extend(generated.parents.iter().rev());
            }
        }
        ancestors
    }
}
