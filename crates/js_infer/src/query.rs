use std::{collections::VecDeque, path::Path};

use js_ty::{base_type_name, EXPORTS_SUFFIX, OBJECT_TYPE};
use rustc_hash::FxHashSet;
use smol_str::{format_smolstr, SmolStr};

use crate::index::{file_uri, Category, Element, MatchMode, SymbolIndex};

/// Lookups layered on top of a [`SymbolIndex`]: inherited members, generic
/// fallbacks and module definitions.
#[derive(Clone, Copy)]
pub struct IndexQueryHelper<'a> {
    index: &'a dyn SymbolIndex,
}

impl<'a> IndexQueryHelper<'a> {
    pub fn new(index: &'a dyn SymbolIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &'a dyn SymbolIndex {
        self.index
    }

    pub fn globals(&self, file_name: &str, name: &str) -> Vec<Element> {
        self.index.globals(file_name, name)
    }

    /// Every ancestor of `type_name`, nearest first, without repeats.
    pub fn type_ancestors(&self, type_name: &str) -> Vec<SmolStr> {
        let mut seen = FxHashSet::default();
        seen.insert(SmolStr::from(type_name));

        let mut ancestors = Vec::new();
        let mut queue: VecDeque<SmolStr> = self.index.type_parents(type_name).into();
        while let Some(parent) = queue.pop_front() {
            if !seen.insert(parent.clone()) {
                continue;
            }
            queue.extend(self.index.type_parents(&parent));
            ancestors.push(parent);
        }
        ancestors
    }

    /// Members named `member` visible on `type_name`. The closest declaring
    /// type wins. A generic encoding with no declaration of its own falls back
    /// to its base type (`Array<String>` to `Array`), and `Object` is the last
    /// resort.
    pub fn type_members(&self, type_name: &str, member: &str) -> Vec<Element> {
        let own = std::iter::once(SmolStr::from(type_name));
        for candidate in own.chain(self.type_ancestors(type_name)) {
            let members = self.index.type_members(&candidate, member);
            if !members.is_empty() {
                return members;
            }
        }

        let base = base_type_name(type_name);
        if base != type_name {
            return self.type_members(base, member);
        }
        if type_name != OBJECT_TYPE {
            return self.index.type_members(OBJECT_TYPE, member);
        }
        Vec::new()
    }

    /// The `<module>.exports` type of the module defined in the file at `path`.
    pub fn module_type(&self, path: &Path) -> Option<SmolStr> {
        let uri = file_uri(path);
        self.index
            .query(&[Category::ModuleDefinition], "*", MatchMode::Pattern)
            .into_iter()
            .find(|result| result.documents.contains(&uri))
            .map(|result| format_smolstr!("{}{EXPORTS_SUFFIX}", result.word))
    }
}
