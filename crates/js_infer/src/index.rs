use std::path::{Path, PathBuf};

use globset::Glob;
use indexmap::IndexMap;
use js_ty::{function_signature_type, is_function_type, union_type, OBJECT_TYPE};
use smol_str::{format_smolstr, SmolStr};

/// Owning type of global declarations.
pub const WINDOW_TYPE: &str = "Window";

/// `file://` URI of an absolute path, the form documents are recorded in.
pub fn file_uri(path: &Path) -> SmolStr {
    format_smolstr!("file://{}", path.display())
}

// ==========================================================================
// Elements
// ==========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyElement {
    pub name: SmolStr,
    pub owning_type: SmolStr,
    pub type_names: Vec<SmolStr>,
    /// URIs of the files declaring this property.
    pub documents: Vec<SmolStr>,
}

impl PropertyElement {
    pub fn new(name: impl Into<SmolStr>, owning_type: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            owning_type: owning_type.into(),
            type_names: Vec::new(),
            documents: Vec::new(),
        }
    }

    pub fn with_types<S: AsRef<str>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.type_names
            .extend(types.into_iter().map(|ty| SmolStr::from(ty.as_ref())));
        self
    }

    pub fn with_document(mut self, document: impl Into<SmolStr>) -> Self {
        self.documents.push(document.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterElement {
    pub name: SmolStr,
    pub types: Vec<SmolStr>,
}

impl ParameterElement {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionElement {
    pub property: PropertyElement,
    pub parameters: Vec<ParameterElement>,
    pub return_types: Vec<SmolStr>,
}

impl FunctionElement {
    pub fn new(property: PropertyElement) -> Self {
        Self {
            property,
            parameters: Vec::new(),
            return_types: Vec::new(),
        }
    }

    /// `Function(P1,P2):R1|R2`, one slot per parameter.
    pub fn signature(&self) -> SmolStr {
        let params: Vec<SmolStr> = self
            .parameters
            .iter()
            .map(|param| match param.types.as_slice() {
                [] => SmolStr::new_static(OBJECT_TYPE),
                types => union_type(types),
            })
            .collect();
        function_signature_type(&params, &self.return_types)
    }
}

/// A record of the symbol index: a plain property or a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Property(PropertyElement),
    Function(FunctionElement),
}

impl Element {
    pub fn property(&self) -> &PropertyElement {
        match self {
            Element::Property(property) => property,
            Element::Function(function) => &function.property,
        }
    }

    pub fn property_mut(&mut self) -> &mut PropertyElement {
        match self {
            Element::Property(property) => property,
            Element::Function(function) => &mut function.property,
        }
    }

    pub fn name(&self) -> &SmolStr {
        &self.property().name
    }

    pub fn owning_type(&self) -> &SmolStr {
        &self.property().owning_type
    }

    pub fn type_names(&self) -> &[SmolStr] {
        &self.property().type_names
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Element::Function(_))
    }

    pub fn return_types(&self) -> &[SmolStr] {
        match self {
            Element::Function(function) => &function.return_types,
            Element::Property(_) => &[],
        }
    }

    /// What a reference to this element evaluates to. Functions report their
    /// signature plus any non-function types they also carry, properties
    /// their plain types.
    pub fn signature_types(&self) -> Vec<SmolStr> {
        match self {
            Element::Property(property) => property.type_names.clone(),
            Element::Function(function) => {
                let mut types = vec![function.signature()];
                types.extend(
                    function
                        .property
                        .type_names
                        .iter()
                        .filter(|ty| !is_function_type(ty))
                        .cloned(),
                );
                types
            }
        }
    }
}

impl From<PropertyElement> for Element {
    fn from(property: PropertyElement) -> Self {
        Element::Property(property)
    }
}

impl From<FunctionElement> for Element {
    fn from(function: FunctionElement) -> Self {
        Element::Function(function)
    }
}

// ==========================================================================
// Index interface
// ==========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Type,
    Global,
    ModuleDefinition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    Exact,
    Prefix,
    /// Glob syntax: `*`, `?` and `[...]`.
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub word: SmolStr,
    pub documents: Vec<SmolStr>,
}

/// Read-only view of a project's declarations. Implementations must tolerate
/// concurrent readers if inference runs on several threads.
pub trait SymbolIndex {
    /// Directory the index covers, the upper bound of module resolution.
    fn root(&self) -> Option<&Path>;

    /// Global declarations named `name`. Declarations from the file called
    /// `file_name` come first.
    fn globals(&self, file_name: &str, name: &str) -> Vec<Element>;

    /// Members named `member` declared directly on `type_name`.
    fn type_members(&self, type_name: &str, member: &str) -> Vec<Element>;

    fn type_parents(&self, type_name: &str) -> Vec<SmolStr>;

    fn has_type(&self, type_name: &str) -> bool;

    fn query(&self, categories: &[Category], pattern: &str, mode: MatchMode) -> Vec<QueryResult>;
}

// ==========================================================================
// In-memory index
// ==========================================================================

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct TypeRecord {
    parents: Vec<SmolStr>,
    members: IndexMap<SmolStr, Vec<Element>>,
    documents: Vec<SmolStr>,
}

/// A [`SymbolIndex`] held entirely in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryIndex {
    root: Option<PathBuf>,
    globals: IndexMap<SmolStr, Vec<Element>>,
    types: IndexMap<SmolStr, TypeRecord>,
    modules: Vec<QueryResult>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = Some(root.into());
    }

    /// Declare a type. Declaring it again adds parents without duplicating them.
    pub fn add_type<S: AsRef<str>>(&mut self, name: &str, parents: impl IntoIterator<Item = S>) {
        let record = self.types.entry(name.into()).or_default();
        for parent in parents {
            let parent = SmolStr::from(parent.as_ref());
            if !record.parents.contains(&parent) {
                record.parents.push(parent);
            }
        }
    }

    pub fn add_type_document(&mut self, name: &str, document: impl Into<SmolStr>) {
        self.types
            .entry(name.into())
            .or_default()
            .documents
            .push(document.into());
    }

    /// Add a member to its owning type, declaring the type if needed.
    pub fn add_member(&mut self, element: impl Into<Element>) {
        let element = element.into();
        let record = self.types.entry(element.owning_type().clone()).or_default();
        record
            .members
            .entry(element.name().clone())
            .or_default()
            .push(element);
    }

    /// Add a global. Globals are also members of [`WINDOW_TYPE`].
    pub fn add_global(&mut self, element: impl Into<Element>) {
        let mut element = element.into();
        element.property_mut().owning_type = WINDOW_TYPE.into();
        self.globals
            .entry(element.name().clone())
            .or_default()
            .push(element.clone());
        self.add_member(element);
    }

    /// Record that `document` defines the module whose generated type is `word`.
    pub fn add_module(&mut self, word: impl Into<SmolStr>, document: impl Into<SmolStr>) {
        let word = word.into();
        let document = document.into();
        match self.modules.iter_mut().find(|module| module.word == word) {
            Some(module) => module.documents.push(document),
            None => self.modules.push(QueryResult {
                word,
                documents: vec![document],
            }),
        }
    }

    /// Fold another index into this one. The other root wins if set.
    pub fn merge(&mut self, other: MemoryIndex) {
        if other.root.is_some() {
            self.root = other.root;
        }
        for (_, elements) in other.globals {
            for element in elements {
                self.add_global(element);
            }
        }
        for (name, record) in other.types {
            self.add_type(&name, &record.parents);
            for document in record.documents {
                self.add_type_document(&name, document);
            }
            for element in record.members.into_values().flatten() {
                if element.owning_type() != WINDOW_TYPE {
                    self.add_member(element);
                }
            }
        }
        for module in other.modules {
            for document in module.documents {
                self.add_module(module.word.clone(), document);
            }
        }
    }
}

fn document_file_name(document: &str) -> &str {
    document.rsplit('/').next().unwrap_or(document)
}

impl SymbolIndex for MemoryIndex {
    fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn globals(&self, file_name: &str, name: &str) -> Vec<Element> {
        let Some(elements) = self.globals.get(name) else {
            return Vec::new();
        };
        let (local, other): (Vec<&Element>, Vec<&Element>) =
            elements.iter().partition(|element| {
                element
                    .property()
                    .documents
                    .iter()
                    .any(|doc| document_file_name(doc) == file_name)
            });
        local.into_iter().chain(other).cloned().collect()
    }

    fn type_members(&self, type_name: &str, member: &str) -> Vec<Element> {
        self.types
            .get(type_name)
            .and_then(|record| record.members.get(member))
            .cloned()
            .unwrap_or_default()
    }

    fn type_parents(&self, type_name: &str) -> Vec<SmolStr> {
        self.types
            .get(type_name)
            .map(|record| record.parents.clone())
            .unwrap_or_default()
    }

    fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    fn query(&self, categories: &[Category], pattern: &str, mode: MatchMode) -> Vec<QueryResult> {
        let matcher = match mode {
            MatchMode::Pattern => match Glob::new(pattern) {
                Ok(glob) => Some(glob.compile_matcher()),
                Err(err) => {
                    log::warn!("invalid index query pattern `{pattern}`: {err}");
                    return Vec::new();
                }
            },
            _ => None,
        };
        let matches = |word: &str| match mode {
            MatchMode::Exact => word == pattern,
            MatchMode::Prefix => word.starts_with(pattern),
            MatchMode::Pattern => matcher.as_ref().is_some_and(|m| m.is_match(word)),
        };

        let mut results = Vec::new();
        for category in categories {
            match category {
                Category::Type => results.extend(
                    self.types
                        .iter()
                        .filter(|(name, _)| matches(name.as_str()))
                        .map(|(name, record)| QueryResult {
                            word: name.clone(),
                            documents: record.documents.clone(),
                        }),
                ),
                Category::Global => results.extend(
                    self.globals
                        .iter()
                        .filter(|(name, _)| matches(name.as_str()))
                        .map(|(name, elements)| QueryResult {
                            word: name.clone(),
                            documents: elements
                                .iter()
                                .flat_map(|element| element.property().documents.iter().cloned())
                                .collect(),
                        }),
                ),
                Category::ModuleDefinition => results.extend(
                    self.modules
                        .iter()
                        .filter(|module| matches(module.word.as_str()))
                        .cloned(),
                ),
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.add_type("Array", ["Object"]);
        index.add_member(PropertyElement::new("length", "Array").with_types(["Number"]));
        index.add_global(PropertyElement::new("document", "").with_types(["Document"]));
        index.add_global(
            PropertyElement::new("helper", "")
                .with_types(["String"])
                .with_document("file:///proj/a.js"),
        );
        index.add_global(
            PropertyElement::new("helper", "")
                .with_types(["Number"])
                .with_document("file:///proj/b.js"),
        );
        index.add_module("mod$0", "file:///proj/lib/util.js");
        index
    }

    #[test]
    fn globals_prefer_current_file() {
        let index = fixture();
        let helpers = index.globals("b.js", "helper");
        assert_eq!(helpers.len(), 2);
        assert_eq!(helpers[0].type_names(), ["Number"]);
        assert_eq!(helpers[0].owning_type(), WINDOW_TYPE);
        assert!(index.globals("b.js", "missing").is_empty());
    }

    #[test]
    fn members_and_parents() {
        let index = fixture();
        assert_eq!(index.type_members("Array", "length").len(), 1);
        assert_eq!(index.type_parents("Array"), ["Object"]);
        assert!(index.has_type(WINDOW_TYPE));
        assert!(!index.has_type("Nope"));
    }

    #[test]
    fn query_modes() {
        let index = fixture();
        let all = index.query(&[Category::ModuleDefinition], "*", MatchMode::Pattern);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].documents, ["file:///proj/lib/util.js"]);

        let types = index.query(&[Category::Type], "Arr", MatchMode::Prefix);
        assert_eq!(types.len(), 1);
        assert!(index.query(&[Category::Global], "doc", MatchMode::Exact).is_empty());
        assert!(index.query(&[Category::Global], "[", MatchMode::Pattern).is_empty());
    }

    #[test]
    fn function_signature() {
        let mut function = FunctionElement::new(PropertyElement::new("f", "Window"));
        function.parameters.push(ParameterElement::new("a"));
        function.parameters.push(ParameterElement {
            name: "b".into(),
            types: vec!["String".into(), "Number".into()],
        });
        function.return_types.push("Boolean".into());
        let element = Element::from(function);

        assert_eq!(element.signature_types(), ["Function(Object,String|Number):Boolean"]);
    }

    #[test]
    fn uri_of_path() {
        assert_eq!(file_uri(Path::new("/a/b.js")), "file:///a/b.js");
        assert_eq!(document_file_name("file:///a/b.js"), "b.js");
    }
}
