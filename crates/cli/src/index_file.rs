// ==============================================================================
// TOML index files
// ==============================================================================
//
// Declarations the inferrer can't see in the analyzed file: library globals,
// the members of built-in types and the modules `require` can load.
//
// ```toml
// [[global]]
// name = "$"
// types = ["Function<jQuery>"]
//
// [[global]]
// name = "parseInt"
// params = [{ name = "text", types = ["String"] }]
// returns = ["Number"]
//
// [[type]]
// name = "String"
// parents = ["Object"]
//
// [[type.member]]
// name = "length"
// types = ["Number"]
//
// [[module]]
// name = "Foo"
// file = "lib/foo.js"
// ```
//
// An entry with `params` or `returns` is a function. Module files are relative
// to the index file.

use std::path::{Path, PathBuf};

use js_infer::{
    file_uri, Element, FunctionElement, MemoryIndex, ParameterElement, PropertyElement,
};
use js_ty::canonical_type_name;
use miette::Diagnostic;
use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IndexFileError {
    #[error("failed to read index file {}", path.display())]
    #[diagnostic(code(jsinfer::index::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid index file {}", path.display())]
    #[diagnostic(code(jsinfer::index::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexFile {
    #[serde(default)]
    pub global: Vec<ElementDef>,
    #[serde(default, rename = "type")]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub module: Vec<ModuleDef>,
}

#[derive(Debug, Deserialize)]
pub struct ElementDef {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    pub params: Option<Vec<ParamDef>>,
    #[serde(default)]
    pub returns: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParamDef {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TypeDef {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub member: Vec<ElementDef>,
}

#[derive(Debug, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    pub file: String,
}

pub fn load_index_file(path: &Path) -> Result<MemoryIndex, IndexFileError> {
    let read_error = |source| IndexFileError::Read {
        path: path.to_path_buf(),
        source,
    };
    // documents must match the canonical paths module resolution produces
    let canonical = path.canonicalize().map_err(read_error)?;
    let contents = std::fs::read_to_string(&canonical).map_err(read_error)?;
    let file: IndexFile = toml::from_str(&contents).map_err(|source| IndexFileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(build_index(file, &canonical))
}

/// Build an index whose records are documented by `path`.
pub fn build_index(file: IndexFile, path: &Path) -> MemoryIndex {
    let document = file_uri(path);
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let mut index = MemoryIndex::new();

    for global in file.global {
        index.add_global(element(global, "", &document));
    }

    for ty in file.types {
        let Some(name) = type_name(&ty.name) else {
            log::warn!("skipping type with invalid name `{}`", ty.name);
            continue;
        };
        index.add_type(&name, canonical_types(&ty.parents));
        index.add_type_document(&name, document.clone());
        for member in ty.member {
            index.add_member(element(member, &name, &document));
        }
    }

    for module in file.module {
        index.add_module(module.name, file_uri(&base_dir.join(&module.file)));
    }

    index
}

fn type_name(raw: &str) -> Option<SmolStr> {
    canonical_type_name(raw)
}

fn canonical_types(raw: &[String]) -> Vec<SmolStr> {
    raw.iter()
        .filter_map(|ty| {
            let canonical = type_name(ty);
            if canonical.is_none() {
                log::warn!("ignoring empty type name `{ty}`");
            }
            canonical
        })
        .collect()
}

fn element(def: ElementDef, owning_type: &str, document: &SmolStr) -> Element {
    let property = PropertyElement::new(def.name, owning_type)
        .with_types(canonical_types(&def.types))
        .with_document(document.clone());

    if def.params.is_none() && def.returns.is_empty() {
        return property.into();
    }

    FunctionElement {
        property,
        parameters: def
            .params
            .unwrap_or_default()
            .into_iter()
            .map(|param| ParameterElement {
                name: param.name.into(),
                types: canonical_types(&param.types),
            })
            .collect(),
        return_types: canonical_types(&def.returns),
    }
    .into()
}
