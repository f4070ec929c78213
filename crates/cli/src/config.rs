// ==============================================================================
// jsinfer.toml Configuration
// ==============================================================================
//
// Discovers and loads the project configuration:
// - index files to load (relative to jsinfer.toml, additive to CLI `--index`)
// - the index root, which bounds `node_modules` lookups
// - type renames applied to member lookups and documented parameters
//
// Example jsinfer.toml:
//
// ```toml
// index = ["./index/browser.toml", "./index/jquery.toml"]
// root = "."
//
// [type_map]
// Element = "HTMLElement"
// ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use js_infer::MemoryIndex;
use js_ty::TypeMapper;
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::index_file::{load_index_file, IndexFileError};

pub const CONFIG_FILE: &str = "jsinfer.toml";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    #[diagnostic(code(jsinfer::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}", path.display())]
    #[diagnostic(code(jsinfer::config::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexFileError),
}

/// Top-level `jsinfer.toml` configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsInferConfig {
    /// Index files, relative to the config file.
    #[serde(default)]
    pub index: Vec<String>,

    /// Index root, relative to the config file. Defaults to its directory.
    pub root: Option<String>,

    /// Type renames, e.g. `Element = "HTMLElement"`.
    #[serde(default)]
    pub type_map: BTreeMap<String, String>,
}

/// Everything inference needs besides the file itself.
#[derive(Debug, Default)]
pub struct Project {
    pub index: MemoryIndex,
    pub type_map: TypeMapper,
}

/// Walk up from `start_dir` looking for `jsinfer.toml`. Returns the first match.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir;
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

pub fn load_config(path: &Path) -> Result<JsInferConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the project for `file`: the explicit config if given, otherwise the
/// nearest `jsinfer.toml` above the file, plus any extra index files.
pub fn load_project(
    config_path: Option<&Path>,
    extra_indexes: &[PathBuf],
    file: &Path,
) -> Result<Project, ConfigError> {
    let config_path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => file.parent().and_then(find_config),
    };

    let mut project = Project::default();

    if let Some(config_path) = config_path {
        log::debug!("using config {}", config_path.display());
        let config = load_config(&config_path)?;
        let config_dir = config_path.parent().unwrap_or(Path::new("."));

        for index in &config.index {
            project.index.merge(load_index_file(&config_dir.join(index))?);
        }
        let root = match &config.root {
            Some(root) => config_dir.join(root),
            None => config_dir.to_path_buf(),
        };
        project.index.set_root(root);

        for (from, to) in &config.type_map {
            project.type_map.insert(from, to);
        }
    }

    for index in extra_indexes {
        project.index.merge(load_index_file(index)?);
    }

    Ok(project)
}
