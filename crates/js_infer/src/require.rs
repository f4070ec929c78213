use std::{
    ffi::OsString,
    path::{Component, Path, PathBuf},
};

use thiserror::Error;

/// Maps the argument of `require(...)` to the file it loads.
pub trait ModuleResolver {
    fn resolve(&self, id: &str, current_dir: &Path, index_root: Option<&Path>) -> Option<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("empty module id")]
    EmptyId,

    #[error("no file or directory module `{id}` relative to {}", dir.display())]
    NotFound { id: String, dir: PathBuf },

    #[error("`{id}` is not installed in any node_modules above {}", dir.display())]
    NotInstalled { id: String, dir: PathBuf },
}

/// Node's `require` lookup: relative and absolute ids load a file or
/// directory module, bare ids search `node_modules` directories from the
/// current directory up to the index root.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeModuleResolver;

pub static NODE_RESOLVER: NodeModuleResolver = NodeModuleResolver;

const NODE_MODULES: &str = "node_modules";

impl NodeModuleResolver {
    pub fn try_resolve(
        &self,
        id: &str,
        current_dir: &Path,
        index_root: Option<&Path>,
    ) -> Result<PathBuf, ResolveError> {
        if id.is_empty() {
            return Err(ResolveError::EmptyId);
        }

        if id.starts_with("./") || id.starts_with("../") || id.starts_with('/') {
            let target = normalize(&current_dir.join(id));
            return load_file_or_directory(&target).ok_or_else(|| ResolveError::NotFound {
                id: id.into(),
                dir: current_dir.to_path_buf(),
            });
        }

        let root = index_root.map(normalize);
        let mut dir = Some(normalize(current_dir));
        while let Some(current) = dir {
            let candidate = current.join(NODE_MODULES).join(id);
            if let Some(found) = load_file_or_directory(&normalize(&candidate)) {
                return Ok(found);
            }
            if root.as_deref() == Some(current.as_path()) {
                break;
            }
            dir = current.parent().map(Path::to_path_buf);
        }

        Err(ResolveError::NotInstalled {
            id: id.into(),
            dir: current_dir.to_path_buf(),
        })
    }
}

impl ModuleResolver for NodeModuleResolver {
    fn resolve(&self, id: &str, current_dir: &Path, index_root: Option<&Path>) -> Option<PathBuf> {
        match self.try_resolve(id, current_dir, index_root) {
            Ok(path) => Some(path),
            Err(err) => {
                log::debug!("require: {err}");
                None
            }
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    raw.into()
}

fn load_file_or_directory(path: &Path) -> Option<PathBuf> {
    [
        path.to_path_buf(),
        with_suffix(path, ".js"),
        with_suffix(path, ".json"),
        path.join("index.js"),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
