use std::path::PathBuf;

use dashmap::DashMap;
use salsa::{self, Setter};

#[salsa::input]
pub struct JsFile {
    pub path: PathBuf,
    #[returns(ref)]
    pub contents: String,
}

#[salsa::db]
pub trait AstDb: salsa::Database {}

#[derive(Default, Clone)]
#[salsa::db]
pub struct RootDatabase {
    storage: salsa::Storage<Self>,
    files: DashMap<PathBuf, JsFile>,
}

#[salsa::db]
impl salsa::Database for RootDatabase {}

#[salsa::db]
impl AstDb for RootDatabase {}

impl RootDatabase {
    /// Load a file from disk, reusing the input if the path was read before.
    pub fn read_file(&self, path: PathBuf) -> Result<JsFile, std::io::Error> {
        let path = path.canonicalize()?;

        let file = match self.files.entry(path.clone()) {
            dashmap::Entry::Occupied(entry) => *entry.get(),
            dashmap::Entry::Vacant(entry) => {
                let contents = std::fs::read_to_string(&path)?;
                *entry.insert(JsFile::new(self, path, contents))
            }
        };

        Ok(file)
    }

    /// Create or update a file from in-memory contents.
    pub fn set_file_contents(&mut self, path: PathBuf, contents: String) -> JsFile {
        let existing = self.files.get(&path).map(|entry| *entry.value());

        if let Some(file) = existing {
            file.set_contents(self).to(contents);
            file
        } else {
            let file = JsFile::new(self, path.clone(), contents);
            self.files.insert(path, file);
            file
        }
    }
}
