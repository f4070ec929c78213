use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::canonical_type_name;

/// Project level type renames (`Ti.UI.View` -> `Titanium.UI.View`), applied to
/// documented parameter types and to receivers of property access.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TypeMapper {
    mappings: BTreeMap<SmolStr, SmolStr>,
}

impl TypeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both sides are canonicalized. Entries with an empty side are ignored.
    pub fn insert(&mut self, from: &str, to: &str) {
        match (canonical_type_name(from), canonical_type_name(to)) {
            (Some(from), Some(to)) => {
                self.mappings.insert(from, to);
            }
            _ => log::warn!("ignoring type mapping `{from}` -> `{to}`"),
        }
    }

    pub fn map(&self, name: &str) -> SmolStr {
        self.mappings
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.into())
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for TypeMapper {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut mapper = TypeMapper::new();
        for (from, to) in iter {
            mapper.insert(from.as_ref(), to.as_ref());
        }
        mapper
    }
}
