use derive_more::Debug;
use indexmap::IndexSet;
use smol_str::SmolStr;

use crate::canonical_type_name;

/// The inferrer's accumulator: canonical type names in first-insertion order,
/// without duplicates.
#[derive(Debug, Default, Clone)]
#[debug("{names:?}")]
pub struct TypeList {
    names: IndexSet<SmolStr>,
}

impl TypeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize `raw` and append it unless it is empty or already present.
    /// Returns whether the list grew.
    pub fn add(&mut self, raw: impl AsRef<str>) -> bool {
        match canonical_type_name(raw.as_ref()) {
            Some(name) => self.names.insert(name),
            None => false,
        }
    }

    pub fn extend<I>(&mut self, names: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for name in names {
            self.add(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SmolStr> + '_ {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn into_vec(self) -> Vec<SmolStr> {
        self.names.into_iter().collect()
    }
}

// IndexSet equality ignores order, ours doesn't
impl PartialEq for TypeList {
    fn eq(&self, other: &Self) -> bool {
        self.names.iter().eq(other.names.iter())
    }
}

impl Eq for TypeList {}

impl<S: AsRef<str>> FromIterator<S> for TypeList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut list = TypeList::new();
        list.extend(iter);
        list
    }
}

impl IntoIterator for TypeList {
    type Item = SmolStr;
    type IntoIter = indexmap::set::IntoIter<SmolStr>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

impl<'a> IntoIterator for &'a TypeList {
    type Item = &'a SmolStr;
    type IntoIter = indexmap::set::Iter<'a, SmolStr>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_insertion_order() {
        let mut list = TypeList::new();
        assert!(list.add("Number"));
        assert!(list.add("String"));
        assert!(!list.add("number"));
        assert!(!list.add(" String "));
        assert_eq!(list.into_vec(), ["Number", "String"]);
    }

    #[test]
    fn ignores_empty_names() {
        let mut list = TypeList::new();
        assert!(!list.add(""));
        assert!(!list.add("void"));
        assert!(list.is_empty());
    }

    #[test]
    fn equality_is_ordered() {
        let a: TypeList = ["A", "B"].into_iter().collect();
        let b: TypeList = ["B", "A"].into_iter().collect();
        assert_ne!(a, b);
        assert_eq!(a, ["A", "B", "A"].into_iter().collect());
    }
}
