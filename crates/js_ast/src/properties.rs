use std::collections::BTreeMap;

use smol_str::{format_smolstr, SmolStr};

use crate::{Module, Node, NodeId};

/// Every value assigned to a name, plus the values of its assigned
/// sub-properties. `foo = {}; foo.bar = 1` gives `foo` one value and a `bar`
/// property with one value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PropertyCollection {
    qualified_name: SmolStr,
    values: Vec<NodeId>,
    properties: BTreeMap<SmolStr, PropertyCollection>,
}

impl PropertyCollection {
    pub fn named(qualified_name: impl Into<SmolStr>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            ..Self::default()
        }
    }

    /// Dotted path from the owning symbol, e.g. `foo.bar`.
    pub fn qualified_name(&self) -> &SmolStr {
        &self.qualified_name
    }

    /// Values in the order they were collected.
    pub fn values(&self) -> &[NodeId] {
        &self.values
    }

    pub fn properties(&self) -> &BTreeMap<SmolStr, PropertyCollection> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyCollection> {
        self.properties.get(name)
    }

    /// The named sub-property, created on first use.
    pub fn property_mut(&mut self, name: &str) -> &mut PropertyCollection {
        let qualified_name = if self.qualified_name.is_empty() {
            SmolStr::from(name)
        } else {
            format_smolstr!("{}.{name}", self.qualified_name)
        };
        self.properties
            .entry(name.into())
            .or_insert_with(|| PropertyCollection::named(qualified_name))
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    pub fn add_value(&mut self, value: NodeId) {
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }
}

/// Collect the name/value pairs of an object literal, recursing into nested
/// literals so `{a: {b: 1}}` yields an `a` property with a `b` property.
pub fn collect_object_literal(module: &Module, node: NodeId) -> PropertyCollection {
    let mut collection = PropertyCollection::default();
    collect_into(module, node, &mut collection);
    collection
}

fn collect_into(module: &Module, node: NodeId, collection: &mut PropertyCollection) {
    collection.add_value(node);

    let Node::Object(pairs) = &module[node] else {
        return;
    };
    for &pair in pairs.iter() {
        let Node::NameValuePair { key, value } = &module[pair] else {
            continue;
        };
        let property = collection.property_mut(key);
        match &module[*value] {
            Node::Object(_) => collect_into(module, *value, property),
            _ => property.add_value(*value),
        }
    }
}
