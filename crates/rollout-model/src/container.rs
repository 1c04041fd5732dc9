use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of leading characters of a runtime id shown in logs.
pub const SHORT_ID_LEN: usize = 10;

/// Display form of a runtime identifier: its first [`SHORT_ID_LEN`] characters.
///
/// Only ever used for log output, never to address a container.
pub fn short_id(runtime_id: &str) -> &str {
    match runtime_id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &runtime_id[..idx],
        None => runtime_id,
    }
}

/// A container of the stack as resolved by discovery.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRef {
    /// Engine display name without the leading `/`.
    pub logical_name: String,
    /// Engine-assigned identifier.
    pub runtime_id: String,
}

impl ContainerRef {
    /// Build a reference, stripping one leading `/` from the engine-reported name.
    pub fn new(logical_name: impl AsRef<str>, runtime_id: impl Into<String>) -> Self {
        let name = logical_name.as_ref().trim();
        Self {
            logical_name: name.strip_prefix('/').unwrap_or(name).to_string(),
            runtime_id: runtime_id.into(),
        }
    }

    #[inline]
    pub fn short_id(&self) -> &str {
        short_id(&self.runtime_id)
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.logical_name, self.short_id())
    }
}

/// The containers of one stack, in listing order, unique by runtime id.
///
/// Serialized as a plain list; deserializing goes through [`insert`](Self::insert).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ContainerRef>", into = "Vec<ContainerRef>")]
pub struct ContainerSet {
    items: Vec<ContainerRef>,
}

impl ContainerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a container. Returns `false` (and keeps the first entry) when the runtime id is
    /// already present.
    pub fn insert(&mut self, container: ContainerRef) -> bool {
        if self
            .items
            .iter()
            .any(|c| c.runtime_id == container.runtime_id)
        {
            return false;
        }
        self.items.push(container);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContainerRef> {
        self.items.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look a container up by its logical name.
    pub fn get(&self, logical_name: &str) -> Option<&ContainerRef> {
        self.items.iter().find(|c| c.logical_name == logical_name)
    }

    /// Logical name to runtime id view.
    pub fn as_map(&self) -> BTreeMap<&str, &str> {
        self.items
            .iter()
            .map(|c| (c.logical_name.as_str(), c.runtime_id.as_str()))
            .collect()
    }
}

impl FromIterator<ContainerRef> for ContainerSet {
    fn from_iter<I: IntoIterator<Item = ContainerRef>>(iter: I) -> Self {
        let mut set = ContainerSet::new();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl From<Vec<ContainerRef>> for ContainerSet {
    fn from(items: Vec<ContainerRef>) -> Self {
        items.into_iter().collect()
    }
}

impl From<ContainerSet> for Vec<ContainerRef> {
    fn from(set: ContainerSet) -> Self {
        set.items
    }
}

impl<'a> IntoIterator for &'a ContainerSet {
    type Item = &'a ContainerRef;
    type IntoIter = std::slice::Iter<'a, ContainerRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
