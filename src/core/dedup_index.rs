//! String-keyed deduplication index and exclusion set.

use std::collections::{HashMap, hash_map::Entry};

use ahash::RandomState;

/// Maps a command line to a value (usually a handle into the rank sorter).
///
/// Each text is mapped at most once; re-inserting an existing text is an
/// invariant violation. No iteration order is guaranteed.
#[derive(Debug, Clone)]
pub struct DedupIndex<V>
{
    map: HashMap<Box<str>, V, RandomState>,
}

impl<V> Default for DedupIndex<V>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<V> DedupIndex<V>
{
    pub fn new() -> Self
    {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self
    {
        Self { map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()) }
    }

    /// Look up the value mapped to `text`.
    pub fn get(
        &self,
        text: &str,
    ) -> Option<&V>
    {
        self.map
            .get(text)
    }

    pub fn get_mut(
        &mut self,
        text: &str,
    ) -> Option<&mut V>
    {
        self.map
            .get_mut(text)
    }

    pub fn contains(
        &self,
        text: &str,
    ) -> bool
    {
        self.map
            .contains_key(text)
    }

    /// Map `text` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `text` is already mapped.
    pub fn insert(
        &mut self,
        text: &str,
        value: V,
    )
    {
        match self
            .map
            .entry(text.into())
        {
            Entry::Occupied(_) => panic!("dedup index already contains {text:?}"),
            Entry::Vacant(slot) =>
            {
                slot.insert(value);
            }
        }
    }

    pub fn len(&self) -> usize
    {
        self.map
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.map
            .is_empty()
    }
}

/// Literal command lines that never take part in ranking.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet
{
    inner: DedupIndex<()>,
}

impl ExclusionSet
{
    /// Build the set. Duplicate strings in `commands` are collapsed.
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = DedupIndex::new();
        for cmd in commands
        {
            let cmd = cmd.as_ref();
            if !inner.contains(cmd)
            {
                inner.insert(cmd, ());
            }
        }
        Self { inner }
    }

    /// Exact, case-sensitive match.
    pub fn contains(
        &self,
        text: &str,
    ) -> bool
    {
        self.inner
            .contains(text)
    }

    pub fn len(&self) -> usize
    {
        self.inner
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.inner
            .is_empty()
    }
}
