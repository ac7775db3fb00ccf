//! Bucket priority structure keyed by small integer scores.
//!
//! Goals
//! - Direct addressing: bucket `k` holds every entry whose key is `k`.
//! - O(1) insert (prepend to the bucket chain).
//! - Cut by identity from a known key, O(chain length).
//! - One-shot drain in ascending key order.
//!
//! Notes
//! - Entries live in an arena; chains link arena slots by index, so the
//!   dedup index can hold an [`EntryId`] instead of a pointer.
//! - The bucket array is split into fixed-width slices allocated on first
//!   touch. Addressing stays O(1) while memory follows the keys in use.
//! - Within a bucket, drain emits the most recently inserted entry first.

use thiserror::Error;
use tracing::trace;

use crate::core::ranking::Score;

/// Buckets per lazily allocated slice.
const SLICE_WIDTH: usize = 1024;

/// End-of-chain marker.
const NIL: u32 = u32::MAX;

/// What happens when a key is larger than `max_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy
{
    /// Refuse the insert with [`RankSorterError::KeyOutOfRange`].
    Reject,
    /// Store the entry in the `max_key` bucket.
    #[default]
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankSorterError
{
    #[error("key {key} exceeds max key {max_key}")]
    KeyOutOfRange
    {
        key: Score,
        max_key: Score,
    },
}

/// Stable identity of an entry for the lifetime of the sorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u32);

/// Where an insert landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement
{
    pub id: EntryId,
    /// Bucket the entry now lives in; differs from the requested key when
    /// the clamp policy kicked in.
    pub key: Score,
}

/// An entry unlinked by [`RankSorter::cut`], waiting to be reinserted.
#[must_use = "a cut entry is lost unless it is reinserted"]
#[derive(Debug)]
pub struct CutEntry
{
    id: EntryId,
}

impl CutEntry
{
    pub fn id(&self) -> EntryId
    {
        self.id
    }
}

#[derive(Debug)]
struct Slot<T>
{
    key: Score,
    next: u32,
    value: Option<T>,
}

/// Mutable-priority container for integer keys in `0..=max_key`.
#[derive(Debug)]
pub struct RankSorter<T>
{
    max_key: Score,
    policy: OverflowPolicy,
    slices: Vec<Option<Box<[u32]>>>,
    slots: Vec<Slot<T>>,
    size: usize,
}

impl<T> RankSorter<T>
{
    /// Create a sorter accepting keys up to and including `max_key`.
    pub fn new(
        max_key: Score,
        policy: OverflowPolicy,
    ) -> Self
    {
        let slice_count = max_key as usize / SLICE_WIDTH + 1;
        let mut slices = Vec::with_capacity(slice_count);
        slices.resize_with(slice_count, || None);

        Self { max_key, policy, slices, slots: Vec::new(), size: 0 }
    }

    /// Size a sorter for a log of `len` lines: `len * factor`, never below
    /// `floor`.
    pub fn for_log_len(
        len: usize,
        factor: Score,
        floor: Score,
        policy: OverflowPolicy,
    ) -> Self
    {
        let estimate = (len as u64)
            .saturating_mul(u64::from(factor))
            .max(u64::from(floor))
            .min(u64::from(Score::MAX));

        // Bounded by Score::MAX above
        Self::new(estimate as Score, policy)
    }

    pub fn max_key(&self) -> Score
    {
        self.max_key
    }

    pub fn policy(&self) -> OverflowPolicy
    {
        self.policy
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize
    {
        self.size
    }

    pub fn is_empty(&self) -> bool
    {
        self.size == 0
    }

    /// Insert a new value at `key`.
    pub fn insert(
        &mut self,
        key: Score,
        value: T,
    ) -> Result<Placement, RankSorterError>
    {
        let resident = self.resident_key(key)?;

        let raw = match u32::try_from(self.slots.len())
        {
            Ok(raw) if raw != NIL => raw,
            _ => panic!("rank sorter arena exhausted"),
        };
        self.slots
            .push(Slot { key: resident, next: NIL, value: Some(value) });

        let id = EntryId(raw);
        self.link(resident, id);

        Ok(Placement { id, key: resident })
    }

    /// Unlink entry `id` from bucket `key`.
    ///
    /// Returns `None` when the entry is not resident at `key`; the caller
    /// passed a stale key.
    pub fn cut(
        &mut self,
        key: Score,
        id: EntryId,
    ) -> Option<CutEntry>
    {
        if key > self.max_key
        {
            return None;
        }

        let (slice, offset) = split_key(key);
        let buckets = self.slices[slice].as_mut()?;

        let mut prev = NIL;
        let mut cur = buckets[offset];
        while cur != NIL
        {
            let next = self.slots[cur as usize].next;
            if cur == id.0
            {
                if prev == NIL
                {
                    buckets[offset] = next;
                }
                else
                {
                    self.slots[prev as usize].next = next;
                }
                self.slots[cur as usize].next = NIL;
                self.size -= 1;
                return Some(CutEntry { id });
            }
            prev = cur;
            cur = next;
        }

        None
    }

    /// Put a cut entry back at `key`. Returns the resident key.
    ///
    /// Under [`OverflowPolicy::Reject`] an oversized key drops the entry:
    /// it stays in the arena but is never drained.
    pub fn reinsert(
        &mut self,
        key: Score,
        entry: CutEntry,
    ) -> Result<Score, RankSorterError>
    {
        let resident = self.resident_key(key)?;
        self.slots[entry.id.0 as usize].key = resident;
        self.link(resident, entry.id);
        Ok(resident)
    }

    pub fn get(
        &self,
        id: EntryId,
    ) -> Option<&T>
    {
        self.slots
            .get(id.0 as usize)
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(
        &mut self,
        id: EntryId,
    ) -> Option<&mut T>
    {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(|s| s.value.as_mut())
    }

    /// Remove every resident entry in ascending key order.
    ///
    /// Consumes the sorter; build a new one for the next scan.
    pub fn drain(mut self) -> Vec<(Score, T)>
    {
        let mut order = Vec::with_capacity(self.size);

        for buckets in self
            .slices
            .iter()
            .flatten()
        {
            for &head in buckets.iter()
            {
                let mut cur = head;
                while cur != NIL
                {
                    order.push(cur);
                    cur = self.slots[cur as usize].next;
                }
            }
        }

        order
            .into_iter()
            .filter_map(|raw| {
                let slot = &mut self.slots[raw as usize];
                slot.value
                    .take()
                    .map(|v| (slot.key, v))
            })
            .collect()
    }

    fn resident_key(
        &self,
        key: Score,
    ) -> Result<Score, RankSorterError>
    {
        if key <= self.max_key
        {
            return Ok(key);
        }

        match self.policy
        {
            OverflowPolicy::Reject =>
            {
                Err(RankSorterError::KeyOutOfRange { key, max_key: self.max_key })
            }
            OverflowPolicy::Clamp =>
            {
                trace!(key, max_key = self.max_key, "clamping oversized key");
                Ok(self.max_key)
            }
        }
    }

    fn link(
        &mut self,
        key: Score,
        id: EntryId,
    )
    {
        let (slice, offset) = split_key(key);
        let buckets = self.slices[slice]
            .get_or_insert_with(|| vec![NIL; SLICE_WIDTH].into_boxed_slice());

        self.slots[id.0 as usize].next = buckets[offset];
        buckets[offset] = id.0;
        self.size += 1;
    }
}

fn split_key(key: Score) -> (usize, usize)
{
    let k = key as usize;
    (k / SLICE_WIDTH, k % SLICE_WIDTH)
}
