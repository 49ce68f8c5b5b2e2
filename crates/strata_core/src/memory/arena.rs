//! # Arena Allocator
//!
//! A growable bump allocator for variable-size records keyed by logical id.
//!
//! ```text
//! | rec A | hole | rec C | rec D |  free ->            |
//! ^ start                        ^ free pointer       ^ capacity
//! ```
//!
//! - Insert bumps the free pointer. O(1), doubling the buffer on overflow.
//! - Removing the last record moves the free pointer back.
//! - Removing any other record leaves a hole that is only reclaimed by
//!   [`Arena::defragment`].
//! - Zero-size records all sit at offset 0 and take no space.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use crate::config::ArenaConfig;
use crate::error::{StrataError, StrataResult};

/// Position of a record inside an arena buffer.
///
/// Offsets are relative to the start of the buffer, so growth never
/// invalidates them. Compaction is the only operation that moves a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    /// Byte offset from the start of the buffer.
    pub offset: usize,
    /// Length of the record in bytes.
    pub len: usize,
}

impl Location {
    /// Where every zero-size record lives. It never extends past the free
    /// pointer, so tail reclaim cannot strand it.
    pub const EMPTY: Self = Self::new(0, 0);

    /// Creates a new location.
    #[inline]
    #[must_use]
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// One past the last byte of the record.
    #[inline]
    #[must_use]
    pub const fn end(self) -> usize {
        self.offset + self.len
    }

    /// Byte range covered by the record.
    #[inline]
    #[must_use]
    pub const fn range(self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// Report of a buffer growth.
///
/// Locations are buffer-relative, so no outstanding location needs patching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Growth {
    /// Capacity before the resize.
    pub old_capacity: usize,
    /// Capacity after the resize.
    pub new_capacity: usize,
}

/// New location of every live record after a compaction.
pub type Relocations<K> = HashMap<K, Location>;

/// Snapshot of arena occupancy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArenaStats {
    /// Buffer capacity in bytes.
    pub capacity: usize,
    /// Bytes below the free pointer (live records plus holes).
    pub used: usize,
    /// Sum of live record sizes.
    pub live_bytes: usize,
    /// Bytes lost to holes since the last compaction.
    pub hole_bytes: usize,
    /// Number of live records.
    pub records: usize,
}

impl ArenaStats {
    /// Returns the hole ratio (0.0 to 1.0).
    #[must_use]
    pub fn fragmentation(&self) -> f32 {
        if self.capacity == 0 {
            0.0
        } else {
            self.hole_bytes as f32 / self.capacity as f32
        }
    }
}

/// A growable, self-compacting byte arena.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. It is owned by exactly one container.
///
/// # Example
///
/// ```rust
/// use strata_core::Arena;
///
/// let mut arena: Arena<u32> = Arena::new(16, 0.1);
/// let at = arena.insert(7, &[1, 2, 3, 4]).unwrap();
/// assert_eq!(arena.slice(at), Some(&[1u8, 2, 3, 4][..]));
///
/// arena.remove(7).unwrap();
/// assert!(arena.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct Arena<K> {
    /// Backing bytes. `storage.len()` is the capacity.
    storage: Vec<u8>,
    /// Offset of the free pointer.
    free: usize,
    /// Logical id -> record location.
    records: HashMap<K, Location>,
    /// Hole ratio that triggers compaction.
    threshold: f32,
    /// Bytes lost to holes since the last compaction.
    hole_bytes: usize,
}

impl<K: Copy + Eq + Hash> Arena<K> {
    /// Creates an arena with `capacity` zeroed bytes.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize, threshold: f32) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            storage: vec![0u8; capacity],
            free: 0,
            records: HashMap::new(),
            threshold,
            hole_bytes: 0,
        }
    }

    /// Creates an arena from a validated config.
    #[must_use]
    pub fn from_config(config: &ArenaConfig) -> Self {
        Self::new(config.initial_capacity, config.fragmentation_threshold)
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the offset of the free pointer.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.free
    }

    /// Returns the headroom above the free pointer.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.free
    }

    /// Returns the bytes currently lost to holes.
    #[inline]
    #[must_use]
    pub const fn hole_bytes(&self) -> usize {
        self.hole_bytes
    }

    /// Returns the compaction threshold.
    #[inline]
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Returns the number of live records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Checks if the arena holds no records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of live record sizes.
    #[must_use]
    pub fn live_bytes(&self) -> usize {
        self.records.values().map(|location| location.len).sum()
    }

    /// Returns `hole bytes / capacity`.
    #[must_use]
    pub fn fragmentation(&self) -> f32 {
        self.hole_bytes as f32 / self.capacity() as f32
    }

    /// Checks whether a record exists. O(1).
    #[inline]
    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.records.contains_key(&id)
    }

    /// Returns the current location of a record.
    #[inline]
    #[must_use]
    pub fn location(&self, id: K) -> Option<Location> {
        self.records.get(&id).copied()
    }

    /// Returns the bytes of a record.
    #[must_use]
    pub fn get(&self, id: K) -> Option<&[u8]> {
        self.location(id).and_then(|location| self.slice(location))
    }

    /// Resolves a location against the current buffer.
    #[inline]
    #[must_use]
    pub fn slice(&self, location: Location) -> Option<&[u8]> {
        if location.end() > self.free {
            return None;
        }
        self.storage.get(location.range())
    }

    /// Mutable variant of [`Arena::slice`].
    #[inline]
    pub fn slice_mut(&mut self, location: Location) -> Option<&mut [u8]> {
        if location.end() > self.free {
            return None;
        }
        self.storage.get_mut(location.range())
    }

    /// Returns the occupied part of the buffer, holes included.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.storage[..self.free]
    }

    /// Iterates over live records in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (K, Location)> + '_ {
        self.records.iter().map(|(id, location)| (*id, *location))
    }

    /// Returns live records sorted by offset.
    #[must_use]
    pub fn ordered(&self) -> Vec<(K, Location)> {
        let mut records: Vec<(K, Location)> = self.iter().collect();
        records.sort_by_key(|(_, location)| location.offset);
        records
    }

    /// Copies `bytes` into a fresh record at the free pointer.
    ///
    /// Grows the buffer first if the record does not fit.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::DuplicateRecord`] if `id` is already present.
    pub fn insert(&mut self, id: K, bytes: &[u8]) -> StrataResult<Location> {
        let location = self.reserve(id, bytes.len())?;
        self.storage[location.range()].copy_from_slice(bytes);
        Ok(location)
    }

    /// Reserves `size` zeroed bytes for a record without writing content.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::DuplicateRecord`] if `id` is already present.
    pub fn reserve(&mut self, id: K, size: usize) -> StrataResult<Location> {
        if self.records.contains_key(&id) {
            return Err(StrataError::DuplicateRecord);
        }
        while self.free + size > self.capacity() {
            self.resize();
        }

        if size == 0 {
            self.records.insert(id, Location::EMPTY);
            return Ok(Location::EMPTY);
        }

        let location = Location::new(self.free, size);
        // Space below a retracted free pointer may hold stale bytes.
        self.storage[location.range()].fill(0);
        self.records.insert(id, location);
        self.free = location.end();
        Ok(location)
    }

    /// Overwrites a record in place.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownRecord`] if `id` is absent and
    /// [`StrataError::SizeMismatch`] if the payload size differs.
    pub fn write(&mut self, id: K, bytes: &[u8]) -> StrataResult<()> {
        let location = self.location(id).ok_or(StrataError::UnknownRecord)?;
        if location.len != bytes.len() {
            return Err(StrataError::SizeMismatch {
                expected: location.len,
                actual: bytes.len(),
            });
        }
        self.storage[location.range()].copy_from_slice(bytes);
        Ok(())
    }

    /// Doubles the capacity, preserving content.
    pub fn resize(&mut self) -> Growth {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity * 2;
        self.storage.resize(new_capacity, 0);
        tracing::debug!(old_capacity, new_capacity, "arena grown");
        Growth {
            old_capacity,
            new_capacity,
        }
    }

    /// Removes a record.
    ///
    /// The bytes are not erased. If the record abuts the free pointer its
    /// space is reclaimed immediately, otherwise it becomes a hole.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownRecord`] if `id` is absent.
    pub fn remove(&mut self, id: K) -> StrataResult<Location> {
        let location = self
            .records
            .remove(&id)
            .ok_or(StrataError::UnknownRecord)?;
        if location.end() == self.free {
            self.free = location.offset;
        } else {
            self.hole_bytes += location.len;
        }
        Ok(location)
    }

    /// Copies a record out and removes it.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::UnknownRecord`] if `id` is absent.
    pub fn take(&mut self, id: K) -> StrataResult<Vec<u8>> {
        let bytes = self.get(id).ok_or(StrataError::UnknownRecord)?.to_vec();
        self.remove(id)?;
        Ok(bytes)
    }

    /// Rewrites every live record into a fresh hole-free buffer.
    ///
    /// Relative order is preserved. Callers must apply the returned
    /// relocations to their handles before resolving any location again.
    pub fn defragment(&mut self) -> Relocations<K> {
        let live = self.ordered();
        let mut compacted = vec![0u8; self.capacity()];
        let mut relocations = HashMap::with_capacity(live.len());
        let mut cursor = 0;

        for (id, old) in live {
            let new = if old.len == 0 {
                Location::EMPTY
            } else {
                Location::new(cursor, old.len)
            };
            compacted[new.range()].copy_from_slice(&self.storage[old.range()]);
            self.records.insert(id, new);
            relocations.insert(id, new);
            cursor = new.end();
        }

        let reclaimed = self.free - cursor;
        self.storage = compacted;
        self.free = cursor;
        self.hole_bytes = 0;
        tracing::debug!(records = relocations.len(), reclaimed, "arena defragmented");
        relocations
    }

    /// Checks whether the hole ratio exceeds the threshold.
    #[inline]
    #[must_use]
    pub fn needs_defragment(&self) -> bool {
        self.fragmentation() > self.threshold
    }

    /// Runs [`Arena::defragment`] only when the threshold is exceeded.
    ///
    /// Safe to call repeatedly: right after a compaction the hole ratio is 0.
    pub fn defragment_if_needed(&mut self) -> Option<Relocations<K>> {
        if self.needs_defragment() {
            Some(self.defragment())
        } else {
            None
        }
    }

    /// Returns an occupancy snapshot.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            capacity: self.capacity(),
            used: self.free,
            live_bytes: self.live_bytes(),
            hole_bytes: self.hole_bytes,
            records: self.len(),
        }
    }
}
