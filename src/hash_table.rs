//! The raw chained hash table.
//!
//! [`HashTable<K, V>`] stores key-value pairs but does not hash keys itself:
//! every operation takes the key's 32-bit hash and an equality predicate, the
//! same way the keyed [`FishTable`](crate::FishTable) drives it. The bucket
//! array length is always a power of two and the home bucket of a hash is
//! `hash & (len - 1)`.
//!
//! Each bucket stores the head of its chain inline. Only entries that collide
//! with an occupied head are boxed and linked behind it, so a table with no
//! collisions performs no allocation beyond the bucket array.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem;

use crate::error::Error;
use crate::error::invariant_violation;

const OCCUPIED_BUT_EMPTY: &str = "occupied entry points at an empty slot";

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Node<K, V> {
    hash: u32,
    key: K,
    value: V,
    next: Link<K, V>,
}

impl<K, V> Node<K, V> {
    #[inline(always)]
    fn new(hash: u32, key: K, value: V) -> Self {
        Self {
            hash,
            key,
            value,
            next: None,
        }
    }

    #[inline(always)]
    fn matches(&self, hash: u32, eq: &impl Fn(&K) -> bool) -> bool {
        self.hash == hash && eq(&self.key)
    }
}

/// A bucket. An occupied bucket owns the head of its chain by value.
enum Slot<K, V> {
    Unoccupied,
    Occupied(Node<K, V>),
}

impl<K, V> Slot<K, V> {
    #[inline(always)]
    fn head(&self) -> Option<&Node<K, V>> {
        match self {
            Slot::Occupied(head) => Some(head),
            Slot::Unoccupied => None,
        }
    }

    #[inline(always)]
    fn head_mut(&mut self) -> Option<&mut Node<K, V>> {
        match self {
            Slot::Occupied(head) => Some(head),
            Slot::Unoccupied => None,
        }
    }

    #[inline(always)]
    fn fill(&mut self, node: Node<K, V>) -> &mut Node<K, V> {
        *self = Slot::Occupied(node);
        match self {
            Slot::Occupied(head) => head,
            Slot::Unoccupied => invariant_violation("slot is empty right after being filled"),
        }
    }

    /// Detaches the overflow nodes one at a time so that dropping a long
    /// chain never recurses.
    fn unlink_overflow(&mut self) {
        if let Slot::Occupied(head) = self {
            let mut next = head.next.take();
            while let Some(mut node) = next {
                next = node.next.take();
            }
        }
    }

    #[cfg(any(test, feature = "stats"))]
    fn chain_len(&self) -> usize {
        let mut count = 0;
        let mut node = self.head();
        while let Some(n) = node {
            count += 1;
            node = n.next.as_deref();
        }
        count
    }

    fn clone_chain(&self) -> Self
    where
        K: Clone,
        V: Clone,
    {
        let Slot::Occupied(head) = self else {
            return Slot::Unoccupied;
        };

        let mut copy = Node::new(head.hash, head.key.clone(), head.value.clone());
        let mut tail = &mut copy.next;
        let mut source = head.next.as_deref();
        while let Some(node) = source {
            let node_copy = Node::new(node.hash, node.key.clone(), node.value.clone());
            tail = &mut tail.insert(Box::new(node_copy)).next;
            source = node.next.as_deref();
        }

        Slot::Occupied(copy)
    }
}

/// Outcome of comparing one node during a chain walk.
enum Probe {
    End,
    Hit,
    Next,
}

impl Probe {
    #[inline(always)]
    fn of<K, V>(node: Option<&Node<K, V>>, hash: u32, eq: &impl Fn(&K) -> bool) -> Self {
        match node {
            None => Probe::End,
            Some(node) if node.matches(hash, eq) => Probe::Hit,
            Some(_) => Probe::Next,
        }
    }
}

/// The storage location that owns a node: either a bucket (for the chain
/// head) or the `next` link of the previous node.
///
/// For a vacant search result this is where the new node goes: an unoccupied
/// bucket or the empty link at the end of the chain.
enum Place<'a, K, V> {
    Head(&'a mut Slot<K, V>),
    Chain(&'a mut Link<K, V>),
}

impl<'a, K, V> Place<'a, K, V> {
    #[inline(always)]
    fn node(&self) -> &Node<K, V> {
        let node = match self {
            Place::Head(slot) => slot.head(),
            Place::Chain(link) => link.as_deref(),
        };
        node.unwrap_or_else(|| invariant_violation(OCCUPIED_BUT_EMPTY))
    }

    #[inline(always)]
    fn node_mut(&mut self) -> &mut Node<K, V> {
        let node = match self {
            Place::Head(slot) => slot.head_mut(),
            Place::Chain(link) => link.as_deref_mut(),
        };
        node.unwrap_or_else(|| invariant_violation(OCCUPIED_BUT_EMPTY))
    }

    #[inline(always)]
    fn into_node(self) -> &'a mut Node<K, V> {
        let node = match self {
            Place::Head(slot) => slot.head_mut(),
            Place::Chain(link) => link.as_deref_mut(),
        };
        node.unwrap_or_else(|| invariant_violation(OCCUPIED_BUT_EMPTY))
    }

    #[inline(always)]
    fn fill(self, node: Node<K, V>) -> &'a mut Node<K, V> {
        match self {
            Place::Head(slot) => slot.fill(node),
            Place::Chain(link) => &mut **link.insert(Box::new(node)),
        }
    }

    /// Unlinks the node by pulling its successor forward into this place.
    fn take(self) -> Node<K, V> {
        match self {
            Place::Head(slot) => match mem::replace(slot, Slot::Unoccupied) {
                Slot::Occupied(mut node) => {
                    if let Some(next) = node.next.take() {
                        *slot = Slot::Occupied(*next);
                    }
                    node
                }
                Slot::Unoccupied => invariant_violation(OCCUPIED_BUT_EMPTY),
            },
            Place::Chain(link) => match link.take() {
                Some(mut node) => {
                    *link = node.next.take();
                    *node
                }
                None => invariant_violation(OCCUPIED_BUT_EMPTY),
            },
        }
    }
}

enum Search<'a, K, V> {
    Found(Place<'a, K, V>),
    Vacant(Place<'a, K, V>),
}

/// Walks the chain rooted at `slot` once, stopping at the matching node or at
/// the position where a new node for `hash` belongs.
fn search<'a, K, V>(
    slot: &'a mut Slot<K, V>,
    hash: u32,
    eq: &impl Fn(&K) -> bool,
) -> Search<'a, K, V> {
    match Probe::of(slot.head(), hash, eq) {
        Probe::End => return Search::Vacant(Place::Head(slot)),
        Probe::Hit => return Search::Found(Place::Head(slot)),
        Probe::Next => {}
    }

    let mut link = match slot {
        Slot::Occupied(head) => &mut head.next,
        Slot::Unoccupied => return Search::Vacant(Place::Head(slot)),
    };

    loop {
        match Probe::of(link.as_deref(), hash, eq) {
            Probe::End => return Search::Vacant(Place::Chain(link)),
            Probe::Hit => return Search::Found(Place::Chain(link)),
            Probe::Next => {}
        }

        link = match link {
            Some(node) => &mut node.next,
            None => return Search::Vacant(Place::Chain(link)),
        };
    }
}

#[inline(always)]
fn check_distinct<K: Eq, V>(existing: &Node<K, V>, incoming: &Node<K, V>) {
    if existing.hash == incoming.hash && existing.key == incoming.key {
        invariant_violation("duplicate key found while rehashing");
    }
}

/// Moves `node` into its home bucket of a freshly allocated bucket array,
/// reusing its stored hash.
fn relocate<K: Eq, V>(buckets: &mut [Slot<K, V>], mask: usize, node: Node<K, V>) {
    let slot = &mut buckets[node.hash as usize & mask];
    let mut link = match slot {
        Slot::Unoccupied => {
            *slot = Slot::Occupied(node);
            return;
        }
        Slot::Occupied(head) => {
            check_distinct(head, &node);
            &mut head.next
        }
    };

    while let Some(existing) = link {
        check_distinct(existing, &node);
        link = &mut existing.next;
    }
    *link = Some(Box::new(node));
}

fn empty_buckets<K, V>(len: usize) -> Box<[Slot<K, V>]> {
    (0..len).map(|_| Slot::Unoccupied).collect()
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

/// Debug statistics for hash table analysis.
///
/// Available with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries currently in the table
    pub populated: usize,
    /// Number of buckets, which is also the population that triggers growth
    pub buckets: usize,
    /// Number of buckets holding at least one entry
    pub occupied_buckets: usize,
    /// Number of entries stored in boxed chain nodes
    pub overflow_entries: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Load factor (populated / buckets)
    pub load_factor: f64,
    /// Bucket utilization (occupied_buckets / buckets)
    pub bucket_utilization: f64,
    /// Bytes held by the bucket array and the chain nodes
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.buckets,
            self.load_factor * 100.0
        );
        println!(
            "Bucket Usage: {}/{} ({:.2}% utilization)",
            self.occupied_buckets,
            self.buckets,
            self.bucket_utilization * 100.0
        );
        println!(
            "Overflow: {} entries, longest chain {}",
            self.overflow_entries, self.longest_chain
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// Chains at least this long share the last histogram bin.
#[cfg(any(test, feature = "stats"))]
pub const HISTOGRAM_CHAIN_LIMIT: usize = 8;

/// A hash table using separate chaining with inline chain heads.
///
/// `HashTable<K, V>` requires you to provide the 32-bit hash of the key and
/// an equality predicate for each operation. Keys with equal hashes must be
/// equal under the predicate only if they are the same key; the table trusts
/// the caller to pass the hash the key was inserted with.
///
/// The table grows by doubling as soon as an insertion finds it holding as
/// many entries as it has buckets. It never shrinks.
///
/// Every structural mutation (insertion, removal, clear, drain, growth) bumps
/// the table's [`version`](HashTable::version). Borrowing iterators are
/// protected from concurrent mutation by the borrow checker; a detached
/// [`Cursor`] checks the version instead.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use fish_table::hash_table::Entry;
/// # use fish_table::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # fn hash_id(id: u64) -> u32 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish() as u32
/// # }
///
/// let mut table: HashTable<u64, String> = HashTable::with_capacity(16);
/// let hash = hash_id(123);
///
/// match table.entry(hash, |&id| id == 123) {
///     Entry::Vacant(entry) => {
///         entry.insert(123, "Alice".to_string());
///     }
///     Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
///
/// assert_eq!(table.find(hash, |&id| id == 123), Some((&123, &"Alice".to_string())));
/// ```
pub struct HashTable<K, V> {
    buckets: Box<[Slot<K, V>]>,
    len: usize,
    version: u64,
}

impl<K, V> Debug for HashTable<K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct ChainDebug<'a, K, V>(&'a Node<K, V>);

        impl<K: Debug, V: Debug> Debug for ChainDebug<'_, K, V> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut list = f.debug_list();
                let mut node = Some(self.0);
                while let Some(n) = node {
                    list.entry(&format_args!("{:08x} {:?} => {:?}", n.hash, n.key, n.value));
                    node = n.next.as_deref();
                }
                list.finish()
            }
        }

        f.debug_struct("HashTable")
            .field("len", &self.len)
            .field("capacity", &self.buckets.len())
            .field("version", &self.version)
            .field(
                "buckets",
                &self
                    .buckets
                    .iter()
                    .enumerate()
                    .filter_map(|(index, slot)| slot.head().map(|head| (index, ChainDebug(head))))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<K, V> Clone for HashTable<K, V>
where
    K: Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.iter().map(Slot::clone_chain).collect(),
            len: self.len,
            version: self.version,
        }
    }
}

impl<K, V> Drop for HashTable<K, V> {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }

        for slot in self.buckets.iter_mut() {
            slot.unlink_overflow();
        }
    }
}

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> HashTable<K, V> {
    /// Creates an empty hash table with a single bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let table: HashTable<u32, String> = HashTable::new();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 1);
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new hash table able to hold at least `capacity` entries
    /// before it grows.
    ///
    /// The bucket count is `capacity` rounded up to a power of two, and at
    /// least one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let table: HashTable<u32, String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let buckets = capacity
            .max(1)
            .checked_next_power_of_two()
            .unwrap_or_else(|| capacity_overflow());

        Self {
            buckets: empty_buckets(buckets),
            len: 0,
            version: 0,
        }
    }

    #[inline(always)]
    fn bucket_index(&self, hash: u32) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of buckets, which is also the number of entries the
    /// table holds before its next insertion grows it.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the structural modification counter.
    ///
    /// The counter wraps on overflow. It changes on every insertion, removal,
    /// clear, drain and growth, and never on in-place value updates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32, u32> = HashTable::with_capacity(4);
    /// let before = table.version();
    /// table.insert(7, 7, 49).unwrap();
    /// assert_ne!(table.version(), before);
    ///
    /// let before = table.version();
    /// *table.find_mut(7, |&k| k == 7).unwrap().1 += 1;
    /// assert_eq!(table.version(), before);
    /// ```
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline(always)]
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Returns an iterator over all entries in the table.
    ///
    /// Entries are visited in bucket order, then chain order within a
    /// bucket. The order is neither insertion order nor stable across growth.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32, &str> = HashTable::with_capacity(8);
    /// table.insert(1, 1, "one").unwrap();
    /// table.insert(2, 2, "two").unwrap();
    ///
    /// let mut keys: Vec<u32> = table.iter().map(|(k, _)| *k).collect();
    /// keys.sort();
    /// assert_eq!(keys, [1, 2]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: None,
            remaining: self.len,
        }
    }

    /// Returns an iterator over all entries with mutable access to the
    /// values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            buckets: self.buckets.iter_mut(),
            chain: None,
            remaining: self.len,
        }
    }

    /// Removes every entry from the table and returns them in an iterator.
    ///
    /// The table is empty as soon as this returns, keeping its capacity,
    /// whether or not the iterator is consumed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32, &str> = HashTable::with_capacity(8);
    /// table.insert(1, 1, "one").unwrap();
    ///
    /// let entries: Vec<(u32, &str)> = table.drain().collect();
    /// assert!(table.is_empty());
    /// assert_eq!(entries, [(1, "one")]);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        tracing::trace!(len = self.len, "draining hash table");
        let fresh = empty_buckets(self.buckets.len());
        let buckets = mem::replace(&mut self.buckets, fresh);
        let remaining = mem::replace(&mut self.len, 0);
        self.bump_version();

        Drain {
            inner: IntoIter {
                buckets: buckets.into_vec().into_iter(),
                chain: None,
                remaining,
            },
            _table: PhantomData,
        }
    }

    /// Removes all entries from the table.
    ///
    /// The bucket array keeps its length. Every chain node is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32, u32> = HashTable::with_capacity(8);
    /// table.insert(1, 1, 10).unwrap();
    /// table.insert(2, 2, 20).unwrap();
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 8);
    /// ```
    pub fn clear(&mut self) {
        tracing::trace!(len = self.len, "clearing hash table");
        if self.len > 0 {
            for slot in self.buckets.iter_mut() {
                slot.unlink_overflow();
                *slot = Slot::Unoccupied;
            }
        }

        self.len = 0;
        self.bump_version();
    }

    /// Returns a reference to the entry matching `hash` and `eq`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32, &str> = HashTable::with_capacity(8);
    /// table.insert(42, 42, "answer").unwrap();
    ///
    /// assert_eq!(table.find(42, |&k| k == 42), Some((&42, &"answer")));
    /// assert_eq!(table.find(43, |&k| k == 43), None);
    /// ```
    pub fn find(&self, hash: u32, eq: impl Fn(&K) -> bool) -> Option<(&K, &V)> {
        let mut node = self.buckets[self.bucket_index(hash)].head();
        while let Some(n) = node {
            if n.matches(hash, &eq) {
                return Some((&n.key, &n.value));
            }
            node = n.next.as_deref();
        }

        None
    }

    /// Returns the key and a mutable reference to the value of the entry
    /// matching `hash` and `eq`.
    ///
    /// The reference borrows the table, so it cannot outlive the next
    /// structural mutation.
    pub fn find_mut(&mut self, hash: u32, eq: impl Fn(&K) -> bool) -> Option<(&K, &mut V)> {
        let index = self.bucket_index(hash);
        let mut node = self.buckets[index].head_mut()?;
        loop {
            if node.matches(hash, &eq) {
                return Some((&node.key, &mut node.value));
            }
            node = node.next.as_deref_mut()?;
        }
    }

    /// Returns `true` if an entry matches `hash` and `eq`.
    pub fn contains(&self, hash: u32, eq: impl Fn(&K) -> bool) -> bool {
        self.find(hash, eq).is_some()
    }

    /// Removes and returns the entry matching `hash` and `eq`.
    ///
    /// The entry's successor in the chain, if any, is pulled forward into the
    /// vacated position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32, u32> = HashTable::with_capacity(8);
    /// table.insert(42, 42, 1).unwrap();
    ///
    /// assert_eq!(table.remove(42, |&k| k == 42), Some((42, 1)));
    /// assert!(table.is_empty());
    /// assert_eq!(table.remove(42, |&k| k == 42), None);
    /// ```
    pub fn remove(&mut self, hash: u32, eq: impl Fn(&K) -> bool) -> Option<(K, V)> {
        self.remove_if(hash, eq, |_| true)
    }

    /// Removes the entry matching `hash` and `eq` only if its value satisfies
    /// `pred`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32, u32> = HashTable::with_capacity(8);
    /// table.insert(42, 42, 1).unwrap();
    ///
    /// assert_eq!(table.remove_if(42, |&k| k == 42, |&v| v == 2), None);
    /// assert_eq!(table.remove_if(42, |&k| k == 42, |&v| v == 1), Some((42, 1)));
    /// ```
    pub fn remove_if(
        &mut self,
        hash: u32,
        eq: impl Fn(&K) -> bool,
        pred: impl FnOnce(&V) -> bool,
    ) -> Option<(K, V)> {
        if self.len == 0 {
            return None;
        }

        let Entry::Occupied(entry) = self.entry_impl(hash, eq) else {
            return None;
        };
        if !pred(entry.get()) {
            return None;
        }

        Some(entry.remove_entry())
    }

    #[inline]
    fn entry_impl(&mut self, hash: u32, eq: impl Fn(&K) -> bool) -> Entry<'_, K, V> {
        let index = self.bucket_index(hash);
        let HashTable {
            buckets,
            len,
            version,
        } = self;

        match search(&mut buckets[index], hash, &eq) {
            Search::Found(place) => Entry::Occupied(OccupiedEntry {
                place,
                len,
                version,
            }),
            Search::Vacant(place) => Entry::Vacant(VacantEntry {
                place,
                hash,
                len,
                version,
            }),
        }
    }

    /// Creates a detached cursor positioned before the first entry.
    ///
    /// See [`Cursor`] for how it differs from [`iter`](HashTable::iter).
    pub fn cursor(&self) -> Cursor {
        Cursor {
            version: self.version,
            bucket: 0,
            depth: 0,
        }
    }

    /// Moves `cursor` to the next entry and returns it.
    ///
    /// Returns `Ok(None)` once every entry has been visited, and
    /// [`Error::EnumerationInvalidated`] if the table was structurally
    /// modified since the cursor was created.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::Error;
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32, u32> = HashTable::with_capacity(8);
    /// table.insert(1, 1, 10).unwrap();
    ///
    /// let mut cursor = table.cursor();
    /// assert_eq!(table.advance(&mut cursor), Ok(Some((&1, &10))));
    ///
    /// table.insert(2, 2, 20).unwrap();
    /// assert_eq!(table.advance(&mut cursor), Err(Error::EnumerationInvalidated));
    /// ```
    pub fn advance(&self, cursor: &mut Cursor) -> Result<Option<(&K, &V)>, Error> {
        if cursor.version != self.version {
            return Err(Error::EnumerationInvalidated);
        }

        while let Some(slot) = self.buckets.get(cursor.bucket) {
            let mut node = slot.head();
            for _ in 0..cursor.depth {
                node = node.and_then(|n| n.next.as_deref());
            }

            if let Some(node) = node {
                cursor.depth += 1;
                return Ok(Some((&node.key, &node.value)));
            }

            cursor.bucket += 1;
            cursor.depth = 0;
        }

        Ok(None)
    }

    /// Returns a histogram of chain lengths.
    ///
    /// Index `i` counts the buckets whose chain holds exactly `i` entries, so
    /// index 0 counts empty buckets. Chains of [`HISTOGRAM_CHAIN_LIMIT`] or
    /// more entries share the last bin.
    ///
    /// Available with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; HISTOGRAM_CHAIN_LIMIT + 1];
        for slot in self.buckets.iter() {
            hist[slot.chain_len().min(HISTOGRAM_CHAIN_LIMIT)] += 1;
        }
        hist
    }

    /// Returns detailed utilization statistics for debugging.
    ///
    /// Available with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let buckets = self.buckets.len();
        let mut occupied_buckets = 0;
        let mut longest_chain = 0;
        for slot in self.buckets.iter() {
            let chain = slot.chain_len();
            if chain > 0 {
                occupied_buckets += 1;
            }
            longest_chain = longest_chain.max(chain);
        }
        let overflow_entries = self.len - occupied_buckets;

        DebugStats {
            populated: self.len,
            buckets,
            occupied_buckets,
            overflow_entries,
            longest_chain,
            load_factor: self.len as f64 / buckets as f64,
            bucket_utilization: occupied_buckets as f64 / buckets as f64,
            total_bytes: buckets * mem::size_of::<Slot<K, V>>()
                + overflow_entries * mem::size_of::<Node<K, V>>(),
        }
    }

    /// Pretty-prints the chain-length histogram horizontally using stdout.
    ///
    /// Available with the `stats` and `std` features.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        let hist = self.chain_histogram();
        let max = *hist.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!(
            "chain histogram ({} entries in {} buckets):",
            self.len,
            self.buckets.len()
        );

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = match units % 8 {
                1 => Some('▏'),
                2 => Some('▎'),
                3 => Some('▍'),
                4 => Some('▌'),
                5 => Some('▋'),
                6 => Some('▊'),
                7 => Some('▉'),
                _ => None,
            };
            if let Some(ch) = partial {
                bar.push(ch);
            }
            bar
        };

        for (length, &count) in hist.iter().enumerate() {
            let label = if length == HISTOGRAM_CHAIN_LIMIT {
                alloc::format!("{:>2}+", length)
            } else {
                alloc::format!("{:>3}", length)
            };
            println!("{} | {} ({})", label, make_bar(count), count);
        }
    }
}

impl<K, V> HashTable<K, V>
where
    K: Eq,
{
    /// Gets an entry for the given hash and equality predicate.
    ///
    /// A table holding as many entries as it has buckets grows first, but
    /// only when the key is absent: a hit never resizes the table or bumps
    /// its version. The lookup and the insertion position come from a single
    /// walk of the chain, so inserting through a [`VacantEntry`] does not
    /// search again.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::Entry;
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<&str, u32> = HashTable::with_capacity(8);
    ///
    /// match table.entry(5, |k| *k == "hello") {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert("hello", 1);
    ///     }
    ///     Entry::Occupied(mut entry) => {
    ///         *entry.get_mut() += 1;
    ///     }
    /// }
    ///
    /// let hits = table.entry(5, |k| *k == "hello").or_insert("hello", 0);
    /// *hits += 1;
    /// assert_eq!(table.find(5, |k| *k == "hello"), Some((&"hello", &2)));
    /// ```
    #[inline]
    pub fn entry(&mut self, hash: u32, eq: impl Fn(&K) -> bool) -> Entry<'_, K, V> {
        // A full table needs an extra read-only walk to rule out a hit.
        if self.len >= self.buckets.len() && !self.contains(hash, &eq) {
            self.grow();
        }
        self.entry_impl(hash, eq)
    }

    /// Inserts `key` with `value`, failing if the key is already present.
    ///
    /// A full table grows before the duplicate check, so a failed insert
    /// may still have grown the table. Its entries are left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::Error;
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32, &str> = HashTable::with_capacity(8);
    /// assert!(table.insert(3, 3, "a").is_ok());
    /// assert_eq!(table.insert(3, 3, "b"), Err(Error::DuplicateKey));
    /// assert_eq!(table.find(3, |&k| k == 3), Some((&3, &"a")));
    /// ```
    pub fn insert(&mut self, hash: u32, key: K, value: V) -> Result<&mut V, Error> {
        self.maybe_grow();
        match self.entry_impl(hash, |k| *k == key) {
            Entry::Vacant(entry) => Ok(entry.insert(key, value)),
            Entry::Occupied(_) => Err(Error::DuplicateKey),
        }
    }

    /// Grows the table so that `additional` more entries fit without another
    /// growth. Does nothing if they already fit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32, u32> = HashTable::new();
    /// table.reserve(50);
    /// assert_eq!(table.capacity(), 64);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        let required = self
            .len
            .checked_add(additional)
            .unwrap_or_else(|| capacity_overflow());
        if required > self.buckets.len() {
            let target = required
                .checked_next_power_of_two()
                .unwrap_or_else(|| capacity_overflow());
            self.resize(target);
        }
    }

    #[inline(always)]
    fn maybe_grow(&mut self) {
        if self.len >= self.buckets.len() {
            self.grow();
        }
    }

    #[cold]
    #[inline(never)]
    fn grow(&mut self) {
        let target = self
            .buckets
            .len()
            .checked_mul(2)
            .unwrap_or_else(|| capacity_overflow());
        self.resize(target);
    }

    fn resize(&mut self, target: usize) {
        debug_assert!(target.is_power_of_two());
        debug_assert!(target > self.buckets.len());
        tracing::debug!(
            from = self.buckets.len(),
            to = target,
            len = self.len,
            "growing hash table"
        );

        let mut old = mem::replace(&mut self.buckets, empty_buckets(target));
        let mask = target - 1;
        for slot in old.iter_mut() {
            let Slot::Occupied(mut head) = mem::replace(slot, Slot::Unoccupied) else {
                continue;
            };

            let mut next = head.next.take();
            relocate(&mut self.buckets, mask, head);
            while let Some(mut node) = next {
                next = node.next.take();
                relocate(&mut self.buckets, mask, *node);
            }
        }

        self.bump_version();
    }
}

impl<'a, K, V> IntoIterator for &'a HashTable<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut HashTable<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V> IntoIterator for HashTable<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> Self::IntoIter {
        let buckets = mem::take(&mut self.buckets);
        IntoIter {
            buckets: buckets.into_vec().into_iter(),
            chain: None,
            remaining: mem::replace(&mut self.len, 0),
        }
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry - the key is not present in the table
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry - the key is present in the table
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts `key` with `value` if the entry is vacant and returns a
    /// mutable reference to the entry's value.
    pub fn or_insert(self, key: K, value: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(key, value),
        }
    }

    /// Inserts `key` with the value returned by `default` if the entry is
    /// vacant. `default` is not called for an occupied entry.
    pub fn or_insert_with(self, key: K, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(key, default()),
        }
    }

    /// Like [`or_insert_with`](Entry::or_insert_with), but `default` gets to
    /// look at the key being inserted.
    pub fn or_insert_with_key(self, key: K, default: impl FnOnce(&K) -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = default(&key);
                entry.insert(key, value)
            }
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }
}

/// A view into a vacant entry in the hash table.
///
/// It remembers where the walk in [`HashTable::entry`] stopped: the empty
/// home bucket, or the end of that bucket's chain.
pub struct VacantEntry<'a, K, V> {
    place: Place<'a, K, V>,
    hash: u32,
    len: &'a mut usize,
    version: &'a mut u64,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// The hash this entry was looked up with.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Inserts the entry and returns a mutable reference to its value.
    ///
    /// `key` must satisfy the predicate the entry was looked up with and hash
    /// to [`hash`](VacantEntry::hash).
    pub fn insert(self, key: K, value: V) -> &'a mut V {
        *self.len += 1;
        *self.version = self.version.wrapping_add(1);
        &mut self.place.fill(Node::new(self.hash, key, value)).value
    }

    /// Inserts the entry and returns references to both its key and value.
    pub fn insert_entry(self, key: K, value: V) -> (&'a K, &'a mut V) {
        *self.len += 1;
        *self.version = self.version.wrapping_add(1);
        let node = self.place.fill(Node::new(self.hash, key, value));
        (&node.key, &mut node.value)
    }
}

/// A view into an occupied entry in the hash table.
pub struct OccupiedEntry<'a, K, V> {
    place: Place<'a, K, V>,
    len: &'a mut usize,
    version: &'a mut u64,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.place.node().key
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.place.node().value
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.place.node_mut().value
    }

    /// Converts the entry into a mutable reference to its value, borrowed
    /// for as long as the table was.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.place.into_node().value
    }

    /// Replaces the value, returning the old one. This is not a structural
    /// change and leaves the version alone.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the table and returns its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry from the table and returns its key and value.
    pub fn remove_entry(self) -> (K, V) {
        *self.len -= 1;
        *self.version = self.version.wrapping_add(1);
        let node = self.place.take();
        (node.key, node.value)
    }
}

/// A detached, version-checked position in a [`HashTable`].
///
/// Unlike [`Iter`], a cursor does not borrow the table, so the table can be
/// mutated while a walk is in progress. Any structural mutation makes the
/// next [`HashTable::advance`] fail with [`Error::EnumerationInvalidated`]
/// instead of skipping or repeating entries.
///
/// A cursor must only be advanced with the table that created it.
#[derive(Debug, Clone)]
pub struct Cursor {
    version: u64,
    bucket: usize,
    depth: usize,
}

impl Cursor {
    /// The table version captured when the cursor was created.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// An iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Slot<K, V>>,
    chain: Option<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.chain {
                self.chain = node.next.as_deref();
                self.remaining -= 1;
                return Some((&node.key, &node.value));
            }
            self.chain = self.buckets.next()?.head();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`iter_mut`] method on [`HashTable`].
///
/// [`iter_mut`]: HashTable::iter_mut
pub struct IterMut<'a, K, V> {
    buckets: core::slice::IterMut<'a, Slot<K, V>>,
    chain: Option<&'a mut Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.chain.take() {
                let Node {
                    key, value, next, ..
                } = node;
                self.chain = next.as_deref_mut();
                self.remaining -= 1;
                return Some((&*key, value));
            }
            self.chain = self.buckets.next()?.head_mut();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An owning iterator over the entries of a [`HashTable`].
pub struct IntoIter<K, V> {
    buckets: alloc::vec::IntoIter<Slot<K, V>>,
    chain: Link<K, V>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.chain.take() {
                let node = *node;
                self.chain = node.next;
                self.remaining -= 1;
                return Some((node.key, node.value));
            }

            if let Slot::Occupied(head) = self.buckets.next()? {
                self.chain = head.next;
                self.remaining -= 1;
                return Some((head.key, head.value));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V> Drop for IntoIter<K, V> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}

/// A draining iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`]. The
/// table is already empty by the time this iterator exists; dropping it
/// drops the remaining entries.
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, K, V> {
    inner: IntoIter<K, V>,
    _table: PhantomData<&'a mut HashTable<K, V>>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}

impl<K, V> FusedIterator for Drain<'_, K, V> {}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    fn hash_key(state: &HashState, key: u64) -> u32 {
        let mut h = state.build_hasher();
        h.write_u64(key);
        h.finish() as u32
    }

    fn hash_string_key(state: &HashState, key: &str) -> u32 {
        let mut h = state.build_hasher();
        h.write(key.as_bytes());
        h.finish() as u32
    }

    fn chain_keys(table: &HashTable<u64, i32>, bucket: usize) -> Vec<u64> {
        let mut keys = Vec::new();
        let mut node = table.buckets[bucket].head();
        while let Some(n) = node {
            keys.push(n.key);
            node = n.next.as_deref();
        }
        keys
    }

    #[test]
    fn insert_and_find() {
        let state = HashState::default();
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(0);
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            match table.entry(hash, |&key| key == k) {
                Entry::Vacant(v) => {
                    v.insert(k, (k as i32) * 2);
                    assert_eq!(
                        table.find(hash, |&key| key == k),
                        Some((&k, &((k as i32) * 2))),
                        "{:#?}",
                        table
                    );
                }
                Entry::Occupied(_) => panic!("unexpected occupied on first insert: {:#?}", table),
            }
        }
        assert_eq!(table.len(), 32);
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            assert_eq!(
                table.find(hash, |&key| key == k),
                Some((&k, &((k as i32) * 2))),
                "{:#?}",
                table
            );
        }

        let miss_hash = hash_key(&state, 999);
        assert!(table.find(miss_hash, |&key| key == 999).is_none());
        assert!(!table.contains(miss_hash, |&key| key == 999));
    }

    #[test]
    fn duplicate_entry_is_occupied() {
        let state = HashState::default();
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(0);
        let k = 42u64;
        let hash = hash_key(&state, k);

        match table.entry(hash, |&key| key == k) {
            Entry::Vacant(v) => {
                v.insert(k, 7);
            }
            Entry::Occupied(_) => panic!("should be vacant first time"),
        }

        match table.entry(hash, |&key| key == k) {
            Entry::Occupied(mut occ) => {
                assert_eq!(occ.key(), &k);
                let prev_value = occ.insert(11);
                assert_eq!(prev_value, 7, "{:#?}", table);
            }
            Entry::Vacant(_) => panic!("should be occupied: {}#{:08X} in {:#?}", k, hash, table),
        }
        assert_eq!(table.find(hash, |&key| key == k), Some((&k, &11)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn insert_rejects_duplicate_without_changing_entries() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(8);
        table.insert(5, 5, 50).unwrap();
        table.insert(6, 6, 60).unwrap();

        assert_eq!(table.insert(5, 5, 51), Err(Error::DuplicateKey));
        assert_eq!(table.len(), 2);
        assert_eq!(table.find(5, |&k| k == 5), Some((&5, &50)));
        assert_eq!(table.find(6, |&k| k == 6), Some((&6, &60)));
    }

    #[test]
    fn find_mut_and_modify() {
        let state = HashState::default();
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(0);
        for k in 0..5u64 {
            let hash = hash_key(&state, k);
            table.insert(hash, k, 1).unwrap();
        }

        let version = table.version();
        for k in 0..5u64 {
            let hash = hash_key(&state, k);
            if let Some((_, v)) = table.find_mut(hash, |&key| key == k) {
                *v += 9;
            }
        }
        assert_eq!(table.version(), version);

        for k in 0..5u64 {
            let hash = hash_key(&state, k);
            assert_eq!(table.find(hash, |&key| key == k), Some((&k, &10)));
        }
    }

    #[test]
    fn remove_items() {
        let state = HashState::default();
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(0);
        for k in 0..8u64 {
            let hash = hash_key(&state, k);
            table.insert(hash, k, k as i32).unwrap();
        }
        assert_eq!(table.len(), 8);
        for k in [0u64, 3, 7] {
            let hash = hash_key(&state, k);
            let removed = table.remove(hash, |&key| key == k).expect("should remove");
            assert_eq!(removed, (k, k as i32));
        }
        assert_eq!(table.len(), 5);

        let hash = hash_key(&state, 1000);
        assert!(table.remove(hash, |&key| key == 1000).is_none());
    }

    #[test]
    fn growth_from_single_bucket() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(1);
        assert_eq!(table.capacity(), 1);

        for k in 1..=4u64 {
            table.insert(k as u32, k, (k * 10) as i32).unwrap();
        }

        // Growth happens when len reaches capacity: 1 -> 2 -> 4, not 8.
        assert_eq!(table.len(), 4);
        assert_eq!(table.capacity(), 4);
        for k in 1..=4u64 {
            assert_eq!(table.find(k as u32, |&key| key == k), Some((&k, &((k * 10) as i32))));
        }
    }

    #[test]
    fn entry_hit_on_full_table_keeps_layout() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(2);
        table.insert(1, 1, 10).unwrap();
        table.insert(2, 2, 20).unwrap();
        let version = table.version();
        let mut cursor = table.cursor();
        // Bucket order: key 2 sits in bucket 0, key 1 in bucket 1.
        assert_eq!(table.advance(&mut cursor), Ok(Some((&2, &20))));

        match table.entry(1, |&key| key == 1) {
            Entry::Occupied(mut entry) => *entry.get_mut() += 1,
            Entry::Vacant(_) => panic!("key 1 should be present"),
        }
        assert_eq!(*table.entry(2, |&key| key == 2).or_insert(2, 0), 20);

        assert_eq!(table.capacity(), 2);
        assert_eq!(table.version(), version);
        assert_eq!(table.advance(&mut cursor), Ok(Some((&1, &11))));

        // A miss still grows before placing the new entry.
        table.entry(3, |&key| key == 3).or_insert(3, 30);
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.advance(&mut cursor), Err(Error::EnumerationInvalidated));
    }

    #[test]
    fn duplicate_insert_on_full_table_still_grows() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(2);
        table.insert(1, 1, 10).unwrap();
        table.insert(2, 2, 20).unwrap();

        assert_eq!(table.insert(1, 1, 11), Err(Error::DuplicateKey));
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.len(), 2);
        assert_eq!(table.find(1, |&key| key == 1), Some((&1, &10)));
    }

    #[test]
    fn grows_only_when_full() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(4);
        for k in 0..4u64 {
            table.insert(k as u32, k, 0).unwrap();
        }
        assert_eq!(table.capacity(), 4);

        table.insert(4, 4, 0).unwrap();
        assert_eq!(table.capacity(), 8);
    }

    #[test]
    fn remove_head_pulls_successor_forward() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(8);
        // All three share bucket 0.
        for k in [0u64, 8, 16] {
            table.insert(k as u32, k, k as i32).unwrap();
        }
        assert_eq!(chain_keys(&table, 0), vec![0, 8, 16]);

        assert_eq!(table.remove(0, |&k| k == 0), Some((0, 0)));
        assert_eq!(chain_keys(&table, 0), vec![8, 16]);

        assert_eq!(table.remove(16, |&k| k == 16), Some((16, 16)));
        assert_eq!(chain_keys(&table, 0), vec![8]);

        assert_eq!(table.remove(8, |&k| k == 8), Some((8, 8)));
        assert!(chain_keys(&table, 0).is_empty());
        assert!(matches!(table.buckets[0], Slot::Unoccupied));
        assert!(table.is_empty());
    }

    #[test]
    fn remove_middle_of_chain() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(8);
        for k in [1u64, 9, 17, 25] {
            table.insert(k as u32, k, k as i32).unwrap();
        }

        assert_eq!(table.remove(17, |&k| k == 17), Some((17, 17)));
        assert_eq!(chain_keys(&table, 1), vec![1, 9, 25]);
        for k in [1u64, 9, 25] {
            assert_eq!(table.find(k as u32, |&key| key == k), Some((&k, &(k as i32))));
        }
    }

    #[test]
    fn remove_if_checks_value() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(8);
        table.insert(3, 3, 30).unwrap();

        let version = table.version();
        assert_eq!(table.remove_if(3, |&k| k == 3, |&v| v == 31), None);
        assert_eq!(table.version(), version);
        assert_eq!(table.len(), 1);

        assert_eq!(table.remove_if(3, |&k| k == 3, |&v| v == 30), Some((3, 30)));
        assert!(table.is_empty());
    }

    #[test]
    fn version_tracks_structural_changes() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(2);
        let mut last = table.version();
        let mut check_bumped = |table: &HashTable<u64, i32>| {
            assert_ne!(table.version(), last);
            last = table.version();
        };

        table.insert(1, 1, 1).unwrap();
        check_bumped(&table);
        table.remove(1, |&k| k == 1).unwrap();
        check_bumped(&table);
        table.clear();
        check_bumped(&table);
        table.reserve(100);
        check_bumped(&table);
        let _ = table.drain();
        check_bumped(&table);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn insert_many() {
        let state = HashState::default();
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(0);
        for k in 0..100000u64 {
            let hash = hash_key(&state, k);
            match table.entry(hash, |&key| key == k) {
                Entry::Vacant(v) => {
                    v.insert(k, k as i32);
                }
                _ => unreachable!(),
            }
        }

        assert_eq!(table.len(), 100000);
        for k in 0..100000u64 {
            let hash = hash_key(&state, k);
            assert_eq!(table.find(hash, |&key| key == k), Some((&k, &(k as i32))));
        }
        assert_eq!(table.iter().count(), 100000);
    }

    #[test]
    fn explicit_collision() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(0);
        let hash = 0;
        for k in 0..65u64 {
            match table.entry(hash, |&key| key == k) {
                Entry::Vacant(v) => {
                    v.insert(k, k as i32);
                }
                _ => unreachable!(),
            }
        }

        assert_eq!(table.len(), 65);
        assert_eq!(table.debug_stats().longest_chain, 65);
        for k in 0..65u64 {
            assert_eq!(
                table.find(hash, |&key| key == k),
                Some((&k, &(k as i32))),
                "{:#?}",
                table
            );
        }

        for k in (0..65u64).step_by(2) {
            assert_eq!(table.remove(hash, |&key| key == k), Some((k, k as i32)));
        }
        assert_eq!(table.len(), 32);
        for k in (1..65u64).step_by(2) {
            assert_eq!(table.find(hash, |&key| key == k), Some((&k, &(k as i32))));
        }
    }

    #[test]
    fn iter_and_drain() {
        let state = HashState::default();
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(0);
        for k in 10..20u64 {
            let hash = hash_key(&state, k);
            table.insert(hash, k, (k as i32) + 1).unwrap();
        }
        let collected: Vec<u64> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(collected.len(), 10, "{:#?}", table);
        assert_eq!(table.iter().len(), 10);
        for k in 10..20u64 {
            assert!(collected.contains(&k));
        }

        let capacity = table.capacity();
        let drained: Vec<(u64, i32)> = table.drain().collect();
        assert_eq!(drained.len(), 10);
        assert_eq!(table.len(), 0);
        assert_eq!(table.capacity(), capacity);

        for k in 10..20u64 {
            let hash = hash_key(&state, k);
            assert!(table.find(hash, |&key| key == k).is_none());
        }
    }

    #[test]
    fn iteration_order_is_bucket_then_chain() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(4);
        table.insert(3, 3, 0).unwrap();
        table.insert(1, 1, 0).unwrap();
        table.insert(5, 5, 0).unwrap();

        let keys: Vec<u64> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 5, 3]);
    }

    #[test]
    fn iter_mut_updates_values() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(2);
        for k in 0..6u64 {
            table.insert(0, k, 1).unwrap();
        }
        for (_, value) in table.iter_mut() {
            *value *= 7;
        }
        assert!(table.iter().all(|(_, v)| *v == 7));
    }

    #[test]
    fn into_iter_yields_everything() {
        let mut table: HashTable<u64, String> = HashTable::with_capacity(2);
        for k in 0..20u64 {
            table.insert((k % 3) as u32, k, k.to_string()).unwrap();
        }

        let mut entries: Vec<(u64, String)> = table.into_iter().collect();
        entries.sort();
        assert_eq!(entries.len(), 20);
        assert_eq!(entries[19], (19, "19".to_string()));
    }

    #[test]
    fn partially_consumed_into_iter_drops_rest() {
        let mut table: HashTable<u64, String> = HashTable::with_capacity(2);
        for k in 0..20u64 {
            table.insert(0, k, k.to_string()).unwrap();
        }

        let mut iter = table.into_iter();
        assert!(iter.next().is_some());
        assert_eq!(iter.len(), 19);
        drop(iter);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(0);
        for k in 0..10u64 {
            table.insert(0, k, 0).unwrap();
        }
        let capacity = table.capacity();
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert_eq!(table.iter().count(), 0);

        table.insert(0, 3, 3).unwrap();
        assert_eq!(table.find(0, |&k| k == 3), Some((&3, &3)));
    }

    #[test]
    fn clone_is_deep() {
        let mut table: HashTable<u64, String> = HashTable::with_capacity(2);
        for k in 0..8u64 {
            table.insert(0, k, k.to_string()).unwrap();
        }

        let mut copy = table.clone();
        *copy.find_mut(0, |&k| k == 5).unwrap().1 = "changed".to_string();
        copy.remove(0, |&k| k == 0);

        assert_eq!(table.len(), 8);
        assert_eq!(table.find(0, |&k| k == 5), Some((&5, &"5".to_string())));
        assert_eq!(copy.len(), 7);
        assert_eq!(copy.find(0, |&k| k == 5), Some((&5, &"changed".to_string())));
        let keys: Vec<u64> = copy.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn cursor_visits_every_entry_once() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(4);
        for k in 0..12u64 {
            table.insert((k % 5) as u32, k, k as i32).unwrap();
        }

        let mut cursor = table.cursor();
        let mut seen = Vec::new();
        while let Some((k, v)) = table.advance(&mut cursor).unwrap() {
            assert_eq!(*v, *k as i32);
            seen.push(*k);
        }

        let from_iter: Vec<u64> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(seen, from_iter);
        assert_eq!(table.advance(&mut cursor), Ok(None));
    }

    #[test]
    fn cursor_fails_fast_after_mutation() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(4);
        table.insert(1, 1, 1).unwrap();

        let mut cursor = table.cursor();
        assert!(table.advance(&mut cursor).unwrap().is_some());

        table.insert(2, 2, 2).unwrap();
        assert_eq!(table.advance(&mut cursor), Err(Error::EnumerationInvalidated));
        assert_eq!(table.advance(&mut cursor), Err(Error::EnumerationInvalidated));

        let mut fresh = table.cursor();
        assert_eq!(fresh.version(), table.version());
        assert!(table.advance(&mut fresh).unwrap().is_some());
    }

    #[test]
    fn cursor_ignores_value_updates() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(4);
        table.insert(1, 1, 1).unwrap();
        table.insert(2, 2, 2).unwrap();

        let mut cursor = table.cursor();
        assert!(table.advance(&mut cursor).unwrap().is_some());
        *table.find_mut(2, |&k| k == 2).unwrap().1 = 20;
        assert_eq!(table.advance(&mut cursor), Ok(Some((&2, &20))));
    }

    #[test]
    #[should_panic(expected = "duplicate key found while rehashing")]
    fn duplicate_during_rehash_is_fatal() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(1);
        let mut head = Node::new(0, 7, 1);
        head.next = Some(Box::new(Node::new(0, 7, 2)));
        table.buckets[0] = Slot::Occupied(head);
        table.len = 2;

        table.reserve(8);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn dropping_long_chain_does_not_recurse() {
        let mut table: HashTable<u64, u64> = HashTable::with_capacity(1);
        let mut head = Node::new(0, 0, 0);
        let mut tail = &mut head.next;
        for k in 1..500_000u64 {
            tail = &mut tail.insert(Box::new(Node::new(0, k, k))).next;
        }
        table.buckets[0] = Slot::Occupied(head);
        table.len = 500_000;

        assert_eq!(table.debug_stats().longest_chain, 500_000);
        drop(table);
    }

    #[test]
    fn insert_and_find_string_keys() {
        let state = HashState::default();
        let mut table: HashTable<String, i32> = HashTable::with_capacity(0);
        let keys = ["hello", "world", "foo", "bar", "baz"];

        for (i, k) in keys.iter().enumerate() {
            let hash = hash_string_key(&state, k);
            match table.entry(hash, |key: &String| key == k) {
                Entry::Vacant(v) => {
                    v.insert(k.to_string(), i as i32);
                }
                Entry::Occupied(_) => panic!("unexpected occupied on first insert"),
            }
        }

        assert_eq!(table.len(), keys.len());

        for (i, k) in keys.iter().enumerate() {
            let hash = hash_string_key(&state, k);
            assert_eq!(
                table.find(hash, |key| key == k),
                Some((&k.to_string(), &(i as i32)))
            );
        }

        let miss_hash = hash_string_key(&state, "not found");
        assert!(table.find(miss_hash, |key| key == "not found").is_none());
    }

    #[test]
    fn remove_string_keys() {
        let state = HashState::default();
        let mut table: HashTable<String, i32> = HashTable::with_capacity(0);
        let keys = ["a", "b", "c", "d", "e"];
        for (i, k) in keys.iter().enumerate() {
            let hash = hash_string_key(&state, k);
            table.insert(hash, k.to_string(), i as i32).unwrap();
        }

        assert_eq!(table.len(), 5);
        let hash_c = hash_string_key(&state, "c");
        let (key, value) = table.remove(hash_c, |key| key == "c").unwrap();
        assert_eq!(key, "c");
        assert_eq!(value, 2);
        assert_eq!(table.len(), 4);

        let hash_a = hash_string_key(&state, "a");
        assert!(table.find(hash_a, |key| key == "a").is_some());
        assert!(table.find(hash_c, |key| key == "c").is_none());
    }

    #[test]
    fn entry_or_insert_with() {
        let state = HashState::default();
        let mut table: HashTable<String, i32> = HashTable::with_capacity(0);
        let key = "unique_key";
        let hash = hash_string_key(&state, key);

        let value_ref = table
            .entry(hash, |k| k == key)
            .or_insert_with(key.to_string(), || 42);
        assert_eq!(*value_ref, 42);

        let existing_ref = table
            .entry(hash, |k| k == key)
            .or_insert_with(key.to_string(), || panic!("initializer must not run"));
        assert_eq!(*existing_ref, 42);

        assert_eq!(table.len(), 1);
    }

    #[test]
    fn entry_and_modify() {
        let mut table: HashTable<String, i32> = HashTable::with_capacity(0);
        table
            .entry(1, |k| k == "k")
            .and_modify(|v| *v += 1)
            .or_insert("k".to_string(), 0);
        table
            .entry(1, |k| k == "k")
            .and_modify(|v| *v += 1)
            .or_insert("k".to_string(), 0);
        assert_eq!(table.find(1, |k| k == "k"), Some((&"k".to_string(), &1)));
    }

    #[test]
    fn entry_into_mut() {
        let state = HashState::default();
        let mut table: HashTable<String, String> = HashTable::with_capacity(10);
        let hash = hash_string_key(&state, "key");
        table.insert(hash, "key".to_string(), "value".to_string()).unwrap();

        let value_ref = match table.entry(hash, |s| s == "key") {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(_) => unreachable!("Entry should be occupied: {:#?}", table),
        };
        *value_ref = "new_value".to_string();
        assert_eq!(
            table.find(hash, |s| s == "key").map(|(_, v)| v.as_str()),
            Some("new_value")
        );
    }

    #[test]
    fn vacant_insert_entry_returns_key() {
        let mut table: HashTable<String, i32> = HashTable::with_capacity(4);
        match table.entry(9, |k| k == "nine") {
            Entry::Vacant(entry) => {
                assert_eq!(entry.hash(), 9);
                let (key, value) = entry.insert_entry("nine".to_string(), 9);
                assert_eq!(key, "nine");
                *value += 1;
            }
            Entry::Occupied(_) => unreachable!(),
        }
        assert_eq!(table.find(9, |k| k == "nine"), Some((&"nine".to_string(), &10)));
    }

    #[test]
    fn stats_account_for_overflow() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(8);
        for k in [0u64, 8, 16, 1, 2] {
            table.insert(k as u32, k, 0).unwrap();
        }

        let stats = table.debug_stats();
        assert_eq!(stats.populated, 5);
        assert_eq!(stats.buckets, 8);
        assert_eq!(stats.occupied_buckets, 3);
        assert_eq!(stats.overflow_entries, 2);
        assert_eq!(stats.longest_chain, 3);

        let hist = table.chain_histogram();
        assert_eq!(hist.len(), HISTOGRAM_CHAIN_LIMIT + 1);
        assert_eq!(hist[0], 5);
        assert_eq!(hist[1], 2);
        assert_eq!(hist[3], 1);
        assert_eq!(hist.iter().sum::<usize>(), 8);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    #[cfg(feature = "std")]
    fn histogram_output() {
        let state = HashState::default();
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(10000);
        for k in 0..table.capacity() as u64 {
            let hash = hash_key(&state, k);
            table.insert(hash, k, 0).unwrap();
        }

        table.print_chain_histogram();
        table.debug_stats().print();
    }

    #[test]
    fn debug_output_lists_chains() {
        let mut table: HashTable<u64, i32> = HashTable::with_capacity(4);
        table.insert(1, 1, 10).unwrap();
        table.insert(5, 5, 50).unwrap();

        let rendered = alloc::format!("{:?}", table);
        assert!(rendered.contains("len: 2"));
        assert!(rendered.contains("00000001 1 => 10"));
        assert!(rendered.contains("00000005 5 => 50"));
    }
}
