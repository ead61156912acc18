use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::ops::Index;

use crate::error::Error;
use crate::hash::DefaultHashBuilder;
pub use crate::hash_table::Cursor;
pub use crate::hash_table::Drain;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
pub use crate::hash_table::IntoIter;
pub use crate::hash_table::Iter;
pub use crate::hash_table::IterMut;

#[inline(always)]
fn equivalent_key<K, Q>(key: &Q) -> impl Fn(&K) -> bool + '_
where
    K: Borrow<Q>,
    Q: Eq + ?Sized,
{
    move |k| key == k.borrow()
}

/// A keyed hash table built on the chained [`HashTable`].
///
/// `FishTable<K, V, S>` hashes keys with the configurable hasher builder `S`
/// and keeps the low 32 bits of the result. Keys must implement `Hash + Eq`,
/// and two equal keys must hash the same.
///
/// On top of the raw table it adds an optional value initializer, used in
/// place of `V::default()` whenever an entry is created implicitly through
/// [`get_or_init`](FishTable::get_or_init) or [`Entry::or_init`].
///
/// # Performance Characteristics
///
/// - **Lookup/insert/remove**: O(1) amortized, one chain walk each
/// - **Memory**: one inline slot per bucket; colliding entries are boxed
/// - **Growth**: doubles once the table holds as many entries as buckets
///
/// # Examples
///
/// ```rust
/// use fish_table::FishTable;
///
/// let mut scores: FishTable<&str, u32> = FishTable::new();
/// scores.insert("alice", 3).unwrap();
/// *scores.get_or_insert_with("bob", || 0) += 5;
///
/// assert_eq!(scores["alice"], 3);
/// assert_eq!(scores.get("bob"), Some(&5));
/// assert!(scores.insert("alice", 4).is_err());
/// ```
#[derive(Clone)]
pub struct FishTable<K, V, S = DefaultHashBuilder> {
    table: HashTable<K, V>,
    hash_builder: S,
    initializer: Option<fn(&K) -> V>,
}

impl<K, V, S> Debug for FishTable<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FishTable<K, V, DefaultHashBuilder> {
    /// Creates an empty table using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let table: FishTable<u64, String> = FishTable::new();
    /// assert!(table.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty table able to hold `capacity` entries before it
    /// grows, using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let table: FishTable<u64, String> = FishTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for FishTable<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> FishTable<K, V, S> {
    /// Creates an empty table with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use fish_table::FishTable;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let table: FishTable<i32, String, _> = FishTable::with_hasher(SimpleHasher);
    /// assert!(table.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates an empty table with the given capacity and hasher builder.
    ///
    /// The capacity is rounded up to a power of two.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
            initializer: None,
        }
    }

    /// Sets the value initializer and returns the table.
    ///
    /// The initializer runs exactly once for every entry created by
    /// [`get_or_init`](FishTable::get_or_init) or [`Entry::or_init`], and is
    /// never called for explicit inserts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// fn key_len(key: &String) -> usize {
    ///     key.len()
    /// }
    ///
    /// let mut lengths: FishTable<String, usize> = FishTable::new().with_initializer(key_len);
    ///
    /// assert_eq!(*lengths.get_or_init("four".to_string()), 4);
    /// lengths.insert("x".to_string(), 100).unwrap();
    /// assert_eq!(lengths.get("x"), Some(&100));
    /// ```
    pub fn with_initializer(mut self, initializer: fn(&K) -> V) -> Self {
        self.initializer = Some(initializer);
        self
    }

    /// Replaces the value initializer. `None` falls back to `V::default()`.
    pub fn set_initializer(&mut self, initializer: Option<fn(&K) -> V>) {
        self.initializer = initializer;
    }

    /// Returns the configured value initializer.
    pub fn initializer(&self) -> Option<fn(&K) -> V> {
        self.initializer
    }

    /// Returns a reference to the table's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of entries the table holds before its next
    /// insertion grows it.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the structural modification counter. See
    /// [`HashTable::version`].
    pub fn version(&self) -> u64 {
        self.table.version()
    }

    /// Removes all entries from the table, keeping its capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// table.insert(1, "a").unwrap();
    /// table.clear();
    /// assert!(table.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the key-value pairs in arbitrary order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// table.insert(1, "a").unwrap();
    /// table.insert(2, "b").unwrap();
    ///
    /// for (key, value) in table.iter() {
    ///     println!("Key: {}, Value: {}", key, value);
    /// }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }

    /// Returns an iterator over the entries with mutable access to the
    /// values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.table.iter_mut()
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over mutable references to the values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// table.insert("a", 1).unwrap();
    /// table.insert("b", 2).unwrap();
    ///
    /// for value in table.values_mut() {
    ///     *value *= 10;
    /// }
    /// assert_eq!(table["b"], 20);
    /// ```
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Removes every entry and returns them in an iterator. The table is
    /// empty once this returns and keeps its capacity.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        self.table.drain()
    }

    /// Creates a detached cursor over the table. See [`Cursor`].
    pub fn cursor(&self) -> Cursor {
        self.table.cursor()
    }

    /// Moves `cursor` to the next entry, failing with
    /// [`Error::EnumerationInvalidated`] if the table was structurally
    /// modified since the cursor was created.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::Error;
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// table.insert("a", 1).unwrap();
    ///
    /// let mut cursor = table.cursor();
    /// while let Some((key, value)) = table.advance(&mut cursor)? {
    ///     println!("{key} = {value}");
    /// }
    ///
    /// let mut cursor = table.cursor();
    /// table.advance(&mut cursor)?;
    /// table.insert("b", 2)?;
    /// assert_eq!(table.advance(&mut cursor), Err(Error::EnumerationInvalidated));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn advance(&self, cursor: &mut Cursor) -> Result<Option<(&K, &V)>, Error> {
        self.table.advance(cursor)
    }

    /// Returns a histogram of chain lengths. See
    /// [`HashTable::chain_histogram`].
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> alloc::vec::Vec<usize> {
        self.table.chain_histogram()
    }

    /// Returns utilization statistics of the underlying table.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }

    /// Prints the chain-length histogram to stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        self.table.print_chain_histogram();
    }
}

impl<K, V, S> FishTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline(always)]
    fn hash_of<Q>(&self, key: &Q) -> u32
    where
        Q: Hash + ?Sized,
    {
        self.hash_builder.hash_one(key) as u32
    }

    /// Returns a reference to the value for `key`.
    ///
    /// The key may be any borrowed form of the table's key type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// table.insert("a".to_string(), 1).unwrap();
    /// assert_eq!(table.get("a"), Some(&1));
    /// assert_eq!(table.get("b"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and the value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        self.table.find(hash, equivalent_key(key))
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// Writing through the reference is not a structural change and does not
    /// invalidate cursors.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        self.table.find_mut(hash, equivalent_key(key)).map(|(_, v)| v)
    }

    /// Returns `true` if the table contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).is_some()
    }

    /// Like [`get`](FishTable::get), but fails with [`Error::KeyNotFound`]
    /// when the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::Error;
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// table.insert(1, "one").unwrap();
    /// assert_eq!(table.try_get(&1), Ok(&"one"));
    /// assert_eq!(table.try_get(&2), Err(Error::KeyNotFound));
    /// ```
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Like [`get_mut`](FishTable::get_mut), but fails with
    /// [`Error::KeyNotFound`] when the key is absent.
    pub fn try_get_mut<Q>(&mut self, key: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Inserts a new entry and returns a mutable reference to its value.
    ///
    /// Fails with [`Error::DuplicateKey`] if the key is already present, in
    /// which case the existing entry is left as it was. Use
    /// [`upsert`](FishTable::upsert) to overwrite instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::Error;
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// *table.insert(37, 1).unwrap() += 1;
    /// assert_eq!(table.insert(37, 5), Err(Error::DuplicateKey));
    /// assert_eq!(table[&37], 2);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<&mut V, Error> {
        let hash = self.hash_of(&key);
        self.table.insert(hash, key, value)
    }

    /// Inserts or overwrites the value for `key`, returning the previous
    /// value if there was one.
    ///
    /// Overwriting is not a structural change and leaves the version alone.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// assert_eq!(table.upsert(37, "a"), None);
    /// assert_eq!(table.upsert(37, "b"), Some("a"));
    /// assert_eq!(table.get(&37), Some(&"b"));
    /// ```
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Some(entry.insert(value)),
            Entry::Vacant(entry) => {
                entry.insert(value);
                None
            }
        }
    }

    /// Returns the value for `key`, inserting the result of `default` first
    /// if the key is absent. `default` only runs when an entry is created.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// table.insert("a", 1).unwrap();
    ///
    /// assert_eq!(*table.get_or_insert_with("a", || 99), 1);
    /// assert_eq!(*table.get_or_insert_with("b", || 99), 99);
    /// ```
    pub fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        self.entry(key).or_insert_with(default)
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// Lookup and insertion share one walk of the key's chain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let mut counts = FishTable::new();
    /// for word in ["a", "b", "a"] {
    ///     counts.entry(word).and_modify(|n| *n += 1).or_insert(1);
    /// }
    ///
    /// assert_eq!(counts.get("a"), Some(&2));
    /// assert_eq!(counts.get("b"), Some(&1));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.hash_of(&key);
        let initializer = self.initializer;
        match self.table.entry(hash, |k| *k == key) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry {
                entry,
                key,
                initializer,
            }),
        }
    }

    /// Removes `key` from the table, returning its value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// table.insert("a", 1).unwrap();
    /// assert_eq!(table.remove("a"), Some(1));
    /// assert_eq!(table.remove("a"), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key` from the table, returning the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        self.table.remove(hash, equivalent_key(key))
    }

    /// Removes `key` only if it currently maps to `value`. Returns whether an
    /// entry was removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let mut table = FishTable::new();
    /// table.insert("a", 1).unwrap();
    /// assert!(!table.remove_pair("a", &2));
    /// assert!(table.remove_pair("a", &1));
    /// assert!(table.is_empty());
    /// ```
    pub fn remove_pair<Q>(&mut self, key: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: PartialEq,
    {
        let hash = self.hash_of(key);
        self.table
            .remove_if(hash, equivalent_key(key), |v| v == value)
            .is_some()
    }

    /// Reserves room for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }
}

impl<K, V, S> FishTable<K, V, S>
where
    K: Hash + Eq,
    V: Default,
    S: BuildHasher,
{
    /// Returns the value for `key`, creating it first if absent.
    ///
    /// A new value comes from the configured initializer, or from
    /// `V::default()` when there is none.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use fish_table::FishTable;
    /// #
    /// let mut table: FishTable<&str, Vec<u32>> = FishTable::new();
    /// table.get_or_init("a").push(1);
    /// table.get_or_init("a").push(2);
    /// assert_eq!(table.get("a"), Some(&vec![1, 2]));
    /// ```
    pub fn get_or_init(&mut self, key: K) -> &mut V {
        self.entry(key).or_init()
    }
}

impl<K, Q, V, S> Index<&Q> for FishTable<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// Returns the value for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present.
    #[track_caller]
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("{}", Error::KeyNotFound),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for FishTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let additional = if self.is_empty() {
            iter.size_hint().0
        } else {
            iter.size_hint().0.div_ceil(2)
        };
        self.reserve(additional);

        for (key, value) in iter {
            self.upsert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for FishTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::with_hasher(S::default());
        table.extend(iter);
        table
    }
}

impl<'a, K, V, S> IntoIterator for &'a FishTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut FishTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for FishTable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

/// A view into a single entry in the table, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`FishTable`].
///
/// [`entry`]: FishTable::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Inserts a value computed from the key if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with_key<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = default(entry.key());
                entry.insert(value)
            }
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the table's initializer output, or `V::default()` without an
    /// initializer, if the entry is vacant.
    pub fn or_init(self) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = match entry.initializer {
                    Some(initializer) => initializer(&entry.key),
                    None => V::default(),
                };
                entry.insert(value)
            }
        }
    }
}

/// A view into a vacant entry in the table.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, K, V>,
    key: K,
    initializer: Option<fn(&K) -> V>,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the table and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        self.entry.insert(self.key, value)
    }
}

/// A view into an occupied entry in the table.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, K, V>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        self.entry.key()
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        self.entry.get()
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.entry.get_mut()
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        self.entry.into_mut()
    }

    /// Replaces the value in the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        self.entry.insert(value)
    }

    /// Removes the entry from the table and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove()
    }

    /// Removes the entry from the table and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove_entry()
    }
}

/// An iterator over the keys of a `FishTable`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `FishTable`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a `FishTable`.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}
