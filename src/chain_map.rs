use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use rand::rngs::SmallRng;

use crate::DefaultHashBuilder;
use crate::chain_table::ChainTable;
use crate::chain_table::DEFAULT_CAPACITY;
use crate::chain_table::DEFAULT_MAX_LOAD;
use crate::universal::field_element;

/// A key-value map backed by the separate-chaining [`ChainTable`].
///
/// `ChainMap<K, V, S>` stores pairs whose keys implement `Hash + Eq`. Keys
/// are hashed by a configurable hasher builder `S` (by default `foldhash`),
/// folded into the 31-bit universal-hashing domain, and placed by the
/// table's randomized `(a, b)` parameters. The table doubles before an
/// insert would push the load factor past its maximum (default 0.75) and
/// halves, never below 8 buckets, when deletions drag the load factor under
/// 0.20.
///
/// Iteration order is arbitrary and changes across resizes; mappings are not
/// stable across tables or process runs by design.
///
/// ## Example
///
/// ```rust
/// use chain_hash::ChainMap;
///
/// let mut map: ChainMap<_, _> = ChainMap::new();
/// map.insert("apple", 10);
/// map.insert("banana", 20);
///
/// assert_eq!(map.get(&"apple"), Some(&10));
/// assert_eq!(map.remove(&"banana"), Some(20));
/// assert_eq!(map.get(&"banana"), None);
/// ```
#[derive(Clone)]
pub struct ChainMap<K, V, S = DefaultHashBuilder> {
    table: ChainTable<K, V>,
    hash_builder: S,
}

impl<K, V, S> ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a map with the given hasher builder, default capacity, and
    /// default maximum load factor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// # use siphasher::sip::SipHasher;
    /// # use core::hash::BuildHasher;
    /// #
    /// # struct FixedSip;
    /// # impl BuildHasher for FixedSip {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: ChainMap<i32, String, _> = ChainMap::with_hasher(FixedSip);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hash_builder)
    }

    /// Creates a map with at least `capacity` buckets and the given hasher
    /// builder.
    ///
    /// The bucket count is clamped to at least 1 and rounded up to a power
    /// of two.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: ChainTable::with_capacity(capacity, DEFAULT_MAX_LOAD),
            hash_builder,
        }
    }

    /// Creates a map with every knob exposed: bucket capacity, maximum load
    /// factor, hasher builder, and the random source used to draw hash
    /// parameters.
    ///
    /// The random source is owned by the map and reused across every resize,
    /// so a seeded source makes the parameter sequence fully deterministic.
    ///
    /// # Panics
    ///
    /// Panics if `max_load` is not in `(0, 1]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// # use chain_hash::DefaultHashBuilder;
    /// # use rand::SeedableRng;
    /// # use rand::rngs::SmallRng;
    /// let rng = SmallRng::seed_from_u64(7);
    /// let mut map = ChainMap::with_options(4, 0.75, DefaultHashBuilder::default(), rng);
    /// map.insert("key", 1);
    /// assert_eq!(map.get(&"key"), Some(&1));
    /// ```
    pub fn with_options(capacity: usize, max_load: f64, hash_builder: S, rng: SmallRng) -> Self {
        Self {
            table: ChainTable::with_capacity_and_rng(capacity, max_load, rng),
            hash_builder,
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let mut map: ChainMap<_, _> = ChainMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current number of buckets. Always a power of two, and
    /// never below 8 once the map has grown past 8.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the ratio of entries to buckets.
    ///
    /// Immediately after any `insert` returns, this is at most
    /// [`max_load`](Self::max_load).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let mut map: ChainMap<_, _> = ChainMap::new();
    /// map.insert(1, "a");
    /// assert!(map.load_factor() > 0.0);
    /// assert!(map.load_factor() <= map.max_load());
    /// ```
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// Returns the maximum load factor configured at construction.
    pub fn max_load(&self) -> f64 {
        self.table.max_load()
    }

    /// Removes all entries, keeping the current bucket count.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let mut map: ChainMap<_, _> = ChainMap::new();
    /// map.insert(1, "a");
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key was already present its value is replaced in place and the
    /// old value is returned; the entry count does not change. Otherwise the
    /// pair is appended to its chain and `None` is returned.
    ///
    /// The grow decision is made before the chain is scanned, on the
    /// assumption that the key is new, so an update landing exactly on the
    /// load-factor boundary still doubles the bucket count.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let mut map: ChainMap<_, _> = ChainMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mapped = field_element(self.hash_builder.hash_one(&key));
        self.table.insert(mapped, key, value)
    }

    /// Returns a reference to the value stored for `key`, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let mut map: ChainMap<_, _> = ChainMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        let mapped = field_element(self.hash_builder.hash_one(key));
        self.table.find(mapped, key)
    }

    /// Returns a mutable reference to the value stored for `key`, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let mut map: ChainMap<_, _> = ChainMap::new();
    /// map.insert(1, 10);
    /// if let Some(value) = map.get_mut(&1) {
    ///     *value += 1;
    /// }
    /// assert_eq!(map.get(&1), Some(&11));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let mapped = field_element(self.hash_builder.hash_one(key));
        self.table.find_mut(mapped, key)
    }

    /// Returns `true` if the map contains an entry for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let mut map: ChainMap<_, _> = ChainMap::new();
    /// map.insert(1, "a");
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes the entry for `key`, returning its value if it was present.
    ///
    /// Removal on an absent key returns `None` and changes nothing. After a
    /// successful removal the map may shrink; shrinking never drops below 8
    /// buckets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let mut map: ChainMap<_, _> = ChainMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let mapped = field_element(self.hash_builder.hash_one(key));
        self.table.remove(mapped, key)
    }

    /// Returns an iterator over the `(&K, &V)` pairs of the map, in an
    /// arbitrary order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let mut map: ChainMap<_, _> = ChainMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    /// assert_eq!(map.iter().count(), 2);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V, S> ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty map with the default hasher builder, capacity, and
    /// maximum load factor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let map: ChainMap<i32, &str> = ChainMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty map with at least `capacity` buckets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let map: ChainMap<i32, &str> = ChainMap::with_capacity(100);
    /// assert!(map.bucket_count() >= 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }

    /// Creates an empty map with at least `capacity` buckets and the given
    /// maximum load factor.
    ///
    /// # Panics
    ///
    /// Panics if `max_load` is not in `(0, 1]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::ChainMap;
    /// let map: ChainMap<i32, &str> = ChainMap::with_max_load(4, 0.75);
    /// assert_eq!(map.bucket_count(), 4);
    /// assert_eq!(map.max_load(), 0.75);
    /// ```
    pub fn with_max_load(capacity: usize, max_load: f64) -> Self {
        Self {
            table: ChainTable::with_capacity(capacity, max_load),
            hash_builder: S::default(),
        }
    }
}

impl<K, V, S> Default for ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Debug for ChainMap<K, V, S>
where
    K: Debug + Hash + Eq,
    V: Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> Extend<(K, V)> for ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> IntoIterator for ChainMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

/// An iterator over the key-value pairs of a `ChainMap`.
pub struct Iter<'a, K, V> {
    inner: crate::chain_table::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// An iterator over the keys of a `ChainMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over the values of a `ChainMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

/// An owning iterator over the key-value pairs of a `ChainMap`.
pub struct IntoIter<K, V> {
    inner: crate::chain_table::IntoIter<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
