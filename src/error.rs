use core::fmt;

/// Errors reported by [`FishTable`] and [`HashTable`] operations.
///
/// Every variant is a recoverable, expected condition. Internal corruption of
/// the table is never reported through this type: it panics instead, since
/// continuing would silently hand out wrong cache entries.
///
/// [`FishTable`]: crate::FishTable
/// [`HashTable`]: crate::HashTable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// A checked lookup found no entry for the key.
    KeyNotFound,
    /// An insert found the key already present. The table is unchanged.
    DuplicateKey,
    /// The table was structurally modified after the [`Cursor`] was created.
    ///
    /// [`Cursor`]: crate::hash_table::Cursor
    EnumerationInvalidated,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::KeyNotFound => f.write_str("key not found"),
            Error::DuplicateKey => f.write_str("an entry with the same key already exists"),
            Error::EnumerationInvalidated => {
                f.write_str("table was modified during enumeration")
            }
        }
    }
}

impl core::error::Error for Error {}

/// Aborts on a broken internal invariant.
#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn invariant_violation(what: &str) -> ! {
    tracing::error!(what, "hash table invariant violated");
    panic!("hash table invariant violated: {what}")
}
