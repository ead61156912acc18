//! Hasher selection.
//!
//! [`DefaultHashBuilder`] is what [`FishTable`](crate::FishTable) uses when no
//! hasher is named. [`IdHasher`] is for keys that are already well
//! distributed small integers, such as entity ids or [`IdPair`]s, where
//! running a real hash function only costs time.
//!
//! [`IdPair`]: crate::IdPair

use core::hash::BuildHasherDefault;
use core::hash::Hasher;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The default hash builder, `foldhash::fast::RandomState`.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The default hash builder, `std::hash::RandomState`.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// The default hash builder. Without `foldhash` or `std` there is no
        /// seeded hasher available, so this is [`BuildIdHasher`].
        pub type DefaultHashBuilder = BuildIdHasher;
    }
}

const FOLD_SEED: u64 = 0x517c_c1b7_2722_0a95;

/// A hasher that passes integer keys through unchanged.
///
/// The first integer written becomes the hash as is. Every later integer is
/// folded in as `state.rotate_left(16) ^ value`, so hashing a `(u16, u16)`
/// tuple yields `high << 16 | low`, the same bits as [`IdPair`]. Byte slices
/// are folded in with an FxHash style multiply.
///
/// The table indexes buckets with the low bits of the hash, so keys that only
/// differ in their high bits all land in the same chain. Use a real hasher
/// for those.
///
/// # Examples
///
/// ```rust
/// use core::hash::BuildHasher;
///
/// use fish_table::BuildIdHasher;
///
/// let build = BuildIdHasher::default();
/// assert_eq!(build.hash_one(42u32), 42);
/// assert_eq!(build.hash_one((3u16, 4u16)), (3 << 16) | 4);
/// ```
///
/// [`IdPair`]: crate::IdPair
#[derive(Debug, Clone, Copy, Default)]
pub struct IdHasher {
    hash: u64,
    written: bool,
}

impl IdHasher {
    #[inline(always)]
    fn fold(&mut self, value: u64) {
        self.hash = if self.written {
            self.hash.rotate_left(16) ^ value
        } else {
            value
        };
        self.written = true;
    }
}

impl Hasher for IdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hash = (self.hash.rotate_left(5) ^ u64::from(byte)).wrapping_mul(FOLD_SEED);
        }
        self.written = true;
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.fold(u64::from(i));
    }

    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.fold(u64::from(i));
    }

    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.fold(u64::from(i));
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.fold(i);
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.fold(i as u64);
    }

    #[inline]
    fn write_i8(&mut self, i: i8) {
        self.write_u8(i as u8);
    }

    #[inline]
    fn write_i16(&mut self, i: i16) {
        self.write_u16(i as u16);
    }

    #[inline]
    fn write_i32(&mut self, i: i32) {
        self.write_u32(i as u32);
    }

    #[inline]
    fn write_i64(&mut self, i: i64) {
        self.write_u64(i as u64);
    }

    #[inline]
    fn write_isize(&mut self, i: isize) {
        self.write_usize(i as usize);
    }
}

/// Builds [`IdHasher`]s.
pub type BuildIdHasher = BuildHasherDefault<IdHasher>;
