use core::fmt;

/// Two 16-bit ids packed into a single 32-bit key.
///
/// The layout is fixed regardless of platform endianness: bits 31..16 hold
/// the `high` id and bits 15..0 hold the `low` id. An `IdPair` hashes as that
/// one packed `u32`, so with [`IdHasher`](crate::IdHasher) its hash is the
/// packed value itself.
///
/// # Examples
///
/// ```rust
/// use fish_table::IdPair;
///
/// let pair = IdPair::new(0x0102, 0x0304);
/// assert_eq!(pair.to_bits(), 0x0102_0304);
/// assert_eq!(pair.high(), 0x0102);
/// assert_eq!(pair.low(), 0x0304);
/// assert_eq!(IdPair::from_bits(0x0102_0304), pair);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IdPair(u32);

impl IdPair {
    /// Packs `high` into the upper and `low` into the lower 16 bits.
    #[inline]
    pub const fn new(high: u16, low: u16) -> Self {
        Self(((high as u32) << 16) | low as u32)
    }

    /// The id stored in bits 31..16.
    #[inline]
    pub const fn high(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// The id stored in bits 15..0.
    #[inline]
    pub const fn low(self) -> u16 {
        self.0 as u16
    }

    /// The packed representation.
    #[inline]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Reinterprets a packed value.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for IdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdPair")
            .field(&self.high())
            .field(&self.low())
            .finish()
    }
}

impl From<(u16, u16)> for IdPair {
    fn from((high, low): (u16, u16)) -> Self {
        Self::new(high, low)
    }
}

impl From<IdPair> for u32 {
    fn from(pair: IdPair) -> Self {
        pair.to_bits()
    }
}
