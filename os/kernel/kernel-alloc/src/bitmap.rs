//! # Frame Bitmap
//!
//! One bit per 4 KiB frame, LSB-first within each byte: frame `i` lives in
//! byte `i / 8`, bit `i % 8`. A set bit means *used*.
//!
//! The bitmap borrows its storage (whole pages placed in physical memory
//! during boot) but only the first `len_bytes` bytes carry frame state.
//! Accesses beyond that bound are reported rather than performed, so a bad
//! index can never scribble past the bitmap.

use core::ops::Range;

/// Bounds-checked bit-set over borrowed storage.
pub struct FrameBitmap<'a> {
    storage: &'a mut [u8],
    len_bytes: usize,
}

impl<'a> FrameBitmap<'a> {
    /// Wrap `storage`, of which the first `len_bytes` bytes are meaningful.
    ///
    /// `len_bytes` is clamped to the storage length.
    #[must_use]
    pub fn new(storage: &'a mut [u8], len_bytes: usize) -> Self {
        let len_bytes = len_bytes.min(storage.len());
        Self { storage, len_bytes }
    }

    /// Number of addressable bits.
    #[inline]
    #[must_use]
    pub const fn len_bits(&self) -> u64 {
        (self.len_bytes as u64) * 8
    }

    #[inline]
    #[must_use]
    pub const fn len_bytes(&self) -> usize {
        self.len_bytes
    }

    /// Mark everything used, including storage past the logical end.
    pub fn fill_used(&mut self) {
        self.storage.fill(0xFF);
    }

    #[inline]
    fn locate(&self, bit: u64) -> Option<(usize, u8)> {
        let byte = usize::try_from(bit / 8).ok()?;
        if byte < self.len_bytes {
            Some((byte, 1u8 << (bit % 8)))
        } else {
            None
        }
    }

    /// Mark `bit` used. Returns the previous state, or `None` if out of range.
    #[inline]
    pub fn set(&mut self, bit: u64) -> Option<bool> {
        let (byte, mask) = self.locate(bit)?;
        let was = self.storage[byte] & mask != 0;
        self.storage[byte] |= mask;
        Some(was)
    }

    /// Mark `bit` free. Returns the previous state, or `None` if out of range.
    #[inline]
    pub fn clear(&mut self, bit: u64) -> Option<bool> {
        let (byte, mask) = self.locate(bit)?;
        let was = self.storage[byte] & mask != 0;
        self.storage[byte] &= !mask;
        Some(was)
    }

    /// State of `bit`, or `None` if out of range.
    #[inline]
    #[must_use]
    pub fn test(&self, bit: u64) -> Option<bool> {
        let (byte, mask) = self.locate(bit)?;
        Some(self.storage[byte] & mask != 0)
    }

    /// Whether `bit` is unavailable. Out-of-range bits count as used.
    #[inline]
    #[must_use]
    pub fn is_used(&self, bit: u64) -> bool {
        self.test(bit).unwrap_or(true)
    }

    /// Mark every in-range bit of `bits` used.
    pub fn set_range(&mut self, bits: Range<u64>) {
        let end = bits.end.min(self.len_bits());
        for bit in bits.start..end {
            self.set(bit);
        }
    }

    /// Mark every in-range bit of `bits` free.
    pub fn clear_range(&mut self, bits: Range<u64>) {
        let end = bits.end.min(self.len_bits());
        for bit in bits.start..end {
            self.clear(bit);
        }
    }

    /// Number of clear bits below `limit`.
    #[must_use]
    pub fn count_clear(&self, limit: u64) -> u64 {
        let limit = limit.min(self.len_bits());
        let full = usize::try_from(limit / 8).unwrap_or(self.len_bytes);
        let mut count = self.storage[..full]
            .iter()
            .map(|b| u64::from(b.count_zeros()))
            .sum::<u64>();
        for bit in (limit - limit % 8)..limit {
            if self.test(bit) == Some(false) {
                count += 1;
            }
        }
        count
    }

    /// The meaningful bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.len_bytes]
    }
}

impl core::fmt::Debug for FrameBitmap<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBitmap")
            .field("len_bytes", &self.len_bytes)
            .field("storage_bytes", &self.storage.len())
            .finish()
    }
}
