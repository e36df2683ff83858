/// rsync weak checksum over a fixed-size window.
///
/// `s1` is the byte sum and `s2` the position-weighted sum
/// `Σ (n - i) · byte[i]`, both wrapping modulo 2^32. Earlier bytes carry
/// more weight in `s2`, which is what lets a shifted window hash
/// differently from the original.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RollingChecksum {
    s1: u32,
    s2: u32,
    window: u32,
}

impl RollingChecksum {
    /// Computes the checksum of `block` from scratch. The window length is
    /// `block.len()` for every later [`roll`](Self::roll).
    #[inline]
    #[must_use]
    pub fn from_block(block: &[u8]) -> Self {
        let mut s1: u32 = 0;
        let mut s2: u32 = 0;
        // Summing the running s1 gives each byte a weight of (n - i).
        for &byte in block {
            s1 = s1.wrapping_add(u32::from(byte));
            s2 = s2.wrapping_add(s1);
        }
        #[allow(clippy::cast_possible_truncation)]
        let window = block.len() as u32;
        Self { s1, s2, window }
    }

    /// Slides the window one byte: `out` leaves at the front, `incoming`
    /// enters at the back.
    #[inline]
    pub const fn roll(&mut self, out: u8, incoming: u8) {
        let out = out as u32;
        let incoming = incoming as u32;
        // s2 depends on the updated s1.
        self.s1 = self.s1.wrapping_sub(out).wrapping_add(incoming);
        self.s2 = self
            .s2
            .wrapping_sub(self.window.wrapping_mul(out))
            .wrapping_add(self.s1);
    }

    /// Lookup key: `s2` in the high half, `s1` in the low half.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> u64 {
        ((self.s2 as u64) << 32) | self.s1 as u64
    }

    #[inline]
    #[must_use]
    pub const fn sum1(&self) -> u32 {
        self.s1
    }

    #[inline]
    #[must_use]
    pub const fn sum2(&self) -> u32 {
        self.s2
    }
}

/// Weak lookup key of `block`, computed from scratch.
#[inline]
#[must_use]
pub fn weak_key(block: &[u8]) -> u64 {
    RollingChecksum::from_block(block).key()
}
