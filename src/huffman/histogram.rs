use std::io;

use crate::{bitstreams::BitInput, ALPH_SIZE, BITS_PER_WORD};

/// Occurrences of each byte value in a complete pass over an input.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Histogram {
    counts: [u64; ALPH_SIZE],
}

impl Default for Histogram {
    fn default() -> Self {
        Self { counts: [0; ALPH_SIZE] }
    }
}

impl Histogram {
    /// Drains `input` a byte at a time. The pseudo-EOF symbol is never counted here.
    pub fn from_input<I: BitInput + ?Sized>(input: &mut I) -> io::Result<Self> {
        let mut histo = Self::default();

        while let Some(byte) = input.read_bits(BITS_PER_WORD)? {
            histo.counts[byte as usize] += 1;
        }

        Ok(histo)
    }

    pub fn from_counts(counts: [u64; ALPH_SIZE]) -> Self {
        Self { counts }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut histo = Self::default();
        for &b in bytes {
            histo.counts[b as usize] += 1;
        }
        histo
    }

    #[inline(always)]
    pub fn count(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of byte values occurring at least once.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// `(byte, count)` pairs in ascending byte order, zero counts included.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts.iter().enumerate().map(|(b, &c)| (b as u8, c))
    }
}
