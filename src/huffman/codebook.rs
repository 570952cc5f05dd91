use std::{fmt, io};

use crate::{bitstreams::BitOutput, ALPH_SIZE};

use super::HuffNode;

/// A codeword as a string of bits packed MSB-first.
///
/// The length is not capped: a maximally skewed tree over 257 leaves has codes of up to 256 bits.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Codeword {
    bits: Vec<u8>,
    len: usize,
    short: Option<u32>,  // Whole code as an integer when it fits a single write
}

impl Codeword {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn bit(&self, i: usize) -> bool {
        assert!(i < self.len, "Bit {} out of a {}-bit codeword", i, self.len);
        self.bits[i >> 3] >> (7 - (i & 7)) & 1 == 1
    }

    pub fn is_prefix_of(&self, other: &Codeword) -> bool {
        self.len <= other.len && (0..self.len).all(|i| self.bit(i) == other.bit(i))
    }

    fn push(&mut self, bit: bool) {
        if self.len & 7 == 0 {
            self.bits.push(0);
        }
        if bit {
            self.bits[self.len >> 3] |= 1 << (7 - (self.len & 7));
        }
        self.len += 1;
    }

    fn pop(&mut self) {
        self.len -= 1;
        self.bits[self.len >> 3] &= !(1 << (7 - (self.len & 7)));
        if self.len & 7 == 0 {
            self.bits.pop();
        }
    }

    fn freeze(&self) -> Codeword {
        let short = (self.len <= 32).then(|| (0..self.len).fold(0u32, |acc, i| acc << 1 | self.bit(i) as u32));

        Codeword { bits: self.bits.clone(), len: self.len, short }
    }

    /// Emits the codeword, first bit first. An empty codeword writes nothing.
    #[inline(always)]
    pub fn write_to<O: BitOutput + ?Sized>(&self, out: &mut O) -> io::Result<()> {
        if self.len == 0 {
            return Ok(());
        }

        if let Some(word) = self.short {
            return out.write_bits(self.len as u32, word);
        }

        let whole = self.len >> 3;
        for &byte in self.bits[..whole].iter() {
            out.write_bits(8, byte as u32)?;
        }

        let rest = self.len & 7;
        if rest != 0 {
            out.write_bits(rest as u32, (self.bits[whole] >> (8 - rest)) as u32)?;
        }

        Ok(())
    }
}

impl fmt::Display for Codeword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Codeword of every leaf symbol of a tree, indexed by symbol.
#[derive(Clone, Debug)]
pub struct Codebook {
    codes: Vec<Option<Codeword>>,
}

impl Codebook {
    /// Walks the tree depth-first, appending 0 on every left descent and 1 on every right one.
    pub fn from_tree(root: &HuffNode) -> Self {
        let mut codebook = Codebook { codes: vec![None; ALPH_SIZE + 1] };
        let mut path = Codeword::default();

        codebook.assign(root, &mut path);

        codebook
    }

    fn assign(&mut self, node: &HuffNode, path: &mut Codeword) {
        match node {
            HuffNode::Leaf { symbol, .. } => {
                self.codes[*symbol as usize] = Some(path.freeze());
            }
            HuffNode::Internal { left, right, .. } => {
                path.push(false);
                self.assign(left, path);
                path.pop();

                path.push(true);
                self.assign(right, path);
                path.pop();
            }
        }
    }

    #[inline(always)]
    pub fn get(&self, symbol: u16) -> Option<&Codeword> {
        self.codes.get(symbol as usize).and_then(|c| c.as_ref())
    }

    /// `(symbol, codeword)` pairs of the symbols present in the tree, ascending by symbol.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Codeword)> + '_ {
        self.codes.iter()
            .enumerate()
            .filter_map(|(s, c)| c.as_ref().map(|c| (s as u16, c)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_len(&self) -> usize {
        self.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }
}
