//! Pre-order serialization of the code tree: an internal node is a `0` bit followed by its left
//! and right subtrees, a leaf is a `1` bit followed by its symbol in `BITS_PER_WORD + 1` bits.

use std::io;

use crate::{bitstreams::{BitInput, BitOutput}, error::{HuffError, Result}, ALPH_SIZE, BITS_PER_WORD, PSEUDO_EOF};

use super::HuffNode;

/// Deepest tree the encoder can produce: a chain over all 257 symbols.
pub const MAX_TREE_DEPTH: usize = ALPH_SIZE;
/// Number of distinct symbols, pseudo-EOF included.
pub const MAX_LEAVES: usize = ALPH_SIZE + 1;

const SYMBOL_BITS: u32 = BITS_PER_WORD + 1;

pub fn write_tree<O: BitOutput + ?Sized>(node: &HuffNode, out: &mut O) -> io::Result<()> {
    match node {
        HuffNode::Internal { left, right, .. } => {
            out.write_bits(1, 0)?;
            write_tree(left, out)?;
            write_tree(right, out)
        }
        HuffNode::Leaf { symbol, .. } => {
            out.write_bits(1, 1)?;
            out.write_bits(SYMBOL_BITS, *symbol as u32)
        }
    }
}

/// Rebuilds a tree written by [`write_tree`]. Weights are not transmitted and come back as 0.
pub fn read_tree<I: BitInput + ?Sized>(input: &mut I) -> Result<HuffNode> {
    let mut leaves = 0;
    read_node(input, 0, &mut leaves)
}

fn read_node<I: BitInput + ?Sized>(input: &mut I, depth: usize, leaves: &mut usize) -> Result<HuffNode> {
    let bit = input.read_bits(1)?
        .ok_or(HuffError::TruncatedStream("end of stream inside the tree header"))?;

    if bit == 0 {
        if depth >= MAX_TREE_DEPTH {
            return Err(HuffError::InvalidHeader(format!("tree deeper than {} levels", MAX_TREE_DEPTH)));
        }

        let left = read_node(input, depth + 1, leaves)?;
        let right = read_node(input, depth + 1, leaves)?;

        return Ok(HuffNode::Internal { weight: 0, left: Box::new(left), right: Box::new(right) });
    }

    let symbol = input.read_bits(SYMBOL_BITS)?
        .ok_or(HuffError::TruncatedStream("end of stream inside a leaf symbol"))?;

    if symbol > PSEUDO_EOF as u32 {
        return Err(HuffError::InvalidHeader(format!("leaf symbol {} out of range", symbol)));
    }

    *leaves += 1;
    if *leaves > MAX_LEAVES {
        return Err(HuffError::InvalidHeader(format!("more than {} leaves", MAX_LEAVES)));
    }

    Ok(HuffNode::leaf(symbol as u16, 0))
}
