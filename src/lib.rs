//! Lossless compression of byte streams with a static Huffman code.
//!
//! A compressed stream is the magic number [`HUFF_TREE`], the code tree in pre-order, the
//! codewords of the input bytes and finally the codeword of [`PSEUDO_EOF`], zero-padded to a
//! byte boundary. All fields are packed MSB-first.

pub mod bitstreams;
pub mod huffman;
pub mod codec;
pub mod properties;
pub mod error;

use std::path::Path;

use bitstreams::{BitInput, BitOutput};

pub use codec::{HuffCodec, HuffCodecBuilder, CompressionStats, DecompressionStats};
pub use error::{HuffError, Result};
pub use properties::Properties;

pub const BITS_PER_WORD: u32 = 8;
pub const BITS_PER_INT: u32 = 32;
pub const ALPH_SIZE: usize = 1 << BITS_PER_WORD;
/// End-of-payload marker, one past the largest byte value.
pub const PSEUDO_EOF: u16 = ALPH_SIZE as u16;
pub const HUFF_NUMBER: u32 = 0xface8200;
pub const HUFF_TREE: u32 = HUFF_NUMBER | 1;

/// A two-way byte-stream transformation working on bit streams and on files.
pub trait Processor {
    fn compress(&self, input: &mut dyn BitInput, output: &mut dyn BitOutput) -> Result<CompressionStats>;
    fn decompress(&self, input: &mut dyn BitInput, output: &mut dyn BitOutput) -> Result<DecompressionStats>;
    fn store(&self, source: &Path, basename: &str) -> Result<Properties>;
    fn load(&self, basename: &str, dest: &Path) -> Result<DecompressionStats>;
}
