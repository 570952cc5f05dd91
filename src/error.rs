use std::io;

/// Errors raised while compressing or decompressing a Huffman stream.
#[derive(Debug, thiserror::Error)]
pub enum HuffError {
    /// The first 32 bits of the stream are not the magic number.
    #[error("invalid magic number {0:#010x}")]
    HeaderMismatch(u32),

    /// The stream ended in the middle of the tree header or of a codeword.
    #[error("truncated stream: {0}")]
    TruncatedStream(&'static str),

    /// The tree header was read completely but does not describe a usable tree.
    #[error("invalid tree header: {0}")]
    InvalidHeader(String),

    /// Compression needs two passes over its input.
    #[error("the input source cannot be rewound")]
    Unrewindable,

    #[error("malformed properties: {0}")]
    Properties(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, HuffError>;
