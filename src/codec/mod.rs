use std::{fs::{self, File}, io::{self, ErrorKind}, path::Path, time::Instant};

use tracing::{debug, info, warn};

use crate::{
    bitstreams::{BinaryReader, BinaryWriterBuilder, BitInput, BitInputStream, BitOutput, BitOutputStream, DEFAULT_BUFFER_SIZE},
    error::{HuffError, Result},
    huffman::{read_tree, write_tree, Histogram, HuffNode, HuffmanTree},
    properties::Properties,
    Processor, BITS_PER_INT, BITS_PER_WORD, HUFF_TREE, PSEUDO_EOF,
};

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct CompressionStats {
    pub input_bytes: u64,
    pub distinct_symbols: usize,
    /// Magic number and tree.
    pub header_bits: usize,
    /// Codewords of the input bytes and of the end marker.
    pub payload_bits: usize,
    /// Everything written, padding excluded.
    pub output_bits: usize,
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct DecompressionStats {
    pub header_bits: usize,
    /// Bits consumed up to and including the end marker.
    pub input_bits: usize,
    pub output_bytes: u64,
}

pub struct HuffCodecBuilder {
    buffer_size: usize,
}

impl Default for HuffCodecBuilder {
    fn default() -> Self {
        Self { buffer_size: DEFAULT_BUFFER_SIZE }
    }
}

impl HuffCodecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the byte buffers used by [`HuffCodec::store`] and [`HuffCodec::load`].
    pub fn set_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn build(self) -> HuffCodec {
        HuffCodec { buffer_size: self.buffer_size.max(1) }
    }
}

#[derive(Clone, Debug)]
pub struct HuffCodec {
    buffer_size: usize,
}

impl Default for HuffCodec {
    fn default() -> Self {
        HuffCodecBuilder::new().build()
    }
}

impl HuffCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compresses everything `input` holds. The input is read twice, so it must support
    /// [`BitInput::reset`]. The output is closed whether or not compression succeeds.
    pub fn compress<I, O>(&self, input: &mut I, output: &mut O) -> Result<CompressionStats>
    where
        I: BitInput + ?Sized,
        O: BitOutput + ?Sized,
    {
        let result = Self::encode(input, output);
        close_after(output, result)
    }

    fn encode<I, O>(input: &mut I, output: &mut O) -> Result<CompressionStats>
    where
        I: BitInput + ?Sized,
        O: BitOutput + ?Sized,
    {
        let histo = Histogram::from_input(input)?;
        let tree = HuffmanTree::build(&histo);

        input.reset().map_err(|e| match e.kind() {
            ErrorKind::Unsupported => HuffError::Unrewindable,
            _ => HuffError::Io(e),
        })?;

        let start = output.bits_written();

        output.write_bits(BITS_PER_INT, HUFF_TREE)?;
        write_tree(&tree.root, output)?;

        let header_bits = output.bits_written() - start;

        let codebook = tree.codebook();
        let mut input_bytes = 0;

        while let Some(byte) = input.read_bits(BITS_PER_WORD)? {
            let code = codebook.get(byte as u16).ok_or_else(|| {
                io::Error::new(ErrorKind::InvalidData, format!("byte {} was not seen while counting the input", byte))
            })?;

            code.write_to(output)?;
            input_bytes += 1;
        }

        if input_bytes != histo.total() {
            return Err(io::Error::new(ErrorKind::InvalidData, "the input changed between the two passes").into());
        }

        if let Some(eof) = codebook.get(PSEUDO_EOF) {
            eof.write_to(output)?;
        }

        let output_bits = output.bits_written() - start;
        let stats = CompressionStats {
            input_bytes,
            distinct_symbols: histo.distinct(),
            header_bits,
            payload_bits: output_bits - header_bits,
            output_bits,
        };

        debug!(
            input_bytes = stats.input_bytes,
            distinct_symbols = stats.distinct_symbols,
            tree_depth = tree.root.depth(),
            header_bits = stats.header_bits,
            payload_bits = stats.payload_bits,
            "compressed stream"
        );

        Ok(stats)
    }

    /// Decodes a stream produced by [`HuffCodec::compress`]. Bits after the end marker are
    /// ignored. The output is closed whether or not decompression succeeds.
    pub fn decompress<I, O>(&self, input: &mut I, output: &mut O) -> Result<DecompressionStats>
    where
        I: BitInput + ?Sized,
        O: BitOutput + ?Sized,
    {
        let result = Self::decode(input, output);
        close_after(output, result)
    }

    fn decode<I, O>(input: &mut I, output: &mut O) -> Result<DecompressionStats>
    where
        I: BitInput + ?Sized,
        O: BitOutput + ?Sized,
    {
        let start = input.bits_read();

        let magic = input.read_bits(BITS_PER_INT)?
            .ok_or(HuffError::TruncatedStream("end of stream inside the magic number"))?;

        if magic != HUFF_TREE {
            return Err(HuffError::HeaderMismatch(magic));
        }

        let root = read_tree(input)?;
        let header_bits = input.bits_read() - start;
        let mut output_bytes = 0;

        match &root {
            // Empty input: nothing follows the header.
            HuffNode::Leaf { symbol: PSEUDO_EOF, .. } => {}
            HuffNode::Leaf { symbol, .. } => {
                return Err(HuffError::InvalidHeader(format!("lone leaf {} is not the end marker", symbol)));
            }
            HuffNode::Internal { .. } => {
                let mut current = &root;

                loop {
                    let bit = input.read_bits(1)?
                        .ok_or(HuffError::TruncatedStream("end of stream before the end marker"))?;

                    current = current.child(bit == 1)
                        .ok_or_else(|| HuffError::InvalidHeader("descended past a leaf".to_string()))?;

                    if let HuffNode::Leaf { symbol, .. } = current {
                        if *symbol == PSEUDO_EOF {
                            break;
                        }

                        output.write_bits(BITS_PER_WORD, *symbol as u32)?;
                        output_bytes += 1;
                        current = &root;
                    }
                }
            }
        }

        let stats = DecompressionStats {
            header_bits,
            input_bits: input.bits_read() - start,
            output_bytes,
        };

        debug!(
            leaves = root.leaf_count(),
            header_bits = stats.header_bits,
            input_bits = stats.input_bits,
            output_bytes = stats.output_bytes,
            "decompressed stream"
        );

        Ok(stats)
    }

    pub fn compress_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut input = BinaryReader::from_bytes(data);
        let mut output = BinaryWriterBuilder::new();

        self.compress(&mut input, &mut output)?;

        Ok(output.build().os.into_vec())
    }

    pub fn decompress_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut input = BinaryReader::from_bytes(data);
        let mut output = BinaryWriterBuilder::new();

        self.decompress(&mut input, &mut output)?;

        Ok(output.build().os.into_vec())
    }

    /// Compresses the file at `source` into `<basename>.huff` and describes the result in
    /// `<basename>.properties`.
    pub fn store(&self, source: &Path, basename: &str) -> Result<Properties> {
        let comp_time = Instant::now();

        let mut input = BitInputStream::rewindable(File::open(source)?)
            .with_buffer_size(self.buffer_size);
        let mut output = BitOutputStream::new(File::create(format!("{}.huff", basename))?)
            .with_buffer_size(self.buffer_size);

        let stats = self.compress(&mut input, &mut output)?;

        let props = Properties::from(&stats);
        fs::write(format!("{}.properties", basename), String::from(props.clone()))?;

        info!(
            source = %source.display(),
            basename,
            original_bytes = stats.input_bytes,
            compressed_bits = stats.output_bits,
            elapsed_ns = comp_time.elapsed().as_nanos() as u64,
            "compressed file"
        );

        Ok(props)
    }

    /// Decompresses `<basename>.huff` into `dest`. When `<basename>.properties` exists, the
    /// decoded length must match the recorded one.
    pub fn load(&self, basename: &str, dest: &Path) -> Result<DecompressionStats> {
        let decomp_time = Instant::now();

        let props = match File::open(format!("{}.properties", basename)) {
            Ok(file) => Some(Properties::read(file)?),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        if let Some(props) = &props {
            if props.magic != HUFF_TREE {
                return Err(HuffError::HeaderMismatch(props.magic));
            }
        }

        let mut input = BitInputStream::new(File::open(format!("{}.huff", basename))?)
            .with_buffer_size(self.buffer_size);
        let mut output = BitOutputStream::new(File::create(dest)?)
            .with_buffer_size(self.buffer_size);

        let stats = self.decompress(&mut input, &mut output)?;

        if let Some(props) = &props {
            if props.original_length != stats.output_bytes {
                return Err(HuffError::Properties(format!(
                    "decoded {} bytes, {}.properties records {}",
                    stats.output_bytes, basename, props.original_length
                )));
            }
        }

        info!(
            basename,
            dest = %dest.display(),
            decompressed_bytes = stats.output_bytes,
            elapsed_ns = decomp_time.elapsed().as_nanos() as u64,
            "decompressed file"
        );

        Ok(stats)
    }
}

impl Processor for HuffCodec {
    fn compress(&self, input: &mut dyn BitInput, output: &mut dyn BitOutput) -> Result<CompressionStats> {
        HuffCodec::compress(self, input, output)
    }

    fn decompress(&self, input: &mut dyn BitInput, output: &mut dyn BitOutput) -> Result<DecompressionStats> {
        HuffCodec::decompress(self, input, output)
    }

    fn store(&self, source: &Path, basename: &str) -> Result<Properties> {
        HuffCodec::store(self, source, basename)
    }

    fn load(&self, basename: &str, dest: &Path) -> Result<DecompressionStats> {
        HuffCodec::load(self, basename, dest)
    }
}

/// Closes `output` and reports the first failure: the driver's own error wins over a close error.
fn close_after<T, O: BitOutput + ?Sized>(output: &mut O, result: Result<T>) -> Result<T> {
    let closed = output.close();

    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!(error = %close_err, "closing the output failed after an earlier error");
            Err(e)
        }
    }
}
