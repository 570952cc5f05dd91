use std::io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom, Write};

/// Bytes buffered by the stream adapters before touching the underlying reader or writer.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Source of MSB-first packed bits.
pub trait BitInput {
    /// Reads the next `n` bits (`1 <= n <= 32`) as an unsigned integer.
    ///
    /// Returns `Ok(None)` if fewer than `n` bits remain; every later read returns `Ok(None)`
    /// as well until the stream is reset.
    fn read_bits(&mut self, n: u32) -> io::Result<Option<u32>>;

    /// Rewinds to the first bit of the source. Fails with [`ErrorKind::Unsupported`] when the
    /// source cannot be rewound.
    fn reset(&mut self) -> io::Result<()>;

    fn bits_read(&self) -> usize;
}

/// Sink of MSB-first packed bits.
pub trait BitOutput {
    /// Writes the low `n` bits (`1 <= n <= 32`) of `value`, most significant first.
    fn write_bits(&mut self, n: u32, value: u32) -> io::Result<()>;

    /// Zero-pads the trailing partial byte and flushes. Closing twice is a no-op.
    fn close(&mut self) -> io::Result<()>;

    /// Number of bits written so far, padding excluded.
    fn bits_written(&self) -> usize;
}

pub struct BinaryWriter {
    pub os: Box<[u8]>,
}

pub struct BinaryWriterBuilder {
    os: Vec<u8>,
    pub written_bits: usize,
    pub current: u64,
    pub free: usize,
    temp_buffer: [u8; 4],
}

impl Default for BinaryWriterBuilder {
    fn default() -> Self {
        BinaryWriterBuilder {
            os: Vec::default(),
            written_bits: 0,
            current: 0,
            free: 8,
            temp_buffer: [0u8; 4],
        }
    }
}

impl BinaryWriterBuilder {
    pub fn build(mut self) -> BinaryWriter {
        self.pad();

        BinaryWriter {
            os: self.os.into_boxed_slice()
        }
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// The whole bytes produced so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.os
    }

    /// Hands out the whole bytes produced so far; the partial byte stays in `current`.
    pub fn take_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.os)
    }

    /// Flushes the partial byte, if any, with zeros in its low bits.
    pub fn pad(&mut self) {
        if self.free < 8 {
            self.write(self.current);
            self.free = 8;
            self.current = 0;
        }
    }

    #[inline(always)]
    pub fn write(&mut self, b: u64) {
        self.os.push(b as u8);
    }

    #[inline(always)]
    pub fn write_in_current(&mut self, b: u64, len: u64) -> u64 {
        self.free -= len as usize;
        self.current |= (b & ((1 << len) - 1)) << self.free;

        if self.free == 0 {
            self.write(self.current);
            self.free = 8;
            self.current = 0;
        }

        self.written_bits += len as usize;
        len
    }

    #[inline(always)]
    pub fn push_bits(&mut self, x: u64, len: u64) -> u64 {
        assert!((1..=32).contains(&len), "Cannot write {} bits at once", len);

        if len <= self.free as u64 {
            return self.write_in_current(x, len);
        }

        let mut x = x;

        let q = (len - self.free as u64) & 7;
        let blocks = (len - self.free as u64) >> 3;

        if q != 0 {
            self.temp_buffer[blocks as usize] = x as u8;
            x >>= q;
        }

        let mut i = blocks;
        while i != 0 {
            i -= 1;
            self.temp_buffer[i as usize] = x as u8;
            x >>= 8;
        }

        self.write_in_current(x, self.free as u64);

        for i in 0..blocks {
            self.write(self.temp_buffer[i as usize] as u64);
        }

        self.written_bits += (blocks << 3) as usize;

        if q != 0 {
            self.write_in_current(self.temp_buffer[blocks as usize] as u64, q);
        }

        len
    }
}

impl BitOutput for BinaryWriterBuilder {
    #[inline(always)]
    fn write_bits(&mut self, n: u32, value: u32) -> io::Result<()> {
        self.push_bits(value as u64, n as u64);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.pad();
        Ok(())
    }

    fn bits_written(&self) -> usize {
        self.written_bits
    }
}

/// Bit sink over any [`Write`]r. Whole bytes are collected in a [`BinaryWriterBuilder`] and
/// handed to the writer once `buffer_size` of them are pending.
///
/// Bits still buffered are lost unless [`BitOutput::close`] is called.
pub struct BitOutputStream<W: Write> {
    inner: W,
    buffer: BinaryWriterBuilder,
    buffer_size: usize,
}

impl<W: Write> BitOutputStream<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: BinaryWriterBuilder::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn drain(&mut self) -> io::Result<()> {
        let bytes = self.buffer.take_bytes();
        self.inner.write_all(&bytes)
    }
}

impl<W: Write> BitOutput for BitOutputStream<W> {
    fn write_bits(&mut self, n: u32, value: u32) -> io::Result<()> {
        self.buffer.push_bits(value as u64, n as u64);

        if self.buffer.as_bytes().len() >= self.buffer_size {
            self.drain()?;
        }

        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.buffer.pad();
        self.drain()?;
        self.inner.flush()
    }

    fn bits_written(&self) -> usize {
        self.buffer.written_bits
    }
}

fn rewind_to_start<R: Seek>(inner: &mut R) -> io::Result<u64> {
    inner.seek(SeekFrom::Start(0))
}

/// Bit source over any [`Read`]er.
///
/// Streams built with [`BitInputStream::new`] are forward-only; [`BitInputStream::rewindable`]
/// keeps a way back to offset zero so the source can be scanned twice.
pub struct BitInputStream<R> {
    inner: R,
    rewind: Option<fn(&mut R) -> io::Result<u64>>,
    buffer: Box<[u8]>,
    position: usize,  // Next byte of 'buffer' to be consumed
    avail: usize,  // Number of valid bytes in 'buffer'
    current: u64,  // Bit buffer: the lowest 'fill' bits are still unread
    fill: usize,
    read_bits: usize,
    exhausted: bool,
}

/// In-memory rewindable bit source.
pub type BinaryReader = BitInputStream<Cursor<Box<[u8]>>>;

impl BinaryReader {
    pub fn from_bytes(input_stream: impl Into<Box<[u8]>>) -> Self {
        Self::rewindable(Cursor::new(input_stream.into()))
    }
}

impl<R: Read> BitInputStream<R> {
    pub fn new(inner: R) -> Self {
        Self::with_rewind(inner, None)
    }

    fn with_rewind(inner: R, rewind: Option<fn(&mut R) -> io::Result<u64>>) -> Self {
        Self {
            inner,
            rewind,
            buffer: vec![0u8; DEFAULT_BUFFER_SIZE].into_boxed_slice(),
            position: 0,
            avail: 0,
            current: 0,
            fill: 0,
            read_bits: 0,
            exhausted: false,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer = vec![0u8; buffer_size.max(1)].into_boxed_slice();
        self.position = 0;
        self.avail = 0;
        self
    }

    /// Reads the next byte from the stream, refilling the byte buffer when it runs dry.
    fn read(&mut self) -> io::Result<Option<u8>> {
        if self.position == self.avail {
            self.avail = loop {
                match self.inner.read(&mut self.buffer) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            };
            self.position = 0;

            if self.avail == 0 {
                return Ok(None);
            }
        }

        self.position += 1;
        Ok(Some(self.buffer[self.position - 1]))
    }
}

impl<R: Read + Seek> BitInputStream<R> {
    pub fn rewindable(inner: R) -> Self {
        Self::with_rewind(inner, Some(rewind_to_start::<R>))
    }
}

impl<R: Read> BitInput for BitInputStream<R> {
    fn read_bits(&mut self, n: u32) -> io::Result<Option<u32>> {
        assert!((1..=32).contains(&n), "Cannot read {} bits at once", n);

        if self.exhausted {
            return Ok(None);
        }

        let n = n as usize;

        while self.fill < n {
            match self.read()? {
                Some(byte) => {
                    self.current = (self.current << 8) | byte as u64;
                    self.fill += 8;
                }
                None => {
                    self.exhausted = true;
                    return Ok(None);
                }
            }
        }

        self.fill -= n;
        self.read_bits += n;

        Ok(Some((self.current >> self.fill & ((1 << n) - 1)) as u32))
    }

    fn reset(&mut self) -> io::Result<()> {
        let rewind = self.rewind.ok_or_else(|| {
            io::Error::new(ErrorKind::Unsupported, "the bit input stream is not rewindable")
        })?;

        rewind(&mut self.inner)?;

        self.position = 0;
        self.avail = 0;
        self.current = 0;
        self.fill = 0;
        self.read_bits = 0;
        self.exhausted = false;

        Ok(())
    }

    fn bits_read(&self) -> usize {
        self.read_bits
    }
}

#[cfg(test)]
mod tests;
