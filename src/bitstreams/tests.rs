use std::io::{self, Cursor, ErrorKind, Read, Write};

use rand::Rng;

use super::{BinaryReader, BinaryWriterBuilder, BitInput, BitInputStream, BitOutput, BitOutputStream};

fn drain_bits(reader: &mut impl BitInput, widths: &[u32]) -> Vec<Option<u32>> {
    widths.iter().map(|&w| reader.read_bits(w).unwrap()).collect()
}

#[test]
fn test_writer_packs_msb_first() {
    let mut writer = BinaryWriterBuilder::new();

    writer.push_bits(0b101, 3);
    writer.push_bits(0b11, 2);

    assert_eq!(writer.written_bits, 5);
    assert_eq!(&*writer.build().os, &[0b1011_1000]);
}

#[test]
fn test_writer_spans_byte_boundaries() {
    let mut writer = BinaryWriterBuilder::new();

    writer.push_bits(1, 1);
    writer.push_bits(0xface8201, 32);
    writer.push_bits(0b1111111, 7);

    assert_eq!(writer.written_bits, 40);
    assert_eq!(&*writer.build().os, &[0xfd, 0x67, 0x41, 0x00, 0xff]);
}

#[test]
fn test_writer_without_partial_byte_adds_no_padding() {
    let mut writer = BinaryWriterBuilder::new();

    writer.push_bits(0xab, 8);

    assert_eq!(&*writer.build().os, &[0xab]);
}

#[test]
fn test_writer_close_is_idempotent() {
    let mut writer = BinaryWriterBuilder::new();

    writer.write_bits(3, 0b111).unwrap();
    writer.close().unwrap();
    writer.close().unwrap();

    assert_eq!(writer.as_bytes(), &[0b1110_0000]);
    assert_eq!(writer.bits_written(), 3);
}

#[test]
fn test_reader_reads_fields_msb_first() {
    let mut reader = BinaryReader::from_bytes(vec![0xfa, 0xce, 0x82, 0x01, 0b1011_0000]);

    assert_eq!(reader.read_bits(32).unwrap(), Some(0xface8201));
    assert_eq!(reader.read_bits(1).unwrap(), Some(1));
    assert_eq!(reader.read_bits(3).unwrap(), Some(0b011));
    assert_eq!(reader.bits_read(), 36);
}

#[test]
fn test_reader_end_of_stream_is_sticky() {
    let mut reader = BinaryReader::from_bytes(vec![0xff]);

    assert_eq!(reader.read_bits(5).unwrap(), Some(0b11111));
    assert_eq!(reader.read_bits(4).unwrap(), None);
    // Three bits are still buffered, but the stream stays exhausted.
    assert_eq!(reader.read_bits(1).unwrap(), None);
    assert_eq!(reader.read_bits(3).unwrap(), None);
}

#[test]
fn test_reader_reset_rewinds_to_start() {
    let mut reader = BinaryReader::from_bytes(vec![0x12, 0x34]);

    assert_eq!(reader.read_bits(16).unwrap(), Some(0x1234));
    assert_eq!(reader.read_bits(1).unwrap(), None);

    reader.reset().unwrap();

    assert_eq!(reader.bits_read(), 0);
    assert_eq!(reader.read_bits(4).unwrap(), Some(0x1));
    assert_eq!(reader.read_bits(12).unwrap(), Some(0x234));
}

#[test]
fn test_forward_only_stream_refuses_reset() {
    let mut reader = BitInputStream::new(&[0u8, 1, 2][..]);

    let err = reader.reset().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn test_reader_refills_small_buffer() {
    let data: Vec<u8> = (0..=255).collect();
    let mut reader = BitInputStream::rewindable(Cursor::new(data.clone())).with_buffer_size(3);

    for &b in data.iter() {
        assert_eq!(reader.read_bits(8).unwrap(), Some(b as u32));
    }
    assert_eq!(reader.read_bits(8).unwrap(), None);
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(ErrorKind::BrokenPipe, "gone"))
    }
}

#[test]
fn test_reader_propagates_io_errors() {
    let mut reader = BitInputStream::new(FailingReader);

    let err = reader.read_bits(8).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BrokenPipe);
}

#[test]
fn test_output_stream_drains_and_pads_on_close() {
    let mut out = BitOutputStream::new(Vec::new()).with_buffer_size(2);

    for _ in 0..5 {
        out.write_bits(8, 0xaa).unwrap();
    }
    out.write_bits(2, 0b11).unwrap();

    // Only whole buffers have reached the sink so far.
    assert_eq!(out.get_ref().len(), 4);

    out.close().unwrap();

    assert_eq!(out.bits_written(), 42);
    assert_eq!(out.into_inner(), vec![0xaa, 0xaa, 0xaa, 0xaa, 0xaa, 0b1100_0000]);
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(ErrorKind::PermissionDenied, "read-only"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_output_stream_propagates_io_errors() {
    let mut out = BitOutputStream::new(FailingWriter);

    out.write_bits(4, 0xf).unwrap();
    let err = out.close().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[test]
fn test_random_fields_read_back() {
    let mut rng = rand::thread_rng();
    let fields: Vec<(u32, u32)> = (0..10_000)
        .map(|_| {
            let width = rng.gen_range(1..=32);
            let value = if width == 32 { rng.gen() } else { rng.gen_range(0..(1u32 << width)) };
            (width, value)
        })
        .collect();

    let mut writer = BinaryWriterBuilder::new();
    for &(width, value) in fields.iter() {
        writer.write_bits(width, value).unwrap();
    }
    let total_bits = writer.written_bits;
    let mut reader = BinaryReader::from_bytes(writer.build().os);

    let widths: Vec<u32> = fields.iter().map(|f| f.0).collect();
    let read = drain_bits(&mut reader, &widths);

    for (&(_, value), got) in fields.iter().zip(read) {
        assert_eq!(got, Some(value));
    }
    assert_eq!(reader.bits_read(), total_bits);
}
