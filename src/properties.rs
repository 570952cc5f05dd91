use std::{collections::HashMap, io::{BufReader, Read}};

use crate::{codec::CompressionStats, error::{HuffError, Result}, HUFF_TREE};

/// Sidecar describing a compressed file, stored next to it as `<basename>.properties`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Properties {
    pub version: u32,
    pub magic: u32,
    pub original_length: u64,
    pub distinct_symbols: usize,
    pub header_bits: usize,
    pub payload_bits: usize,
    pub compressed_bits: usize,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            version: 0,
            magic: HUFF_TREE,
            original_length: 0,
            distinct_symbols: 0,
            header_bits: 0,
            payload_bits: 0,
            compressed_bits: 0,
        }
    }
}

impl Properties {
    /// Parses a `.properties` document.
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        let map = java_properties::read(BufReader::new(reader))
            .map_err(|e| HuffError::Properties(e.to_string()))?;

        Properties::try_from(map)
    }
}

fn parse_value<T: std::str::FromStr>(value: &HashMap<String, String>, key: &str) -> Result<Option<T>> {
    match value.get(key) {
        None => Ok(None),
        Some(v) => v.trim().parse()
            .map(Some)
            .map_err(|_| HuffError::Properties(format!("cannot parse {}={}", key, v))),
    }
}

fn parse_magic(v: &str) -> Result<u32> {
    let v = v.trim();
    let parsed = match v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => v.parse(),
    };

    parsed.map_err(|_| HuffError::Properties(format!("cannot parse magic={}", v)))
}

impl TryFrom<HashMap<String, String>> for Properties {
    type Error = HuffError;

    fn try_from(value: HashMap<String, String>) -> Result<Self> {
        let original_length = parse_value::<u64>(&value, "originallength")?
            .ok_or_else(|| HuffError::Properties("missing originallength".to_string()))?;

        let mut props = Properties {
            original_length,
            ..Default::default()
        };

        if let Some(version) = parse_value::<u32>(&value, "version")? {
            if version != 0 {
                return Err(HuffError::Properties(format!("unsupported version {}", version)));
            }
        }
        if let Some(magic) = value.get("magic") {
            props.magic = parse_magic(magic)?;
        }
        if let Some(distinct_symbols) = parse_value(&value, "distinctsymbols")? {
            props.distinct_symbols = distinct_symbols;
        }
        if let Some(header_bits) = parse_value(&value, "headerbits")? {
            props.header_bits = header_bits;
        }
        if let Some(payload_bits) = parse_value(&value, "payloadbits")? {
            props.payload_bits = payload_bits;
        }
        if let Some(compressed_bits) = parse_value(&value, "compressedbits")? {
            props.compressed_bits = compressed_bits;
        }

        Ok(props)
    }
}

impl From<&CompressionStats> for Properties {
    fn from(stats: &CompressionStats) -> Self {
        Properties {
            original_length: stats.input_bytes,
            distinct_symbols: stats.distinct_symbols,
            header_bits: stats.header_bits,
            payload_bits: stats.payload_bits,
            compressed_bits: stats.output_bits,
            ..Default::default()
        }
    }
}

impl From<Properties> for String {
    fn from(val: Properties) -> Self {
        let mut s = String::new();

        s.push_str("#Huffman properties\n");
        s.push_str(&format!("version={}\n", val.version));
        s.push_str(&format!("magic={:#010x}\n", val.magic));
        s.push_str(&format!("originallength={}\n", val.original_length));
        s.push_str(&format!("distinctsymbols={}\n", val.distinct_symbols));
        s.push_str(&format!("headerbits={}\n", val.header_bits));
        s.push_str(&format!("payloadbits={}\n", val.payload_bits));
        s.push_str(&format!("compressedbits={}\n", val.compressed_bits));

        s
    }
}
