//! GPMF key-length-value tokenizer
//!
//! Turns raw GPMF bytes into a tree of [`KlvItem`]s. Every record starts with
//! an 8-byte header (FourCC, type char, struct size, big-endian repeat count)
//! followed by `struct_size * repeat` payload bytes padded to 4 bytes. Type 0
//! marks a container whose payload is itself a sequence of records.
//!
//! The tokenizer knows nothing about GPS; see [`crate::parser::gps`].

use crate::error::{GpmfError, Result};
use crate::parser::helpers::{latin1_to_string, padded_len, q15_16_to_f64, q31_32_to_f64};
use crate::parser::stream::KlvStream;
use crate::types::{KlvItem, KlvValue, NumericArray};

const HEADER_LEN: usize = 8;

/// Deepest container nesting accepted; real streams use DEVC > STRM > record
pub const MAX_NESTING_DEPTH: usize = 8;

/// Size in bytes of one element of a numeric type, `None` for non-numeric types
pub fn element_size(type_code: u8) -> Option<usize> {
    match type_code {
        b'b' | b'B' => Some(1),
        b's' | b'S' => Some(2),
        b'l' | b'L' | b'f' | b'q' => Some(4),
        b'd' | b'j' | b'J' | b'Q' => Some(8),
        _ => None,
    }
}

fn read_number(type_code: u8, bytes: &[u8]) -> Result<f64> {
    let value = match (type_code, bytes) {
        (b'b', &[a]) => a as i8 as f64,
        (b'B', &[a]) => a as f64,
        (b's', &[a, b]) => i16::from_be_bytes([a, b]) as f64,
        (b'S', &[a, b]) => u16::from_be_bytes([a, b]) as f64,
        (b'l', &[a, b, c, d]) => i32::from_be_bytes([a, b, c, d]) as f64,
        (b'L', &[a, b, c, d]) => u32::from_be_bytes([a, b, c, d]) as f64,
        (b'f', &[a, b, c, d]) => f32::from_be_bytes([a, b, c, d]) as f64,
        (b'q', &[a, b, c, d]) => q15_16_to_f64(i32::from_be_bytes([a, b, c, d])),
        (b'd', bytes) if bytes.len() == 8 => f64::from_be_bytes(to_array8(bytes)),
        (b'j', bytes) if bytes.len() == 8 => i64::from_be_bytes(to_array8(bytes)) as f64,
        (b'J', bytes) if bytes.len() == 8 => u64::from_be_bytes(to_array8(bytes)) as f64,
        (b'Q', bytes) if bytes.len() == 8 => q31_32_to_f64(i64::from_be_bytes(to_array8(bytes))),
        _ => {
            return Err(GpmfError::InvalidData(format!(
                "cannot read {} bytes as type '{}'",
                bytes.len(),
                type_code as char
            )))
        }
    };
    Ok(value)
}

fn to_array8(bytes: &[u8]) -> [u8; 8] {
    let mut array = [0u8; 8];
    array.copy_from_slice(&bytes[..8]);
    array
}

/// Decode a payload of a single numeric type into a row-major array
fn decode_numeric(type_code: u8, struct_size: usize, payload: &[u8]) -> Result<NumericArray> {
    let size = element_size(type_code).ok_or(GpmfError::InvalidType(type_code))?;
    if struct_size % size != 0 {
        return Err(GpmfError::InvalidData(format!(
            "struct size {} is not a multiple of '{}' element size {}",
            struct_size, type_code as char, size
        )));
    }

    let values = payload
        .chunks_exact(size)
        .map(|chunk| read_number(type_code, chunk))
        .collect::<Result<Vec<f64>>>()?;

    Ok(NumericArray::new((struct_size / size).max(1), values))
}

/// Decode a `?` payload using the layout from a preceding TYPE record
fn decode_complex(layout: &[u8], struct_size: usize, payload: &[u8]) -> Result<NumericArray> {
    let sizes = layout
        .iter()
        .map(|&t| element_size(t).ok_or(GpmfError::InvalidType(t)))
        .collect::<Result<Vec<usize>>>()?;

    let row_size: usize = sizes.iter().sum();
    if row_size != struct_size {
        return Err(GpmfError::InvalidData(format!(
            "TYPE {:?} describes {} bytes but struct size is {}",
            latin1_to_string(layout),
            row_size,
            struct_size
        )));
    }

    let mut values = Vec::with_capacity(payload.len() / row_size.max(1) * layout.len());
    for row in payload.chunks_exact(row_size.max(1)) {
        let mut offset = 0;
        for (&type_code, &size) in layout.iter().zip(&sizes) {
            values.push(read_number(type_code, &row[offset..offset + size])?);
            offset += size;
        }
    }

    Ok(NumericArray::new(layout.len(), values))
}

/// Split fixed-width text; size 1 means one string spanning the whole payload
fn decode_text(struct_size: usize, payload: &[u8]) -> Vec<String> {
    if struct_size <= 1 {
        vec![latin1_to_string(payload)]
    } else {
        payload.chunks(struct_size).map(latin1_to_string).collect()
    }
}

fn decode_value(
    type_code: u8,
    struct_size: usize,
    payload: &[u8],
    layout: Option<&[u8]>,
    debug: bool,
    depth: usize,
) -> Result<KlvValue> {
    match type_code {
        0 => Ok(KlvValue::Nested(parse_items(payload, debug, depth + 1)?)),
        b'c' | b'U' => Ok(KlvValue::Text(decode_text(struct_size, payload))),
        b'F' => Ok(KlvValue::Text(payload.chunks(4).map(latin1_to_string).collect())),
        b'G' => Ok(KlvValue::Bytes(payload.to_vec())),
        b'?' => {
            let layout = layout.ok_or_else(|| {
                GpmfError::InvalidData("complex record without a preceding TYPE".into())
            })?;
            Ok(KlvValue::Numeric(decode_complex(layout, struct_size, payload)?))
        }
        t if element_size(t).is_some() => {
            Ok(KlvValue::Numeric(decode_numeric(t, struct_size, payload)?))
        }
        t => Err(GpmfError::InvalidType(t)),
    }
}

fn parse_items(data: &[u8], debug: bool, depth: usize) -> Result<Vec<KlvItem>> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GpmfError::InvalidData(format!(
            "containers nested deeper than {} levels",
            MAX_NESTING_DEPTH
        )));
    }

    let mut stream = KlvStream::new(data);
    let mut items = Vec::new();
    // Layout for `?` records, scoped to this container
    let mut layout: Option<Vec<u8>> = None;

    while !stream.eof {
        if stream.only_padding_left() {
            break;
        }
        if stream.remaining() < HEADER_LEN {
            return Err(GpmfError::UnexpectedEof);
        }

        let key = stream.read_fourcc()?;
        let type_code = stream.read_byte()?;
        let struct_size = stream.read_byte()? as usize;
        let repeat = stream.read_u16()?;
        let len = struct_size * repeat as usize;
        let payload = stream.read_bytes(len)?;
        stream.skip(padded_len(len) - len);

        let key_str = latin1_to_string(&key);
        if debug {
            println!(
                "DEBUG: {}{} type '{}' size {} repeat {}",
                "  ".repeat(depth),
                key_str,
                if type_code == 0 { '0' } else { type_code as char },
                struct_size,
                repeat
            );
        }

        let value = decode_value(
            type_code,
            struct_size,
            payload,
            layout.as_deref(),
            debug,
            depth,
        )?;

        if &key == b"TYPE" {
            layout = Some(payload.iter().copied().take_while(|&b| b != 0).collect());
        }

        items.push(KlvItem {
            key: key_str,
            type_code,
            struct_size: struct_size as u8,
            repeat,
            value,
        });
    }

    Ok(items)
}

/// Parse a GPMF byte stream into its top-level records
pub fn parse_klv(data: &[u8]) -> Result<Vec<KlvItem>> {
    parse_items(data, false, 0)
}

/// Like [`parse_klv`], printing every record header as it is read
pub fn parse_klv_debug(data: &[u8], debug: bool) -> Result<Vec<KlvItem>> {
    parse_items(data, debug, 0)
}

/// Depth-first iterator over records with a given key
///
/// Matching records are yielded without descending into them; other
/// containers are searched recursively.
pub struct KlvFilter<'a> {
    stack: Vec<std::slice::Iter<'a, KlvItem>>,
    key: &'a str,
}

impl<'a> Iterator for KlvFilter<'a> {
    type Item = &'a KlvItem;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(level) = self.stack.last_mut() {
            match level.next() {
                Some(item) if item.key == self.key => return Some(item),
                Some(item) => {
                    if let Some(children) = item.children() {
                        self.stack.push(children.iter());
                    }
                }
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

/// Records tagged `key` anywhere in `items`, in stream order
pub fn filter_klv<'a>(items: &'a [KlvItem], key: &'a str) -> KlvFilter<'a> {
    KlvFilter {
        stack: vec![items.iter()],
        key,
    }
}
