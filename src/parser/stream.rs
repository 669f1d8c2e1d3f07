use crate::error::{GpmfError, Result};

/// Big-endian byte stream over GPMF data
pub struct KlvStream<'a> {
    data: &'a [u8],
    pub pos: usize,
    end: usize,
    pub eof: bool,
}

impl<'a> KlvStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            end: data.len(),
            eof: data.is_empty(),
        }
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.end);
        self.eof = self.pos >= self.end;
    }

    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        if self.pos < self.end {
            let byte = self.data[self.pos];
            self.pos += 1;
            self.eof = self.pos >= self.end;
            Ok(byte)
        } else {
            self.eof = true;
            Err(GpmfError::UnexpectedEof)
        }
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            self.pos = self.end;
            self.eof = true;
            return Err(GpmfError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        self.eof = self.pos >= self.end;
        Ok(bytes)
    }

    pub fn read_fourcc(&mut self) -> Result<[u8; 4]> {
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Skip up to `len` bytes, stopping at the end of data
    pub fn skip(&mut self, len: usize) {
        self.set_position(self.pos.saturating_add(len));
    }

    /// True when every remaining byte is zero (trailing padding)
    pub fn only_padding_left(&self) -> bool {
        self.data[self.pos..self.end].iter().all(|&b| b == 0)
    }
}
