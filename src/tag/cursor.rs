//! Bit-level cursor over a single tag's byte range.

use std::sync::Arc;

use super::ActionRange;

/// Errors raised while decoding a tag's byte range.
///
/// A `TruncatedInput` aborts the current tag only; the caller discards the
/// tag and continues with the next one. `MalformedLength` marks a declared
/// sub-record length that cannot be satisfied by the bytes that are
/// actually present.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("tag truncated while reading {what}: {needed} byte(s) needed, {remaining} available")]
    TruncatedInput {
        what: &'static str,
        needed: usize,
        remaining: usize,
    },
    #[error("declared length {declared} for {what} exceeds {available} available byte(s)")]
    MalformedLength {
        what: &'static str,
        declared: usize,
        available: usize,
    },
}

impl DecodeError {
    pub(crate) fn truncated(what: &'static str, needed: usize, remaining: usize) -> Self {
        DecodeError::TruncatedInput {
            what,
            needed,
            remaining,
        }
    }
}

/// Forward-only cursor over the byte range `[start, end)` of one tag.
///
/// Bit fields are most-significant-bit-first within each byte, matching the
/// container's documented bit order. Byte-level reads implicitly discard any
/// partially consumed byte, so mixed bit/byte sequences behave exactly like
/// the on-disk layout. No operation ever reads past `end`; attempts fail
/// with [`DecodeError::TruncatedInput`].
pub struct TagCursor {
    data: Arc<[u8]>,
    /// Index of the next byte to load. A byte being consumed bit-by-bit
    /// counts as already loaded, so `pos` always points past it.
    pos: usize,
    /// End of the tag region (exclusive).
    end: usize,
    /// Bits of the loaded byte that have not been handed out yet.
    bit_buf: u8,
    bits_left: u8,
}

impl TagCursor {
    /// Cursor over `[start, end)` of a shared buffer. `end` is clamped to
    /// the buffer length, `start` to `end`.
    pub fn new(data: Arc<[u8]>, start: usize, end: usize) -> Self {
        let end = end.min(data.len());
        let pos = start.min(end);
        Self {
            data,
            pos,
            end,
            bit_buf: 0,
            bits_left: 0,
        }
    }

    /// Cursor over an entire buffer.
    pub fn whole(data: impl Into<Arc<[u8]>>) -> Self {
        let data = data.into();
        let end = data.len();
        Self::new(data, 0, end)
    }

    /// Absolute position of the next unread byte. A partially consumed byte
    /// counts as read.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// End of the tag region (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Whole bytes left before the end of the tag.
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Discard any partially consumed byte.
    pub fn align(&mut self) {
        self.bit_buf = 0;
        self.bits_left = 0;
    }

    /// Read `n` bits (up to 32), most significant bit first.
    pub fn read_bits(&mut self, n: u32) -> Result<u32, DecodeError> {
        debug_assert!(n <= 32);
        let mut value = 0u32;
        let mut needed = n;
        while needed > 0 {
            if self.bits_left == 0 {
                if self.pos >= self.end {
                    return Err(DecodeError::truncated("bit field", 1, 0));
                }
                self.bit_buf = self.data[self.pos];
                self.bits_left = 8;
                self.pos += 1;
            }
            let take = needed.min(self.bits_left as u32);
            let shift = self.bits_left as u32 - take;
            let chunk = (self.bit_buf as u32 >> shift) & ((1u32 << take) - 1);
            value = (value << take) | chunk;
            self.bits_left -= take as u8;
            needed -= take;
        }
        Ok(value)
    }

    /// Read a single bit as a flag.
    pub fn read_bit(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Read `n` bits and sign-extend.
    pub fn read_sbits(&mut self, n: u32) -> Result<i32, DecodeError> {
        let raw = self.read_bits(n)?;
        if n == 0 || n == 32 {
            return Ok(raw as i32);
        }
        let shift = 32 - n;
        Ok(((raw << shift) as i32) >> shift)
    }

    fn take_bytes(&mut self, what: &'static str, n: usize) -> Result<&[u8], DecodeError> {
        self.align();
        if self.remaining() < n {
            return Err(DecodeError::truncated(what, n, self.remaining()));
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_bytes("u8", 1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take_bytes("u16", 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.take_bytes("u32", 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        let b = self.take_bytes("f32", 4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a 16.16 signed fixed-point value.
    pub fn read_fixed16(&mut self) -> Result<f32, DecodeError> {
        Ok(self.read_u32()? as i32 as f32 / 65536.0)
    }

    /// Read an 8.8 signed fixed-point value.
    pub fn read_fixed8(&mut self) -> Result<f32, DecodeError> {
        Ok(self.read_u16()? as i16 as f32 / 256.0)
    }

    /// Read a NUL-terminated string. Non-UTF-8 bytes are replaced rather
    /// than rejected, since legacy content uses platform encodings.
    pub fn read_cstring(&mut self) -> Result<String, DecodeError> {
        self.align();
        let rest = &self.data[self.pos..self.end];
        let Some(nul) = rest.iter().position(|&b| b == 0) else {
            return Err(DecodeError::truncated(
                "string terminator",
                rest.len() + 1,
                rest.len(),
            ));
        };
        let s = String::from_utf8_lossy(&rest[..nul]).into_owned();
        self.pos += nul + 1;
        Ok(s)
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take_bytes("skipped bytes", n)?;
        Ok(())
    }

    /// Hand out an owning, zero-copy reference to the next `len` bytes and
    /// advance past them.
    pub fn capture(&mut self, what: &'static str, len: usize) -> Result<ActionRange, DecodeError> {
        self.align();
        if self.remaining() < len {
            return Err(DecodeError::MalformedLength {
                what,
                declared: len,
                available: self.remaining(),
            });
        }
        let range = ActionRange::new(Arc::clone(&self.data), self.pos, len);
        self.pos += len;
        Ok(range)
    }
}
