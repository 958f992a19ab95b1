//! Bounds-checked little-endian reads over a borrowed byte range.
//!
//! Every read here is explicit and field-by-field rather than a cast of a
//! raw span onto a struct, so that byte order and alignment never depend on
//! the host. Out-of-range access always yields [`CabError::Range`] instead
//! of panicking or reading past the declared end.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{CabError, Result};

/// A read-only cursor over a borrowed byte slice.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    base: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(base: &'a [u8]) -> Cursor<'a> {
        Cursor { base, pos: 0 }
    }

    pub fn at(base: &'a [u8], pos: usize) -> Cursor<'a> {
        Cursor { base, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn remaining(&self) -> usize {
        self.base.len().saturating_sub(self.pos)
    }

    fn check(&self, len: usize) -> Result<()> {
        if self.pos.checked_add(len).map_or(true, |end| end > self.base.len()) {
            return Err(CabError::Range { offset: self.pos, len, available: self.base.len() });
        }
        Ok(())
    }

    /// Borrows `len` bytes starting at the current position without advancing.
    pub fn peek_slice(&self, len: usize) -> Result<&'a [u8]> {
        self.check(len)?;
        Ok(&self.base[self.pos..self.pos + len])
    }

    /// Borrows `len` bytes starting at the current position and advances past them.
    pub fn take_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        let slice = self.peek_slice(len)?;
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let slice = self.take_slice(1)?;
        Ok(slice[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let slice = self.take_slice(2)?;
        Ok(LittleEndian::read_u16(slice))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let slice = self.take_slice(4)?;
        Ok(LittleEndian::read_u32(slice))
    }

    /// Reads a NUL-terminated string of any length. Fails with
    /// [`CabError::Range`] if the input ends before a NUL is found.
    pub fn read_null_terminated_string(&mut self) -> Result<String> {
        let mut bytes = Vec::with_capacity(32);
        loop {
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Asserts that `[offset, offset + len)` fits within the base range,
    /// without reading anything. Used to validate cross-referenced spans
    /// (e.g. a folder's data-block chain) that are not read sequentially.
    pub fn assert_span(base_len: usize, offset: usize, len: usize) -> Result<()> {
        if offset.checked_add(len).map_or(true, |end| end > base_len) {
            return Err(CabError::Range { offset, len, available: base_len });
        }
        Ok(())
    }
}
