/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Byte Reader Module
//!
//! Bounds-checked cursor over an immutable byte slice. Every decoder in the workspace reads
//! through this type, so every length field is checked against the end of the buffer with
//! overflow-safe arithmetic before any byte is touched.
//!
//! All multi-byte integers are little-endian. The TCG/WBCL log, SIPA records and the PCP
//! container headers are all laid out that way, independent of the host byte order.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::DecodeError;

/// Binary data parsing helper structure
///
/// Slices returned by the reader borrow from the caller's buffer. `base_offset` is added to
/// every reported position so that readers over sub-slices still report offsets relative to
/// the outermost buffer.
pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
    base_offset: usize,
}

/// Trait for types that can be parsed from a byte stream
///
/// Implementors read their fixed fields first and borrow variable-length parts straight from
/// the reader, so a parsed value lives as long as the buffer.
pub trait ByteParseable<'a>: Sized {
    /// Parse an instance of the current type from a byte reader
    ///
    /// # Parameters
    /// * `reader` - Reader positioned at the first byte of the structure
    ///
    /// # Returns
    /// * `Result<Self, DecodeError>` - The parsed instance; the reader is left after its last byte
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If the structure runs past the end of the reader
    /// * `DecodeError::MalformedPayload` - If the structure's own length fields are inconsistent
    fn parse_from(reader: &mut ByteReader<'a>) -> Result<Self, DecodeError>;
}

impl<'a> ByteReader<'a> {
    /// Create a reader whose offsets are relative to `data` itself
    ///
    /// # Parameters
    /// * `data` - The byte data to be parsed
    ///
    /// # Returns
    /// * `Self` - The newly created ByteReader instance
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base_offset(data, 0)
    }

    /// Create a reader whose reported offsets start at `base_offset`
    ///
    /// # Parameters
    /// * `data` - The byte data to be parsed
    /// * `base_offset` - Position of `data[0]` in the outermost buffer
    ///
    /// # Returns
    /// * `Self` - The newly created ByteReader instance
    pub fn with_base_offset(data: &'a [u8], base_offset: usize) -> Self {
        Self {
            cursor: Cursor::new(data),
            base_offset,
        }
    }

    /// Current position relative to the start of this reader's slice.
    pub fn position(&self) -> usize {
        // Every read checks the remaining length first, so the cursor never leaves the slice.
        self.cursor.position() as usize
    }

    /// Current position relative to the outermost buffer.
    pub fn offset(&self) -> usize {
        self.base_offset.saturating_add(self.position())
    }

    /// Position of this reader's first byte in the outermost buffer.
    pub fn base_offset(&self) -> usize {
        self.base_offset
    }

    /// Set position
    ///
    /// # Parameters
    /// * `pos` - New position, relative to this reader's slice
    ///
    /// # Returns
    /// * `Result<(), DecodeError>` - Returns empty on success
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If `pos` lies past the end of the slice
    pub fn set_position(&mut self, pos: usize) -> Result<(), DecodeError> {
        if pos > self.len() {
            return Err(DecodeError::TruncatedBuffer {
                offset: self.base_offset.saturating_add(pos),
                needed: pos,
                available: self.len(),
            });
        }
        self.cursor.set_position(pos as u64);
        Ok(())
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    /// Whether every byte has been read.
    pub fn is_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Length of this reader's slice.
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail unless at least `length` unread bytes remain
    ///
    /// # Parameters
    /// * `length` - Number of bytes the caller is about to read
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - At the current offset, with the bytes needed and available
    pub fn ensure(&self, length: usize) -> Result<(), DecodeError> {
        if length > self.remaining() {
            return Err(DecodeError::TruncatedBuffer {
                offset: self.offset(),
                needed: length,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::TruncatedBuffer {
            offset: self.offset(),
            needed,
            available: self.remaining(),
        }
    }

    /// Read one byte
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If no byte remains
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.ensure(1)?;
        self.cursor.read_u8().map_err(|_| self.truncated(1))
    }

    /// Read a little-endian u16
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If fewer than 2 bytes remain
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.ensure(2)?;
        self.cursor.read_u16::<LittleEndian>().map_err(|_| self.truncated(2))
    }

    /// Read a little-endian u32
    ///
    /// # Returns
    /// * `Result<u32, DecodeError>` - The value; the position advances by 4 only on success
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If fewer than 4 bytes remain
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.ensure(4)?;
        self.cursor.read_u32::<LittleEndian>().map_err(|_| self.truncated(4))
    }

    /// Read a little-endian u64
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If fewer than 8 bytes remain
    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.ensure(8)?;
        self.cursor.read_u64::<LittleEndian>().map_err(|_| self.truncated(8))
    }

    /// Read a little-endian i64
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If fewer than 8 bytes remain
    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.ensure(8)?;
        self.cursor.read_i64::<LittleEndian>().map_err(|_| self.truncated(8))
    }

    /// Borrow the next `length` bytes without copying
    ///
    /// # Parameters
    /// * `length` - Number of bytes, usually a length field just read from the buffer
    ///
    /// # Returns
    /// * `Result<&'a [u8], DecodeError>` - Slice of the caller's buffer
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If `length` exceeds the remaining bytes; the position is
    ///   left unchanged
    pub fn read_slice(&mut self, length: usize) -> Result<&'a [u8], DecodeError> {
        self.ensure(length)?;
        let start = self.position();
        let end = start.checked_add(length).ok_or_else(|| self.truncated(length))?;
        let data: &'a [u8] = *self.cursor.get_ref();
        let slice = data.get(start..end).ok_or_else(|| self.truncated(length))?;
        self.cursor.set_position(end as u64);
        Ok(slice)
    }

    /// Copy the next `length` bytes
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If `length` exceeds the remaining bytes
    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, DecodeError> {
        self.read_slice(length).map(<[u8]>::to_vec)
    }

    /// Borrow everything that has not been read yet.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = self.position().min(data.len());
        self.cursor.set_position(data.len() as u64);
        &data[start..]
    }

    /// Skip `length` bytes
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If `length` exceeds the remaining bytes
    pub fn skip(&mut self, length: usize) -> Result<(), DecodeError> {
        self.read_slice(length).map(|_| ())
    }

    /// Split off the next `length` bytes as an independent reader
    ///
    /// # Parameters
    /// * `length` - Size of the nested structure
    ///
    /// # Returns
    /// * `Result<ByteReader<'a>, DecodeError>` - Reader over the nested bytes whose offsets stay
    ///   relative to the outermost buffer
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If `length` exceeds the remaining bytes
    pub fn sub_reader(&mut self, length: usize) -> Result<ByteReader<'a>, DecodeError> {
        let offset = self.offset();
        let slice = self.read_slice(length)?;
        Ok(ByteReader::with_base_offset(slice, offset))
    }

    /// Read `length` bytes as UTF-16LE text, stopping at the first NUL code unit
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If `length` exceeds the remaining bytes
    pub fn read_utf16_string(&mut self, length: usize) -> Result<String, DecodeError> {
        let bytes = self.read_slice(length)?;
        Ok(decode_utf16_nul_terminated(bytes))
    }

    /// Read the rest of the slice as UTF-16LE text, stopping at the first NUL code unit.
    pub fn read_ucs2_string(&mut self) -> String {
        decode_utf16_nul_terminated(self.read_remaining())
    }
}

/// Decode UTF-16LE text up to the first NUL code unit.
///
/// A trailing odd byte is ignored and unpaired surrogates become U+FFFD.
pub fn decode_utf16_nul_terminated(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0);
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16().unwrap(), 0x0302);
        assert_eq!(reader.read_u32().unwrap(), 0x0706_0504);
        assert_eq!(reader.read_u64().unwrap(), 0x0F0E_0D0C_0B0A_0908);
        assert!(reader.is_end());
    }

    #[test]
    fn test_read_past_end_reports_offset() {
        let data = [0u8; 6];
        let mut reader = ByteReader::with_base_offset(&data, 100);
        reader.read_u32().unwrap();
        let err = reader.read_u32().unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedBuffer { offset: 104, needed: 4, available: 2 }
        );
        // A failed read leaves the position untouched.
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_read_slice_huge_length_does_not_overflow() {
        let data = [0u8; 4];
        let mut reader = ByteReader::new(&data);
        reader.read_u8().unwrap();
        assert!(reader.read_slice(usize::MAX).is_err());
        assert_eq!(reader.remaining(), 3);
    }

    #[test]
    fn test_sub_reader_keeps_absolute_offsets() {
        let data = [0xAAu8; 16];
        let mut reader = ByteReader::with_base_offset(&data, 32);
        reader.skip(4).unwrap();
        let mut sub = reader.sub_reader(8).unwrap();
        assert_eq!(sub.offset(), 36);
        sub.skip(8).unwrap();
        assert!(sub.read_u8().unwrap_err().offset() == Some(44));
        assert_eq!(reader.offset(), 44);
    }

    #[test]
    fn test_utf16_stops_at_nul() {
        let bytes = [b'A', 0, b'B', 0, 0, 0, b'C', 0];
        assert_eq!(decode_utf16_nul_terminated(&bytes), "AB");
        let odd = [b'x', 0, b'y'];
        assert_eq!(decode_utf16_nul_terminated(&odd), "x");
    }
}
