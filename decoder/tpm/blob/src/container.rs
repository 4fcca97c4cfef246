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

//! Generic fixed-header + ordered-variable-section parser.
//!
//! Every PCP container starts with `magic:u32`, a version or type discriminant `:u32` and
//! `headerSize:u32`, followed by format specific size fields. The sections follow the header
//! in the order their size fields are declared. A [`ShapeDescriptor`] captures one such layout;
//! the format modules resolve the descriptor from the header and hand it to
//! [`ContainerBlobParser::parse`].

use log::debug;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tpm_common_decoder::{ByteReader, DecodeError};

pub const MAGIC_OFFSET: usize = 0;
pub const DISCRIMINANT_OFFSET: usize = 4;
pub const HEADER_SIZE_OFFSET: usize = 8;

/// Discriminant values shared by `platformVersion` and `pcpType`
pub const TPM_VERSION_12: u32 = 1;
pub const TPM_VERSION_20: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TpmVersion {
    #[serde(rename = "TPM1.2")]
    Tpm12,
    #[serde(rename = "TPM2.0")]
    Tpm20,
}

impl TpmVersion {
    /// Resolve a `platformVersion` or `pcpType` field
    ///
    /// # Parameters
    /// * `value` - Raw field value
    /// * `offset` - Offset of the field, reported on failure
    ///
    /// # Errors
    /// * `DecodeError::UnknownShape` - If `value` is neither 1 (TPM1.2) nor 2 (TPM2.0)
    pub fn from_u32(value: u32, offset: usize) -> Result<Self, DecodeError> {
        match value {
            TPM_VERSION_12 => Ok(TpmVersion::Tpm12),
            TPM_VERSION_20 => Ok(TpmVersion::Tpm20),
            other => Err(DecodeError::unknown_shape(offset, format!("Unknown TPM version {}", other))),
        }
    }
}

/// One variable section: its name and where its `u32` size lives in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionField {
    pub name: &'static str,
    pub size_offset: usize,
}

/// Layout of one header version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeDescriptor {
    pub name: &'static str,
    pub min_header_size: usize,
    pub sections: &'static [SectionField],
}

/// A named byte range of the parsed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    pub name: &'static str,
    pub offset: usize,
    pub data: &'a [u8],
}

/// Ordered sections recovered from a container, borrowing the caller's buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections<'a> {
    header_size: usize,
    sections: Vec<Section<'a>>,
}

impl<'a> Sections<'a> {
    /// Get section bytes by name
    ///
    /// # Parameters
    /// * `name` - Section name as declared in the shape, e.g. `"pcrValues"`
    ///
    /// # Returns
    /// * `Option<&'a [u8]>` - Slice of the parsed buffer, `None` if the shape has no such section
    pub fn get(&self, name: &str) -> Option<&'a [u8]> {
        self.section(name).map(|section| section.data)
    }

    /// Get a section with its offset by name.
    pub fn section(&self, name: &str) -> Option<&Section<'a>> {
        self.sections.iter().find(|section| section.name == name)
    }

    /// Sections in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Section<'a>> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// The `headerSize` field; the first section starts here.
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Header plus every declared section; trailing bytes beyond this are ignored.
    pub fn declared_size(&self) -> usize {
        self.header_size + self.sections.iter().map(|section| section.data.len()).sum::<usize>()
    }

    /// Section bytes, or an empty slice if the shape has no such section.
    pub(crate) fn bytes(&self, name: &str) -> &'a [u8] {
        self.get(name).unwrap_or(&[])
    }
}

impl Serialize for Section<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Section", 3)?; // field number
        state.serialize_field("name", self.name)?;
        state.serialize_field("offset", &self.offset)?;
        state.serialize_field("size", &self.data.len())?;
        state.end()
    }
}

impl Serialize for Sections<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.sections.iter())
    }
}

/// Slices PCP containers according to a [`ShapeDescriptor`]
pub struct ContainerBlobParser;

impl ContainerBlobParser {
    /// Read the leading magic constant
    ///
    /// # Parameters
    /// * `buffer` - The container bytes
    /// * `base_offset` - Position of `buffer[0]` in the outermost buffer
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If the buffer is shorter than 4 bytes
    pub fn read_magic(buffer: &[u8], base_offset: usize) -> Result<u32, DecodeError> {
        Self::read_u32_at(buffer, MAGIC_OFFSET, base_offset)
    }

    /// Read a little-endian `u32` header field
    ///
    /// # Parameters
    /// * `buffer` - The container bytes
    /// * `offset` - Offset of the field within `buffer`
    /// * `base_offset` - Position of `buffer[0]` in the outermost buffer
    ///
    /// # Returns
    /// * `Result<u32, DecodeError>` - The field value
    ///
    /// # Errors
    /// * `DecodeError::TruncatedBuffer` - If the field lies past the end of `buffer`
    pub fn read_u32_at(buffer: &[u8], offset: usize, base_offset: usize) -> Result<u32, DecodeError> {
        let mut reader = ByteReader::with_base_offset(buffer, base_offset);
        reader.skip(offset)?;
        reader.read_u32()
    }

    /// Slice `buffer` according to `shape`
    ///
    /// Reads `headerSize`, checks it against the shape's minimum, then takes each section in
    /// declaration order from the end of the header. Bytes beyond the last section are ignored.
    ///
    /// # Parameters
    /// * `buffer` - The container bytes, starting at the magic
    /// * `shape` - Layout resolved from the header's magic and discriminant
    ///
    /// # Returns
    /// * `Result<Sections<'a>, DecodeError>` - Named slices of `buffer`, never copies
    ///
    /// # Errors
    /// * `DecodeError::UnknownShape` - If `headerSize` is below the shape's minimum
    /// * `DecodeError::TruncatedBuffer` - If the header or any section runs past the buffer end
    pub fn parse<'a>(buffer: &'a [u8], shape: &ShapeDescriptor) -> Result<Sections<'a>, DecodeError> {
        Self::parse_at(buffer, shape, 0)
    }

    /// Like [`parse`](Self::parse) for a container nested at `base_offset` of an outer buffer
    ///
    /// Every offset in the result and in errors is `base_offset` plus the position in `buffer`.
    pub fn parse_at<'a>(
        buffer: &'a [u8],
        shape: &ShapeDescriptor,
        base_offset: usize,
    ) -> Result<Sections<'a>, DecodeError> {
        let header_size = Self::read_u32_at(buffer, HEADER_SIZE_OFFSET, base_offset)? as usize;
        if header_size < shape.min_header_size {
            return Err(DecodeError::unknown_shape(
                base_offset + HEADER_SIZE_OFFSET,
                format!(
                    "Header size {} below minimum {} of {}",
                    header_size, shape.min_header_size, shape.name
                ),
            ));
        }

        let mut reader = ByteReader::with_base_offset(buffer, base_offset);
        let header_bytes = reader.read_slice(header_size)?;

        let mut sections = Vec::with_capacity(shape.sections.len());
        for field in shape.sections {
            let size = Self::read_u32_at(header_bytes, field.size_offset, base_offset)? as usize;
            let offset = reader.offset();
            let data = reader.read_slice(size)?;
            debug!("{} section {} at offset {}, {} bytes", shape.name, field.name, offset, size);
            sections.push(Section { name: field.name, offset, data });
        }

        Ok(Sections { header_size, sections })
    }
}
